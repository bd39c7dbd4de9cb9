//! Schemas compiled into the binary.

use std::path::Path;

use super::registry::{DOCUMENT_SCHEMA, NDA_SCHEMA};

const DOCUMENT_V1: &str = include_str!("../../schemas/document-v1.json");
const NDA_V1: &str = include_str!("../../schemas/nda.schema.json");

/// Embedded contents for a path ending in a built-in schema identifier.
///
/// `/opt/nld/schemas/document-v1.json` and `schemas/document-v1.json` both
/// match; the comparison is per path component.
pub fn builtin_schema(path: &Path) -> Option<&'static str> {
    [(DOCUMENT_SCHEMA, DOCUMENT_V1), (NDA_SCHEMA, NDA_V1)]
        .into_iter()
        .find(|(identifier, _)| path.ends_with(identifier))
        .map(|(_, contents)| contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup_by_suffix() {
        assert!(builtin_schema(Path::new("schemas/document-v1.json")).is_some());
        assert!(builtin_schema(Path::new("/usr/local/bin/schemas/nda.schema.json")).is_some());
        assert!(builtin_schema(Path::new("document-v1.json")).is_none());
        assert!(builtin_schema(Path::new("schemas/other.json")).is_none());
    }

    #[test]
    fn test_builtins_are_valid_json() {
        for contents in [DOCUMENT_V1, NDA_V1] {
            assert!(serde_json::from_str::<serde_json::Value>(contents).is_ok());
        }
    }
}
