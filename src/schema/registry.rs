//! Document type to schema resolution.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{InputFault, NldError, Result};

/// Schema shared by contracts, receipts and agreements; also the default.
pub const DOCUMENT_SCHEMA: &str = "schemas/document-v1.json";
/// Schema for non-disclosure agreements.
pub const NDA_SCHEMA: &str = "schemas/nda.schema.json";

/// Maps lower-cased document types to schema identifiers.
///
/// Identifiers are joined onto an optional base directory; the registry
/// itself never looks at the filesystem.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    base_dir: Option<PathBuf>,
    types: BTreeMap<String, String>,
    default_schema: String,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaRegistry {
    /// Registry with the built-in type map and no base directory.
    pub fn new() -> Self {
        let types = [
            ("contract", DOCUMENT_SCHEMA),
            ("receipt", DOCUMENT_SCHEMA),
            ("agreement", DOCUMENT_SCHEMA),
            ("nda", NDA_SCHEMA),
        ]
        .into_iter()
        .map(|(t, s)| (t.to_string(), s.to_string()))
        .collect();

        Self {
            base_dir: None,
            types,
            default_schema: DOCUMENT_SCHEMA.to_string(),
        }
    }

    /// Resolve identifiers relative to `dir`.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Add or replace the schema for a document type.
    pub fn with_mapping(mut self, document_type: &str, identifier: impl Into<String>) -> Self {
        self.types
            .insert(document_type.to_lowercase(), identifier.into());
        self
    }

    /// Schema used when a document's type cannot be resolved.
    pub fn with_default_schema(mut self, identifier: impl Into<String>) -> Self {
        self.default_schema = identifier.into();
        self
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    /// Known `(type, identifier)` pairs in type order.
    pub fn document_types(&self) -> impl Iterator<Item = (&str, &str)> {
        self.types.iter().map(|(t, s)| (t.as_str(), s.as_str()))
    }

    pub fn default_schema_path(&self) -> PathBuf {
        self.locate(&self.default_schema)
    }

    /// Schema location for a document type, matched case-insensitively.
    pub fn resolve_schema_path(&self, document_type: &str) -> Result<PathBuf> {
        let identifier = self
            .types
            .get(&document_type.to_lowercase())
            .ok_or_else(|| NldError::NotFound {
                document_type: document_type.to_string(),
            })?;
        let path = self.locate(identifier);
        debug!(document_type, path = %path.display(), "resolved schema");
        Ok(path)
    }

    /// Schema location for a document, chosen by its `metadata.type`.
    pub fn resolve_schema_for_document(&self, document: &[u8]) -> Result<PathBuf> {
        let document_type = document_type_of(document)?;
        self.resolve_schema_path(&document_type)
    }

    /// Like [`Self::resolve_schema_for_document`], substituting the default
    /// schema for an unknown or missing type. Syntax errors still fail.
    pub fn resolve_schema_or_default(&self, document: &[u8]) -> Result<PathBuf> {
        match self.resolve_schema_for_document(document) {
            Err(e) if e.is_recoverable() => {
                debug!(reason = %e, "falling back to default schema");
                Ok(self.default_schema_path())
            }
            other => other,
        }
    }

    fn locate(&self, identifier: &str) -> PathBuf {
        match &self.base_dir {
            Some(dir) => dir.join(identifier),
            None => PathBuf::from(identifier),
        }
    }
}

#[derive(Deserialize)]
struct TypeHeader {
    #[serde(default)]
    metadata: Option<HeaderMetadata>,
}

#[derive(Deserialize)]
struct HeaderMetadata {
    #[serde(rename = "type", default)]
    document_type: Option<String>,
}

/// Extract `metadata.type` without validating anything else.
pub fn document_type_of(document: &[u8]) -> Result<String> {
    let header: TypeHeader = serde_json::from_slice(document).map_err(|e| {
        if e.is_data() {
            // Well-formed JSON of the wrong shape, e.g. a numeric type
            NldError::MalformedInput(InputFault::MissingDocumentType)
        } else {
            NldError::MalformedInput(InputFault::Syntax {
                message: e.to_string(),
                line: e.line(),
                column: e.column(),
            })
        }
    })?;

    header
        .metadata
        .and_then(|m| m.document_type)
        .ok_or(NldError::MalformedInput(InputFault::MissingDocumentType))
}
