//! Document validation against compiled schemas.
//!
//! [`validate`] never fails for an invalid document: malformed JSON and
//! constraint violations are both reported as data in a [`ValidationResult`],
//! so batches can keep going when individual documents fail.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::schema::CompiledSchema;

pub mod engine;
pub mod locate;
pub mod normalize;

pub use engine::{Keyword, Segment, Violation};
pub use normalize::normalize;

/// Outcome of validating one document. `valid` is true iff `errors` is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    /// Assemble a result, deriving `valid` from `errors`.
    pub fn new(errors: Vec<ValidationError>, warnings: Vec<ValidationWarning>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

/// A violation with its document location.
///
/// `line` and `column` are 1-based and best-effort; 0 means "not determined".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// JSON pointer into the document, empty at the root
    pub field: String,
    pub message: String,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
}

/// Knobs that never change `valid`.
#[derive(Debug, Clone, Copy)]
pub struct ValidateOptions {
    /// Warn about properties an object schema does not declare
    pub warn_undeclared: bool,
    /// Fill in line/column for structural errors
    pub locate_errors: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            warn_undeclared: true,
            locate_errors: true,
        }
    }
}

/// Validate document bytes with default options.
pub fn validate(document: &[u8], schema: &CompiledSchema) -> ValidationResult {
    validate_with(document, schema, &ValidateOptions::default())
}

/// Validate document bytes.
///
/// Bytes that do not decode yield exactly one error describing the parse
/// failure; no structural checks run in that case.
pub fn validate_with(
    document: &[u8],
    schema: &CompiledSchema,
    options: &ValidateOptions,
) -> ValidationResult {
    let value: Value = match serde_json::from_slice(document) {
        Ok(value) => value,
        Err(e) => {
            debug!(schema = schema.origin(), error = %e, "document is not valid JSON");
            return ValidationResult::new(
                vec![ValidationError {
                    field: String::new(),
                    message: format!("Invalid JSON: {}", e),
                    line: e.line(),
                    column: e.column(),
                }],
                Vec::new(),
            );
        }
    };

    let mut result = validate_value_with(&value, schema, options);
    if options.locate_errors && !result.errors.is_empty() {
        let positions = locate::value_positions(document);
        for error in &mut result.errors {
            if let Some((line, column)) = positions.get(&error.field) {
                error.line = *line;
                error.column = *column;
            }
        }
    }
    result
}

/// Validate an already-decoded value. Locations are left at 0.
pub fn validate_value(value: &Value, schema: &CompiledSchema) -> ValidationResult {
    validate_value_with(value, schema, &ValidateOptions::default())
}

fn validate_value_with(
    value: &Value,
    schema: &CompiledSchema,
    options: &ValidateOptions,
) -> ValidationResult {
    let (violations, warnings) = collect_violations(value, schema, options);
    let errors = normalize(&violations);
    debug!(
        schema = schema.origin(),
        errors = errors.len(),
        warnings = warnings.len(),
        "validated document"
    );
    ValidationResult::new(errors, warnings)
}

/// The raw violation tree, before normalization.
pub fn collect_violations(
    value: &Value,
    schema: &CompiledSchema,
    options: &ValidateOptions,
) -> (Vec<Violation>, Vec<ValidationWarning>) {
    let mut walker = engine::Walker::new(schema, options.warn_undeclared);
    let violations = walker.run(value);
    (violations, walker.warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::compile_bytes;

    const DOCUMENT_SCHEMA: &str = include_str!("../../schemas/document-v1.json");

    fn document_schema() -> CompiledSchema {
        compile_bytes("document-v1.json", DOCUMENT_SCHEMA.as_bytes()).unwrap()
    }

    #[test]
    fn test_valid_minimal_document() {
        let doc = br#"{"metadata":{"version":"1.0.0","type":"contract","created":"2025-06-27T12:00:00Z","title":"T"},"content":{"sections":[{"id":"s1","title":"S","content":"c"}]}}"#;
        let result = validate(doc, &document_schema());
        assert!(result.valid, "{:?}", result.errors);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_missing_title_and_sections_in_structural_order() {
        let doc = br#"{"content":{},"metadata":{"version":"1.0.0","type":"contract","created":"2025-06-27T12:00:00Z"}}"#;
        let result = validate(doc, &document_schema());
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.errors[0].field, "/metadata");
        assert!(result.errors[0].message.contains("missing properties"));
        assert!(result.errors[0].message.contains("title"));
        assert_eq!(result.errors[1].field, "/content");
        assert!(result.errors[1].message.contains("sections"));
    }

    #[test]
    fn test_enum_violation() {
        let doc = br#"{"metadata":{"version":"1.0.0","type":"invoice","created":"2025-06-27T12:00:00Z","title":"T"},"content":{"sections":[{"id":"s1","title":"S","content":"c"}]}}"#;
        let result = validate(doc, &document_schema());
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].field, "/metadata/type");
        assert_eq!(
            result.errors[0].message,
            r#"value must be one of "contract", "receipt", "agreement""#
        );
    }

    #[test]
    fn test_malformed_json_single_error_with_line() {
        let doc = b"{\n  \"metadata\": {\n    \"version\": \"1.0.0\"\n";
        let result = validate(doc, &document_schema());
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.starts_with("Invalid JSON"));
        assert!(result.errors[0].line > 1);
    }

    #[test]
    fn test_numeric_string_is_not_a_number() {
        let schema = compile_bytes("n", br#"{"properties": {"n": {"type": "number"}}}"#).unwrap();
        let result = validate(br#"{"n": "5"}"#, &schema);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].message, "expected number, but got string");
    }

    #[test]
    fn test_errors_carry_source_locations() {
        let doc = b"{\n  \"metadata\": {\n    \"version\": \"one\",\n    \"type\": \"contract\",\n    \"created\": \"2025-06-27T12:00:00Z\",\n    \"title\": \"T\"\n  },\n  \"content\": {\"sections\": []}\n}";
        let result = validate(doc, &document_schema());
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.errors[0].field, "/metadata/version");
        assert_eq!((result.errors[0].line, result.errors[0].column), (3, 16));
        assert_eq!(result.errors[1].field, "/content/sections");
        assert_eq!(result.errors[1].line, 8);

        let unlocated = validate_with(
            doc,
            &document_schema(),
            &ValidateOptions {
                locate_errors: false,
                ..ValidateOptions::default()
            },
        );
        assert_eq!(unlocated.errors[0].line, 0);
    }

    #[test]
    fn test_warnings_do_not_affect_validity() {
        let doc = br#"{"metadata":{"version":"1.0.0","type":"receipt","created":"2025-06-27T12:00:00Z","title":"T","currency":"EUR"},"content":{"sections":[{"id":"s1","title":"S","content":"c"}]}}"#;
        let result = validate(doc, &document_schema());
        assert!(result.valid);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].field, "/metadata/currency");
    }

    #[test]
    fn test_validate_value_matches_bytes() {
        let schema = document_schema();
        let value = serde_json::json!({"metadata": {}, "content": {"sections": []}});
        let from_value = validate_value(&value, &schema);
        let from_bytes = validate_with(
            value.to_string().as_bytes(),
            &schema,
            &ValidateOptions {
                locate_errors: false,
                ..ValidateOptions::default()
            },
        );
        assert_eq!(from_value, from_bytes);
    }
}
