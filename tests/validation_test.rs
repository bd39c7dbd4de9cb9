//! End-to-end checks of the library: registry, cache and validator together.

use std::path::Path;
use std::sync::Arc;

use nld::schema::{DOCUMENT_SCHEMA, NDA_SCHEMA};
use nld::store::{FsStore, InMemoryStore};
use nld::templates::{new_document, TemplateFields};
use nld::validator::validate_value;
use nld::{validate, InputFault, NldError, SchemaCache, SchemaRegistry};

mod support;
use support::fixtures::{INVOICE, MISSING_FIELDS, TRUNCATED, VALID_CONTRACT};

fn builtin_cache() -> SchemaCache {
    SchemaCache::new(Arc::new(InMemoryStore::new()))
}

fn validate_resolved(document: &str) -> nld::ValidationResult {
    let registry = SchemaRegistry::new();
    let cache = builtin_cache();
    let path = registry
        .resolve_schema_or_default(document.as_bytes())
        .unwrap();
    let schema = cache.get_or_compile(&path).unwrap();
    validate(document.as_bytes(), &schema)
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[test]
fn test_minimal_contract_is_valid() {
    let result = validate_resolved(VALID_CONTRACT);
    assert!(result.valid);
    assert!(result.errors.is_empty());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_missing_fields_reported_per_object_in_order() {
    let result = validate_resolved(MISSING_FIELDS);
    assert!(!result.valid);
    assert_eq!(result.errors.len(), 2);

    assert_eq!(result.errors[0].field, "/metadata");
    assert!(result.errors[0].message.contains("\"title\""));
    assert_eq!(result.errors[0].line, 2);

    assert_eq!(result.errors[1].field, "/content");
    assert!(result.errors[1].message.contains("\"sections\""));
    assert_eq!(result.errors[1].line, 7);
}

#[test]
fn test_unknown_type_falls_back_and_reports_enum() {
    let registry = SchemaRegistry::new();
    let err = registry
        .resolve_schema_for_document(INVOICE.as_bytes())
        .unwrap_err();
    assert!(matches!(err, NldError::NotFound { ref document_type } if document_type == "invoice"));

    let result = validate_resolved(INVOICE);
    assert!(!result.valid);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].field, "/metadata/type");
    assert!(result.errors[0].message.contains("must be one of"));
    assert!(result.errors[0].message.contains("\"contract\""));
}

#[test]
fn test_truncated_document_is_one_parse_error() {
    let registry = SchemaRegistry::new();
    let err = registry
        .resolve_schema_or_default(TRUNCATED.as_bytes())
        .unwrap_err();
    assert!(matches!(
        err,
        NldError::MalformedInput(InputFault::Syntax { line, .. }) if line > 0
    ));

    let schema = builtin_cache()
        .get_or_compile(Path::new(DOCUMENT_SCHEMA))
        .unwrap();
    let result = validate(TRUNCATED.as_bytes(), &schema);
    assert!(!result.valid);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].message.starts_with("Invalid JSON"));
    assert!(result.errors[0].line >= 3);
}

// ============================================================================
// PROPERTIES
// ============================================================================

#[test]
fn test_validation_is_deterministic() {
    let first = validate_resolved(MISSING_FIELDS);
    for _ in 0..10 {
        assert_eq!(validate_resolved(MISSING_FIELDS), first);
    }
}

#[test]
fn test_valid_iff_no_errors() {
    for document in [VALID_CONTRACT, MISSING_FIELDS, INVOICE, TRUNCATED, "[]", "null"] {
        let schema = builtin_cache()
            .get_or_compile(Path::new(DOCUMENT_SCHEMA))
            .unwrap();
        let result = validate(document.as_bytes(), &schema);
        assert_eq!(result.valid, result.errors.is_empty(), "{}", document);
    }
}

#[test]
fn test_every_violation_is_reported() {
    let document = serde_json::json!({
        "metadata": {
            "version": "one",
            "type": "contract",
            "created": "yesterday",
            "title": ""
        },
        "content": {"sections": []}
    });
    let schema = builtin_cache()
        .get_or_compile(Path::new(DOCUMENT_SCHEMA))
        .unwrap();
    let result = validate_value(&document, &schema);
    let fields: Vec<&str> = result.errors.iter().map(|e| e.field.as_str()).collect();
    assert!(fields.contains(&"/metadata/version"));
    assert!(fields.contains(&"/metadata/created"));
    assert!(fields.contains(&"/content/sections"));
}

#[test]
fn test_version_digits_must_be_ascii() {
    let schema = builtin_cache()
        .get_or_compile(Path::new(DOCUMENT_SCHEMA))
        .unwrap();
    let document = VALID_CONTRACT.replace("\"1.0.0\"", "\"١.٠.٠\"");
    let result = validate(document.as_bytes(), &schema);
    assert!(!result.valid);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].field, "/metadata/version");
}

#[test]
fn test_type_lookup_is_case_insensitive() {
    let registry = SchemaRegistry::new().with_base_dir("/opt/nld");
    let upper = registry
        .resolve_schema_for_document(br#"{"metadata":{"type":"NDA"}}"#)
        .unwrap();
    let lower = registry.resolve_schema_path("nda").unwrap();
    assert_eq!(upper, lower);
    assert!(upper.ends_with(NDA_SCHEMA));
}

#[test]
fn test_templates_validate_against_their_schemas() {
    let registry = SchemaRegistry::new();
    let cache = builtin_cache();
    for kind in ["contract", "receipt", "agreement", "nda"] {
        let document = new_document(kind, &TemplateFields::default());
        let bytes = document.to_json_pretty().unwrap();
        let path = registry
            .resolve_schema_for_document(bytes.as_bytes())
            .unwrap();
        let schema = cache.get_or_compile(&path).unwrap();
        let result = validate(bytes.as_bytes(), &schema);
        assert!(result.valid, "{}: {:?}", kind, result.errors);
    }
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_schema_on_disk_is_used() {
    let tmp = tempfile::TempDir::new().unwrap();
    let schemas = tmp.path().join("schemas");
    std::fs::create_dir_all(&schemas).unwrap();
    std::fs::write(
        schemas.join("document-v1.json"),
        r#"{"title": "Local Schema v9.0.0", "type": "object", "required": ["extra"]}"#,
    )
    .unwrap();

    let registry = SchemaRegistry::new().with_base_dir(tmp.path());
    let cache = SchemaCache::new(Arc::new(FsStore::new()));
    let path = registry
        .resolve_schema_for_document(VALID_CONTRACT.as_bytes())
        .unwrap();
    let schema = cache.get_or_compile(&path).unwrap();
    assert_eq!(schema.version(), Some("9.0.0"));

    let result = validate(VALID_CONTRACT.as_bytes(), &schema);
    assert!(!result.valid);
    assert_eq!(result.errors[0].field, "");
    assert!(result.errors[0].message.contains("\"extra\""));
}
