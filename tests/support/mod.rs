pub mod harness;

/// Scenario documents shared by the library and CLI tests.
#[allow(dead_code)]
pub mod fixtures {
    pub const VALID_CONTRACT: &str = r#"{"metadata":{"version":"1.0.0","type":"contract","created":"2025-06-27T12:00:00Z","title":"T"},"content":{"sections":[{"id":"s1","title":"S","content":"c"}]}}"#;

    /// Missing `metadata.title` and `content.sections`
    pub const MISSING_FIELDS: &str = r#"{
  "metadata": {
    "version": "1.0.0",
    "type": "contract",
    "created": "2025-06-27T12:00:00Z"
  },
  "content": {}
}"#;

    pub const INVOICE: &str = r#"{"metadata":{"version":"1.0.0","type":"invoice","created":"2025-06-27T12:00:00Z","title":"T"},"content":{"sections":[{"id":"s1","title":"S","content":"c"}]}}"#;

    pub const TRUNCATED: &str = "{\n  \"metadata\": {\n    \"version\": \"1.0.0\",\n";
}
