//! Validation logic for merged configuration.

use anyhow::Result;

use super::Config;

impl Config {
    /// Reject values serde accepts but the tool cannot use.
    pub fn validate(&self) -> Result<()> {
        if self.default_schema.trim().is_empty() {
            anyhow::bail!("default_schema must not be empty");
        }

        for (document_type, identifier) in &self.types {
            if document_type.trim().is_empty() {
                anyhow::bail!("types: document type names must not be empty");
            }
            if identifier.trim().is_empty() {
                anyhow::bail!("types.{}: schema identifier must not be empty", document_type);
            }
        }

        if let Some(dir) = &self.schema_dir {
            if dir.as_os_str().is_empty() {
                anyhow::bail!("schema_dir must not be empty");
            }
        }

        Ok(())
    }
}
