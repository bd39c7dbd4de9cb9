//! Configuration for the `nld` tool.
//!
//! Configuration is optional YAML. Merge order (later overrides earlier):
//! 1. Global config (`<config_dir>/nld/config.yaml`)
//! 2. Project config (`./nld.yaml`)
//! 3. Command-line flags, applied by the caller

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::formatters::OutputFormat;
use crate::schema::{SchemaRegistry, DOCUMENT_SCHEMA};

mod validation;

/// Project configuration file, relative to the working directory.
pub const PROJECT_CONFIG: &str = "nld.yaml";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub output_format: OutputFormat,
    /// Directory schema identifiers resolve against
    pub schema_dir: Option<PathBuf>,
    /// Identifier used when a document's type cannot be resolved
    pub default_schema: String,
    /// Extra or overriding `type -> schema identifier` entries
    pub types: BTreeMap<String, String>,
    pub validation: ValidationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::default(),
            schema_dir: None,
            default_schema: DOCUMENT_SCHEMA.to_string(),
            types: BTreeMap::new(),
            validation: ValidationConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationConfig {
    pub warn_undeclared: bool,
    /// Worker threads for `--force` batches; 0 lets rayon decide
    pub jobs: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            warn_undeclared: default_warn_undeclared(),
            jobs: 0,
        }
    }
}

fn default_warn_undeclared() -> bool {
    true
}

impl Config {
    /// Load global and project configuration, either of which may be absent.
    pub fn load() -> Result<Self> {
        Self::load_merged_from(global_config_path().as_deref(), Path::new(PROJECT_CONFIG))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let partial = PartialConfig::load_from(path)?;
        let config = PartialConfig::default().merge_with(partial);
        config.validate()?;
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let partial = PartialConfig::parse(content)?;
        let config = PartialConfig::default().merge_with(partial);
        config.validate()?;
        Ok(config)
    }

    /// Merge the configs at the given paths. Missing files are skipped.
    pub fn load_merged_from(global_path: Option<&Path>, project_path: &Path) -> Result<Self> {
        let global_config = global_path
            .filter(|p| p.exists())
            .map(PartialConfig::load_from)
            .transpose()?
            .unwrap_or_default();

        let project_config = Some(project_path)
            .filter(|p| p.exists())
            .map(PartialConfig::load_from)
            .transpose()?
            .unwrap_or_default();

        let config = global_config.merge_with(project_config);
        config.validate()?;
        debug!(?config, "loaded configuration");
        Ok(config)
    }

    /// Registry honouring `schema_dir`, `default_schema` and `types`.
    ///
    /// `fallback_dir` is used as the base directory when no `schema_dir`
    /// is configured.
    pub fn registry(&self, fallback_dir: Option<&Path>) -> SchemaRegistry {
        let mut registry = SchemaRegistry::new().with_default_schema(&self.default_schema);
        if let Some(dir) = self.schema_dir.as_deref().or(fallback_dir) {
            registry = registry.with_base_dir(dir);
        }
        for (document_type, identifier) in &self.types {
            registry = registry.with_mapping(document_type, identifier);
        }
        registry
    }
}

/// Returns the path to the global config file at `<config_dir>/nld/config.yaml`
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("nld").join("config.yaml"))
}

/// Partial config for merging - all fields optional
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PartialConfig {
    output_format: Option<OutputFormat>,
    schema_dir: Option<String>,
    default_schema: Option<String>,
    types: Option<BTreeMap<String, String>>,
    validation: Option<PartialValidationConfig>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PartialValidationConfig {
    warn_undeclared: Option<bool>,
    jobs: Option<usize>,
}

impl PartialConfig {
    fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).context("Failed to parse config")
    }

    /// Merge this global config with a project config.
    /// Values from the project config take precedence over global.
    fn merge_with(self, project: PartialConfig) -> Config {
        let global_validation = self.validation.unwrap_or_default();
        let project_validation = project.validation.unwrap_or_default();

        // Type maps merge entry by entry
        let mut types = BTreeMap::new();
        for (document_type, identifier) in self
            .types
            .unwrap_or_default()
            .into_iter()
            .chain(project.types.unwrap_or_default())
        {
            types.insert(document_type.to_lowercase(), identifier);
        }

        Config {
            output_format: project
                .output_format
                .or(self.output_format)
                .unwrap_or_default(),
            schema_dir: project
                .schema_dir
                .or(self.schema_dir)
                .map(|dir| PathBuf::from(shellexpand::tilde(&dir).to_string())),
            default_schema: project
                .default_schema
                .or(self.default_schema)
                .unwrap_or_else(|| DOCUMENT_SCHEMA.to_string()),
            types,
            validation: ValidationConfig {
                warn_undeclared: project_validation
                    .warn_undeclared
                    .or(global_validation.warn_undeclared)
                    .unwrap_or_else(default_warn_undeclared),
                jobs: project_validation
                    .jobs
                    .or(global_validation.jobs)
                    .unwrap_or_default(),
            },
        }
    }
}
