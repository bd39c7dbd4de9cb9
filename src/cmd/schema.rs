//! `nld schema`: inspect schemas and the type mapping.

use anyhow::{Context, Result};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

use nld::store::FsStore;
use nld::SchemaCache;

use super::ui::OutputMode;
use super::CliContext;

/// Compile the schema at `path` and describe it.
pub fn cmd_schema_info(ctx: &CliContext, path: &Path) -> Result<()> {
    let cache = SchemaCache::new(Arc::new(FsStore::new()));
    let schema = cache
        .get_or_compile(path)
        .with_context(|| format!("Failed to load schema {}", path.display()))?;

    match ctx.output.mode() {
        OutputMode::Json => ctx.output.json(&json!({
            "origin": schema.origin(),
            "title": schema.title(),
            "version": schema.version(),
            "nodes": schema.node_count(),
        })),
        _ => {
            ctx.output.info(&format!("Schema: {}", schema.origin()));
            ctx.output
                .info(&format!("Title: {}", schema.title().unwrap_or("(untitled)")));
            ctx.output
                .info(&format!("Version: {}", schema.version().unwrap_or("unknown")));
            if ctx.verbose {
                ctx.output
                    .info(&format!("Constraint nodes: {}", schema.node_count()));
            }
        }
    }
    Ok(())
}

/// List document types and the schema each resolves to.
pub fn cmd_schema_types(ctx: &CliContext) -> Result<()> {
    let registry = ctx.registry();

    match ctx.output.mode() {
        OutputMode::Json => {
            let types: serde_json::Map<String, serde_json::Value> = registry
                .document_types()
                .filter_map(|(document_type, _)| {
                    registry.resolve_schema_path(document_type).ok().map(|path| {
                        (
                            document_type.to_string(),
                            json!(path.display().to_string()),
                        )
                    })
                })
                .collect();
            ctx.output.json(&json!({
                "types": types,
                "default": registry.default_schema_path().display().to_string(),
            }));
        }
        _ => {
            for (document_type, identifier) in registry.document_types() {
                ctx.output
                    .info(&format!("{:<12} {}", document_type, identifier));
            }
            ctx.output.info(&format!(
                "{:<12} {}",
                "(default)",
                registry.default_schema_path().display()
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::ui::output::test_support::{capture, captured};
    use nld::config::Config;

    fn context(mode: OutputMode, config: Config) -> (CliContext, Arc<std::sync::Mutex<Vec<u8>>>) {
        let (output, buffer) = capture(mode);
        let ctx = CliContext {
            config,
            output,
            verbose: false,
        };
        (ctx, buffer)
    }

    #[test]
    fn test_types_lists_builtin_and_configured() {
        let config = Config::parse("types:\n  invoice: schemas/invoice.json\n").unwrap();
        let (ctx, buffer) = context(OutputMode::Human, config);
        cmd_schema_types(&ctx).unwrap();

        let out = captured(&buffer);
        assert!(out.contains("contract"));
        assert!(out.contains("invoice      schemas/invoice.json"));
        assert!(out.contains("nda          schemas/nda.schema.json"));
        assert!(out.contains("(default)"));
    }

    #[test]
    fn test_info_reports_version_from_title() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("s.json");
        std::fs::write(&path, r#"{"title": "Receipt Schema v2.3.1"}"#).unwrap();

        let (ctx, buffer) = context(OutputMode::Json, Config::default());
        cmd_schema_info(&ctx, &path).unwrap();

        let value: serde_json::Value = serde_json::from_str(captured(&buffer).trim()).unwrap();
        assert_eq!(value["title"], "Receipt Schema v2.3.1");
        assert_eq!(value["version"], "2.3.1");
    }

    #[test]
    fn test_info_missing_schema_fails() {
        let (ctx, _buffer) = context(OutputMode::Human, Config::default());
        let err = cmd_schema_info(&ctx, Path::new("/nonexistent/schema.json")).unwrap_err();
        assert!(format!("{:#}", err).contains("schema file not found"));
    }
}
