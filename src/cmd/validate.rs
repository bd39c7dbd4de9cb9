//! `nld validate`: check documents against their schemas.
//!
//! Without `--force` files are checked in order and the command stops at
//! the first failure. With `--force` every file is checked in parallel and
//! reported in input order, followed by a summary.

use anyhow::Result;
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use nld::formatters::{format_result_as_structured, StructuredResult};
use nld::store::FsStore;
use nld::validator::{validate_with, ValidateOptions, ValidationResult};
use nld::{InputFault, NldError, SchemaCache, SchemaRegistry};

use super::ui::OutputMode;
use super::CliContext;

pub struct ValidateArgs<'a> {
    pub files: &'a [String],
    pub schema: Option<&'a Path>,
    pub force: bool,
    /// Overrides `validation.jobs` from config
    pub jobs: Option<usize>,
}

/// What happened to one input file.
#[derive(Debug)]
pub enum FileOutcome {
    Checked {
        file: String,
        schema: PathBuf,
        result: ValidationResult,
    },
    /// The file could not be validated at all
    Failed { file: String, reason: String },
}

impl FileOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, FileOutcome::Checked { result, .. } if result.valid)
    }
}

/// Everything needed to validate one file, shared across workers.
struct Validation<'a> {
    registry: SchemaRegistry,
    cache: SchemaCache,
    schema: Option<&'a Path>,
    options: ValidateOptions,
}

impl Validation<'_> {
    fn run(&self, file: &str) -> FileOutcome {
        let failed = |reason: String| FileOutcome::Failed {
            file: file.to_string(),
            reason,
        };

        let path = Path::new(file);
        if !path.exists() {
            return failed("file not found".to_string());
        }
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => return failed(format!("failed to read document: {}", e)),
        };

        let schema_path = match self.schema {
            Some(schema) => schema.to_path_buf(),
            None => match self.registry.resolve_schema_or_default(&bytes) {
                Ok(schema) => schema,
                // The validator reports the syntax error with its position
                Err(NldError::MalformedInput(InputFault::Syntax { .. })) => {
                    self.registry.default_schema_path()
                }
                Err(e) => return failed(format!("failed to determine schema: {}", e)),
            },
        };

        let schema = match self.cache.get_or_compile(&schema_path) {
            Ok(schema) => schema,
            Err(e) => return failed(format!("failed to load schema: {}", e)),
        };

        let result = validate_with(&bytes, &schema, &self.options);
        debug!(file, schema = schema.origin(), valid = result.valid, "validated");
        FileOutcome::Checked {
            file: file.to_string(),
            schema: schema_path,
            result,
        }
    }
}

pub fn cmd_validate(ctx: &CliContext, args: ValidateArgs<'_>) -> Result<()> {
    let validation = Validation {
        registry: ctx.registry(),
        cache: SchemaCache::new(Arc::new(FsStore::new())),
        schema: args.schema,
        options: ValidateOptions {
            warn_undeclared: ctx.config.validation.warn_undeclared,
            ..ValidateOptions::default()
        },
    };

    if !args.force {
        for file in args.files {
            announce(ctx, file, args.schema);
            let outcome = validation.run(file);
            report(ctx, &outcome);
            if !outcome.is_valid() {
                anyhow::bail!("document validation failed");
            }
        }
        return Ok(());
    }

    let jobs = args.jobs.unwrap_or(ctx.config.validation.jobs);
    let outcomes = validate_all(&validation, args.files, jobs)?;

    let mut valid = 0;
    for (file, outcome) in args.files.iter().zip(&outcomes) {
        announce(ctx, file, args.schema);
        report(ctx, outcome);
        if outcome.is_valid() {
            valid += 1;
        }
    }
    let invalid = outcomes.len() - valid;

    if args.files.len() > 1 {
        match ctx.output.mode() {
            OutputMode::Json => ctx.output.json(&Summary { valid, invalid }),
            _ => ctx.output.info(&format!(
                "\nValidation summary: {} valid, {} invalid",
                valid, invalid
            )),
        }
    }

    if invalid > 0 {
        anyhow::bail!("{} file(s) failed validation", invalid);
    }
    Ok(())
}

/// Expand glob patterns in the argument list, keeping argument order.
/// Arguments without a match are kept literally so they are reported as
/// missing.
pub fn expand_patterns(args: &[String]) -> Vec<String> {
    use glob::glob;

    let mut files = Vec::new();
    for arg in args {
        let is_pattern = arg.contains(['*', '?', '[']);
        let matches: Vec<String> = match glob(arg) {
            Ok(paths) if is_pattern => paths
                .filter_map(|p| p.ok())
                .map(|p| p.display().to_string())
                .collect(),
            _ => Vec::new(),
        };
        if matches.is_empty() {
            files.push(arg.clone());
        } else {
            files.extend(matches);
        }
    }
    files
}

/// Validate every file in parallel, keeping input order.
fn validate_all(
    validation: &Validation<'_>,
    files: &[String],
    jobs: usize,
) -> Result<Vec<FileOutcome>> {
    let work = || -> Vec<FileOutcome> {
        files
            .par_iter()
            .map(|file| validation.run(file))
            .collect()
    };

    if jobs == 0 {
        return Ok(work());
    }
    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
    Ok(pool.install(work))
}

fn announce(ctx: &CliContext, file: &str, schema: Option<&Path>) {
    if ctx.verbose {
        ctx.output.info(&format!("Validating file: {}", file));
        if let Some(schema) = schema {
            ctx.output
                .info(&format!("Using schema: {}", schema.display()));
        }
    }
}

#[derive(Serialize)]
struct FileReport<'a> {
    file: &'a str,
    schema: String,
    #[serde(flatten)]
    result: StructuredResult,
}

#[derive(Serialize)]
struct FailureReport<'a> {
    file: &'a str,
    valid: bool,
    error: &'a str,
}

#[derive(Serialize)]
struct Summary {
    valid: usize,
    invalid: usize,
}

fn report(ctx: &CliContext, outcome: &FileOutcome) {
    match (ctx.output.mode(), outcome) {
        (OutputMode::Json, FileOutcome::Checked { file, schema, result }) => {
            ctx.output.json(&FileReport {
                file,
                schema: schema.display().to_string(),
                result: format_result_as_structured(result),
            })
        }
        (OutputMode::Json, FileOutcome::Failed { file, reason }) => {
            ctx.output.json(&FailureReport {
                file,
                valid: false,
                error: reason,
            })
        }
        (_, FileOutcome::Failed { file, reason }) => {
            debug!(file = file.as_str(), reason = reason.as_str(), "could not validate");
            ctx.output.error(&format!("{}: {}", file, reason));
        }
        (_, FileOutcome::Checked { file, schema, result }) => {
            if ctx.verbose {
                ctx.output.info(&format!("Schema: {}", schema.display()));
            }
            report_text(ctx, file, result);
        }
    }
}

fn report_text(ctx: &CliContext, file: &str, result: &ValidationResult) {
    if result.valid {
        ctx.output.success(&format!("{} is valid", file));
    } else {
        ctx.output
            .error(&format!("{} has {} errors:", file, result.errors.len()));
        for error in &result.errors {
            let line = if error.line > 0 {
                format!("Line {}: ", error.line)
            } else {
                String::new()
            };
            ctx.output.detail(&format!("- {}{}", line, error.message));
            if ctx.verbose && !error.field.is_empty() {
                ctx.output.detail(&format!("  at {}", error.field));
            }
        }
    }

    if ctx.verbose {
        for warning in &result.warnings {
            ctx.output
                .warn(&format!("{} (at {})", warning.message, warning.field));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::ui::output::test_support::{capture, captured};
    use nld::config::Config;
    use tempfile::TempDir;

    const VALID: &str = r#"{"metadata":{"version":"1.0.0","type":"contract","created":"2025-06-27T12:00:00Z","title":"T"},"content":{"sections":[{"id":"s1","title":"S","content":"c"}]}}"#;
    const INVALID: &str = r#"{"metadata":{"version":"1.0.0","type":"contract","created":"2025-06-27T12:00:00Z"},"content":{"sections":[]}}"#;

    fn context(mode: OutputMode) -> (CliContext, Arc<std::sync::Mutex<Vec<u8>>>) {
        let (output, buffer) = capture(mode);
        let ctx = CliContext {
            config: Config::default(),
            output,
            verbose: false,
        };
        (ctx, buffer)
    }

    fn write(dir: &TempDir, name: &str, contents: &str) -> String {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path.display().to_string()
    }

    #[test]
    fn test_stops_at_first_failure_without_force() {
        let tmp = TempDir::new().unwrap();
        let files = vec![
            write(&tmp, "bad.json", INVALID),
            write(&tmp, "good.json", VALID),
        ];
        let (ctx, buffer) = context(OutputMode::Human);
        let args = ValidateArgs {
            files: &files,
            schema: None,
            force: false,
            jobs: None,
        };
        assert!(cmd_validate(&ctx, args).is_err());

        let out = captured(&buffer);
        assert!(out.contains("bad.json has 2 errors:"));
        assert!(!out.contains("good.json"));
    }

    #[test]
    fn test_force_reports_all_in_order_with_summary() {
        let tmp = TempDir::new().unwrap();
        let files = vec![
            write(&tmp, "a.json", VALID),
            write(&tmp, "b.json", INVALID),
            tmp.path().join("missing.json").display().to_string(),
            write(&tmp, "d.json", VALID),
        ];
        let (ctx, buffer) = context(OutputMode::Human);
        let args = ValidateArgs {
            files: &files,
            schema: None,
            force: true,
            jobs: Some(2),
        };
        let err = cmd_validate(&ctx, args).unwrap_err();
        assert_eq!(err.to_string(), "2 file(s) failed validation");

        let out = captured(&buffer);
        let a = out.find("a.json is valid").unwrap();
        let b = out.find("b.json has 2 errors").unwrap();
        let c = out.find("missing.json: file not found").unwrap();
        let d = out.find("d.json is valid").unwrap();
        assert!(a < b && b < c && c < d);
        assert!(out.contains("Validation summary: 2 valid, 2 invalid"));
    }

    #[test]
    fn test_json_reports_one_object_per_file() {
        let tmp = TempDir::new().unwrap();
        let files = vec![write(&tmp, "a.json", VALID), write(&tmp, "b.json", INVALID)];
        let (ctx, buffer) = context(OutputMode::Json);
        let args = ValidateArgs {
            files: &files,
            schema: None,
            force: true,
            jobs: None,
        };
        assert!(cmd_validate(&ctx, args).is_err());

        let out = captured(&buffer);
        let lines: Vec<serde_json::Value> = out
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["valid"], true);
        assert_eq!(lines[1]["valid"], false);
        assert_eq!(lines[1]["error_count"], 2);
        assert_eq!(lines[1]["errors"][0]["field"], "/metadata");
        assert_eq!(lines[2]["invalid"], 1);
    }

    #[test]
    fn test_malformed_document_reports_parse_error() {
        let tmp = TempDir::new().unwrap();
        let files = vec![write(&tmp, "broken.json", "{\n  \"metadata\": \n")];
        let (ctx, buffer) = context(OutputMode::Human);
        let args = ValidateArgs {
            files: &files,
            schema: None,
            force: false,
            jobs: None,
        };
        assert!(cmd_validate(&ctx, args).is_err());
        let out = captured(&buffer);
        assert!(out.contains("broken.json has 1 errors:"));
        assert!(out.contains("Invalid JSON"));
    }

    #[test]
    fn test_expand_patterns_keeps_literals() {
        let tmp = TempDir::new().unwrap();
        write(&tmp, "b.json", VALID);
        write(&tmp, "a.json", VALID);
        write(&tmp, "notes.txt", "");
        let pattern = tmp.path().join("*.json").display().to_string();
        let missing = tmp.path().join("gone.json").display().to_string();

        let files = expand_patterns(&[missing.clone(), pattern]);
        assert_eq!(files.len(), 3);
        assert_eq!(files[0], missing);
        assert!(files[1].ends_with("a.json"));
        assert!(files[2].ends_with("b.json"));
    }

    #[test]
    fn test_explicit_schema_is_used() {
        let tmp = TempDir::new().unwrap();
        let schema = write(&tmp, "loose.json", r#"{"title": "Loose v0.1", "type": "object"}"#);
        let files = vec![write(&tmp, "doc.json", r#"{"anything": true}"#)];
        let (ctx, buffer) = context(OutputMode::Human);
        let args = ValidateArgs {
            files: &files,
            schema: Some(Path::new(&schema)),
            force: false,
            jobs: None,
        };
        cmd_validate(&ctx, args).unwrap();
        assert!(captured(&buffer).contains("doc.json is valid"));
    }
}
