//! `nld init`: write a starter document.

use anyhow::{Context, Result};
use serde_json::json;
use std::fs;
use std::path::Path;
use tracing::debug;

use nld::templates::{new_document, wants_jurisdiction, TemplateFields};

use super::ui::OutputMode;
use super::CliContext;

pub struct InitArgs<'a> {
    pub doc_type: &'a str,
    pub output: &'a Path,
    pub force: bool,
    pub interactive: bool,
    pub title: Option<String>,
}

pub fn cmd_init(ctx: &CliContext, args: InitArgs<'_>) -> Result<()> {
    if ctx.verbose {
        ctx.output.info(&format!(
            "Initializing new {} document: {}",
            args.doc_type,
            args.output.display()
        ));
    }

    if args.output.exists() && !args.force {
        anyhow::bail!(
            "file already exists: {} (use --force to overwrite)",
            args.output.display()
        );
    }

    let mut fields = TemplateFields {
        title: args.title.clone(),
        ..TemplateFields::default()
    };

    if args.interactive {
        if atty::is(atty::Stream::Stdin) {
            prompt_fields(ctx, args.doc_type, &mut fields)?;
        } else {
            ctx.output
                .warn("--interactive needs a terminal; using default metadata");
        }
    }

    let document = new_document(args.doc_type, &fields);
    let json = document.to_json_pretty()?;

    if let Some(dir) = args.output.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create directory {}", dir.display()))?;
    }
    fs::write(args.output, json)
        .with_context(|| format!("failed to write document {}", args.output.display()))?;
    debug!(path = %args.output.display(), doc_type = args.doc_type, "wrote document");

    match ctx.output.mode() {
        OutputMode::Json => ctx.output.json(&json!({
            "created": args.output.display().to_string(),
            "type": document.metadata.doc_type,
        })),
        _ => ctx.output.success(&format!(
            "Created new {} document: {}",
            document.metadata.doc_type,
            args.output.display()
        )),
    }
    Ok(())
}

fn prompt_fields(ctx: &CliContext, doc_type: &str, fields: &mut TemplateFields) -> Result<()> {
    ctx.output
        .info("Enter document metadata (press Enter to use default):");

    if fields.title.is_none() {
        let title: String = dialoguer::Input::new()
            .with_prompt("Title")
            .default(format!("New {}", doc_type.to_lowercase()))
            .interact_text()?;
        fields.title = Some(title);
    }

    let author: String = dialoguer::Input::new()
        .with_prompt("Author")
        .allow_empty(true)
        .interact_text()?;
    fields.author = Some(author);

    if wants_jurisdiction(doc_type) {
        let jurisdiction: String = dialoguer::Input::new()
            .with_prompt("Jurisdiction")
            .allow_empty(true)
            .interact_text()?;
        fields.jurisdiction = Some(jurisdiction);
    }

    Ok(())
}
