//! Rendering of validation results for people and for programs.

use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};
use std::str::FromStr;

use crate::validator::{ValidationError, ValidationResult, ValidationWarning};

/// How results are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!(
                "unknown output format '{}', expected 'text' or 'json'",
                other
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Presentation switches for [`format_result_as_text`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TextStyle {
    /// Emit ANSI colour codes
    pub color: bool,
    /// Append warnings after the errors
    pub show_warnings: bool,
}

/// Human-readable summary of a result.
///
/// ```
/// use nld::formatters::{format_result_as_text, TextStyle};
/// use nld::validator::ValidationResult;
///
/// let text = format_result_as_text(&ValidationResult::new(vec![], vec![]), &TextStyle::default());
/// assert_eq!(text, "Document is valid.");
/// ```
pub fn format_result_as_text(result: &ValidationResult, style: &TextStyle) -> String {
    let mut out = String::new();

    if result.valid {
        out.push_str(&paint("Document is valid.", true, style.color));
    } else {
        out.push_str(&paint("Document validation failed:", false, style.color));
        out.push('\n');
        for (i, error) in result.errors.iter().enumerate() {
            let _ = writeln!(out, "{}. {}{}", i + 1, error.message, location(error));
        }
    }

    if style.show_warnings && !result.warnings.is_empty() {
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("Warnings:\n");
        for warning in &result.warnings {
            let _ = writeln!(out, "- {} (at {})", warning.message, warning.field);
        }
    }

    out
}

fn location(error: &ValidationError) -> String {
    let mut parts = Vec::new();
    if !error.field.is_empty() {
        parts.push(format!("at {}", error.field));
    }
    if error.line > 0 {
        parts.push(format!("line {}", error.line));
        if error.column > 0 {
            parts.push(format!("column {}", error.column));
        }
    }
    if parts.is_empty() {
        return String::new();
    }
    format!(" ({})", parts.join(", "))
}

fn paint(text: &str, ok: bool, color: bool) -> String {
    match (color, ok) {
        (false, _) => text.to_string(),
        (true, true) => text.green().to_string(),
        (true, false) => text.red().to_string(),
    }
}

/// Machine-readable view of a result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuredResult {
    pub valid: bool,
    pub error_count: usize,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

pub fn format_result_as_structured(result: &ValidationResult) -> StructuredResult {
    StructuredResult {
        valid: result.valid,
        error_count: result.errors.len(),
        errors: result.errors.clone(),
        warnings: result.warnings.clone(),
    }
}
