//! Mode-aware terminal output for the `nld` commands.
//!
//! - Human: coloured, symbol-prefixed lines
//! - Json: one JSON object per line; human chatter is dropped
//! - Quiet: only errors are emitted
//!
//! Colour is only used when writing to a TTY. A custom writer can be
//! injected to capture output in tests.

use colored::Colorize;
use serde::Serialize;
use serde_json::json;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use nld::formatters::OutputFormat;

/// Output mode selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
    Quiet,
}

impl OutputMode {
    /// Quiet wins over the format, so `-q --output-format json` only reports failures.
    pub fn from_flags(format: OutputFormat, quiet: bool) -> Self {
        match (quiet, format) {
            (true, _) => OutputMode::Quiet,
            (false, OutputFormat::Json) => OutputMode::Json,
            (false, OutputFormat::Text) => OutputMode::Human,
        }
    }
}

#[derive(Clone)]
pub struct Output {
    mode: OutputMode,
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
    is_tty: bool,
}

impl Output {
    /// Create a new Output writing to stdout
    pub fn new(mode: OutputMode) -> Self {
        let is_tty = atty::is(atty::Stream::Stdout);
        Self {
            mode,
            writer: Arc::new(Mutex::new(Box::new(io::stdout()))),
            is_tty,
        }
    }

    /// Create an Output with a custom writer (for testing)
    #[cfg(test)]
    pub fn with_writer(mode: OutputMode, writer: Box<dyn Write + Send>) -> Self {
        Self {
            mode,
            writer: Arc::new(Mutex::new(writer)),
            is_tty: false,
        }
    }

    /// "✓ {msg}" in green
    pub fn success(&self, msg: &str) {
        if self.mode == OutputMode::Human {
            let prefix = self.paint("✓", |s| s.green().to_string());
            self.write_line(&format!("{} {}", prefix, msg));
        }
    }

    /// "⚠ {msg}" in yellow
    pub fn warn(&self, msg: &str) {
        if self.mode == OutputMode::Human {
            let prefix = self.paint("⚠", |s| s.yellow().to_string());
            self.write_line(&format!("{} {}", prefix, msg));
        }
    }

    /// "✗ {msg}" in red. Errors are emitted in every mode.
    pub fn error(&self, msg: &str) {
        match self.mode {
            OutputMode::Human => {
                let line = self.paint(&format!("✗ {}", msg), |s| s.red().to_string());
                self.write_line(&line);
            }
            OutputMode::Json => {
                self.write_json(&json!({ "level": "error", "msg": msg }));
            }
            OutputMode::Quiet => {
                self.write_line(&format!("✗ {}", msg));
            }
        }
    }

    /// Plain text, human mode only
    pub fn info(&self, msg: &str) {
        if self.mode == OutputMode::Human {
            self.write_line(msg);
        }
    }

    /// Indented subordinate text, human mode only
    pub fn detail(&self, msg: &str) {
        if self.mode == OutputMode::Human {
            self.write_line(&format!("  {}", msg));
        }
    }

    /// Serialize `value` as one line of JSON, regardless of mode.
    pub fn json<T: Serialize>(&self, value: &T) {
        match serde_json::to_value(value) {
            Ok(value) => self.write_json(&value),
            Err(e) => self.error(&format!("failed to serialize output: {}", e)),
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    fn paint(&self, text: &str, color: impl Fn(&str) -> String) -> String {
        if self.is_tty {
            color(text)
        } else {
            text.to_string()
        }
    }

    fn write_line(&self, line: &str) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
        }
    }

    fn write_json(&self, value: &serde_json::Value) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", value);
        }
    }
}
