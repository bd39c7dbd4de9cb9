//! Command module structure for the nld CLI

use std::path::PathBuf;

use nld::config::Config;
use nld::SchemaRegistry;

pub mod init;
pub mod schema;
pub mod ui;
pub mod validate;

use ui::Output;

/// State shared by every command: merged config, output sink and global flags.
pub struct CliContext {
    pub config: Config,
    pub output: Output,
    pub verbose: bool,
}

impl CliContext {
    /// Registry for this run. Identifiers resolve against the configured
    /// `schema_dir`, or else the directory holding the executable.
    pub fn registry(&self) -> SchemaRegistry {
        self.config.registry(executable_dir().as_deref())
    }
}

fn executable_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(PathBuf::from))
}
