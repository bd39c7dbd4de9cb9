use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// An isolated working directory for running the `nld` binary.
///
/// `XDG_CONFIG_HOME` and `HOME` point into the temp dir so a developer's
/// global config never leaks into a test run.
pub struct TestHarness {
    pub dir: TempDir,
    pub nld_binary: PathBuf,
}

impl TestHarness {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        TestHarness {
            dir,
            nld_binary: PathBuf::from(env!("CARGO_BIN_EXE_nld")),
        }
    }

    /// Returns the base directory path (the TempDir path).
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `contents` to `name` relative to the harness directory.
    #[allow(dead_code)]
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&path, contents).expect("Failed to write file");
        path
    }

    #[allow(dead_code)]
    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.path().join(name)).expect("Failed to read file")
    }

    /// Executes the nld binary with the given arguments in the harness directory.
    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(&self.nld_binary)
            .args(args)
            .current_dir(self.path())
            .env("XDG_CONFIG_HOME", self.path().join(".config"))
            .env("HOME", self.path())
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to run nld")
    }
}

#[allow(dead_code)]
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[allow(dead_code)]
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}
