use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use super::source_store::SourceStore;

/// In-memory implementation of SourceStore for tests and embedding.
pub struct InMemoryStore {
    files: RwLock<HashMap<PathBuf, Vec<u8>>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Create a new empty InMemoryStore.
    pub fn new() -> Self {
        Self {
            files: RwLock::new(HashMap::new()),
        }
    }

    /// Create a store pre-populated with `(path, contents)` pairs.
    pub fn with_files<P, B>(files: impl IntoIterator<Item = (P, B)>) -> Self
    where
        P: Into<PathBuf>,
        B: Into<Vec<u8>>,
    {
        let map = files
            .into_iter()
            .map(|(path, bytes)| (path.into(), bytes.into()))
            .collect();
        Self {
            files: RwLock::new(map),
        }
    }

    /// Insert or replace a file.
    pub fn insert(&self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) {
        if let Ok(mut files) = self.files.write() {
            files.insert(path.into(), bytes.into());
        }
    }
}

impl SourceStore for InMemoryStore {
    fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>> {
        let files = self
            .files
            .read()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "store lock poisoned"))?;
        files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.files
            .read()
            .map(|files| files.contains_key(path))
            .unwrap_or(false)
    }
}
