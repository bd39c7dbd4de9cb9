use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Read access to schema and document bytes.
///
/// Everything the validator needs from storage goes through this trait, so
/// the core never assumes a filesystem layout of its own.
pub trait SourceStore: Send + Sync {
    /// Read the full contents at `path`.
    fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Check whether `path` exists.
    fn exists(&self, path: &Path) -> bool;

    /// Stable identity for `path`, used as a cache key.
    fn canonicalize(&self, path: &Path) -> PathBuf {
        path.to_path_buf()
    }
}

/// Filesystem-backed implementation of SourceStore.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStore;

impl FsStore {
    /// Create a new FsStore.
    pub fn new() -> Self {
        Self
    }
}

impl SourceStore for FsStore {
    fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn canonicalize(&self, path: &Path) -> PathBuf {
        fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fs_store_reads_and_checks_existence() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("doc.json");
        fs::write(&path, b"{}").unwrap();

        let store = FsStore::new();
        assert!(store.exists(&path));
        assert_eq!(store.read_bytes(&path).unwrap(), b"{}");
        assert!(!store.exists(&tmp.path().join("missing.json")));
    }

    #[test]
    fn test_fs_store_canonicalize_resolves_dot_segments() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("schemas")).unwrap();
        let path = tmp.path().join("schemas/s.json");
        fs::write(&path, b"{}").unwrap();

        let store = FsStore::new();
        let dotted = tmp.path().join("schemas/../schemas/s.json");
        assert_eq!(store.canonicalize(&dotted), store.canonicalize(&path));
    }

    #[test]
    fn test_fs_store_canonicalize_missing_path_is_identity() {
        let store = FsStore::new();
        let path = Path::new("does/not/exist.json");
        assert_eq!(store.canonicalize(path), path.to_path_buf());
    }
}
