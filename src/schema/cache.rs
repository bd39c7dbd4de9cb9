//! Compiled schemas shared across validations.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::debug;

use super::builtin::builtin_schema;
use super::compile::{compile_bytes, compile_path, CompiledSchema};
use crate::error::Result;
use crate::store::SourceStore;

/// Compiles each schema at most once per canonical path.
///
/// Entries are immutable once inserted. Two threads missing on the same
/// path may both compile it; the first insertion wins and both callers get
/// an equivalent schema.
pub struct SchemaCache {
    store: Arc<dyn SourceStore>,
    entries: RwLock<HashMap<PathBuf, Arc<CompiledSchema>>>,
    builtin_fallback: bool,
}

impl SchemaCache {
    pub fn new(store: Arc<dyn SourceStore>) -> Self {
        Self {
            store,
            entries: RwLock::new(HashMap::new()),
            builtin_fallback: true,
        }
    }

    /// Serve the embedded copy of a built-in schema when its file is absent.
    /// Enabled by default.
    pub fn with_builtin_fallback(mut self, enabled: bool) -> Self {
        self.builtin_fallback = enabled;
        self
    }

    pub fn store(&self) -> &dyn SourceStore {
        self.store.as_ref()
    }

    /// Return the compiled schema for `path`, compiling it on first use.
    /// Failures are not cached.
    pub fn get_or_compile(&self, path: &Path) -> Result<Arc<CompiledSchema>> {
        let key = self.store.canonicalize(path);

        if let Ok(entries) = self.entries.read() {
            if let Some(schema) = entries.get(&key) {
                return Ok(Arc::clone(schema));
            }
        }

        let compiled = match builtin_schema(path) {
            Some(contents) if self.builtin_fallback && !self.store.exists(path) => {
                debug!(path = %path.display(), "using built-in schema");
                compile_bytes(&path.display().to_string(), contents.as_bytes())?
            }
            _ => compile_path(self.store.as_ref(), path)?,
        };
        let compiled = Arc::new(compiled);

        match self.entries.write() {
            Ok(mut entries) => Ok(Arc::clone(entries.entry(key).or_insert(compiled))),
            // A poisoned lock only loses caching, not correctness
            Err(_) => Ok(compiled),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
