//! Byte sources for schemas and documents.

pub mod in_memory;
pub mod source_store;

pub use in_memory::InMemoryStore;
pub use source_store::{FsStore, SourceStore};
