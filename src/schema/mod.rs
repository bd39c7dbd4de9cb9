//! Schema resolution and compilation.
//!
//! - [`registry`] maps document types to schema locations
//! - [`compile`] turns schema bytes into an executable [`CompiledSchema`]
//! - [`cache`] keeps compiled schemas keyed by canonical path
//! - [`builtin`] carries the schemas shipped inside the binary

pub mod builtin;
pub mod cache;
pub mod compile;
pub(crate) mod constraint;
pub mod registry;

pub use builtin::builtin_schema;
pub use cache::SchemaCache;
pub use compile::{compile, compile_bytes, compile_path, CompiledSchema, SchemaSource};
pub use constraint::{Format, JsonType};
pub use registry::{document_type_of, SchemaRegistry, DOCUMENT_SCHEMA, NDA_SCHEMA};
