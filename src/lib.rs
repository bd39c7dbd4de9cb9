//! # NLD - Next-Gen Layout Documents
//!
//! NLD documents are JSON files describing contracts, receipts and
//! agreements. This crate checks them against versioned JSON Schemas and
//! reports every structural problem in a stable, pointer-addressed form.
//!
//! ## Core Concepts
//!
//! - **Registry**: maps a document's `metadata.type` to a schema location
//! - **Compiled schema**: an immutable constraint tree, safe to share between threads
//! - **Validation result**: a `valid` flag plus ordered, located errors
//!
//! ## Modules
//!
//! - [`schema`] - Schema registry, compiler, cache and built-in schemas
//! - [`validator`] - Validation engine, error normalization and source locations
//! - [`formatters`] - Text and structured rendering of results
//! - [`store`] - Byte sources for schemas and documents
//! - [`config`] - Configuration for the `nld` tool
//! - [`document`] / [`templates`] - Typed document model and starter documents
//!
//! ## Example
//!
//! ```no_run
//! use nld::schema::{compile_path, SchemaRegistry};
//! use nld::store::FsStore;
//! use nld::validator::validate;
//!
//! let bytes = std::fs::read("contract.json").expect("Failed to read document");
//! let registry = SchemaRegistry::new();
//! let path = registry.resolve_schema_for_document(&bytes).expect("Unknown document type");
//! let schema = compile_path(&FsStore::new(), &path).expect("Failed to compile schema");
//!
//! let result = validate(&bytes, &schema);
//! for error in &result.errors {
//!     println!("{}: {}", error.field, error.message);
//! }
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod formatters;
pub mod schema;
pub mod store;
pub mod templates;
pub mod validator;

pub use error::{InputFault, NldError, Result};
pub use schema::{CompiledSchema, SchemaCache, SchemaRegistry};
pub use validator::{validate, ValidationError, ValidationResult, ValidationWarning};
