//! Error taxonomy for schema resolution, compilation and document loading.
//!
//! Structural problems in a document are never reported through this type:
//! they are data, carried in [`crate::validator::ValidationResult`].

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Why a document could not be used to pick a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputFault {
    /// The bytes are not well-formed JSON.
    Syntax {
        message: String,
        /// 1-based, 0 when unknown
        line: usize,
        /// 1-based, 0 when unknown
        column: usize,
    },
    /// Well-formed JSON without a string `metadata.type`.
    MissingDocumentType,
}

#[derive(Debug)]
pub enum NldError {
    /// Document bytes unusable for schema selection
    MalformedInput(InputFault),
    /// No schema is mapped for the document type
    NotFound { document_type: String },
    /// Schema source location does not exist
    SchemaNotFound(PathBuf),
    /// Schema bytes are not well-formed JSON
    MalformedSchema { origin: String, message: String },
    /// Schema is JSON but breaks schema-authoring rules
    SchemaCompile { origin: String, message: String },
    /// Reading a source failed for a reason other than absence
    Io { path: PathBuf, source: io::Error },
}

impl NldError {
    /// Whether a caller may substitute a default schema and carry on.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            NldError::NotFound { .. } | NldError::MalformedInput(InputFault::MissingDocumentType)
        )
    }

    pub(crate) fn compile(origin: &str, message: impl Into<String>) -> Self {
        NldError::SchemaCompile {
            origin: origin.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for NldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NldError::MalformedInput(InputFault::Syntax {
                message,
                line,
                column,
            }) => {
                if *line > 0 {
                    write!(
                        f,
                        "invalid JSON in document at line {}, column {}: {}",
                        line, column, message
                    )
                } else {
                    write!(f, "invalid JSON in document: {}", message)
                }
            }
            NldError::MalformedInput(InputFault::MissingDocumentType) => {
                write!(f, "document does not declare a metadata.type")
            }
            NldError::NotFound { document_type } => {
                write!(f, "no schema available for document type: {}", document_type)
            }
            NldError::SchemaNotFound(path) => {
                write!(f, "schema file not found: {}", path.display())
            }
            NldError::MalformedSchema { origin, message } => {
                write!(f, "invalid JSON in schema {}: {}", origin, message)
            }
            NldError::SchemaCompile { origin, message } => {
                write!(f, "failed to compile schema {}: {}", origin, message)
            }
            NldError::Io { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for NldError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NldError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, NldError>;
