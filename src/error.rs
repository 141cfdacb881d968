//! Error types for the HR policy assistant

use thiserror::Error;

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, AssistantError>;

/// Error types that can occur while indexing documents or answering a query
#[derive(Error, Debug)]
pub enum AssistantError {
    /// The query was empty (or only whitespace) once PII had been masked.
    #[error("Empty query after redaction.")]
    EmptyQuery,

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Document not found: {id}")]
    DocumentNotFound { id: String },

    #[error("Invalid vector: {reason}")]
    InvalidVector { reason: String },

    #[error("Embedding error ({provider}): {message}")]
    Embedding { provider: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}
