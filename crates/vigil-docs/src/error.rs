//! Error types for document generation.

use thiserror::Error;

/// Errors that can occur while generating an OpenAPI document.
#[derive(Debug, Error)]
pub enum DocsError {
    /// Failed to serialize the document to JSON.
    #[error("Failed to serialize OpenAPI spec: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// A route could not be expressed as an OpenAPI operation.
    #[error("Invalid operation '{method} {path}': {reason}")]
    InvalidOperation {
        /// Route method.
        method: String,
        /// Route path.
        path: String,
        /// Why the route was rejected.
        reason: String,
    },

    /// The document configuration is unusable.
    #[error("Invalid docs configuration: {reason}")]
    InvalidConfig {
        /// What is wrong with it.
        reason: String,
    },
}

/// Result type for documentation operations.
pub type DocsResult<T> = Result<T, DocsError>;
