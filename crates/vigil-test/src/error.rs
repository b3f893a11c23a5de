//! Test error types.

use thiserror::Error;

/// Errors that can occur while building, sending or reading a test request.
#[derive(Debug, Error)]
pub enum TestError {
    /// Request building failed
    #[error("request build error: {0}")]
    RequestBuild(String),

    /// Header name or value is invalid
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// Query string encoding failed
    #[error("query encoding error: {0}")]
    Query(#[from] serde_urlencoded::ser::Error),

    /// Response body reading failed
    #[error("body read error: {0}")]
    BodyRead(String),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
