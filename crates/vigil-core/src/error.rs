//! Error types for Vigil.
//!
//! [`VigilError`] travels the error channel of the middleware chain: a
//! middleware or handler returns `Err(VigilError)` and the application's
//! error handler turns it into a response.
//!
//! Client input that fails request validation never becomes a
//! `VigilError`; the validation middleware answers it directly with a 400.
//! Everything that reaches the error channel is either a routing miss, a
//! malformed request the host could not parse, or a server-side defect.
//!
//! | [`ErrorKind`] | Variants | Default status |
//! |---|---|---|
//! | `Client` | `BadRequest`, `NotFound`, `MethodNotAllowed` | 400 / 404 / 405 |
//! | `Configuration` | `Configuration`, `MissingResponseSchema` | 500 |
//! | `Internal` | `Internal`, `ResponseDecode`, `ResponseValidation`, `ResponseAlreadySent` | 500 |

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use vigil_schema::{SchemaError, ValidationIssue};

/// Result type alias using [`VigilError`].
pub type VigilResult<T> = Result<T, VigilError>;

/// Broad classification of an error for logging and response mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The request itself was unusable or unroutable.
    Client,
    /// The application was wired incorrectly. A programming defect.
    Configuration,
    /// Something failed while producing the response.
    Internal,
}

impl ErrorKind {
    /// Returns the name recorded in log fields.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Configuration => "configuration",
            Self::Internal => "internal",
        }
    }
}

/// Standard error type for Vigil.
///
/// # Example
///
/// ```
/// use vigil_core::{ErrorKind, VigilError};
///
/// let err = VigilError::missing_response_schema(201);
/// assert_eq!(err.kind(), ErrorKind::Configuration);
/// assert!(err.to_string().contains("201"));
/// ```
#[derive(Error, Debug)]
pub enum VigilError {
    /// The application was wired incorrectly.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Human-readable error message.
        message: String,
    },

    /// A response was emitted under a status code with no registered schema.
    #[error("Configuration error: no schema defined for status code {status}")]
    MissingResponseSchema {
        /// The offending status code.
        status: u16,
    },

    /// An unexpected failure, including schema-internal faults.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },

    /// A pre-serialized response body could not be decoded.
    #[error("Internal error: failed to decode response body: {message} at line {line} column {column}")]
    ResponseDecode {
        /// Decoder message.
        message: String,
        /// Line of the failure point (1-based).
        line: usize,
        /// Column of the failure point (1-based).
        column: usize,
    },

    /// A handler emitted a body that violates the schema for its status.
    #[error("Internal error: response for status {status} failed validation: {}", summarize(.issues))]
    ResponseValidation {
        /// The status the body was emitted under.
        status: u16,
        /// The issues found.
        issues: Vec<ValidationIssue>,
    },

    /// A body was emitted twice on the same response.
    #[error("Internal error: response already sent")]
    ResponseAlreadySent,

    /// The host could not parse the request.
    #[error("Bad request: {message}")]
    BadRequest {
        /// Human-readable error message.
        message: String,
    },

    /// No route matched the path.
    #[error("Not found: {method} {path}")]
    NotFound {
        /// Request method.
        method: String,
        /// Request path.
        path: String,
    },

    /// The path matched but not the method.
    #[error("Method not allowed: {method} {path}")]
    MethodNotAllowed {
        /// Request method.
        method: String,
        /// Request path.
        path: String,
        /// Methods registered for the path.
        allowed: Vec<String>,
    },
}

fn summarize(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl VigilError {
    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates the "no schema for this status" configuration error.
    #[must_use]
    pub const fn missing_response_schema(status: u16) -> Self {
        Self::MissingResponseSchema { status }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates a decode error from a `serde_json` failure.
    #[must_use]
    pub fn response_decode(err: &serde_json::Error) -> Self {
        Self::ResponseDecode {
            message: err.to_string(),
            line: err.line(),
            column: err.column(),
        }
    }

    /// Creates a bad request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Converts a schema fault into an internal error.
    ///
    /// `context` names what was being validated (`"body"`, `"response 200"`).
    /// Issue lists are not faults; callers handle them before reaching here.
    #[must_use]
    pub fn from_schema_fault(context: &str, err: SchemaError) -> Self {
        match err {
            SchemaError::Fault {
                path,
                message,
                source,
            } => Self::Internal {
                message: if path.is_empty() {
                    format!("{context}: {message}")
                } else {
                    format!("{context} at '{path}': {message}")
                },
                source,
            },
            SchemaError::Issues(issues) => Self::Internal {
                message: format!("{context}: unexpected validation issues: {}", summarize(&issues)),
                source: None,
            },
        }
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::BadRequest { .. } | Self::NotFound { .. } | Self::MethodNotAllowed { .. } => {
                ErrorKind::Client
            }
            Self::Configuration { .. } | Self::MissingResponseSchema { .. } => {
                ErrorKind::Configuration
            }
            Self::Internal { .. }
            | Self::ResponseDecode { .. }
            | Self::ResponseValidation { .. }
            | Self::ResponseAlreadySent => ErrorKind::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns true for configuration defects.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self.kind(), ErrorKind::Configuration)
    }

    /// Returns the text safe to show a client.
    ///
    /// Server-side errors are reduced to the status reason phrase.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Client => self.to_string(),
            ErrorKind::Configuration | ErrorKind::Internal => self
                .status_code()
                .canonical_reason()
                .unwrap_or("Internal Server Error")
                .to_string(),
        }
    }
}
