//! Schema validation errors.

use crate::issue::ValidationIssue;
use thiserror::Error;

/// Result type alias using [`SchemaError`].
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Why a value did not produce a parsed result.
///
/// The two variants are disjoint: [`SchemaError::Issues`] means the
/// input was wrong, [`SchemaError::Fault`] means the schema itself broke while
/// processing it (for example a custom transform returned an error).
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The input failed one or more checks.
    #[error("validation failed with {} issue(s)", .0.len())]
    Issues(Vec<ValidationIssue>),

    /// A schema-internal failure unrelated to the shape of the input.
    #[error("schema fault at '{path}': {message}")]
    Fault {
        /// Dotted path of the value being processed when the fault occurred.
        path: String,
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl SchemaError {
    /// Creates a fault without an underlying error.
    #[must_use]
    pub fn fault(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fault {
            path: path.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Returns the issues if this is a validation failure.
    #[must_use]
    pub fn issues(&self) -> Option<&[ValidationIssue]> {
        match self {
            Self::Issues(issues) => Some(issues),
            Self::Fault { .. } => None,
        }
    }

    /// Returns true for a schema-internal fault.
    #[must_use]
    pub const fn is_fault(&self) -> bool {
        matches!(self, Self::Fault { .. })
    }
}
