//! Structured validation issues.
//!
//! Every rejected value produces one [`ValidationIssue`] per failed check.
//! Issues are collected rather than returned on first failure, so a single
//! pass reports everything wrong with an input.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// One step into a value: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// An object key.
    Key(String),
    /// An array position.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(idx) => write!(f, "{idx}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(idx: usize) -> Self {
        Self::Index(idx)
    }
}

/// Machine-readable classification of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    /// The value has the wrong JSON type, or is missing.
    InvalidType,
    /// Below a minimum (length, count, or value).
    TooSmall,
    /// Above a maximum (length, count, or value).
    TooBig,
    /// A string failed a pattern or format check.
    InvalidString,
    /// The value differs from the expected literal.
    InvalidLiteral,
    /// The value is not one of the allowed enum members.
    InvalidEnumValue,
    /// A strict object received keys it does not declare.
    UnrecognizedKeys,
    /// No member of a union accepted the value.
    InvalidUnion,
    /// A value was present where none is allowed.
    NotAllowed,
    /// A user-supplied refinement rejected the value.
    Custom,
}

impl IssueCode {
    /// Returns the wire name of this code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidType => "invalid_type",
            Self::TooSmall => "too_small",
            Self::TooBig => "too_big",
            Self::InvalidString => "invalid_string",
            Self::InvalidLiteral => "invalid_literal",
            Self::InvalidEnumValue => "invalid_enum_value",
            Self::UnrecognizedKeys => "unrecognized_keys",
            Self::InvalidUnion => "invalid_union",
            Self::NotAllowed => "not_allowed",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single failed check.
///
/// # Example
///
/// ```
/// use vigil_schema::{IssueCode, ValidationIssue};
///
/// let issue = ValidationIssue::new(IssueCode::TooSmall, "too short").at(vec!["name".into()]);
/// assert_eq!(issue.path_string(), "name");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Issue classification.
    pub code: IssueCode,
    /// Location of the offending value inside the validated input.
    pub path: Vec<PathSegment>,
    /// Human-readable description.
    pub message: String,
    /// Expected type or value, when meaningful.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    /// Received type or value, when meaningful.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received: Option<String>,
}

impl ValidationIssue {
    /// Creates an issue at the root path.
    #[must_use]
    pub fn new(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            code,
            path: Vec::new(),
            message: message.into(),
            expected: None,
            received: None,
        }
    }

    /// Sets the path of this issue.
    #[must_use]
    pub fn at(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }

    /// Records the expected and received descriptions.
    #[must_use]
    pub fn expected_received(
        mut self,
        expected: impl Into<String>,
        received: impl Into<String>,
    ) -> Self {
        self.expected = Some(expected.into());
        self.received = Some(received.into());
        self
    }

    /// Returns the path as a dotted string (`items.0.name`).
    #[must_use]
    pub fn path_string(&self) -> String {
        self.path
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{} ({})", self.message, self.code)
        } else {
            write!(f, "{}: {} ({})", self.path_string(), self.message, self.code)
        }
    }
}

/// Returns the name used in issue messages for a JSON value's type.
#[must_use]
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
