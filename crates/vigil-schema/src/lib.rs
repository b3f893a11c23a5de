//! # Vigil Schema
//!
//! Declarative schemas for JSON-shaped values.
//!
//! A [`Schema`] validates a [`serde_json::Value`] and returns the parsed
//! result: coerced where coercion was requested, stripped of undeclared
//! object keys, with defaults filled in and transforms applied. Failures are
//! reported as a flat list of [`ValidationIssue`]s, each with a path into the
//! input, a message, and an [`IssueCode`].
//!
//! ## Issues versus faults
//!
//! [`SchemaError::Issues`] means the input is wrong. [`SchemaError::Fault`]
//! means the schema's own logic failed (a transform returned an error). The
//! validation middleware answers the first with a 400 and propagates the
//! second as a server error.
//!
//! ## Example
//!
//! ```
//! use vigil_schema::{Schema, SchemaError};
//! use serde_json::json;
//!
//! let query = Schema::object([
//!     ("page", Schema::integer().coerce().min(1.0).default(1)),
//!     ("q", Schema::string().optional()),
//! ]);
//!
//! let parsed = query.validate(&json!({"page": "3"})).unwrap();
//! assert_eq!(parsed, json!({"page": 3}));
//!
//! let err = query.validate(&json!({"page": "0"})).unwrap_err();
//! assert!(matches!(err, SchemaError::Issues(ref issues) if issues.len() == 1));
//! ```

#![doc(html_root_url = "https://docs.rs/vigil-schema/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod issue;
pub mod schema;
mod validate;

pub use error::{SchemaError, SchemaResult};
pub use issue::{type_name, IssueCode, PathSegment, ValidationIssue};
pub use schema::{NumberRules, RefineFn, Schema, SchemaKind, StringRules, TransformFn, UnknownKeys};
