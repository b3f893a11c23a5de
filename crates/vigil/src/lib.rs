//! # Vigil
//!
//! **Schema-driven validation for HTTP handlers**
//!
//! Vigil attaches a [`SchemaContract`](prelude::SchemaContract) to a route and
//! enforces it on both sides of the handler:
//!
//! - **Request validation**: body, headers, query, params and locals are
//!   checked together; every failure is reported in one `400` response
//! - **Response validation**: emissions are intercepted and checked against
//!   the schema for their status before any bytes are written
//! - **OpenAPI output**: the same contracts produce an OpenAPI 3.0 document
//!
//! ## Quick Start
//!
//! ```
//! use vigil::prelude::*;
//! use serde_json::json;
//!
//! let contract = SchemaContract::builder()
//!     .params(Schema::object([("id", Schema::integer().coerce())]))
//!     .status(200, Schema::object([("id", Schema::integer()), ("name", Schema::string())]))
//!     .status(404, Schema::object([("error", Schema::string())]))
//!     .build()
//!     .unwrap();
//!
//! let mut app = App::new();
//! app.get("/users/:id", contract.handler(handler(|ex| Box::pin(async move {
//!     let id = ex.request.params["id"].clone();
//!     ex.response.json(json!({"id": id, "name": "Ada"}))
//! }))));
//!
//! let doc = generate_openapi_spec(&app, None).unwrap();
//! assert!(doc.paths.contains_key("/users/{id}"));
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Request → App routing → Request validation ──(400)──→ Response
//!                                │
//!                                ↓
//!                   Response interceptor installed
//!                                │
//!                                ↓
//!                             Handler
//!                                │
//! Response ←── status schema check ←── json / send / end
//! ```

#![doc(html_root_url = "https://docs.rs/vigil/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export schema types
pub use vigil_schema as schema;

// Re-export path routing
pub use vigil_router as router;

// Re-export host framework types
pub use vigil_core as core;

// Re-export validation middleware
pub use vigil_middleware as middleware;

// Re-export OpenAPI generation
pub use vigil_docs as docs;

// Re-export configuration
pub use vigil_config as config;

// Re-export logging setup
pub use vigil_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// ```
/// use vigil::prelude::*;
///
/// let schema = Schema::object([("name", Schema::string())]);
/// assert!(schema.properties().is_some());
/// ```
pub mod prelude {
    pub use vigil_core::{
        handler, App, Chain, Exchange, FnMiddleware, Middleware, Next, ReplyScope, Request,
        ResponseWriter, SchemaContract, StatusReply, VigilError, VigilResult,
    };

    pub use vigil_schema::{IssueCode, Schema, ValidationIssue};

    pub use vigil_middleware::{
        ContractExt, ReplyHandler, ValidatedHandler, ValidationErrorBody, ValidationMiddleware,
    };

    pub use vigil_docs::{generate_json, generate_openapi_spec, DocsConfig};

    pub use vigil_config::{ConfigLoader, ValidationConfig, VigilConfig};

    pub use vigil_telemetry::{init_logging, LogConfig};
}
