//! # Vigil Docs
//!
//! OpenAPI 3.0 generation for Vigil applications.
//!
//! Every route registered on an [`App`](vigil_core::App) whose chain carries
//! a schema contract becomes one operation:
//!
//! - path parameters from the route template, typed by the params schema
//! - query and header parameters from the properties of their schemas
//! - an `application/json` request body from the body schema
//! - one response per status code; a single response schema documents `"200"`
//!
//! ## Quick Start
//!
//! ```
//! use vigil_core::App;
//! use vigil_docs::{generate_json, DocsConfig};
//!
//! let app = App::new();
//! let json = generate_json(&app, Some(DocsConfig::default().title("Orders"))).unwrap();
//! assert!(json.contains("\"title\": \"Orders\""));
//! ```

#![doc(html_root_url = "https://docs.rs/vigil-docs/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod convert;
mod error;
mod generate;
mod openapi;

pub use config::DocsConfig;
pub use convert::to_json_schema;
pub use error::{DocsError, DocsResult};
pub use generate::{generate_json, generate_openapi_spec};
pub use openapi::{
    AdditionalProperties, Info, JsonSchema, MediaType, OpenApi, Operation, Parameter, ParameterIn,
    PathItem, RequestBody, Response, SchemaType, Server, Tag,
};
