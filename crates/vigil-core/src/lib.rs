//! # Vigil Core
//!
//! The host framework the Vigil validation layer plugs into.
//!
//! This crate provides:
//!
//! - [`Request`], [`ResponseWriter`] and [`Exchange`]: per-request state
//! - [`Middleware`] and [`Next`]: ordered chains with an error channel
//! - [`App`]: routing, nesting and dispatch over `http` types
//! - [`SchemaContract`]: the declared shape of a route
//! - [`StatusReply`]: replies whose body shape is tied to their status
//! - [`VigilError`]: the error type carried by the chain
//!
//! ## Example
//!
//! ```
//! use vigil_core::{handler, App};
//! use bytes::Bytes;
//! use http_body_util::Full;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let mut app = App::new();
//! app.get("/health", handler(|ex| Box::pin(async move {
//!     ex.response.json(json!({"status": "ok"}))
//! })));
//!
//! let request = http::Request::get("/health").body(Full::new(Bytes::new())).unwrap();
//! let response = app.handle(request).await;
//! assert_eq!(response.status(), 200);
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/vigil-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod app;
pub mod contract;
mod error;
mod exchange;
pub mod middleware;
pub mod reply;
pub mod request;
pub mod response;

pub use app::{default_error_response, App, Chain, ErrorHandler, RouteEntry, REQUEST_ID_HEADER};
pub use contract::{ContractBuilder, OperationDocs, RequestField, ResponseSchemas, SchemaContract};
pub use error::{ErrorKind, VigilError, VigilResult};
pub use exchange::Exchange;
pub use middleware::{handler, BoxFuture, FnHandler, FnMiddleware, Middleware, Next};
pub use reply::{ReplyScope, StatusReply};
pub use request::Request;
pub use response::{Response, ResponseWriter, APPLICATION_JSON, TEXT_PLAIN};
