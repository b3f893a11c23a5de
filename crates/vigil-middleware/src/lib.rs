//! # Vigil Middleware
//!
//! Schema-driven request and response validation for Vigil chains.
//!
//! - [`RequestValidator`] checks headers, body, query, params and locals,
//!   aggregating every issue into one 400 response
//! - [`ValidatedResponse`] checks each emitted body against the schema for
//!   its status code
//! - [`ValidationMiddleware`] and [`ValidatedHandler`] combine the two into
//!   chain units
//!
//! ## Example
//!
//! ```
//! use bytes::Bytes;
//! use http_body_util::{BodyExt, Full};
//! use serde_json::json;
//! use vigil_core::{handler, App, SchemaContract};
//! use vigil_middleware::ContractExt;
//! use vigil_schema::Schema;
//!
//! # tokio_test::block_on(async {
//! let contract = SchemaContract::builder()
//!     .params(Schema::object([("id", Schema::integer().coerce())]))
//!     .status(200, Schema::object([("id", Schema::integer())]))
//!     .build()
//!     .unwrap();
//!
//! let mut app = App::new();
//! app.get(
//!     "/users/:id",
//!     contract.handler(handler(|ex| {
//!         Box::pin(async move {
//!             let id = ex.request.params["id"].clone();
//!             ex.response.json(json!({ "id": id }))
//!         })
//!     })),
//! );
//!
//! let ok = app
//!     .handle(http::Request::get("/users/7").body(Full::new(Bytes::new())).unwrap())
//!     .await;
//! assert_eq!(ok.status(), 200);
//! let body = ok.into_body().collect().await.unwrap().to_bytes();
//! assert_eq!(&body[..], br#"{"id":7}"#);
//!
//! let bad = app
//!     .handle(http::Request::get("/users/seven").body(Full::new(Bytes::new())).unwrap())
//!     .await;
//! assert_eq!(bad.status(), 400);
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/vigil-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod compose;
pub mod headers;
pub mod request;
pub mod response;

pub use compose::{ContractExt, ReplyHandler, ValidatedHandler, ValidationMiddleware};
pub use headers::{merge_headers, normalize_headers};
pub use request::{FieldIssue, RequestOutcome, RequestValidator, ValidationErrorBody};
pub use response::{ActiveStatus, ValidatedResponse};
