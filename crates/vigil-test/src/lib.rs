//! # Vigil Test
//!
//! In-memory HTTP testing for Vigil applications. Requests are handed
//! straight to [`App::handle`](vigil_core::App::handle), so no socket is
//! bound and the full middleware pipeline runs.
//!
//! ## Example
//!
//! ```
//! use vigil_core::{handler, App, SchemaContract};
//! use vigil_middleware::ContractExt;
//! use vigil_schema::Schema;
//! use vigil_test::TestClient;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let contract = SchemaContract::builder()
//!     .body(Schema::object([("name", Schema::string().min_length(3))]))
//!     .build()
//!     .unwrap();
//!
//! let mut app = App::new();
//! app.post("/users", contract.handler(handler(|ex| Box::pin(async move {
//!     let body = ex.request.body.clone();
//!     ex.response.json(body)
//! }))));
//!
//! let client = TestClient::new(app);
//!
//! client
//!     .post("/users")
//!     .json(&json!({"name": "Al"}))
//!     .send()
//!     .await
//!     .assert_rejected("body");
//!
//! client
//!     .post("/users")
//!     .json(&json!({"name": "Alice"}))
//!     .send()
//!     .await
//!     .assert_status(200)
//!     .assert_json(&json!({"name": "Alice"}));
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/vigil-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::{TestRequest, TestRequestBuilder};
pub use response::TestResponse;
