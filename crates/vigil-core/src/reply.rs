//! Status-linked replies.
//!
//! A [`StatusReply`] type ties each body shape to the status it is sent
//! under, usually as an enum with one variant per status. Registering it on
//! a contract with [`ContractBuilder::replies`](crate::contract::ContractBuilder::replies)
//! and emitting it through [`reply`](crate::ResponseWriter) keeps the
//! declared schemas and the handler's emissions in one place.
//!
//! # Example
//!
//! ```
//! use http::StatusCode;
//! use serde_json::{json, Value};
//! use vigil_core::reply::StatusReply;
//! use vigil_core::VigilResult;
//! use vigil_schema::Schema;
//!
//! enum GetUser {
//!     Found { name: String },
//!     Missing,
//! }
//!
//! impl StatusReply for GetUser {
//!     fn schemas() -> Vec<(StatusCode, Schema)> {
//!         vec![
//!             (StatusCode::OK, Schema::object([("name", Schema::string())])),
//!             (StatusCode::NOT_FOUND, Schema::object([("error", Schema::string())])),
//!         ]
//!     }
//!
//!     fn status(&self) -> StatusCode {
//!         match self {
//!             Self::Found { .. } => StatusCode::OK,
//!             Self::Missing => StatusCode::NOT_FOUND,
//!         }
//!     }
//!
//!     fn into_body(self) -> VigilResult<Value> {
//!         Ok(match self {
//!             Self::Found { name } => json!({ "name": name }),
//!             Self::Missing => json!({ "error": "not found" }),
//!         })
//!     }
//! }
//!
//! assert_eq!(GetUser::Missing.status(), StatusCode::NOT_FOUND);
//! ```

use crate::error::VigilResult;
use crate::exchange::Exchange;
use crate::request::Request;
use http::header::{HeaderName, HeaderValue};
use http::StatusCode;
use serde_json::{Map, Value};
use uuid::Uuid;
use vigil_schema::Schema;

/// A response value that knows its status code.
pub trait StatusReply: Sized {
    /// Returns the schema declared for each status this type can produce.
    fn schemas() -> Vec<(StatusCode, Schema)>;

    /// Returns the status this value is sent under.
    fn status(&self) -> StatusCode;

    /// Converts the value into its JSON body.
    fn into_body(self) -> VigilResult<Value>;
}

/// A handler's view of the exchange when its responses are one
/// [`StatusReply`] type.
///
/// The request, locals and response headers are reachable; the body is not.
/// The handler returns its reply and the caller emits it.
pub struct ReplyScope<'a> {
    ex: &'a mut Exchange,
}

impl std::fmt::Debug for ReplyScope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplyScope").field("exchange", &self.ex).finish()
    }
}

impl<'a> ReplyScope<'a> {
    /// Narrows an exchange.
    pub fn new(ex: &'a mut Exchange) -> Self {
        Self { ex }
    }

    /// Returns the (validated) request.
    #[must_use]
    pub fn request(&self) -> &Request {
        &self.ex.request
    }

    /// Returns the request-scoped locals.
    #[must_use]
    pub fn locals(&self) -> &Map<String, Value> {
        &self.ex.locals
    }

    /// Returns the request id.
    #[must_use]
    pub fn request_id(&self) -> Uuid {
        self.ex.request_id()
    }

    /// Sets a response header.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.ex.response.set_header(name, value);
    }
}
