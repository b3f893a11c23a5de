//! Per-request state threaded through the middleware chain.

use crate::request::Request;
use crate::response::{Response, ResponseWriter};
use serde_json::{Map, Value};
use uuid::Uuid;

/// One request/response exchange.
///
/// Middleware and handlers receive `&mut Exchange`. The request fields are
/// public so validation can write coerced values back; the response is a
/// boxed [`ResponseWriter`] so middleware can decorate it.
pub struct Exchange {
    /// The incoming request.
    pub request: Request,
    /// The outgoing response.
    pub response: Box<dyn ResponseWriter>,
    /// Request-scoped values set by upstream middleware.
    pub locals: Map<String, Value>,
    request_id: Uuid,
    route: Option<String>,
}

impl std::fmt::Debug for Exchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exchange")
            .field("request_id", &self.request_id)
            .field("method", &self.request.method)
            .field("path", &self.request.path)
            .field("route", &self.route)
            .field("status", &self.response.status_code())
            .field("sent", &self.response.is_sent())
            .finish_non_exhaustive()
    }
}

impl Exchange {
    /// Creates an exchange with a fresh buffered response.
    #[must_use]
    pub fn new(request: Request) -> Self {
        Self {
            request,
            response: Box::new(Response::new()),
            locals: Map::new(),
            request_id: Uuid::now_v7(),
            route: None,
        }
    }

    /// Replaces the response writer.
    #[must_use]
    pub fn with_response(mut self, response: Box<dyn ResponseWriter>) -> Self {
        self.response = response;
        self
    }

    /// Sets a local value.
    #[must_use]
    pub fn with_local(mut self, key: impl Into<String>, value: Value) -> Self {
        self.locals.insert(key.into(), value);
        self
    }

    /// Returns the request identifier (UUID v7, time-ordered).
    #[must_use]
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Returns the matched route pattern, if routing has happened.
    #[must_use]
    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    /// Records the matched route pattern.
    pub fn set_route(&mut self, route: impl Into<String>) {
        self.route = Some(route.into());
    }

    /// Wraps the current response writer in a decorator.
    ///
    /// The decorator owns the previous writer; everything emitted downstream
    /// goes through it.
    pub fn wrap_response<F>(&mut self, wrap: F)
    where
        F: FnOnce(Box<dyn ResponseWriter>) -> Box<dyn ResponseWriter>,
    {
        let inner = std::mem::replace(&mut self.response, Box::new(Response::new()));
        self.response = wrap(inner);
    }

    /// Consumes the exchange and returns the response writer.
    #[must_use]
    pub fn into_response(self) -> Box<dyn ResponseWriter> {
        self.response
    }
}
