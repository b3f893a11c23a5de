//! Response emission.
//!
//! [`ResponseWriter`] is the outgoing side of an exchange: a settable status,
//! headers, and three ways to finish (`json`, `send`, `end`). The buffered
//! [`Response`] is the host implementation. Middleware that needs to observe
//! or police emission wraps the writer in a decorator implementing the same
//! trait (see [`Exchange::wrap_response`](crate::Exchange::wrap_response)).
//!
//! A body may be emitted once; a second emission fails with
//! [`VigilError::ResponseAlreadySent`].

use crate::error::{VigilError, VigilResult};
use crate::reply::StatusReply;
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, StatusCode};
use http_body_util::Full;
use serde_json::Value;

/// Content type set by [`ResponseWriter::json`].
pub const APPLICATION_JSON: &str = "application/json";

/// Content type set by [`ResponseWriter::send`] for string bodies.
pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// The outgoing-response interface handed to middleware and handlers.
///
/// Implementations are driven from one task at a time; `&mut self` on every
/// mutating method makes concurrent emission impossible.
pub trait ResponseWriter: Send {
    /// Chooses the status code.
    fn set_status(&mut self, status: StatusCode);

    /// Returns the currently chosen status code.
    fn status_code(&self) -> StatusCode;

    /// Returns the headers set so far.
    fn headers(&self) -> &HeaderMap;

    /// Sets a header, replacing any previous value.
    fn set_header(&mut self, name: HeaderName, value: HeaderValue);

    /// Returns the declared content type, if any.
    fn content_type(&self) -> Option<&str> {
        self.headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Emits a structured value serialized as JSON.
    fn json(&mut self, value: Value) -> VigilResult<()>;

    /// Emits a value that may already be serialized.
    ///
    /// Strings are written verbatim (as `text/plain` unless a content type
    /// was set), `null` writes an empty body, anything else is serialized as
    /// JSON.
    fn send(&mut self, value: Value) -> VigilResult<()>;

    /// Finishes the response without a body.
    fn end(&mut self) -> VigilResult<()>;

    /// Returns true once a body has been emitted or the response ended.
    fn is_sent(&self) -> bool;

    /// Converts the buffered response into an HTTP response.
    fn finish(self: Box<Self>) -> http::Response<Full<Bytes>>;
}

impl dyn ResponseWriter {
    /// Chooses the status code and returns the writer for chaining.
    ///
    /// ```
    /// use vigil_core::{Response, ResponseWriter};
    /// use http::StatusCode;
    /// use serde_json::json;
    ///
    /// let mut res: Box<dyn ResponseWriter> = Box::new(Response::new());
    /// res.status(StatusCode::NOT_FOUND).json(json!({"error": "nf"})).unwrap();
    /// assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    /// ```
    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        self.set_status(status);
        self
    }

    /// Sets the content type and returns the writer for chaining.
    pub fn set_type(&mut self, mime: &str) -> &mut Self {
        match HeaderValue::from_str(mime) {
            Ok(value) => self.set_header(CONTENT_TYPE, value),
            Err(_) => tracing::warn!(mime, "ignoring invalid content type"),
        }
        self
    }

    /// Emits a typed reply: its status, then its body as JSON.
    ///
    /// Any reply type is accepted here. Handlers built with
    /// `ValidationMiddleware::replying` are restricted to the reply type
    /// their contract was derived from.
    pub fn reply<R: StatusReply>(&mut self, reply: R) -> VigilResult<()> {
        self.set_status(reply.status());
        let body = reply.into_body()?;
        self.json(body)
    }
}

/// The buffered host response.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    sent: bool,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    /// Creates an unsent `200 OK` response with no headers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            sent: false,
        }
    }

    /// Returns the buffered body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    fn ensure_unsent(&self) -> VigilResult<()> {
        if self.sent {
            Err(VigilError::ResponseAlreadySent)
        } else {
            Ok(())
        }
    }

    fn default_content_type(&mut self, mime: &'static str) {
        if !self.headers.contains_key(CONTENT_TYPE) {
            self.headers
                .insert(CONTENT_TYPE, HeaderValue::from_static(mime));
        }
    }

    fn write(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
        self.sent = true;
    }
}

impl ResponseWriter for Response {
    fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    fn json(&mut self, value: Value) -> VigilResult<()> {
        self.ensure_unsent()?;
        let bytes = serde_json::to_vec(&value)
            .map_err(|e| VigilError::internal_with_source("failed to serialize response", e))?;
        self.default_content_type(APPLICATION_JSON);
        self.write(bytes);
        Ok(())
    }

    fn send(&mut self, value: Value) -> VigilResult<()> {
        match value {
            Value::String(text) => {
                self.ensure_unsent()?;
                self.default_content_type(TEXT_PLAIN);
                self.write(text);
                Ok(())
            }
            Value::Null => self.end(),
            other => self.json(other),
        }
    }

    fn end(&mut self) -> VigilResult<()> {
        self.ensure_unsent()?;
        self.write(Bytes::new());
        Ok(())
    }

    fn is_sent(&self) -> bool {
        self.sent
    }

    fn finish(self: Box<Self>) -> http::Response<Full<Bytes>> {
        let Response {
            status,
            headers,
            body,
            ..
        } = *self;
        let mut response = http::Response::new(Full::new(body));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::json;

    async fn body_text(response: http::Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_json_sets_content_type() {
        let mut res = Response::new();
        res.json(json!({"ok": true})).unwrap();
        assert!(res.is_sent());
        assert_eq!(res.content_type(), Some(APPLICATION_JSON));

        let http = Box::new(res).finish();
        assert_eq!(http.status(), StatusCode::OK);
        assert_eq!(body_text(http).await, r#"{"ok":true}"#);
    }

    #[tokio::test]
    async fn test_send_string_is_verbatim() {
        let mut res = Response::new();
        res.send(json!("hello")).unwrap();
        assert_eq!(res.content_type(), Some(TEXT_PLAIN));
        assert_eq!(body_text(Box::new(res).finish()).await, "hello");
    }

    #[tokio::test]
    async fn test_send_keeps_declared_content_type() {
        let mut res = Response::new();
        res.set_header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        res.send(json!(r#"{"a":1}"#)).unwrap();
        assert_eq!(res.content_type(), Some("application/json"));
        assert_eq!(body_text(Box::new(res).finish()).await, r#"{"a":1}"#);
    }

    #[test]
    fn test_send_object_serializes() {
        let mut res = Response::new();
        res.send(json!({"a": 1})).unwrap();
        assert_eq!(res.body().as_ref(), br#"{"a":1}"#);
    }

    #[test]
    fn test_second_emission_fails() {
        let mut res = Response::new();
        res.end().unwrap();
        assert!(matches!(
            res.json(json!(1)),
            Err(VigilError::ResponseAlreadySent)
        ));
        assert!(matches!(
            res.send(json!("x")),
            Err(VigilError::ResponseAlreadySent)
        ));
    }

    #[test]
    fn test_chaining_on_trait_object() {
        let mut res: Box<dyn ResponseWriter> = Box::new(Response::new());
        res.status(StatusCode::CREATED)
            .set_type("application/vnd.api+json")
            .send(json!({"id": 1}))
            .unwrap();
        assert_eq!(res.status_code(), StatusCode::CREATED);
        assert_eq!(res.content_type(), Some("application/vnd.api+json"));
    }

    #[test]
    fn test_finish_keeps_status_and_headers() {
        let mut res = Response::new();
        res.set_status(StatusCode::NO_CONTENT);
        res.set_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("abc"),
        );
        res.end().unwrap();
        let http = Box::new(res).finish();
        assert_eq!(http.status(), StatusCode::NO_CONTENT);
        assert_eq!(http.headers()["x-request-id"], "abc");
    }
}
