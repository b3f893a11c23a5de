//! Test response wrapper.

use crate::error::TestError;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, StatusCode};
use http_body_util::{BodyExt, Full};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A buffered response with helper methods for assertions.
#[derive(Debug, Clone)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    /// Buffers an application response.
    pub async fn from_http(response: http::Response<Full<Bytes>>) -> Result<Self, TestError> {
        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| TestError::BodyRead(e.to_string()))?
            .to_bytes();
        Ok(Self::new(parts.status, parts.headers, body))
    }

    /// Creates a test response from raw parts.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Returns the status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the status code as a u16.
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns true if the status is successful (2xx).
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns a reference to the headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Gets a header value by name.
    pub fn header(&self, name: impl AsRef<str>) -> Option<&HeaderValue> {
        self.headers.get(name.as_ref())
    }

    /// Gets a header value as a string.
    pub fn header_str(&self, name: impl AsRef<str>) -> Option<&str> {
        self.header(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the Content-Type header value.
    pub fn content_type(&self) -> Option<&str> {
        self.header_str(header::CONTENT_TYPE.as_str())
    }

    /// Returns the raw body bytes.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as a string.
    pub fn text(&self) -> Result<String, TestError> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| TestError::BodyRead(format!("invalid UTF-8: {e}")))
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        serde_json::from_slice(&self.body).map_err(TestError::Json)
    }

    /// Deserializes the body as a JSON value.
    pub fn json_value(&self) -> Result<Value, TestError> {
        self.json()
    }

    /// Returns the `errors` array of a validation rejection.
    ///
    /// Empty if the body is not a rejection.
    pub fn validation_errors(&self) -> Vec<Value> {
        match self.json_value() {
            Ok(Value::Object(mut map)) => match map.remove("errors") {
                Some(Value::Array(errors)) => errors,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    // Assertion methods

    /// Asserts that the status code equals the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    #[track_caller]
    pub fn assert_status(&self, expected: u16) -> &Self {
        assert_eq!(
            self.status.as_u16(),
            expected,
            "expected status {expected}, got {} with body {:?}",
            self.status.as_u16(),
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    /// Asserts that a header exists with the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the header doesn't exist or doesn't match.
    #[track_caller]
    pub fn assert_header(&self, name: impl AsRef<str>, expected: impl AsRef<str>) -> &Self {
        let name = name.as_ref();
        let expected = expected.as_ref();
        let Some(actual) = self.header_str(name) else {
            panic!("header '{name}' not found");
        };
        assert_eq!(actual, expected, "header '{name}' mismatch");
        self
    }

    /// Asserts that the Content-Type starts with `expected`.
    ///
    /// # Panics
    ///
    /// Panics if Content-Type is missing or doesn't match.
    #[track_caller]
    pub fn assert_content_type(&self, expected: impl AsRef<str>) -> &Self {
        let expected = expected.as_ref();
        let Some(actual) = self.content_type() else {
            panic!("Content-Type header not found");
        };
        assert!(
            actual.starts_with(expected),
            "Content-Type: expected '{expected}', got '{actual}'"
        );
        self
    }

    /// Asserts that the body is JSON equal to `expected`.
    ///
    /// # Panics
    ///
    /// Panics if the body is not JSON or differs.
    #[track_caller]
    pub fn assert_json(&self, expected: &Value) -> &Self {
        match self.json_value() {
            Ok(actual) => assert_eq!(&actual, expected, "JSON body mismatch"),
            Err(e) => panic!("body is not JSON ({e}): {:?}", String::from_utf8_lossy(&self.body)),
        }
        self
    }

    /// Asserts that the body contains the expected substring.
    ///
    /// # Panics
    ///
    /// Panics if the body doesn't contain the substring.
    #[track_caller]
    pub fn assert_body_contains(&self, expected: impl AsRef<str>) -> &Self {
        let expected = expected.as_ref();
        let body = String::from_utf8_lossy(&self.body);
        assert!(
            body.contains(expected),
            "body should contain '{expected}', got: {body}"
        );
        self
    }

    /// Asserts a 400 validation rejection with an issue for `field`.
    ///
    /// # Panics
    ///
    /// Panics if the response is not a rejection naming that field.
    #[track_caller]
    pub fn assert_rejected(&self, field: &str) -> &Self {
        self.assert_status(400);
        let errors = self.validation_errors();
        assert!(
            errors.iter().any(|e| e["location"] == field),
            "no validation error for '{field}' in {errors:?}"
        );
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: u16, content_type: &'static str, body: &'static str) -> TestResponse {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        TestResponse::new(
            StatusCode::from_u16(status).unwrap(),
            headers,
            Bytes::from_static(body.as_bytes()),
        )
    }

    #[test]
    fn test_accessors() {
        let res = response(201, "application/json", r#"{"id":1}"#);
        assert_eq!(res.status_code(), 201);
        assert!(res.is_success());
        assert_eq!(res.content_type(), Some("application/json"));
        assert_eq!(res.json_value().unwrap(), json!({"id": 1}));
        assert_eq!(res.text().unwrap(), r#"{"id":1}"#);
    }

    #[test]
    fn test_assertions_chain() {
        response(200, "application/json; charset=utf-8", r#"{"ok":true}"#)
            .assert_status(200)
            .assert_content_type("application/json")
            .assert_json(&json!({"ok": true}))
            .assert_body_contains("ok");
    }

    #[test]
    fn test_validation_errors() {
        let res = response(
            400,
            "application/json",
            r#"{"errors":[{"location":"body","path":["name"],"message":"Required","code":"invalid_type"}]}"#,
        );
        assert_eq!(res.validation_errors().len(), 1);
        res.assert_rejected("body");

        let plain = response(500, "text/plain", "Internal Server Error");
        assert!(plain.validation_errors().is_empty());
    }

    #[test]
    #[should_panic(expected = "expected status 404")]
    fn test_assert_status_panics() {
        response(200, "text/plain", "ok").assert_status(404);
    }
}
