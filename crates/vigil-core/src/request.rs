//! Request state.
//!
//! [`Request`] holds the parts of an HTTP request the validation layer reads
//! and rewrites, as JSON values: headers, query, path parameters and body.
//! Validated (coerced) values are written back into these fields, so every
//! later middleware and the handler see the parsed forms.

use crate::error::{VigilError, VigilResult};
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, Method};
use http_body_util::{BodyExt, Full};
use serde_json::{Map, Value};

/// Mutable request state for one exchange.
#[derive(Debug, Clone)]
pub struct Request {
    /// Request method.
    pub method: Method,
    /// Request path, without the query string.
    pub path: String,
    /// Headers: one string per header, an array for repeated headers.
    pub headers: Map<String, Value>,
    /// Query parameters: repeated keys become arrays.
    pub query: Map<String, Value>,
    /// Path parameters captured by the router.
    pub params: Map<String, Value>,
    /// Parsed body: JSON for JSON content, a string for text, `null` if empty.
    pub body: Value,
}

impl Request {
    /// Creates an empty request.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Map::new(),
            query: Map::new(),
            params: Map::new(),
            body: Value::Null,
        }
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Adds a header value; a repeated name becomes an array.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        append(&mut self.headers, name.into(), value.into());
        self
    }

    /// Adds a query value; a repeated key becomes an array.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        append(&mut self.query, key.into(), value.into());
        self
    }

    /// Sets a path parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Converts an HTTP request, reading the whole body.
    ///
    /// Fails with [`VigilError::BadRequest`] if a JSON or form body does not
    /// parse.
    pub async fn from_http(request: http::Request<Full<Bytes>>) -> VigilResult<Self> {
        let (parts, body) = request.into_parts();
        let bytes = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        };

        let query = match parts.uri.query() {
            Some(raw) => parse_urlencoded(raw)?,
            None => Map::new(),
        };
        let content_type = parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            headers: headers_to_map(&parts.headers),
            query,
            params: Map::new(),
            body: parse_body(content_type.as_deref(), &bytes)?,
        })
    }

    /// Looks up a header by name, ignoring case. Repeated headers yield
    /// their first value.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .and_then(|(_, value)| match value {
                Value::Array(values) => values.first().and_then(Value::as_str),
                other => other.as_str(),
            })
    }

    /// Returns a path parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }
}

fn append(map: &mut Map<String, Value>, key: String, value: String) {
    match map.get_mut(&key) {
        Some(Value::Array(values)) => values.push(Value::String(value)),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, Value::String(value)]);
        }
        None => {
            map.insert(key, Value::String(value));
        }
    }
}

/// Converts a header map, keeping repeated headers as arrays.
#[must_use]
pub fn headers_to_map(headers: &HeaderMap) -> Map<String, Value> {
    let mut map = Map::new();
    for (name, value) in headers {
        let text = String::from_utf8_lossy(value.as_bytes()).into_owned();
        append(&mut map, name.as_str().to_string(), text);
    }
    map
}

/// Parses `application/x-www-form-urlencoded` text into an object.
pub fn parse_urlencoded(raw: &str) -> VigilResult<Map<String, Value>> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(raw)
        .map_err(|e| VigilError::bad_request(format!("invalid urlencoded data: {e}")))?;
    let mut map = Map::new();
    for (key, value) in pairs {
        append(&mut map, key, value);
    }
    Ok(map)
}

/// Returns true for `application/json` and any `+json` media type.
#[must_use]
pub fn is_json_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

fn parse_body(content_type: Option<&str>, bytes: &Bytes) -> VigilResult<Value> {
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    let content_type = content_type.unwrap_or_default();
    if is_json_content_type(content_type) {
        return serde_json::from_slice(bytes)
            .map_err(|e| VigilError::bad_request(format!("invalid JSON body: {e}")));
    }
    let text = String::from_utf8_lossy(bytes);
    if content_type
        .to_ascii_lowercase()
        .starts_with("application/x-www-form-urlencoded")
    {
        return parse_urlencoded(&text).map(Value::Object);
    }
    Ok(Value::String(text.into_owned()))
}
