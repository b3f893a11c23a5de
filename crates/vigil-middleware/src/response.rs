//! The response interceptor.
//!
//! [`ValidatedResponse`] decorates the exchange's [`ResponseWriter`] so that
//! every body leaving the handler is checked against the schema registered
//! for the active status code. It tracks the active status as a small state
//! machine:
//!
//! ```text
//! Unset --set_status(s)--> Set(s) --json/send/end--> Emitted(s)
//!   |                                                   ^
//!   +---------------json/send/end (as 200)--------------+
//! ```
//!
//! Emitting without choosing a status behaves exactly like choosing 200.
//! A status with no registered schema is a configuration fault raised at
//! emission time, so a status may be chosen and then abandoned freely.
//! This holds for `end` too, which has no body to validate. Once emitted,
//! the status is fixed; later changes are logged and dropped.
//!
//! For `send`, the declared content type decides whether the payload is
//! decoded first: a JSON content type means a string payload is parsed,
//! validated, and re-serialized; anything else validates the raw value.

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use http_body_util::Full;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;
use vigil_core::request::is_json_content_type;
use vigil_core::{ResponseWriter, SchemaContract, VigilError, VigilResult};
use vigil_schema::SchemaError;

/// Where a response is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveStatus {
    /// No status chosen yet; emission uses 200.
    Unset,
    /// A status was chosen and no body emitted.
    Set(StatusCode),
    /// A body was emitted under this status.
    Emitted(StatusCode),
}

impl ActiveStatus {
    /// Returns the status an emission would be validated under.
    #[must_use]
    pub fn effective(&self) -> StatusCode {
        match self {
            Self::Unset => StatusCode::OK,
            Self::Set(status) | Self::Emitted(status) => *status,
        }
    }
}

/// A [`ResponseWriter`] that validates bodies before delegating.
pub struct ValidatedResponse {
    inner: Box<dyn ResponseWriter>,
    contract: Arc<SchemaContract>,
    state: ActiveStatus,
    request_id: Uuid,
}

impl std::fmt::Debug for ValidatedResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatedResponse")
            .field("state", &self.state)
            .field("request_id", &self.request_id)
            .finish_non_exhaustive()
    }
}

impl ValidatedResponse {
    /// Wraps `inner`, validating against `contract`'s response schemas.
    #[must_use]
    pub fn new(inner: Box<dyn ResponseWriter>, contract: Arc<SchemaContract>, request_id: Uuid) -> Self {
        Self {
            inner,
            contract,
            state: ActiveStatus::Unset,
            request_id,
        }
    }

    /// Returns the active status state.
    #[must_use]
    pub fn active_status(&self) -> ActiveStatus {
        self.state
    }

    /// Resolves the status for an emission and marks the response emitted.
    fn begin_emission(&mut self) -> VigilResult<StatusCode> {
        let status = match self.state {
            ActiveStatus::Emitted(_) => return Err(VigilError::ResponseAlreadySent),
            ActiveStatus::Unset => {
                self.inner.set_status(StatusCode::OK);
                StatusCode::OK
            }
            ActiveStatus::Set(status) => status,
        };
        self.state = ActiveStatus::Emitted(status);
        Ok(status)
    }

    fn check(&self, status: StatusCode, value: &Value) -> VigilResult<Value> {
        let code = status.as_u16();
        let schema = self
            .contract
            .response_schema(code)
            .ok_or_else(|| VigilError::missing_response_schema(code))?;

        match schema.validate(value) {
            Ok(validated) => Ok(validated),
            Err(SchemaError::Issues(issues)) => {
                tracing::error!(
                    request_id = %self.request_id,
                    http.status_code = code,
                    issue_count = issues.len(),
                    "response failed validation"
                );
                Err(VigilError::ResponseValidation { status: code, issues })
            }
            Err(fault) => Err(VigilError::from_schema_fault(&format!("response {code}"), fault)),
        }
    }

    fn declares_json(&self) -> bool {
        self.inner.content_type().is_some_and(is_json_content_type)
    }
}

impl ResponseWriter for ValidatedResponse {
    fn set_status(&mut self, status: StatusCode) {
        if let ActiveStatus::Emitted(emitted) = self.state {
            tracing::warn!(
                request_id = %self.request_id,
                http.status_code = emitted.as_u16(),
                ignored_status = status.as_u16(),
                "status change after emission ignored"
            );
            return;
        }
        tracing::trace!(request_id = %self.request_id, http.status_code = status.as_u16(), "status chosen");
        self.state = ActiveStatus::Set(status);
        self.inner.set_status(status);
    }

    fn status_code(&self) -> StatusCode {
        self.inner.status_code()
    }

    fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.inner.set_header(name, value);
    }

    fn json(&mut self, value: Value) -> VigilResult<()> {
        let status = self.begin_emission()?;
        let validated = self.check(status, &value)?;
        self.inner.json(validated)
    }

    fn send(&mut self, value: Value) -> VigilResult<()> {
        let status = self.begin_emission()?;
        if !self.declares_json() {
            let validated = self.check(status, &value)?;
            return self.inner.send(validated);
        }

        let decoded = match value {
            Value::String(text) => {
                serde_json::from_str(&text).map_err(|e| VigilError::response_decode(&e))?
            }
            structured => structured,
        };
        let validated = self.check(status, &decoded)?;
        let text = serde_json::to_string(&validated)
            .map_err(|e| VigilError::internal_with_source("failed to serialize response", e))?;
        self.inner.send(Value::String(text))
    }

    /// Finishes without a body. The status must still be registered.
    fn end(&mut self) -> VigilResult<()> {
        let code = self.begin_emission()?.as_u16();
        if self.contract.response_schema(code).is_none() {
            return Err(VigilError::missing_response_schema(code));
        }
        self.inner.end()
    }

    fn is_sent(&self) -> bool {
        self.inner.is_sent()
    }

    fn finish(self: Box<Self>) -> http::Response<Full<Bytes>> {
        self.inner.finish()
    }
}
