//! Request validation.
//!
//! [`RequestValidator`] checks the five request fields a contract can
//! describe, in the order headers, body, query, params, locals. Every field
//! is attempted; issues from all of them are collected into one
//! [`ValidationErrorBody`] and answered with a single 400. Validated values
//! replace the originals, so later middleware and the handler see coerced
//! types. A schema fault (a failing transform) is not an issue: it is
//! returned as an error immediately and the remaining fields are skipped.

use crate::headers::{merge_headers, normalize_headers};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use vigil_core::{Exchange, RequestField, SchemaContract, VigilError, VigilResult};
use vigil_schema::{SchemaError, ValidationIssue};

/// One issue on the wire, tagged with the request field it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldIssue {
    /// The request field that failed.
    pub location: RequestField,
    /// The issue itself; its fields are inlined.
    #[serde(flatten)]
    pub issue: ValidationIssue,
}

/// The body of a 400 validation response.
///
/// ```json
/// { "errors": [ { "location": "body", "code": "too_small", "path": ["name"], "message": "..." } ] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationErrorBody {
    /// Every issue found, in field order then schema order.
    pub errors: Vec<FieldIssue>,
}

impl ValidationErrorBody {
    /// Returns true if no issue was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the issues reported for one field.
    pub fn for_field(&self, field: RequestField) -> impl Iterator<Item = &ValidationIssue> {
        self.errors
            .iter()
            .filter(move |e| e.location == field)
            .map(|e| &e.issue)
    }
}

/// Outcome of request validation.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    /// Every present schema accepted its field; validated values were
    /// written back.
    Valid,
    /// At least one field failed.
    Rejected(ValidationErrorBody),
}

/// Validates request fields against a contract.
#[derive(Debug, Clone)]
pub struct RequestValidator {
    contract: Arc<SchemaContract>,
}

impl RequestValidator {
    /// Creates a validator for a contract.
    #[must_use]
    pub fn new(contract: Arc<SchemaContract>) -> Self {
        Self { contract }
    }

    /// Validates the exchange's request fields and locals.
    ///
    /// Fields are only rewritten when every field passes.
    pub fn validate(&self, ex: &mut Exchange) -> VigilResult<RequestOutcome> {
        let mut errors = Vec::new();
        let mut accepted = Vec::new();

        for field in RequestField::ALL {
            let Some(schema) = self.contract.request_schema(field) else {
                continue;
            };

            let input = field_input(ex, field);
            match schema.validate_optional(input.as_ref()) {
                Ok(value) => accepted.push((field, value)),
                Err(SchemaError::Issues(issues)) => {
                    errors.extend(issues.into_iter().map(|issue| FieldIssue {
                        location: field,
                        issue,
                    }));
                }
                Err(fault) => return Err(VigilError::from_schema_fault(field.as_str(), fault)),
            }
        }

        if !errors.is_empty() {
            return Ok(RequestOutcome::Rejected(ValidationErrorBody { errors }));
        }

        for (field, value) in accepted {
            write_back(ex, field, value)?;
        }
        Ok(RequestOutcome::Valid)
    }
}

/// Writes the 400 response for a rejected request.
pub fn reject(ex: &mut Exchange, body: &ValidationErrorBody) -> VigilResult<()> {
    let payload = serde_json::to_value(body)
        .map_err(|e| VigilError::internal_with_source("failed to serialize validation errors", e))?;
    ex.response.status(StatusCode::BAD_REQUEST).json(payload)
}

fn field_input(ex: &Exchange, field: RequestField) -> Option<Value> {
    match field {
        RequestField::Headers => Some(Value::Object(normalize_headers(&ex.request.headers))),
        RequestField::Body => match &ex.request.body {
            Value::Null => None,
            body => Some(body.clone()),
        },
        RequestField::Query => Some(Value::Object(ex.request.query.clone())),
        RequestField::Params => Some(Value::Object(ex.request.params.clone())),
        RequestField::Locals => Some(Value::Object(ex.locals.clone())),
    }
}

fn write_back(ex: &mut Exchange, field: RequestField, value: Option<Value>) -> VigilResult<()> {
    match field {
        RequestField::Body => {
            ex.request.body = value.unwrap_or(Value::Null);
            Ok(())
        }
        RequestField::Headers => {
            let validated = expect_object(field, value)?;
            merge_headers(&mut ex.request.headers, validated);
            Ok(())
        }
        RequestField::Query => {
            ex.request.query = expect_object(field, value)?;
            Ok(())
        }
        RequestField::Params => {
            ex.request.params = expect_object(field, value)?;
            Ok(())
        }
        RequestField::Locals => {
            ex.locals = expect_object(field, value)?;
            Ok(())
        }
    }
}

fn expect_object(field: RequestField, value: Option<Value>) -> VigilResult<Map<String, Value>> {
    match value {
        Some(Value::Object(map)) => Ok(map),
        None => Ok(Map::new()),
        Some(other) => Err(VigilError::configuration(format!(
            "{field} schema must produce an object, produced {}",
            vigil_schema::type_name(&other)
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use serde_json::json;
    use vigil_core::Request;
    use vigil_schema::{IssueCode, PathSegment, Schema};

    fn validator(contract: SchemaContract) -> RequestValidator {
        RequestValidator::new(Arc::new(contract))
    }

    fn user_body() -> Schema {
        Schema::object([
            ("name", Schema::string().min_length(3)),
            ("age", Schema::number().min(18.0)),
        ])
    }

    #[test]
    fn test_valid_body_passes_unchanged() {
        let v = validator(SchemaContract::builder().body(user_body()).build().unwrap());
        let mut ex = Exchange::new(
            Request::new(Method::POST, "/users").with_body(json!({"name": "John", "age": 25})),
        );
        assert_eq!(v.validate(&mut ex).unwrap(), RequestOutcome::Valid);
        assert_eq!(ex.request.body, json!({"name": "John", "age": 25}));
    }

    #[test]
    fn test_body_issues_have_paths() {
        let v = validator(SchemaContract::builder().body(user_body()).build().unwrap());
        let mut ex = Exchange::new(
            Request::new(Method::POST, "/users").with_body(json!({"name": "Jo", "age": 15})),
        );
        let RequestOutcome::Rejected(body) = v.validate(&mut ex).unwrap() else {
            panic!("expected rejection");
        };
        let paths: Vec<_> = body.errors.iter().map(|e| e.issue.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                vec![PathSegment::Key("name".into())],
                vec![PathSegment::Key("age".into())]
            ]
        );
        assert!(body.errors.iter().all(|e| e.location == RequestField::Body));
    }

    #[test]
    fn test_issues_aggregate_across_fields_in_order() {
        let contract = SchemaContract::builder()
            .body(user_body())
            .headers(Schema::object([("x-tenant", Schema::string())]))
            .query(Schema::object([("page", Schema::integer().coerce())]))
            .locals(Schema::object([("user", Schema::any())]))
            .build()
            .unwrap();
        let mut ex = Exchange::new(
            Request::new(Method::POST, "/users")
                .with_query("page", "two")
                .with_body(json!({"name": "Jo", "age": 30})),
        );

        let RequestOutcome::Rejected(body) = validator(contract).validate(&mut ex).unwrap() else {
            panic!("expected rejection");
        };
        let locations: Vec<_> = body.errors.iter().map(|e| e.location).collect();
        assert_eq!(
            locations,
            vec![
                RequestField::Headers,
                RequestField::Body,
                RequestField::Query,
                RequestField::Locals
            ]
        );
        assert_eq!(body.for_field(RequestField::Query).count(), 1);
        // Nothing is rewritten on rejection.
        assert_eq!(ex.request.query["page"], json!("two"));
    }

    #[test]
    fn test_coerced_values_are_written_back() {
        let contract = SchemaContract::builder()
            .params(Schema::object([("id", Schema::integer().coerce())]))
            .query(Schema::object([
                ("page", Schema::integer().coerce().default(1)),
                ("active", Schema::boolean().coerce().optional()),
            ]))
            .build()
            .unwrap();
        let mut ex = Exchange::new(
            Request::new(Method::GET, "/users/7")
                .with_param("id", "7")
                .with_query("active", "true")
                .with_query("debug", "1"),
        );

        assert_eq!(validator(contract).validate(&mut ex).unwrap(), RequestOutcome::Valid);
        assert_eq!(ex.request.params["id"], json!(7));
        assert_eq!(ex.request.query["page"], json!(1));
        assert_eq!(ex.request.query["active"], json!(true));
        assert!(!ex.request.query.contains_key("debug"));
    }

    #[test]
    fn test_headers_are_normalized_and_merged() {
        let contract = SchemaContract::builder()
            .headers(Schema::object([("x-page-size", Schema::integer().coerce())]))
            .build()
            .unwrap();
        let mut ex = Exchange::new(
            Request::new(Method::GET, "/")
                .with_header("X-Page-Size", "25")
                .with_header("X-Page-Size", "50")
                .with_header("User-Agent", "curl/8"),
        );

        assert_eq!(validator(contract).validate(&mut ex).unwrap(), RequestOutcome::Valid);
        assert_eq!(ex.request.headers["x-page-size"], json!(25));
        assert_eq!(ex.request.header("user-agent"), Some("curl/8"));
        assert!(!ex.request.headers.contains_key("X-Page-Size"));
    }

    #[test]
    fn test_missing_body_is_required() {
        let v = validator(SchemaContract::builder().body(user_body()).build().unwrap());
        let mut ex = Exchange::new(Request::new(Method::POST, "/users"));
        let RequestOutcome::Rejected(body) = v.validate(&mut ex).unwrap() else {
            panic!("expected rejection");
        };
        assert_eq!(body.errors.len(), 1);
        assert_eq!(body.errors[0].issue.code, IssueCode::InvalidType);
        assert_eq!(body.errors[0].issue.message, "Required");
    }

    #[test]
    fn test_locals_are_validated() {
        let contract = SchemaContract::builder()
            .locals(Schema::object([("user", Schema::object([("id", Schema::integer())]))]))
            .build()
            .unwrap();
        let v = validator(contract);

        let mut ok = Exchange::new(Request::new(Method::GET, "/"))
            .with_local("user", json!({"id": 1}));
        assert_eq!(v.validate(&mut ok).unwrap(), RequestOutcome::Valid);

        let mut bad = Exchange::new(Request::new(Method::GET, "/"));
        assert!(matches!(v.validate(&mut bad).unwrap(), RequestOutcome::Rejected(_)));
    }

    #[test]
    fn test_fault_short_circuits() {
        let contract = SchemaContract::builder()
            .headers(Schema::object([("x-id", Schema::string())]))
            .body(Schema::string().transform(|_| Err(anyhow_error())))
            .build()
            .unwrap();
        let mut ex = Exchange::new(Request::new(Method::POST, "/").with_body(json!("x")));

        let err = validator(contract).validate(&mut ex).unwrap_err();
        assert_eq!(err.kind(), vigil_core::ErrorKind::Internal);
        assert!(err.to_string().contains("body"));
    }

    fn anyhow_error() -> anyhow::Error {
        anyhow::anyhow!("lookup failed")
    }

    #[test]
    fn test_wire_shape() {
        let body = ValidationErrorBody {
            errors: vec![FieldIssue {
                location: RequestField::Body,
                issue: ValidationIssue::new(IssueCode::TooSmall, "String must contain at least 3 character(s)")
                    .at(vec!["name".into()]),
            }],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"errors": [{
                "location": "body",
                "code": "too_small",
                "path": ["name"],
                "message": "String must contain at least 3 character(s)",
            }]})
        );
    }

    #[tokio::test]
    async fn test_reject_writes_400() {
        let mut ex = Exchange::new(Request::new(Method::GET, "/"));
        reject(&mut ex, &ValidationErrorBody::default()).unwrap();
        assert_eq!(ex.response.status_code(), StatusCode::BAD_REQUEST);
        assert!(ex.response.is_sent());
    }
}
