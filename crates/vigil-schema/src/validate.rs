//! The validation engine.
//!
//! Validation walks the schema and the input together, producing either the
//! parsed value or the full list of issues found. A schema fault stops the
//! walk immediately; issues never do.

use crate::error::{SchemaError, SchemaResult};
use crate::issue::{type_name, IssueCode, PathSegment, ValidationIssue};
use crate::schema::{NumberRules, Schema, SchemaKind, StringRules, UnknownKeys};
use serde_json::{Map, Number, Value};

impl Schema {
    /// Validates `value`, returning the parsed (coerced, stripped,
    /// transformed) result.
    ///
    /// # Example
    ///
    /// ```
    /// use vigil_schema::{IssueCode, Schema, SchemaError};
    /// use serde_json::json;
    ///
    /// let id = Schema::integer().coerce().min(1.0);
    /// assert_eq!(id.validate(&json!("42")).unwrap(), json!(42));
    ///
    /// match id.validate(&json!("0")) {
    ///     Err(SchemaError::Issues(issues)) => assert_eq!(issues[0].code, IssueCode::TooSmall),
    ///     other => panic!("unexpected {other:?}"),
    /// }
    /// ```
    pub fn validate(&self, value: &Value) -> SchemaResult<Value> {
        let mut walker = Walker::default();
        let parsed = walker.check(self, Some(value))?;
        if walker.issues.is_empty() {
            Ok(parsed.unwrap_or(Value::Null))
        } else {
            Err(SchemaError::Issues(walker.issues))
        }
    }

    /// Validates a value that may be absent (a missing header, an omitted
    /// body). Returns `Ok(None)` when an absent value is acceptable and no
    /// default applies.
    pub fn validate_optional(&self, value: Option<&Value>) -> SchemaResult<Option<Value>> {
        let mut walker = Walker::default();
        let parsed = walker.check(self, value)?;
        if walker.issues.is_empty() {
            Ok(parsed)
        } else {
            Err(SchemaError::Issues(walker.issues))
        }
    }

    /// Returns true if `value` passes without issues or faults.
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        self.validate(value).is_ok()
    }
}

#[derive(Default)]
struct Walker {
    path: Vec<PathSegment>,
    issues: Vec<ValidationIssue>,
}

impl Walker {
    fn issue(&mut self, code: IssueCode, message: impl Into<String>) -> &mut ValidationIssue {
        self.issues
            .push(ValidationIssue::new(code, message).at(self.path.clone()));
        let last = self.issues.len() - 1;
        &mut self.issues[last]
    }

    fn invalid_type(&mut self, expected: &str, received: &str) {
        let message = if received == "undefined" {
            "Required".to_string()
        } else {
            format!("Expected {expected}, received {received}")
        };
        let issue = self.issue(IssueCode::InvalidType, message);
        issue.expected = Some(expected.to_string());
        issue.received = Some(received.to_string());
    }

    fn dotted_path(&self) -> String {
        self.path
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Checks one (possibly absent) value. `Ok(None)` means "absent and
    /// allowed to be"; the caller decides whether to emit a key for it.
    fn check(&mut self, schema: &Schema, value: Option<&Value>) -> SchemaResult<Option<Value>> {
        let value = match value {
            Some(value) => value,
            None => {
                if let Some(default) = &schema.default {
                    return Ok(Some(default.clone()));
                }
                if !schema.optional {
                    self.invalid_type(&schema.kind.expected_name(), "undefined");
                }
                return Ok(None);
            }
        };

        if value.is_null() && schema.nullable {
            return Ok(Some(Value::Null));
        }

        let before = self.issues.len();
        let coerced = if schema.coerce {
            coerce(&schema.kind, value)
        } else {
            None
        };
        let input = coerced.as_ref().unwrap_or(value);
        let mut parsed = self.check_kind(&schema.kind, input)?;

        if self.issues.len() > before {
            return Ok(None);
        }

        for (message, predicate) in &schema.refinements {
            if !predicate(&parsed) {
                self.issue(IssueCode::Custom, message.clone());
            }
        }
        if self.issues.len() > before {
            return Ok(None);
        }

        for transform in &schema.transforms {
            parsed = transform(parsed).map_err(|source| SchemaError::Fault {
                path: self.dotted_path(),
                message: "transform failed".to_string(),
                source: Some(source),
            })?;
        }

        Ok(Some(parsed))
    }

    fn check_kind(&mut self, kind: &SchemaKind, value: &Value) -> SchemaResult<Value> {
        match kind {
            SchemaKind::String(rules) => {
                self.check_string(rules, value);
                Ok(value.clone())
            }
            SchemaKind::Number(rules) => {
                self.check_number(rules, value, false);
                Ok(value.clone())
            }
            SchemaKind::Integer(rules) => {
                self.check_number(rules, value, true);
                Ok(value.clone())
            }
            SchemaKind::Boolean => {
                if !value.is_boolean() {
                    self.invalid_type("boolean", type_name(value));
                }
                Ok(value.clone())
            }
            SchemaKind::Literal(expected) => {
                if value != expected {
                    let issue = self.issue(
                        IssueCode::InvalidLiteral,
                        format!("Invalid literal value, expected {expected}"),
                    );
                    issue.expected = Some(expected.to_string());
                    issue.received = Some(value.to_string());
                }
                Ok(value.clone())
            }
            SchemaKind::Enum(members) => {
                let matched = value
                    .as_str()
                    .is_some_and(|s| members.iter().any(|m| m == s));
                if !matched {
                    let expected = kind.expected_name();
                    let issue = self.issue(
                        IssueCode::InvalidEnumValue,
                        format!("Invalid enum value. Expected {expected}, received {value}"),
                    );
                    issue.expected = Some(expected);
                    issue.received = Some(value.to_string());
                }
                Ok(value.clone())
            }
            SchemaKind::Array {
                items,
                min_items,
                max_items,
            } => self.check_array(items, *min_items, *max_items, value),
            SchemaKind::Object {
                properties,
                unknown_keys,
            } => {
                let Some(object) = value.as_object() else {
                    self.invalid_type("object", type_name(value));
                    return Ok(value.clone());
                };
                let mut out = Map::new();
                for (key, schema) in properties {
                    self.path.push(PathSegment::Key(key.clone()));
                    let result = self.check(schema, object.get(key));
                    self.path.pop();
                    if let Some(parsed) = result? {
                        out.insert(key.clone(), parsed);
                    }
                }
                let unknown: Vec<&String> = object
                    .keys()
                    .filter(|key| !properties.contains_key(key.as_str()))
                    .collect();
                match unknown_keys {
                    UnknownKeys::Strip => {}
                    UnknownKeys::Passthrough => {
                        for key in unknown {
                            out.insert(key.clone(), object[key.as_str()].clone());
                        }
                    }
                    UnknownKeys::Strict => {
                        if !unknown.is_empty() {
                            let names = unknown
                                .iter()
                                .map(|k| format!("'{k}'"))
                                .collect::<Vec<_>>()
                                .join(", ");
                            self.issue(
                                IssueCode::UnrecognizedKeys,
                                format!("Unrecognized key(s) in object: {names}"),
                            );
                        }
                    }
                }
                Ok(Value::Object(out))
            }
            SchemaKind::Record(values) => {
                let Some(object) = value.as_object() else {
                    self.invalid_type("object", type_name(value));
                    return Ok(value.clone());
                };
                let mut out = Map::new();
                for (key, item) in object {
                    self.path.push(PathSegment::Key(key.clone()));
                    let result = self.check(values, Some(item));
                    self.path.pop();
                    if let Some(parsed) = result? {
                        out.insert(key.clone(), parsed);
                    }
                }
                Ok(Value::Object(out))
            }
            SchemaKind::Union(members) => {
                for member in members {
                    let mut scratch = Walker {
                        path: self.path.clone(),
                        issues: Vec::new(),
                    };
                    let parsed = scratch.check(member, Some(value))?;
                    if scratch.issues.is_empty() {
                        return Ok(parsed.unwrap_or(Value::Null));
                    }
                }
                self.issue(IssueCode::InvalidUnion, "Invalid input");
                Ok(value.clone())
            }
            SchemaKind::Any => Ok(value.clone()),
            SchemaKind::Null => {
                if !value.is_null() {
                    self.invalid_type("null", type_name(value));
                }
                Ok(Value::Null)
            }
            SchemaKind::Never => {
                self.invalid_type("never", type_name(value));
                Ok(Value::Null)
            }
        }
    }

    fn check_string(&mut self, rules: &StringRules, value: &Value) {
        let Some(s) = value.as_str() else {
            self.invalid_type("string", type_name(value));
            return;
        };
        let len = s.chars().count();
        if let Some(min) = rules.min_length {
            if len < min {
                self.issue(
                    IssueCode::TooSmall,
                    format!("String must contain at least {min} character(s)"),
                );
            }
        }
        if let Some(max) = rules.max_length {
            if len > max {
                self.issue(
                    IssueCode::TooBig,
                    format!("String must contain at most {max} character(s)"),
                );
            }
        }
        if let Some(pattern) = &rules.pattern {
            if !pattern.is_match(s) {
                self.issue(IssueCode::InvalidString, "Invalid");
            }
        }
        if rules.email && !looks_like_email(s) {
            self.issue(IssueCode::InvalidString, "Invalid email");
        }
    }

    fn check_number(&mut self, rules: &NumberRules, value: &Value, integer: bool) {
        let Some(n) = value.as_f64() else {
            self.invalid_type(if integer { "integer" } else { "number" }, type_name(value));
            return;
        };
        if integer && n.fract() != 0.0 {
            self.invalid_type("integer", "float");
            return;
        }
        if let Some(min) = rules.minimum {
            if n < min {
                self.issue(
                    IssueCode::TooSmall,
                    format!("Number must be greater than or equal to {min}"),
                );
            }
        }
        if let Some(max) = rules.maximum {
            if n > max {
                self.issue(
                    IssueCode::TooBig,
                    format!("Number must be less than or equal to {max}"),
                );
            }
        }
    }

    fn check_array(
        &mut self,
        items: &Schema,
        min_items: Option<usize>,
        max_items: Option<usize>,
        value: &Value,
    ) -> SchemaResult<Value> {
        let Some(array) = value.as_array() else {
            self.invalid_type("array", type_name(value));
            return Ok(value.clone());
        };
        if let Some(min) = min_items {
            if array.len() < min {
                self.issue(
                    IssueCode::TooSmall,
                    format!("Array must contain at least {min} element(s)"),
                );
            }
        }
        if let Some(max) = max_items {
            if array.len() > max {
                self.issue(
                    IssueCode::TooBig,
                    format!("Array must contain at most {max} element(s)"),
                );
            }
        }
        let mut out = Vec::with_capacity(array.len());
        for (idx, item) in array.iter().enumerate() {
            self.path.push(PathSegment::Index(idx));
            let result = self.check(items, Some(item));
            self.path.pop();
            out.push(result?.unwrap_or(Value::Null));
        }
        Ok(Value::Array(out))
    }
}

/// Converts a textual wire value to the primitive the schema expects.
/// Returns `None` when no conversion applies; the original value is then
/// checked as-is and reported if it has the wrong type.
fn coerce(kind: &SchemaKind, value: &Value) -> Option<Value> {
    match (kind, value) {
        (SchemaKind::Number(_) | SchemaKind::Integer(_), Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            if let Ok(int) = trimmed.parse::<i64>() {
                return Some(Value::Number(int.into()));
            }
            trimmed
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
        }
        (SchemaKind::Boolean, Value::String(s)) => match s.trim() {
            "true" | "1" => Some(Value::Bool(true)),
            "false" | "0" => Some(Value::Bool(false)),
            _ => None,
        },
        (SchemaKind::String(_), Value::Number(n)) => Some(Value::String(n.to_string())),
        (SchemaKind::String(_), Value::Bool(b)) => Some(Value::String(b.to_string())),
        _ => None,
    }
}

fn looks_like_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !s.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use regex::Regex;
    use serde_json::json;

    fn issues(result: SchemaResult<Value>) -> Vec<ValidationIssue> {
        match result {
            Err(SchemaError::Issues(issues)) => issues,
            other => panic!("expected issues, got {other:?}"),
        }
    }

    fn user_schema() -> Schema {
        Schema::object([
            ("name", Schema::string().min_length(3)),
            ("age", Schema::number().min(18.0)),
        ])
    }

    #[test]
    fn test_valid_object_passes_unchanged() {
        let input = json!({"name": "John", "age": 25});
        assert_eq!(user_schema().validate(&input).unwrap(), input);
    }

    #[test]
    fn test_object_collects_every_issue_in_declaration_order() {
        let found = issues(user_schema().validate(&json!({"name": "Jo", "age": 15})));
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].path, vec![PathSegment::from("name")]);
        assert_eq!(found[0].code, IssueCode::TooSmall);
        assert_eq!(found[1].path, vec![PathSegment::from("age")]);
        assert_eq!(
            found[1].message,
            "Number must be greater than or equal to 18"
        );
    }

    #[test]
    fn test_missing_required_property() {
        let found = issues(user_schema().validate(&json!({"name": "John"})));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].message, "Required");
        assert_eq!(found[0].received.as_deref(), Some("undefined"));
    }

    #[test]
    fn test_optional_property_omitted_from_output() {
        let schema = Schema::object([("nick", Schema::string().optional())]);
        assert_eq!(schema.validate(&json!({})).unwrap(), json!({}));
    }

    #[test]
    fn test_default_fills_missing_property() {
        let schema = Schema::object([("page", Schema::integer().default(1))]);
        assert_eq!(schema.validate(&json!({})).unwrap(), json!({"page": 1}));
    }

    #[test]
    fn test_unknown_keys_stripped_by_default() {
        let schema = Schema::object([("a", Schema::number())]);
        assert_eq!(
            schema.validate(&json!({"a": 1, "b": 2})).unwrap(),
            json!({"a": 1})
        );
    }

    #[test]
    fn test_passthrough_keeps_unknown_keys() {
        let schema = Schema::object([("a", Schema::number())]).passthrough();
        assert_eq!(
            schema.validate(&json!({"a": 1, "b": 2})).unwrap(),
            json!({"a": 1, "b": 2})
        );
    }

    #[test]
    fn test_strict_reports_unknown_keys() {
        let schema = Schema::object([("a", Schema::number())]).strict();
        let found = issues(schema.validate(&json!({"a": 1, "b": 2})));
        assert_eq!(found[0].code, IssueCode::UnrecognizedKeys);
        assert!(found[0].path.is_empty());
        assert_eq!(found[0].message, "Unrecognized key(s) in object: 'b'");
    }

    #[test]
    fn test_nested_array_paths() {
        let schema = Schema::object([(
            "tags",
            Schema::array(Schema::object([("label", Schema::string())])),
        )]);
        let found = issues(schema.validate(&json!({"tags": [{"label": "ok"}, {"label": 4}]})));
        assert_eq!(
            found[0].path,
            vec![
                PathSegment::from("tags"),
                PathSegment::from(1usize),
                PathSegment::from("label")
            ]
        );
        assert_eq!(found[0].message, "Expected string, received number");
    }

    #[test]
    fn test_array_bounds() {
        let schema = Schema::array(Schema::integer()).min_items(1).max_items(2);
        assert_eq!(issues(schema.validate(&json!([])))[0].code, IssueCode::TooSmall);
        assert_eq!(
            issues(schema.validate(&json!([1, 2, 3])))[0].code,
            IssueCode::TooBig
        );
    }

    #[test]
    fn test_coerced_integer_from_text() {
        let schema = Schema::integer().coerce();
        assert_eq!(schema.validate(&json!("42")).unwrap(), json!(42));
        assert_eq!(
            issues(schema.validate(&json!("4.5")))[0].received.as_deref(),
            Some("float")
        );
        assert_eq!(
            issues(schema.validate(&json!("abc")))[0].message,
            "Expected integer, received string"
        );
    }

    #[test]
    fn test_uncoerced_number_rejects_text() {
        let found = issues(Schema::number().validate(&json!("42")));
        assert_eq!(found[0].code, IssueCode::InvalidType);
    }

    #[test]
    fn test_coerced_boolean() {
        let schema = Schema::boolean().coerce();
        assert_eq!(schema.validate(&json!("true")).unwrap(), json!(true));
        assert_eq!(schema.validate(&json!("0")).unwrap(), json!(false));
        assert!(schema.validate(&json!("maybe")).is_err());
    }

    #[test]
    fn test_nullable_accepts_null() {
        assert_eq!(
            Schema::string().nullable().validate(&json!(null)).unwrap(),
            json!(null)
        );
        assert_eq!(
            issues(Schema::string().validate(&json!(null)))[0].message,
            "Expected string, received null"
        );
    }

    #[test]
    fn test_pattern_and_email() {
        let code = Schema::string().pattern(Regex::new("^[A-Z]{3}$").unwrap());
        assert!(code.accepts(&json!("ABC")));
        assert_eq!(
            issues(code.validate(&json!("abc")))[0].code,
            IssueCode::InvalidString
        );

        let email = Schema::string().email();
        assert!(email.accepts(&json!("a@example.com")));
        assert!(!email.accepts(&json!("not-an-email")));
        assert!(!email.accepts(&json!("a@b")));
    }

    #[test]
    fn test_literal_and_enum() {
        assert!(Schema::literal("ok").accepts(&json!("ok")));
        assert_eq!(
            issues(Schema::literal("ok").validate(&json!("nope")))[0].code,
            IssueCode::InvalidLiteral
        );
        let color = Schema::enumeration(["red", "green"]);
        assert!(color.accepts(&json!("red")));
        assert_eq!(
            issues(color.validate(&json!("blue")))[0].message,
            "Invalid enum value. Expected 'red' | 'green', received \"blue\""
        );
    }

    #[test]
    fn test_union_first_match_wins() {
        let schema = Schema::union([Schema::integer().coerce(), Schema::string()]);
        assert_eq!(schema.validate(&json!("7")).unwrap(), json!(7));
        assert_eq!(schema.validate(&json!("x")).unwrap(), json!("x"));
        assert_eq!(
            issues(schema.validate(&json!(true)))[0].code,
            IssueCode::InvalidUnion
        );
    }

    #[test]
    fn test_record_validates_every_value() {
        let schema = Schema::record(Schema::number());
        assert!(schema.accepts(&json!({"a": 1, "b": 2.5})));
        let found = issues(schema.validate(&json!({"a": 1, "b": "x"})));
        assert_eq!(found[0].path, vec![PathSegment::from("b")]);
    }

    #[test]
    fn test_never_rejects_everything() {
        assert!(!Schema::never().accepts(&json!(null)));
        assert!(!Schema::never().accepts(&json!({})));
        assert!(Schema::never().optional().validate_optional(None).unwrap().is_none());
    }

    #[test]
    fn test_refine_runs_after_structural_checks() {
        let even = Schema::integer().refine("must be even", |v| v.as_i64().is_some_and(|n| n % 2 == 0));
        assert!(even.accepts(&json!(4)));
        let found = issues(even.validate(&json!(3)));
        assert_eq!(found[0].code, IssueCode::Custom);
        assert_eq!(found[0].message, "must be even");
        // structural failure suppresses the refinement
        assert_eq!(issues(even.validate(&json!("x"))).len(), 1);
    }

    #[test]
    fn test_transform_rewrites_value() {
        let upper = Schema::string().transform(|v| {
            Ok(Value::String(v.as_str().unwrap_or_default().to_uppercase()))
        });
        assert_eq!(upper.validate(&json!("abc")).unwrap(), json!("ABC"));
    }

    #[test]
    fn test_transform_error_is_fault() {
        let schema = Schema::object([(
            "id",
            Schema::string().transform(|_| Err(anyhow::anyhow!("lookup failed"))),
        )]);
        let err = schema.validate(&json!({"id": "x"})).unwrap_err();
        match err {
            SchemaError::Fault { path, source, .. } => {
                assert_eq!(path, "id");
                assert_eq!(source.unwrap().to_string(), "lookup failed");
            }
            SchemaError::Issues(_) => panic!("expected fault"),
        }
    }

    #[test]
    fn test_transform_skipped_when_invalid() {
        let schema = Schema::string().transform(|_| Err(anyhow::anyhow!("should not run")));
        assert!(matches!(
            schema.validate(&json!(1)),
            Err(SchemaError::Issues(_))
        ));
    }

    #[test]
    fn test_validate_optional_missing() {
        let required = Schema::string();
        assert!(required.validate_optional(None).is_err());
        assert_eq!(Schema::string().optional().validate_optional(None).unwrap(), None);
        assert_eq!(
            Schema::string().default("x").validate_optional(None).unwrap(),
            Some(json!("x"))
        );
    }

    proptest! {
        #[test]
        fn prop_coerced_integer_roundtrips(n in any::<i64>()) {
            let schema = Schema::integer().coerce();
            prop_assert_eq!(schema.validate(&json!(n.to_string())).unwrap(), json!(n));
        }

        #[test]
        fn prop_string_length_bounds(s in "[a-z]{0,12}") {
            let schema = Schema::string().min_length(3).max_length(8);
            let len = s.chars().count();
            prop_assert_eq!(schema.accepts(&json!(s)), (3..=8).contains(&len));
        }
    }
}
