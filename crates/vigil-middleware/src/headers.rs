//! The header normalization view.
//!
//! Header schemas are written against lowercase names and single values.
//! [`normalize_headers`] builds that view from the request's header map:
//! every key lowercased, repeated headers reduced to their first value,
//! `null` kept as `null`. The reduction is lossy; a schema cannot see the
//! second `Accept` header.
//!
//! After validation, [`merge_headers`] writes the validated values back over
//! the original map, leaving headers the schema does not mention untouched.

use serde_json::{Map, Value};

/// Builds the normalized view of a header map.
///
/// When two keys differ only by case, the first one wins.
///
/// ```
/// use serde_json::{json, Map};
/// use vigil_middleware::headers::normalize_headers;
///
/// let mut raw = Map::new();
/// raw.insert("X-Tenant".into(), json!(["acme", "other"]));
/// raw.insert("accept".into(), json!("application/json"));
///
/// let view = normalize_headers(&raw);
/// assert_eq!(view["x-tenant"], json!("acme"));
/// assert_eq!(view["accept"], json!("application/json"));
/// ```
#[must_use]
pub fn normalize_headers(headers: &Map<String, Value>) -> Map<String, Value> {
    let mut view = Map::new();
    for (name, value) in headers {
        let key = name.to_ascii_lowercase();
        if view.contains_key(&key) {
            continue;
        }
        let single = match value {
            Value::Array(values) => values.first().cloned().unwrap_or(Value::Null),
            other => other.clone(),
        };
        view.insert(key, single);
    }
    view
}

/// Writes validated header values back into the original map.
///
/// Each validated key replaces every original key equal to it ignoring
/// case. Keys absent from `validated` are left alone.
pub fn merge_headers(original: &mut Map<String, Value>, validated: Map<String, Value>) {
    for (name, value) in validated {
        original.retain(|key, _| !key.eq_ignore_ascii_case(&name));
        original.insert(name, value);
    }
}
