//! Conversion of validation schemas into OpenAPI schema objects.
//!
//! The mapping is structural. Refinements and transforms have no OpenAPI
//! counterpart and are dropped; coercion is invisible too, since the
//! documented type is the one after coercion.

use crate::openapi::{AdditionalProperties, JsonSchema, SchemaType};
use serde_json::Value;
use vigil_schema::{Schema, SchemaKind, UnknownKeys};

/// Converts a validation schema.
#[must_use]
pub fn to_json_schema(schema: &Schema) -> JsonSchema {
    let mut out = match schema.kind() {
        SchemaKind::String(rules) => JsonSchema {
            min_length: rules.min_length.map(|n| n as u64),
            max_length: rules.max_length.map(|n| n as u64),
            pattern: rules.pattern.as_ref().map(|re| re.as_str().to_string()),
            format: rules.email.then(|| "email".to_string()),
            ..JsonSchema::typed(SchemaType::String)
        },
        SchemaKind::Number(rules) => JsonSchema {
            minimum: rules.minimum,
            maximum: rules.maximum,
            ..JsonSchema::typed(SchemaType::Number)
        },
        SchemaKind::Integer(rules) => JsonSchema {
            minimum: rules.minimum,
            maximum: rules.maximum,
            ..JsonSchema::typed(SchemaType::Integer)
        },
        SchemaKind::Boolean => JsonSchema::typed(SchemaType::Boolean),
        SchemaKind::Literal(value) => JsonSchema {
            schema_type: literal_type(value),
            enum_values: vec![value.clone()],
            ..JsonSchema::default()
        },
        SchemaKind::Enum(members) => JsonSchema {
            enum_values: members.iter().cloned().map(Value::String).collect(),
            ..JsonSchema::typed(SchemaType::String)
        },
        SchemaKind::Array {
            items,
            min_items,
            max_items,
        } => JsonSchema {
            items: Some(Box::new(to_json_schema(items))),
            min_items: min_items.map(|n| n as u64),
            max_items: max_items.map(|n| n as u64),
            ..JsonSchema::typed(SchemaType::Array)
        },
        SchemaKind::Object {
            properties,
            unknown_keys,
        } => JsonSchema {
            properties: properties
                .iter()
                .map(|(name, prop)| (name.clone(), to_json_schema(prop)))
                .collect(),
            required: properties
                .iter()
                .filter(|(_, prop)| is_required(prop))
                .map(|(name, _)| name.clone())
                .collect(),
            additional_properties: (*unknown_keys == UnknownKeys::Strict)
                .then_some(AdditionalProperties::Allowed(false)),
            ..JsonSchema::typed(SchemaType::Object)
        },
        SchemaKind::Record(values) => JsonSchema {
            additional_properties: Some(AdditionalProperties::Schema(Box::new(to_json_schema(values)))),
            ..JsonSchema::typed(SchemaType::Object)
        },
        SchemaKind::Union(members) => JsonSchema {
            one_of: members.iter().map(to_json_schema).collect(),
            ..JsonSchema::default()
        },
        SchemaKind::Any => JsonSchema::default(),
        SchemaKind::Null => JsonSchema {
            nullable: true,
            enum_values: vec![Value::Null],
            ..JsonSchema::default()
        },
        SchemaKind::Never => JsonSchema {
            not: Some(Box::default()),
            ..JsonSchema::default()
        },
    };

    out.description = schema.description().map(ToString::to_string);
    out.default = schema.default_value().cloned();
    out.nullable |= schema.is_nullable();
    out
}

/// Returns true if an absent value would fail validation.
#[must_use]
pub fn is_required(schema: &Schema) -> bool {
    !schema.is_optional() && schema.default_value().is_none()
}

fn literal_type(value: &Value) -> Option<SchemaType> {
    match value {
        Value::String(_) => Some(SchemaType::String),
        Value::Bool(_) => Some(SchemaType::Boolean),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(SchemaType::Integer),
        Value::Number(_) => Some(SchemaType::Number),
        _ => None,
    }
}
