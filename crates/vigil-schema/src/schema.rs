//! Schema values and their builders.
//!
//! A [`Schema`] is an immutable description of an acceptable value plus the
//! rules for turning a raw input into a parsed one (coercion, defaults,
//! unknown-key stripping, transforms). Schemas are cheap to clone: closures
//! are shared behind `Arc`.
//!
//! # Example
//!
//! ```
//! use vigil_schema::Schema;
//! use serde_json::json;
//!
//! let user = Schema::object([
//!     ("name", Schema::string().min_length(3)),
//!     ("age", Schema::number().min(18.0)),
//!     ("email", Schema::string().email().optional()),
//! ]);
//!
//! assert!(user.validate(&json!({"name": "John", "age": 25})).is_ok());
//! assert!(user.validate(&json!({"name": "Jo", "age": 15})).is_err());
//! ```

use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// A fallible post-validation transform.
pub type TransformFn = Arc<dyn Fn(Value) -> anyhow::Result<Value> + Send + Sync>;

/// A predicate checked after the structural checks pass.
pub type RefineFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// What an object schema does with keys it does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownKeys {
    /// Drop undeclared keys from the parsed output.
    #[default]
    Strip,
    /// Copy undeclared keys through unchanged.
    Passthrough,
    /// Report undeclared keys as an issue.
    Strict,
}

/// Constraints on string values.
#[derive(Debug, Clone, Default)]
pub struct StringRules {
    /// Minimum length in characters.
    pub min_length: Option<usize>,
    /// Maximum length in characters.
    pub max_length: Option<usize>,
    /// Pattern the whole string must match.
    pub pattern: Option<Regex>,
    /// Whether the value must look like an email address.
    pub email: bool,
}

/// Inclusive bounds on numeric values.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NumberRules {
    /// Inclusive lower bound.
    pub minimum: Option<f64>,
    /// Inclusive upper bound.
    pub maximum: Option<f64>,
}

/// The structural part of a schema.
#[derive(Debug, Clone)]
pub enum SchemaKind {
    /// Any string.
    String(StringRules),
    /// Any finite number.
    Number(NumberRules),
    /// A number without a fractional part.
    Integer(NumberRules),
    /// `true` or `false`.
    Boolean,
    /// Exactly this value.
    Literal(Value),
    /// One of a fixed set of strings.
    Enum(Vec<String>),
    /// A homogeneous array.
    Array {
        /// Element schema.
        items: Box<Schema>,
        /// Minimum number of elements.
        min_items: Option<usize>,
        /// Maximum number of elements.
        max_items: Option<usize>,
    },
    /// An object with declared properties, checked in declaration order.
    Object {
        /// Declared properties.
        properties: IndexMap<String, Schema>,
        /// Handling of undeclared keys.
        unknown_keys: UnknownKeys,
    },
    /// An object with arbitrary keys and uniform values.
    Record(Box<Schema>),
    /// The first member that accepts the value wins.
    Union(Vec<Schema>),
    /// Accepts anything.
    Any,
    /// Accepts only `null`.
    Null,
    /// Accepts nothing. Marks "no body" for response schemas.
    Never,
}

impl SchemaKind {
    /// Returns the name of the expected type for issue messages.
    #[must_use]
    pub fn expected_name(&self) -> String {
        match self {
            Self::String(_) => "string".to_string(),
            Self::Number(_) => "number".to_string(),
            Self::Integer(_) => "integer".to_string(),
            Self::Boolean => "boolean".to_string(),
            Self::Literal(value) => value.to_string(),
            Self::Enum(members) => members
                .iter()
                .map(|m| format!("'{m}'"))
                .collect::<Vec<_>>()
                .join(" | "),
            Self::Array { .. } => "array".to_string(),
            Self::Object { .. } | Self::Record(_) => "object".to_string(),
            Self::Union(_) => "union".to_string(),
            Self::Any => "any".to_string(),
            Self::Null => "null".to_string(),
            Self::Never => "never".to_string(),
        }
    }
}

/// A declarative description of an acceptable value.
#[derive(Clone)]
pub struct Schema {
    pub(crate) kind: SchemaKind,
    pub(crate) optional: bool,
    pub(crate) nullable: bool,
    pub(crate) coerce: bool,
    pub(crate) default: Option<Value>,
    pub(crate) description: Option<String>,
    pub(crate) refinements: Vec<(String, RefineFn)>,
    pub(crate) transforms: Vec<TransformFn>,
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("kind", &self.kind)
            .field("optional", &self.optional)
            .field("nullable", &self.nullable)
            .field("coerce", &self.coerce)
            .field("default", &self.default)
            .field("description", &self.description)
            .field("refinements", &self.refinements.len())
            .field("transforms", &self.transforms.len())
            .finish()
    }
}

impl From<SchemaKind> for Schema {
    fn from(kind: SchemaKind) -> Self {
        Self {
            kind,
            optional: false,
            nullable: false,
            coerce: false,
            default: None,
            description: None,
            refinements: Vec::new(),
            transforms: Vec::new(),
        }
    }
}

impl Schema {
    /// Creates a string schema.
    #[must_use]
    pub fn string() -> Self {
        SchemaKind::String(StringRules::default()).into()
    }

    /// Creates a number schema.
    #[must_use]
    pub fn number() -> Self {
        SchemaKind::Number(NumberRules::default()).into()
    }

    /// Creates an integer schema.
    #[must_use]
    pub fn integer() -> Self {
        SchemaKind::Integer(NumberRules::default()).into()
    }

    /// Creates a boolean schema.
    #[must_use]
    pub fn boolean() -> Self {
        SchemaKind::Boolean.into()
    }

    /// Creates a schema accepting exactly `value`.
    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Self {
        SchemaKind::Literal(value.into()).into()
    }

    /// Creates a schema accepting one of the given strings.
    #[must_use]
    pub fn enumeration<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SchemaKind::Enum(members.into_iter().map(Into::into).collect()).into()
    }

    /// Creates an array schema.
    #[must_use]
    pub fn array(items: Schema) -> Self {
        SchemaKind::Array {
            items: Box::new(items),
            min_items: None,
            max_items: None,
        }
        .into()
    }

    /// Creates an object schema. Properties are checked in the given order.
    #[must_use]
    pub fn object<I, K>(properties: I) -> Self
    where
        I: IntoIterator<Item = (K, Schema)>,
        K: Into<String>,
    {
        SchemaKind::Object {
            properties: properties
                .into_iter()
                .map(|(name, schema)| (name.into(), schema))
                .collect(),
            unknown_keys: UnknownKeys::default(),
        }
        .into()
    }

    /// Creates a schema for objects with arbitrary keys.
    #[must_use]
    pub fn record(values: Schema) -> Self {
        SchemaKind::Record(Box::new(values)).into()
    }

    /// Creates a union; members are tried in order.
    #[must_use]
    pub fn union(members: impl IntoIterator<Item = Schema>) -> Self {
        SchemaKind::Union(members.into_iter().collect()).into()
    }

    /// Creates a schema that accepts anything.
    #[must_use]
    pub fn any() -> Self {
        SchemaKind::Any.into()
    }

    /// Creates a schema that accepts only `null`.
    #[must_use]
    pub fn null() -> Self {
        SchemaKind::Null.into()
    }

    /// Creates a schema that accepts nothing.
    #[must_use]
    pub fn never() -> Self {
        SchemaKind::Never.into()
    }

    // ------------------------------------------------------------------
    // Modifiers
    // ------------------------------------------------------------------

    /// Allows the value to be absent.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Allows the value to be `null`.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Converts textual input to the target primitive before checking.
    ///
    /// Path parameters, query strings, and headers always arrive as text;
    /// a coerced `integer()` accepts `"42"` and yields `42`.
    #[must_use]
    pub fn coerce(mut self) -> Self {
        self.coerce = true;
        self
    }

    /// Substitutes `value` when the input is absent.
    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Attaches a description, surfaced in generated documentation.
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a predicate; a `false` result is reported as a `custom` issue.
    #[must_use]
    pub fn refine<F>(mut self, message: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.refinements.push((message.into(), Arc::new(predicate)));
        self
    }

    /// Adds a transform applied to the parsed value.
    ///
    /// An error returned by the transform is a schema fault, not a
    /// validation issue.
    #[must_use]
    pub fn transform<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.transforms.push(Arc::new(f));
        self
    }

    /// Sets the minimum length for string schemas.
    #[must_use]
    pub fn min_length(mut self, len: usize) -> Self {
        if let SchemaKind::String(rules) = &mut self.kind {
            rules.min_length = Some(len);
        }
        self
    }

    /// Sets the maximum length for string schemas.
    #[must_use]
    pub fn max_length(mut self, len: usize) -> Self {
        if let SchemaKind::String(rules) = &mut self.kind {
            rules.max_length = Some(len);
        }
        self
    }

    /// Requires string values to match `pattern`.
    #[must_use]
    pub fn pattern(mut self, pattern: Regex) -> Self {
        if let SchemaKind::String(rules) = &mut self.kind {
            rules.pattern = Some(pattern);
        }
        self
    }

    /// Requires string values to look like an email address.
    #[must_use]
    pub fn email(mut self) -> Self {
        if let SchemaKind::String(rules) = &mut self.kind {
            rules.email = true;
        }
        self
    }

    /// Sets the inclusive minimum for number and integer schemas.
    #[must_use]
    pub fn min(mut self, min: f64) -> Self {
        if let SchemaKind::Number(rules) | SchemaKind::Integer(rules) = &mut self.kind {
            rules.minimum = Some(min);
        }
        self
    }

    /// Sets the inclusive maximum for number and integer schemas.
    #[must_use]
    pub fn max(mut self, max: f64) -> Self {
        if let SchemaKind::Number(rules) | SchemaKind::Integer(rules) = &mut self.kind {
            rules.maximum = Some(max);
        }
        self
    }

    /// Sets the minimum element count for array schemas.
    #[must_use]
    pub fn min_items(mut self, min: usize) -> Self {
        if let SchemaKind::Array { min_items, .. } = &mut self.kind {
            *min_items = Some(min);
        }
        self
    }

    /// Sets the maximum element count for array schemas.
    #[must_use]
    pub fn max_items(mut self, max: usize) -> Self {
        if let SchemaKind::Array { max_items, .. } = &mut self.kind {
            *max_items = Some(max);
        }
        self
    }

    /// Rejects undeclared keys in object schemas.
    #[must_use]
    pub fn strict(self) -> Self {
        self.unknown_keys(UnknownKeys::Strict)
    }

    /// Keeps undeclared keys in object schemas.
    #[must_use]
    pub fn passthrough(self) -> Self {
        self.unknown_keys(UnknownKeys::Passthrough)
    }

    fn unknown_keys(mut self, policy: UnknownKeys) -> Self {
        if let SchemaKind::Object { unknown_keys, .. } = &mut self.kind {
            *unknown_keys = policy;
        }
        self
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// Returns the structural kind.
    #[must_use]
    pub fn kind(&self) -> &SchemaKind {
        &self.kind
    }

    /// Returns true if an absent value is accepted.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.optional || self.default.is_some()
    }

    /// Returns true if `null` is accepted.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.nullable || matches!(self.kind, SchemaKind::Null | SchemaKind::Any)
    }

    /// Returns true for the "no value allowed" schema.
    #[must_use]
    pub fn is_never(&self) -> bool {
        matches!(self.kind, SchemaKind::Never)
    }

    /// Returns true if textual coercion is enabled.
    #[must_use]
    pub fn is_coerced(&self) -> bool {
        self.coerce
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the default value, if any.
    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Returns the declared properties of an object schema.
    #[must_use]
    pub fn properties(&self) -> Option<&IndexMap<String, Schema>> {
        match &self.kind {
            SchemaKind::Object { properties, .. } => Some(properties),
            _ => None,
        }
    }
}
