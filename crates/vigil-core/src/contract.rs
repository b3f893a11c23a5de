//! Schema contracts.
//!
//! A [`SchemaContract`] is the declarative shape of one route: optional
//! schemas for the five request fields and at most one response
//! configuration. It is built once at registration time, shared behind an
//! `Arc`, and read by the validation middleware on every request and by the
//! OpenAPI generator once.
//!
//! # Example
//!
//! ```
//! use vigil_core::contract::SchemaContract;
//! use vigil_schema::Schema;
//!
//! let contract = SchemaContract::builder()
//!     .params(Schema::object([("id", Schema::integer().coerce())]))
//!     .status(200, Schema::object([("message", Schema::string())]))
//!     .status(404, Schema::object([("error", Schema::string())]))
//!     .summary("Fetch a user")
//!     .build()
//!     .unwrap();
//!
//! assert!(contract.is_typed());
//! assert!(contract.response_schema(404).is_some());
//! assert!(contract.response_schema(201).is_none());
//! ```

use crate::error::{VigilError, VigilResult};
use crate::reply::StatusReply;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use vigil_schema::Schema;

/// The request fields a contract can describe, in validation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestField {
    /// Request headers.
    Headers,
    /// Request body.
    Body,
    /// Query string parameters.
    Query,
    /// Path parameters.
    Params,
    /// The per-request locals bag.
    Locals,
}

impl RequestField {
    /// All fields in the order they are validated and reported.
    pub const ALL: [RequestField; 5] = [
        Self::Headers,
        Self::Body,
        Self::Query,
        Self::Params,
        Self::Locals,
    ];

    /// Returns the wire name used in error `location` fields.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Headers => "headers",
            Self::Body => "body",
            Self::Query => "query",
            Self::Params => "params",
            Self::Locals => "locals",
        }
    }
}

impl fmt::Display for RequestField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response schema configuration.
#[derive(Debug, Clone)]
pub enum ResponseSchemas {
    /// One schema for every emitted body, whatever the status.
    Single(Schema),
    /// One schema per status code.
    ByStatus(IndexMap<u16, Schema>),
}

/// Documentation metadata carried alongside the schemas.
#[derive(Debug, Clone, Default)]
pub struct OperationDocs {
    /// Short summary.
    pub summary: Option<String>,
    /// Longer description.
    pub description: Option<String>,
    /// Grouping tags.
    pub tags: Vec<String>,
    /// Explicit operation identifier.
    pub operation_id: Option<String>,
    /// Whether the operation is deprecated.
    pub deprecated: bool,
}

/// The declared shape of one route.
#[derive(Debug, Clone, Default)]
pub struct SchemaContract {
    body: Option<Schema>,
    headers: Option<Schema>,
    query: Option<Schema>,
    params: Option<Schema>,
    locals: Option<Schema>,
    responses: Option<ResponseSchemas>,
    docs: OperationDocs,
}

impl SchemaContract {
    /// Creates a contract builder.
    #[must_use]
    pub fn builder() -> ContractBuilder {
        ContractBuilder::default()
    }

    /// Returns the schema for a request field.
    #[must_use]
    pub fn request_schema(&self, field: RequestField) -> Option<&Schema> {
        match field {
            RequestField::Headers => self.headers.as_ref(),
            RequestField::Body => self.body.as_ref(),
            RequestField::Query => self.query.as_ref(),
            RequestField::Params => self.params.as_ref(),
            RequestField::Locals => self.locals.as_ref(),
        }
    }

    /// Returns the body schema.
    #[must_use]
    pub fn body(&self) -> Option<&Schema> {
        self.body.as_ref()
    }

    /// Returns the headers schema.
    #[must_use]
    pub fn headers(&self) -> Option<&Schema> {
        self.headers.as_ref()
    }

    /// Returns the query schema.
    #[must_use]
    pub fn query(&self) -> Option<&Schema> {
        self.query.as_ref()
    }

    /// Returns the path parameters schema.
    #[must_use]
    pub fn params(&self) -> Option<&Schema> {
        self.params.as_ref()
    }

    /// Returns the locals schema.
    #[must_use]
    pub fn locals(&self) -> Option<&Schema> {
        self.locals.as_ref()
    }

    /// Returns the response configuration.
    #[must_use]
    pub fn responses(&self) -> Option<&ResponseSchemas> {
        self.responses.as_ref()
    }

    /// Returns true if responses are keyed by status code.
    #[must_use]
    pub fn is_typed(&self) -> bool {
        matches!(self.responses, Some(ResponseSchemas::ByStatus(_)))
    }

    /// Returns the schema governing a body emitted under `status`.
    ///
    /// In single-schema mode the one schema applies to every status.
    #[must_use]
    pub fn response_schema(&self, status: u16) -> Option<&Schema> {
        match self.responses.as_ref()? {
            ResponseSchemas::Single(schema) => Some(schema),
            ResponseSchemas::ByStatus(map) => map.get(&status),
        }
    }

    /// Returns the documentation metadata.
    #[must_use]
    pub fn docs(&self) -> &OperationDocs {
        &self.docs
    }
}

/// Builder for [`SchemaContract`].
#[derive(Debug, Default)]
pub struct ContractBuilder {
    contract: SchemaContract,
    single: Option<Schema>,
    by_status: IndexMap<u16, Schema>,
    invalid_status: Vec<u16>,
}

impl ContractBuilder {
    /// Sets the body schema.
    #[must_use]
    pub fn body(mut self, schema: Schema) -> Self {
        self.contract.body = Some(schema);
        self
    }

    /// Sets the headers schema. Keys are matched lowercase.
    #[must_use]
    pub fn headers(mut self, schema: Schema) -> Self {
        self.contract.headers = Some(schema);
        self
    }

    /// Sets the query schema.
    #[must_use]
    pub fn query(mut self, schema: Schema) -> Self {
        self.contract.query = Some(schema);
        self
    }

    /// Sets the path parameters schema.
    #[must_use]
    pub fn params(mut self, schema: Schema) -> Self {
        self.contract.params = Some(schema);
        self
    }

    /// Sets the locals schema.
    #[must_use]
    pub fn locals(mut self, schema: Schema) -> Self {
        self.contract.locals = Some(schema);
        self
    }

    /// Sets a single response schema applied regardless of status.
    #[must_use]
    pub fn response(mut self, schema: Schema) -> Self {
        self.single = Some(schema);
        self
    }

    /// Registers the response schema for one status code.
    #[must_use]
    pub fn status(mut self, status: u16, schema: Schema) -> Self {
        if (100..=599).contains(&status) {
            self.by_status.insert(status, schema);
        } else {
            self.invalid_status.push(status);
        }
        self
    }

    /// Returns true if any response schema has been set.
    #[must_use]
    pub fn declares_responses(&self) -> bool {
        self.single.is_some() || !self.by_status.is_empty() || !self.invalid_status.is_empty()
    }

    /// Registers every status/schema pair declared by a reply type.
    #[must_use]
    pub fn replies<R: StatusReply>(self) -> Self {
        R::schemas()
            .into_iter()
            .fold(self, |builder, (status, schema)| builder.status(status.as_u16(), schema))
    }

    /// Sets the summary.
    #[must_use]
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.contract.docs.summary = Some(summary.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.contract.docs.description = Some(description.into());
        self
    }

    /// Adds a tag.
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.contract.docs.tags.push(tag.into());
        self
    }

    /// Sets the operation identifier.
    #[must_use]
    pub fn operation_id(mut self, id: impl Into<String>) -> Self {
        self.contract.docs.operation_id = Some(id.into());
        self
    }

    /// Marks the operation deprecated.
    #[must_use]
    pub fn deprecated(mut self) -> Self {
        self.contract.docs.deprecated = true;
        self
    }

    /// Builds the contract.
    ///
    /// Fails if both a single response schema and per-status schemas were
    /// given, or if a status code is outside `100..=599`.
    pub fn build(self) -> VigilResult<SchemaContract> {
        let Self {
            mut contract,
            single,
            by_status,
            invalid_status,
        } = self;

        if let Some(status) = invalid_status.first() {
            return Err(VigilError::configuration(format!(
                "invalid response status code {status}"
            )));
        }

        contract.responses = match (single, by_status.is_empty()) {
            (Some(_), false) => {
                return Err(VigilError::configuration(
                    "a contract cannot declare both a single response schema and per-status response schemas",
                ));
            }
            (Some(schema), true) => Some(ResponseSchemas::Single(schema)),
            (None, false) => Some(ResponseSchemas::ByStatus(by_status)),
            (None, true) => None,
        };

        Ok(contract)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_contract() {
        let contract = SchemaContract::builder().build().unwrap();
        assert!(contract.responses().is_none());
        assert!(!contract.is_typed());
        for field in RequestField::ALL {
            assert!(contract.request_schema(field).is_none());
        }
    }

    #[test]
    fn test_field_order() {
        let names: Vec<_> = RequestField::ALL.iter().map(RequestField::as_str).collect();
        assert_eq!(names, vec!["headers", "body", "query", "params", "locals"]);
    }

    #[test]
    fn test_request_schemas_are_slotted() {
        let contract = SchemaContract::builder()
            .body(Schema::string())
            .query(Schema::object([("q", Schema::string())]))
            .locals(Schema::any())
            .build()
            .unwrap();
        assert!(contract.body().is_some());
        assert!(contract.query().is_some());
        assert!(contract.locals().is_some());
        assert!(contract.headers().is_none());
        assert!(contract.params().is_none());
    }

    #[test]
    fn test_single_response_applies_to_every_status() {
        let contract = SchemaContract::builder()
            .response(Schema::string())
            .build()
            .unwrap();
        assert!(!contract.is_typed());
        assert!(contract.response_schema(200).is_some());
        assert!(contract.response_schema(500).is_some());
    }

    #[test]
    fn test_typed_lookup() {
        let contract = SchemaContract::builder()
            .status(200, Schema::string())
            .status(404, Schema::string())
            .build()
            .unwrap();
        assert!(contract.is_typed());
        assert!(contract.response_schema(404).is_some());
        assert!(contract.response_schema(201).is_none());
    }

    #[test]
    fn test_modes_are_mutually_exclusive() {
        let err = SchemaContract::builder()
            .response(Schema::string())
            .status(200, Schema::string())
            .build()
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_invalid_status_rejected() {
        let err = SchemaContract::builder()
            .status(999, Schema::string())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("999"));
    }

    #[test]
    fn test_docs_metadata() {
        let contract = SchemaContract::builder()
            .summary("List users")
            .tag("users")
            .tag("admin")
            .operation_id("listUsers")
            .deprecated()
            .build()
            .unwrap();
        let docs = contract.docs();
        assert_eq!(docs.summary.as_deref(), Some("List users"));
        assert_eq!(docs.tags, vec!["users", "admin"]);
        assert_eq!(docs.operation_id.as_deref(), Some("listUsers"));
        assert!(docs.deprecated);
    }
}
