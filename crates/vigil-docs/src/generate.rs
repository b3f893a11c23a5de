//! Document generation from an [`App`]'s routes.

use crate::config::DocsConfig;
use crate::convert::{is_required, to_json_schema};
use crate::error::{DocsError, DocsResult};
use crate::openapi::{
    JsonSchema, MediaType, OpenApi, Operation, Parameter, ParameterIn, PathItem, RequestBody,
    Response, SchemaType, Tag,
};
use http::StatusCode;
use indexmap::IndexMap;
use regex::Regex;
use std::sync::OnceLock;
use vigil_core::{App, ResponseSchemas, SchemaContract, APPLICATION_JSON};
use vigil_router::to_template;
use vigil_schema::Schema;

/// Generates an OpenAPI document for every route of `app` that carries a
/// schema contract.
///
/// Nested applications are included with their mount prefixes. Routes
/// without a contract are skipped.
///
/// ```
/// use vigil_core::{handler, App, SchemaContract};
/// use vigil_docs::generate_openapi_spec;
/// use vigil_middleware::ContractExt;
/// use vigil_schema::Schema;
///
/// let contract = SchemaContract::builder()
///     .params(Schema::object([("id", Schema::integer().coerce())]))
///     .status(200, Schema::object([("name", Schema::string())]))
///     .build()
///     .unwrap();
///
/// let mut app = App::new();
/// app.get("/users/:id", contract.handler(handler(|ex| Box::pin(async move { ex.response.end() }))));
///
/// let doc = generate_openapi_spec(&app, None).unwrap();
/// assert_eq!(doc.info.title, "API");
/// assert!(doc.paths.contains_key("/users/{id}"));
/// ```
pub fn generate_openapi_spec(app: &App, config: Option<DocsConfig>) -> DocsResult<OpenApi> {
    let config = config.unwrap_or_default();
    config.check()?;

    let mut paths: IndexMap<String, PathItem> = IndexMap::new();
    let mut tags: Vec<Tag> = Vec::new();

    for route in app.routes() {
        let Some(contract) = route.contract() else {
            tracing::trace!(http.route = route.path(), "skipping route without contract");
            continue;
        };

        let template = to_template(route.path());
        let operation = convert_operation(&template, contract);

        for tag in &operation.tags {
            if !tags.iter().any(|t| &t.name == tag) {
                tags.push(Tag { name: tag.clone() });
            }
        }

        let item = paths.entry(template).or_default();
        let slot = item.slot_mut(route.method()).ok_or_else(|| DocsError::InvalidOperation {
            method: route.method().to_string(),
            path: route.path().to_string(),
            reason: "unsupported HTTP method".to_string(),
        })?;
        *slot = Some(operation);
    }

    tracing::debug!(paths = paths.len(), "generated OpenAPI document");

    Ok(OpenApi {
        openapi: config.openapi,
        info: config.info,
        servers: config.servers,
        paths,
        tags,
    })
}

/// Generates the document as pretty-printed JSON.
pub fn generate_json(app: &App, config: Option<DocsConfig>) -> DocsResult<String> {
    let spec = generate_openapi_spec(app, config)?;
    serde_json::to_string_pretty(&spec).map_err(DocsError::from)
}

fn convert_operation(template: &str, contract: &SchemaContract) -> Operation {
    let docs = contract.docs();

    let mut parameters = path_parameters(template, contract.params());
    parameters.extend(object_parameters(contract.query(), ParameterIn::Query));
    parameters.extend(object_parameters(contract.headers(), ParameterIn::Header));

    let request_body = contract.body().map(|schema| RequestBody {
        description: schema.description().map(ToString::to_string),
        required: is_required(schema),
        content: json_content(schema),
    });

    Operation {
        operation_id: docs.operation_id.clone(),
        summary: docs.summary.clone(),
        description: docs.description.clone(),
        tags: docs.tags.clone(),
        deprecated: docs.deprecated,
        parameters,
        request_body,
        responses: responses(contract.responses()),
    }
}

fn path_param_regex() -> Option<&'static Regex> {
    static PARAM: OnceLock<Option<Regex>> = OnceLock::new();
    PARAM
        .get_or_init(|| Regex::new(r"\{([^}]+)\}").ok())
        .as_ref()
}

/// Path parameters come from the template, in path order. A params schema
/// supplies the type of each one it declares.
fn path_parameters(template: &str, schema: Option<&Schema>) -> Vec<Parameter> {
    let declared = schema.and_then(Schema::properties);
    let Some(pattern) = path_param_regex() else {
        return Vec::new();
    };
    pattern
        .captures_iter(template)
        .filter_map(|cap| cap.get(1))
        .map(|name| {
            let name = name.as_str();
            let prop = declared.and_then(|props| props.get(name));
            Parameter {
                name: name.to_string(),
                location: ParameterIn::Path,
                description: prop.and_then(Schema::description).map(ToString::to_string),
                required: true,
                schema: Some(prop.map_or_else(
                    || JsonSchema::typed(SchemaType::String),
                    to_json_schema,
                )),
            }
        })
        .collect()
}

fn object_parameters(schema: Option<&Schema>, location: ParameterIn) -> Vec<Parameter> {
    let Some(properties) = schema.and_then(Schema::properties) else {
        return Vec::new();
    };
    properties
        .iter()
        .map(|(name, prop)| Parameter {
            name: name.clone(),
            location,
            description: prop.description().map(ToString::to_string),
            required: is_required(prop),
            schema: Some(to_json_schema(prop)),
        })
        .collect()
}

fn json_content(schema: &Schema) -> IndexMap<String, MediaType> {
    let mut content = IndexMap::new();
    content.insert(
        APPLICATION_JSON.to_string(),
        MediaType {
            schema: Some(to_json_schema(schema)),
        },
    );
    content
}

fn responses(schemas: Option<&ResponseSchemas>) -> IndexMap<String, Response> {
    let mut out = IndexMap::new();
    match schemas {
        None => {
            out.insert("200".to_string(), describe(200, None));
        }
        Some(ResponseSchemas::Single(schema)) => {
            out.insert("200".to_string(), describe(200, Some(schema)));
        }
        Some(ResponseSchemas::ByStatus(map)) => {
            for (code, schema) in map {
                out.insert(code.to_string(), describe(*code, Some(schema)));
            }
        }
    }
    out
}

/// A `never` schema documents a response without a body.
fn describe(code: u16, schema: Option<&Schema>) -> Response {
    let description = schema
        .and_then(Schema::description)
        .or_else(|| StatusCode::from_u16(code).ok()?.canonical_reason())
        .unwrap_or("Response")
        .to_string();
    let content = match schema {
        Some(schema) if !schema.is_never() => json_content(schema),
        _ => IndexMap::new(),
    };
    Response { description, content }
}
