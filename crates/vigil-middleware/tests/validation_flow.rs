//! End-to-end validation through an `App`.

use bytes::Bytes;
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use serde_json::{json, Value};
use std::sync::Arc;
use vigil_core::{handler, App, Chain, Middleware, Request, SchemaContract, VigilError};
use vigil_middleware::{ContractExt, ValidationMiddleware};
use vigil_schema::Schema;

fn request(method: Method, uri: &str, body: Option<Value>) -> http::Request<Full<Bytes>> {
    let builder = http::Request::builder().method(method).uri(uri);
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap(),
        None => builder.body(Full::new(Bytes::new())).unwrap(),
    }
}

async fn read(response: http::Response<Full<Bytes>>) -> (StatusCode, Bytes) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes)
}

fn user_contract() -> SchemaContract {
    SchemaContract::builder()
        .body(Schema::object([
            ("name", Schema::string().min_length(3)),
            ("age", Schema::number().min(18.0)),
        ]))
        .build()
        .unwrap()
}

/// Echoes the (validated) request state back as the response.
fn echo() -> Arc<dyn Middleware> {
    Arc::new(handler(|ex| {
        Box::pin(async move {
            let body = json!({
                "body": ex.request.body.clone(),
                "query": ex.request.query.clone(),
                "params": ex.request.params.clone(),
            });
            ex.response.json(body)
        })
    }))
}

/// Surfaces the error text so assertions can inspect it.
fn expose_errors(app: &mut App) {
    app.on_error(|err: &VigilError, _req: &Request| {
        let mut response = http::Response::new(Full::new(Bytes::from(err.to_string())));
        *response.status_mut() = err.status_code();
        response
    });
}

#[tokio::test]
async fn test_rejects_invalid_body_with_all_paths() {
    let mut app = App::new();
    app.post(
        "/users",
        Chain::new()
            .then(ValidationMiddleware::new(user_contract()).unwrap())
            .then(handler(|ex| Box::pin(async move { ex.response.json(json!({"created": true})) }))),
    );

    let (status, body) = read(
        app.handle(request(Method::POST, "/users", Some(json!({"name": "Jo", "age": 15}))))
            .await,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let body: Value = serde_json::from_slice(&body).unwrap();
    let errors = body["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0]["path"], json!(["name"]));
    assert_eq!(errors[0]["location"], json!("body"));
    assert_eq!(errors[0]["code"], json!("too_small"));
    assert_eq!(errors[1]["path"], json!(["age"]));
    assert!(errors[1]["message"].is_string());
}

#[tokio::test]
async fn test_valid_body_reaches_handler_unchanged() {
    let mut app = App::new();
    app.post(
        "/users",
        Chain::new()
            .then(ValidationMiddleware::new(user_contract()).unwrap())
            .then_shared(echo()),
    );

    let (status, body) = read(
        app.handle(request(Method::POST, "/users", Some(json!({"name": "John", "age": 25}))))
            .await,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["body"], json!({"name": "John", "age": 25}));
}

#[tokio::test]
async fn test_handler_observes_coerced_values() {
    let contract = SchemaContract::builder()
        .params(Schema::object([("id", Schema::integer().coerce())]))
        .query(Schema::object([
            ("limit", Schema::integer().coerce().default(20)),
            ("verbose", Schema::boolean().coerce().optional()),
        ]))
        .build()
        .unwrap();

    let mut app = App::new();
    app.get(
        "/orders/:id",
        Chain::new()
            .then(contract.middleware().unwrap())
            .then_shared(echo()),
    );

    let (status, body) = read(app.handle(request(Method::GET, "/orders/42?verbose=false", None)).await).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["params"], json!({"id": 42}));
    assert_eq!(body["query"], json!({"limit": 20, "verbose": false}));
}

#[tokio::test]
async fn test_aggregates_issues_across_fields() {
    let contract = SchemaContract::builder()
        .headers(Schema::object([("x-api-key", Schema::string().min_length(8))]))
        .body(Schema::object([("sku", Schema::string())]))
        .query(Schema::object([("dry_run", Schema::boolean().coerce())]))
        .params(Schema::object([("store", Schema::integer().coerce())]))
        .build()
        .unwrap();

    let mut app = App::new();
    app.post("/stores/:store/items", Chain::new().then(contract.middleware().unwrap()).then_shared(echo()));

    let req = http::Request::builder()
        .method(Method::POST)
        .uri("/stores/main/items?dry_run=maybe")
        .header("content-type", "application/json")
        .header("X-Api-Key", "short")
        .body(Full::new(Bytes::from(r#"{"sku": 12}"#)))
        .unwrap();
    let (status, body) = read(app.handle(req).await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let body: Value = serde_json::from_slice(&body).unwrap();
    let locations: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["location"].as_str().unwrap())
        .collect();
    assert_eq!(locations, vec!["headers", "body", "query", "params"]);
}

fn greeting_contract() -> SchemaContract {
    SchemaContract::builder()
        .status(200, Schema::object([("message", Schema::string())]))
        .status(404, Schema::object([("error", Schema::string())]))
        .status(500, Schema::object([("error", Schema::string())]))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_typed_response_follows_chosen_status() {
    let mut app = App::new();
    app.get(
        "/greeting",
        greeting_contract().handler(handler(|ex| {
            Box::pin(async move { ex.response.status(StatusCode::NOT_FOUND).json(json!({"error": "nf"})) })
        })),
    );

    let (status, body) = read(app.handle(request(Method::GET, "/greeting", None)).await).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(&body[..], br#"{"error":"nf"}"#);
}

#[tokio::test]
async fn test_typed_response_rejects_shape_of_other_status() {
    let mut app = App::new();
    expose_errors(&mut app);
    app.get(
        "/greeting",
        greeting_contract().handler(handler(|ex| {
            Box::pin(async move { ex.response.status(StatusCode::NOT_FOUND).json(json!({"message": "hi"})) })
        })),
    );

    let (status, body) = read(app.handle(request(Method::GET, "/greeting", None)).await).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(String::from_utf8_lossy(&body).contains("status 404"));
}

#[tokio::test]
async fn test_unregistered_status_is_a_configuration_fault() {
    let mut app = App::new();
    expose_errors(&mut app);
    app.get(
        "/greeting",
        greeting_contract().handler(handler(|ex| {
            Box::pin(async move { ex.response.status(StatusCode::CREATED).json(json!({"message": "hi"})) })
        })),
    );

    let (status, body) = read(app.handle(request(Method::GET, "/greeting", None)).await).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        String::from_utf8_lossy(&body),
        "Configuration error: no schema defined for status code 201"
    );
}

#[tokio::test]
async fn test_configuration_fault_is_not_leaked_by_default() {
    let mut app = App::new();
    app.get(
        "/greeting",
        greeting_contract().handler(handler(|ex| {
            Box::pin(async move { ex.response.status(StatusCode::CREATED).json(json!({})) })
        })),
    );

    let (status, body) = read(app.handle(request(Method::GET, "/greeting", None)).await).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(String::from_utf8_lossy(&body), "Internal Server Error");
}

#[tokio::test]
async fn test_default_status_uses_200_schema() {
    let mut app = App::new();
    app.get(
        "/greeting",
        greeting_contract().handler(handler(|ex| Box::pin(async move { ex.response.json(json!({"message": "hello"})) }))),
    );

    let (status, body) = read(app.handle(request(Method::GET, "/greeting", None)).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], br#"{"message":"hello"}"#);
}

#[tokio::test]
async fn test_send_round_trips_serialized_json() {
    let mut app = App::new();
    app.get(
        "/greeting",
        greeting_contract().handler(handler(|ex| {
            Box::pin(async move {
                ex.response.set_type("application/json");
                ex.response.send(Value::String(r#"{"message":"hello"}"#.to_string()))
            })
        })),
    );

    let (status, body) = read(app.handle(request(Method::GET, "/greeting", None)).await).await;
    assert_eq!(status, StatusCode::OK);
    let decoded: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(decoded, json!({"message": "hello"}));
}

#[tokio::test]
async fn test_malformed_serialized_json_is_a_server_fault() {
    let mut app = App::new();
    expose_errors(&mut app);
    app.get(
        "/greeting",
        greeting_contract().handler(handler(|ex| {
            Box::pin(async move {
                ex.response.set_type("application/json");
                ex.response.send(Value::String("{not json".to_string()))
            })
        })),
    );

    let (status, body) = read(app.handle(request(Method::GET, "/greeting", None)).await).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(String::from_utf8_lossy(&body).contains("line 1"));
}

#[tokio::test]
async fn test_request_rejection_precedes_response_checks() {
    let contract = SchemaContract::builder()
        .query(Schema::object([("q", Schema::string().min_length(1))]))
        .status(200, Schema::object([("results", Schema::array(Schema::string()))]))
        .build()
        .unwrap();

    let mut app = App::new();
    app.get(
        "/search",
        contract.handler(handler(|ex| Box::pin(async move { ex.response.json(json!({"results": []})) }))),
    );

    let (status, _) = read(app.handle(request(Method::GET, "/search", None)).await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = read(app.handle(request(Method::GET, "/search?q=rust", None)).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], br#"{"results":[]}"#);
}

#[tokio::test]
async fn test_locals_set_upstream_are_validated() {
    let contract = SchemaContract::builder()
        .locals(Schema::object([("tenant", Schema::string())]))
        .build()
        .unwrap();

    let mut app = App::new();
    app.get(
        "/tenant",
        Chain::new()
            .then(vigil_core::FnMiddleware::new("tenant", |ex, next| {
                Box::pin(async move {
                    if ex.request.header("x-tenant").is_some() {
                        ex.locals.insert("tenant".into(), json!("acme"));
                    }
                    next.run(ex).await
                })
            }))
            .then(contract.middleware().unwrap())
            .then(handler(|ex| {
                Box::pin(async move {
                    let tenant = ex.locals["tenant"].clone();
                    ex.response.json(json!({ "tenant": tenant }))
                })
            })),
    );

    let (status, _) = read(app.handle(request(Method::GET, "/tenant", None)).await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = http::Request::get("/tenant")
        .header("x-tenant", "acme")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let (status, body) = read(app.handle(req).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], br#"{"tenant":"acme"}"#);
}
