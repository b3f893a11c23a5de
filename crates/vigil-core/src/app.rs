//! Applications: route tables, nesting and dispatch.
//!
//! An [`App`] owns global middleware and a list of routes, each an ordered
//! [`Chain`] of middleware units ending in a handler. [`App::handle`] turns
//! an `http::Request` into an `http::Response`, so the app can sit behind
//! any server that speaks the `http` types.
//!
//! Global middleware runs before every route chain, in registration order.
//! Nested apps are flattened at mount time: their routes are re-registered
//! under the prefix with the nested app's global middleware prepended.
//!
//! # Example
//!
//! ```
//! use vigil_core::{handler, App};
//! use serde_json::json;
//!
//! let mut users = App::new();
//! users.get("/:id", handler(|ex| Box::pin(async move {
//!     let id = ex.request.param("id").cloned().unwrap_or_default();
//!     ex.response.json(json!({ "id": id }))
//! })));
//!
//! let mut app = App::new();
//! app.nest("/users", users);
//! assert_eq!(app.routes()[0].path(), "/users/:id");
//! ```

use crate::contract::SchemaContract;
use crate::error::{VigilError, VigilResult};
use crate::exchange::Exchange;
use crate::middleware::{Middleware, Next};
use crate::request::Request;
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, ALLOW, CONTENT_TYPE};
use http::Method;
use http_body_util::Full;
use serde_json::Value;
use std::sync::Arc;
use tracing::Instrument;
use vigil_router::{join_paths, to_template, Router};

/// Header carrying the request identifier on every response.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Renders an error that escaped the middleware chain.
pub type ErrorHandler =
    Arc<dyn Fn(&VigilError, &Request) -> http::Response<Full<Bytes>> + Send + Sync>;

/// An ordered list of middleware units.
#[derive(Clone, Default)]
pub struct Chain {
    units: Vec<Arc<dyn Middleware>>,
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.units.iter().map(|m| m.name()))
            .finish()
    }
}

impl Chain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a unit.
    #[must_use]
    pub fn then(mut self, unit: impl Middleware) -> Self {
        self.units.push(Arc::new(unit));
        self
    }

    /// Appends a shared unit.
    #[must_use]
    pub fn then_shared(mut self, unit: Arc<dyn Middleware>) -> Self {
        self.units.push(unit);
        self
    }

    /// Returns the units in order.
    #[must_use]
    pub fn units(&self) -> &[Arc<dyn Middleware>] {
        &self.units
    }

    /// Returns the number of units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Returns true if the chain is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl<M: Middleware> From<M> for Chain {
    fn from(unit: M) -> Self {
        Self::new().then(unit)
    }
}

impl From<Vec<Arc<dyn Middleware>>> for Chain {
    fn from(units: Vec<Arc<dyn Middleware>>) -> Self {
        Self { units }
    }
}

/// A registered route.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    method: Method,
    path: String,
    chain: Chain,
}

impl RouteEntry {
    /// Returns the method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the full path pattern, as registered.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the route's chain. App-level middleware is not part of it.
    #[must_use]
    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// Returns the first schema contract found on the chain.
    #[must_use]
    pub fn contract(&self) -> Option<&Arc<SchemaContract>> {
        self.chain.units().iter().find_map(|unit| unit.contract())
    }
}

/// An application: middleware, routes and an error handler.
#[derive(Default)]
pub struct App {
    middleware: Vec<Arc<dyn Middleware>>,
    routes: Vec<RouteEntry>,
    router: Router<usize>,
    error_handler: Option<ErrorHandler>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("middleware", &self.middleware.iter().map(|m| m.name()).collect::<Vec<_>>())
            .field("routes", &self.routes)
            .field("custom_error_handler", &self.error_handler.is_some())
            .finish()
    }
}

impl App {
    /// Creates an empty application.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds middleware that runs before every route.
    pub fn use_middleware(&mut self, unit: impl Middleware) -> &mut Self {
        self.middleware.push(Arc::new(unit));
        self
    }

    /// Registers a route.
    ///
    /// A second registration of the same method and pattern is ignored with
    /// a warning; the first one wins.
    pub fn route(&mut self, method: Method, path: &str, chain: impl Into<Chain>) -> &mut Self {
        self.insert(RouteEntry {
            method,
            path: normalize(path),
            chain: chain.into(),
        });
        self
    }

    /// Registers a `GET` route.
    pub fn get(&mut self, path: &str, chain: impl Into<Chain>) -> &mut Self {
        self.route(Method::GET, path, chain)
    }

    /// Registers a `POST` route.
    pub fn post(&mut self, path: &str, chain: impl Into<Chain>) -> &mut Self {
        self.route(Method::POST, path, chain)
    }

    /// Registers a `PUT` route.
    pub fn put(&mut self, path: &str, chain: impl Into<Chain>) -> &mut Self {
        self.route(Method::PUT, path, chain)
    }

    /// Registers a `PATCH` route.
    pub fn patch(&mut self, path: &str, chain: impl Into<Chain>) -> &mut Self {
        self.route(Method::PATCH, path, chain)
    }

    /// Registers a `DELETE` route.
    pub fn delete(&mut self, path: &str, chain: impl Into<Chain>) -> &mut Self {
        self.route(Method::DELETE, path, chain)
    }

    /// Mounts another application under `prefix`.
    ///
    /// The child's global middleware is prepended to each of its routes. Its
    /// error handler is dropped.
    pub fn nest(&mut self, prefix: &str, child: App) -> &mut Self {
        let App {
            middleware, routes, ..
        } = child;
        for entry in routes {
            let mut units = middleware.clone();
            units.extend(entry.chain.units);
            self.insert(RouteEntry {
                method: entry.method,
                path: join_paths(prefix, &entry.path),
                chain: Chain { units },
            });
        }
        self
    }

    /// Replaces the default error handler.
    pub fn on_error<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&VigilError, &Request) -> http::Response<Full<Bytes>> + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    /// Returns the registered routes in registration order.
    #[must_use]
    pub fn routes(&self) -> &[RouteEntry] {
        &self.routes
    }

    /// Returns the global middleware.
    #[must_use]
    pub fn middleware(&self) -> &[Arc<dyn Middleware>] {
        &self.middleware
    }

    fn insert(&mut self, entry: RouteEntry) {
        let template = to_template(&entry.path);
        let duplicate = self
            .routes
            .iter()
            .any(|r| r.method == entry.method && to_template(&r.path) == template);
        if duplicate {
            tracing::warn!(
                http.method = %entry.method,
                http.route = %entry.path,
                "duplicate route ignored"
            );
            return;
        }
        let index = self.routes.len();
        self.router.route(entry.method.clone(), &entry.path, index);
        self.routes.push(entry);
    }

    /// Handles one HTTP request.
    ///
    /// Errors escaping the chain are rendered by the error handler; a chain
    /// that finishes without emitting a response yields a 404.
    pub async fn handle(&self, request: http::Request<Full<Bytes>>) -> http::Response<Full<Bytes>> {
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        let request = match Request::from_http(request).await {
            Ok(request) => request,
            Err(err) => {
                tracing::debug!(error = %err, http.method = %method, http.path = %path, "unparseable request");
                return self.render_error(&err, &Request::new(method, path));
            }
        };

        let mut ex = Exchange::new(request);
        let request_id = ex.request_id();
        let span = tracing::info_span!(
            "request",
            request_id = %request_id,
            http.method = %method,
            http.path = %path,
            http.status_code = tracing::field::Empty,
        );

        async move {
            let mut response = match self.dispatch(&mut ex).await {
                Ok(()) => ex.into_response().finish(),
                Err(err) => {
                    match err.kind() {
                        crate::ErrorKind::Client => tracing::debug!(error = %err, "request rejected"),
                        kind => tracing::error!(error = %err, error.kind = kind.as_str(), "request failed"),
                    }
                    self.render_error(&err, &ex.request)
                }
            };

            if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
                response
                    .headers_mut()
                    .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
            }
            tracing::Span::current().record("http.status_code", response.status().as_u16());
            tracing::debug!("request completed");
            response
        }
        .instrument(span)
        .await
    }

    async fn dispatch(&self, ex: &mut Exchange) -> VigilResult<()> {
        let index = self.resolve(ex)?;
        let entry = &self.routes[index];
        ex.set_route(entry.path.clone());

        let chain: Vec<Arc<dyn Middleware>> = self
            .middleware
            .iter()
            .chain(entry.chain.units())
            .cloned()
            .collect();
        Next::new(&chain).run(ex).await?;

        if ex.response.is_sent() {
            Ok(())
        } else {
            Err(not_found(&ex.request))
        }
    }

    fn resolve(&self, ex: &mut Exchange) -> VigilResult<usize> {
        let request = &mut ex.request;
        if let Some(matched) = self.router.match_route(&request.method, &request.path) {
            for (name, value) in matched.params.iter() {
                request
                    .params
                    .insert(name.to_string(), Value::String(value.to_string()));
            }
            return Ok(*matched.target);
        }

        match self.router.match_path(&request.path) {
            Some((methods, _)) if !methods.is_empty() => Err(VigilError::MethodNotAllowed {
                method: request.method.to_string(),
                path: request.path.clone(),
                allowed: methods
                    .allowed_methods()
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
            }),
            _ => Err(not_found(request)),
        }
    }

    fn render_error(&self, err: &VigilError, request: &Request) -> http::Response<Full<Bytes>> {
        match &self.error_handler {
            Some(handler) => handler(err, request),
            None => default_error_response(err),
        }
    }
}

fn not_found(request: &Request) -> VigilError {
    VigilError::NotFound {
        method: request.method.to_string(),
        path: request.path.clone(),
    }
}

fn normalize(path: &str) -> String {
    join_paths("", path)
}

/// The default rendering: the public message as plain text.
#[must_use]
pub fn default_error_response(err: &VigilError) -> http::Response<Full<Bytes>> {
    let mut response = http::Response::new(Full::new(Bytes::from(err.public_message())));
    *response.status_mut() = err.status_code();
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static(crate::response::TEXT_PLAIN),
    );
    if let VigilError::MethodNotAllowed { allowed, .. } = err {
        if let Ok(value) = HeaderValue::from_str(&allowed.join(", ")) {
            response.headers_mut().insert(ALLOW, value);
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{handler, FnMiddleware};
    use http::StatusCode;
    use http_body_util::BodyExt;
    use serde_json::json;

    fn get(uri: &str) -> http::Request<Full<Bytes>> {
        http::Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    async fn body_json(response: http::Response<Full<Bytes>>) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn echo_params() -> Chain {
        handler(|ex| {
            Box::pin(async move {
                let params = Value::Object(ex.request.params.clone());
                ex.response.json(params)
            })
        })
        .into()
    }

    #[tokio::test]
    async fn test_params_are_strings() {
        let mut app = App::new();
        app.get("/users/:id", echo_params());

        let response = app.handle(get("/users/42")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        assert_eq!(body_json(response).await, json!({"id": "42"}));
    }

    #[tokio::test]
    async fn test_not_found_and_method_not_allowed() {
        let mut app = App::new();
        app.get("/users", echo_params());

        let response = app.handle(get("/nope")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let post = http::Request::builder()
            .method(Method::POST)
            .uri("/users")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let response = app.handle(post).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "GET");
    }

    #[tokio::test]
    async fn test_nest_prefixes_and_prepends_middleware() {
        let mut child = App::new();
        child.use_middleware(FnMiddleware::new("mark", |ex, next| {
            Box::pin(async move {
                ex.request.params.insert("marked".into(), json!("yes"));
                next.run(ex).await
            })
        }));
        child.get("/:id", echo_params());

        let mut app = App::new();
        app.nest("/items", child);
        assert_eq!(app.routes().len(), 1);
        assert_eq!(app.routes()[0].path(), "/items/:id");
        assert_eq!(app.routes()[0].chain().len(), 2);

        let response = app.handle(get("/items/7")).await;
        assert_eq!(body_json(response).await, json!({"id": "7", "marked": "yes"}));
    }

    #[tokio::test]
    async fn test_errors_use_default_renderer() {
        let mut app = App::new();
        app.get(
            "/fail",
            handler(|_ex| Box::pin(async move { Err::<(), _>(VigilError::configuration("wired wrong")) })),
        );

        let response = app.handle(get("/fail")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(bytes.as_ref(), b"Internal Server Error");
    }

    #[tokio::test]
    async fn test_custom_error_handler() {
        let mut app = App::new();
        app.get(
            "/fail",
            handler(|_ex| Box::pin(async move { Err::<(), _>(VigilError::internal("boom")) })),
        );
        app.on_error(|err, request| {
            let body = json!({ "message": err.to_string(), "path": request.path });
            let mut response = http::Response::new(Full::new(Bytes::from(body.to_string())));
            *response.status_mut() = StatusCode::SERVICE_UNAVAILABLE;
            response
        });

        let response = app.handle(get("/fail")).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body_json(response).await,
            json!({"message": "Internal error: boom", "path": "/fail"})
        );
    }

    #[tokio::test]
    async fn test_unsent_response_is_not_found() {
        let mut app = App::new();
        app.get("/silent", handler(|_ex| Box::pin(async move { Ok::<(), VigilError>(()) })));
        let response = app.handle(get("/silent")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_duplicate_routes_keep_first() {
        let mut app = App::new();
        app.get("/a/:id", echo_params());
        app.get("/a/{id}", echo_params());
        app.post("/a/:id", echo_params());
        assert_eq!(app.routes().len(), 2);
    }

    #[test]
    fn test_paths_are_normalized() {
        let mut app = App::new();
        app.get("users/", echo_params());
        assert_eq!(app.routes()[0].path(), "/users");
        assert!(app.routes()[0].contract().is_none());
    }
}
