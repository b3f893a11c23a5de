//! Radix tree path matching for Vigil.
//!
//! The router maps `(method, path)` pairs to an arbitrary target type. The
//! application layer stores route indices here and keeps the middleware
//! chains themselves in an ordered list, so the same table serves request
//! dispatch and route introspection.
//!
//! # Path syntax
//!
//! - Static segments: `/users`
//! - Parameters: `/users/{id}` or `/users/:id`
//! - Trailing wildcard: `/files/*path`
//!
//! Static segments beat parameters, parameters beat wildcards.
//!
//! # Example
//!
//! ```rust
//! use vigil_router::{MethodRouter, Router};
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.insert("/users", MethodRouter::new().get("list").post("create"));
//! router.insert("/users/:id", MethodRouter::new().get("show"));
//!
//! let matched = router.match_route(&Method::GET, "/users/123").unwrap();
//! assert_eq!(*matched.target, "show");
//! assert_eq!(matched.params.get("id"), Some("123"));
//! ```

#![doc(html_root_url = "https://docs.rs/vigil-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod method_router;
mod node;
mod params;
mod router;

pub use method_router::MethodRouter;
pub use node::{Node, SegmentKind};
pub use params::Params;
pub use router::Router;

/// A matched route: its target and the captured parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a, T> {
    /// The matched target.
    pub target: &'a T,
    /// Captured path parameters.
    pub params: Params,
}

impl<'a, T> RouteMatch<'a, T> {
    /// Creates a new route match.
    #[must_use]
    pub fn new(target: &'a T, params: Params) -> Self {
        Self { target, params }
    }
}

/// Rewrites `:name` segments as `{name}`, the form used by OpenAPI.
///
/// ```rust
/// assert_eq!(vigil_router::to_template("/users/:id/posts/{postId}"), "/users/{id}/posts/{postId}");
/// assert_eq!(vigil_router::to_template("/"), "/");
/// ```
#[must_use]
pub fn to_template(path: &str) -> String {
    let segments: Vec<String> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| match s.strip_prefix(':') {
            Some(name) => format!("{{{name}}}"),
            None => s.to_string(),
        })
        .collect();
    format!("/{}", segments.join("/"))
}

/// Joins a mount prefix and a route path without doubling slashes.
///
/// ```rust
/// assert_eq!(vigil_router::join_paths("/api/", "/users"), "/api/users");
/// assert_eq!(vigil_router::join_paths("/api", "/"), "/api");
/// assert_eq!(vigil_router::join_paths("", "/users"), "/users");
/// ```
#[must_use]
pub fn join_paths(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    match (prefix.is_empty(), path.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{path}"),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{prefix}/{path}"),
    }
}
