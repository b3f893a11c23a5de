//! High-level router API.

use http::Method;

use crate::method_router::MethodRouter;
use crate::node::Node;
use crate::params::Params;
use crate::RouteMatch;

/// A radix tree router from `(method, path)` to a target of type `T`.
///
/// # Example
///
/// ```rust
/// use vigil_router::{MethodRouter, Router};
/// use http::Method;
///
/// let mut router = Router::new();
/// router.insert("/users", MethodRouter::new().get(0usize).post(1));
/// router.route(Method::GET, "/users/:id", 2);
///
/// let matched = router.match_route(&Method::GET, "/users/123").unwrap();
/// assert_eq!(*matched.target, 2);
/// assert_eq!(matched.params.get("id"), Some("123"));
/// ```
#[derive(Debug, Clone)]
pub struct Router<T> {
    root: Node<T>,
    route_count: usize,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Router<T> {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            route_count: 0,
        }
    }

    /// Inserts targets for a path pattern.
    pub fn insert(&mut self, path: &str, methods: MethodRouter<T>) {
        self.root.insert(path, methods);
        self.route_count += 1;
    }

    /// Inserts a single-method route.
    pub fn route(&mut self, method: Method, path: &str, target: T) {
        self.insert(path, MethodRouter::new().method(method, target));
    }

    /// Matches a method and concrete path.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, T>> {
        let (methods, params) = self.root.match_path(path)?;
        let target = methods.for_method(method)?;
        Some(RouteMatch::new(target, params))
    }

    /// Matches a path regardless of method; used to tell 404 from 405.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodRouter<T>, Params)> {
        self.root.match_path(path)
    }

    /// Returns the number of insertions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.route_count
    }

    /// Returns true if nothing was inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count == 0
    }
}
