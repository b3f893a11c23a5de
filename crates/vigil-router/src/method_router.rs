//! HTTP method dispatch for a single path.
//!
//! [`MethodRouter`] maps methods to route targets. Any [`Method`] is accepted,
//! including extension methods, and the first registration for a method wins.

use http::Method;
use smallvec::SmallVec;

/// Maps HTTP methods to route targets for one path pattern.
///
/// # Example
///
/// ```rust
/// use vigil_router::MethodRouter;
/// use http::Method;
///
/// let router = MethodRouter::new().get(0usize).post(1usize);
///
/// assert_eq!(router.for_method(&Method::GET), Some(&0));
/// assert_eq!(router.for_method(&Method::POST), Some(&1));
/// assert_eq!(router.for_method(&Method::DELETE), None);
/// ```
#[derive(Debug, Clone)]
pub struct MethodRouter<T> {
    entries: SmallVec<[(Method, T); 2]>,
}

impl<T> Default for MethodRouter<T> {
    fn default() -> Self {
        Self {
            entries: SmallVec::new(),
        }
    }
}

impl<T> MethodRouter<T> {
    /// Creates a new empty method router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a target for `method`. Ignored if the method is taken.
    #[must_use]
    pub fn method(mut self, method: Method, target: T) -> Self {
        self.insert(method, target);
        self
    }

    /// Registers a GET target.
    #[must_use]
    pub fn get(self, target: T) -> Self {
        self.method(Method::GET, target)
    }

    /// Registers a POST target.
    #[must_use]
    pub fn post(self, target: T) -> Self {
        self.method(Method::POST, target)
    }

    /// Registers a PUT target.
    #[must_use]
    pub fn put(self, target: T) -> Self {
        self.method(Method::PUT, target)
    }

    /// Registers a PATCH target.
    #[must_use]
    pub fn patch(self, target: T) -> Self {
        self.method(Method::PATCH, target)
    }

    /// Registers a DELETE target.
    #[must_use]
    pub fn delete(self, target: T) -> Self {
        self.method(Method::DELETE, target)
    }

    /// Registers a target in place. Returns false if the method was taken.
    pub fn insert(&mut self, method: Method, target: T) -> bool {
        if self.entries.iter().any(|(m, _)| *m == method) {
            return false;
        }
        self.entries.push((method, target));
        true
    }

    /// Returns the target registered for `method`.
    ///
    /// A `HEAD` request falls back to the `GET` target.
    #[must_use]
    pub fn for_method(&self, method: &Method) -> Option<&T> {
        let lookup = |wanted: &Method| {
            self.entries
                .iter()
                .find(|(m, _)| m == wanted)
                .map(|(_, target)| target)
        };
        lookup(method).or_else(|| {
            if *method == Method::HEAD {
                lookup(&Method::GET)
            } else {
                None
            }
        })
    }

    /// Moves targets from `other` for methods not yet registered here.
    pub fn merge(&mut self, other: MethodRouter<T>) {
        for (method, target) in other.entries {
            self.insert(method, target);
        }
    }

    /// Returns the registered methods in registration order.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<Method> {
        self.entries.iter().map(|(m, _)| m.clone()).collect()
    }

    /// Returns true if no method is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let router: MethodRouter<usize> = MethodRouter::new();
        assert!(router.is_empty());
        assert!(router.allowed_methods().is_empty());
    }

    #[test]
    fn test_shorthands() {
        let router = MethodRouter::new()
            .get("list")
            .post("create")
            .put("replace")
            .patch("update")
            .delete("remove");

        assert_eq!(router.for_method(&Method::GET), Some(&"list"));
        assert_eq!(router.for_method(&Method::POST), Some(&"create"));
        assert_eq!(router.for_method(&Method::PUT), Some(&"replace"));
        assert_eq!(router.for_method(&Method::PATCH), Some(&"update"));
        assert_eq!(router.for_method(&Method::DELETE), Some(&"remove"));
        assert_eq!(router.for_method(&Method::OPTIONS), None);
    }

    #[test]
    fn test_extension_method() {
        let purge = Method::from_bytes(b"PURGE").unwrap();
        let router = MethodRouter::new().method(purge.clone(), 9);
        assert_eq!(router.for_method(&purge), Some(&9));
    }

    #[test]
    fn test_head_falls_back_to_get() {
        let router = MethodRouter::new().get(1);
        assert_eq!(router.for_method(&Method::HEAD), Some(&1));

        let router = MethodRouter::new().get(1).method(Method::HEAD, 2);
        assert_eq!(router.for_method(&Method::HEAD), Some(&2));
    }

    #[test]
    fn test_first_registration_wins() {
        let mut router = MethodRouter::new().get(1);
        assert!(!router.insert(Method::GET, 2));
        assert_eq!(router.for_method(&Method::GET), Some(&1));
    }

    #[test]
    fn test_merge_keeps_existing() {
        let mut router = MethodRouter::new().get("original");
        router.merge(MethodRouter::new().get("replacement").post("create"));

        assert_eq!(router.for_method(&Method::GET), Some(&"original"));
        assert_eq!(router.for_method(&Method::POST), Some(&"create"));
        assert_eq!(router.allowed_methods(), vec![Method::GET, Method::POST]);
    }
}
