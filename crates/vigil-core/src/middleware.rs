//! The middleware chain.
//!
//! A route is an ordered chain of [`Middleware`] units. Each unit receives
//! the exchange and a [`Next`] continuation; calling `next.run(ex)` hands
//! control to the rest of the chain, returning early short-circuits it.
//! Errors travel back up as `Err(VigilError)` and end at the application's
//! error handler.
//!
//! # Example
//!
//! ```
//! use vigil_core::middleware::{BoxFuture, Middleware, Next};
//! use vigil_core::{Exchange, VigilResult};
//!
//! struct Timing;
//!
//! impl Middleware for Timing {
//!     fn name(&self) -> &'static str {
//!         "timing"
//!     }
//!
//!     fn handle<'a>(&'a self, ex: &'a mut Exchange, next: Next<'a>) -> BoxFuture<'a, VigilResult<()>> {
//!         Box::pin(async move {
//!             let start = std::time::Instant::now();
//!             let result = next.run(ex).await;
//!             tracing::debug!(elapsed_ms = start.elapsed().as_millis() as u64, "request finished");
//!             result
//!         })
//!     }
//! }
//! ```

use crate::contract::SchemaContract;
use crate::error::VigilResult;
use crate::exchange::Exchange;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A unit in a middleware chain.
pub trait Middleware: Send + Sync + 'static {
    /// Returns the name used in logs.
    fn name(&self) -> &'static str;

    /// Processes the exchange, optionally delegating to `next`.
    fn handle<'a>(&'a self, ex: &'a mut Exchange, next: Next<'a>) -> BoxFuture<'a, VigilResult<()>>;

    /// Returns the schema contract this unit enforces, if any.
    ///
    /// Tooling such as the OpenAPI generator reads contracts through this.
    fn contract(&self) -> Option<&Arc<SchemaContract>> {
        None
    }
}

/// The remainder of a middleware chain.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    chain: &'a [Arc<dyn Middleware>],
}

impl std::fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.chain.iter().map(|m| m.name()))
            .finish()
    }
}

impl<'a> Next<'a> {
    /// Creates a continuation over `chain`.
    #[must_use]
    pub fn new(chain: &'a [Arc<dyn Middleware>]) -> Self {
        Self { chain }
    }

    /// Creates an empty continuation.
    #[must_use]
    pub fn end() -> Self {
        Self { chain: &[] }
    }

    /// Returns true if nothing is left to run.
    #[must_use]
    pub fn is_end(&self) -> bool {
        self.chain.is_empty()
    }

    /// Runs the rest of the chain.
    pub async fn run(self, ex: &mut Exchange) -> VigilResult<()> {
        match self.chain.split_first() {
            Some((first, rest)) => first.handle(ex, Next::new(rest)).await,
            None => Ok(()),
        }
    }
}

/// A middleware built from a closure.
///
/// ```
/// use vigil_core::middleware::FnMiddleware;
/// use serde_json::json;
///
/// let tag = FnMiddleware::new("tag", |ex, next| {
///     Box::pin(async move {
///         ex.locals.insert("tagged".to_string(), json!(true));
///         next.run(ex).await
///     })
/// });
/// ```
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut Exchange, Next<'a>) -> BoxFuture<'a, VigilResult<()>> + Send + Sync + 'static,
{
    /// Creates a closure-based middleware.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut Exchange, Next<'a>) -> BoxFuture<'a, VigilResult<()>> + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn handle<'a>(&'a self, ex: &'a mut Exchange, next: Next<'a>) -> BoxFuture<'a, VigilResult<()>> {
        (self.func)(ex, next)
    }
}

/// A terminal unit: runs a closure and ignores the rest of the chain.
pub struct FnHandler<F> {
    func: F,
}

impl<F> Middleware for FnHandler<F>
where
    F: for<'a> Fn(&'a mut Exchange) -> BoxFuture<'a, VigilResult<()>> + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        "handler"
    }

    fn handle<'a>(&'a self, ex: &'a mut Exchange, _next: Next<'a>) -> BoxFuture<'a, VigilResult<()>> {
        (self.func)(ex)
    }
}

/// Wraps a closure as a route handler.
///
/// ```
/// use vigil_core::handler;
/// use serde_json::json;
///
/// let hello = handler(|ex| Box::pin(async move { ex.response.json(json!({"message": "hi"})) }));
/// ```
pub fn handler<F>(func: F) -> FnHandler<F>
where
    F: for<'a> Fn(&'a mut Exchange) -> BoxFuture<'a, VigilResult<()>> + Send + Sync + 'static,
{
    FnHandler { func }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Request;
    use http::Method;
    use serde_json::{json, Value};

    struct Record(&'static str);

    impl Middleware for Record {
        fn name(&self) -> &'static str {
            self.0
        }

        fn handle<'a>(&'a self, ex: &'a mut Exchange, next: Next<'a>) -> BoxFuture<'a, VigilResult<()>> {
            Box::pin(async move {
                let seen = ex
                    .locals
                    .entry("seen")
                    .or_insert_with(|| Value::Array(Vec::new()));
                if let Value::Array(items) = seen {
                    items.push(json!(self.0));
                }
                next.run(ex).await
            })
        }
    }

    fn exchange() -> Exchange {
        Exchange::new(Request::new(Method::GET, "/"))
    }

    #[tokio::test]
    async fn test_chain_runs_in_order() {
        let chain: Vec<Arc<dyn Middleware>> = vec![
            Arc::new(Record("a")),
            Arc::new(Record("b")),
            Arc::new(Record("c")),
        ];
        let mut ex = exchange();
        Next::new(&chain).run(&mut ex).await.unwrap();
        assert_eq!(ex.locals["seen"], json!(["a", "b", "c"]));
    }

    #[tokio::test]
    async fn test_handler_stops_the_chain() {
        let chain: Vec<Arc<dyn Middleware>> = vec![
            Arc::new(Record("a")),
            Arc::new(handler(|ex| Box::pin(async move { ex.response.end() }))),
            Arc::new(Record("never")),
        ];
        let mut ex = exchange();
        Next::new(&chain).run(&mut ex).await.unwrap();
        assert_eq!(ex.locals["seen"], json!(["a"]));
        assert!(ex.response.is_sent());
    }

    #[tokio::test]
    async fn test_fn_middleware_short_circuit() {
        let chain: Vec<Arc<dyn Middleware>> = vec![
            Arc::new(FnMiddleware::new("deny", |ex, _next| {
                Box::pin(async move { ex.response.send(json!("denied")) })
            })),
            Arc::new(Record("after")),
        ];
        let mut ex = exchange();
        Next::new(&chain).run(&mut ex).await.unwrap();
        assert!(!ex.locals.contains_key("seen"));
    }

    #[tokio::test]
    async fn test_errors_propagate() {
        let chain: Vec<Arc<dyn Middleware>> = vec![
            Arc::new(Record("a")),
            Arc::new(handler(|_ex| {
                Box::pin(async move { Err::<(), _>(crate::VigilError::internal("boom")) })
            })),
        ];
        let mut ex = exchange();
        let err = Next::new(&chain).run(&mut ex).await.unwrap_err();
        assert_eq!(err.to_string(), "Internal error: boom");
    }

    #[tokio::test]
    async fn test_empty_chain_is_ok() {
        let mut ex = exchange();
        assert!(Next::end().is_end());
        Next::end().run(&mut ex).await.unwrap();
        assert!(!ex.response.is_sent());
    }

    #[test]
    fn test_default_contract_is_none() {
        assert!(Record("x").contract().is_none());
    }
}
