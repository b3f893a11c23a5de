//! Composition of request validation and response interception into chain
//! units.
//!
//! Two forms are offered:
//!
//! - [`ValidationMiddleware::new`] builds a unit that validates and then
//!   continues down the chain. It refuses typed (status-keyed) contracts.
//! - [`ValidationMiddleware::attach`] binds a contract to the handler that
//!   will produce its responses. It accepts every contract and is the only
//!   form for typed ones.
//!
//! In both forms the request is validated first. A rejected request is
//! answered with a 400 and nothing downstream runs. Otherwise the response
//! interceptor is installed (when the contract declares responses) before
//! control moves on.
//!
//! # Example
//!
//! ```
//! use vigil_core::{handler, App, Chain, SchemaContract};
//! use vigil_middleware::{ContractExt, ValidationMiddleware};
//! use vigil_schema::Schema;
//! use serde_json::json;
//!
//! let simple = SchemaContract::builder()
//!     .body(Schema::object([("name", Schema::string())]))
//!     .build()
//!     .unwrap();
//!
//! let typed = SchemaContract::builder()
//!     .status(200, Schema::object([("message", Schema::string())]))
//!     .status(404, Schema::object([("error", Schema::string())]))
//!     .build()
//!     .unwrap();
//!
//! let mut app = App::new();
//! app.post(
//!     "/users",
//!     Chain::new()
//!         .then(ValidationMiddleware::new(simple).unwrap())
//!         .then(handler(|ex| Box::pin(async move { ex.response.json(json!({})) }))),
//! )
//! .get(
//!     "/hello",
//!     typed.handler(handler(|ex| {
//!         Box::pin(async move { ex.response.json(json!({"message": "hi"})) })
//!     })),
//! );
//! assert_eq!(app.routes().len(), 2);
//! ```

use crate::request::{reject, RequestOutcome, RequestValidator};
use crate::response::ValidatedResponse;
use std::marker::PhantomData;
use std::sync::Arc;
use vigil_config::ValidationConfig;
use vigil_core::middleware::{BoxFuture, Middleware, Next};
use vigil_core::{
    ContractBuilder, Exchange, ReplyScope, SchemaContract, StatusReply, VigilError, VigilResult,
};

/// Shared state of both composition forms.
#[derive(Debug, Clone)]
struct Guard {
    contract: Arc<SchemaContract>,
    validator: RequestValidator,
    config: ValidationConfig,
}

impl Guard {
    fn new(contract: Arc<SchemaContract>) -> Self {
        Self {
            validator: RequestValidator::new(Arc::clone(&contract)),
            contract,
            config: ValidationConfig::default(),
        }
    }

    /// Validates the request and installs the interceptor.
    ///
    /// Returns `Ok(false)` if the request was rejected and the 400 written.
    fn admit(&self, ex: &mut Exchange) -> VigilResult<bool> {
        if self.config.validate_requests {
            if let RequestOutcome::Rejected(body) = self.validator.validate(ex)? {
                if self.config.log_rejections {
                    tracing::debug!(
                        request_id = %ex.request_id(),
                        http.route = ex.route().unwrap_or_default(),
                        issue_count = body.errors.len(),
                        "request failed validation"
                    );
                }
                reject(ex, &body)?;
                return Ok(false);
            }
        }

        if self.config.validate_responses && self.contract.responses().is_some() {
            let contract = Arc::clone(&self.contract);
            let request_id = ex.request_id();
            ex.wrap_response(move |inner| Box::new(ValidatedResponse::new(inner, contract, request_id)));
        }
        Ok(true)
    }
}

/// The direct form: validates, then continues down the chain.
#[derive(Debug, Clone)]
pub struct ValidationMiddleware {
    guard: Guard,
}

impl ValidationMiddleware {
    /// Creates the direct form.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the contract declares status-keyed
    /// responses; those must be bound to their handler with
    /// [`attach`](Self::attach).
    pub fn new(contract: impl Into<Arc<SchemaContract>>) -> VigilResult<Self> {
        let contract = contract.into();
        if contract.is_typed() {
            return Err(VigilError::configuration(
                "status-keyed response schemas require a handler; use ValidationMiddleware::attach \
                 or SchemaContract::handler instead of ValidationMiddleware::new",
            ));
        }
        Ok(Self {
            guard: Guard::new(contract),
        })
    }

    /// Binds a contract to the handler that produces its responses.
    pub fn attach<M: Middleware>(contract: impl Into<Arc<SchemaContract>>, handler: M) -> ValidatedHandler {
        ValidatedHandler {
            guard: Guard::new(contract.into()),
            handler: Arc::new(handler),
        }
    }

    /// Binds a handler that answers with values of one reply type.
    ///
    /// The contract's response schemas are taken from `R::schemas()` and
    /// nothing else, and the handler cannot write a body itself: it returns
    /// an `R`, which is emitted under its own status through the response
    /// interceptor. A reply whose body drifts from its declared schema is
    /// caught there as a response validation fault.
    ///
    /// ```
    /// use http::StatusCode;
    /// use serde_json::{json, Value};
    /// use vigil_core::{SchemaContract, StatusReply, VigilResult};
    /// use vigil_middleware::ValidationMiddleware;
    /// use vigil_schema::Schema;
    ///
    /// enum Pong {
    ///     Ok,
    /// }
    ///
    /// impl StatusReply for Pong {
    ///     fn schemas() -> Vec<(StatusCode, Schema)> {
    ///         vec![(StatusCode::OK, Schema::object([("pong", Schema::boolean())]))]
    ///     }
    ///
    ///     fn status(&self) -> StatusCode {
    ///         StatusCode::OK
    ///     }
    ///
    ///     fn into_body(self) -> VigilResult<Value> {
    ///         Ok(json!({"pong": true}))
    ///     }
    /// }
    ///
    /// let ping = ValidationMiddleware::replying::<Pong, _>(SchemaContract::builder(), |_scope| {
    ///     Box::pin(async move { Ok(Pong::Ok) })
    /// })
    /// .unwrap();
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `builder` already declares response
    /// schemas, if `R` declares no statuses, or if the contract is invalid.
    pub fn replying<R, F>(builder: ContractBuilder, func: F) -> VigilResult<ReplyHandler<R, F>>
    where
        R: StatusReply + Send + 'static,
        F: for<'a> Fn(ReplyScope<'a>) -> BoxFuture<'a, VigilResult<R>> + Send + Sync + 'static,
    {
        if builder.declares_responses() {
            return Err(VigilError::configuration(
                "reply-typed handlers take their response schemas from the reply type; \
                 remove response() and status() from the contract",
            ));
        }
        if R::schemas().is_empty() {
            return Err(VigilError::configuration(format!(
                "reply type {} declares no statuses",
                std::any::type_name::<R>()
            )));
        }
        let contract = builder.replies::<R>().build()?;
        Ok(ReplyHandler {
            guard: Guard::new(Arc::new(contract)),
            func,
            reply: PhantomData,
        })
    }

    /// Overrides the validation switches.
    #[must_use]
    pub fn with_config(mut self, config: ValidationConfig) -> Self {
        self.guard.config = config;
        self
    }

    /// Wraps the unit for use in a chain.
    #[must_use]
    pub fn into_shared(self) -> Arc<dyn Middleware> {
        Arc::new(self)
    }
}

impl Middleware for ValidationMiddleware {
    fn name(&self) -> &'static str {
        "validation"
    }

    fn handle<'a>(&'a self, ex: &'a mut Exchange, next: Next<'a>) -> BoxFuture<'a, VigilResult<()>> {
        Box::pin(async move {
            if self.guard.admit(ex)? {
                next.run(ex).await
            } else {
                Ok(())
            }
        })
    }

    fn contract(&self) -> Option<&Arc<SchemaContract>> {
        Some(&self.guard.contract)
    }
}

/// The attach form: validates, then runs the bound handler.
///
/// The rest of the chain runs only if the handler itself delegates to it.
#[derive(Clone)]
pub struct ValidatedHandler {
    guard: Guard,
    handler: Arc<dyn Middleware>,
}

impl std::fmt::Debug for ValidatedHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatedHandler")
            .field("guard", &self.guard)
            .field("handler", &self.handler.name())
            .finish()
    }
}

impl ValidatedHandler {
    /// Overrides the validation switches.
    #[must_use]
    pub fn with_config(mut self, config: ValidationConfig) -> Self {
        self.guard.config = config;
        self
    }
}

impl Middleware for ValidatedHandler {
    fn name(&self) -> &'static str {
        "validated_handler"
    }

    fn handle<'a>(&'a self, ex: &'a mut Exchange, next: Next<'a>) -> BoxFuture<'a, VigilResult<()>> {
        Box::pin(async move {
            if self.guard.admit(ex)? {
                self.handler.handle(ex, next).await
            } else {
                Ok(())
            }
        })
    }

    fn contract(&self) -> Option<&Arc<SchemaContract>> {
        Some(&self.guard.contract)
    }
}

/// The reply-typed attach form, built by [`ValidationMiddleware::replying`].
pub struct ReplyHandler<R, F> {
    guard: Guard,
    func: F,
    reply: PhantomData<fn() -> R>,
}

impl<R, F> std::fmt::Debug for ReplyHandler<R, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplyHandler")
            .field("guard", &self.guard)
            .field("reply", &std::any::type_name::<R>())
            .finish_non_exhaustive()
    }
}

impl<R, F> ReplyHandler<R, F>
where
    R: StatusReply + Send + 'static,
    F: for<'a> Fn(ReplyScope<'a>) -> BoxFuture<'a, VigilResult<R>> + Send + Sync + 'static,
{
    /// Overrides the validation switches.
    #[must_use]
    pub fn with_config(mut self, config: ValidationConfig) -> Self {
        self.guard.config = config;
        self
    }

    /// Wraps the unit for use in a chain.
    #[must_use]
    pub fn into_shared(self) -> Arc<dyn Middleware> {
        Arc::new(self)
    }
}

impl<R, F> Middleware for ReplyHandler<R, F>
where
    R: StatusReply + Send + 'static,
    F: for<'a> Fn(ReplyScope<'a>) -> BoxFuture<'a, VigilResult<R>> + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        "reply_handler"
    }

    fn handle<'a>(&'a self, ex: &'a mut Exchange, _next: Next<'a>) -> BoxFuture<'a, VigilResult<()>> {
        Box::pin(async move {
            if !self.guard.admit(ex)? {
                return Ok(());
            }
            let reply = (self.func)(ReplyScope::new(ex)).await?;
            ex.response.reply(reply)
        })
    }

    fn contract(&self) -> Option<&Arc<SchemaContract>> {
        Some(&self.guard.contract)
    }
}

/// Composition shortcuts on contracts.
pub trait ContractExt {
    /// Binds the contract to a handler (the attach form).
    fn handler<M: Middleware>(self, handler: M) -> ValidatedHandler;

    /// Builds the direct form.
    ///
    /// # Errors
    ///
    /// Fails for contracts with status-keyed responses.
    fn middleware(self) -> VigilResult<ValidationMiddleware>;
}

impl ContractExt for SchemaContract {
    fn handler<M: Middleware>(self, handler: M) -> ValidatedHandler {
        ValidationMiddleware::attach(self, handler)
    }

    fn middleware(self) -> VigilResult<ValidationMiddleware> {
        ValidationMiddleware::new(self)
    }
}

impl ContractExt for Arc<SchemaContract> {
    fn handler<M: Middleware>(self, handler: M) -> ValidatedHandler {
        ValidationMiddleware::attach(self, handler)
    }

    fn middleware(self) -> VigilResult<ValidationMiddleware> {
        ValidationMiddleware::new(self)
    }
}
