//! Core middleware trait and types.
//!
//! Middleware runs before the handler, in registration order, on every
//! request whether or not a route matched. Returning an error stops the
//! chain: later middleware and the handler are skipped for that request.
//!
//! # Example
//!
//! ```
//! use switchyard_core::{Context, Exchange};
//! use switchyard_middleware::Middleware;
//!
//! struct RequireJson;
//!
//! impl Middleware for RequireJson {
//!     fn name(&self) -> &'static str {
//!         "require_json"
//!     }
//!
//!     fn process(&self, exchange: &mut Exchange, _ctx: &mut Context) -> anyhow::Result<()> {
//!         match exchange.headers().get(http::header::CONTENT_TYPE) {
//!             Some(v) if v == "application/json" => Ok(()),
//!             _ if exchange.body().is_empty() => Ok(()),
//!             _ => anyhow::bail!("expected a JSON body"),
//!         }
//!     }
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use switchyard_core::{Context, Exchange};

/// The core middleware trait.
///
/// # Invariants
///
/// - Middleware MUST NOT assume a route matched; `ctx.params()` may be empty
/// - An error aborts the request with a 500 carrying the error's message
pub trait Middleware: Send + Sync + 'static {
    /// Returns the name of this middleware stage.
    ///
    /// This name is used for logging and in abort reports.
    fn name(&self) -> &'static str;

    /// Inspects or modifies the exchange and context.
    ///
    /// # Errors
    ///
    /// Any error aborts the remaining chain and the handler.
    fn process(&self, exchange: &mut Exchange, ctx: &mut Context) -> anyhow::Result<()>;
}

impl<F> Middleware for F
where
    F: Fn(&mut Exchange, &mut Context) -> anyhow::Result<()> + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        "anonymous"
    }

    fn process(&self, exchange: &mut Exchange, ctx: &mut Context) -> anyhow::Result<()> {
        self(exchange, ctx)
    }
}

/// A type-erased middleware that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// A named middleware created from a function.
///
/// Plain closures are middleware too, but they all report the name
/// `anonymous`; wrap them in `FnMiddleware` to give them a name in logs.
///
/// # Example
///
/// ```
/// use switchyard_middleware::{FnMiddleware, Middleware};
///
/// let deny_all = FnMiddleware::new("deny_all", |_ex, _ctx| {
///     anyhow::bail!("service unavailable")
/// });
/// assert_eq!(deny_all.name(), "deny_all");
/// ```
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F>
where
    F: Fn(&mut Exchange, &mut Context) -> anyhow::Result<()> + Send + Sync + 'static,
{
    /// Creates a new function-based middleware.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(&mut Exchange, &mut Context) -> anyhow::Result<()> + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process(&self, exchange: &mut Exchange, ctx: &mut Context) -> anyhow::Result<()> {
        (self.func)(exchange, ctx)
    }
}

impl<F> fmt::Debug for FnMiddleware<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMiddleware")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
