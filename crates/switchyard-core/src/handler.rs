//! Handler trait for request processing.
//!
//! Handlers are synchronous: they run to completion on the worker that
//! dispatched the request and write their response through the [`Exchange`].

use std::sync::Arc;

use crate::{Context, Exchange};

/// Something that answers a matched request.
///
/// Any `Fn(&mut Exchange, &mut Context)` closure is a handler.
///
/// # Example
///
/// ```
/// use switchyard_core::{BoxedHandler, Context, Exchange};
/// use std::sync::Arc;
///
/// let handler: BoxedHandler = Arc::new(|ex: &mut Exchange, ctx: &mut Context| {
///     ex.write(format!("item {}", ctx.param("id")));
/// });
/// ```
pub trait Handler: Send + Sync + 'static {
    /// Handles one request. Called at most once per request.
    fn call(&self, exchange: &mut Exchange, ctx: &mut Context);
}

impl<F> Handler for F
where
    F: Fn(&mut Exchange, &mut Context) + Send + Sync + 'static,
{
    fn call(&self, exchange: &mut Exchange, ctx: &mut Context) {
        self(exchange, ctx);
    }
}

/// A type-erased, shareable handler as stored in route trees.
pub type BoxedHandler = Arc<dyn Handler>;

/// Adapts a handler that does not use the request context.
///
/// Created with [`context_free`].
#[derive(Debug, Clone)]
pub struct ContextFree<F> {
    inner: F,
}

/// Wraps `f` so it can be registered where a [`Handler`] is expected.
///
/// ```
/// use switchyard_core::{context_free, Handler};
///
/// let health = context_free(|ex: &mut switchyard_core::Exchange| {
///     ex.write("ok");
/// });
/// fn assert_handler<H: Handler>(_: &H) {}
/// assert_handler(&health);
/// ```
pub fn context_free<F>(f: F) -> ContextFree<F>
where
    F: Fn(&mut Exchange) + Send + Sync + 'static,
{
    ContextFree { inner: f }
}

impl<F> Handler for ContextFree<F>
where
    F: Fn(&mut Exchange) + Send + Sync + 'static,
{
    fn call(&self, exchange: &mut Exchange, _ctx: &mut Context) {
        (self.inner)(exchange);
    }
}
