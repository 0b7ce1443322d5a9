//! Ordered middleware chain.
//!
//! A [`MiddlewareChain`] is built during startup and then shared read-only
//! by every request. Each dispatcher owns its own chain.

use std::fmt;
use std::sync::Arc;

use switchyard_core::{Context, Exchange};

use crate::middleware::{BoxedMiddleware, Middleware};

/// Why a chain stopped before reaching the handler.
#[derive(Debug)]
pub struct ChainAbort {
    /// Name of the middleware that failed.
    pub stage: &'static str,
    /// Position of that middleware in the chain.
    pub index: usize,
    /// The error it returned.
    pub error: anyhow::Error,
}

impl fmt::Display for ChainAbort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

/// Middleware in registration order.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use switchyard_core::{Context, Exchange};
/// use switchyard_middleware::{FnMiddleware, MiddlewareChain};
///
/// let mut chain = MiddlewareChain::new();
/// chain.push(FnMiddleware::new("tag", |_ex, ctx| {
///     ctx.set("tagged", true);
///     Ok(())
/// }));
///
/// let mut ex = Exchange::new(http::Request::get("/").body(Bytes::new()).unwrap());
/// let mut ctx = Context::new();
/// chain.run(&mut ex, &mut ctx).unwrap();
/// assert_eq!(ctx.get::<bool>("tagged"), Some(&true));
/// ```
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    stages: Vec<BoxedMiddleware>,
}

impl MiddlewareChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a middleware to the end of the chain.
    pub fn push<M: Middleware>(&mut self, middleware: M) {
        self.stages.push(Arc::new(middleware));
    }

    /// Appends an already shared middleware.
    pub fn push_boxed(&mut self, middleware: BoxedMiddleware) {
        self.stages.push(middleware);
    }

    /// Number of middleware in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if the chain is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Names of the middleware, in order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|m| m.name()).collect()
    }

    /// Runs every middleware in order, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns a [`ChainAbort`] naming the middleware that failed. Nothing
    /// after it has run.
    pub fn run(&self, exchange: &mut Exchange, ctx: &mut Context) -> Result<(), ChainAbort> {
        for (index, middleware) in self.stages.iter().enumerate() {
            if let Err(error) = middleware.process(exchange, ctx) {
                return Err(ChainAbort {
                    stage: middleware.name(),
                    index,
                    error,
                });
            }
        }
        Ok(())
    }
}

impl fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("stages", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FnMiddleware;
    use bytes::Bytes;
    use http::Request;

    fn exchange() -> Exchange {
        Exchange::new(Request::get("/").body(Bytes::new()).unwrap())
    }

    fn recorder(
        name: &'static str,
    ) -> FnMiddleware<impl Fn(&mut Exchange, &mut Context) -> anyhow::Result<()> + Send + Sync + 'static>
    {
        FnMiddleware::new(name, move |_ex, ctx| {
            if ctx.get::<Vec<&'static str>>("order").is_none() {
                ctx.set("order", Vec::<&'static str>::new());
            }
            if let Some(order) = ctx.get_mut::<Vec<&'static str>>("order") {
                order.push(name);
            }
            Ok(())
        })
    }

    #[test]
    fn test_runs_in_registration_order() {
        let mut chain = MiddlewareChain::new();
        chain.push(recorder("first"));
        chain.push(recorder("second"));
        chain.push(recorder("third"));

        let mut ctx = Context::new();
        chain.run(&mut exchange(), &mut ctx).unwrap();

        assert_eq!(
            ctx.get::<Vec<&'static str>>("order"),
            Some(&vec!["first", "second", "third"])
        );
        assert_eq!(chain.names(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_failure_stops_chain() {
        let mut chain = MiddlewareChain::new();
        chain.push(recorder("first"));
        chain.push(FnMiddleware::new("broken", |_ex, _ctx| {
            anyhow::bail!("database unavailable")
        }));
        chain.push(recorder("never"));

        let mut ctx = Context::new();
        let abort = chain.run(&mut exchange(), &mut ctx).unwrap_err();

        assert_eq!(abort.stage, "broken");
        assert_eq!(abort.index, 1);
        assert_eq!(abort.to_string(), "database unavailable");
        assert_eq!(ctx.get::<Vec<&'static str>>("order"), Some(&vec!["first"]));
    }

    #[test]
    fn test_empty_chain_succeeds() {
        let chain = MiddlewareChain::new();
        assert!(chain.is_empty());
        assert!(chain.run(&mut exchange(), &mut Context::new()).is_ok());
    }
}
