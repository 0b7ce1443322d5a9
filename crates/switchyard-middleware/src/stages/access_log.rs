//! Access log middleware.
//!
//! Emits one structured `tracing` event per request as it enters the
//! chain. The dispatcher logs the outcome separately once the handler has
//! run, so the two events share the `request_id` field for correlation.
//!
//! # Log Fields
//!
//! - `request_id` - Request identifier from the [`Context`]
//! - `method` - HTTP method
//! - `path` - Request path, without the query string
//! - `route_matched` - Whether a route matched before middleware ran
//! - `user_agent` - The `User-Agent` header, if sent

use http::header::USER_AGENT;
use switchyard_core::{Context, Exchange};

use crate::middleware::Middleware;

/// Context key set once the request has been logged.
///
/// A chain that registers the middleware twice still logs once.
pub const ACCESS_LOGGED_KEY: &str = "switchyard.access_logged";

/// Middleware that logs each incoming request.
#[derive(Debug, Clone, Default)]
pub struct AccessLogMiddleware {
    include_query: bool,
}

impl AccessLogMiddleware {
    /// Creates a middleware that logs the path only.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also log the query string.
    #[must_use]
    pub fn with_query(mut self) -> Self {
        self.include_query = true;
        self
    }
}

impl Middleware for AccessLogMiddleware {
    fn name(&self) -> &'static str {
        "access_log"
    }

    fn process(&self, exchange: &mut Exchange, ctx: &mut Context) -> anyhow::Result<()> {
        if ctx.contains_key(ACCESS_LOGGED_KEY) {
            return Ok(());
        }

        let user_agent = exchange
            .headers()
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        let query = if self.include_query {
            exchange.uri().query().unwrap_or("")
        } else {
            ""
        };

        tracing::info!(
            request_id = %ctx.request_id(),
            method = %exchange.method(),
            path = exchange.path(),
            query,
            route_matched = ctx.route_matched(),
            user_agent,
            "request received"
        );

        ctx.set(ACCESS_LOGGED_KEY, true);
        Ok(())
    }
}
