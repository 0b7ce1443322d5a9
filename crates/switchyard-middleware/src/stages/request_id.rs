//! Request ID middleware.
//!
//! Assigns every request an ID, stores it in the [`Context`] and echoes it
//! in the `x-request-id` response header so clients can quote it back.
//!
//! ## Request ID Sources
//!
//! 1. **X-Request-ID header**: used when the middleware trusts incoming IDs
//!    and the header holds a valid UUID
//! 2. **Context ID**: the UUID v7 the dispatcher assigned otherwise

use http::header::HeaderValue;
use switchyard_core::{Context, Exchange, RequestId};

use crate::middleware::Middleware;

/// The header name for request ID propagation.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Middleware that propagates or assigns request IDs.
///
/// # Example
///
/// ```
/// use switchyard_middleware::stages::RequestIdMiddleware;
///
/// // Edge-facing: ignore whatever the client sent.
/// let edge = RequestIdMiddleware::new();
///
/// // Internal hop: keep the caller's ID for log correlation.
/// let internal = RequestIdMiddleware::trust_incoming();
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestIdMiddleware {
    trust_incoming: bool,
}

impl RequestIdMiddleware {
    /// Creates a middleware that always keeps the dispatcher-assigned ID.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a middleware that adopts a valid incoming `x-request-id`.
    #[must_use]
    pub fn trust_incoming() -> Self {
        Self {
            trust_incoming: true,
        }
    }

    fn incoming_id(&self, exchange: &Exchange) -> Option<RequestId> {
        if !self.trust_incoming {
            return None;
        }

        exchange
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|s| s.parse().ok())
    }
}

impl Middleware for RequestIdMiddleware {
    fn name(&self) -> &'static str {
        "request_id"
    }

    fn process(&self, exchange: &mut Exchange, ctx: &mut Context) -> anyhow::Result<()> {
        if let Some(id) = self.incoming_id(exchange) {
            ctx.set_request_id(id);
        }

        let value = HeaderValue::from_str(&ctx.request_id().to_string())?;
        exchange
            .response_headers_mut()
            .insert(REQUEST_ID_HEADER, value);
        Ok(())
    }
}
