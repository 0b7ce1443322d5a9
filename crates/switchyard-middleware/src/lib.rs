//! # Switchyard Middleware
//!
//! Ordered, per-dispatcher middleware for Switchyard.
//!
//! Middleware runs in registration order before the handler, on every
//! request, matched or not:
//!
//! ```text
//! Request → mw[0] → mw[1] → ... → mw[n] → Handler | 404
//!              │
//!              └─ Err(e) → 500 with e's message, nothing further runs
//! ```
//!
//! ## Example
//!
//! ```
//! use switchyard_middleware::stages::{AccessLogMiddleware, RequestIdMiddleware};
//! use switchyard_middleware::MiddlewareChain;
//!
//! let mut chain = MiddlewareChain::new();
//! chain.push(RequestIdMiddleware::new());
//! chain.push(AccessLogMiddleware::new());
//! assert_eq!(chain.names(), vec!["request_id", "access_log"]);
//! ```

#![doc(html_root_url = "https://docs.rs/switchyard-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod chain;
mod middleware;
pub mod stages;

pub use chain::{ChainAbort, MiddlewareChain};
pub use middleware::{BoxedMiddleware, FnMiddleware, Middleware};
