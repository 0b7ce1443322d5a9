//! Dispatcher and HTTP transport for Switchyard.
//!
//! - [`Dispatcher`]: route registration, middleware and the per-request
//!   entry point
//! - [`Server`]: binds a socket and feeds requests to a dispatcher over
//!   HTTP/1
//! - [`ShutdownSignal`]: graceful shutdown coordination
//!
//! # Request Flow
//!
//! ```text
//! accept → read head → collect body → [blocking worker]
//!     Context::new → route lookup → middleware chain → handler | 404
//!     → close body → response
//! ```
//!
//! A failing middleware ends the request with a 500 whose body is the
//! error message. A handler panic ends it with a 500 and leaves every
//! other request untouched.

#![warn(missing_docs)]

mod config;
mod dispatcher;
mod error;
mod server;
mod shutdown;

pub use config::{
    ServerConfig, ServerConfigBuilder, DEFAULT_HTTP_ADDR, DEFAULT_MAX_HEADER_BYTES,
    DEFAULT_READ_TIMEOUT_SECS, DEFAULT_SHUTDOWN_TIMEOUT_SECS, DEFAULT_WRITE_TIMEOUT_SECS,
    MIN_HEADER_BYTES,
};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use error::ServerError;
pub use server::Server;
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};
