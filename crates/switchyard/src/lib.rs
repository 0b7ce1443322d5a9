//! # Switchyard
//!
//! A small HTTP request router: per-method route trees with named
//! parameters and catch-alls, an ordered middleware chain, and a Hyper
//! transport with graceful shutdown.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use switchyard::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut app = Dispatcher::new();
//!     app.use_middleware(RequestIdMiddleware::new())
//!         .get("/users/:id", |ex: &mut Exchange, ctx: &mut Context| {
//!             ex.write(format!("user {}", ctx.param("id")));
//!         });
//!
//!     app.listen(8080).await?.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Routes
//!
//! | Pattern | Matches | Parameters |
//! |---------|---------|------------|
//! | `/users` | `/users`, `/users/` | none |
//! | `/users/:id` | `/users/42` | `id = "42"` |
//! | `/static/*path` | `/static/css/site.css` | `path = "css/site.css"` |
//!
//! At each position a static segment beats a parameter, which beats a
//! catch-all.
//!
//! ## Request Flow
//!
//! ```text
//! Request → Context → route lookup → middleware (in order) → handler | 404
//! ```
//!
//! A middleware error stops the request with a 500 carrying its message.
//!
//! ## Crates
//!
//! - [`router`]: route trees and parameter lists
//! - [`core`]: exchange, context and handler trait
//! - [`middleware`]: middleware trait, chain and stock stages
//! - [`server`]: dispatcher, transport and shutdown
//! - [`telemetry`]: logging and metrics setup
//! - [`config`]: layered configuration

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use switchyard_config as config;
pub use switchyard_core as core;
pub use switchyard_middleware as middleware;
pub use switchyard_router as router;
pub use switchyard_server as server;
pub use switchyard_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// ```rust
/// use switchyard::prelude::*;
///
/// let mut app = Dispatcher::new();
/// app.get("/", |ex: &mut Exchange, _ctx: &mut Context| {
///     ex.write("hello");
/// });
/// ```
pub mod prelude {
    pub use switchyard_config::{ConfigError, ConfigLoader, SwitchyardConfig};
    pub use switchyard_core::{context_free, Context, Exchange, Handler, Params, RequestId};
    pub use switchyard_middleware::stages::{AccessLogMiddleware, RequestIdMiddleware};
    pub use switchyard_middleware::{FnMiddleware, Middleware};
    pub use switchyard_router::RouteError;
    pub use switchyard_server::{
        DispatchOutcome, Dispatcher, Server, ServerConfig, ServerError, ShutdownSignal,
    };
    pub use switchyard_telemetry::{init_telemetry, TelemetryConfig};
}
