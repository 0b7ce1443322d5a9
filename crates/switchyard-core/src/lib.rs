//! # Switchyard Core
//!
//! Types shared by every layer of Switchyard:
//!
//! - [`Exchange`] - An inbound request paired with the response being written
//! - [`Context`] - Per-request value bag plus the matched path parameters
//! - [`RequestId`] - UUID v7 request identifier
//! - [`Handler`] - The handler trait, implemented by plain closures

#![doc(html_root_url = "https://docs.rs/switchyard-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod exchange;
mod handler;

pub use context::{Context, RequestId};
pub use exchange::Exchange;
pub use handler::{context_free, BoxedHandler, ContextFree, Handler};
pub use switchyard_router::{Param, Params};
