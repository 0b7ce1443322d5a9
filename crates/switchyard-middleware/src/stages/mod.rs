//! Stock middleware stages.
//!
//! | Stage                   | Purpose                                    |
//! |-------------------------|--------------------------------------------|
//! | [`RequestIdMiddleware`] | Propagate or assign `x-request-id`         |
//! | [`AccessLogMiddleware`] | One structured log event per request       |

pub mod access_log;
pub mod request_id;

pub use access_log::AccessLogMiddleware;
pub use request_id::{RequestIdMiddleware, REQUEST_ID_HEADER};
