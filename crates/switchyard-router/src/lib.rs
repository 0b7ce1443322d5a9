//! Per-method radix tree route matching for Switchyard.
//!
//! This crate resolves a request method and path to a registered handler and
//! the path parameters captured on the way. Each method gets its own tree,
//! and lookups walk one tree level per path segment, so matching cost follows
//! path depth rather than the number of routes.
//!
//! # Pattern Syntax
//!
//! - **Static segments**: `/users/new`
//! - **Named parameters**: `/users/:id` captures one segment as `id`
//! - **Catch-all**: `/files/*path` captures every remaining segment as `path`
//!
//! A marker only counts at the start of a segment; `/v1:beta` is plain text.
//! Empty segments are ignored, so `/users/` and `/users` are the same route.
//!
//! # Example
//!
//! ```rust
//! use http::Method;
//! use switchyard_router::Router;
//!
//! let mut router = Router::new();
//! router.add(Method::GET, "/users", "list").unwrap();
//! router.add(Method::GET, "/users/:id", "show").unwrap();
//! router.add(Method::GET, "/files/*path", "serve").unwrap();
//!
//! let m = router.lookup(&Method::GET, "/files/css/site.css").unwrap();
//! assert_eq!(*m.handler, "serve");
//! assert_eq!(m.params.get("path"), "css/site.css");
//! ```
//!
//! # Architecture
//!
//! ```text
//!                    (root)
//!                      │
//!              ┌───────┴───────┐
//!              │               │
//!            "users"        "files"
//!              │               │
//!        ┌─────┴─────┐      "*path"
//!        │           │       [serve]
//!     [list]      ":id"
//!                 [show]
//! ```

mod error;
mod node;
mod params;
mod router;
mod tree;

pub use error::RouteError;
pub use node::{Node, SegmentKind, CATCH_ALL_MARKER, PARAM_MARKER};
pub use params::{Param, Params};
pub use router::Router;
pub use tree::Tree;

/// A matched route: the registered handler and the captured parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a, H> {
    /// The handler registered for the matched pattern.
    pub handler: &'a H,
    /// Parameters captured from the path, in pattern order.
    pub params: Params,
}

impl<'a, H> RouteMatch<'a, H> {
    /// Creates a new route match.
    #[must_use]
    pub fn new(handler: &'a H, params: Params) -> Self {
        Self { handler, params }
    }
}
