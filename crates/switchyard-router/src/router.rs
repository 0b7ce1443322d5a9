//! Method-keyed set of route trees.
//!
//! This module provides [`Router`], which owns one [`Tree`] per HTTP method
//! plus a method-independent tree consulted as a fallback.

use std::collections::HashMap;

use http::Method;

use crate::error::RouteError;
use crate::tree::Tree;
use crate::RouteMatch;

/// Route trees keyed by HTTP method.
///
/// Trees are created lazily the first time a method is registered. Methods
/// are compared exactly, so extension methods such as `PURGE` get their own
/// tree like any standard verb.
///
/// # Example
///
/// ```rust
/// use http::Method;
/// use switchyard_router::Router;
///
/// let mut router = Router::new();
/// router.add(Method::GET, "/items/:id", "show").unwrap();
/// router.add(Method::DELETE, "/items/:id", "remove").unwrap();
///
/// let m = router.lookup(&Method::GET, "/items/7").unwrap();
/// assert_eq!(*m.handler, "show");
/// assert_eq!(m.params.get("id"), "7");
///
/// assert!(router.lookup(&Method::POST, "/items/7").is_none());
/// ```
///
/// # Route Priority
///
/// Within one tree:
///
/// 1. **Static segments** (e.g., `/users/new`)
/// 2. **Parameter segments** (e.g., `/users/:id`)
/// 3. **Catch-all segments** (e.g., `/files/*path`)
///
/// Across trees, the request method's own tree is searched before the
/// any-method tree.
#[derive(Clone)]
pub struct Router<H> {
    trees: HashMap<Method, Tree<H>>,
    any: Tree<H>,
}

impl<H> Default for Router<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> Router<H> {
    /// Creates a router with no trees.
    #[must_use]
    pub fn new() -> Self {
        Self {
            trees: HashMap::new(),
            any: Tree::new(),
        }
    }

    /// Registers `handler` for `pattern` under `method`.
    ///
    /// Returns the handler that was previously registered for the same
    /// method and pattern, if any.
    ///
    /// # Errors
    ///
    /// Returns a [`RouteError`] if the pattern is rejected by the tree.
    pub fn add(&mut self, method: Method, pattern: &str, handler: H) -> Result<Option<H>, RouteError> {
        self.trees
            .entry(method)
            .or_default()
            .add_route(pattern, handler)
    }

    /// Registers `handler` for `pattern` regardless of method.
    ///
    /// # Errors
    ///
    /// Returns a [`RouteError`] if the pattern is rejected by the tree.
    pub fn add_any(&mut self, pattern: &str, handler: H) -> Result<Option<H>, RouteError> {
        self.any.add_route(pattern, handler)
    }

    /// Returns the tree for `method`, if any route was registered under it.
    #[must_use]
    pub fn tree(&self, method: &Method) -> Option<&Tree<H>> {
        self.trees.get(method)
    }

    /// The method-independent tree.
    #[must_use]
    pub fn any_tree(&self) -> &Tree<H> {
        &self.any
    }

    /// Resolves `method` and `path` to a handler.
    ///
    /// The method's own tree wins; the any-method tree is only searched when
    /// that tree is missing or has no match for the path.
    #[must_use]
    pub fn lookup(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, H>> {
        self.trees
            .get(method)
            .and_then(|tree| tree.get_value(path))
            .or_else(|| self.any.get_value(path))
    }

    /// Methods that have a tree, sorted by name.
    #[must_use]
    pub fn methods(&self) -> Vec<&Method> {
        let mut methods: Vec<_> = self.trees.keys().collect();
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods
    }

    /// Total number of registered (method, pattern) pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.trees.values().map(Tree::len).sum::<usize>() + self.any.len()
    }

    /// Returns true if no route is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<H> std::fmt::Debug for Router<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("methods", &self.methods())
            .field("any", &self.any)
            .field("len", &self.len())
            .finish()
    }
}
