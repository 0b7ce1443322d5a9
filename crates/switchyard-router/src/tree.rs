//! A single method's route tree.

use crate::error::RouteError;
use crate::node::Node;
use crate::RouteMatch;

/// The routes registered for one HTTP method.
///
/// Built at startup and read-only afterwards. Lookups borrow the tree
/// immutably, so a built tree can be shared across threads behind an `Arc`
/// without locking.
///
/// # Example
///
/// ```rust
/// use switchyard_router::Tree;
///
/// let mut tree = Tree::new();
/// tree.add_route("/users/new", "form").unwrap();
/// tree.add_route("/users/:id", "show").unwrap();
///
/// let m = tree.get_value("/users/42").unwrap();
/// assert_eq!(*m.handler, "show");
/// assert_eq!(m.params.get("id"), "42");
///
/// let m = tree.get_value("/users/new").unwrap();
/// assert_eq!(*m.handler, "form");
/// ```
#[derive(Clone)]
pub struct Tree<H> {
    root: Node<H>,
    len: usize,
}

impl<H> Default for Tree<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> Tree<H> {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            len: 0,
        }
    }

    /// Registers `handler` for `pattern`.
    ///
    /// Registering a pattern that already has a handler replaces it and
    /// returns the previous one. The tree is not modified when an error is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns a [`RouteError`] when the pattern is malformed or its slot
    /// names collide with a pattern registered earlier.
    pub fn add_route(&mut self, pattern: &str, handler: H) -> Result<Option<H>, RouteError> {
        let replaced = self.root.insert(pattern, handler)?;
        if replaced.is_none() {
            self.len += 1;
        }
        Ok(replaced)
    }

    /// Resolves `path` to its handler and parameters.
    #[must_use]
    pub fn get_value(&self, path: &str) -> Option<RouteMatch<'_, H>> {
        self.root
            .lookup(path)
            .map(|(handler, params)| RouteMatch::new(handler, params))
    }

    /// Number of distinct registered patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Registered patterns, static children first, in sorted order per level.
    #[must_use]
    pub fn patterns(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.len);
        self.root.collect_patterns("", &mut out);
        out
    }

    /// The root node, for inspection.
    #[must_use]
    pub fn root(&self) -> &Node<H> {
        &self.root
    }
}

impl<H> std::fmt::Debug for Tree<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tree")
            .field("len", &self.len)
            .field("patterns", &self.patterns())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tree() {
        let tree: Tree<u32> = Tree::new();
        assert!(tree.is_empty());
        assert!(tree.get_value("/").is_none());
        assert!(tree.get_value("/anything").is_none());
    }

    #[test]
    fn test_len_counts_distinct_patterns() {
        let mut tree = Tree::new();
        tree.add_route("/a", 1).unwrap();
        tree.add_route("/b", 2).unwrap();
        tree.add_route("/a", 3).unwrap();

        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_reregistration_overwrites() {
        let mut tree = Tree::new();
        assert_eq!(tree.add_route("/ping", 1).unwrap(), None);
        assert_eq!(tree.add_route("/ping", 2).unwrap(), Some(1));

        assert_eq!(tree.get_value("/ping").map(|m| *m.handler), Some(2));
    }

    #[test]
    fn test_trailing_slash_is_same_route() {
        let mut tree = Tree::new();
        tree.add_route("/users/", 1).unwrap();

        assert_eq!(tree.get_value("/users").map(|m| *m.handler), Some(1));
        assert_eq!(tree.get_value("/users/").map(|m| *m.handler), Some(1));
        assert_eq!(tree.add_route("/users", 2).unwrap(), Some(1));
    }

    #[test]
    fn test_failed_registration_leaves_tree_untouched() {
        let mut tree = Tree::new();
        tree.add_route("/users/:id", 1).unwrap();

        assert!(tree.add_route("users", 2).is_err());
        assert!(tree.add_route("/users/:name", 3).is_err());
        assert!(tree.add_route("/files/*path/x", 4).is_err());

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.patterns(), vec!["/users/:id"]);
        assert!(tree.get_value("/files/a/x").is_none());
    }

    #[test]
    fn test_patterns_listing() {
        let mut tree = Tree::new();
        tree.add_route("/users/:id", 1).unwrap();
        tree.add_route("/users", 2).unwrap();
        tree.add_route("/health", 3).unwrap();

        assert_eq!(tree.patterns(), vec!["/health", "/users", "/users/:id"]);
    }

    #[test]
    fn test_debug_does_not_require_debug_handler() {
        struct Opaque;

        let mut tree = Tree::new();
        tree.add_route("/x", Opaque).unwrap();

        let rendered = format!("{tree:?}");
        assert!(rendered.contains("/x"));
    }
}
