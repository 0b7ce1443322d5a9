//! Per-request context.
//!
//! A [`Context`] is created fresh for every request by the dispatcher. It
//! carries the request ID, the parameters captured by the route match, and
//! a string-keyed value bag middleware and handlers use to pass state along.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use switchyard_router::Params;
use uuid::Uuid;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, so IDs sort by arrival in logs.
///
/// # Example
///
/// ```
/// use switchyard_core::RequestId;
///
/// let id = RequestId::new();
/// let parsed: RequestId = id.to_string().parse().unwrap();
/// assert_eq!(id, parsed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequestId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Per-request state shared by the middleware chain and the handler.
///
/// The value bag is ready for use as soon as the context exists. Keys are
/// unique and the last [`Context::set`] for a key wins.
///
/// # Example
///
/// ```
/// use switchyard_core::Context;
///
/// let mut ctx = Context::new();
/// ctx.set("user", String::from("alice"));
/// ctx.set("retries", 0u32);
///
/// assert_eq!(ctx.get::<String>("user").map(String::as_str), Some("alice"));
/// assert_eq!(ctx.get::<u32>("retries"), Some(&0));
/// assert_eq!(ctx.get::<u32>("missing"), None);
/// ```
pub struct Context {
    request_id: RequestId,
    params: Params,
    route_matched: bool,
    values: HashMap<String, Box<dyn Any + Send + Sync>>,
    started_at: Instant,
}

impl Context {
    /// Creates an empty context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates an empty context with the given request ID.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            params: Params::new(),
            route_matched: false,
            values: HashMap::new(),
            started_at: Instant::now(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Replaces the request ID, e.g. with one propagated by the caller.
    pub fn set_request_id(&mut self, request_id: RequestId) {
        self.request_id = request_id;
    }

    /// Parameters captured by the route match.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Attaches the parameters of a route match and marks it matched.
    pub fn set_params(&mut self, params: Params) {
        self.params = params;
        self.route_matched = true;
    }

    /// Returns true once the dispatcher has attached a route match.
    ///
    /// A matched static route has no parameters, so this is the way to tell
    /// it apart from a miss.
    #[must_use]
    pub const fn route_matched(&self) -> bool {
        self.route_matched
    }

    /// Shorthand for `self.params().get(key)`.
    #[must_use]
    pub fn param(&self, key: &str) -> &str {
        self.params.get(key)
    }

    /// Returns the value stored under `key`.
    ///
    /// `None` means the key was never set, or holds a value of another
    /// type. A stored zero or empty value is still `Some`.
    #[must_use]
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<&T> {
        self.values.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    /// Mutable variant of [`Context::get`].
    pub fn get_mut<T: Any + Send + Sync>(&mut self, key: &str) -> Option<&mut T> {
        self.values.get_mut(key).and_then(|v| v.downcast_mut::<T>())
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.values.insert(key.into(), Box::new(value));
    }

    /// Returns true if anything is stored under `key`, whatever its type.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Removes `key`, returning whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    /// Number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no value is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// When the context was created.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Time since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.values.keys().collect();
        keys.sort();
        f.debug_struct("Context")
            .field("request_id", &self.request_id)
            .field("params", &self.params)
            .field("route_matched", &self.route_matched)
            .field("keys", &keys)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_uniqueness() {
        let id1 = RequestId::new();
        let id2 = RequestId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_request_id_parse_rejects_garbage() {
        assert!("not-a-uuid".parse::<RequestId>().is_err());
    }

    #[test]
    fn test_absent_key_differs_from_zero_value() {
        let mut ctx = Context::new();
        assert_eq!(ctx.get::<i64>("count"), None);

        ctx.set("count", 0i64);
        assert_eq!(ctx.get::<i64>("count"), Some(&0));
        assert!(ctx.contains_key("count"));
    }

    #[test]
    fn test_set_overwrites() {
        let mut ctx = Context::new();
        ctx.set("user", "alice");
        ctx.set("user", "bob");

        assert_eq!(ctx.get::<&str>("user"), Some(&"bob"));
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn test_overwrite_may_change_type() {
        let mut ctx = Context::new();
        ctx.set("v", 1u8);
        ctx.set("v", String::from("one"));

        assert_eq!(ctx.get::<u8>("v"), None);
        assert_eq!(ctx.get::<String>("v").map(String::as_str), Some("one"));
    }

    #[test]
    fn test_get_mut_and_remove() {
        let mut ctx = Context::new();
        ctx.set("hits", vec![1u32]);
        ctx.get_mut::<Vec<u32>>("hits").unwrap().push(2);

        assert_eq!(ctx.get::<Vec<u32>>("hits"), Some(&vec![1, 2]));
        assert!(ctx.remove("hits"));
        assert!(!ctx.remove("hits"));
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_params_attached() {
        let mut ctx = Context::new();
        assert!(ctx.params().is_empty());
        assert!(!ctx.route_matched());

        let mut params = Params::new();
        params.push("id", "7");
        ctx.set_params(params);

        assert!(ctx.route_matched());
        assert_eq!(ctx.param("id"), "7");
        assert_eq!(ctx.param("other"), "");
    }

    #[test]
    fn test_debug_lists_keys() {
        let mut ctx = Context::new();
        ctx.set("b", 2);
        ctx.set("a", 1);

        let rendered = format!("{ctx:?}");
        assert!(rendered.contains(r#"keys: ["a", "b"]"#));
    }
}
