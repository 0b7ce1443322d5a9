//! Path parameters captured by a route match.
//!
//! Parameters are kept in the order their slots appear in the matched
//! pattern, in a small vector so the common case (a handful of slots)
//! never touches the heap for the list itself.

use smallvec::SmallVec;

/// Number of parameters stored inline before spilling to the heap.
const INLINE_PARAMS: usize = 4;

/// A single captured path parameter.
///
/// The value is the literal path segment (or, for a catch-all, the literal
/// remaining suffix). It is not percent-decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    key: String,
    value: String,
}

impl Param {
    /// Creates a parameter from a slot name and the text it captured.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// The slot name from the pattern (`id` for `:id`).
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The captured text.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Ordered parameters extracted from a matched path.
///
/// The first slot of the pattern is the first entry, so reading by index is
/// stable. Lookups by name scan from the front and return the first match,
/// which means a duplicated key only ever yields its earliest value.
///
/// # Example
///
/// ```rust
/// use switchyard_router::Params;
///
/// let mut params = Params::new();
/// params.push("org", "acme");
/// params.push("id", "42");
///
/// assert_eq!(params.get("id"), "42");
/// assert_eq!(params.get("missing"), "");
/// assert_eq!(params.find("missing"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    inner: SmallVec<[Param; INLINE_PARAMS]>,
}

impl Params {
    /// Creates an empty parameter list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a parameter.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.push(Param::new(key, value));
    }

    /// Returns the value for `key`, or `""` when no slot of that name matched.
    ///
    /// An empty string is never a meaningful segment capture, so it doubles
    /// as the absence sentinel. Use [`Params::find`] to tell the two apart.
    #[must_use]
    pub fn get(&self, key: &str) -> &str {
        self.find(key).unwrap_or("")
    }

    /// Returns the value for `key` if a slot of that name matched.
    #[must_use]
    pub fn find(&self, key: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.value.as_str())
    }

    /// Returns the parameter at `index` in pattern order.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&Param> {
        self.inner.get(index)
    }

    /// Returns true if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of captured parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Iterates `(key, value)` pairs in pattern order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|p| (p.key(), p.value()))
    }

    /// Drops every parameter past the first `len`.
    ///
    /// Used by the tree to discard captures from a branch that failed to
    /// match further down.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.inner.truncate(len);
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = &'a Param;
    type IntoIter = std::slice::Iter<'a, Param>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().map(|(k, v)| Param::new(k, v)).collect(),
        }
    }
}
