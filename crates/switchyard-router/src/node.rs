//! Radix tree node implementation.
//!
//! Each node owns one path segment. Children are split by kind: a sorted
//! list of static children searched by binary search, at most one named
//! parameter child and at most one catch-all child. Lookup walks one level
//! per path segment, so its cost follows the depth of the path rather than
//! the number of registered routes.

use std::fmt;

use smallvec::SmallVec;

use crate::error::RouteError;
use crate::params::Params;

/// Path segments held inline while matching before spilling to the heap.
const INLINE_SEGMENTS: usize = 16;

/// Marker that opens a named parameter segment.
pub const PARAM_MARKER: char = ':';

/// Marker that opens a catch-all segment.
pub const CATCH_ALL_MARKER: char = '*';

/// Kind of path segment a node represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Literal text (`users`, `api`).
    Static,
    /// Named parameter (`:id`), consumes one segment.
    Param(String),
    /// Catch-all (`*path`), consumes the rest of the path.
    CatchAll(String),
}

/// One segment of a parsed pattern, borrowed from the pattern string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PatternSegment<'p> {
    Static(&'p str),
    Param(&'p str),
    CatchAll(&'p str),
}

/// A node in the route tree.
///
/// `H` is whatever the owner registers per route; the tree never inspects it.
#[derive(Clone)]
pub struct Node<H> {
    segment: String,
    kind: SegmentKind,
    handler: Option<H>,
    static_children: Vec<Node<H>>,
    param_child: Option<Box<Node<H>>>,
    catch_all_child: Option<Box<Node<H>>>,
}

impl<H> Node<H> {
    fn new(segment: String, kind: SegmentKind) -> Self {
        Self {
            segment,
            kind,
            handler: None,
            static_children: Vec::new(),
            param_child: None,
            catch_all_child: None,
        }
    }

    /// Creates the root node of a tree.
    #[must_use]
    pub fn root() -> Self {
        Self::new(String::new(), SegmentKind::Static)
    }

    /// The segment text as written in the pattern (`users`, `:id`, `*path`).
    #[must_use]
    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// The kind of this node.
    #[must_use]
    pub fn kind(&self) -> &SegmentKind {
        &self.kind
    }

    /// The handler registered for a pattern ending exactly here.
    #[must_use]
    pub fn handler(&self) -> Option<&H> {
        self.handler.as_ref()
    }

    /// Number of direct children of every kind.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.static_children.len()
            + usize::from(self.param_child.is_some())
            + usize::from(self.catch_all_child.is_some())
    }

    fn slot_name(&self) -> &str {
        match &self.kind {
            SegmentKind::Param(name) | SegmentKind::CatchAll(name) => name,
            SegmentKind::Static => &self.segment,
        }
    }

    /// Registers `handler` under `pattern`, returning the handler it replaced.
    pub(crate) fn insert(&mut self, pattern: &str, handler: H) -> Result<Option<H>, RouteError> {
        let segments = parse_pattern(pattern)?;

        let mut node = self;
        for segment in segments {
            node = match segment {
                PatternSegment::Static(text) => node.static_child_mut(text),
                PatternSegment::Param(name) => node.param_child_mut(pattern, name)?,
                PatternSegment::CatchAll(name) => node.catch_all_child_mut(pattern, name)?,
            };
        }

        Ok(node.handler.replace(handler))
    }

    fn static_child_mut(&mut self, text: &str) -> &mut Node<H> {
        let index = match self
            .static_children
            .binary_search_by(|c| c.segment.as_str().cmp(text))
        {
            Ok(index) => index,
            Err(index) => {
                self.static_children
                    .insert(index, Node::new(text.to_string(), SegmentKind::Static));
                index
            }
        };
        &mut self.static_children[index]
    }

    fn param_child_mut(&mut self, pattern: &str, name: &str) -> Result<&mut Node<H>, RouteError> {
        if let Some(existing) = &self.param_child {
            if existing.slot_name() != name {
                return Err(RouteError::ParamConflict {
                    pattern: pattern.to_string(),
                    existing: existing.slot_name().to_string(),
                    new: name.to_string(),
                });
            }
        }

        let child = self.param_child.get_or_insert_with(|| {
            Box::new(Node::new(
                format!("{PARAM_MARKER}{name}"),
                SegmentKind::Param(name.to_string()),
            ))
        });
        Ok(child.as_mut())
    }

    fn catch_all_child_mut(
        &mut self,
        pattern: &str,
        name: &str,
    ) -> Result<&mut Node<H>, RouteError> {
        if let Some(existing) = &self.catch_all_child {
            if existing.slot_name() != name {
                return Err(RouteError::CatchAllConflict {
                    pattern: pattern.to_string(),
                    existing: existing.slot_name().to_string(),
                    new: name.to_string(),
                });
            }
        }

        let child = self.catch_all_child.get_or_insert_with(|| {
            Box::new(Node::new(
                format!("{CATCH_ALL_MARKER}{name}"),
                SegmentKind::CatchAll(name.to_string()),
            ))
        });
        Ok(child.as_mut())
    }

    /// Resolves a concrete path to its handler and captured parameters.
    ///
    /// Returns `None` when no registered pattern matches, including when the
    /// walk ends on an intermediate node that has no handler of its own.
    /// A single trailing slash is ignored for static and parameter segments,
    /// but empty segments inside the path (`/users//42`) never match one.
    /// A catch-all captures the raw remainder of `path`, slashes included.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<(&H, Params)> {
        let segments = split_path(path);

        let mut params = Params::new();
        let handler = self.match_segments(path, &segments, &mut params)?;
        Some((handler, params))
    }

    // On failure `params` is left exactly as it was on entry.
    fn match_segments<'a>(
        &'a self,
        path: &str,
        segments: &[PathSegment<'_>],
        params: &mut Params,
    ) -> Option<&'a H> {
        let Some((&(offset, segment), rest)) = segments.split_first() else {
            return self.handler.as_ref();
        };

        if !segment.is_empty() {
            if let Some(child) = self.find_static_child(segment) {
                if let Some(handler) = child.match_segments(path, rest, params) {
                    return Some(handler);
                }
            }

            if let Some(child) = &self.param_child {
                let mark = params.len();
                params.push(child.slot_name(), segment);
                if let Some(handler) = child.match_segments(path, rest, params) {
                    return Some(handler);
                }
                params.truncate(mark);
            }
        }

        if let Some(child) = &self.catch_all_child {
            if let Some(handler) = &child.handler {
                params.push(child.slot_name(), &path[offset..]);
                return Some(handler);
            }
        }

        None
    }

    fn find_static_child(&self, segment: &str) -> Option<&Node<H>> {
        self.static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
            .ok()
            .map(|i| &self.static_children[i])
    }

    /// Collects every registered pattern below this node, in tree order.
    pub(crate) fn collect_patterns(&self, prefix: &str, out: &mut Vec<String>) {
        let path = if self.segment.is_empty() {
            prefix.to_string()
        } else {
            format!("{prefix}/{}", self.segment)
        };

        if self.handler.is_some() {
            out.push(if path.is_empty() { "/".to_string() } else { path.clone() });
        }

        for child in &self.static_children {
            child.collect_patterns(&path, out);
        }
        if let Some(child) = &self.param_child {
            child.collect_patterns(&path, out);
        }
        if let Some(child) = &self.catch_all_child {
            child.collect_patterns(&path, out);
        }
    }
}

impl<H> fmt::Debug for Node<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("segment", &self.segment)
            .field("kind", &self.kind)
            .field("has_handler", &self.handler.is_some())
            .field("static_children", &self.static_children)
            .field("param_child", &self.param_child)
            .field("catch_all_child", &self.catch_all_child)
            .finish()
    }
}

/// Byte offset of a path segment within the request path, and its text.
type PathSegment<'p> = (usize, &'p str);

/// Splits a request path on `/`, keeping each segment's offset.
///
/// The leading slash and one trailing slash are dropped; any other empty
/// segment is kept so it can fail static and parameter matches.
fn split_path(path: &str) -> SmallVec<[PathSegment<'_>; INLINE_SEGMENTS]> {
    let start = usize::from(path.starts_with('/'));
    let mut segments: SmallVec<[PathSegment<'_>; INLINE_SEGMENTS]> = SmallVec::new();
    if start == path.len() {
        return segments;
    }

    let mut offset = start;
    for segment in path[start..].split('/') {
        segments.push((offset, segment));
        offset += segment.len() + 1;
    }
    if segments.len() > 1 && segments.last().is_some_and(|&(_, s)| s.is_empty()) {
        segments.pop();
    }
    segments
}

/// Splits a pattern into typed segments, rejecting malformed ones.
fn parse_pattern(pattern: &str) -> Result<Vec<PatternSegment<'_>>, RouteError> {
    if !pattern.starts_with('/') {
        return Err(RouteError::MissingLeadingSlash {
            pattern: pattern.to_string(),
        });
    }

    let raw: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let last = raw.len().saturating_sub(1);

    raw.iter()
        .enumerate()
        .map(|(i, &s)| {
            if let Some(name) = s.strip_prefix(PARAM_MARKER) {
                if name.is_empty() {
                    return Err(RouteError::EmptySlotName {
                        pattern: pattern.to_string(),
                    });
                }
                Ok(PatternSegment::Param(name))
            } else if let Some(name) = s.strip_prefix(CATCH_ALL_MARKER) {
                if name.is_empty() {
                    return Err(RouteError::EmptySlotName {
                        pattern: pattern.to_string(),
                    });
                }
                if i != last {
                    return Err(RouteError::CatchAllNotLast {
                        pattern: pattern.to_string(),
                        name: name.to_string(),
                    });
                }
                Ok(PatternSegment::CatchAll(name))
            } else {
                Ok(PatternSegment::Static(s))
            }
        })
        .collect()
}
