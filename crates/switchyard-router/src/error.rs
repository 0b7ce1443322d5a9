//! Route registration errors.

use thiserror::Error;

/// A pattern that cannot be registered.
///
/// These are configuration mistakes. They surface while routes are being
/// registered at startup and are never produced by a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The pattern does not start at the path root.
    #[error("path must begin with '/' in path '{pattern}'")]
    MissingLeadingSlash {
        /// The rejected pattern.
        pattern: String,
    },

    /// A `:` or `*` marker with nothing after it.
    #[error("wildcard segment must have a name in path '{pattern}'")]
    EmptySlotName {
        /// The rejected pattern.
        pattern: String,
    },

    /// A catch-all followed by further segments.
    #[error("catch-all '*{name}' must be the last segment in path '{pattern}'")]
    CatchAllNotLast {
        /// The rejected pattern.
        pattern: String,
        /// Name of the misplaced catch-all.
        name: String,
    },

    /// Two differently named parameters at the same tree position.
    #[error("parameter ':{new}' in path '{pattern}' conflicts with existing ':{existing}'")]
    ParamConflict {
        /// The rejected pattern.
        pattern: String,
        /// Name already registered at this position.
        existing: String,
        /// Name the rejected pattern tried to use.
        new: String,
    },

    /// Two differently named catch-alls at the same tree position.
    #[error("catch-all '*{new}' in path '{pattern}' conflicts with existing '*{existing}'")]
    CatchAllConflict {
        /// The rejected pattern.
        pattern: String,
        /// Name already registered at this position.
        existing: String,
        /// Name the rejected pattern tried to use.
        new: String,
    },
}

impl RouteError {
    /// The pattern that caused the error.
    #[must_use]
    pub fn pattern(&self) -> &str {
        match self {
            Self::MissingLeadingSlash { pattern }
            | Self::EmptySlotName { pattern }
            | Self::CatchAllNotLast { pattern, .. }
            | Self::ParamConflict { pattern, .. }
            | Self::CatchAllConflict { pattern, .. } => pattern,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RouteError::MissingLeadingSlash {
            pattern: "users".to_string(),
        };
        assert_eq!(err.to_string(), "path must begin with '/' in path 'users'");

        let err = RouteError::ParamConflict {
            pattern: "/users/:name".to_string(),
            existing: "id".to_string(),
            new: "name".to_string(),
        };
        assert!(err.to_string().contains(":id"));
        assert_eq!(err.pattern(), "/users/:name");
    }
}
