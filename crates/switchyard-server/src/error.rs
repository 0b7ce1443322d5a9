//! Server error types.

use std::net::AddrParseError;

use thiserror::Error;

/// Errors raised while binding or running the server.
///
/// Per-request failures never surface here; they become HTTP responses.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured address does not parse.
    #[error("Invalid address '{addr}': {source}")]
    InvalidAddress {
        /// The address as configured.
        addr: String,
        /// Parser error.
        #[source]
        source: AddrParseError,
    },

    /// Failed to bind to the configured address.
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        /// The address that could not be bound.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// I/O error during server operation.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ServerError::Bind {
            addr: "0.0.0.0:80".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "Failed to bind to 0.0.0.0:80: denied");

        let source = "nope".parse::<std::net::SocketAddr>().unwrap_err();
        let err = ServerError::InvalidAddress {
            addr: "nope".to_string(),
            source,
        };
        assert!(err.to_string().starts_with("Invalid address 'nope'"));
    }
}
