//! Receiver errors.

use thiserror::Error;

/// Errors that stop the receiver.
#[derive(Error, Debug)]
pub enum ServerError {
    /// The configured address is not a socket address.
    #[error("invalid bind address '{addr}': {reason}")]
    InvalidAddress {
        /// The configured address.
        addr: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// The listener could not be bound.
    #[error("failed to bind to {addr}")]
    Bind {
        /// The address that was tried.
        addr: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// I/O error while serving.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Creates an invalid address error.
    pub fn invalid_address(addr: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAddress {
            addr: addr.into(),
            reason: reason.into(),
        }
    }

    /// Creates a bind error.
    pub fn bind(addr: impl Into<String>, source: std::io::Error) -> Self {
        Self::Bind {
            addr: addr.into(),
            source,
        }
    }
}
