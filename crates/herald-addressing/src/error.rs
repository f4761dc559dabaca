//! Addressing errors.

use herald_core::{ErrorCategory, MessageError};
use thiserror::Error;

/// Result type for addressing operations.
pub type AddressingResult<T> = Result<T, AddressingError>;

/// Errors raised while reading, validating or routing addressing headers.
#[derive(Error, Debug)]
pub enum AddressingError {
    /// A required addressing property is absent.
    #[error("required addressing header {header} is missing")]
    MissingHeader {
        /// Local name of the missing header.
        header: &'static str,
    },

    /// An addressing header is present but cannot be used.
    #[error("invalid addressing header {header}: {reason}")]
    InvalidHeader {
        /// Local name of the offending header.
        header: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A value is not an absolute URI.
    #[error("invalid URI '{value}': {reason}")]
    InvalidUri {
        /// The rejected text.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// The message id was already seen.
    #[error("duplicate message id {message_id}")]
    DuplicateMessageId {
        /// The repeated id.
        message_id: String,
    },

    /// An out-of-band reply could not be delivered.
    #[error("failed to send reply to {address}")]
    SendFailed {
        /// Destination address.
        address: String,
        /// Underlying transport failure.
        #[source]
        source: anyhow::Error,
    },

    /// The message could not be read or written.
    #[error(transparent)]
    Message(#[from] MessageError),
}

impl AddressingError {
    /// Creates a missing-header error.
    pub const fn missing(header: &'static str) -> Self {
        Self::MissingHeader { header }
    }

    /// Creates an invalid-header error.
    pub fn invalid(header: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidHeader {
            header: header.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid-URI error.
    pub fn invalid_uri(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUri {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Creates a send failure.
    pub fn send_failed(address: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::SendFailed {
            address: address.into(),
            source: source.into(),
        }
    }

    /// Returns true when the error is answered with the "header required" fault.
    pub const fn is_missing_header(&self) -> bool {
        matches!(self, Self::MissingHeader { .. })
    }

    /// Returns the error category.
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingHeader { .. }
            | Self::InvalidHeader { .. }
            | Self::InvalidUri { .. }
            | Self::DuplicateMessageId { .. } => ErrorCategory::Validation,
            Self::SendFailed { .. } => ErrorCategory::Internal,
            Self::Message(err) => err.category(),
        }
    }
}
