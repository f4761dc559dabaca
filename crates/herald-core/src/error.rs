//! Error types for the message model.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Categories of errors for classification and transport status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The inbound message could not be read.
    Validation,
    /// No endpoint is mapped to the message.
    NotFound,
    /// The request body exceeds the configured limit.
    PayloadTooLarge,
    /// The exchange did not finish in time.
    Timeout,
    /// An unexpected failure inside the node.
    Internal,
}

impl ErrorCategory {
    /// Returns the default HTTP status code for this error category.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Result type alias using [`MessageError`].
pub type MessageResult<T> = Result<T, MessageError>;

/// Errors raised while parsing, building or writing messages.
#[derive(Error, Debug)]
pub enum MessageError {
    /// The document is not well-formed XML.
    #[error("malformed XML: {message}")]
    MalformedXml {
        /// Parser diagnostic.
        message: String,
    },

    /// The document is XML but not a SOAP envelope.
    #[error("invalid SOAP envelope: {message}")]
    InvalidEnvelope {
        /// What was wrong with the envelope.
        message: String,
    },

    /// The envelope namespace matches no supported SOAP version.
    #[error("unsupported SOAP envelope namespace: {namespace}")]
    VersionMismatch {
        /// The namespace found on the envelope element.
        namespace: String,
    },

    /// A qualified name could not be parsed.
    #[error("invalid qualified name '{value}': {reason}")]
    InvalidQName {
        /// The offending text.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A fault code is not expressible under the message's SOAP version.
    #[error("fault code {code} is not supported by {version}")]
    UnsupportedFaultCode {
        /// The rejected code in Clark notation.
        code: String,
        /// Display name of the SOAP version.
        version: &'static str,
    },

    /// A fault definition string could not be parsed.
    #[error("invalid fault definition '{value}': {reason}")]
    InvalidFaultDefinition {
        /// The offending text.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Serializing the message failed.
    #[error("failed to write message: {0}")]
    Write(String),
}

impl MessageError {
    /// Creates a malformed-XML error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedXml {
            message: message.into(),
        }
    }

    /// Creates an invalid-envelope error.
    pub fn invalid_envelope(message: impl Into<String>) -> Self {
        Self::InvalidEnvelope {
            message: message.into(),
        }
    }

    /// Creates an invalid-QName error.
    pub fn invalid_qname(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidQName {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid fault definition error.
    pub fn invalid_fault_definition(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFaultDefinition {
            value: value.into(),
            reason: reason.into(),
        }
    }
}

impl MessageError {
    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::MalformedXml { .. } | Self::InvalidEnvelope { .. } | Self::VersionMismatch { .. } => {
                ErrorCategory::Validation
            }
            _ => ErrorCategory::Internal,
        }
    }
}

impl From<quick_xml::Error> for MessageError {
    fn from(err: quick_xml::Error) -> Self {
        Self::malformed(err.to_string())
    }
}

impl From<xmltree::Error> for MessageError {
    fn from(err: xmltree::Error) -> Self {
        Self::Write(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MessageError::invalid_qname("{x", "missing closing brace");
        assert_eq!(
            err.to_string(),
            "invalid qualified name '{x': missing closing brace"
        );
    }

    #[test]
    fn test_category_status() {
        let err = MessageError::malformed("eof");
        assert_eq!(err.category().default_status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            MessageError::Write("io".into()).category(),
            ErrorCategory::Internal
        );
    }

    #[test]
    fn test_version_mismatch_display() {
        let err = MessageError::VersionMismatch {
            namespace: "urn:bogus".to_string(),
        };
        assert!(err.to_string().contains("urn:bogus"));
    }
}
