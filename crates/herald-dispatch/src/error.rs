//! Dispatch and mapping errors.

use herald_core::{EndpointFailure, ErrorCategory, ExchangeId, MessageError};
use thiserror::Error;

/// Errors raised while building a mapping table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// The same key was registered twice.
    #[error("{mapping}: key '{key}' is already mapped")]
    DuplicateKey {
        /// Mapping that rejected the key.
        mapping: &'static str,
        /// The duplicated key.
        key: String,
    },

    /// A key could not be used for lookups.
    #[error("{mapping}: invalid key '{key}': {reason}")]
    InvalidKey {
        /// Mapping that rejected the key.
        mapping: &'static str,
        /// The rejected key.
        key: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl MappingError {
    /// Creates a duplicate-key error.
    pub fn duplicate(mapping: &'static str, key: impl Into<String>) -> Self {
        Self::DuplicateKey {
            mapping,
            key: key.into(),
        }
    }

    /// Creates an invalid-key error.
    pub fn invalid(mapping: &'static str, key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            mapping,
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Terminal outcomes of a dispatch that produced no SOAP response.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// Every mapping declined the message.
    #[error("no endpoint found for exchange {exchange_id} (payload root: {}, action: {})",
        .payload_root.as_deref().unwrap_or("-"),
        .soap_action.as_deref().unwrap_or("-"))]
    NoEndpointFound {
        /// The exchange that went unmapped.
        exchange_id: ExchangeId,
        /// Payload root in Clark notation, when a payload was present.
        payload_root: Option<String>,
        /// Transport action, when one was supplied.
        soap_action: Option<String>,
    },

    /// An endpoint failure that no resolver turned into a fault.
    #[error("unhandled endpoint failure: {0}")]
    Unhandled(#[source] EndpointFailure),

    /// The message could not be read or written.
    #[error(transparent)]
    Message(#[from] MessageError),
}

impl DispatchError {
    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::NoEndpointFound { .. } => ErrorCategory::NotFound,
            Self::Unhandled(_) => ErrorCategory::Internal,
            Self::Message(err) => err.category(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn test_categories_map_to_binding_status() {
        let not_found = DispatchError::NoEndpointFound {
            exchange_id: ExchangeId::new(),
            payload_root: Some("{urn:x}Ping".to_string()),
            soap_action: None,
        };
        assert_eq!(not_found.category().default_status_code(), StatusCode::NOT_FOUND);
        assert!(not_found.to_string().contains("{urn:x}Ping"));

        let unhandled = DispatchError::Unhandled(anyhow::anyhow!("boom").into());
        assert_eq!(
            unhandled.category().default_status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let malformed = DispatchError::from(MessageError::malformed("eof"));
        assert_eq!(malformed.category().default_status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_mapping_error_display() {
        let err = MappingError::duplicate("soap-action", "urn:a");
        assert_eq!(err.to_string(), "soap-action: key 'urn:a' is already mapped");
    }
}
