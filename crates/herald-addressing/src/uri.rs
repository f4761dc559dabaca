//! Addressing URIs.

use crate::error::{AddressingError, AddressingResult};
use herald_core::xml::normalize_space;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// An absolute URI used as an address, action or message id.
///
/// The text is checked with [`url::Url`] but kept as written, so comparing
/// two URIs compares what appeared on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AddressingUri(String);

impl AddressingUri {
    /// Parses a URI after whitespace normalization.
    pub fn parse(text: &str) -> AddressingResult<Self> {
        let normalized = normalize_space(text);
        if normalized.is_empty() {
            return Err(AddressingError::invalid_uri(text, "empty"));
        }
        Url::parse(&normalized).map_err(|err| AddressingError::invalid_uri(&normalized, err.to_string()))?;
        Ok(Self(normalized))
    }

    /// Wraps text known to be an absolute URI.
    pub(crate) const fn from_known(text: String) -> Self {
        Self(text)
    }

    /// Returns the URI text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns this URI with `suffix` appended.
    pub fn with_suffix(&self, suffix: &str) -> AddressingResult<Self> {
        Self::parse(&format!("{}{suffix}", self.0))
    }
}

impl fmt::Display for AddressingUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AddressingUri {
    type Err = AddressingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AddressingUri {
    type Error = AddressingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AddressingUri> for String {
    fn from(uri: AddressingUri) -> Self {
        uri.0
    }
}

impl AsRef<str> for AddressingUri {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_text_verbatim() {
        let uri = AddressingUri::parse("  http://example.com  ").unwrap();
        assert_eq!(uri.as_str(), "http://example.com");
        let urn = AddressingUri::parse("urn:uuid:21363e0d-2645-4eb7-8afd-2f5ee1bb25cf").unwrap();
        assert_eq!(urn.to_string(), "urn:uuid:21363e0d-2645-4eb7-8afd-2f5ee1bb25cf");
    }

    #[test]
    fn test_relative_and_empty_rejected() {
        assert!(matches!(AddressingUri::parse("orders/place"), Err(AddressingError::InvalidUri { .. })));
        assert!(AddressingUri::parse("   ").is_err());
    }

    #[test]
    fn test_suffix() {
        let action = AddressingUri::parse("urn:herald:echo:Echo").unwrap();
        assert_eq!(action.with_suffix("Response").unwrap().as_str(), "urn:herald:echo:EchoResponse");
    }

    #[test]
    fn test_serde_validates() {
        let uri: AddressingUri = serde_json::from_str("\"mailto:ops@example.com\"").unwrap();
        assert_eq!(uri.as_str(), "mailto:ops@example.com");
        assert!(serde_json::from_str::<AddressingUri>("\"not a uri\"").is_err());
    }
}
