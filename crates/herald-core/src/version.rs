//! SOAP protocol versions and their wire vocabulary.

use crate::qname::QName;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace of the SOAP 1.1 envelope.
pub const SOAP11_ENVELOPE_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Namespace of the SOAP 1.2 envelope.
pub const SOAP12_ENVELOPE_NAMESPACE: &str = "http://www.w3.org/2003/05/soap-envelope";

/// Prefix used for envelope elements written by Herald.
pub const ENVELOPE_PREFIX: &str = "soapenv";

/// A SOAP protocol version.
///
/// Every piece of version-specific vocabulary (namespaces, fault code names,
/// actor versus role) is looked up here so no caller hardcodes one
/// version's terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SoapVersion {
    /// SOAP 1.1.
    #[default]
    #[serde(rename = "1.1")]
    Soap11,
    /// SOAP 1.2.
    #[serde(rename = "1.2")]
    Soap12,
}

impl SoapVersion {
    /// Detects the version from an envelope namespace.
    pub fn from_namespace(namespace: &str) -> Option<Self> {
        match namespace {
            SOAP11_ENVELOPE_NAMESPACE => Some(Self::Soap11),
            SOAP12_ENVELOPE_NAMESPACE => Some(Self::Soap12),
            _ => None,
        }
    }

    /// Returns the envelope namespace URI.
    pub const fn envelope_namespace(self) -> &'static str {
        match self {
            Self::Soap11 => SOAP11_ENVELOPE_NAMESPACE,
            Self::Soap12 => SOAP12_ENVELOPE_NAMESPACE,
        }
    }

    /// Returns the transport content type.
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Soap11 => "text/xml",
            Self::Soap12 => "application/soap+xml",
        }
    }

    /// Returns the name of the header attribute that targets a node.
    pub const fn actor_or_role_attribute(self) -> &'static str {
        match self {
            Self::Soap11 => "actor",
            Self::Soap12 => "role",
        }
    }

    /// Returns the URI of the `next` actor or role.
    pub const fn next_actor_or_role_uri(self) -> &'static str {
        match self {
            Self::Soap11 => "http://schemas.xmlsoap.org/soap/actor/next",
            Self::Soap12 => "http://www.w3.org/2003/05/soap-envelope/role/next",
        }
    }

    /// Returns the URI of the `none` role (SOAP 1.2 only).
    pub const fn none_role_uri(self) -> Option<&'static str> {
        match self {
            Self::Soap11 => None,
            Self::Soap12 => Some("http://www.w3.org/2003/05/soap-envelope/role/none"),
        }
    }

    /// Returns the URI of the `ultimateReceiver` role (SOAP 1.2 only).
    pub const fn ultimate_receiver_role_uri(self) -> Option<&'static str> {
        match self {
            Self::Soap11 => None,
            Self::Soap12 => Some("http://www.w3.org/2003/05/soap-envelope/role/ultimateReceiver"),
        }
    }

    /// Returns the literal written for a true `mustUnderstand` attribute.
    pub const fn must_understand_true(self) -> &'static str {
        match self {
            Self::Soap11 => "1",
            Self::Soap12 => "true",
        }
    }

    /// Returns whether arbitrary fault code QNames are allowed.
    pub const fn supports_custom_fault_codes(self) -> bool {
        matches!(self, Self::Soap11)
    }

    /// Returns a QName in the envelope namespace with the envelope prefix.
    pub fn envelope_name(self, local: &str) -> QName {
        QName::new(self.envelope_namespace(), local).with_prefix(ENVELOPE_PREFIX)
    }

    /// Returns the client (1.1) or sender (1.2) fault code.
    pub fn client_or_sender_fault_code(self) -> QName {
        match self {
            Self::Soap11 => self.envelope_name("Client"),
            Self::Soap12 => self.envelope_name("Sender"),
        }
    }

    /// Returns the server (1.1) or receiver (1.2) fault code.
    pub fn server_or_receiver_fault_code(self) -> QName {
        match self {
            Self::Soap11 => self.envelope_name("Server"),
            Self::Soap12 => self.envelope_name("Receiver"),
        }
    }

    /// Returns the must-understand fault code.
    pub fn must_understand_fault_code(self) -> QName {
        self.envelope_name("MustUnderstand")
    }

    /// Returns the version-mismatch fault code.
    pub fn version_mismatch_fault_code(self) -> QName {
        self.envelope_name("VersionMismatch")
    }

    /// Returns a short display name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Soap11 => "SOAP 1.1",
            Self::Soap12 => "SOAP 1.2",
        }
    }
}

impl fmt::Display for SoapVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_namespace() {
        assert_eq!(
            SoapVersion::from_namespace(SOAP11_ENVELOPE_NAMESPACE),
            Some(SoapVersion::Soap11)
        );
        assert_eq!(
            SoapVersion::from_namespace(SOAP12_ENVELOPE_NAMESPACE),
            Some(SoapVersion::Soap12)
        );
        assert_eq!(SoapVersion::from_namespace("urn:other"), None);
    }

    #[test]
    fn test_fault_vocabulary_differs_by_version() {
        let client = SoapVersion::Soap11.client_or_sender_fault_code();
        let sender = SoapVersion::Soap12.client_or_sender_fault_code();
        assert_eq!(client.local_name(), "Client");
        assert_eq!(sender.local_name(), "Sender");
        assert_ne!(client.namespace(), sender.namespace());
    }

    #[test]
    fn test_roles() {
        assert!(SoapVersion::Soap11.none_role_uri().is_none());
        assert!(SoapVersion::Soap12
            .ultimate_receiver_role_uri()
            .is_some_and(|uri| uri.ends_with("ultimateReceiver")));
        assert_eq!(SoapVersion::Soap12.actor_or_role_attribute(), "role");
    }

    #[test]
    fn test_custom_codes_only_on_soap11() {
        assert!(SoapVersion::Soap11.supports_custom_fault_codes());
        assert!(!SoapVersion::Soap12.supports_custom_fault_codes());
    }
}
