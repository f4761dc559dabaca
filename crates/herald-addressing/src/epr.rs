//! Endpoint references.

use crate::uri::AddressingUri;
use std::fmt;
use xmltree::Element;

/// An address with opaque routing metadata.
///
/// Reference properties and parameters are carried through to replies
/// exactly as received; nothing here interprets them.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointReference {
    address: AddressingUri,
    reference_properties: Vec<Element>,
    reference_parameters: Vec<Element>,
}

impl EndpointReference {
    /// Creates a reference with no metadata.
    pub fn new(address: AddressingUri) -> Self {
        Self {
            address,
            reference_properties: Vec::new(),
            reference_parameters: Vec::new(),
        }
    }

    /// Sets the reference properties.
    #[must_use]
    pub fn with_reference_properties(mut self, properties: Vec<Element>) -> Self {
        self.reference_properties = properties;
        self
    }

    /// Sets the reference parameters.
    #[must_use]
    pub fn with_reference_parameters(mut self, parameters: Vec<Element>) -> Self {
        self.reference_parameters = parameters;
        self
    }

    /// Returns the address.
    pub fn address(&self) -> &AddressingUri {
        &self.address
    }

    /// Returns the reference properties in document order.
    pub fn reference_properties(&self) -> &[Element] {
        &self.reference_properties
    }

    /// Returns the reference parameters in document order.
    pub fn reference_parameters(&self) -> &[Element] {
        &self.reference_parameters
    }
}

impl fmt::Display for EndpointReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)
    }
}
