//! The SOAP message model.

use crate::error::{MessageError, MessageResult};
use crate::fault::SoapFault;
use crate::header::SoapHeader;
use crate::payload::{Payload, TreePayload};
use crate::qname::QName;
use crate::version::SoapVersion;
use crate::xml;
use xmltree::{Element, XMLNode};

/// The body of a message: a payload or a fault, never both.
#[derive(Debug, Default)]
pub enum SoapBody {
    /// An empty body.
    #[default]
    Empty,
    /// A payload element.
    Payload(Box<dyn Payload>),
    /// A fault.
    Fault(SoapFault),
}

/// A SOAP envelope: version, header and body.
///
/// # Example
///
/// ```
/// use herald_core::{QName, SoapFault, SoapMessage, SoapVersion};
///
/// let mut message = SoapMessage::new(SoapVersion::Soap11);
/// message.set_payload(QName::new("urn:shop", "Ping").to_element());
/// assert!(!message.has_fault());
///
/// message.add_fault(SoapFault::client("bad request")).unwrap();
/// assert!(message.has_fault());
/// assert!(message.payload().is_none());
/// ```
#[derive(Debug)]
pub struct SoapMessage {
    version: SoapVersion,
    header: SoapHeader,
    body: SoapBody,
    soap_action: Option<String>,
}

impl SoapMessage {
    /// Creates an empty message.
    pub fn new(version: SoapVersion) -> Self {
        Self {
            version,
            header: SoapHeader::new(),
            body: SoapBody::Empty,
            soap_action: None,
        }
    }

    /// Assembles a message from parsed parts.
    pub fn from_parts(version: SoapVersion, header: SoapHeader, body: SoapBody) -> Self {
        Self {
            version,
            header,
            body,
            soap_action: None,
        }
    }

    /// Returns the SOAP version.
    pub fn version(&self) -> SoapVersion {
        self.version
    }

    /// Returns the header.
    pub fn header(&self) -> &SoapHeader {
        &self.header
    }

    /// Returns the header for editing.
    pub fn header_mut(&mut self) -> &mut SoapHeader {
        &mut self.header
    }

    /// Returns the body.
    pub fn body(&self) -> &SoapBody {
        &self.body
    }

    /// Returns the transport action, exactly as received.
    pub fn soap_action(&self) -> Option<&str> {
        self.soap_action.as_deref()
    }

    /// Sets the transport action.
    pub fn set_soap_action(&mut self, action: impl Into<String>) {
        self.soap_action = Some(action.into());
    }

    /// Returns the payload, if the body holds one.
    pub fn payload(&self) -> Option<&dyn Payload> {
        match &self.body {
            SoapBody::Payload(payload) => Some(payload.as_ref()),
            _ => None,
        }
    }

    /// Returns the payload tree, materializing it if needed.
    pub fn payload_element(&self) -> MessageResult<Option<&Element>> {
        self.payload().map(|p| p.element()).transpose()
    }

    /// Returns the payload root name using lookahead only.
    pub fn payload_root_name(&self) -> MessageResult<Option<QName>> {
        self.payload().map(|p| p.root_name()).transpose()
    }

    /// Replaces the body with a tree payload.
    pub fn set_payload(&mut self, element: Element) {
        self.body = SoapBody::Payload(Box::new(TreePayload::new(element)));
    }

    /// Replaces the body with any payload backend.
    pub fn set_payload_boxed(&mut self, payload: Box<dyn Payload>) {
        self.body = SoapBody::Payload(payload);
    }

    /// Returns the fault, if the body holds one.
    pub fn fault(&self) -> Option<&SoapFault> {
        match &self.body {
            SoapBody::Fault(fault) => Some(fault),
            _ => None,
        }
    }

    /// Returns true when the body holds a fault.
    pub fn has_fault(&self) -> bool {
        matches!(self.body, SoapBody::Fault(_))
    }

    /// Replaces the body with a fault, rejecting codes the version cannot express.
    pub fn add_fault(&mut self, fault: SoapFault) -> MessageResult<&SoapFault> {
        fault.validate(self.version)?;
        self.body = SoapBody::Fault(fault);
        match &self.body {
            SoapBody::Fault(fault) => Ok(fault),
            _ => Err(MessageError::Write("fault was not stored".to_string())),
        }
    }

    /// Empties the body.
    pub fn clear_body(&mut self) {
        self.body = SoapBody::Empty;
    }

    /// Returns true when the body holds neither payload nor fault.
    pub fn is_body_empty(&self) -> bool {
        matches!(self.body, SoapBody::Empty)
    }

    /// Returns the content type to send this message with.
    pub fn content_type(&self) -> String {
        let base = self.version.content_type();
        match (self.version, &self.soap_action) {
            (SoapVersion::Soap12, Some(action)) if !action.is_empty() => {
                let action = action.trim_matches('"');
                format!("{base}; charset=utf-8; action=\"{action}\"")
            }
            _ => format!("{base}; charset=utf-8"),
        }
    }

    /// Builds the envelope element.
    pub fn to_element(&self) -> MessageResult<Element> {
        let mut envelope = self.version.envelope_name("Envelope").to_element();
        if let Some(header) = self.header.to_element(self.version)? {
            envelope.children.push(XMLNode::Element(header));
        }
        let mut body = self.version.envelope_name("Body").to_element();
        match &self.body {
            SoapBody::Empty => {}
            SoapBody::Payload(payload) => {
                body.children.push(XMLNode::Element(payload.element()?.clone()));
            }
            SoapBody::Fault(fault) => {
                body.children.push(XMLNode::Element(fault.to_element(self.version)?));
            }
        }
        envelope.children.push(XMLNode::Element(body));
        Ok(envelope)
    }

    /// Serializes the envelope as a document.
    pub fn to_bytes(&self) -> MessageResult<Vec<u8>> {
        xml::write_document(&self.to_element()?)
    }
}
