//! Message factories.
//!
//! A factory turns inbound bytes into a [`SoapMessage`] and creates empty
//! outbound messages. The backend is chosen once when the dispatcher is built:
//!
//! - [`TreeMessageFactory`] parses the whole envelope with `xmltree`.
//! - [`StreamingMessageFactory`] scans the envelope with `quick-xml`, parses
//!   only the header, and keeps the payload as a byte slice.

use crate::error::{MessageError, MessageResult};
use crate::fault::SoapFault;
use crate::header::SoapHeader;
use crate::message::{SoapBody, SoapMessage};
use crate::payload::{StreamingPayload, TreePayload};
use crate::qname::QName;
use crate::version::SoapVersion;
use crate::xml::{self, declarations, resolve_tag_name, NamespaceBinding};
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::HeaderMap;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fmt;
use std::ops::Range;
use xmltree::Element;

/// Name of the SOAP 1.1 action header.
pub const SOAP_ACTION_HEADER: &str = "SOAPAction";

/// Creates and parses SOAP messages.
pub trait MessageFactory: Send + Sync + fmt::Debug {
    /// Returns the version used for messages created from scratch.
    fn soap_version(&self) -> SoapVersion;

    /// Creates an empty message of the given version.
    fn create_message(&self, version: SoapVersion) -> SoapMessage {
        SoapMessage::new(version)
    }

    /// Parses an inbound message. The version is taken from the envelope.
    fn create_message_from(&self, headers: &HeaderMap, body: Bytes) -> MessageResult<SoapMessage>;
}

/// Builds a full element tree for every inbound message.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeMessageFactory {
    version: SoapVersion,
}

impl TreeMessageFactory {
    /// Creates a factory whose new messages use `version`.
    pub fn new(version: SoapVersion) -> Self {
        Self { version }
    }
}

impl MessageFactory for TreeMessageFactory {
    fn soap_version(&self) -> SoapVersion {
        self.version
    }

    fn create_message_from(&self, headers: &HeaderMap, body: Bytes) -> MessageResult<SoapMessage> {
        let envelope = xml::parse_element(&body)?;
        let version = envelope_version(&QName::of(&envelope))?;

        let header = xml::find_child(&envelope, &version.envelope_name("Header"))
            .map(|h| SoapHeader::from_element(version, h))
            .unwrap_or_default();
        let body_element = xml::find_child(&envelope, &version.envelope_name("Body"))
            .ok_or_else(|| MessageError::invalid_envelope("envelope has no Body"))?;

        let body = match xml::first_child_element(body_element) {
            None => SoapBody::Empty,
            Some(first) if version.envelope_name("Fault").matches(first) => {
                SoapBody::Fault(SoapFault::from_element(version, first)?)
            }
            Some(first) => SoapBody::Payload(Box::new(TreePayload::new(first.clone()))),
        };

        let mut message = SoapMessage::from_parts(version, header, body);
        if let Some(action) = soap_action_from_headers(headers) {
            message.set_soap_action(action);
        }
        Ok(message)
    }
}

/// Scans the envelope and defers building the payload tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamingMessageFactory {
    version: SoapVersion,
    payload_caching: bool,
}

impl StreamingMessageFactory {
    /// Creates a factory whose new messages use `version`.
    pub fn new(version: SoapVersion) -> Self {
        Self {
            version,
            payload_caching: false,
        }
    }

    /// Builds payload trees at parse time instead of on first read.
    #[must_use]
    pub fn with_payload_caching(mut self, caching: bool) -> Self {
        self.payload_caching = caching;
        self
    }

    /// Returns whether payloads are built at parse time.
    pub fn payload_caching(&self) -> bool {
        self.payload_caching
    }
}

impl MessageFactory for StreamingMessageFactory {
    fn soap_version(&self) -> SoapVersion {
        self.version
    }

    fn create_message_from(&self, headers: &HeaderMap, body: Bytes) -> MessageResult<SoapMessage> {
        let layout = scan_envelope(&body)?;
        let version = layout.version;

        let header = match &layout.header {
            Some(range) => {
                let element = xml::parse_fragment(&body[range.clone()], &layout.envelope_scope)?;
                SoapHeader::from_element(version, &element)
            }
            None => SoapHeader::new(),
        };

        let body_content = match &layout.payload {
            None => SoapBody::Empty,
            Some((root, range)) if *root == version.envelope_name("Fault") => {
                let element: Element = xml::parse_fragment(&body[range.clone()], &layout.body_scope)?;
                SoapBody::Fault(SoapFault::from_element(version, &element)?)
            }
            Some((_, range)) => {
                let payload = StreamingPayload::new(
                    body.slice(range.clone()),
                    layout.body_scope.clone(),
                    self.payload_caching,
                )?;
                SoapBody::Payload(Box::new(payload))
            }
        };

        let mut message = SoapMessage::from_parts(version, header, body_content);
        if let Some(action) = soap_action_from_headers(headers) {
            message.set_soap_action(action);
        }
        Ok(message)
    }
}

/// Reads the transport action: the `SOAPAction` header, or the `action`
/// parameter of the content type. The value is returned as received, quotes
/// included.
pub fn soap_action_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(SOAP_ACTION_HEADER).and_then(|v| v.to_str().ok()) {
        return Some(value.to_string());
    }
    let content_type = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.trim().split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("action")
            .then(|| value.trim().to_string())
    })
}

fn envelope_version(name: &QName) -> MessageResult<SoapVersion> {
    let version = SoapVersion::from_namespace(name.namespace()).ok_or_else(|| {
        MessageError::VersionMismatch {
            namespace: name.namespace().to_string(),
        }
    })?;
    if name.local_name() != "Envelope" {
        return Err(MessageError::invalid_envelope(format!(
            "root element is {name}, expected Envelope"
        )));
    }
    Ok(version)
}

/// Byte layout of an envelope found by [`scan_envelope`].
#[derive(Debug)]
struct EnvelopeLayout {
    version: SoapVersion,
    envelope_scope: Vec<NamespaceBinding>,
    body_scope: Vec<NamespaceBinding>,
    header: Option<Range<usize>>,
    payload: Option<(QName, Range<usize>)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Other,
    Header,
    Body,
}

fn position<R>(reader: &Reader<R>) -> MessageResult<usize> {
    usize::try_from(reader.buffer_position())
        .map_err(|_| MessageError::malformed("document exceeds addressable size"))
}

/// Walks the envelope once, recording the header range and the range of the
/// first body element. Nothing below the payload root is inspected beyond
/// well-formedness.
fn scan_envelope(source: &[u8]) -> MessageResult<EnvelopeLayout> {
    let mut reader = Reader::from_reader(source);
    let mut buf = Vec::new();

    let mut depth = 0usize;
    let mut version = None;
    let mut envelope_scope = Vec::new();
    let mut body_scope = Vec::new();
    let mut section = Section::Other;
    let mut body_seen = false;
    let mut header_start = 0;
    let mut header = None;
    let mut payload_start = None;
    let mut payload = None;

    loop {
        buf.clear();
        let before = position(&reader)?;
        let (start, empty) = match reader.read_event_into(&mut buf)? {
            Event::Start(start) => (start, false),
            Event::Empty(start) => (start, true),
            Event::End(_) => {
                let after = position(&reader)?;
                match (depth, section) {
                    (2, Section::Header) => header = Some(header_start..after),
                    (3, Section::Body) => {
                        if let Some((root, start)) = payload_start.take() {
                            payload = Some((root, start..after));
                        }
                    }
                    _ => {}
                }
                if depth == 2 {
                    section = Section::Other;
                }
                depth = depth.saturating_sub(1);
                continue;
            }
            Event::Eof => break,
            _ => continue,
        };

        depth += 1;
        let after = position(&reader)?;

        match depth {
            1 => {
                envelope_scope = declarations(&start)?;
                let name = resolve_tag_name(start.name().as_ref(), &envelope_scope)?;
                version = Some(envelope_version(&name)?);
            }
            2 => {
                let soap = version.ok_or_else(|| MessageError::invalid_envelope("missing Envelope"))?;
                let mut scope = envelope_scope.clone();
                scope.extend(declarations(&start)?);
                let name = resolve_tag_name(start.name().as_ref(), &scope)?;
                if name == soap.envelope_name("Header") {
                    section = Section::Header;
                    header_start = before;
                    if empty {
                        header = Some(before..after);
                    }
                } else if name == soap.envelope_name("Body") {
                    section = Section::Body;
                    body_seen = true;
                    body_scope = scope;
                }
            }
            3 if section == Section::Body && payload.is_none() && payload_start.is_none() => {
                let mut scope = body_scope.clone();
                scope.extend(declarations(&start)?);
                let root = resolve_tag_name(start.name().as_ref(), &scope)?;
                if empty {
                    payload = Some((root, before..after));
                } else {
                    payload_start = Some((root, before));
                }
            }
            _ => {}
        }

        if empty {
            if depth == 2 {
                section = Section::Other;
            }
            depth -= 1;
        }
    }

    let version = version.ok_or_else(|| MessageError::invalid_envelope("document has no root element"))?;
    if !body_seen {
        return Err(MessageError::invalid_envelope("envelope has no Body"));
    }
    Ok(EnvelopeLayout {
        version,
        envelope_scope,
        body_scope,
        header,
        payload,
    })
}
