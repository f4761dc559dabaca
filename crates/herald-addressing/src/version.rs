//! WS-Addressing versions.
//!
//! Each version supplies its vocabulary (namespace, anonymous and none
//! addresses, defaults, required properties and fault subcodes); reading,
//! validating and writing the header blocks is shared.
//!
//! | | 2004/08 | 1.0 |
//! |---|---|---|
//! | Default destination | none | anonymous |
//! | Default reply-to | the From reference | anonymous |
//! | Required | To, Action, MessageID | Action, MessageID |
//! | Reference properties | yes | no |

use crate::epr::EndpointReference;
use crate::error::{AddressingError, AddressingResult};
use crate::map::MessageAddressingProperties;
use crate::uri::AddressingUri;
use herald_core::{xml, FaultCode, QName, SoapFault, SoapHeaderElement, SoapMessage, SoapVersion};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use xmltree::Element;

/// Prefix used for emitted addressing elements.
pub const ADDRESSING_PREFIX: &str = "wsa";

/// Locale of addressing fault reasons.
pub const ADDRESSING_FAULT_LOCALE: &str = "en";

const TO: &str = "To";
const FROM: &str = "From";
const REPLY_TO: &str = "ReplyTo";
const FAULT_TO: &str = "FaultTo";
const ACTION: &str = "Action";
const MESSAGE_ID: &str = "MessageID";
const RELATES_TO: &str = "RelatesTo";
const ADDRESS: &str = "Address";
const REFERENCE_PROPERTIES: &str = "ReferenceProperties";
const REFERENCE_PARAMETERS: &str = "ReferenceParameters";
const IS_REFERENCE_PARAMETER: &str = "IsReferenceParameter";

/// A WS-Addressing version.
pub trait AddressingVersion: Send + Sync + fmt::Debug {
    /// Returns a short name for logs.
    fn name(&self) -> &'static str;

    /// Returns the addressing namespace.
    fn namespace(&self) -> &'static str;

    /// Returns the anonymous address.
    fn anonymous(&self) -> &'static str;

    /// Returns the none address, when the version defines one.
    fn none(&self) -> Option<&'static str>;

    /// Returns true when endpoint references carry reference properties.
    fn has_reference_properties(&self) -> bool;

    /// Returns true when emitted reference parameters are marked as such.
    fn marks_reference_parameters(&self) -> bool;

    /// Returns true when `To` is a required property.
    fn requires_to(&self) -> bool;

    /// Returns the subcode and reason of the "header required" fault.
    fn header_required_fault(&self) -> (&'static str, &'static str);

    /// Returns the subcode and reason of the "invalid header" fault.
    fn invalid_header_fault(&self) -> (&'static str, &'static str);

    /// Destination used when the message has no `To`.
    fn default_to(&self) -> Option<AddressingUri> {
        None
    }

    /// Reply destination used when the message has no `ReplyTo`.
    fn default_reply_to(&self, from: Option<&EndpointReference>) -> Option<EndpointReference>;

    /// Returns an addressing element name with the `wsa` prefix.
    fn element_name(&self, local: &str) -> QName {
        QName::new(self.namespace(), local).with_prefix(ADDRESSING_PREFIX)
    }

    /// Returns true when the header block belongs to this version.
    fn understands(&self, header: &SoapHeaderElement) -> bool {
        header.name().namespace() == self.namespace()
    }

    /// Returns true when any header block of `message` uses this version.
    fn applies_to(&self, message: &SoapMessage) -> bool {
        message.header().elements().iter().any(|h| self.understands(h))
    }

    /// Returns true when `epr` points at the anonymous address.
    fn is_anonymous(&self, epr: &EndpointReference) -> bool {
        epr.address().as_str() == self.anonymous()
    }

    /// Returns true when `epr` points at the none address.
    fn is_none(&self, epr: &EndpointReference) -> bool {
        self.none().is_some_and(|none| epr.address().as_str() == none)
    }

    /// Reads the addressing properties of `message`, applying defaults.
    ///
    /// Unparseable URIs, repeated headers and references without an address
    /// are errors. Missing properties are not; see [`validate`](Self::validate).
    fn properties(&self, message: &SoapMessage) -> AddressingResult<MessageAddressingProperties> {
        let mut to = None;
        let mut from = None;
        let mut reply_to = None;
        let mut fault_to = None;
        let mut action = None;
        let mut message_id = None;
        let mut relates_to = None;

        for header in message.header().elements().iter().filter(|h| self.understands(h)) {
            let local = header.name().local_name();
            match local {
                TO => set_once(&mut to, local, parse_uri(local, &header.text())?)?,
                ACTION => set_once(&mut action, local, parse_uri(local, &header.text())?)?,
                MESSAGE_ID => set_once(&mut message_id, local, parse_uri(local, &header.text())?)?,
                RELATES_TO => {
                    let value = parse_uri(local, &header.text())?;
                    relates_to.get_or_insert(value);
                }
                FROM => set_once(&mut from, local, self.endpoint_reference(local, header.element())?)?,
                REPLY_TO => set_once(&mut reply_to, local, self.endpoint_reference(local, header.element())?)?,
                FAULT_TO => set_once(&mut fault_to, local, self.endpoint_reference(local, header.element())?)?,
                _ => {}
            }
        }

        let to = to.or_else(|| self.default_to());
        let reply_to = reply_to.or_else(|| self.default_reply_to(from.as_ref()));
        let fault_to = fault_to.or_else(|| reply_to.clone());

        let mut map = MessageAddressingProperties::new()
            .with_optional_to(to)
            .with_optional_reply_to(reply_to)
            .with_optional_fault_to(fault_to);
        if let Some(from) = from {
            map = map.with_from(from);
        }
        if let Some(action) = action {
            map = map.with_action(action);
        }
        if let Some(message_id) = message_id {
            map = map.with_message_id(message_id);
        }
        if let Some(relates_to) = relates_to {
            map = map.with_relates_to(relates_to);
        }
        Ok(map)
    }

    /// Reads an endpoint reference from a `From`, `ReplyTo` or `FaultTo` element.
    fn endpoint_reference(&self, header: &str, element: &Element) -> AddressingResult<EndpointReference> {
        let address = xml::find_child(element, &QName::new(self.namespace(), ADDRESS))
            .ok_or_else(|| AddressingError::invalid(header, "endpoint reference has no Address"))?;
        let address = parse_uri(header, &xml::text_of(address))?;
        let children_of = |local: &str| -> Vec<Element> {
            xml::find_child(element, &QName::new(self.namespace(), local))
                .map(|container| xml::child_elements(container).cloned().collect())
                .unwrap_or_default()
        };
        let mut epr = EndpointReference::new(address).with_reference_parameters(children_of(REFERENCE_PARAMETERS));
        if self.has_reference_properties() {
            epr = epr.with_reference_properties(children_of(REFERENCE_PROPERTIES));
        }
        Ok(epr)
    }

    /// Checks that the required properties are present. `message_id_optional`
    /// waives the `MessageID` check only.
    fn validate(&self, map: &MessageAddressingProperties, message_id_optional: bool) -> AddressingResult<()> {
        if self.requires_to() && map.to().is_none() {
            return Err(AddressingError::missing(TO));
        }
        if map.action().is_none() {
            return Err(AddressingError::missing(ACTION));
        }
        if !message_id_optional && map.message_id().is_none() {
            return Err(AddressingError::missing(MESSAGE_ID));
        }
        Ok(())
    }

    /// Appends the header blocks for `map` to `message`.
    ///
    /// Blocks are written as To, From, ReplyTo, FaultTo, Action, MessageID,
    /// RelatesTo, then the reference parameters and properties as top-level
    /// blocks. `map` is not modified.
    fn add_addressing_headers(&self, message: &mut SoapMessage, map: &MessageAddressingProperties) {
        let soap_version = message.version();
        let header = message.header_mut();
        if let Some(to) = map.to() {
            let block = header.add_header_element(self.element_name(TO));
            block.set_text(to.as_str());
            block.set_must_understand(true);
        }
        for (local, epr) in [(FROM, map.from()), (REPLY_TO, map.reply_to()), (FAULT_TO, map.fault_to())] {
            if let Some(epr) = epr {
                let block = header.add_header_element(self.element_name(local));
                for child in self.endpoint_reference_children(epr) {
                    block.add_child(child);
                }
            }
        }
        for (local, value) in [(ACTION, map.action()), (MESSAGE_ID, map.message_id()), (RELATES_TO, map.relates_to())] {
            if let Some(value) = value {
                header.add_header_element(self.element_name(local)).set_text(value.as_str());
            }
        }
        for parameter in map.reference_parameters() {
            let mut element = parameter.clone();
            if self.marks_reference_parameters() {
                xml::declare_namespace(&mut element, ADDRESSING_PREFIX, self.namespace());
                element
                    .attributes
                    .insert(format!("{ADDRESSING_PREFIX}:{IS_REFERENCE_PARAMETER}"), "true".to_string());
            }
            header.push(SoapHeaderElement::from_element(soap_version, element));
        }
        for property in map.reference_properties() {
            header.push(SoapHeaderElement::from_element(soap_version, property.clone()));
        }
    }

    /// Builds the children of an endpoint reference block.
    fn endpoint_reference_children(&self, epr: &EndpointReference) -> Vec<Element> {
        let mut children = vec![xml::text_element(&self.element_name(ADDRESS), epr.address().as_str())];
        let mut container = |local: &str, nodes: &[Element]| {
            if !nodes.is_empty() {
                let mut element = self.element_name(local).to_element();
                element
                    .children
                    .extend(nodes.iter().cloned().map(xmltree::XMLNode::Element));
                children.push(element);
            }
        };
        container(REFERENCE_PARAMETERS, epr.reference_parameters());
        if self.has_reference_properties() {
            container(REFERENCE_PROPERTIES, epr.reference_properties());
        }
        children
    }

    /// Creates the "header required" fault in `soap_version`'s vocabulary.
    fn header_required(&self, soap_version: SoapVersion) -> SoapFault {
        let (subcode, reason) = self.header_required_fault();
        self.addressing_fault(soap_version, subcode, reason)
    }

    /// Creates the "invalid header" fault in `soap_version`'s vocabulary.
    fn invalid_header(&self, soap_version: SoapVersion) -> SoapFault {
        let (subcode, reason) = self.invalid_header_fault();
        self.addressing_fault(soap_version, subcode, reason)
    }

    /// Creates an addressing fault: the subcode is the fault code under
    /// SOAP 1.1 and a `Sender` subcode under SOAP 1.2.
    fn addressing_fault(&self, soap_version: SoapVersion, subcode: &str, reason: &str) -> SoapFault {
        let subcode = self.element_name(subcode);
        let fault = match soap_version {
            SoapVersion::Soap11 => SoapFault::new(FaultCode::Custom(subcode), reason),
            SoapVersion::Soap12 => SoapFault::new(FaultCode::ClientOrSender, reason).with_subcode(subcode),
        };
        fault.with_locale(ADDRESSING_FAULT_LOCALE)
    }
}

/// A shared addressing version.
pub type BoxedAddressingVersion = Arc<dyn AddressingVersion>;

fn parse_uri(header: &str, text: &str) -> AddressingResult<AddressingUri> {
    AddressingUri::parse(text).map_err(|err| AddressingError::invalid(header, err.to_string()))
}

fn set_once<T>(slot: &mut Option<T>, header: &str, value: T) -> AddressingResult<()> {
    if slot.is_some() {
        return Err(AddressingError::invalid(header, "header appears more than once"));
    }
    *slot = Some(value);
    Ok(())
}

/// The August 2004 member submission.
#[derive(Debug, Clone, Copy, Default)]
pub struct Addressing200408;

impl Addressing200408 {
    /// The 2004/08 namespace.
    pub const NAMESPACE: &'static str = "http://schemas.xmlsoap.org/ws/2004/08/addressing";
    /// The 2004/08 anonymous address.
    pub const ANONYMOUS: &'static str = "http://schemas.xmlsoap.org/ws/2004/08/addressing/role/anonymous";
}

impl AddressingVersion for Addressing200408 {
    fn name(&self) -> &'static str {
        "2004/08"
    }

    fn namespace(&self) -> &'static str {
        Self::NAMESPACE
    }

    fn anonymous(&self) -> &'static str {
        Self::ANONYMOUS
    }

    fn none(&self) -> Option<&'static str> {
        None
    }

    fn has_reference_properties(&self) -> bool {
        true
    }

    fn marks_reference_parameters(&self) -> bool {
        false
    }

    fn requires_to(&self) -> bool {
        true
    }

    fn header_required_fault(&self) -> (&'static str, &'static str) {
        (
            "MessageInformationHeaderRequired",
            "A required message information header, To, MessageID, or Action, is not present.",
        )
    }

    fn invalid_header_fault(&self) -> (&'static str, &'static str) {
        (
            "InvalidMessageInformationHeader",
            "A message information header is not valid and the message cannot be processed.",
        )
    }

    fn default_reply_to(&self, from: Option<&EndpointReference>) -> Option<EndpointReference> {
        from.cloned()
    }
}

/// The W3C recommendation (2005/08).
#[derive(Debug, Clone, Copy, Default)]
pub struct Addressing10;

impl Addressing10 {
    /// The 1.0 namespace.
    pub const NAMESPACE: &'static str = "http://www.w3.org/2005/08/addressing";
    /// The 1.0 anonymous address.
    pub const ANONYMOUS: &'static str = "http://www.w3.org/2005/08/addressing/anonymous";
    /// The 1.0 none address.
    pub const NONE: &'static str = "http://www.w3.org/2005/08/addressing/none";

    fn anonymous_uri() -> AddressingUri {
        AddressingUri::from_known(Self::ANONYMOUS.to_string())
    }
}

impl AddressingVersion for Addressing10 {
    fn name(&self) -> &'static str {
        "1.0"
    }

    fn namespace(&self) -> &'static str {
        Self::NAMESPACE
    }

    fn anonymous(&self) -> &'static str {
        Self::ANONYMOUS
    }

    fn none(&self) -> Option<&'static str> {
        Some(Self::NONE)
    }

    fn has_reference_properties(&self) -> bool {
        false
    }

    fn marks_reference_parameters(&self) -> bool {
        true
    }

    fn requires_to(&self) -> bool {
        false
    }

    fn header_required_fault(&self) -> (&'static str, &'static str) {
        (
            "MessageAddressingHeaderRequired",
            "A required header representing a Message Addressing Property is not present",
        )
    }

    fn invalid_header_fault(&self) -> (&'static str, &'static str) {
        (
            "InvalidAddressingHeader",
            "A header representing a Message Addressing Property is not valid and the message cannot be processed",
        )
    }

    fn default_to(&self) -> Option<AddressingUri> {
        Some(Self::anonymous_uri())
    }

    fn default_reply_to(&self, _from: Option<&EndpointReference>) -> Option<EndpointReference> {
        Some(EndpointReference::new(Self::anonymous_uri()))
    }
}

/// Names an addressing version in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressingVersionKind {
    /// The August 2004 member submission.
    #[serde(rename = "2004/08")]
    V200408,
    /// The W3C recommendation.
    #[serde(rename = "1.0")]
    V10,
}

impl AddressingVersionKind {
    /// Versions tried by default, in order.
    pub const DEFAULT_ORDER: [Self; 2] = [Self::V200408, Self::V10];

    /// Returns the version implementation.
    pub fn version(self) -> BoxedAddressingVersion {
        match self {
            Self::V200408 => Arc::new(Addressing200408),
            Self::V10 => Arc::new(Addressing10),
        }
    }
}

impl fmt::Display for AddressingVersionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V200408 => f.write_str("2004/08"),
            Self::V10 => f.write_str("1.0"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::fixtures::{self, ECHO_NAMESPACE};
    use herald_core::{MessageFactory, TreeMessageFactory};

    fn parse(envelope: &str) -> SoapMessage {
        TreeMessageFactory::default()
            .create_message_from(&Default::default(), bytes::Bytes::copy_from_slice(envelope.as_bytes()))
            .unwrap()
    }

    fn envelope10(headers: &str) -> String {
        format!(
            r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope" xmlns:wsa="{}">
<env:Header>{headers}</env:Header><env:Body><e:Ping xmlns:e="urn:herald:echo"/></env:Body></env:Envelope>"#,
            Addressing10::NAMESPACE
        )
    }

    #[test]
    fn test_parse_10_request() {
        let message = parse(fixtures::SOAP12_ADDRESSING10_REQUEST);
        let version = Addressing10;
        assert!(version.applies_to(&message));
        assert!(!Addressing200408.applies_to(&message));

        let map = version.properties(&message).unwrap();
        assert_eq!(map.action().unwrap().as_str(), "urn:herald:echo:Echo");
        assert_eq!(
            map.message_id().unwrap().as_str(),
            "urn:uuid:21363e0d-2645-4eb7-8afd-2f5ee1bb25cf"
        );
        let reply_to = map.reply_to().unwrap();
        assert!(version.is_anonymous(reply_to));
        assert_eq!(reply_to.reference_parameters().len(), 1);
        assert_eq!(QName::of(&reply_to.reference_parameters()[0]), QName::new(ECHO_NAMESPACE, "Session"));
        assert_eq!(map.fault_to(), map.reply_to());
        version.validate(&map, false).unwrap();
    }

    #[test]
    fn test_parse_200408_request() {
        let message = parse(fixtures::SOAP11_ADDRESSING200408_REQUEST);
        let version = Addressing200408;
        let map = version.properties(&message).unwrap();
        assert!(map.to().is_some());
        assert!(version.is_anonymous(map.reply_to().unwrap()));
        version.validate(&map, false).unwrap();
    }

    #[test]
    fn test_defaults_10() {
        let message = parse(&envelope10("<wsa:Action>urn:a</wsa:Action>"));
        let map = Addressing10.properties(&message).unwrap();
        assert_eq!(map.to().unwrap().as_str(), Addressing10::ANONYMOUS);
        assert_eq!(map.reply_to().unwrap().address().as_str(), Addressing10::ANONYMOUS);
    }

    #[test]
    fn test_defaults_200408_reply_to_is_from() {
        let message = parse(&format!(
            r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns:wsa="{ns}">
<soapenv:Header><wsa:Action>urn:a</wsa:Action>
<wsa:From><wsa:Address>http://client.example/</wsa:Address></wsa:From></soapenv:Header>
<soapenv:Body/></soapenv:Envelope>"#,
            ns = Addressing200408::NAMESPACE
        ));
        let map = Addressing200408.properties(&message).unwrap();
        assert!(map.to().is_none());
        assert_eq!(map.reply_to().unwrap().address().as_str(), "http://client.example/");
        assert_eq!(map.fault_to(), map.reply_to());
    }

    #[test]
    fn test_validation_required_sets() {
        let message = parse(&envelope10("<wsa:Action>urn:a</wsa:Action>"));
        let map = Addressing10.properties(&message).unwrap();
        let err = Addressing10.validate(&map, false).unwrap_err();
        assert!(matches!(err, AddressingError::MissingHeader { header: "MessageID" }));
        Addressing10.validate(&map, true).unwrap();

        let no_action = MessageAddressingProperties::new();
        assert!(matches!(
            Addressing10.validate(&no_action, true),
            Err(AddressingError::MissingHeader { header: "Action" })
        ));
        assert!(matches!(
            Addressing200408.validate(&no_action, true),
            Err(AddressingError::MissingHeader { header: "To" })
        ));
    }

    #[test]
    fn test_malformed_headers() {
        let bad_uri = parse(&envelope10("<wsa:Action>not a uri</wsa:Action>"));
        assert!(matches!(
            Addressing10.properties(&bad_uri),
            Err(AddressingError::InvalidHeader { .. })
        ));

        let twice = parse(&envelope10("<wsa:Action>urn:a</wsa:Action><wsa:Action>urn:b</wsa:Action>"));
        assert!(matches!(Addressing10.properties(&twice), Err(AddressingError::InvalidHeader { .. })));

        let no_address = parse(&envelope10("<wsa:Action>urn:a</wsa:Action><wsa:ReplyTo/>"));
        assert!(matches!(
            Addressing10.properties(&no_address),
            Err(AddressingError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn test_emission_order_and_marking() {
        let message = parse(fixtures::SOAP12_ADDRESSING10_REQUEST);
        let version = Addressing10;
        let request = version.properties(&message).unwrap();
        let target = request.reply_to().unwrap().clone();
        let reply = request.reply_properties(
            &target,
            AddressingUri::parse("urn:herald:echo:EchoResponse").ok(),
            AddressingUri::parse("urn:uuid:00000000-0000-7000-8000-000000000001").ok(),
        );

        let mut response = SoapMessage::new(SoapVersion::Soap12);
        version.add_addressing_headers(&mut response, &reply);
        let names: Vec<&str> = response
            .header()
            .elements()
            .iter()
            .map(|h| h.name().local_name())
            .collect();
        assert_eq!(names, ["To", "Action", "MessageID", "RelatesTo", "Session"]);
        assert!(response.header().elements()[0].must_understand());
        let session = response.header().elements()[4].element();
        let marker = QName::new(version.namespace(), IS_REFERENCE_PARAMETER);
        assert_eq!(xml::attribute(session, &marker), Some("true"));
        assert!(xml::attribute(&reply.reference_parameters()[0], &marker).is_none());
    }

    #[test]
    fn test_faults_follow_soap_version() {
        let v11 = Addressing10.header_required(SoapVersion::Soap11);
        assert_eq!(
            v11.code(),
            &FaultCode::Custom(QName::new(Addressing10::NAMESPACE, "MessageAddressingHeaderRequired"))
        );
        assert_eq!(v11.locale(), Some("en"));
        v11.validate(SoapVersion::Soap11).unwrap();

        let v12 = Addressing200408.invalid_header(SoapVersion::Soap12);
        assert_eq!(v12.code(), &FaultCode::ClientOrSender);
        assert_eq!(
            v12.subcodes(),
            [QName::new(Addressing200408::NAMESPACE, "InvalidMessageInformationHeader")]
        );
        v12.validate(SoapVersion::Soap12).unwrap();
    }

    #[test]
    fn test_version_kind_serde() {
        let kinds: Vec<AddressingVersionKind> = serde_json::from_str(r#"["1.0", "2004/08"]"#).unwrap();
        assert_eq!(kinds, [AddressingVersionKind::V10, AddressingVersionKind::V200408]);
        assert_eq!(AddressingVersionKind::V10.version().namespace(), Addressing10::NAMESPACE);
        assert_eq!(AddressingVersionKind::V200408.to_string(), "2004/08");
    }
}
