//! Message addressing properties.

use crate::epr::EndpointReference;
use crate::uri::AddressingUri;
use xmltree::Element;

/// The addressing property set of one message.
///
/// Values are immutable once built; replies get a fresh set from
/// [`reply_properties`](Self::reply_properties).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageAddressingProperties {
    to: Option<AddressingUri>,
    from: Option<EndpointReference>,
    reply_to: Option<EndpointReference>,
    fault_to: Option<EndpointReference>,
    action: Option<AddressingUri>,
    message_id: Option<AddressingUri>,
    relates_to: Option<AddressingUri>,
    reference_properties: Vec<Element>,
    reference_parameters: Vec<Element>,
}

impl MessageAddressingProperties {
    /// Creates an empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the destination.
    #[must_use]
    pub fn with_to(mut self, to: AddressingUri) -> Self {
        self.to = Some(to);
        self
    }

    /// Sets the source reference.
    #[must_use]
    pub fn with_from(mut self, from: EndpointReference) -> Self {
        self.from = Some(from);
        self
    }

    /// Sets the reply destination.
    #[must_use]
    pub fn with_reply_to(mut self, reply_to: EndpointReference) -> Self {
        self.reply_to = Some(reply_to);
        self
    }

    /// Sets the fault destination.
    #[must_use]
    pub fn with_fault_to(mut self, fault_to: EndpointReference) -> Self {
        self.fault_to = Some(fault_to);
        self
    }

    /// Sets the action.
    #[must_use]
    pub fn with_action(mut self, action: AddressingUri) -> Self {
        self.action = Some(action);
        self
    }

    /// Sets the message id.
    #[must_use]
    pub fn with_message_id(mut self, message_id: AddressingUri) -> Self {
        self.message_id = Some(message_id);
        self
    }

    /// Sets the id of the message this one relates to.
    #[must_use]
    pub fn with_relates_to(mut self, relates_to: AddressingUri) -> Self {
        self.relates_to = Some(relates_to);
        self
    }

    pub(crate) fn with_optional_to(mut self, to: Option<AddressingUri>) -> Self {
        self.to = to;
        self
    }

    pub(crate) fn with_optional_reply_to(mut self, reply_to: Option<EndpointReference>) -> Self {
        self.reply_to = reply_to;
        self
    }

    pub(crate) fn with_optional_fault_to(mut self, fault_to: Option<EndpointReference>) -> Self {
        self.fault_to = fault_to;
        self
    }

    /// Returns the destination.
    pub fn to(&self) -> Option<&AddressingUri> {
        self.to.as_ref()
    }

    /// Returns the source reference.
    pub fn from(&self) -> Option<&EndpointReference> {
        self.from.as_ref()
    }

    /// Returns the reply destination.
    pub fn reply_to(&self) -> Option<&EndpointReference> {
        self.reply_to.as_ref()
    }

    /// Returns the fault destination.
    pub fn fault_to(&self) -> Option<&EndpointReference> {
        self.fault_to.as_ref()
    }

    /// Returns the action.
    pub fn action(&self) -> Option<&AddressingUri> {
        self.action.as_ref()
    }

    /// Returns the message id.
    pub fn message_id(&self) -> Option<&AddressingUri> {
        self.message_id.as_ref()
    }

    /// Returns the related message id.
    pub fn relates_to(&self) -> Option<&AddressingUri> {
        self.relates_to.as_ref()
    }

    /// Returns the reference properties addressed to this message.
    pub fn reference_properties(&self) -> &[Element] {
        &self.reference_properties
    }

    /// Returns the reference parameters addressed to this message.
    pub fn reference_parameters(&self) -> &[Element] {
        &self.reference_parameters
    }

    /// Derives the properties of a reply to this message.
    ///
    /// The reply goes to `target`'s address and carries its reference
    /// properties and parameters unchanged; its relates-to is this message's
    /// id. Use the reply-to reference for responses and the fault-to
    /// reference for faults. The result depends on the four inputs only.
    ///
    /// ```
    /// use herald_addressing::{AddressingUri, EndpointReference, MessageAddressingProperties};
    ///
    /// let uri = |s: &str| AddressingUri::parse(s).unwrap();
    /// let request = MessageAddressingProperties::new()
    ///     .with_action(uri("urn:orders:Place"))
    ///     .with_message_id(uri("urn:uuid:0001"));
    /// let target = EndpointReference::new(uri("http://client.example/replies"));
    ///
    /// let reply = request.reply_properties(
    ///     &target,
    ///     Some(uri("urn:orders:PlaceResponse")),
    ///     Some(uri("urn:uuid:0002")),
    /// );
    /// assert_eq!(reply.to().unwrap().as_str(), "http://client.example/replies");
    /// assert_eq!(reply.relates_to().unwrap().as_str(), "urn:uuid:0001");
    /// ```
    pub fn reply_properties(
        &self,
        target: &EndpointReference,
        action: Option<AddressingUri>,
        message_id: Option<AddressingUri>,
    ) -> Self {
        Self {
            to: Some(target.address().clone()),
            from: None,
            reply_to: None,
            fault_to: None,
            action,
            message_id,
            relates_to: self.message_id.clone(),
            reference_properties: target.reference_properties().to_vec(),
            reference_parameters: target.reference_parameters().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::QName;
    use proptest::prelude::*;

    fn uri(text: &str) -> AddressingUri {
        AddressingUri::parse(text).unwrap()
    }

    fn session(value: &str) -> Element {
        herald_core::xml::text_element(&QName::new("urn:herald:echo", "Session"), value)
    }

    #[test]
    fn test_reply_copies_target_metadata() {
        let request = MessageAddressingProperties::new()
            .with_to(uri("http://server.example/orders"))
            .with_action(uri("urn:orders:Place"))
            .with_message_id(uri("urn:uuid:1"))
            .with_relates_to(uri("urn:uuid:0"));
        let target = EndpointReference::new(uri("http://client.example/replies"))
            .with_reference_parameters(vec![session("42")])
            .with_reference_properties(vec![session("p")]);

        let reply = request.reply_properties(&target, Some(uri("urn:orders:PlaceResponse")), None);
        assert_eq!(reply.to(), Some(target.address()));
        assert_eq!(reply.relates_to(), request.message_id());
        assert_eq!(reply.reference_parameters(), target.reference_parameters());
        assert_eq!(reply.reference_properties(), target.reference_properties());
        assert!(reply.message_id().is_none());
        assert!(reply.reply_to().is_none());
    }

    #[test]
    fn test_reply_without_request_id_has_no_relation() {
        let request = MessageAddressingProperties::new().with_action(uri("urn:a"));
        let target = EndpointReference::new(uri("http://client.example"));
        assert!(request.reply_properties(&target, None, None).relates_to().is_none());
    }

    proptest! {
        #[test]
        fn test_reply_derivation_is_pure(
            request_id in "[a-f0-9]{8}",
            reply_id in "[a-f0-9]{8}",
            host in "[a-z]{1,12}",
            param in "[a-zA-Z0-9]{0,16}",
        ) {
            let request = MessageAddressingProperties::new()
                .with_action(uri("urn:orders:Place"))
                .with_message_id(uri(&format!("urn:uuid:{request_id}")));
            let target = EndpointReference::new(uri(&format!("http://{host}.example/")))
                .with_reference_parameters(vec![session(&param)]);
            let action = Some(uri("urn:orders:PlaceResponse"));
            let message_id = Some(uri(&format!("urn:uuid:{reply_id}")));

            let first = request.reply_properties(&target, action.clone(), message_id.clone());
            let second = request.reply_properties(&target, action, message_id);
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.relates_to(), request.message_id());
        }
    }
}
