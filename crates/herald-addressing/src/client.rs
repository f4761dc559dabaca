//! Addressing headers for outbound requests.

use crate::epr::EndpointReference;
use crate::map::MessageAddressingProperties;
use crate::strategy::{BoxedMessageIdStrategy, UuidMessageIdStrategy};
use crate::uri::AddressingUri;
use crate::version::BoxedAddressingVersion;
use herald_core::SoapMessage;
use std::sync::Arc;

/// Stamps `To`, `Action`, a fresh `MessageID` and the optional reply
/// references onto an outbound request.
///
/// ```
/// use herald_addressing::{ActionCallback, AddressingUri, AddressingVersionKind};
/// use herald_core::{SoapMessage, SoapVersion};
///
/// let callback = ActionCallback::new(
///     AddressingVersionKind::V10.version(),
///     AddressingUri::parse("urn:orders:Place").unwrap(),
///     AddressingUri::parse("http://example.com/orders").unwrap(),
/// );
/// let mut request = SoapMessage::new(SoapVersion::Soap12);
/// let map = callback.apply(&mut request);
/// assert!(map.message_id().is_some());
/// assert_eq!(request.header().elements().len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct ActionCallback {
    version: BoxedAddressingVersion,
    action: AddressingUri,
    to: AddressingUri,
    from: Option<EndpointReference>,
    reply_to: Option<EndpointReference>,
    fault_to: Option<EndpointReference>,
    id_strategy: BoxedMessageIdStrategy,
}

impl ActionCallback {
    /// Creates a callback sending `action` to `to`.
    pub fn new(version: BoxedAddressingVersion, action: AddressingUri, to: AddressingUri) -> Self {
        Self {
            version,
            action,
            to,
            from: None,
            reply_to: None,
            fault_to: None,
            id_strategy: Arc::new(UuidMessageIdStrategy),
        }
    }

    /// Sets the `From` reference.
    #[must_use]
    pub fn with_from(mut self, from: EndpointReference) -> Self {
        self.from = Some(from);
        self
    }

    /// Sets the `ReplyTo` reference.
    #[must_use]
    pub fn with_reply_to(mut self, reply_to: EndpointReference) -> Self {
        self.reply_to = Some(reply_to);
        self
    }

    /// Sets the `FaultTo` reference.
    #[must_use]
    pub fn with_fault_to(mut self, fault_to: EndpointReference) -> Self {
        self.fault_to = Some(fault_to);
        self
    }

    /// Sets the strategy producing message ids.
    #[must_use]
    pub fn with_id_strategy(mut self, id_strategy: BoxedMessageIdStrategy) -> Self {
        self.id_strategy = id_strategy;
        self
    }

    /// Returns the action.
    pub fn action(&self) -> &AddressingUri {
        &self.action
    }

    /// Returns the destination.
    pub fn to(&self) -> &AddressingUri {
        &self.to
    }

    /// Adds the headers to `message` and returns the properties written.
    pub fn apply(&self, message: &mut SoapMessage) -> MessageAddressingProperties {
        let mut map = MessageAddressingProperties::new()
            .with_to(self.to.clone())
            .with_action(self.action.clone())
            .with_message_id(self.id_strategy.new_message_id());
        if let Some(from) = &self.from {
            map = map.with_from(from.clone());
        }
        if let Some(reply_to) = &self.reply_to {
            map = map.with_reply_to(reply_to.clone());
        }
        if let Some(fault_to) = &self.fault_to {
            map = map.with_fault_to(fault_to.clone());
        }
        self.version.add_addressing_headers(message, &map);
        map
    }
}
