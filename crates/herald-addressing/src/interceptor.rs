//! Server-side addressing interceptor.

use crate::epr::EndpointReference;
use crate::error::AddressingError;
use crate::sender::{sender_for, BoxedMessageSender};
use crate::strategy::{BoxedMessageIdStrategy, UuidMessageIdStrategy};
use crate::uri::AddressingUri;
use crate::version::BoxedAddressingVersion;
use herald_core::{EndpointFailure, FailureType, MessageContext, SoapFault, SoapHeaderElement, FAILURE};
use herald_dispatch::{Endpoint, EndpointInterceptor};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Failure type of out-of-band delivery errors.
pub static ADDRESSING_FAILURE: FailureType = FailureType::extends("AddressingFailure", &FAILURE);

/// Validates request addressing headers and addresses the reply.
///
/// The pre-hook answers a missing, malformed or repeated header with the
/// version's addressing fault. The post and fault hooks derive the reply
/// properties and either keep the reply in-band (anonymous target), drop it
/// (no target or the none address), or hand it to a [`MessageSender`].
///
/// [`MessageSender`]: crate::MessageSender
#[derive(Clone)]
pub struct AddressingInterceptor {
    version: BoxedAddressingVersion,
    id_strategy: BoxedMessageIdStrategy,
    senders: Arc<[BoxedMessageSender]>,
    reply_action: Option<AddressingUri>,
    fault_action: Option<AddressingUri>,
    message_id_optional: bool,
}

impl AddressingInterceptor {
    /// Creates an interceptor for `version` with UUID message ids.
    pub fn new(version: BoxedAddressingVersion) -> Self {
        Self {
            version,
            id_strategy: Arc::new(UuidMessageIdStrategy),
            senders: Arc::from(Vec::new()),
            reply_action: None,
            fault_action: None,
            message_id_optional: false,
        }
    }

    /// Sets the message id strategy.
    #[must_use]
    pub fn with_id_strategy(mut self, id_strategy: BoxedMessageIdStrategy) -> Self {
        self.id_strategy = id_strategy;
        self
    }

    /// Sets the out-of-band senders, tried in order.
    #[must_use]
    pub fn with_senders(mut self, senders: Arc<[BoxedMessageSender]>) -> Self {
        self.senders = senders;
        self
    }

    /// Sets the action of normal replies.
    #[must_use]
    pub fn with_reply_action(mut self, action: Option<AddressingUri>) -> Self {
        self.reply_action = action;
        self
    }

    /// Sets the action of fault replies.
    #[must_use]
    pub fn with_fault_action(mut self, action: Option<AddressingUri>) -> Self {
        self.fault_action = action;
        self
    }

    /// Waives the `MessageID` requirement.
    #[must_use]
    pub fn message_id_optional(mut self, optional: bool) -> Self {
        self.message_id_optional = optional;
        self
    }

    /// Returns the addressing version.
    pub fn version(&self) -> &BoxedAddressingVersion {
        &self.version
    }

    fn request_fault(&self, ctx: &MessageContext) -> Option<SoapFault> {
        let request = ctx.request();
        let soap_version = request.version();
        let checked = self
            .version
            .properties(request)
            .and_then(|map| self.version.validate(&map, self.message_id_optional).map(|()| map));
        match checked {
            Ok(map) => match map.message_id() {
                Some(id) if self.id_strategy.is_duplicate(id) => {
                    let err = AddressingError::DuplicateMessageId {
                        message_id: id.to_string(),
                    };
                    warn!(exchange_id = %ctx.exchange_id(), error = %err, "rejecting addressed request");
                    Some(self.version.invalid_header(soap_version))
                }
                _ => None,
            },
            Err(err) => {
                warn!(
                    exchange_id = %ctx.exchange_id(),
                    version = self.version.name(),
                    error = %err,
                    "rejecting addressed request"
                );
                Some(if err.is_missing_header() {
                    self.version.header_required(soap_version)
                } else {
                    self.version.invalid_header(soap_version)
                })
            }
        }
    }

    /// Addresses the response. Returns true when it stays in-band.
    ///
    /// The fault path only acts once the response carries a fault; before a
    /// resolver has written one there is nothing to address.
    fn route_reply(&self, ctx: &mut MessageContext, is_fault: bool) -> Result<bool, EndpointFailure> {
        match ctx.response() {
            None => return Ok(true),
            Some(response) if is_fault && !response.has_fault() => return Ok(true),
            Some(_) => {}
        }
        let map = match self.version.properties(ctx.request()) {
            Ok(map) => map,
            Err(err) => {
                debug!(exchange_id = %ctx.exchange_id(), error = %err, "request properties unreadable; reply left as is");
                return Ok(true);
            }
        };
        let target = if is_fault { map.fault_to() } else { map.reply_to() };
        let Some(target) = target.filter(|epr| !self.version.is_none(epr)).cloned() else {
            debug!(exchange_id = %ctx.exchange_id(), "request has no reply address; reply discarded");
            ctx.clear_response();
            return Ok(false);
        };

        let action = if is_fault {
            self.fault_action.clone()
        } else {
            self.reply_action.clone()
        };
        let message_id = self.id_strategy.new_message_id();
        debug!(
            exchange_id = %ctx.exchange_id(),
            message_id = %message_id,
            action = action.as_ref().map_or("-", AddressingUri::as_str),
            "addressing reply"
        );
        let reply_map = map.reply_properties(&target, action, Some(message_id));
        self.version.add_addressing_headers(ctx.response_mut(), &reply_map);

        if self.version.is_anonymous(&target) {
            return Ok(true);
        }
        self.send_out_of_band(ctx, &target)?;
        Ok(false)
    }

    fn send_out_of_band(&self, ctx: &mut MessageContext, target: &EndpointReference) -> Result<(), EndpointFailure> {
        let address = target.address();
        let Some(sender) = sender_for(&self.senders, address) else {
            warn!(
                exchange_id = %ctx.exchange_id(),
                address = %address,
                "no message sender supports the reply address; reply discarded"
            );
            ctx.clear_response();
            return Ok(());
        };
        debug!(exchange_id = %ctx.exchange_id(), address = %address, sender = sender.name(), "sending out-of-band reply");
        let result = match ctx.response() {
            Some(response) => sender.send(address, response),
            None => Ok(()),
        };
        ctx.clear_response();
        result.map_err(|err| {
            EndpointFailure::new(&ADDRESSING_FAILURE, format!("failed to send reply to {address}"))
                .with_source(AddressingError::send_failed(address.as_str(), err))
        })
    }
}

impl EndpointInterceptor for AddressingInterceptor {
    fn name(&self) -> &str {
        "addressing"
    }

    fn handle_request(&self, ctx: &mut MessageContext, _endpoint: &dyn Endpoint) -> Result<bool, EndpointFailure> {
        match self.request_fault(ctx) {
            None => Ok(true),
            Some(fault) => {
                ctx.response_mut().add_fault(fault)?;
                Ok(false)
            }
        }
    }

    fn handle_response(&self, ctx: &mut MessageContext, _endpoint: &dyn Endpoint) -> Result<(), EndpointFailure> {
        self.route_reply(ctx, false).map(|_| ())
    }

    fn handle_fault(&self, ctx: &mut MessageContext, _endpoint: &dyn Endpoint) -> Result<bool, EndpointFailure> {
        self.route_reply(ctx, true)
    }

    fn understands(&self, header: &SoapHeaderElement) -> bool {
        self.version.understands(header)
    }
}

impl fmt::Debug for AddressingInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddressingInterceptor")
            .field("version", &self.version.name())
            .field("senders", &self.senders.len())
            .field("reply_action", &self.reply_action)
            .field("fault_action", &self.fault_action)
            .field("message_id_optional", &self.message_id_optional)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::MemoryMessageIdStrategy;
    use crate::version::{Addressing10, Addressing200408, AddressingVersion};
    use crate::MessageSender;
    use herald_core::fixtures::{self, ECHO_NAMESPACE};
    use herald_core::{FaultCode, MessageFactory, QName, SoapMessage, TreeMessageFactory};
    use parking_lot::Mutex;

    fn context(envelope: &str) -> MessageContext {
        let factory: Arc<dyn MessageFactory> = Arc::new(TreeMessageFactory::default());
        let request = factory
            .create_message_from(&Default::default(), bytes::Bytes::copy_from_slice(envelope.as_bytes()))
            .unwrap();
        MessageContext::new(request, factory)
    }

    struct Noop;

    impl Endpoint for Noop {
        fn name(&self) -> &str {
            "noop"
        }

        fn invoke(&self, _ctx: &mut MessageContext) -> Result<(), EndpointFailure> {
            Ok(())
        }
    }

    fn uri(text: &str) -> AddressingUri {
        AddressingUri::parse(text).unwrap()
    }

    fn interceptor10() -> AddressingInterceptor {
        AddressingInterceptor::new(Arc::new(Addressing10))
            .with_reply_action(Some(uri("urn:herald:echo:EchoResponse")))
            .with_fault_action(Some(uri("urn:herald:echo:EchoFault")))
    }

    fn with_reply_to(address: &str) -> String {
        fixtures::SOAP12_ADDRESSING10_REQUEST.replace(
            "<wsa:Address>http://www.w3.org/2005/08/addressing/anonymous</wsa:Address>",
            &format!("<wsa:Address>{address}</wsa:Address>"),
        )
    }

    #[derive(Default)]
    struct Outbox {
        sent: Mutex<Vec<(String, Vec<u8>)>>,
    }

    impl MessageSender for Outbox {
        fn name(&self) -> &str {
            "outbox"
        }

        fn supports(&self, uri: &AddressingUri) -> bool {
            uri.as_str().starts_with("http://client.example/")
        }

        fn send(&self, uri: &AddressingUri, message: &SoapMessage) -> anyhow::Result<()> {
            let bytes = message.to_bytes()?;
            self.sent.lock().push((uri.to_string(), bytes));
            Ok(())
        }
    }

    #[test]
    fn test_valid_request_passes() {
        let mut ctx = context(fixtures::SOAP12_ADDRESSING10_REQUEST);
        assert!(interceptor10().handle_request(&mut ctx, &Noop).unwrap());
        assert!(!ctx.has_response());
    }

    #[test]
    fn test_missing_message_id_faults_unless_optional() {
        let envelope = fixtures::SOAP12_ADDRESSING10_REQUEST.replace(
            "<wsa:MessageID>urn:uuid:21363e0d-2645-4eb7-8afd-2f5ee1bb25cf</wsa:MessageID>",
            "",
        );
        let mut ctx = context(&envelope);
        assert!(!interceptor10().handle_request(&mut ctx, &Noop).unwrap());
        let fault = ctx.response().unwrap().fault().unwrap();
        assert_eq!(fault.code(), &FaultCode::ClientOrSender);
        assert_eq!(fault.subcodes()[0].local_name(), "MessageAddressingHeaderRequired");

        let mut ctx = context(&envelope);
        let optional = interceptor10().message_id_optional(true);
        assert!(optional.handle_request(&mut ctx, &Noop).unwrap());
    }

    #[test]
    fn test_malformed_header_gets_invalid_fault() {
        let envelope = fixtures::SOAP11_ADDRESSING200408_REQUEST.replace("http://example.com/echo", "::bad::");
        let mut ctx = context(&envelope);
        let interceptor = AddressingInterceptor::new(Arc::new(Addressing200408));
        assert!(!interceptor.handle_request(&mut ctx, &Noop).unwrap());
        let fault = ctx.response().unwrap().fault().unwrap();
        assert_eq!(
            fault.code(),
            &FaultCode::Custom(QName::new(Addressing200408::NAMESPACE, "InvalidMessageInformationHeader"))
        );
    }

    #[test]
    fn test_duplicate_message_id_rejected() {
        let interceptor = interceptor10().with_id_strategy(Arc::new(MemoryMessageIdStrategy::default()));
        let mut first = context(fixtures::SOAP12_ADDRESSING10_REQUEST);
        assert!(interceptor.handle_request(&mut first, &Noop).unwrap());
        let mut second = context(fixtures::SOAP12_ADDRESSING10_REQUEST);
        assert!(!interceptor.handle_request(&mut second, &Noop).unwrap());
        let fault = second.response().unwrap().fault().unwrap();
        assert_eq!(fault.subcodes()[0].local_name(), "InvalidAddressingHeader");
    }

    #[test]
    fn test_anonymous_reply_stays_in_band() {
        let mut ctx = context(fixtures::SOAP12_ADDRESSING10_REQUEST);
        ctx.response_mut().set_payload(QName::new(ECHO_NAMESPACE, "EchoResponse").to_element());
        interceptor10().handle_response(&mut ctx, &Noop).unwrap();

        let response = ctx.response().unwrap();
        let map = Addressing10.properties(response).unwrap();
        assert_eq!(map.action().unwrap().as_str(), "urn:herald:echo:EchoResponse");
        assert_eq!(
            map.relates_to().unwrap().as_str(),
            "urn:uuid:21363e0d-2645-4eb7-8afd-2f5ee1bb25cf"
        );
        assert_eq!(map.to().unwrap().as_str(), Addressing10::ANONYMOUS);
        let session = QName::new(ECHO_NAMESPACE, "Session");
        assert_eq!(response.header().elements_named(&session).count(), 1);
    }

    #[test]
    fn test_none_address_discards_reply() {
        let mut ctx = context(&with_reply_to(Addressing10::NONE));
        ctx.response_mut().set_payload(QName::new(ECHO_NAMESPACE, "EchoResponse").to_element());
        interceptor10().handle_response(&mut ctx, &Noop).unwrap();
        assert!(!ctx.has_response());
    }

    #[test]
    fn test_out_of_band_reply_sent_and_cleared() {
        let outbox = Arc::new(Outbox::default());
        let senders: Arc<[BoxedMessageSender]> = Arc::from(vec![outbox.clone() as BoxedMessageSender]);
        let interceptor = interceptor10().with_senders(senders);

        let mut ctx = context(&with_reply_to("http://client.example/replies"));
        ctx.response_mut().set_payload(QName::new(ECHO_NAMESPACE, "EchoResponse").to_element());
        interceptor.handle_response(&mut ctx, &Noop).unwrap();
        assert!(!ctx.has_response());

        let sent = outbox.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "http://client.example/replies");
        let text = String::from_utf8(sent[0].1.clone()).unwrap();
        assert!(text.contains("<wsa:To"), "{text}");
        assert!(text.contains("urn:uuid:21363e0d-2645-4eb7-8afd-2f5ee1bb25cf"), "{text}");
    }

    #[test]
    fn test_unsupported_address_discards_reply() {
        let mut ctx = context(&with_reply_to("mailto:nobody@example.com"));
        ctx.response_mut().set_payload(QName::new(ECHO_NAMESPACE, "EchoResponse").to_element());
        interceptor10().handle_response(&mut ctx, &Noop).unwrap();
        assert!(!ctx.has_response());
    }

    #[test]
    fn test_fault_uses_fault_action() {
        let mut ctx = context(fixtures::SOAP12_ADDRESSING10_REQUEST);
        ctx.response_mut().add_fault(SoapFault::server("boom")).unwrap();
        assert!(interceptor10().handle_fault(&mut ctx, &Noop).unwrap());
        let map = Addressing10.properties(ctx.response().unwrap()).unwrap();
        assert_eq!(map.action().unwrap().as_str(), "urn:herald:echo:EchoFault");
    }

    #[test]
    fn test_no_response_is_left_alone() {
        let mut ctx = context(fixtures::SOAP12_ADDRESSING10_REQUEST);
        interceptor10().handle_response(&mut ctx, &Noop).unwrap();
        assert!(!ctx.has_response());
    }

    #[test]
    fn test_understands_own_namespace() {
        let interceptor = interceptor10();
        let to = SoapHeaderElement::new(QName::new(Addressing10::NAMESPACE, "To"));
        let other = SoapHeaderElement::new(QName::new(Addressing200408::NAMESPACE, "To"));
        assert!(interceptor.understands(&to));
        assert!(!interceptor.understands(&other));
    }
}
