//! Session-scoped addressing state.

use crate::map::MessageAddressingProperties;
use crate::strategy::{BoxedMessageIdStrategy, UuidMessageIdStrategy};
use crate::uri::AddressingUri;
use crate::version::BoxedAddressingVersion;
use crate::AddressingResult;
use herald_core::SoapMessage;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// Remembers the most recent request's addressing properties and decorates
/// replies from them.
///
/// The slot holds a single request. Two exchanges sharing one session
/// overwrite each other's properties, so a session must not be used by
/// concurrent or reentrant exchanges. The stateless [`AddressingInterceptor`]
/// is the default; use this only for one logical conversation at a time.
///
/// [`AddressingInterceptor`]: crate::AddressingInterceptor
#[derive(Debug)]
pub struct AddressingSession {
    version: BoxedAddressingVersion,
    id_strategy: BoxedMessageIdStrategy,
    last_request: Mutex<Option<MessageAddressingProperties>>,
}

impl AddressingSession {
    /// Creates an empty session for `version`.
    pub fn new(version: BoxedAddressingVersion) -> Self {
        Self {
            version,
            id_strategy: Arc::new(UuidMessageIdStrategy),
            last_request: Mutex::new(None),
        }
    }

    /// Sets the strategy producing reply message ids.
    #[must_use]
    pub fn with_id_strategy(mut self, id_strategy: BoxedMessageIdStrategy) -> Self {
        self.id_strategy = id_strategy;
        self
    }

    /// Reads and validates the request's properties and stores them,
    /// replacing whatever the session held.
    pub fn record_request(&self, request: &SoapMessage) -> AddressingResult<MessageAddressingProperties> {
        let map = self.version.properties(request)?;
        self.version.validate(&map, false)?;
        debug!(version = self.version.name(), message_id = ?map.message_id().map(AddressingUri::as_str), "session request recorded");
        *self.last_request.lock() = Some(map.clone());
        Ok(map)
    }

    /// Returns the stored request properties.
    pub fn last_request(&self) -> Option<MessageAddressingProperties> {
        self.last_request.lock().clone()
    }

    /// Forgets the stored request.
    pub fn clear(&self) {
        *self.last_request.lock() = None;
    }

    /// Adds reply headers derived from the stored request to `reply`.
    ///
    /// Returns `None` and leaves `reply` untouched when nothing is stored or
    /// the stored request has no usable reply target.
    pub fn decorate_reply(
        &self,
        reply: &mut SoapMessage,
        action: Option<AddressingUri>,
        is_fault: bool,
    ) -> Option<MessageAddressingProperties> {
        let slot = self.last_request.lock();
        let request = slot.as_ref()?;
        let target = if is_fault { request.fault_to() } else { request.reply_to() };
        let target = target.filter(|epr| !self.version.is_none(epr))?;
        let reply_map = request.reply_properties(target, action, Some(self.id_strategy.new_message_id()));
        self.version.add_addressing_headers(reply, &reply_map);
        Some(reply_map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::{Addressing10, AddressingVersion};
    use herald_core::{fixtures, MessageFactory, QName, SoapVersion, TreeMessageFactory};

    fn request(envelope: &str) -> SoapMessage {
        TreeMessageFactory::default()
            .create_message_from(&Default::default(), bytes::Bytes::copy_from_slice(envelope.as_bytes()))
            .unwrap()
    }

    #[test]
    fn test_reply_relates_to_recorded_request() {
        let session = AddressingSession::new(Arc::new(Addressing10));
        let recorded = session
            .record_request(&request(fixtures::SOAP12_ADDRESSING10_REQUEST))
            .unwrap();

        let mut reply = SoapMessage::new(SoapVersion::Soap12);
        let action = AddressingUri::parse("urn:herald:echo:EchoResponse").unwrap();
        let reply_map = session.decorate_reply(&mut reply, Some(action), false).unwrap();
        assert_eq!(reply_map.relates_to(), recorded.message_id());

        let read = Addressing10.properties(&reply).unwrap();
        assert_eq!(read.relates_to(), recorded.message_id());
        let session_param = QName::new(fixtures::ECHO_NAMESPACE, "Session");
        assert_eq!(reply.header().elements_named(&session_param).count(), 1);
    }

    #[test]
    fn test_latest_request_wins() {
        let session = AddressingSession::new(Arc::new(Addressing10));
        session
            .record_request(&request(fixtures::SOAP12_ADDRESSING10_REQUEST))
            .unwrap();
        let second = fixtures::SOAP12_ADDRESSING10_REQUEST.replace(
            "urn:uuid:21363e0d-2645-4eb7-8afd-2f5ee1bb25cf",
            "urn:uuid:00000000-0000-0000-0000-000000000002",
        );
        session.record_request(&request(&second)).unwrap();
        let stored = session.last_request().unwrap();
        assert_eq!(
            stored.message_id().map(AddressingUri::as_str),
            Some("urn:uuid:00000000-0000-0000-0000-000000000002")
        );
    }

    #[test]
    fn test_invalid_request_keeps_previous_state() {
        let session = AddressingSession::new(Arc::new(Addressing10));
        let without_id = fixtures::SOAP12_ADDRESSING10_REQUEST.replace(
            "<wsa:MessageID>urn:uuid:21363e0d-2645-4eb7-8afd-2f5ee1bb25cf</wsa:MessageID>",
            "",
        );
        let err = session.record_request(&request(&without_id)).unwrap_err();
        assert!(err.is_missing_header());
        assert!(session.last_request().is_none());
    }

    #[test]
    fn test_empty_session_leaves_reply_alone() {
        let session = AddressingSession::new(Arc::new(Addressing10));
        let mut reply = SoapMessage::new(SoapVersion::Soap12);
        assert!(session.decorate_reply(&mut reply, None, false).is_none());
        assert!(reply.header().is_empty());

        session
            .record_request(&request(fixtures::SOAP12_ADDRESSING10_REQUEST))
            .unwrap();
        session.clear();
        assert!(session.decorate_reply(&mut reply, None, true).is_none());
    }
}
