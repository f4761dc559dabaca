//! Exchange context.
//!
//! A [`MessageContext`] is created by the transport for one request/response
//! exchange and flows through mappings, interceptors and the endpoint.

use crate::factory::MessageFactory;
use crate::message::SoapMessage;
use http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// A time-ordered identifier for one exchange, using UUID v7.
///
/// # Example
///
/// ```
/// use herald_core::ExchangeId;
///
/// let first = ExchangeId::new();
/// let second = ExchangeId::new();
/// assert!(first.as_uuid() <= second.as_uuid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeId(Uuid);

impl ExchangeId {
    /// Creates a fresh identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wraps an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ExchangeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ExchangeId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

type Property = Box<dyn Any + Send + Sync>;

/// Per-exchange state: the request, the lazily created response, transport
/// headers and a property bag.
pub struct MessageContext {
    exchange_id: ExchangeId,
    request: SoapMessage,
    response: Option<SoapMessage>,
    factory: Arc<dyn MessageFactory>,
    transport_headers: HeaderMap,
    properties: HashMap<String, Property>,
    started_at: Instant,
}

impl MessageContext {
    /// Creates a context around a parsed request.
    pub fn new(request: SoapMessage, factory: Arc<dyn MessageFactory>) -> Self {
        Self {
            exchange_id: ExchangeId::new(),
            request,
            response: None,
            factory,
            transport_headers: HeaderMap::new(),
            properties: HashMap::new(),
            started_at: Instant::now(),
        }
    }

    /// Attaches the transport headers the request arrived with.
    #[must_use]
    pub fn with_transport_headers(mut self, headers: HeaderMap) -> Self {
        self.transport_headers = headers;
        self
    }

    /// Returns the exchange identifier.
    pub fn exchange_id(&self) -> ExchangeId {
        self.exchange_id
    }

    /// Returns the inbound message.
    pub fn request(&self) -> &SoapMessage {
        &self.request
    }

    /// Returns the factory that parsed the request.
    pub fn factory(&self) -> &Arc<dyn MessageFactory> {
        &self.factory
    }

    /// Returns the response if one has been created.
    pub fn response(&self) -> Option<&SoapMessage> {
        self.response.as_ref()
    }

    /// Returns the response, creating an empty one in the request's SOAP
    /// version on first use.
    pub fn response_mut(&mut self) -> &mut SoapMessage {
        let version = self.request.version();
        let factory = &self.factory;
        self.response
            .get_or_insert_with(|| factory.create_message(version))
    }

    /// Returns true once a response exists, even an empty one.
    pub fn has_response(&self) -> bool {
        self.response.is_some()
    }

    /// Discards the response, turning the exchange one-way.
    pub fn clear_response(&mut self) {
        self.response = None;
    }

    /// Removes and returns the response.
    pub fn take_response(&mut self) -> Option<SoapMessage> {
        self.response.take()
    }

    /// Returns the transport headers.
    pub fn transport_headers(&self) -> &HeaderMap {
        &self.transport_headers
    }

    /// Stores a property, replacing any previous value under `name`.
    pub fn set_property<T: Any + Send + Sync>(&mut self, name: impl Into<String>, value: T) {
        self.properties.insert(name.into(), Box::new(value));
    }

    /// Returns a property if present and of type `T`.
    pub fn property<T: Any + Send + Sync>(&self, name: &str) -> Option<&T> {
        self.properties.get(name).and_then(|value| value.downcast_ref())
    }

    /// Removes a property, returning whether it existed.
    pub fn remove_property(&mut self, name: &str) -> bool {
        self.properties.remove(name).is_some()
    }

    /// Returns the stored property names.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Returns the time since the context was created.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

impl fmt::Debug for MessageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageContext")
            .field("exchange_id", &self.exchange_id)
            .field("request", &self.request)
            .field("response", &self.response)
            .field("properties", &self.properties.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
