//! Endpoint mappings.
//!
//! A mapping inspects an exchange and returns an [`EndpointInvocationChain`]
//! or `None`. The dispatcher asks its mappings in registration order and
//! takes the first chain.
//!
//! Table-based mappings share [`LookupTable`] and [`MappingSupport`]:
//! tables are checked for duplicate and malformed keys when the mapping is
//! built and never change afterwards.

mod declarative;
mod payload_root;
mod soap_action;

pub use declarative::{
    declared_methods, DeclarativeEndpointMapping, DeclaredEndpoint, EndpointMarker, EndpointMethod,
};
pub use payload_root::PayloadRootQNameEndpointMapping;
pub use soap_action::SoapActionEndpointMapping;

use crate::chain::EndpointInvocationChain;
use crate::endpoint::{BoxedEndpoint, Endpoint, EndpointRegistry};
use crate::error::MappingError;
use crate::interceptor::BoxedInterceptor;
use herald_core::{MessageContext, MessageError};
use indexmap::IndexMap;
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;

/// Resolves the endpoint for an exchange.
pub trait EndpointMapping: Send + Sync {
    /// Returns the name used in logs.
    fn name(&self) -> &str;

    /// Returns a chain for the exchange, or `None` when this mapping has no
    /// opinion. Errors are reserved for messages that cannot be read.
    fn endpoint_for(&self, ctx: &MessageContext) -> Result<Option<EndpointInvocationChain>, MessageError>;
}

/// A shared mapping.
pub type BoxedMapping = Arc<dyn EndpointMapping>;

/// What a mapping entry points at.
#[derive(Clone)]
pub enum EndpointTarget {
    /// A concrete endpoint.
    Instance(BoxedEndpoint),
    /// An endpoint name resolved through the [`EndpointRegistry`] per request.
    Named(String),
}

impl EndpointTarget {
    /// Wraps an endpoint instance.
    pub fn instance(endpoint: impl Endpoint + 'static) -> Self {
        Self::Instance(Arc::new(endpoint))
    }

    /// Refers to a registered endpoint by name.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }
}

impl From<BoxedEndpoint> for EndpointTarget {
    fn from(endpoint: BoxedEndpoint) -> Self {
        Self::Instance(endpoint)
    }
}

impl fmt::Debug for EndpointTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance(endpoint) => f.debug_tuple("Instance").field(&endpoint.name()).finish(),
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
        }
    }
}

/// Settings shared by every mapping: its interceptors, default endpoint,
/// name registry and header targeting.
#[derive(Clone, Default)]
pub struct MappingSupport {
    interceptors: Vec<BoxedInterceptor>,
    default_endpoint: Option<EndpointTarget>,
    registry: Option<Arc<EndpointRegistry>>,
    actors_or_roles: Vec<String>,
    ultimate_receiver: Option<bool>,
}

impl MappingSupport {
    /// Creates empty settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an interceptor to every chain this mapping builds.
    pub fn add_interceptor(&mut self, interceptor: BoxedInterceptor) {
        self.interceptors.push(interceptor);
    }

    /// Sets the endpoint used when the table has no entry.
    pub fn set_default_endpoint(&mut self, target: EndpointTarget) {
        self.default_endpoint = Some(target);
    }

    /// Sets the registry used to resolve named targets.
    pub fn set_registry(&mut self, registry: Arc<EndpointRegistry>) {
        self.registry = Some(registry);
    }

    /// Sets the actors or roles recorded on built chains.
    pub fn set_actors_or_roles(&mut self, actors_or_roles: Vec<String>) {
        self.actors_or_roles = actors_or_roles;
    }

    /// Sets the ultimate-receiver flag recorded on built chains.
    pub fn set_ultimate_receiver(&mut self, ultimate_receiver: bool) {
        self.ultimate_receiver = Some(ultimate_receiver);
    }

    /// Returns the mapping's interceptors.
    pub fn interceptors(&self) -> &[BoxedInterceptor] {
        &self.interceptors
    }

    /// Returns the default endpoint target.
    pub fn default_endpoint(&self) -> Option<&EndpointTarget> {
        self.default_endpoint.as_ref()
    }

    /// Resolves a target to an instance. Unknown names are logged and
    /// treated as no match.
    pub fn resolve(&self, target: &EndpointTarget, mapping: &str) -> Option<BoxedEndpoint> {
        match target {
            EndpointTarget::Instance(endpoint) => Some(endpoint.clone()),
            EndpointTarget::Named(name) => {
                let resolved = self.registry.as_ref().and_then(|registry| registry.get(name));
                if resolved.is_none() {
                    tracing::warn!(mapping, endpoint = %name, "mapped endpoint name is not registered");
                }
                resolved
            }
        }
    }

    /// Builds a chain for `target`, falling back to the default endpoint.
    pub fn chain_for(&self, target: Option<&EndpointTarget>, mapping: &str) -> Option<EndpointInvocationChain> {
        let target = target.or(self.default_endpoint.as_ref())?;
        let endpoint = self.resolve(target, mapping)?;
        Some(self.chain(endpoint))
    }

    /// Wraps an endpoint with this mapping's interceptors and targeting.
    pub fn chain(&self, endpoint: BoxedEndpoint) -> EndpointInvocationChain {
        let mut chain = EndpointInvocationChain::new(endpoint)
            .with_interceptors(self.interceptors.iter().cloned())
            .with_actors_or_roles(self.actors_or_roles.clone());
        if let Some(ultimate_receiver) = self.ultimate_receiver {
            chain = chain.with_ultimate_receiver(ultimate_receiver);
        }
        chain
    }
}

impl fmt::Debug for MappingSupport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingSupport")
            .field("interceptors", &self.interceptors.len())
            .field("default_endpoint", &self.default_endpoint)
            .field("actors_or_roles", &self.actors_or_roles)
            .field("ultimate_receiver", &self.ultimate_receiver)
            .finish_non_exhaustive()
    }
}

/// An immutable key to endpoint table.
#[derive(Debug, Clone)]
pub struct LookupTable<K> {
    mapping: &'static str,
    entries: IndexMap<K, EndpointTarget>,
}

impl<K: Hash + Eq + fmt::Display> LookupTable<K> {
    /// Creates an empty table for the named mapping.
    pub fn new(mapping: &'static str) -> Self {
        Self {
            mapping,
            entries: IndexMap::new(),
        }
    }

    /// Inserts an entry, rejecting a key that is already present.
    pub fn insert(&mut self, key: K, target: EndpointTarget) -> Result<(), MappingError> {
        if self.entries.contains_key(&key) {
            return Err(MappingError::duplicate(self.mapping, key.to_string()));
        }
        self.entries.insert(key, target);
        Ok(())
    }

    /// Looks up a key.
    pub fn get<Q>(&self, key: &Q) -> Option<&EndpointTarget>
    where
        Q: ?Sized + Hash + indexmap::Equivalent<K>,
    {
        self.entries.get(key)
    }

    /// Returns the keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A mapping that is one [`LookupTable`] plus [`MappingSupport`].
pub trait TableMapping: Sized {
    /// Table key type.
    type Key: Hash + Eq + fmt::Display;

    /// Name used in errors and logs.
    const NAME: &'static str;

    /// Parses a registration key.
    fn parse_key(raw: &str) -> Result<Self::Key, MappingError>;

    /// Assembles the mapping from a validated table.
    fn from_table(table: LookupTable<Self::Key>, support: MappingSupport) -> Self;
}

/// Collects registrations for a [`TableMapping`] and validates them on
/// [`build`](Self::build).
///
/// ```
/// use herald_dispatch::{EndpointTarget, FnEndpoint, SoapActionEndpointMapping};
///
/// let mapping = SoapActionEndpointMapping::builder()
///     .endpoint("urn:echo", EndpointTarget::instance(FnEndpoint::new("echo", |_| Ok(()))))
///     .build()
///     .unwrap();
/// assert_eq!(mapping.len(), 1);
///
/// let duplicate = SoapActionEndpointMapping::builder()
///     .endpoint("urn:echo", EndpointTarget::named("a"))
///     .endpoint("\"urn:echo\"", EndpointTarget::named("b"))
///     .build();
/// assert!(duplicate.is_err());
/// ```
pub struct TableMappingBuilder<M> {
    entries: Vec<(String, EndpointTarget)>,
    support: MappingSupport,
    _mapping: PhantomData<fn() -> M>,
}

impl<M: TableMapping> TableMappingBuilder<M> {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            support: MappingSupport::new(),
            _mapping: PhantomData,
        }
    }

    /// Registers a key.
    #[must_use]
    pub fn endpoint(mut self, key: impl Into<String>, target: EndpointTarget) -> Self {
        self.entries.push((key.into(), target));
        self
    }

    /// Adds an interceptor to every chain this mapping builds.
    #[must_use]
    pub fn interceptor(mut self, interceptor: BoxedInterceptor) -> Self {
        self.support.add_interceptor(interceptor);
        self
    }

    /// Sets the endpoint used when the table has no entry.
    #[must_use]
    pub fn default_endpoint(mut self, target: EndpointTarget) -> Self {
        self.support.set_default_endpoint(target);
        self
    }

    /// Sets the registry used to resolve named targets.
    #[must_use]
    pub fn registry(mut self, registry: Arc<EndpointRegistry>) -> Self {
        self.support.set_registry(registry);
        self
    }

    /// Sets the actors or roles recorded on built chains.
    #[must_use]
    pub fn actors_or_roles(mut self, actors_or_roles: Vec<String>) -> Self {
        self.support.set_actors_or_roles(actors_or_roles);
        self
    }

    /// Sets the ultimate-receiver flag recorded on built chains.
    #[must_use]
    pub fn ultimate_receiver(mut self, ultimate_receiver: bool) -> Self {
        self.support.set_ultimate_receiver(ultimate_receiver);
        self
    }

    /// Validates the registrations and builds the mapping.
    pub fn build(self) -> Result<M, MappingError> {
        let mut table = LookupTable::new(M::NAME);
        for (raw, target) in self.entries {
            table.insert(M::parse_key(&raw)?, target)?;
        }
        Ok(M::from_table(table, self.support))
    }
}

impl<M: TableMapping> Default for TableMappingBuilder<M> {
    fn default() -> Self {
        Self::new()
    }
}
