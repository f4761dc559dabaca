//! Declarative method mapping.
//!
//! A bean type lists its endpoint methods together with a marker saying what
//! each method handles. The mapping scans the beans once when it is built and
//! produces ordinary lookup tables.
//!
//! ```
//! use herald_core::{EndpointFailure, MessageContext};
//! use herald_dispatch::{DeclarativeEndpointMapping, DeclaredEndpoint, EndpointMethod};
//! use std::sync::Arc;
//!
//! struct Orders;
//!
//! impl Orders {
//!     fn place(&self, _ctx: &mut MessageContext) -> Result<(), EndpointFailure> {
//!         Ok(())
//!     }
//!
//!     fn cancel(&self, _ctx: &mut MessageContext) -> Result<(), EndpointFailure> {
//!         Ok(())
//!     }
//! }
//!
//! impl DeclaredEndpoint for Orders {
//!     fn endpoint_methods() -> Vec<EndpointMethod<Self>> {
//!         vec![
//!             EndpointMethod::payload_root("urn:orders", "PlaceOrder", "place", Self::place),
//!             EndpointMethod::soap_action("urn:orders:Cancel", "cancel", Self::cancel),
//!         ]
//!     }
//! }
//!
//! let mapping = DeclarativeEndpointMapping::builder()
//!     .bean(Arc::new(Orders))
//!     .build()
//!     .unwrap();
//! assert_eq!(mapping.len(), 2);
//! ```

use super::{EndpointMapping, EndpointTarget, LookupTable, MappingSupport};
use crate::chain::EndpointInvocationChain;
use crate::endpoint::{BoxedEndpoint, EndpointMethodFn, EndpointRegistry, MethodEndpoint};
use crate::error::MappingError;
use crate::interceptor::BoxedInterceptor;
use herald_core::{MessageContext, MessageError, QName};
use std::sync::Arc;

/// What an endpoint method handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointMarker {
    /// Requests whose payload root has this name.
    PayloadRoot(QName),
    /// Requests carrying this transport action.
    SoapAction(String),
    /// Requests carrying this WS-Addressing action.
    Action(String),
}

/// One declared endpoint method.
pub struct EndpointMethod<T> {
    name: &'static str,
    marker: EndpointMarker,
    method: EndpointMethodFn<T>,
}

impl<T> EndpointMethod<T> {
    /// Declares a method with an explicit marker.
    pub fn new(marker: EndpointMarker, name: &'static str, method: EndpointMethodFn<T>) -> Self {
        Self { name, marker, method }
    }

    /// Declares a method handling a payload root.
    pub fn payload_root(namespace: &str, local_name: &str, name: &'static str, method: EndpointMethodFn<T>) -> Self {
        Self::new(EndpointMarker::PayloadRoot(QName::new(namespace, local_name)), name, method)
    }

    /// Declares a method handling a transport action.
    pub fn soap_action(action: &str, name: &'static str, method: EndpointMethodFn<T>) -> Self {
        Self::new(EndpointMarker::SoapAction(action.to_string()), name, method)
    }

    /// Declares a method handling a WS-Addressing action.
    pub fn action(action: &str, name: &'static str, method: EndpointMethodFn<T>) -> Self {
        Self::new(EndpointMarker::Action(action.to_string()), name, method)
    }

    /// Returns the marker.
    pub fn marker(&self) -> &EndpointMarker {
        &self.marker
    }
}

/// A bean type whose methods are endpoints.
pub trait DeclaredEndpoint: Send + Sync + Sized + 'static {
    /// Lists the endpoint methods of this type.
    fn endpoint_methods() -> Vec<EndpointMethod<Self>>;
}

/// Binds every declared method of `bean` to it.
pub fn declared_methods<T: DeclaredEndpoint>(bean: &Arc<T>) -> Vec<(EndpointMarker, BoxedEndpoint)> {
    T::endpoint_methods()
        .into_iter()
        .map(|declared| {
            let endpoint: BoxedEndpoint = Arc::new(MethodEndpoint::new(declared.name, bean.clone(), declared.method));
            (declared.marker, endpoint)
        })
        .collect()
}

/// Maps declared methods by payload root or transport action.
///
/// Methods marked with an addressing action are left to the addressing
/// action mapping.
#[derive(Debug)]
pub struct DeclarativeEndpointMapping {
    payload_roots: LookupTable<QName>,
    soap_actions: LookupTable<String>,
    support: MappingSupport,
}

impl DeclarativeEndpointMapping {
    const NAME: &'static str = "declarative";

    /// Starts a builder.
    pub fn builder() -> DeclarativeMappingBuilder {
        DeclarativeMappingBuilder::default()
    }

    /// Returns the number of mapped methods.
    pub fn len(&self) -> usize {
        self.payload_roots.len() + self.soap_actions.len()
    }

    /// Returns true when no method is mapped.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EndpointMapping for DeclarativeEndpointMapping {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn endpoint_for(&self, ctx: &MessageContext) -> Result<Option<EndpointInvocationChain>, MessageError> {
        let by_root = match ctx.request().payload_root_name()? {
            Some(root) => self.payload_roots.get(&root),
            None => None,
        };
        let target = by_root.or_else(|| {
            ctx.request()
                .soap_action()
                .map(|action| action.trim().trim_matches('"'))
                .filter(|action| !action.is_empty())
                .and_then(|action| self.soap_actions.get(action))
        });
        Ok(self.support.chain_for(target, Self::NAME))
    }
}

/// Builder for [`DeclarativeEndpointMapping`].
#[derive(Default)]
pub struct DeclarativeMappingBuilder {
    methods: Vec<(EndpointMarker, BoxedEndpoint)>,
    support: MappingSupport,
}

impl DeclarativeMappingBuilder {
    /// Scans a bean's declared methods.
    #[must_use]
    pub fn bean<T: DeclaredEndpoint>(mut self, bean: Arc<T>) -> Self {
        self.methods.extend(declared_methods(&bean));
        self
    }

    /// Adds an interceptor to every chain this mapping builds.
    #[must_use]
    pub fn interceptor(mut self, interceptor: BoxedInterceptor) -> Self {
        self.support.add_interceptor(interceptor);
        self
    }

    /// Sets the registry used to resolve a named default endpoint.
    #[must_use]
    pub fn registry(mut self, registry: Arc<EndpointRegistry>) -> Self {
        self.support.set_registry(registry);
        self
    }

    /// Sets the endpoint used when no method matches.
    #[must_use]
    pub fn default_endpoint(mut self, target: EndpointTarget) -> Self {
        self.support.set_default_endpoint(target);
        self
    }

    /// Validates the scanned methods and builds the mapping.
    pub fn build(self) -> Result<DeclarativeEndpointMapping, MappingError> {
        let name = DeclarativeEndpointMapping::NAME;
        let mut payload_roots = LookupTable::new(name);
        let mut soap_actions = LookupTable::new(name);
        for (marker, endpoint) in self.methods {
            match marker {
                EndpointMarker::PayloadRoot(root) => {
                    if root.local_name().is_empty() {
                        return Err(MappingError::invalid(name, root.to_string(), "local name must not be empty"));
                    }
                    payload_roots.insert(root, EndpointTarget::Instance(endpoint))?;
                }
                EndpointMarker::SoapAction(action) => {
                    let action = action.trim().trim_matches('"').to_string();
                    if action.is_empty() {
                        return Err(MappingError::invalid(name, action, "action must not be empty"));
                    }
                    soap_actions.insert(action, EndpointTarget::Instance(endpoint))?;
                }
                EndpointMarker::Action(action) => {
                    tracing::debug!(endpoint = endpoint.name(), %action, "addressing action left to the action mapping");
                }
            }
        }
        Ok(DeclarativeEndpointMapping {
            payload_roots,
            soap_actions,
            support: self.support,
        })
    }
}
