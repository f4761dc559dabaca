//! Endpoint mapping by WS-Addressing action.

use crate::interceptor::AddressingInterceptor;
use crate::sender::BoxedMessageSender;
use crate::strategy::{BoxedMessageIdStrategy, UuidMessageIdStrategy};
use crate::uri::AddressingUri;
use crate::version::{AddressingVersionKind, BoxedAddressingVersion};
use herald_core::{EndpointFailure, MessageContext, MessageError, MESSAGE_FAILURE};
use herald_dispatch::{
    declared_methods, BoxedEndpoint, BoxedInterceptor, DeclaredEndpoint, Endpoint, EndpointInvocationChain,
    EndpointMapping, EndpointMarker, EndpointRegistry, EndpointTarget, MappingError, MappingSupport,
};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Suffix appended to the request action for replies.
pub const DEFAULT_OUTPUT_ACTION_SUFFIX: &str = "Response";

/// Suffix appended to the request action for fault replies.
pub const DEFAULT_FAULT_ACTION_SUFFIX: &str = "Fault";

/// How an action is bound to an endpoint.
#[derive(Debug, Clone)]
pub struct ActionRegistration {
    target: EndpointTarget,
    address: Option<String>,
    message_id_optional: bool,
}

impl ActionRegistration {
    /// Binds the action to `target`.
    pub fn new(target: EndpointTarget) -> Self {
        Self {
            target,
            address: None,
            message_id_optional: false,
        }
    }

    /// Only matches requests whose destination is `address`.
    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Accepts requests without a `MessageID`.
    #[must_use]
    pub fn message_id_optional(mut self, optional: bool) -> Self {
        self.message_id_optional = optional;
        self
    }
}

#[derive(Debug)]
struct ActionEntry {
    target: EndpointTarget,
    address: Option<AddressingUri>,
    message_id_optional: bool,
}

/// Maps requests by their addressing `Action`.
///
/// Versions are tried in order; a version applies when any header block
/// uses its namespace. Requests whose addressing headers are unreadable
/// still get a chain, so the addressing interceptor answers them with a
/// fault instead of the dispatcher reporting no endpoint.
pub struct ActionEndpointMapping {
    versions: Vec<BoxedAddressingVersion>,
    entries: IndexMap<AddressingUri, ActionEntry>,
    support: MappingSupport,
    post_interceptors: Vec<BoxedInterceptor>,
    id_strategy: BoxedMessageIdStrategy,
    senders: Arc<[BoxedMessageSender]>,
    output_action_suffix: String,
    fault_action_suffix: String,
}

impl ActionEndpointMapping {
    const NAME: &'static str = "addressing-action";

    /// Starts a builder.
    pub fn builder() -> ActionMappingBuilder {
        ActionMappingBuilder::default()
    }

    /// Returns the registered actions.
    pub fn actions(&self) -> impl Iterator<Item = &AddressingUri> {
        self.entries.keys()
    }

    /// Returns the number of registered actions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no action is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn interceptor(&self, version: &BoxedAddressingVersion) -> AddressingInterceptor {
        AddressingInterceptor::new(version.clone())
            .with_id_strategy(self.id_strategy.clone())
            .with_senders(self.senders.clone())
    }

    fn chain(&self, endpoint: BoxedEndpoint, addressing: AddressingInterceptor) -> EndpointInvocationChain {
        let addressing: BoxedInterceptor = Arc::new(addressing);
        self.support
            .chain(endpoint)
            .with_interceptors(std::iter::once(addressing))
            .with_interceptors(self.post_interceptors.iter().cloned())
    }

    fn rejecting_chain(&self, version: &BoxedAddressingVersion) -> EndpointInvocationChain {
        self.chain(Arc::new(RejectedRequest), self.interceptor(version))
    }
}

impl EndpointMapping for ActionEndpointMapping {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn endpoint_for(&self, ctx: &MessageContext) -> Result<Option<EndpointInvocationChain>, MessageError> {
        let request = ctx.request();
        let Some(version) = self.versions.iter().find(|v| v.applies_to(request)) else {
            return Ok(None);
        };
        debug!(exchange_id = %ctx.exchange_id(), version = version.name(), "request uses WS-Addressing");

        let map = match version.properties(request) {
            Ok(map) => map,
            Err(err) => {
                debug!(exchange_id = %ctx.exchange_id(), error = %err, "addressing headers unreadable");
                return Ok(Some(self.rejecting_chain(version)));
            }
        };
        let Some(action) = map.action() else {
            return Ok(Some(self.rejecting_chain(version)));
        };
        let Some(entry) = self.entries.get(action) else {
            debug!(exchange_id = %ctx.exchange_id(), %action, "no endpoint for action");
            return Ok(None);
        };
        if entry.address.as_ref().is_some_and(|address| Some(address) != map.to()) {
            debug!(exchange_id = %ctx.exchange_id(), %action, "action mapped for another address");
            return Ok(None);
        }
        let Some(endpoint) = self.support.resolve(&entry.target, Self::NAME) else {
            return Ok(None);
        };

        let addressing = self
            .interceptor(version)
            .with_reply_action(action.with_suffix(&self.output_action_suffix).ok())
            .with_fault_action(action.with_suffix(&self.fault_action_suffix).ok())
            .message_id_optional(entry.message_id_optional);
        Ok(Some(self.chain(endpoint, addressing)))
    }
}

impl fmt::Debug for ActionEndpointMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionEndpointMapping")
            .field("versions", &self.versions.iter().map(|v| v.name()).collect::<Vec<_>>())
            .field("actions", &self.entries.keys().collect::<Vec<_>>())
            .field("support", &self.support)
            .field("post_interceptors", &self.post_interceptors.len())
            .field("senders", &self.senders.len())
            .finish()
    }
}

/// Stands in for the endpoint of a request whose addressing headers were
/// rejected. The addressing interceptor stops such chains before invocation.
struct RejectedRequest;

impl Endpoint for RejectedRequest {
    fn name(&self) -> &str {
        "addressing-rejected"
    }

    fn invoke(&self, _ctx: &mut MessageContext) -> Result<(), EndpointFailure> {
        Err(EndpointFailure::new(
            &MESSAGE_FAILURE,
            "request addressing headers were rejected",
        ))
    }
}

/// Builder for [`ActionEndpointMapping`].
pub struct ActionMappingBuilder {
    registrations: Vec<(String, ActionRegistration)>,
    versions: Vec<BoxedAddressingVersion>,
    support: MappingSupport,
    post_interceptors: Vec<BoxedInterceptor>,
    id_strategy: BoxedMessageIdStrategy,
    senders: Vec<BoxedMessageSender>,
    output_action_suffix: String,
    fault_action_suffix: String,
}

impl Default for ActionMappingBuilder {
    fn default() -> Self {
        Self {
            registrations: Vec::new(),
            versions: AddressingVersionKind::DEFAULT_ORDER
                .into_iter()
                .map(AddressingVersionKind::version)
                .collect(),
            support: MappingSupport::new(),
            post_interceptors: Vec::new(),
            id_strategy: Arc::new(UuidMessageIdStrategy),
            senders: Vec::new(),
            output_action_suffix: DEFAULT_OUTPUT_ACTION_SUFFIX.to_string(),
            fault_action_suffix: DEFAULT_FAULT_ACTION_SUFFIX.to_string(),
        }
    }
}

impl ActionMappingBuilder {
    /// Binds `action` to `target`.
    #[must_use]
    pub fn endpoint(self, action: impl Into<String>, target: EndpointTarget) -> Self {
        self.register(action, ActionRegistration::new(target))
    }

    /// Binds `action` with address and message-id settings.
    #[must_use]
    pub fn register(mut self, action: impl Into<String>, registration: ActionRegistration) -> Self {
        self.registrations.push((action.into(), registration));
        self
    }

    /// Binds every method of `bean` declared with an addressing action.
    #[must_use]
    pub fn bean<T: DeclaredEndpoint>(mut self, bean: Arc<T>) -> Self {
        for (marker, endpoint) in declared_methods(&bean) {
            if let EndpointMarker::Action(action) = marker {
                self.registrations
                    .push((action, ActionRegistration::new(EndpointTarget::Instance(endpoint))));
            }
        }
        self
    }

    /// Sets the versions to try, in order.
    #[must_use]
    pub fn versions(mut self, versions: Vec<BoxedAddressingVersion>) -> Self {
        self.versions = versions;
        self
    }

    /// Adds an interceptor that runs before the addressing interceptor.
    #[must_use]
    pub fn pre_interceptor(mut self, interceptor: BoxedInterceptor) -> Self {
        self.support.add_interceptor(interceptor);
        self
    }

    /// Adds an interceptor that runs after the addressing interceptor.
    #[must_use]
    pub fn post_interceptor(mut self, interceptor: BoxedInterceptor) -> Self {
        self.post_interceptors.push(interceptor);
        self
    }

    /// Sets the registry used to resolve named endpoints.
    #[must_use]
    pub fn registry(mut self, registry: Arc<EndpointRegistry>) -> Self {
        self.support.set_registry(registry);
        self
    }

    /// Sets the message id strategy.
    #[must_use]
    pub fn message_id_strategy(mut self, strategy: BoxedMessageIdStrategy) -> Self {
        self.id_strategy = strategy;
        self
    }

    /// Adds an out-of-band sender.
    #[must_use]
    pub fn message_sender(mut self, sender: BoxedMessageSender) -> Self {
        self.senders.push(sender);
        self
    }

    /// Sets the reply action suffix.
    #[must_use]
    pub fn output_action_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.output_action_suffix = suffix.into();
        self
    }

    /// Sets the fault action suffix.
    #[must_use]
    pub fn fault_action_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.fault_action_suffix = suffix.into();
        self
    }

    /// Sets the actors or roles recorded on built chains.
    #[must_use]
    pub fn actors_or_roles(mut self, actors_or_roles: Vec<String>) -> Self {
        self.support.set_actors_or_roles(actors_or_roles);
        self
    }

    /// Sets whether built chains act as ultimate receiver.
    #[must_use]
    pub fn ultimate_receiver(mut self, ultimate_receiver: bool) -> Self {
        self.support.set_ultimate_receiver(ultimate_receiver);
        self
    }

    /// Validates the registrations and builds the mapping.
    pub fn build(self) -> Result<ActionEndpointMapping, MappingError> {
        let name = ActionEndpointMapping::NAME;
        for suffix in [&self.output_action_suffix, &self.fault_action_suffix] {
            if suffix.trim().is_empty() {
                return Err(MappingError::invalid(name, suffix.as_str(), "action suffix must not be empty"));
            }
        }
        if self.versions.is_empty() {
            return Err(MappingError::invalid(name, "versions", "at least one addressing version is required"));
        }

        let mut entries = IndexMap::new();
        for (action, registration) in self.registrations {
            let key = AddressingUri::parse(&action)
                .map_err(|err| MappingError::invalid(name, action.as_str(), err.to_string()))?;
            let address = registration
                .address
                .map(|address| {
                    AddressingUri::parse(&address)
                        .map_err(|err| MappingError::invalid(name, address.as_str(), err.to_string()))
                })
                .transpose()?;
            if entries.contains_key(&key) {
                return Err(MappingError::duplicate(name, key.as_str()));
            }
            debug!(mapping = name, action = %key, "action mapped");
            entries.insert(
                key,
                ActionEntry {
                    target: registration.target,
                    address,
                    message_id_optional: registration.message_id_optional,
                },
            );
        }

        Ok(ActionEndpointMapping {
            versions: self.versions,
            entries,
            support: self.support,
            post_interceptors: self.post_interceptors,
            id_strategy: self.id_strategy,
            senders: Arc::from(self.senders),
            output_action_suffix: self.output_action_suffix,
            fault_action_suffix: self.fault_action_suffix,
        })
    }
}
