//! Invocation chains.

use crate::endpoint::BoxedEndpoint;
use crate::interceptor::BoxedInterceptor;
use std::fmt;

/// An endpoint with the interceptors and header targeting that apply to one
/// exchange. Built fresh per exchange by a mapping.
#[derive(Clone)]
pub struct EndpointInvocationChain {
    endpoint: BoxedEndpoint,
    interceptors: Vec<BoxedInterceptor>,
    actors_or_roles: Vec<String>,
    ultimate_receiver: bool,
}

impl EndpointInvocationChain {
    /// Creates a chain with no interceptors that acts as ultimate receiver.
    pub fn new(endpoint: BoxedEndpoint) -> Self {
        Self {
            endpoint,
            interceptors: Vec::new(),
            actors_or_roles: Vec::new(),
            ultimate_receiver: true,
        }
    }

    /// Appends interceptors.
    #[must_use]
    pub fn with_interceptors(mut self, interceptors: impl IntoIterator<Item = BoxedInterceptor>) -> Self {
        self.interceptors.extend(interceptors);
        self
    }

    /// Places `interceptors` ahead of the chain's own.
    #[must_use]
    pub fn with_leading_interceptors(mut self, interceptors: &[BoxedInterceptor]) -> Self {
        if !interceptors.is_empty() {
            let mut combined = interceptors.to_vec();
            combined.append(&mut self.interceptors);
            self.interceptors = combined;
        }
        self
    }

    /// Sets the actors (1.1) or roles (1.2) this node plays.
    #[must_use]
    pub fn with_actors_or_roles(mut self, actors_or_roles: Vec<String>) -> Self {
        self.actors_or_roles = actors_or_roles;
        self
    }

    /// Sets whether this node is the ultimate SOAP receiver.
    #[must_use]
    pub fn with_ultimate_receiver(mut self, ultimate_receiver: bool) -> Self {
        self.ultimate_receiver = ultimate_receiver;
        self
    }

    /// Returns the endpoint.
    pub fn endpoint(&self) -> &BoxedEndpoint {
        &self.endpoint
    }

    /// Returns the interceptors in pre-hook order.
    pub fn interceptors(&self) -> &[BoxedInterceptor] {
        &self.interceptors
    }

    /// Returns the actors or roles.
    pub fn actors_or_roles(&self) -> &[String] {
        &self.actors_or_roles
    }

    /// Returns whether this node is the ultimate receiver.
    pub fn is_ultimate_receiver(&self) -> bool {
        self.ultimate_receiver
    }
}

impl fmt::Debug for EndpointInvocationChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointInvocationChain")
            .field("endpoint", &self.endpoint.name())
            .field(
                "interceptors",
                &self.interceptors.iter().map(|i| i.name()).collect::<Vec<_>>(),
            )
            .field("actors_or_roles", &self.actors_or_roles)
            .field("ultimate_receiver", &self.ultimate_receiver)
            .finish()
    }
}
