//! Depth-matching fault resolver.

use super::ExceptionResolver;
use crate::endpoint::Endpoint;
use herald_core::{EndpointFailure, FaultDefinition, MessageContext, MessageError};
use indexmap::IndexMap;
use std::collections::HashSet;

/// Maps failure type names to fault definitions.
///
/// The failure's type is matched against every key; the key reachable in
/// the fewest hierarchy edges wins, and equal depths go to the entry
/// registered first. Without a match the default fault applies, if set.
///
/// ```
/// use herald_core::fixtures::ILLEGAL_ARGUMENT_EXCEPTION;
/// use herald_core::{EndpointFailure, FaultCode};
/// use herald_dispatch::FaultMappingExceptionResolver;
///
/// let resolver = FaultMappingExceptionResolver::builder()
///     .mapping_text("Exception", "SERVER,Unexpected")
///     .unwrap()
///     .mapping_text("RuntimeException", "CLIENT,Bad input")
///     .unwrap()
///     .build();
///
/// let failure = EndpointFailure::new(&ILLEGAL_ARGUMENT_EXCEPTION, "negative quantity");
/// let definition = resolver.find_definition(&failure).unwrap();
/// assert_eq!(definition.code(), &FaultCode::ClientOrSender);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FaultMappingExceptionResolver {
    mappings: IndexMap<String, FaultDefinition>,
    default_fault: Option<FaultDefinition>,
    mapped_endpoints: Option<HashSet<String>>,
}

impl FaultMappingExceptionResolver {
    /// Starts a builder.
    pub fn builder() -> FaultMappingResolverBuilder {
        FaultMappingResolverBuilder::default()
    }

    /// Returns the definition selected for `failure`, or the default.
    pub fn find_definition(&self, failure: &EndpointFailure) -> Option<&FaultDefinition> {
        let kind = failure.kind();
        let mut best: Option<(usize, &FaultDefinition)> = None;
        for (key, definition) in &self.mappings {
            let Some(depth) = kind.depth_to(key) else {
                continue;
            };
            if best.map_or(true, |(current, _)| depth < current) {
                best = Some((depth, definition));
            }
        }
        best.map(|(_, definition)| definition)
            .or(self.default_fault.as_ref())
    }

    /// Returns the mapping keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.mappings.keys().map(String::as_str)
    }

    fn applies_to(&self, endpoint: Option<&dyn Endpoint>) -> bool {
        match (&self.mapped_endpoints, endpoint) {
            (None, _) => true,
            (Some(names), Some(endpoint)) => names.contains(endpoint.name()),
            (Some(_), None) => false,
        }
    }
}

impl ExceptionResolver for FaultMappingExceptionResolver {
    fn name(&self) -> &str {
        "fault-mapping"
    }

    fn resolve_failure(
        &self,
        ctx: &mut MessageContext,
        endpoint: Option<&dyn Endpoint>,
        failure: &EndpointFailure,
    ) -> bool {
        if !self.applies_to(endpoint) {
            return false;
        }
        let Some(definition) = self.find_definition(failure) else {
            return false;
        };
        let fault = definition.to_fault(failure.message());
        if let Err(err) = fault.validate(ctx.request().version()) {
            tracing::warn!(
                exchange_id = %ctx.exchange_id(),
                failure = failure.kind().name(),
                error = %err,
                "mapped fault cannot be written in this SOAP version"
            );
            return false;
        }
        tracing::debug!(
            exchange_id = %ctx.exchange_id(),
            failure = failure.kind().name(),
            code = fault.code().label(),
            "resolved failure to fault"
        );
        ctx.response_mut().add_fault(fault).is_ok()
    }
}

/// Builder for [`FaultMappingExceptionResolver`].
#[derive(Debug, Default)]
pub struct FaultMappingResolverBuilder {
    resolver: FaultMappingExceptionResolver,
}

impl FaultMappingResolverBuilder {
    /// Maps a failure type name to a definition. A repeated name keeps its
    /// original position and takes the new definition.
    #[must_use]
    pub fn mapping(mut self, failure_type: impl Into<String>, definition: FaultDefinition) -> Self {
        self.resolver.mappings.insert(failure_type.into(), definition);
        self
    }

    /// Maps a failure type name to a definition in `CODE,reason[,locale]` form.
    pub fn mapping_text(self, failure_type: impl Into<String>, definition: &str) -> Result<Self, MessageError> {
        Ok(self.mapping(failure_type, definition.parse()?))
    }

    /// Sets the definition used when nothing matches.
    #[must_use]
    pub fn default_fault(mut self, definition: FaultDefinition) -> Self {
        self.resolver.default_fault = Some(definition);
        self
    }

    /// Restricts the resolver to the named endpoints.
    #[must_use]
    pub fn mapped_endpoints<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resolver.mapped_endpoints = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Builds the resolver.
    pub fn build(self) -> FaultMappingExceptionResolver {
        self.resolver
    }
}
