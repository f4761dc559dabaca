//! Exception resolvers.
//!
//! When an endpoint or interceptor fails, the dispatcher asks its resolvers
//! in registration order to turn the failure into a fault. The first resolver
//! that writes a fault ends the search; if all decline, the failure is
//! unhandled.

mod fault_mapping;
mod simple;

pub use fault_mapping::{FaultMappingExceptionResolver, FaultMappingResolverBuilder};
pub use simple::SimpleFaultExceptionResolver;

use crate::endpoint::Endpoint;
use herald_core::{EndpointFailure, MessageContext};
use std::sync::Arc;

/// Turns endpoint failures into faults.
pub trait ExceptionResolver: Send + Sync {
    /// Returns the name used in logs.
    fn name(&self) -> &str;

    /// Writes a fault into the response and returns true, or returns false
    /// to let the next resolver try.
    fn resolve_failure(
        &self,
        ctx: &mut MessageContext,
        endpoint: Option<&dyn Endpoint>,
        failure: &EndpointFailure,
    ) -> bool;
}

/// A shared resolver.
pub type BoxedResolver = Arc<dyn ExceptionResolver>;
