//! Catch-all resolver.

use super::ExceptionResolver;
use crate::endpoint::Endpoint;
use herald_core::{EndpointFailure, MessageContext, SoapFault};

/// Maps any failure to a server (1.1) or receiver (1.2) fault carrying the
/// failure message. Registered last, it guarantees every failure becomes a
/// fault.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleFaultExceptionResolver;

impl SimpleFaultExceptionResolver {
    /// Creates the resolver.
    pub fn new() -> Self {
        Self
    }
}

impl ExceptionResolver for SimpleFaultExceptionResolver {
    fn name(&self) -> &str {
        "simple-fault"
    }

    fn resolve_failure(
        &self,
        ctx: &mut MessageContext,
        _endpoint: Option<&dyn Endpoint>,
        failure: &EndpointFailure,
    ) -> bool {
        match ctx.response_mut().add_fault(SoapFault::server(failure.message())) {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!(error = %err, "could not write server fault");
                false
            }
        }
    }
}
