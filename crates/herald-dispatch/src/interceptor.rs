//! Endpoint interceptors.
//!
//! Interceptors wrap endpoint invocation with ordered hooks. Pre-hooks run in
//! chain order; post, fault and completion hooks run in reverse for the
//! interceptors whose pre-hook let the exchange continue.
//!
//! | Hook | Returns | Default |
//! |------|---------|---------|
//! | [`handle_request`](EndpointInterceptor::handle_request) | continue? | continue |
//! | [`handle_response`](EndpointInterceptor::handle_response) | `()` | no-op |
//! | [`handle_fault`](EndpointInterceptor::handle_fault) | continue? | continue |
//! | [`after_completion`](EndpointInterceptor::after_completion) | `()` | no-op |
//! | [`understands`](EndpointInterceptor::understands) | bool | false |

use crate::endpoint::Endpoint;
use herald_core::{xml, EndpointFailure, MessageContext, SoapHeaderElement, SoapMessage};
use std::sync::Arc;
use tracing::{debug, Level};

/// Hooks around endpoint invocation.
///
/// Interceptors are shared by concurrent exchanges. One that keeps
/// exchange-scoped mutable state synchronizes it itself.
pub trait EndpointInterceptor: Send + Sync {
    /// Returns the name used in logs.
    fn name(&self) -> &str;

    /// Runs before the endpoint. Returning `false` stops the chain: the
    /// endpoint is not invoked and only earlier interceptors see the response.
    fn handle_request(&self, ctx: &mut MessageContext, endpoint: &dyn Endpoint) -> Result<bool, EndpointFailure> {
        let _ = (ctx, endpoint);
        Ok(true)
    }

    /// Runs after a normal return when the response carries no fault.
    fn handle_response(&self, ctx: &mut MessageContext, endpoint: &dyn Endpoint) -> Result<(), EndpointFailure> {
        let _ = (ctx, endpoint);
        Ok(())
    }

    /// Runs when the response carries a fault or the endpoint failed.
    /// Returning `false` stops the remaining fault hooks.
    fn handle_fault(&self, ctx: &mut MessageContext, endpoint: &dyn Endpoint) -> Result<bool, EndpointFailure> {
        let _ = (ctx, endpoint);
        Ok(true)
    }

    /// Runs on every path once the exchange is complete.
    fn after_completion(&self, ctx: &MessageContext, endpoint: &dyn Endpoint, failure: Option<&EndpointFailure>) {
        let _ = (ctx, endpoint, failure);
    }

    /// Returns true when this interceptor processes the given header block.
    fn understands(&self, header: &SoapHeaderElement) -> bool {
        let _ = header;
        false
    }
}

/// A shared interceptor.
pub type BoxedInterceptor = Arc<dyn EndpointInterceptor>;

/// Logs request and response payloads at debug level.
#[derive(Debug, Clone)]
pub struct PayloadLoggingInterceptor {
    log_request: bool,
    log_response: bool,
}

impl Default for PayloadLoggingInterceptor {
    fn default() -> Self {
        Self {
            log_request: true,
            log_response: true,
        }
    }
}

impl PayloadLoggingInterceptor {
    /// Logs both directions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables request logging.
    #[must_use]
    pub fn log_request(mut self, enabled: bool) -> Self {
        self.log_request = enabled;
        self
    }

    /// Enables or disables response logging.
    #[must_use]
    pub fn log_response(mut self, enabled: bool) -> Self {
        self.log_response = enabled;
        self
    }

    fn log(&self, direction: &'static str, ctx: &MessageContext, message: Option<&SoapMessage>) {
        if !tracing::enabled!(Level::DEBUG) {
            return;
        }
        let Some(message) = message else {
            return;
        };
        let body = match (message.fault(), message.payload_element()) {
            (Some(fault), _) => fault.to_string(),
            (None, Ok(Some(element))) => xml::write_element(element)
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                .unwrap_or_else(|err| format!("<unwritable payload: {err}>")),
            (None, Ok(None)) => String::new(),
            (None, Err(err)) => format!("<unreadable payload: {err}>"),
        };
        debug!(exchange_id = %ctx.exchange_id(), direction, payload = %body, "message payload");
    }
}

impl EndpointInterceptor for PayloadLoggingInterceptor {
    fn name(&self) -> &str {
        "payload-logging"
    }

    fn handle_request(&self, ctx: &mut MessageContext, _endpoint: &dyn Endpoint) -> Result<bool, EndpointFailure> {
        if self.log_request {
            self.log("request", ctx, Some(ctx.request()));
        }
        Ok(true)
    }

    fn handle_response(&self, ctx: &mut MessageContext, _endpoint: &dyn Endpoint) -> Result<(), EndpointFailure> {
        if self.log_response {
            self.log("response", ctx, ctx.response());
        }
        Ok(())
    }

    fn handle_fault(&self, ctx: &mut MessageContext, _endpoint: &dyn Endpoint) -> Result<bool, EndpointFailure> {
        if self.log_response {
            self.log("fault", ctx, ctx.response());
        }
        Ok(true)
    }
}
