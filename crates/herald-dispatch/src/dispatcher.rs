//! The message dispatcher.
//!
//! One call to [`MessageDispatcher::dispatch`] takes an exchange through
//! these steps:
//!
//! 1. **Resolve** - ask the mappings in order; the first chain wins.
//! 2. **Must-understand** - every targeted header block flagged
//!    must-understand needs an interceptor that understands it, otherwise a
//!    `MustUnderstand` fault is written and nothing else runs.
//! 3. **Invoke** - pre-hooks in order, then the endpoint, then post or fault
//!    hooks in reverse for the interceptors that continued.
//! 4. **Fault** - on failure, fault hooks in reverse, then the resolvers.
//!    Once a resolver has written the fault, the fault hooks run again over
//!    it so interceptors can address or reroute the fault message.
//! 5. **Complete** - completion hooks in reverse on every path.

use crate::chain::EndpointInvocationChain;
use crate::endpoint::Endpoint;
use crate::error::DispatchError;
use crate::interceptor::BoxedInterceptor;
use crate::mapping::{BoxedMapping, EndpointMapping};
use crate::resolver::{BoxedResolver, ExceptionResolver};
use herald_core::{
    EndpointFailure, FaultCode, MessageContext, QName, SoapFault, SoapMessage, SoapVersion,
    DEFAULT_FAULT_LOCALE,
};
use http::StatusCode;
use std::sync::Arc;
use tracing::{debug, debug_span, warn};

/// Reason of the fault written for unprocessed mandatory headers.
pub const DEFAULT_MUST_UNDERSTAND_FAULT_STRING: &str =
    "One or more mandatory SOAP header blocks not understood";

/// How an exchange ended, when it ended with something to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The context holds a response without a fault.
    Response,
    /// The context holds a fault response with this code.
    Fault(FaultCode),
    /// No response exists; the exchange is one-way.
    NoResponse,
}

impl DispatchOutcome {
    /// Reads the outcome from the context after dispatch.
    pub fn of(ctx: &MessageContext) -> Self {
        match ctx.response() {
            None => Self::NoResponse,
            Some(response) => match response.fault() {
                Some(fault) => Self::Fault(fault.code().clone()),
                None => Self::Response,
            },
        }
    }

    /// Returns the HTTP status of the SOAP binding for this outcome.
    pub fn status_code(&self, version: SoapVersion) -> StatusCode {
        match (self, version) {
            (Self::Response, _) => StatusCode::OK,
            (Self::NoResponse, _) => StatusCode::ACCEPTED,
            (Self::Fault(FaultCode::ClientOrSender), SoapVersion::Soap12) => StatusCode::BAD_REQUEST,
            (Self::Fault(_), _) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a short label for logs and metrics.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Response => "response",
            Self::Fault(_) => "fault",
            Self::NoResponse => "no_response",
        }
    }
}

/// Routes exchanges to endpoints. Built once and shared behind `Arc`.
pub struct MessageDispatcher {
    mappings: Vec<BoxedMapping>,
    resolvers: Vec<BoxedResolver>,
    interceptors: Vec<BoxedInterceptor>,
    must_understand_fault_string: String,
    must_understand_fault_locale: String,
}

impl MessageDispatcher {
    /// Starts a builder.
    pub fn builder() -> MessageDispatcherBuilder {
        MessageDispatcherBuilder::new()
    }

    /// Returns the mapping names in query order.
    pub fn mapping_names(&self) -> Vec<&str> {
        self.mappings.iter().map(|m| m.name()).collect()
    }

    /// Returns the resolver names in query order.
    pub fn resolver_names(&self) -> Vec<&str> {
        self.resolvers.iter().map(|r| r.name()).collect()
    }

    /// Resolves the chain for an exchange, with global interceptors first.
    pub fn resolve(&self, ctx: &MessageContext) -> Result<Option<EndpointInvocationChain>, DispatchError> {
        for mapping in &self.mappings {
            if let Some(chain) = mapping.endpoint_for(ctx)? {
                debug!(
                    mapping = mapping.name(),
                    endpoint = chain.endpoint().name(),
                    "endpoint mapped"
                );
                return Ok(Some(chain.with_leading_interceptors(&self.interceptors)));
            }
        }
        Ok(None)
    }

    /// Processes one exchange.
    ///
    /// On `Ok` the outcome tells whether the context holds a response, a
    /// fault or nothing. `Err` means no SOAP response can be produced.
    pub fn dispatch(&self, ctx: &mut MessageContext) -> Result<DispatchOutcome, DispatchError> {
        let span = debug_span!("dispatch", exchange_id = %ctx.exchange_id());
        let _entered = span.enter();

        let Some(chain) = self.resolve(ctx)? else {
            let payload_root = ctx.request().payload_root_name().ok().flatten().map(|q| q.to_string());
            let soap_action = ctx.request().soap_action().map(str::to_string);
            warn!(
                exchange_id = %ctx.exchange_id(),
                payload_root = payload_root.as_deref().unwrap_or("-"),
                action = soap_action.as_deref().unwrap_or("-"),
                "no endpoint found"
            );
            return Err(DispatchError::NoEndpointFound {
                exchange_id: ctx.exchange_id(),
                payload_root,
                soap_action,
            });
        };

        if !self.check_must_understand(ctx, &chain)? {
            return Ok(DispatchOutcome::of(ctx));
        }

        let endpoint = chain.endpoint().as_ref();
        let mut executed = 0;
        let unhandled = match invoke(ctx, &chain, &mut executed) {
            Ok(()) => None,
            Err(failure) => self.process_failure(ctx, &chain, executed, failure),
        };

        for interceptor in chain.interceptors()[..executed].iter().rev() {
            interceptor.after_completion(ctx, endpoint, unhandled.as_ref());
        }

        match unhandled {
            Some(failure) => {
                warn!(endpoint = endpoint.name(), error = %failure, "endpoint failure not resolved");
                Err(DispatchError::Unhandled(failure))
            }
            None => {
                let outcome = DispatchOutcome::of(ctx);
                debug!(endpoint = endpoint.name(), outcome = outcome.label(), "exchange complete");
                Ok(outcome)
            }
        }
    }

    /// Writes a `MustUnderstand` fault and returns false when a targeted
    /// mandatory header block is not understood by the chain.
    fn check_must_understand(
        &self,
        ctx: &mut MessageContext,
        chain: &EndpointInvocationChain,
    ) -> Result<bool, DispatchError> {
        let request = ctx.request();
        let version = request.version();
        let not_understood: Vec<QName> = request
            .header()
            .elements_to_process(version, chain.actors_or_roles(), chain.is_ultimate_receiver())
            .into_iter()
            .filter(|block| block.must_understand())
            .filter(|block| !chain.interceptors().iter().any(|i| i.understands(block)))
            .map(|block| block.name().clone())
            .collect();
        if not_understood.is_empty() {
            return Ok(true);
        }

        for name in &not_understood {
            warn!(header = %name, "mandatory header block not understood");
        }
        let mut fault = SoapFault::new(FaultCode::MustUnderstand, self.must_understand_fault_string.clone())
            .with_locale(self.must_understand_fault_locale.clone());
        if version == SoapVersion::Soap11 {
            if let Some(actor) = chain.actors_or_roles().first() {
                fault = fault.with_actor_or_role(actor.clone());
            }
        }

        let response: &mut SoapMessage = ctx.response_mut();
        if version == SoapVersion::Soap12 {
            for name in &not_understood {
                response.header_mut().add_not_understood(version, name);
            }
        }
        response.add_fault(fault)?;
        Ok(false)
    }

    /// Runs fault hooks, then resolvers, then fault hooks over the resolved
    /// fault. Returns the failure when nothing resolved it.
    fn process_failure(
        &self,
        ctx: &mut MessageContext,
        chain: &EndpointInvocationChain,
        executed: usize,
        failure: EndpointFailure,
    ) -> Option<EndpointFailure> {
        let endpoint = chain.endpoint().as_ref();
        debug!(endpoint = endpoint.name(), failure = failure.kind().name(), error = %failure, "endpoint failed");

        trigger_handle_fault_isolated(ctx, chain, executed);

        for resolver in &self.resolvers {
            if resolver.resolve_failure(ctx, Some(endpoint), &failure) {
                debug!(resolver = resolver.name(), "failure resolved to fault");
                if ctx.response().is_some_and(SoapMessage::has_fault) {
                    trigger_handle_fault_isolated(ctx, chain, executed);
                }
                return None;
            }
        }
        Some(failure)
    }
}

/// Runs fault hooks in reverse, logging hook errors instead of raising them.
fn trigger_handle_fault_isolated(ctx: &mut MessageContext, chain: &EndpointInvocationChain, executed: usize) {
    let endpoint = chain.endpoint().as_ref();
    for interceptor in chain.interceptors()[..executed].iter().rev() {
        match interceptor.handle_fault(ctx, endpoint) {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) => warn!(interceptor = interceptor.name(), error = %err, "fault hook failed"),
        }
    }
}

/// Runs pre-hooks, the endpoint and post hooks. `executed` counts the
/// interceptors whose pre-hook returned continue.
fn invoke(
    ctx: &mut MessageContext,
    chain: &EndpointInvocationChain,
    executed: &mut usize,
) -> Result<(), EndpointFailure> {
    let endpoint = chain.endpoint().as_ref();
    for interceptor in chain.interceptors() {
        if !interceptor.handle_request(ctx, endpoint)? {
            debug!(interceptor = interceptor.name(), "interceptor stopped the chain");
            return trigger_handle_response(ctx, chain, *executed);
        }
        *executed += 1;
    }
    endpoint.invoke(ctx)?;
    trigger_handle_response(ctx, chain, *executed)
}

fn trigger_handle_response(
    ctx: &mut MessageContext,
    chain: &EndpointInvocationChain,
    executed: usize,
) -> Result<(), EndpointFailure> {
    let endpoint: &dyn Endpoint = chain.endpoint().as_ref();
    let has_fault = ctx.response().is_some_and(SoapMessage::has_fault);
    for interceptor in chain.interceptors()[..executed].iter().rev() {
        if has_fault {
            if !interceptor.handle_fault(ctx, endpoint)? {
                break;
            }
        } else {
            interceptor.handle_response(ctx, endpoint)?;
        }
    }
    Ok(())
}

/// Builder for [`MessageDispatcher`].
pub struct MessageDispatcherBuilder {
    mappings: Vec<BoxedMapping>,
    resolvers: Vec<BoxedResolver>,
    interceptors: Vec<BoxedInterceptor>,
    must_understand_fault_string: String,
    must_understand_fault_locale: String,
}

impl MessageDispatcherBuilder {
    /// Creates a builder with default fault text.
    pub fn new() -> Self {
        Self {
            mappings: Vec::new(),
            resolvers: Vec::new(),
            interceptors: Vec::new(),
            must_understand_fault_string: DEFAULT_MUST_UNDERSTAND_FAULT_STRING.to_string(),
            must_understand_fault_locale: DEFAULT_FAULT_LOCALE.to_string(),
        }
    }

    /// Appends a mapping.
    #[must_use]
    pub fn mapping(self, mapping: impl EndpointMapping + 'static) -> Self {
        self.shared_mapping(Arc::new(mapping))
    }

    /// Appends a shared mapping.
    #[must_use]
    pub fn shared_mapping(mut self, mapping: BoxedMapping) -> Self {
        self.mappings.push(mapping);
        self
    }

    /// Appends a resolver.
    #[must_use]
    pub fn resolver(self, resolver: impl ExceptionResolver + 'static) -> Self {
        self.shared_resolver(Arc::new(resolver))
    }

    /// Appends a shared resolver.
    #[must_use]
    pub fn shared_resolver(mut self, resolver: BoxedResolver) -> Self {
        self.resolvers.push(resolver);
        self
    }

    /// Appends a global interceptor, placed ahead of every chain's own.
    #[must_use]
    pub fn interceptor(mut self, interceptor: BoxedInterceptor) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Sets the reason of must-understand faults.
    #[must_use]
    pub fn must_understand_fault_string(mut self, reason: impl Into<String>) -> Self {
        self.must_understand_fault_string = reason.into();
        self
    }

    /// Sets the locale of must-understand faults.
    #[must_use]
    pub fn must_understand_fault_locale(mut self, locale: impl Into<String>) -> Self {
        self.must_understand_fault_locale = locale.into();
        self
    }

    /// Builds the dispatcher.
    pub fn build(self) -> MessageDispatcher {
        MessageDispatcher {
            mappings: self.mappings,
            resolvers: self.resolvers,
            interceptors: self.interceptors,
            must_understand_fault_string: self.must_understand_fault_string,
            must_understand_fault_locale: self.must_understand_fault_locale,
        }
    }
}

impl Default for MessageDispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{FnEndpoint, PayloadEndpoint};
    use crate::interceptor::EndpointInterceptor;
    use crate::mapping::{EndpointTarget, PayloadRootQNameEndpointMapping, SoapActionEndpointMapping};
    use crate::resolver::SimpleFaultExceptionResolver;
    use herald_core::fixtures::{ILLEGAL_ARGUMENT_EXCEPTION, SECURITY_NAMESPACE};
    use herald_core::{SoapHeaderElement, TreeMessageFactory};
    use std::sync::Mutex;

    type Log = Arc<Mutex<Vec<String>>>;

    struct Recording {
        name: &'static str,
        log: Log,
        stop: bool,
        understands: Option<QName>,
    }

    impl Recording {
        fn new(name: &'static str, log: &Log) -> Self {
            Self {
                name,
                log: log.clone(),
                stop: false,
                understands: None,
            }
        }

        fn push(&self, event: &str) {
            self.log.lock().unwrap().push(format!("{}:{event}", self.name));
        }
    }

    impl EndpointInterceptor for Recording {
        fn name(&self) -> &str {
            self.name
        }

        fn handle_request(&self, _: &mut MessageContext, _: &dyn Endpoint) -> Result<bool, EndpointFailure> {
            self.push("request");
            Ok(!self.stop)
        }

        fn handle_response(&self, _: &mut MessageContext, _: &dyn Endpoint) -> Result<(), EndpointFailure> {
            self.push("response");
            Ok(())
        }

        fn handle_fault(&self, ctx: &mut MessageContext, _: &dyn Endpoint) -> Result<bool, EndpointFailure> {
            self.push(if ctx.response().is_some_and(SoapMessage::has_fault) { "fault" } else { "failure" });
            Ok(true)
        }

        fn after_completion(&self, _: &MessageContext, _: &dyn Endpoint, failure: Option<&EndpointFailure>) {
            self.push(if failure.is_some() { "complete-err" } else { "complete" });
        }

        fn understands(&self, header: &SoapHeaderElement) -> bool {
            self.understands.as_ref() == Some(header.name())
        }
    }

    fn ping_context(version: SoapVersion) -> MessageContext {
        let mut request = SoapMessage::new(version);
        request.set_payload(QName::new("urn:x", "Ping").to_element());
        MessageContext::new(request, Arc::new(TreeMessageFactory::default()))
    }

    fn ping_mapping(endpoint: impl Endpoint + 'static, interceptors: Vec<BoxedInterceptor>) -> PayloadRootQNameEndpointMapping {
        let mut builder = PayloadRootQNameEndpointMapping::builder()
            .endpoint("{urn:x}Ping", EndpointTarget::instance(endpoint));
        for interceptor in interceptors {
            builder = builder.interceptor(interceptor);
        }
        builder.build().unwrap()
    }

    fn pong() -> impl Endpoint {
        PayloadEndpoint::new("pong", |_| Ok(Some(QName::new("urn:x", "Pong").to_element())))
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[test]
    fn test_first_matching_mapping_wins() {
        let dispatcher = MessageDispatcher::builder()
            .mapping(
                SoapActionEndpointMapping::builder()
                    .endpoint("urn:other", EndpointTarget::instance(FnEndpoint::new("other", |_| Ok(()))))
                    .build()
                    .unwrap(),
            )
            .mapping(ping_mapping(pong(), vec![]))
            .mapping(ping_mapping(FnEndpoint::new("shadowed", |_| Ok(())), vec![]))
            .build();
        let ctx = ping_context(SoapVersion::Soap11);
        let chain = dispatcher.resolve(&ctx).unwrap().unwrap();
        assert_eq!(chain.endpoint().name(), "pong");
    }

    #[test]
    fn test_no_endpoint_found_after_all_decline() {
        let dispatcher = MessageDispatcher::builder()
            .mapping(
                PayloadRootQNameEndpointMapping::builder()
                    .endpoint("{urn:x}Other", EndpointTarget::named("other"))
                    .build()
                    .unwrap(),
            )
            .build();
        let mut ctx = ping_context(SoapVersion::Soap11);
        let err = dispatcher.dispatch(&mut ctx).unwrap_err();
        assert!(matches!(err, DispatchError::NoEndpointFound { .. }));
        assert_eq!(err.category().default_status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_hook_order_on_success() {
        let log = Log::default();
        let dispatcher = MessageDispatcher::builder()
            .interceptor(Arc::new(Recording::new("global", &log)))
            .mapping(ping_mapping(pong(), vec![Arc::new(Recording::new("own", &log))]))
            .build();
        let mut ctx = ping_context(SoapVersion::Soap11);
        assert_eq!(dispatcher.dispatch(&mut ctx).unwrap(), DispatchOutcome::Response);
        assert_eq!(
            entries(&log),
            [
                "global:request",
                "own:request",
                "own:response",
                "global:response",
                "own:complete",
                "global:complete"
            ]
        );
    }

    #[test]
    fn test_short_circuit_skips_endpoint_and_later_hooks() {
        let log = Log::default();
        let invoked = Arc::new(Mutex::new(false));
        let flag = invoked.clone();
        let endpoint = FnEndpoint::new("guarded", move |_| {
            *flag.lock().unwrap() = true;
            Ok(())
        });
        let mut stopper = Recording::new("second", &log);
        stopper.stop = true;
        let dispatcher = MessageDispatcher::builder()
            .mapping(ping_mapping(
                endpoint,
                vec![
                    Arc::new(Recording::new("first", &log)),
                    Arc::new(stopper),
                    Arc::new(Recording::new("third", &log)),
                ],
            ))
            .build();
        let mut ctx = ping_context(SoapVersion::Soap11);
        dispatcher.dispatch(&mut ctx).unwrap();
        assert!(!*invoked.lock().unwrap());
        assert_eq!(
            entries(&log),
            ["first:request", "second:request", "first:response", "first:complete"]
        );
    }

    #[test]
    fn test_fault_hooks_run_before_and_after_resolution() {
        let log = Log::default();
        let failing = FnEndpoint::new("failing", |_| {
            Err(EndpointFailure::new(&ILLEGAL_ARGUMENT_EXCEPTION, "negative"))
        });
        let dispatcher = MessageDispatcher::builder()
            .mapping(ping_mapping(failing, vec![Arc::new(Recording::new("own", &log))]))
            .resolver(SimpleFaultExceptionResolver::new())
            .build();
        let mut ctx = ping_context(SoapVersion::Soap12);
        let outcome = dispatcher.dispatch(&mut ctx).unwrap();
        assert_eq!(outcome, DispatchOutcome::Fault(FaultCode::ServerOrReceiver));
        assert_eq!(outcome.status_code(SoapVersion::Soap12), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(entries(&log), ["own:request", "own:failure", "own:fault", "own:complete"]);
    }

    #[test]
    fn test_unresolved_failure_propagates() {
        let log = Log::default();
        let failing = FnEndpoint::new("failing", |_| Err(anyhow::anyhow!("boom").into()));
        let dispatcher = MessageDispatcher::builder()
            .mapping(ping_mapping(failing, vec![Arc::new(Recording::new("own", &log))]))
            .build();
        let mut ctx = ping_context(SoapVersion::Soap11);
        let err = dispatcher.dispatch(&mut ctx).unwrap_err();
        assert!(matches!(err, DispatchError::Unhandled(_)));
        assert_eq!(entries(&log), ["own:request", "own:failure", "own:complete-err"]);
    }

    #[test]
    fn test_failing_fault_hook_is_isolated() {
        struct Broken;
        impl EndpointInterceptor for Broken {
            fn name(&self) -> &str {
                "broken"
            }
            fn handle_fault(&self, _: &mut MessageContext, _: &dyn Endpoint) -> Result<bool, EndpointFailure> {
                Err(anyhow::anyhow!("hook exploded").into())
            }
        }
        let failing = FnEndpoint::new("failing", |_| Err(anyhow::anyhow!("boom").into()));
        let dispatcher = MessageDispatcher::builder()
            .mapping(ping_mapping(failing, vec![Arc::new(Broken)]))
            .resolver(SimpleFaultExceptionResolver::new())
            .build();
        let mut ctx = ping_context(SoapVersion::Soap11);
        let outcome = dispatcher.dispatch(&mut ctx).unwrap();
        assert!(matches!(outcome, DispatchOutcome::Fault(_)));
        assert_eq!(ctx.response().unwrap().fault().unwrap().reason(), "boom");
    }

    #[test]
    fn test_one_way_is_distinct_from_empty_response() {
        let one_way = MessageDispatcher::builder()
            .mapping(ping_mapping(FnEndpoint::new("sink", |_| Ok(())), vec![]))
            .build();
        let mut ctx = ping_context(SoapVersion::Soap11);
        let outcome = one_way.dispatch(&mut ctx).unwrap();
        assert_eq!(outcome, DispatchOutcome::NoResponse);
        assert_eq!(outcome.status_code(SoapVersion::Soap11), StatusCode::ACCEPTED);

        let empty = MessageDispatcher::builder()
            .mapping(ping_mapping(
                FnEndpoint::new("empty", |ctx| {
                    ctx.response_mut();
                    Ok(())
                }),
                vec![],
            ))
            .build();
        let mut ctx = ping_context(SoapVersion::Soap11);
        assert_eq!(empty.dispatch(&mut ctx).unwrap(), DispatchOutcome::Response);
        assert!(ctx.response().unwrap().is_body_empty());
    }

    fn token_context(version: SoapVersion) -> MessageContext {
        let mut request = SoapMessage::new(version);
        request.set_payload(QName::new("urn:x", "Ping").to_element());
        request
            .header_mut()
            .add_header_element(QName::new(SECURITY_NAMESPACE, "Token"))
            .set_must_understand(true);
        MessageContext::new(request, Arc::new(TreeMessageFactory::default()))
    }

    #[test]
    fn test_must_understand_fault_soap12() {
        let log = Log::default();
        let dispatcher = MessageDispatcher::builder()
            .mapping(ping_mapping(pong(), vec![Arc::new(Recording::new("own", &log))]))
            .build();
        let mut ctx = token_context(SoapVersion::Soap12);
        let outcome = dispatcher.dispatch(&mut ctx).unwrap();
        assert_eq!(outcome, DispatchOutcome::Fault(FaultCode::MustUnderstand));
        assert!(entries(&log).is_empty());

        let response = ctx.response().unwrap();
        let fault = response.fault().unwrap();
        assert_eq!(fault.reason(), DEFAULT_MUST_UNDERSTAND_FAULT_STRING);
        assert_eq!(fault.locale(), Some("en"));
        let not_understood = SoapVersion::Soap12.envelope_name("NotUnderstood");
        assert_eq!(response.header().elements_named(&not_understood).count(), 1);
    }

    #[test]
    fn test_must_understand_fault_soap11_carries_actor() {
        let dispatcher = MessageDispatcher::builder()
            .mapping(
                PayloadRootQNameEndpointMapping::builder()
                    .endpoint("{urn:x}Ping", EndpointTarget::instance(pong()))
                    .actors_or_roles(vec!["urn:node".to_string()])
                    .build()
                    .unwrap(),
            )
            .must_understand_fault_string("Header not processed")
            .build();
        let mut ctx = token_context(SoapVersion::Soap11);
        dispatcher.dispatch(&mut ctx).unwrap();
        let fault = ctx.response().unwrap().fault().unwrap();
        assert_eq!(fault.reason(), "Header not processed");
        assert_eq!(fault.actor_or_role(), Some("urn:node"));
        assert!(ctx.response().unwrap().header().is_empty());
    }

    #[test]
    fn test_understood_header_proceeds() {
        let log = Log::default();
        let mut interceptor = Recording::new("security", &log);
        interceptor.understands = Some(QName::new(SECURITY_NAMESPACE, "Token"));
        let dispatcher = MessageDispatcher::builder()
            .mapping(ping_mapping(pong(), vec![Arc::new(interceptor)]))
            .build();
        let mut ctx = token_context(SoapVersion::Soap12);
        assert_eq!(dispatcher.dispatch(&mut ctx).unwrap(), DispatchOutcome::Response);
    }

    #[test]
    fn test_fault_status_codes() {
        let sender = DispatchOutcome::Fault(FaultCode::ClientOrSender);
        assert_eq!(sender.status_code(SoapVersion::Soap12), StatusCode::BAD_REQUEST);
        assert_eq!(sender.status_code(SoapVersion::Soap11), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
