//! Addressed exchanges through the dispatcher.

use bytes::Bytes;
use herald_addressing::version::{Addressing10, Addressing200408};
use herald_addressing::{
    ActionEndpointMapping, ActionRegistration, AddressingUri, AddressingVersion, MessageIdStrategy,
    MessageSender,
};
use herald_core::fixtures;
use herald_core::{
    xml, FaultCode, MessageContext, MessageFactory, QName, SoapFault, SoapMessage, SoapVersion,
    StreamingMessageFactory, TreeMessageFactory,
};
use herald_dispatch::{
    DispatchOutcome, EndpointTarget, FnEndpoint, MessageDispatcher, PayloadEndpoint, SimpleFaultExceptionResolver,
};
use http::StatusCode;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const REQUEST_ID: &str = "urn:uuid:21363e0d-2645-4eb7-8afd-2f5ee1bb25cf";

fn context(factory: Arc<dyn MessageFactory>, envelope: impl Into<Bytes>) -> MessageContext {
    let request = factory.create_message_from(&Default::default(), envelope.into()).unwrap();
    MessageContext::new(request, factory)
}

fn tree(envelope: impl Into<Bytes>) -> MessageContext {
    context(Arc::new(TreeMessageFactory::default()), envelope)
}

fn echo() -> EndpointTarget {
    EndpointTarget::instance(PayloadEndpoint::new("echo", |request| {
        let text = request.map(xml::text_of).unwrap_or_default();
        Ok(Some(xml::text_element(
            &QName::new(fixtures::ECHO_NAMESPACE, "EchoResponse"),
            text.trim(),
        )))
    }))
}

fn dispatcher(mapping: ActionEndpointMapping) -> MessageDispatcher {
    MessageDispatcher::builder().mapping(mapping).build()
}

fn echo_dispatcher() -> MessageDispatcher {
    dispatcher(
        ActionEndpointMapping::builder()
            .endpoint("urn:herald:echo:Echo", echo())
            .build()
            .unwrap(),
    )
}

fn header_text(message: &SoapMessage, version: &dyn AddressingVersion, local: &str) -> Option<String> {
    let name = QName::new(version.namespace(), local);
    let header = message.header().elements_named(&name).next()?;
    Some(header.text().trim().to_string())
}

#[derive(Debug, Default)]
struct CountingIds(AtomicUsize);

impl MessageIdStrategy for CountingIds {
    fn is_duplicate(&self, _message_id: &AddressingUri) -> bool {
        false
    }

    fn new_message_id(&self) -> AddressingUri {
        let n = self.0.fetch_add(1, Ordering::SeqCst);
        AddressingUri::parse(&format!("urn:test:reply:{n}")).unwrap()
    }
}

#[derive(Default)]
struct Outbox(Mutex<Vec<(String, Vec<u8>)>>);

impl MessageSender for Outbox {
    fn name(&self) -> &str {
        "outbox"
    }

    fn supports(&self, uri: &AddressingUri) -> bool {
        uri.as_str().starts_with("http://client.example.com/")
    }

    fn send(&self, uri: &AddressingUri, message: &SoapMessage) -> anyhow::Result<()> {
        self.0.lock().push((uri.to_string(), message.to_bytes()?));
        Ok(())
    }
}

#[test]
fn test_anonymous_reply_is_addressed_in_band() {
    let dispatcher = echo_dispatcher();
    let factories: [Arc<dyn MessageFactory>; 2] = [
        Arc::new(TreeMessageFactory::default()),
        Arc::new(StreamingMessageFactory::default()),
    ];
    for factory in factories {
        let mut ctx = context(factory, fixtures::SOAP12_ADDRESSING10_REQUEST);
        let outcome = dispatcher.dispatch(&mut ctx).unwrap();
        assert_eq!(outcome, DispatchOutcome::Response);
        assert_eq!(outcome.status_code(SoapVersion::Soap12), StatusCode::OK);

        let response = ctx.response().unwrap();
        assert_eq!(
            header_text(response, &Addressing10, "Action").as_deref(),
            Some("urn:herald:echo:EchoResponse")
        );
        assert_eq!(header_text(response, &Addressing10, "RelatesTo").as_deref(), Some(REQUEST_ID));
        assert_eq!(
            header_text(response, &Addressing10, "To").as_deref(),
            Some(Addressing10::ANONYMOUS)
        );
        let message_id = header_text(response, &Addressing10, "MessageID").unwrap();
        assert!(message_id.starts_with("urn:uuid:"));
        assert_ne!(message_id, REQUEST_ID);

        let session = QName::new(fixtures::ECHO_NAMESPACE, "Session");
        let param = response.header().elements_named(&session).next().unwrap();
        assert_eq!(param.text().trim(), "42");
        let marker = QName::new(Addressing10::NAMESPACE, "IsReferenceParameter");
        assert_eq!(xml::attribute(param.element(), &marker), Some("true"));
    }
}

#[test]
fn test_missing_message_id_is_a_fault_not_a_missing_endpoint() {
    let envelope = fixtures::SOAP12_ADDRESSING10_REQUEST
        .replace(&format!("<wsa:MessageID>{REQUEST_ID}</wsa:MessageID>"), "");
    let mut ctx = tree(envelope);
    let outcome = echo_dispatcher().dispatch(&mut ctx).unwrap();
    assert_eq!(outcome, DispatchOutcome::Fault(FaultCode::ClientOrSender));
    assert_eq!(outcome.status_code(SoapVersion::Soap12), StatusCode::BAD_REQUEST);

    let fault = ctx.response().unwrap().fault().unwrap();
    assert_eq!(
        fault.subcodes(),
        [QName::new(Addressing10::NAMESPACE, "MessageAddressingHeaderRequired")]
    );
    assert_eq!(fault.locale(), Some("en"));
}

#[test]
fn test_message_id_optional_registration_accepts_missing_id() {
    let envelope = fixtures::SOAP12_ADDRESSING10_REQUEST
        .replace(&format!("<wsa:MessageID>{REQUEST_ID}</wsa:MessageID>"), "");
    let dispatcher = dispatcher(
        ActionEndpointMapping::builder()
            .register(
                "urn:herald:echo:Echo",
                ActionRegistration::new(echo()).message_id_optional(true),
            )
            .build()
            .unwrap(),
    );
    let mut ctx = tree(envelope);
    assert_eq!(dispatcher.dispatch(&mut ctx).unwrap(), DispatchOutcome::Response);
    let response = ctx.response().unwrap();
    assert!(header_text(response, &Addressing10, "RelatesTo").is_none());
}

#[test]
fn test_malformed_200408_header_faults_with_custom_code() {
    let envelope = fixtures::SOAP11_ADDRESSING200408_REQUEST.replace(
        "<wsa:To>http://example.com/echo</wsa:To>",
        "<wsa:To>not a uri</wsa:To>",
    );
    let mut ctx = tree(envelope);
    let outcome = echo_dispatcher().dispatch(&mut ctx).unwrap();
    let code = FaultCode::Custom(QName::new(Addressing200408::NAMESPACE, "InvalidMessageInformationHeader"));
    assert_eq!(outcome, DispatchOutcome::Fault(code));
    assert_eq!(outcome.status_code(SoapVersion::Soap11), StatusCode::INTERNAL_SERVER_ERROR);

    let bytes = ctx.response().unwrap().to_bytes().unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.contains("InvalidMessageInformationHeader"), "{text}");
}

#[test]
fn test_identical_requests_produce_identical_replies() {
    let run = || {
        let dispatcher = dispatcher(
            ActionEndpointMapping::builder()
                .endpoint("urn:herald:echo:Echo", echo())
                .message_id_strategy(Arc::new(CountingIds::default()))
                .build()
                .unwrap(),
        );
        let mut ctx = tree(fixtures::SOAP12_ADDRESSING10_REQUEST);
        dispatcher.dispatch(&mut ctx).unwrap();
        ctx.response().unwrap().to_bytes().unwrap()
    };
    assert_eq!(run(), run());
}

#[test]
fn test_non_anonymous_reply_goes_out_of_band() {
    let envelope = fixtures::SOAP12_ADDRESSING10_REQUEST.replace(
        "http://www.w3.org/2005/08/addressing/anonymous",
        "http://client.example.com/replies",
    );
    let outbox = Arc::new(Outbox::default());
    let dispatcher = dispatcher(
        ActionEndpointMapping::builder()
            .endpoint("urn:herald:echo:Echo", echo())
            .message_sender(outbox.clone())
            .build()
            .unwrap(),
    );
    let mut ctx = tree(envelope);
    let outcome = dispatcher.dispatch(&mut ctx).unwrap();
    assert_eq!(outcome, DispatchOutcome::NoResponse);
    assert_eq!(outcome.status_code(SoapVersion::Soap12), StatusCode::ACCEPTED);

    let sent = outbox.0.lock();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "http://client.example.com/replies");
    let text = String::from_utf8(sent[0].1.clone()).unwrap();
    assert!(text.contains("EchoResponse"), "{text}");
    assert!(text.contains(REQUEST_ID), "{text}");
}

#[test]
fn test_endpoint_fault_uses_fault_action() {
    let failing = EndpointTarget::instance(FnEndpoint::new("rejecting", |ctx| {
        ctx.response_mut().add_fault(SoapFault::client("order rejected"))?;
        Ok(())
    }));
    let dispatcher = dispatcher(
        ActionEndpointMapping::builder()
            .endpoint("urn:herald:echo:Echo", failing)
            .fault_action_suffix("Failed")
            .build()
            .unwrap(),
    );
    let mut ctx = tree(fixtures::SOAP12_ADDRESSING10_REQUEST);
    let outcome = dispatcher.dispatch(&mut ctx).unwrap();
    assert_eq!(outcome, DispatchOutcome::Fault(FaultCode::ClientOrSender));

    let response = ctx.response().unwrap();
    assert_eq!(
        header_text(response, &Addressing10, "Action").as_deref(),
        Some("urn:herald:echo:EchoFailed")
    );
    assert_eq!(header_text(response, &Addressing10, "RelatesTo").as_deref(), Some(REQUEST_ID));
}

#[test]
fn test_unknown_action_reports_no_endpoint() {
    let dispatcher = dispatcher(
        ActionEndpointMapping::builder()
            .endpoint("urn:herald:echo:Other", echo())
            .build()
            .unwrap(),
    );
    let mut ctx = tree(fixtures::SOAP12_ADDRESSING10_REQUEST);
    let err = dispatcher.dispatch(&mut ctx).unwrap_err();
    assert!(matches!(err, herald_dispatch::DispatchError::NoEndpointFound { .. }));
}

fn throwing_dispatcher(mapping: ActionEndpointMapping) -> MessageDispatcher {
    MessageDispatcher::builder()
        .mapping(mapping)
        .resolver(SimpleFaultExceptionResolver::new())
        .build()
}

fn throwing() -> EndpointTarget {
    EndpointTarget::instance(FnEndpoint::new("throwing", |_| Err(anyhow::anyhow!("ledger offline").into())))
}

#[test]
fn test_resolved_fault_is_addressed_in_band() {
    let dispatcher = throwing_dispatcher(
        ActionEndpointMapping::builder()
            .endpoint("urn:herald:echo:Echo", throwing())
            .build()
            .unwrap(),
    );
    let mut ctx = tree(fixtures::SOAP12_ADDRESSING10_REQUEST);
    let outcome = dispatcher.dispatch(&mut ctx).unwrap();
    assert_eq!(outcome, DispatchOutcome::Fault(FaultCode::ServerOrReceiver));

    let response = ctx.response().unwrap();
    assert_eq!(response.fault().unwrap().reason(), "ledger offline");
    assert_eq!(header_text(response, &Addressing10, "RelatesTo").as_deref(), Some(REQUEST_ID));
    assert_eq!(
        header_text(response, &Addressing10, "Action").as_deref(),
        Some("urn:herald:echo:EchoFault")
    );
    assert!(header_text(response, &Addressing10, "MessageID").is_some());
    let action = QName::new(Addressing10::NAMESPACE, "Action");
    assert_eq!(response.header().elements_named(&action).count(), 1);
}

#[test]
fn test_resolved_fault_is_routed_to_fault_to() {
    let envelope = fixtures::SOAP12_ADDRESSING10_REQUEST.replace(
        "<wsa:ReplyTo>",
        "<wsa:FaultTo><wsa:Address>http://client.example.com/faults</wsa:Address></wsa:FaultTo><wsa:ReplyTo>",
    );
    let outbox = Arc::new(Outbox::default());
    let dispatcher = throwing_dispatcher(
        ActionEndpointMapping::builder()
            .endpoint("urn:herald:echo:Echo", throwing())
            .message_sender(outbox.clone())
            .build()
            .unwrap(),
    );
    let mut ctx = tree(envelope);
    let outcome = dispatcher.dispatch(&mut ctx).unwrap();
    assert_eq!(outcome, DispatchOutcome::NoResponse);
    assert!(ctx.response().is_none());

    let sent = outbox.0.lock();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "http://client.example.com/faults");

    let delivered = TreeMessageFactory::default()
        .create_message_from(&Default::default(), Bytes::from(sent[0].1.clone()))
        .unwrap();
    assert_eq!(delivered.fault().unwrap().reason(), "ledger offline");
    assert_eq!(header_text(&delivered, &Addressing10, "RelatesTo").as_deref(), Some(REQUEST_ID));
    assert_eq!(
        header_text(&delivered, &Addressing10, "Action").as_deref(),
        Some("urn:herald:echo:EchoFault")
    );
    assert_eq!(
        header_text(&delivered, &Addressing10, "To").as_deref(),
        Some("http://client.example.com/faults")
    );
}

#[test]
fn test_reference_parameter_attributes_are_copied_verbatim() {
    let envelope = fixtures::SOAP12_ADDRESSING10_REQUEST.replace(
        r#"<echo:Session xmlns:echo="urn:herald:echo">"#,
        r#"<echo:Session xmlns:echo="urn:herald:echo" xmlns:x="urn:x" x:scope="a">"#,
    );
    let dispatcher = echo_dispatcher();
    let factories: [Arc<dyn MessageFactory>; 2] = [
        Arc::new(TreeMessageFactory::default()),
        Arc::new(StreamingMessageFactory::default()),
    ];
    for factory in factories {
        let mut ctx = context(factory.clone(), envelope.clone());
        assert_eq!(dispatcher.dispatch(&mut ctx).unwrap(), DispatchOutcome::Response);

        let bytes = ctx.response().unwrap().to_bytes().unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains(r#"x:scope="a""#), "{text}");
        assert!(text.contains(r#"xmlns:x="urn:x""#), "{text}");

        let reply = factory.create_message_from(&Default::default(), Bytes::from(bytes)).unwrap();
        let session = QName::new(fixtures::ECHO_NAMESPACE, "Session");
        let param = reply.header().elements_named(&session).next().unwrap();
        assert_eq!(xml::attribute(param.element(), &QName::new("urn:x", "scope")), Some("a"));
        assert_eq!(
            xml::attribute(param.element(), &QName::new(Addressing10::NAMESPACE, "IsReferenceParameter")),
            Some("true")
        );
    }
}
