//! Exchange handling independent of the socket layer.
//!
//! [`SoapReceiver::receive`] turns one request body into one HTTP response,
//! applying the SOAP HTTP binding:
//!
//! | Outcome | Status | Body |
//! |---------|--------|------|
//! | response | 200 | envelope |
//! | no response | 202 | empty |
//! | fault | 500, or 400 for SOAP 1.2 `Sender` | fault envelope |
//! | no endpoint | 404 | empty |
//! | unreadable message | 400 | empty |
//! | unhandled failure | 500 | empty |

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, Response, StatusCode};
use http_body_util::Full;

use herald_core::{MessageContext, MessageFactory, SoapMessage};
use herald_dispatch::{DispatchError, DispatchOutcome, MessageDispatcher};
use herald_telemetry::{record_exchange, record_fault, InFlightGuard};

/// Response body type.
pub type ResponseBody = Full<Bytes>;

/// HTTP response produced by the receiver.
pub type HttpResponse = Response<ResponseBody>;

/// Parses requests, dispatches them and serializes the outcome.
///
/// `receive` blocks for the whole exchange; the server runs it on the
/// blocking pool.
#[derive(Clone)]
pub struct SoapReceiver {
    dispatcher: Arc<MessageDispatcher>,
    factory: Arc<dyn MessageFactory>,
}

impl SoapReceiver {
    /// Creates a receiver over a built dispatcher.
    pub fn new(dispatcher: Arc<MessageDispatcher>, factory: Arc<dyn MessageFactory>) -> Self {
        Self { dispatcher, factory }
    }

    /// Returns the dispatcher.
    pub fn dispatcher(&self) -> &Arc<MessageDispatcher> {
        &self.dispatcher
    }

    /// Returns the message factory.
    pub fn factory(&self) -> &Arc<dyn MessageFactory> {
        &self.factory
    }

    /// Handles one exchange.
    pub fn receive(&self, headers: HeaderMap, body: Bytes) -> HttpResponse {
        let _in_flight = InFlightGuard::new();
        let started = Instant::now();

        let request = match self.factory.create_message_from(&headers, body) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "rejecting unreadable request");
                let status = e.category().default_status_code();
                record_exchange("invalid", status.as_u16(), started.elapsed());
                return empty(status);
            }
        };

        let version = request.version();
        let mut ctx = MessageContext::new(request, Arc::clone(&self.factory)).with_transport_headers(headers);
        let span = tracing::info_span!("exchange", exchange_id = %ctx.exchange_id(), %version);
        let _entered = span.enter();

        let (label, response) = match self.dispatcher.dispatch(&mut ctx) {
            Ok(outcome) => {
                if let DispatchOutcome::Fault(code) = &outcome {
                    record_fault(code.label());
                }
                let status = outcome.status_code(version);
                let response = match ctx.take_response() {
                    Some(message) => envelope(status, &message),
                    None => empty(status),
                };
                (outcome.label(), response)
            }
            Err(e @ DispatchError::NoEndpointFound { .. }) => {
                tracing::warn!(error = %e, "no endpoint mapped");
                ("no_endpoint", empty(e.category().default_status_code()))
            }
            Err(e) => {
                tracing::error!(error = %e, "exchange failed");
                ("unhandled", empty(e.category().default_status_code()))
            }
        };

        let elapsed = started.elapsed();
        tracing::debug!(status = response.status().as_u16(), outcome = label, ?elapsed, "exchange finished");
        record_exchange(label, response.status().as_u16(), elapsed);
        response
    }
}

impl std::fmt::Debug for SoapReceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoapReceiver").field("factory", &self.factory).finish_non_exhaustive()
    }
}

fn envelope(status: StatusCode, message: &SoapMessage) -> HttpResponse {
    let bytes = match message.to_bytes() {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize response");
            return empty(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };
    let mut response = Response::new(Full::new(Bytes::from(bytes)));
    *response.status_mut() = status;
    if let Ok(content_type) = HeaderValue::from_str(&message.content_type()) {
        response.headers_mut().insert(CONTENT_TYPE, content_type);
    }
    response
}

/// Builds a response without a body.
pub(crate) fn empty(status: StatusCode) -> HttpResponse {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::{fixtures, EndpointFailure, SoapVersion, StreamingMessageFactory, TreeMessageFactory, FAILURE};
    use herald_dispatch::{
        EndpointTarget, FnEndpoint, PayloadEndpoint, PayloadRootQNameEndpointMapping, SimpleFaultExceptionResolver,
    };
    use http_body_util::BodyExt;

    const ECHO_ROOT: &str = "{urn:herald:echo}EchoRequest";

    fn receiver(target: EndpointTarget, resolve: bool) -> SoapReceiver {
        let mut builder = MessageDispatcher::builder().mapping(
            PayloadRootQNameEndpointMapping::builder()
                .endpoint(ECHO_ROOT, target)
                .build()
                .unwrap(),
        );
        if resolve {
            builder = builder.resolver(SimpleFaultExceptionResolver::new());
        }
        SoapReceiver::new(Arc::new(builder.build()), Arc::new(TreeMessageFactory::new(SoapVersion::Soap11)))
    }

    fn echo() -> EndpointTarget {
        EndpointTarget::instance(PayloadEndpoint::new("echo", |request| Ok(request.cloned())))
    }

    fn failing() -> EndpointTarget {
        EndpointTarget::instance(FnEndpoint::new("failing", |_| Err(EndpointFailure::new(&FAILURE, "boom"))))
    }

    async fn body_text(response: HttpResponse) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_response_is_ok_with_envelope() {
        let response = receiver(echo(), true).receive(HeaderMap::new(), Bytes::from_static(fixtures::SOAP11_ECHO_REQUEST.as_bytes()));
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[CONTENT_TYPE].to_str().unwrap().starts_with("text/xml"));
        assert!(body_text(response).await.contains("EchoRequest"));
    }

    #[tokio::test]
    async fn test_soap12_response_uses_soap_xml_content_type() {
        let receiver = receiver(echo(), true);
        let response = receiver.receive(HeaderMap::new(), Bytes::from_static(fixtures::SOAP12_ECHO_REQUEST.as_bytes()));
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("application/soap+xml"));
    }

    #[tokio::test]
    async fn test_one_way_is_accepted_without_body() {
        let sink = EndpointTarget::instance(PayloadEndpoint::new("sink", |_| Ok(None)));
        let response = receiver(sink, true).receive(HeaderMap::new(), Bytes::from_static(fixtures::SOAP11_ECHO_REQUEST.as_bytes()));
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(body_text(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_resolved_failure_is_fault_envelope() {
        let response = receiver(failing(), true).receive(HeaderMap::new(), Bytes::from_static(fixtures::SOAP11_ECHO_REQUEST.as_bytes()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_text(response).await;
        assert!(body.contains("Fault"), "{body}");
        assert!(body.contains("boom"), "{body}");
    }

    #[tokio::test]
    async fn test_unhandled_failure_hides_detail() {
        let response = receiver(failing(), false).receive(HeaderMap::new(), Bytes::from_static(fixtures::SOAP11_ECHO_REQUEST.as_bytes()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_text(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_unmapped_request_is_not_found() {
        let body = fixtures::SOAP11_ECHO_REQUEST.replace("EchoRequest", "PingRequest");
        let response = receiver(echo(), true).receive(HeaderMap::new(), Bytes::from(body));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_text(response).await.is_empty());
    }

    #[test]
    fn test_garbage_is_bad_request() {
        let response = receiver(echo(), true).receive(HeaderMap::new(), Bytes::from_static(b"<not-soap"));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_streaming_factory_round_trip() {
        let dispatcher = MessageDispatcher::builder()
            .mapping(
                PayloadRootQNameEndpointMapping::builder()
                    .endpoint(ECHO_ROOT, echo())
                    .build()
                    .unwrap(),
            )
            .build();
        let receiver = SoapReceiver::new(
            Arc::new(dispatcher),
            Arc::new(StreamingMessageFactory::new(SoapVersion::Soap11)),
        );
        let response = receiver.receive(HeaderMap::new(), Bytes::from_static(fixtures::SOAP11_ECHO_REQUEST.as_bytes()));
        assert_eq!(response.status(), StatusCode::OK);
    }
}
