//! # Herald Dispatch
//!
//! Routes SOAP exchanges to endpoints.
//!
//! - [`MessageDispatcher`] - Resolve, check headers, invoke, resolve faults
//! - [`EndpointMapping`] - Payload-root, SOAP-action and declarative strategies
//! - [`EndpointInterceptor`] - Pre, post, fault and completion hooks
//! - [`ExceptionResolver`] - Depth-matching and catch-all fault resolution
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use herald_core::{fixtures, MessageContext, MessageFactory, SoapVersion, TreeMessageFactory};
//! use herald_dispatch::{
//!     DispatchOutcome, EndpointTarget, MessageDispatcher, PayloadEndpoint,
//!     PayloadRootQNameEndpointMapping, SimpleFaultExceptionResolver,
//! };
//! use std::sync::Arc;
//!
//! let echo = PayloadEndpoint::new("echo", |request| Ok(request.cloned()));
//! let dispatcher = MessageDispatcher::builder()
//!     .mapping(
//!         PayloadRootQNameEndpointMapping::builder()
//!             .endpoint("{urn:herald:echo}EchoRequest", EndpointTarget::instance(echo))
//!             .build()
//!             .unwrap(),
//!     )
//!     .resolver(SimpleFaultExceptionResolver::new())
//!     .build();
//!
//! let factory = Arc::new(TreeMessageFactory::new(SoapVersion::Soap11));
//! let request = factory
//!     .create_message_from(&Default::default(), Bytes::from_static(fixtures::SOAP11_ECHO_REQUEST.as_bytes()))
//!     .unwrap();
//! let mut ctx = MessageContext::new(request, factory);
//! assert_eq!(dispatcher.dispatch(&mut ctx).unwrap(), DispatchOutcome::Response);
//! ```

#![doc(html_root_url = "https://docs.rs/herald-dispatch/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod chain;
mod dispatcher;
mod endpoint;
mod error;
mod interceptor;
pub mod mapping;
pub mod resolver;

pub use chain::EndpointInvocationChain;
pub use dispatcher::{
    DispatchOutcome, MessageDispatcher, MessageDispatcherBuilder, DEFAULT_MUST_UNDERSTAND_FAULT_STRING,
};
pub use endpoint::{
    BoxedEndpoint, Endpoint, EndpointMethodFn, EndpointRegistry, FnEndpoint, MethodEndpoint, PayloadEndpoint,
};
pub use error::{DispatchError, MappingError};
pub use interceptor::{BoxedInterceptor, EndpointInterceptor, PayloadLoggingInterceptor};
pub use mapping::{
    declared_methods, BoxedMapping, DeclarativeEndpointMapping, DeclaredEndpoint, EndpointMapping, EndpointMarker,
    EndpointMethod, EndpointTarget, MappingSupport, PayloadRootQNameEndpointMapping, SoapActionEndpointMapping,
};
pub use resolver::{
    BoxedResolver, ExceptionResolver, FaultMappingExceptionResolver, SimpleFaultExceptionResolver,
};
