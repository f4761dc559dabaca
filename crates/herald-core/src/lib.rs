//! # Herald Core
//!
//! Message model and exchange context for the Herald SOAP dispatch core.
//!
//! - [`SoapMessage`] - Version, header blocks and a payload or fault body
//! - [`Payload`] - Tree ([`TreePayload`]) and streaming ([`StreamingPayload`]) backends
//! - [`MessageFactory`] - Parses inbound envelopes with either backend
//! - [`MessageContext`] - Per-exchange request, response and properties
//! - [`SoapFault`] / [`FaultDefinition`] - Faults and their declarative templates
//! - [`EndpointFailure`] / [`FailureType`] - Endpoint failures with an explicit type hierarchy

#![doc(html_root_url = "https://docs.rs/herald-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod factory;
mod failure;
mod fault;
pub mod fixtures;
mod header;
mod message;
mod payload;
mod qname;
mod version;
pub mod xml;

pub use context::{ExchangeId, MessageContext};
pub use error::{ErrorCategory, MessageError, MessageResult};
pub use factory::{
    soap_action_from_headers, MessageFactory, StreamingMessageFactory, TreeMessageFactory,
    SOAP_ACTION_HEADER,
};
pub use failure::{EndpointFailure, FailureType, FAILURE, MESSAGE_FAILURE};
pub use fault::{FaultCode, FaultDefinition, SoapFault, DEFAULT_FAULT_LOCALE};
pub use header::{SoapHeader, SoapHeaderElement};
pub use message::{SoapBody, SoapMessage};
pub use payload::{Payload, StreamingPayload, TreePayload};
pub use qname::QName;
pub use version::{SoapVersion, ENVELOPE_PREFIX, SOAP11_ENVELOPE_NAMESPACE, SOAP12_ENVELOPE_NAMESPACE};
