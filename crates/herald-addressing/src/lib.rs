//! # Herald Addressing
//!
//! WS-Addressing correlation for Herald.
//!
//! - [`AddressingVersion`] - 2004/08 and 1.0 vocabularies, header parsing and emission
//! - [`MessageAddressingProperties`] - The per-message property set and reply derivation
//! - [`AddressingInterceptor`] - Request validation and reply routing
//! - [`ActionEndpointMapping`] - Endpoint lookup by addressing action
//! - [`ActionCallback`] - Outbound request headers
//!
//! Properties are derived per message. The only retained state is the
//! opt-in [`AddressingSession`] and duplicate-detecting id strategies.
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use herald_addressing::ActionEndpointMapping;
//! use herald_core::{fixtures, MessageContext, MessageFactory, TreeMessageFactory};
//! use herald_dispatch::{DispatchOutcome, EndpointTarget, MessageDispatcher, PayloadEndpoint};
//! use std::sync::Arc;
//!
//! let echo = PayloadEndpoint::new("echo", |request| Ok(request.cloned()));
//! let dispatcher = MessageDispatcher::builder()
//!     .mapping(
//!         ActionEndpointMapping::builder()
//!             .endpoint("urn:herald:echo:Echo", EndpointTarget::instance(echo))
//!             .build()
//!             .unwrap(),
//!     )
//!     .build();
//!
//! let factory = Arc::new(TreeMessageFactory::default());
//! let request = factory
//!     .create_message_from(&Default::default(), Bytes::from_static(fixtures::SOAP12_ADDRESSING10_REQUEST.as_bytes()))
//!     .unwrap();
//! let mut ctx = MessageContext::new(request, factory);
//! assert_eq!(dispatcher.dispatch(&mut ctx).unwrap(), DispatchOutcome::Response);
//! assert!(!ctx.response().unwrap().header().is_empty());
//! ```

#![doc(html_root_url = "https://docs.rs/herald-addressing/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod epr;
mod error;
mod interceptor;
mod map;
mod mapping;
mod sender;
mod session;
mod strategy;
mod uri;
pub mod version;

pub use client::ActionCallback;
pub use epr::EndpointReference;
pub use error::{AddressingError, AddressingResult};
pub use interceptor::{AddressingInterceptor, ADDRESSING_FAILURE};
pub use map::MessageAddressingProperties;
pub use mapping::{
    ActionEndpointMapping, ActionMappingBuilder, ActionRegistration, DEFAULT_FAULT_ACTION_SUFFIX,
    DEFAULT_OUTPUT_ACTION_SUFFIX,
};
pub use sender::{sender_for, BoxedMessageSender, MessageSender};
pub use session::AddressingSession;
pub use strategy::{BoxedMessageIdStrategy, MemoryMessageIdStrategy, MessageIdStrategy, UuidMessageIdStrategy};
pub use uri::AddressingUri;
pub use version::{
    Addressing10, Addressing200408, AddressingVersion, AddressingVersionKind, BoxedAddressingVersion,
};
