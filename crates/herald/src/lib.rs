//! # Herald
//!
//! **SOAP message dispatch with WS-Addressing**
//!
//! Herald routes inbound SOAP 1.1 and 1.2 exchanges to endpoints:
//!
//! - **Mappings** pick an endpoint by payload root, SOAP action or
//!   WS-Addressing action
//! - **Interceptors** wrap each invocation with pre, post, fault and
//!   completion hooks
//! - **Resolvers** turn endpoint failures into SOAP faults
//! - **Addressing** validates message addressing properties and addresses
//!   replies in band or out of band
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use herald::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::new()
//!         .with_production()
//!         .with_optional_file("herald.toml")?
//!         .with_env_prefix("HERALD")
//!         .load()?;
//!
//!     let registry = EndpointRegistry::new()
//!         .with(PayloadEndpoint::new("echo", |request| Ok(request.cloned())));
//!
//!     let herald = Herald::from_config(config, registry)?;
//!     herald.init_telemetry()?;
//!     herald.serve().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Exchange flow
//!
//! ```text
//! bytes → MessageFactory → MessageContext → mappings → chain
//!                                                       ↓
//!   mustUnderstand check → pre hooks → endpoint → post / fault hooks
//!                                                       ↓
//!                        resolvers (on failure) → completion hooks → HTTP status
//! ```

#![doc(html_root_url = "https://docs.rs/herald/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bootstrap;
mod error;

pub use bootstrap::Herald;
pub use error::HeraldError;

// Re-export member crates
pub use herald_addressing as addressing;
pub use herald_config as config;
pub use herald_core as core;
pub use herald_dispatch as dispatch;
pub use herald_server as server;
pub use herald_telemetry as telemetry;

pub use herald_config::{ConfigLoader, HeraldConfig};
pub use herald_core::{MessageContext, QName, SoapFault, SoapMessage, SoapVersion};
pub use herald_dispatch::{
    DispatchOutcome, EndpointRegistry, EndpointTarget, FnEndpoint, MessageDispatcher, PayloadEndpoint,
};

/// Prelude module for convenient imports.
///
/// ```rust
/// use herald::prelude::*;
///
/// let registry = EndpointRegistry::new().with(FnEndpoint::new("noop", |_| Ok(())));
/// assert!(registry.contains("noop"));
/// ```
pub mod prelude {
    pub use crate::{Herald, HeraldError};

    pub use herald_core::{
        EndpointFailure, FailureType, FaultCode, FaultDefinition, MessageContext, MessageFactory, QName,
        SoapFault, SoapMessage, SoapVersion, StreamingMessageFactory, TreeMessageFactory,
    };

    pub use herald_dispatch::{
        DeclarativeEndpointMapping, DeclaredEndpoint, DispatchError, DispatchOutcome, Endpoint,
        EndpointInterceptor, EndpointMapping, EndpointMarker, EndpointMethod, EndpointRegistry, EndpointTarget,
        ExceptionResolver, FaultMappingExceptionResolver, FnEndpoint, MessageDispatcher, PayloadEndpoint,
        PayloadLoggingInterceptor, PayloadRootQNameEndpointMapping, SimpleFaultExceptionResolver,
        SoapActionEndpointMapping,
    };

    pub use herald_addressing::{
        ActionCallback, ActionEndpointMapping, ActionRegistration, AddressingInterceptor, AddressingSession,
        AddressingUri, AddressingVersionKind, EndpointReference, MessageAddressingProperties,
    };

    pub use herald_config::{ConfigLoader, HeraldConfig};

    pub use herald_server::{ReceiverConfig, Server, ShutdownSignal, SoapReceiver};
}
