//! # Herald Server
//!
//! HTTP/1 receiver adapter for the Herald dispatch core.
//!
//! - [`SoapReceiver`] - Parse, dispatch and apply the SOAP HTTP binding
//! - [`Server`] - Hyper accept loop running dispatch on the blocking pool
//! - [`ShutdownSignal`] - Graceful shutdown
//!
//! ## Example
//!
//! ```rust,ignore
//! use herald_server::{ReceiverConfig, Server, SoapReceiver};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let receiver = SoapReceiver::new(Arc::new(dispatcher), factory);
//!     let config = ReceiverConfig::builder().http_addr("0.0.0.0:8080").build();
//!     Server::new(config, receiver).run().await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/herald-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod receiver;
mod server;
pub mod shutdown;

pub use config::{
    ReceiverConfig, ReceiverConfigBuilder, DEFAULT_HTTP_ADDR, DEFAULT_MAX_BODY_BYTES, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use error::ServerError;
pub use receiver::{HttpResponse, ResponseBody, SoapReceiver};
pub use server::{Server, METRICS_PATH};
pub use shutdown::ShutdownSignal;
