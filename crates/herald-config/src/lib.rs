//! Typed configuration for Herald.
//!
//! - TOML and JSON files, merged over a preset key by key
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//!
//! [`HeraldConfig`] holds every section:
//!
//! - [`ServerConfig`] - HTTP receiver
//! - [`DispatcherConfig`] - SOAP version, message factory and `mustUnderstand` faults
//! - [`MappingsConfig`] - payload root and SOAP action tables
//! - [`FaultsConfig`] - failure to fault translation
//! - [`AddressingConfig`] - WS-Addressing action registrations
//! - [`TelemetryConfigSection`] - logging and metrics
//!
//! # Example
//!
//! ```no_run
//! use herald_config::ConfigLoader;
//!
//! # fn main() -> Result<(), herald_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_file("herald.toml")?
//!     .with_env_prefix("HERALD")
//!     .load()?;
//!
//! println!("Receiver will listen on: {}", config.server.http_addr);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! request_timeout_ms = 30000
//!
//! [dispatcher]
//! soap_version = "1.2"
//! message_factory = "streaming"
//! payload_caching = true
//!
//! [mappings.payload_root]
//! "{urn:orders}PlaceOrder" = "orders"
//!
//! [mappings.soap_action]
//! "urn:orders:Cancel" = "cancellations"
//!
//! [faults]
//! default_fault = "SERVER,Something went wrong"
//!
//! [faults.mappings]
//! OrderRejected = "CLIENT,Order rejected,en"
//!
//! [addressing]
//! enabled = true
//! versions = ["1.0"]
//!
//! [addressing.actions."urn:orders:Track"]
//! endpoint = "tracking"
//!
//! [telemetry.logging]
//! level = "info"
//! format = "json"
//!
//! [telemetry.metrics]
//! enabled = true
//! ```
//!
//! # Environment Variable Overrides
//!
//! Scalar values can be overridden with `PREFIX__SECTION__KEY` variables:
//!
//! - `HERALD__SERVER__HTTP_ADDR=0.0.0.0:9000`
//! - `HERALD__DISPATCHER__ACTORS_OR_ROLES=urn:a,urn:b`
//! - `HERALD__TELEMETRY__METRICS__ENABLED=false`

#![doc(html_root_url = "https://docs.rs/herald-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::*;
pub use error::ConfigError;
pub use herald_addressing::AddressingVersionKind;
pub use herald_telemetry::LogFormat;
pub use loader::ConfigLoader;
pub use schema::*;
