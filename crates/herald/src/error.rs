//! Bootstrap errors.

use herald_config::ConfigError;
use herald_core::MessageError;
use herald_dispatch::MappingError;
use herald_server::ServerError;
use herald_telemetry::TelemetryError;
use thiserror::Error;

/// Errors raised while assembling or running a node.
#[derive(Error, Debug)]
pub enum HeraldError {
    /// The configuration did not validate.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A mapping rejected its registrations.
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// A fault definition could not be parsed.
    #[error(transparent)]
    Message(#[from] MessageError),

    /// The configuration names an endpoint the registry does not hold.
    #[error("{referenced_by} refers to unknown endpoint '{name}'")]
    UnknownEndpoint {
        /// The missing endpoint name.
        name: String,
        /// The configuration entry naming it.
        referenced_by: String,
    },

    /// Logging or metrics could not be installed.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    /// The receiver stopped with an error.
    #[error(transparent)]
    Server(#[from] ServerError),
}

impl HeraldError {
    /// Creates an unknown endpoint error.
    pub fn unknown_endpoint(name: impl Into<String>, referenced_by: impl Into<String>) -> Self {
        Self::UnknownEndpoint {
            name: name.into(),
            referenced_by: referenced_by.into(),
        }
    }
}
