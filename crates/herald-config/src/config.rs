//! Top-level configuration and its builder.

use crate::{
    AddressingConfig, ConfigError, DispatcherConfig, FaultsConfig, MappingsConfig, ServerConfig,
    TelemetryConfigSection,
};
use herald_addressing::AddressingUri;
use herald_core::{FaultDefinition, QName, SoapVersion};
use herald_telemetry::{create_env_filter, LogFormat};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Complete Herald configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to layer files and environment
/// variables over the defaults.
///
/// ```
/// use herald_config::HeraldConfig;
///
/// let config = HeraldConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields, default)]
pub struct HeraldConfig {
    /// HTTP receiver.
    pub server: ServerConfig,

    /// Dispatcher and message factory.
    pub dispatcher: DispatcherConfig,

    /// Endpoint lookup tables.
    pub mappings: MappingsConfig,

    /// Failure to fault translation.
    pub faults: FaultsConfig,

    /// WS-Addressing.
    pub addressing: AddressingConfig,

    /// Logging and metrics.
    pub telemetry: TelemetryConfigSection,
}

impl HeraldConfig {
    /// Creates a configuration builder.
    #[must_use]
    pub fn builder() -> HeraldConfigBuilder {
        HeraldConfigBuilder::new()
    }

    /// Checks every value the runtime parses.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending field,
    /// or `ConfigError::ValidationError` for inconsistent sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_socket_addr("server.http_addr", &self.server.http_addr)?;
        if self.server.request_timeout_ms == 0 {
            return Err(ConfigError::invalid_value("server.request_timeout_ms", "must be positive"));
        }
        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::invalid_value("server.max_body_bytes", "must be positive"));
        }

        for name in self.mappings.payload_root.keys() {
            QName::from_clark(name)
                .map_err(|e| ConfigError::invalid_value(format!("mappings.payload_root.{name}"), e.to_string()))?;
        }
        self.validate_faults(self.dispatcher.soap_version)?;
        self.validate_addressing()?;

        if let Some(addr) = &self.telemetry.metrics.addr {
            parse_socket_addr("telemetry.metrics.addr", addr)?;
        }
        if self.telemetry.logging.enabled {
            create_env_filter(&self.telemetry.logging.level)
                .map_err(|e| ConfigError::invalid_value("telemetry.logging.level", e.to_string()))?;
        }
        Ok(())
    }

    fn validate_faults(&self, version: SoapVersion) -> Result<(), ConfigError> {
        let definitions = self
            .faults
            .default_fault
            .iter()
            .map(|text| ("faults.default_fault".to_string(), text))
            .chain(
                self.faults
                    .mappings
                    .iter()
                    .map(|(failure, text)| (format!("faults.mappings.{failure}"), text)),
            );
        for (field, text) in definitions {
            let definition: FaultDefinition = text
                .parse()
                .map_err(|e: herald_core::MessageError| ConfigError::invalid_value(field.as_str(), e.to_string()))?;
            definition
                .to_fault("")
                .validate(version)
                .map_err(|e| ConfigError::invalid_value(field.as_str(), e.to_string()))?;
        }
        Ok(())
    }

    fn validate_addressing(&self) -> Result<(), ConfigError> {
        let addressing = &self.addressing;
        if !addressing.enabled {
            return Ok(());
        }
        if addressing.versions.is_empty() {
            return Err(ConfigError::validation_error(
                "addressing.versions must name at least one version when addressing is enabled",
            ));
        }
        for (field, suffix) in [
            ("addressing.output_action_suffix", &addressing.output_action_suffix),
            ("addressing.fault_action_suffix", &addressing.fault_action_suffix),
        ] {
            if suffix.trim().is_empty() {
                return Err(ConfigError::invalid_value(field, "must not be empty"));
            }
        }
        for (action, registration) in &addressing.actions {
            AddressingUri::parse(action)
                .map_err(|e| ConfigError::invalid_value(format!("addressing.actions.{action}"), e.to_string()))?;
            if let Some(address) = &registration.address {
                AddressingUri::parse(address).map_err(|e| {
                    ConfigError::invalid_value(format!("addressing.actions.{action}.address"), e.to_string())
                })?;
            }
        }
        Ok(())
    }

    /// Development preset: pretty debug logs with source locations.
    ///
    /// ```
    /// use herald_config::HeraldConfig;
    ///
    /// let config = HeraldConfig::development();
    /// assert_eq!(config.telemetry.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.server.http_addr = "127.0.0.1:8080".to_string();
        config.telemetry.logging.level = "debug".to_string();
        config.telemetry.logging.format = LogFormat::Pretty;
        config.telemetry.logging.include_location = true;
        config
    }

    /// Production preset: JSON logs and metrics.
    ///
    /// ```
    /// use herald_config::HeraldConfig;
    ///
    /// let config = HeraldConfig::production();
    /// assert!(config.telemetry.metrics.enabled);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.telemetry.logging.level = "info".to_string();
        config.telemetry.logging.format = LogFormat::Json;
        config.telemetry.metrics.enabled = true;
        config
    }
}

fn parse_socket_addr(field: &str, value: &str) -> Result<SocketAddr, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::invalid_value(field, format!("invalid socket address: {value}")))
}

/// Builder for [`HeraldConfig`].
#[derive(Debug, Default)]
pub struct HeraldConfigBuilder {
    config: HeraldConfig,
}

impl HeraldConfigBuilder {
    /// Creates a builder with default sections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the server section.
    #[must_use]
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.config.server = server;
        self
    }

    /// Sets the dispatcher section.
    #[must_use]
    pub fn dispatcher(mut self, dispatcher: DispatcherConfig) -> Self {
        self.config.dispatcher = dispatcher;
        self
    }

    /// Sets the mappings section.
    #[must_use]
    pub fn mappings(mut self, mappings: MappingsConfig) -> Self {
        self.config.mappings = mappings;
        self
    }

    /// Sets the faults section.
    #[must_use]
    pub fn faults(mut self, faults: FaultsConfig) -> Self {
        self.config.faults = faults;
        self
    }

    /// Sets the addressing section.
    #[must_use]
    pub fn addressing(mut self, addressing: AddressingConfig) -> Self {
        self.config.addressing = addressing;
        self
    }

    /// Sets the telemetry section.
    #[must_use]
    pub fn telemetry(mut self, telemetry: TelemetryConfigSection) -> Self {
        self.config.telemetry = telemetry;
        self
    }

    /// Returns the configuration without validating it.
    #[must_use]
    pub fn build(self) -> HeraldConfig {
        self.config
    }

    /// Returns the configuration if it validates.
    pub fn build_validated(self) -> Result<HeraldConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
