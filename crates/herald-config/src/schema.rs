//! Configuration schema types.
//!
//! Every section rejects unknown fields and fills missing ones with defaults.

use herald_addressing::{AddressingVersionKind, DEFAULT_FAULT_ACTION_SUFFIX, DEFAULT_OUTPUT_ACTION_SUFFIX};
use herald_core::{SoapVersion, DEFAULT_FAULT_LOCALE};
use herald_dispatch::DEFAULT_MUST_UNDERSTAND_FAULT_STRING;
use herald_telemetry::{LogConfig, LogFormat, MetricsConfig, TelemetryConfig};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// HTTP receiver settings.
///
/// ```
/// use herald_config::ServerConfig;
///
/// let config = ServerConfig {
///     http_addr: "127.0.0.1:8080".to_string(),
///     ..Default::default()
/// };
/// assert_eq!(config.request_timeout_ms, 30_000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct ServerConfig {
    /// Bind address, e.g. `"0.0.0.0:8080"`.
    pub http_addr: String,

    /// Per-exchange timeout in milliseconds.
    pub request_timeout_ms: u64,

    /// Graceful shutdown timeout in seconds.
    pub shutdown_timeout_secs: u64,

    /// Largest accepted request body.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: "0.0.0.0:8080".to_string(),
            request_timeout_ms: 30_000,
            shutdown_timeout_secs: 30,
            max_body_bytes: 4 * 1024 * 1024,
        }
    }
}

/// Which message backend parses requests.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageFactoryKind {
    /// Full element tree per message.
    #[default]
    Tree,
    /// Raw payload bytes, materialized on demand.
    Streaming,
}

/// Dispatcher and message factory settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct DispatcherConfig {
    /// Version of messages created from scratch.
    pub soap_version: SoapVersion,

    /// Message backend.
    pub message_factory: MessageFactoryKind,

    /// Whether streaming payloads keep their materialized tree.
    pub payload_caching: bool,

    /// Reason of `MustUnderstand` faults.
    pub must_understand_fault_string: String,

    /// Locale of `MustUnderstand` faults.
    pub must_understand_fault_locale: String,

    /// Actors (1.1) or roles (1.2) the endpoints act in.
    pub actors_or_roles: Vec<String>,

    /// Whether endpoints act as the ultimate receiver.
    pub ultimate_receiver: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            soap_version: SoapVersion::Soap11,
            message_factory: MessageFactoryKind::Tree,
            payload_caching: false,
            must_understand_fault_string: DEFAULT_MUST_UNDERSTAND_FAULT_STRING.to_string(),
            must_understand_fault_locale: DEFAULT_FAULT_LOCALE.to_string(),
            actors_or_roles: Vec::new(),
            ultimate_receiver: true,
        }
    }
}

/// Endpoint lookup tables. Values are endpoint names in the registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct MappingsConfig {
    /// `{namespace}local` payload root names.
    pub payload_root: IndexMap<String, String>,

    /// Transport SOAP actions.
    pub soap_action: IndexMap<String, String>,

    /// Endpoint for requests no table matches.
    pub default_endpoint: Option<String>,
}

/// Failure to fault translation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct FaultsConfig {
    /// Definition used when no mapping matches, in `CODE,reason[,locale]` form.
    pub default_fault: Option<String>,

    /// Failure type name to fault definition, in declaration order.
    pub mappings: IndexMap<String, String>,

    /// Whether unmapped failures become `Server`/`Receiver` faults.
    pub fallback_to_server_fault: bool,
}

impl Default for FaultsConfig {
    fn default() -> Self {
        Self {
            default_fault: None,
            mappings: IndexMap::new(),
            fallback_to_server_fault: true,
        }
    }
}

/// One addressing action registration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ActionConfig {
    /// Endpoint name in the registry.
    pub endpoint: String,

    /// Destination the request must be addressed to.
    #[serde(default)]
    pub address: Option<String>,

    /// Accept requests without a `MessageID`.
    #[serde(default)]
    pub message_id_optional: bool,
}

/// WS-Addressing settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct AddressingConfig {
    /// Whether the action mapping is installed.
    pub enabled: bool,

    /// Versions tried, in order.
    pub versions: Vec<AddressingVersionKind>,

    /// Suffix of reply actions.
    pub output_action_suffix: String,

    /// Suffix of fault actions.
    pub fault_action_suffix: String,

    /// Reject requests whose `MessageID` was seen recently.
    pub detect_duplicates: bool,

    /// Action URI to registration.
    pub actions: IndexMap<String, ActionConfig>,
}

impl Default for AddressingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            versions: AddressingVersionKind::DEFAULT_ORDER.to_vec(),
            output_action_suffix: DEFAULT_OUTPUT_ACTION_SUFFIX.to_string(),
            fault_action_suffix: DEFAULT_FAULT_ACTION_SUFFIX.to_string(),
            detect_duplicates: false,
            actions: IndexMap::new(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct LoggingConfig {
    /// Enable logging.
    pub enabled: bool,

    /// Filter directives (trace, debug, info, warn, error, or per-target).
    pub level: String,

    /// Output format.
    pub format: LogFormat,

    /// Include source file and line.
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            format: LogFormat::Json,
            include_location: false,
        }
    }
}

/// Metrics settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct MetricsSection {
    /// Install the Prometheus recorder.
    pub enabled: bool,

    /// Standalone listener address. Without one the receiver serves
    /// `/metrics` itself.
    pub addr: Option<String>,
}

/// Telemetry section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct TelemetryConfigSection {
    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Metrics configuration.
    pub metrics: MetricsSection,
}

impl TelemetryConfigSection {
    /// Converts to the telemetry crate's settings.
    pub fn to_telemetry_config(&self) -> TelemetryConfig {
        TelemetryConfig {
            logging: LogConfig {
                enabled: self.logging.enabled,
                level: self.logging.level.clone(),
                format: self.logging.format,
                file_line_info: self.logging.include_location,
                span_events: self.logging.format == LogFormat::Pretty,
                ..LogConfig::default()
            },
            metrics: MetricsConfig {
                enabled: self.metrics.enabled,
                addr: self.metrics.addr.clone(),
                ..MetricsConfig::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_defaults() {
        let dispatcher = DispatcherConfig::default();
        assert_eq!(dispatcher.soap_version, SoapVersion::Soap11);
        assert!(dispatcher.ultimate_receiver);
        assert_eq!(dispatcher.must_understand_fault_locale, "en");

        let addressing = AddressingConfig::default();
        assert!(!addressing.enabled);
        assert_eq!(addressing.versions, [AddressingVersionKind::V200408, AddressingVersionKind::V10]);
        assert_eq!(addressing.output_action_suffix, "Response");

        assert!(FaultsConfig::default().fallback_to_server_fault);
        assert!(!MetricsSection::default().enabled);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: Result<ServerConfig, _> = serde_json::from_str(r#"{"http_address": "127.0.0.1:1"}"#);
        assert!(result.is_err());

        let result: Result<ActionConfig, _> = serde_json::from_str(r#"{"endpoint": "e", "adress": "urn:x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_enum_spellings() {
        let dispatcher: DispatcherConfig =
            serde_json::from_str(r#"{"soap_version": "1.2", "message_factory": "streaming"}"#).unwrap();
        assert_eq!(dispatcher.soap_version, SoapVersion::Soap12);
        assert_eq!(dispatcher.message_factory, MessageFactoryKind::Streaming);

        let addressing: AddressingConfig = serde_json::from_str(r#"{"versions": ["1.0"]}"#).unwrap();
        assert_eq!(addressing.versions, [AddressingVersionKind::V10]);
    }

    #[test]
    fn test_fault_mappings_keep_declaration_order() {
        let faults: FaultsConfig = serde_json::from_str(
            r#"{"mappings": {"RuntimeException": "CLIENT,", "Exception": "SERVER,Unexpected"}}"#,
        )
        .unwrap();
        let keys: Vec<&str> = faults.mappings.keys().map(String::as_str).collect();
        assert_eq!(keys, ["RuntimeException", "Exception"]);
    }

    #[test]
    fn test_telemetry_conversion() {
        let section = TelemetryConfigSection {
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
                include_location: true,
                ..LoggingConfig::default()
            },
            metrics: MetricsSection {
                enabled: true,
                addr: Some("127.0.0.1:9464".to_string()),
            },
        };
        let telemetry = section.to_telemetry_config();
        assert_eq!(telemetry.logging.level, "debug");
        assert!(telemetry.logging.file_line_info);
        assert!(telemetry.logging.span_events);
        assert!(telemetry.metrics.enabled);
        assert_eq!(telemetry.metrics.addr.as_deref(), Some("127.0.0.1:9464"));
    }
}
