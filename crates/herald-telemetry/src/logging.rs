//! Structured logging.
//!
//! Installs a `tracing-subscriber` registry with an [`EnvFilter`] and either
//! a JSON or a pretty formatting layer. Herald's crates log with structured
//! fields such as `exchange_id`, `endpoint`, `mapping` and `action`.
//!
//! # Example
//!
//! ```rust,ignore
//! use herald_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!(exchange_id = %id, "exchange received");
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Output format of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Multi-line human-readable output.
    Pretty,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::Pretty => f.write_str("pretty"),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether logging is installed at all.
    pub enabled: bool,

    /// Filter directives, e.g. `"info"` or `"herald_dispatch=debug,info"`.
    pub level: String,

    /// Output format.
    pub format: LogFormat,

    /// Whether span open and close events are logged.
    pub span_events: bool,

    /// Whether file and line are included.
    pub file_line_info: bool,

    /// Whether thread ids are included.
    pub thread_ids: bool,

    /// Whether the module path is included.
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            format: LogFormat::Json,
            span_events: false,
            file_line_info: false,
            thread_ids: false,
            include_target: true,
        }
    }
}

impl LogConfig {
    /// Human-readable debug output with span events and source locations.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            format: LogFormat::Pretty,
            span_events: true,
            file_line_info: true,
            ..Self::default()
        }
    }

    /// JSON output at info level.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }
}

/// Installs the global log subscriber.
///
/// Does nothing when `config.enabled` is false.
///
/// # Errors
///
/// Returns `TelemetryError::LoggingInit` when the filter does not parse or a
/// global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;
    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let installed = match config.format {
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_span_events(span_events)
                .with_file(config.file_line_info)
                .with_line_number(config.file_line_info)
                .with_thread_ids(config.thread_ids)
                .with_target(config.include_target)
                .with_filter(filter);
            tracing_subscriber::registry().with(fmt_layer).try_init()
        }
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_span_events(span_events)
                .with_file(config.file_line_info)
                .with_line_number(config.file_line_info)
                .with_thread_ids(config.thread_ids)
                .with_target(config.include_target)
                .with_filter(filter);
            tracing_subscriber::registry().with(fmt_layer).try_init()
        }
    };
    installed.map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

/// Parses filter directives.
///
/// # Errors
///
/// Returns `TelemetryError::LoggingInit` for invalid directives.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter).map_err(|e| TelemetryError::LoggingInit(format!("invalid log level '{filter}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let dev = LogConfig::development();
        assert_eq!(dev.format, LogFormat::Pretty);
        assert!(dev.span_events);
        assert_eq!(dev.level, "debug");

        let prod = LogConfig::production();
        assert_eq!(prod.format, LogFormat::Json);
        assert!(!prod.file_line_info);
        assert_eq!(prod.level, "info");
    }

    #[test]
    fn test_format_serde() {
        let format: LogFormat = serde_json::from_str("\"pretty\"").unwrap();
        assert_eq!(format, LogFormat::Pretty);
        assert_eq!(serde_json::to_string(&LogFormat::Json).unwrap(), "\"json\"");
        assert_eq!(LogFormat::Pretty.to_string(), "pretty");
    }

    #[test]
    fn test_env_filter() {
        assert!(create_env_filter("herald_dispatch=debug,info").is_ok());
        assert!(matches!(
            create_env_filter("herald=notalevel"),
            Err(TelemetryError::LoggingInit(_))
        ));
    }

    #[test]
    fn test_disabled_logging_is_a_no_op() {
        let config = LogConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(init_logging(&config).is_ok());
    }
}
