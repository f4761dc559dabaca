//! Logging and metrics for Herald.
//!
//! - **Logging**: `tracing-subscriber` with JSON or pretty output
//! - **Metrics**: Prometheus-format exchange metrics via the `metrics` crate
//!
//! # Example
//!
//! ```rust,ignore
//! use herald_telemetry::{init_telemetry, LogConfig, MetricsConfig, TelemetryConfig};
//!
//! init_telemetry(&TelemetryConfig {
//!     logging: LogConfig::production(),
//!     metrics: MetricsConfig::default(),
//! })?;
//! ```

#![doc(html_root_url = "https://docs.rs/herald-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat};
pub use self::metrics::{init_metrics, record_exchange, record_fault, render_metrics, InFlightGuard, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Settings for every telemetry subsystem.
#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig {
    /// Logging settings.
    pub logging: LogConfig,
    /// Metrics settings.
    pub metrics: MetricsConfig,
}

/// Installs logging, then metrics.
///
/// # Errors
///
/// Returns the first subsystem's `TelemetryError`.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;
    Ok(())
}
