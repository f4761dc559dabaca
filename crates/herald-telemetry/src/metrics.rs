//! Prometheus metrics for exchanges.
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `herald_exchanges_total` | Counter | `outcome`, `status` | Finished exchanges |
//! | `herald_exchange_duration_seconds` | Histogram | `outcome` | Exchange latency |
//! | `herald_faults_total` | Counter | `code` | Fault responses by code |
//! | `herald_in_flight_exchanges` | Gauge | - | Exchanges being processed |
//!
//! Recording before [`init_metrics`] is harmless; the `metrics` facade drops
//! values until a recorder is installed.

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Duration;

/// Exchange counter.
pub const EXCHANGES_TOTAL: &str = "herald_exchanges_total";
/// Exchange latency histogram.
pub const EXCHANGE_DURATION_SECONDS: &str = "herald_exchange_duration_seconds";
/// Fault counter.
pub const FAULTS_TOTAL: &str = "herald_faults_total";
/// In-flight gauge.
pub const IN_FLIGHT_EXCHANGES: &str = "herald_in_flight_exchanges";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether a recorder is installed.
    pub enabled: bool,

    /// Address of a standalone Prometheus listener. Without one, metrics are
    /// rendered through [`render_metrics`].
    pub addr: Option<String>,

    /// Buckets of the latency histogram, in seconds.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            addr: None,
            duration_buckets: vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
        }
    }
}

/// Installs the global Prometheus recorder.
///
/// With an `addr` the exporter serves its own listener and must be called
/// from within a Tokio runtime. Otherwise the recorder's handle is kept for
/// [`render_metrics`].
///
/// # Errors
///
/// Returns `TelemetryError::InvalidAddress` for an unparseable address and
/// `TelemetryError::MetricsInit` when a recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let mut builder = PrometheusBuilder::new();
    if !config.duration_buckets.is_empty() {
        builder = builder
            .set_buckets_for_metric(
                Matcher::Full(EXCHANGE_DURATION_SECONDS.to_string()),
                &config.duration_buckets,
            )
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    match &config.addr {
        Some(addr) => {
            let addr: SocketAddr = addr
                .parse()
                .map_err(|e| TelemetryError::InvalidAddress(format!("{addr}: {e}")))?;
            builder
                .with_http_listener(addr)
                .install()
                .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
            tracing::info!(%addr, "prometheus listener started");
        }
        None => {
            let handle = builder
                .install_recorder()
                .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
            let _ = METRICS_HANDLE.set(handle);
        }
    }

    describe_metrics();
    Ok(())
}

/// Renders metrics in Prometheus text format.
///
/// Returns `None` unless [`init_metrics`] installed a recorder without a
/// standalone listener.
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn describe_metrics() {
    describe_counter!(EXCHANGES_TOTAL, "Exchanges processed, by outcome and HTTP status");
    describe_histogram!(EXCHANGE_DURATION_SECONDS, "Exchange processing time in seconds");
    describe_counter!(FAULTS_TOTAL, "Fault responses, by fault code");
    describe_gauge!(IN_FLIGHT_EXCHANGES, "Exchanges currently being processed");
}

/// Records a finished exchange.
///
/// `outcome` is a label such as `response`, `fault`, `no_response` or
/// `no_endpoint`.
pub fn record_exchange(outcome: &str, status_code: u16, duration: Duration) {
    counter!(
        EXCHANGES_TOTAL,
        "outcome" => outcome.to_string(),
        "status" => status_code.to_string()
    )
    .increment(1);

    histogram!(EXCHANGE_DURATION_SECONDS, "outcome" => outcome.to_string()).record(duration.as_secs_f64());
}

/// Records a fault response.
pub fn record_fault(code: &str) {
    counter!(FAULTS_TOTAL, "code" => code.to_string()).increment(1);
}

/// Counts an exchange as in flight until dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    _private: (),
}

impl InFlightGuard {
    /// Increments the in-flight gauge.
    #[must_use]
    pub fn new() -> Self {
        gauge!(IN_FLIGHT_EXCHANGES).increment(1.0);
        Self { _private: () }
    }
}

impl Default for InFlightGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        gauge!(IN_FLIGHT_EXCHANGES).decrement(1.0);
    }
}
