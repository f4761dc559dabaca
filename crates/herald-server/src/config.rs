//! Receiver settings.
//!
//! ```rust
//! use herald_server::ReceiverConfig;
//! use std::time::Duration;
//!
//! let config = ReceiverConfig::builder()
//!     .http_addr("127.0.0.1:8080")
//!     .request_timeout(Duration::from_secs(5))
//!     .build();
//!
//! assert_eq!(config.http_addr(), "127.0.0.1:8080");
//! assert_eq!(config.max_body_bytes(), 4 * 1024 * 1024);
//! ```

use std::net::SocketAddr;
use std::time::Duration;

/// Default bind address.
pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8080";

/// Default per-exchange timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default time to wait for open connections on shutdown.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Default request body limit.
pub const DEFAULT_MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Settings of the HTTP receiver.
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    http_addr: String,
    request_timeout: Duration,
    shutdown_timeout: Duration,
    max_body_bytes: usize,
}

impl ReceiverConfig {
    /// Creates a builder with the defaults.
    #[must_use]
    pub fn builder() -> ReceiverConfigBuilder {
        ReceiverConfigBuilder::default()
    }

    /// Returns the bind address.
    pub fn http_addr(&self) -> &str {
        &self.http_addr
    }

    /// Parses the bind address.
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.http_addr.parse()
    }

    /// Time allowed for reading the body and dispatching.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Time to wait for open connections after a shutdown signal.
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    /// Largest accepted request body.
    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`ReceiverConfig`].
#[derive(Debug, Clone)]
pub struct ReceiverConfigBuilder {
    config: ReceiverConfig,
}

impl Default for ReceiverConfigBuilder {
    fn default() -> Self {
        Self {
            config: ReceiverConfig {
                http_addr: DEFAULT_HTTP_ADDR.to_string(),
                request_timeout: DEFAULT_REQUEST_TIMEOUT,
                shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
                max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            },
        }
    }
}

impl ReceiverConfigBuilder {
    /// Sets the bind address, e.g. `"0.0.0.0:8080"`.
    pub fn http_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.http_addr = addr.into();
        self
    }

    /// Sets the per-exchange timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Sets the shutdown timeout.
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config.shutdown_timeout = timeout;
        self
    }

    /// Sets the request body limit.
    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.config.max_body_bytes = limit;
        self
    }

    /// Finishes the configuration.
    pub fn build(self) -> ReceiverConfig {
        self.config
    }
}
