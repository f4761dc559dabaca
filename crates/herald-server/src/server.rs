//! HTTP/1 accept loop.
//!
//! `POST` requests on any path are dispatched; `GET /metrics` renders the
//! Prometheus registry when one was installed without its own listener.
//!
//! ```rust,ignore
//! use herald_server::{ReceiverConfig, Server, SoapReceiver};
//!
//! let server = Server::new(ReceiverConfig::default(), receiver);
//! server.run().await?;
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{ALLOW, CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderValue, Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};

use crate::config::ReceiverConfig;
use crate::error::ServerError;
use crate::receiver::{empty, HttpResponse, SoapReceiver};
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Path serving Prometheus metrics.
pub const METRICS_PATH: &str = "/metrics";

/// The HTTP receiver.
#[derive(Debug)]
pub struct Server {
    config: ReceiverConfig,
    receiver: SoapReceiver,
}

impl Server {
    /// Creates a server for `receiver`.
    pub fn new(config: ReceiverConfig, receiver: SoapReceiver) -> Self {
        Self { config, receiver }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ReceiverConfig {
        &self.config
    }

    /// Serves until SIGTERM or SIGINT.
    pub async fn run(self) -> Result<(), ServerError> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Binds the configured address and serves until `shutdown` fires.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self
            .config
            .socket_addr()
            .map_err(|e| ServerError::invalid_address(self.config.http_addr(), e.to_string()))?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::bind(addr.to_string(), e))?;
        self.serve(listener, shutdown).await
    }

    /// Serves connections from an already bound listener.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, "receiver listening");

        let shutdown_timeout = self.config.shutdown_timeout();
        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote_addr)) => {
                        let server = Arc::clone(&server);
                        let token = tracker.acquire();
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            if let Err(e) = server.handle_connection(stream, remote_addr, shutdown).await {
                                tracing::debug!(%remote_addr, error = %e, "connection closed with error");
                            }
                            drop(token);
                        });
                    }
                    Err(e) => tracing::error!(error = %e, "failed to accept connection"),
                },
                () = shutdown.wait() => {
                    tracing::info!("shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        tokio::select! {
            () = tracker.wait_idle() => tracing::info!("all connections closed"),
            () = tokio::time::sleep(shutdown_timeout) => tracing::warn!(
                open = tracker.active_connections(),
                "shutdown timeout reached with connections still open"
            ),
        }
        Ok(())
    }

    async fn handle_connection(
        self: Arc<Self>,
        stream: TcpStream,
        remote_addr: SocketAddr,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let io = TokioIo::new(stream);
        let server = Arc::clone(&self);
        let service = service_fn(move |req: Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle_request(req).await) }
        });

        let conn = http1::Builder::new().serve_connection(io, service);
        tokio::pin!(conn);
        tokio::select! {
            result = conn.as_mut() => result,
            () = shutdown.wait() => {
                tracing::debug!(%remote_addr, "finishing connection for shutdown");
                conn.as_mut().graceful_shutdown();
                conn.await
            }
        }
    }

    async fn handle_request(&self, req: Request<Incoming>) -> HttpResponse {
        match (req.method(), req.uri().path()) {
            (&Method::GET, METRICS_PATH) => return metrics_response(),
            (&Method::POST, _) => {}
            (method, path) => {
                tracing::debug!(%method, path, "method not allowed");
                let mut response = empty(StatusCode::METHOD_NOT_ALLOWED);
                response.headers_mut().insert(ALLOW, HeaderValue::from_static("POST"));
                return response;
            }
        }

        let limit = self.config.max_body_bytes();
        let declared = req
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok());
        if declared.is_some_and(|length| length > limit) {
            tracing::warn!(limit, "request body exceeds limit");
            return empty(StatusCode::PAYLOAD_TOO_LARGE);
        }

        let timeout = self.config.request_timeout();
        let receiver = self.receiver.clone();
        let exchange = async move {
            let (parts, body) = req.into_parts();
            let body = match Limited::new(body, limit).collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
                    tracing::warn!(limit, "request body exceeds limit");
                    return empty(StatusCode::PAYLOAD_TOO_LARGE);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read request body");
                    return empty(StatusCode::BAD_REQUEST);
                }
            };
            match tokio::task::spawn_blocking(move || receiver.receive(parts.headers, body)).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(error = %e, "dispatch task failed");
                    empty(StatusCode::INTERNAL_SERVER_ERROR)
                }
            }
        };

        match tokio::time::timeout(timeout, exchange).await {
            Ok(response) => response,
            Err(_) => {
                tracing::warn!(?timeout, "exchange timed out");
                empty(StatusCode::GATEWAY_TIMEOUT)
            }
        }
    }
}

fn metrics_response() -> HttpResponse {
    match herald_telemetry::render_metrics() {
        Some(text) => {
            let mut response = Response::new(Full::new(Bytes::from(text)));
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; version=0.0.4"));
            response
        }
        None => empty(StatusCode::NOT_FOUND),
    }
}
