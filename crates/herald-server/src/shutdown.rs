//! Graceful shutdown.
//!
//! A [`ShutdownSignal`] stops the accept loop; a [`ConnectionTracker`] lets
//! the receiver wait for open connections before returning.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, Notify};

/// Cloneable shutdown trigger. Every clone observes the same state.
///
/// ```rust
/// use herald_server::ShutdownSignal;
///
/// let shutdown = ShutdownSignal::new();
/// let observer = shutdown.clone();
/// shutdown.trigger();
/// assert!(observer.is_triggered());
/// ```
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    sender: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    /// Creates an untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Creates a signal triggered by SIGTERM or SIGINT (Ctrl+C elsewhere).
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn with_os_signals() -> Self {
        let signal = Self::new();
        let trigger = signal.clone();
        tokio::spawn(async move {
            wait_for_os_signal().await;
            trigger.trigger();
        });
        signal
    }

    /// Triggers shutdown. Later calls have no effect.
    pub fn trigger(&self) {
        self.sender.send_if_modified(|triggered| !std::mem::replace(triggered, true));
    }

    /// Returns `true` once shutdown was triggered.
    pub fn is_triggered(&self) -> bool {
        *self.sender.borrow()
    }

    /// Completes when shutdown is triggered, immediately if it already was.
    pub async fn wait(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender outlives the receiver, so this cannot fail.
        let _ = receiver.wait_for(|triggered| *triggered).await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

async fn wait_for_os_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
                    _ = sigint.recv() => tracing::info!("received SIGINT, shutting down"),
                }
                return;
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(error = %e, "failed to register signal handlers, falling back to Ctrl+C");
            }
        }
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("received Ctrl+C, shutting down"),
        Err(e) => {
            tracing::error!(error = %e, "failed to listen for Ctrl+C, shutdown must be triggered manually");
            std::future::pending::<()>().await;
        }
    }
}

/// Counts open connections.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    inner: Arc<TrackerInner>,
}

#[derive(Debug, Default)]
struct TrackerInner {
    active: AtomicUsize,
    idle: Notify,
}

impl ConnectionTracker {
    /// Creates a tracker with no connections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection until the token is dropped.
    #[must_use]
    pub fn acquire(&self) -> ConnectionToken {
        self.inner.active.fetch_add(1, Ordering::SeqCst);
        ConnectionToken {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Number of open connections.
    pub fn active_connections(&self) -> usize {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// Completes once no connection is open.
    pub async fn wait_idle(&self) {
        loop {
            let idle = self.inner.idle.notified();
            if self.active_connections() == 0 {
                return;
            }
            idle.await;
        }
    }
}

/// Keeps a connection counted while alive.
#[derive(Debug)]
pub struct ConnectionToken {
    inner: Arc<TrackerInner>,
}

impl Drop for ConnectionToken {
    fn drop(&mut self) {
        if self.inner.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.inner.idle.notify_waiters();
        }
    }
}
