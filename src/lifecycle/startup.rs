//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize metrics when enabled
//! - Bind the listener and start the acceptor
//! - Wait for the acceptor to stop, then drain live actors
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The listener is bound last, after everything it depends on

use std::net::{AddrParseError, SocketAddr};
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;

use crate::config::LoadedConfig;
use crate::http::HttpServer;
use crate::lifecycle::signals::spawn_signal_listener;
use crate::lifecycle::Shutdown;
use crate::net::{ConnectionTracker, Listener, ListenerError};
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid metrics address {address:?}: {source}")]
    MetricsAddress {
        address: String,
        source: AddrParseError,
    },

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("acceptor task failed: {0}")]
    Acceptor(#[from] tokio::task::JoinError),
}

/// A started server: the acceptor runs in the background.
pub struct RunningServer {
    local_addr: SocketAddr,
    shutdown: Shutdown,
    tracker: ConnectionTracker,
    grace: Duration,
    acceptor: JoinHandle<Result<(), ListenerError>>,
}

/// Bind the listener and spawn the acceptor.
///
/// Must be called from within a Tokio runtime.
pub fn start(loaded: LoadedConfig, shutdown: Shutdown) -> Result<RunningServer, StartupError> {
    let LoadedConfig { config, paths } = loaded;
    let grace = Duration::from_secs(config.lifecycle.shutdown_grace_secs);

    let listener = Listener::bind(&config.listener)?;
    let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;

    let server = HttpServer::new(config, paths, shutdown.clone());
    let tracker = server.state().tracker.clone();
    let acceptor = tokio::spawn(server.run(listener));

    Ok(RunningServer {
        local_addr,
        shutdown,
        tracker,
        grace,
        acceptor,
    })
}

impl RunningServer {
    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Tracker of live connections, channels and jobs.
    pub fn tracker(&self) -> &ConnectionTracker {
        &self.tracker
    }

    /// Wait until the acceptor stops, then give live actors the grace period
    /// to finish.
    ///
    /// A fatal accept error triggers shutdown so that channels close too.
    pub async fn wait(self) -> Result<(), StartupError> {
        let outcome = self.acceptor.await;
        self.shutdown.trigger();

        let active = self.tracker.active_count();
        if active > 0 {
            tracing::info!(active, grace_secs = self.grace.as_secs(), "Draining");
        }
        if !self.tracker.wait_for_drain(self.grace).await {
            tracing::warn!(
                remaining = self.tracker.active_count(),
                "Grace period elapsed, abandoning remaining actors"
            );
        }

        outcome??;
        Ok(())
    }
}

/// Run the server until a termination signal or a fatal accept error.
pub async fn run(loaded: LoadedConfig) -> Result<(), StartupError> {
    let observability = &loaded.config.observability;
    if observability.metrics_enabled {
        let addr: SocketAddr =
            observability
                .metrics_address
                .parse()
                .map_err(|source| StartupError::MetricsAddress {
                    address: observability.metrics_address.clone(),
                    source,
                })?;
        metrics::init_metrics(addr)?;
    }

    let shutdown = Shutdown::new();
    let running = start(loaded, shutdown.clone())?;
    let signals = spawn_signal_listener(shutdown);

    let result = running.wait().await;
    signals.abort();

    tracing::info!("Shutdown complete");
    result
}
