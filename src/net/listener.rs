//! TCP listener implementation with backpressure.
//!
//! # Responsibilities
//! - Bind to the configured address
//! - Accept incoming TCP connections
//! - Enforce max_connections limit via semaphore
//! - Keep accepting through transient accept errors, stop on fatal ones

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::Semaphore;

use crate::config::ListenerConfig;
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;

/// Pending connection queue length handed to `listen(2)`.
const LISTEN_BACKLOG: u32 = 1024;

/// Pause after a transient accept error, so fd exhaustion does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    Bind(io::Error),
    /// Failed to accept connection.
    #[error("Failed to accept: {0}")]
    Accept(io::Error),
    /// The listener stopped serving; no further connections are admitted.
    #[error("Listener closed")]
    Closed,
}

/// Whether an accept error only affects the connection being accepted.
///
/// Aborted handshakes and descriptor exhaustion clear up on their own; anything
/// else means the listening socket itself is broken.
pub fn is_transient(err: &io::Error) -> bool {
    match err.kind() {
        io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionRefused
        | io::ErrorKind::Interrupted
        | io::ErrorKind::WouldBlock
        | io::ErrorKind::TimedOut
        | io::ErrorKind::OutOfMemory => true,
        // ENFILE / EMFILE
        _ => matches!(err.raw_os_error(), Some(23) | Some(24)),
    }
}

/// A bounded TCP listener that limits concurrent connections.
///
/// Uses a semaphore to enforce `max_connections`. When the limit is reached,
/// new connections will wait until a slot becomes available.
pub struct Listener {
    /// The underlying TCP listener.
    inner: TcpListener,
    /// Semaphore to limit concurrent connections.
    connection_limit: Arc<Semaphore>,
    /// Configured maximum connections.
    max_connections: usize,
}

impl Listener {
    /// Bind to the configured address with connection limits.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let addr = config
            .socket_addr()
            .map_err(|e| ListenerError::Bind(io::Error::new(io::ErrorKind::InvalidInput, e)))?;

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .map_err(ListenerError::Bind)?;

        #[cfg(unix)]
        socket.set_reuseaddr(true).map_err(ListenerError::Bind)?;

        socket.bind(addr).map_err(ListenerError::Bind)?;
        let listener = socket.listen(LISTEN_BACKLOG).map_err(ListenerError::Bind)?;

        let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;

        tracing::info!(
            address = %local_addr,
            max_connections = config.max_connections,
            "Listener bound"
        );

        Ok(Self {
            inner: listener,
            connection_limit: Arc::new(Semaphore::new(config.max_connections)),
            max_connections: config.max_connections,
        })
    }

    /// Accept a new connection, respecting the connection limit.
    ///
    /// This will wait if the connection limit has been reached.
    /// Returns the stream and a permit that must be held for the connection's lifetime.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr, ConnectionPermit), ListenerError> {
        // Acquire permit first (backpressure)
        let permit = self
            .connection_limit
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ListenerError::Closed)?;

        let (stream, addr) = self.inner.accept().await.map_err(ListenerError::Accept)?;

        tracing::debug!(
            peer_addr = %addr,
            available_permits = self.connection_limit.available_permits(),
            "Connection accepted"
        );

        Ok((stream, addr, ConnectionPermit { _permit: permit }))
    }

    /// Run the accept loop until shutdown or a fatal accept error.
    ///
    /// `on_accept` is called once per accepted socket and must not block; it
    /// is expected to spawn the connection actor.
    pub async fn serve<F>(&self, mut shutdown: ShutdownSignal, mut on_accept: F) -> Result<(), ListenerError>
    where
        F: FnMut(TcpStream, SocketAddr, ConnectionPermit),
    {
        loop {
            let accepted = tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    self.connection_limit.close();
                    tracing::info!("Acceptor stopped");
                    return Ok(());
                }
                res = self.accept() => res,
            };

            match accepted {
                Ok((stream, addr, permit)) => {
                    metrics::record_connection_accepted();
                    on_accept(stream, addr, permit);
                }
                Err(ListenerError::Accept(e)) if is_transient(&e) => {
                    metrics::record_accept_error(true);
                    tracing::warn!(error = %e, "Transient accept error, continuing");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
                Err(e) => {
                    metrics::record_accept_error(false);
                    tracing::error!(error = %e, "Accept loop stopped");
                    return Err(e);
                }
            }
        }
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, io::Error> {
        self.inner.local_addr()
    }

    /// Get current available connection slots.
    pub fn available_permits(&self) -> usize {
        self.connection_limit.available_permits()
    }

    /// Get configured maximum connections.
    pub fn max_connections(&self) -> usize {
        self.max_connections
    }
}

/// A permit representing a connection slot.
///
/// When dropped, the connection slot is released back to the pool.
/// This ensures backpressure is maintained even if the connection handler panics.
#[derive(Debug)]
pub struct ConnectionPermit {
    _permit: tokio::sync::OwnedSemaphorePermit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Shutdown;

    fn ephemeral(max_connections: usize) -> ListenerConfig {
        ListenerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            max_connections,
        }
    }

    #[test]
    fn classifies_accept_errors() {
        assert!(is_transient(&io::Error::from(io::ErrorKind::ConnectionAborted)));
        assert!(is_transient(&io::Error::from(io::ErrorKind::Interrupted)));
        assert!(is_transient(&io::Error::from_raw_os_error(24)));
        assert!(!is_transient(&io::Error::from(io::ErrorKind::InvalidInput)));
        assert!(!is_transient(&io::Error::from(io::ErrorKind::PermissionDenied)));
    }

    #[tokio::test]
    async fn bind_rejects_address_in_use() {
        let first = Listener::bind(&ephemeral(1)).unwrap();
        let mut config = ephemeral(1);
        config.port = first.local_addr().unwrap().port();

        assert!(matches!(Listener::bind(&config), Err(ListenerError::Bind(_))));
    }

    #[tokio::test]
    async fn permits_are_held_per_connection() {
        let listener = Listener::bind(&ephemeral(2)).unwrap();
        let addr = listener.local_addr().unwrap();
        assert_eq!(listener.max_connections(), 2);

        let _client = TcpStream::connect(addr).await.unwrap();
        let (_stream, _peer, permit) = listener.accept().await.unwrap();
        assert_eq!(listener.available_permits(), 1);

        drop(permit);
        assert_eq!(listener.available_permits(), 2);
    }

    #[tokio::test]
    async fn serve_stops_on_shutdown() {
        let listener = Listener::bind(&ephemeral(8)).unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Shutdown::new();
        let signal = shutdown.subscribe();

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let serve = tokio::spawn(async move {
            listener
                .serve(signal, move |_stream, peer, _permit| {
                    let _ = tx.send(peer);
                })
                .await
        });

        let client = TcpStream::connect(addr).await.unwrap();
        let peer = rx.recv().await.unwrap();
        assert_eq!(peer, client.local_addr().unwrap());

        shutdown.trigger();
        serve.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn accept_after_shutdown_is_closed() {
        let listener = Listener::bind(&ephemeral(4)).unwrap();
        let shutdown = Shutdown::new();
        shutdown.trigger();

        listener
            .serve(shutdown.subscribe(), |_stream, _peer, _permit| {})
            .await
            .unwrap();

        assert!(matches!(listener.accept().await, Err(ListenerError::Closed)));
    }
}
