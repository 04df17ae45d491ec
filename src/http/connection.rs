//! HTTP connection actor.
//!
//! Drives one accepted socket through hyper's HTTP/1.1 state machine:
//! read a request (bounded by the idle timeout) → route it → write the
//! response → read again while keep-alive holds. An upgrade request hands the
//! socket to a push channel and ends this actor.

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use hyper::server::conn::http1;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::service::TowerToHyperService;
use tokio::net::TcpStream;
use tracing::Instrument;

use crate::lifecycle::ShutdownSignal;
use crate::net::listener::ConnectionPermit;
use crate::net::{ActorGuard, ConnectionId};

/// Everything a connection actor owns for its lifetime.
pub struct HttpConnection {
    pub stream: TcpStream,
    pub peer: SocketAddr,
    pub permit: ConnectionPermit,
    pub guard: ActorGuard,
}

impl HttpConnection {
    /// Serve requests until the client closes, the idle timeout fires, the
    /// socket is upgraded, or shutdown completes the in-flight exchange.
    pub async fn serve(self, router: Router, idle_timeout: Duration, shutdown: ShutdownSignal) {
        let id = ConnectionId::new();
        let span = tracing::info_span!("http", connection_id = %id, peer = %self.peer);
        self.drive(router, idle_timeout, shutdown)
            .instrument(span)
            .await
    }

    async fn drive(self, router: Router, idle_timeout: Duration, mut shutdown: ShutdownSignal) {
        let Self {
            stream,
            permit: _permit,
            guard: _guard,
            ..
        } = self;

        let service = TowerToHyperService::new(router);
        let mut builder = http1::Builder::new();
        builder
            .timer(TokioTimer::new())
            .header_read_timeout(idle_timeout)
            .keep_alive(true);

        let conn = builder
            .serve_connection(TokioIo::new(stream), service)
            .with_upgrades();
        tokio::pin!(conn);

        let result = tokio::select! {
            res = conn.as_mut() => res,
            _ = shutdown.recv() => {
                conn.as_mut().graceful_shutdown();
                conn.as_mut().await
            }
        };

        match result {
            Ok(()) => tracing::debug!("Connection closed"),
            Err(e) if e.is_timeout() => tracing::debug!("Connection idle timeout"),
            Err(e) if e.is_incomplete_message() || e.is_closed() => {
                tracing::debug!(error = %e, "Connection closed mid-request")
            }
            Err(e) => tracing::warn!(error = %e, "Connection error"),
        }
    }
}
