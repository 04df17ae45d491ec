//! Push channel session actor.
//!
//! One task per upgraded connection. The task owns the WebSocket and is the
//! only reader of the outbound queue, so writes are issued one at a time and in
//! enqueue order. Other tasks reach the channel only through a
//! [`ChannelHandle`], whose `send` appends to the queue.
//!
//! ```text
//! Registry::deliver_result ──► ChannelHandle::send ──► outbound queue
//!                                                          │
//!                     session task: recv → write → recv → write ...
//! ```

use std::sync::Arc;

use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use tokio::sync::mpsc;
use tracing::Instrument;

use crate::lifecycle::ShutdownSignal;
use crate::net::ActorGuard;
use crate::observability::metrics;
use crate::registry::{ChannelId, Registry};

/// Shared, sendable end of a channel's outbound queue.
///
/// The registry holds it weakly; the session task holds the only long-lived
/// strong reference. Dropping the last strong reference deregisters the
/// identity.
#[derive(Debug)]
pub struct ChannelHandle {
    id: ChannelId,
    outbound: mpsc::UnboundedSender<Utf8Bytes>,
    registry: Arc<Registry>,
}

impl ChannelHandle {
    /// Create the handle for a freshly opened channel and register it.
    ///
    /// The identity message is queued before the handle becomes reachable
    /// through the registry, so it is always the first message delivered.
    pub fn open(
        registry: &Arc<Registry>,
        id: ChannelId,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<Utf8Bytes>) {
        let (outbound, rx) = mpsc::unbounded_channel();
        let handle = Arc::new(Self {
            id,
            outbound,
            registry: Arc::clone(registry),
        });

        handle.send(Registry::identity_message(&id));
        registry.register(&handle);
        (handle, rx)
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Append `message` to the outbound queue.
    ///
    /// Returns `false` if the session task has already stopped reading.
    pub fn send(&self, message: Utf8Bytes) -> bool {
        self.outbound.send(message).is_ok()
    }
}

impl Drop for ChannelHandle {
    fn drop(&mut self) {
        self.registry.deregister(&self.id);
    }
}

/// Run a push channel over an upgraded socket until either side closes it.
pub async fn run_session(
    socket: WebSocket,
    registry: Arc<Registry>,
    shutdown: ShutdownSignal,
    guard: ActorGuard,
) {
    let id = registry.mint();
    let span = tracing::info_span!("channel", channel_id = %id);
    drive(socket, id, registry, shutdown, guard)
        .instrument(span)
        .await
}

async fn drive(
    mut socket: WebSocket,
    id: ChannelId,
    registry: Arc<Registry>,
    mut shutdown: ShutdownSignal,
    _guard: ActorGuard,
) {
    let (handle, mut outbound) = ChannelHandle::open(&registry, id);
    metrics::channel_opened();
    tracing::info!("Channel opened");

    loop {
        tokio::select! {
            Some(message) = outbound.recv() => {
                if let Err(e) = socket.send(Message::Text(message)).await {
                    tracing::warn!(error = %e, "Channel write failed");
                    break;
                }
            }
            frame = socket.recv() => match frame {
                // Inbound frames carry no meaning; drain and discard.
                Some(Ok(Message::Close(_))) | None => {
                    tracing::debug!("Channel closed by client");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "Channel read failed");
                    break;
                }
            },
            _ = shutdown.recv() => {
                if let Err(e) = socket.send(Message::Close(None)).await {
                    tracing::debug!(error = %e, "Channel close frame not sent");
                }
                tracing::debug!("Channel closed for shutdown");
                break;
            }
        }
    }

    drop(handle);
    metrics::channel_closed();
    tracing::info!("Channel closed");
}
