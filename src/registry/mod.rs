//! Process-wide session registry and result router.
//!
//! # Responsibilities
//! - Mint identities and job IDs
//! - Map live channel identities to non-owning channel handles
//! - Route "deliver result X to identity Y" to the right channel queue
//! - Hold the shared filesystem locations
//!
//! # Design Decisions
//! - One mutex guards the map; it is held for mutation and lookup only,
//!   never across I/O
//! - Entries are `Weak`: the registry never keeps a channel alive, and a
//!   lookup that races with teardown resolves to "gone" instead of dangling
//! - Delivering to an unknown or closed identity is a logged no-op

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use uuid::Uuid;

use crate::channel::{ChannelHandle, PushMessage};
use crate::config::ResolvedPaths;
use crate::observability::metrics;

/// Identity of a push channel.
pub type ChannelId = Uuid;

/// Identity of a submitted job.
pub type JobId = Uuid;

/// What happened to a message routed through the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Enqueued on the channel's outbound queue.
    Delivered,
    /// No channel is registered under the identity.
    UnknownIdentity,
    /// The channel was torn down between lookup and enqueue.
    Gone,
}

impl Delivery {
    pub fn as_str(&self) -> &'static str {
        match self {
            Delivery::Delivered => "delivered",
            Delivery::UnknownIdentity => "unknown_identity",
            Delivery::Gone => "gone",
        }
    }
}

/// Directory of live push channels.
#[derive(Debug)]
pub struct Registry {
    sessions: Mutex<HashMap<ChannelId, Weak<ChannelHandle>>>,
    paths: ResolvedPaths,
}

impl Registry {
    pub fn new(paths: ResolvedPaths) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            paths,
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<ChannelId, Weak<ChannelHandle>>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Mint a fresh token, used for both identities and job IDs.
    pub fn mint(&self) -> Uuid {
        Uuid::new_v4()
    }

    /// Whether a live channel is registered under `id`.
    pub fn contains(&self, id: &ChannelId) -> bool {
        self.sessions()
            .get(id)
            .is_some_and(|handle| handle.strong_count() > 0)
    }

    /// Number of registered channels.
    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register `handle` under its own identity. Called by the channel itself.
    pub fn register(&self, handle: &Arc<ChannelHandle>) {
        self.sessions().insert(handle.id(), Arc::downgrade(handle));
        tracing::debug!(channel_id = %handle.id(), "Channel registered");
    }

    /// Remove `id`. Called by the channel itself when it is dropped.
    pub fn deregister(&self, id: &ChannelId) {
        if self.sessions().remove(id).is_some() {
            tracing::debug!(channel_id = %id, "Channel deregistered");
        }
    }

    /// Upgrade the entry for `id` to a temporary strong reference.
    fn resolve(&self, id: &ChannelId) -> Result<Arc<ChannelHandle>, Delivery> {
        let sessions = self.sessions();
        let weak = sessions.get(id).ok_or(Delivery::UnknownIdentity)?;
        weak.upgrade().ok_or(Delivery::Gone)
    }

    fn deliver(&self, identity: &ChannelId, message: PushMessage<'_>) -> Delivery {
        let outcome = match self.resolve(identity) {
            Ok(handle) => {
                if handle.send(message.encode()) {
                    Delivery::Delivered
                } else {
                    Delivery::Gone
                }
            }
            Err(outcome) => outcome,
        };

        metrics::record_delivery(outcome.as_str());
        match outcome {
            Delivery::Delivered => {
                tracing::debug!(channel_id = %identity, "Message enqueued")
            }
            _ => tracing::info!(
                channel_id = %identity,
                outcome = outcome.as_str(),
                "Message dropped, channel not available"
            ),
        }
        outcome
    }

    /// Route a job result to the channel that submitted it.
    pub fn deliver_result(&self, identity: &ChannelId, job_id: &JobId, result: &str) -> Delivery {
        self.deliver(
            identity,
            PushMessage::Result {
                request_id: *job_id,
                result,
            },
        )
    }

    /// Tell the submitting channel that a job produced no result.
    pub fn deliver_failure(&self, identity: &ChannelId, job_id: &JobId, reason: &str) -> Delivery {
        self.deliver(
            identity,
            PushMessage::Error {
                request_id: *job_id,
                reason,
            },
        )
    }

    /// The handshake message a newly opened channel sends first.
    pub fn identity_message(id: &ChannelId) -> axum::extract::ws::Utf8Bytes {
        PushMessage::Id(*id).encode()
    }

    pub fn docs_root(&self) -> &Path {
        &self.paths.docs
    }

    pub fn tmp_storage(&self) -> &Path {
        &self.paths.tmp_storage
    }

    pub fn worker_executable(&self) -> &Path {
        &self.paths.worker_executable
    }
}
