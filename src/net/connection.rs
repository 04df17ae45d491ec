//! Actor lifetime tracking.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Count live actors (HTTP connections, push channels, jobs)
//! - Let shutdown wait until every actor has finished

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for an accepted TCP connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// The kind of actor a guard belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorKind {
    /// HTTP connection actor.
    Http,
    /// Push channel session.
    Channel,
    /// Job dispatch actor.
    Job,
}

impl ActorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorKind::Http => "http",
            ActorKind::Channel => "channel",
            ActorKind::Job => "job",
        }
    }
}

/// Tracks live actors for graceful shutdown.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    /// Current count of live actors.
    active_count: Arc<AtomicU64>,
}

impl ConnectionTracker {
    /// Create a new tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new live actor. Returns a guard that decrements on drop.
    pub fn track(&self, kind: ActorKind) -> ActorGuard {
        self.active_count.fetch_add(1, Ordering::SeqCst);
        ActorGuard {
            active_count: Arc::clone(&self.active_count),
            kind,
        }
    }

    /// Get current live actor count.
    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }

    /// Wait until every actor has finished or `grace` elapses.
    ///
    /// Returns `true` if the tracker drained in time.
    pub async fn wait_for_drain(&self, grace: Duration) -> bool {
        let drained = async {
            while self.active_count.load(Ordering::SeqCst) > 0 {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        };
        tokio::time::timeout(grace, drained).await.is_ok()
    }
}

/// Guard that tracks an actor's lifetime.
/// Decrements the live count when dropped.
#[derive(Debug)]
pub struct ActorGuard {
    active_count: Arc<AtomicU64>,
    kind: ActorKind,
}

impl ActorGuard {
    pub fn kind(&self) -> ActorKind {
        self.kind
    }
}

impl Drop for ActorGuard {
    fn drop(&mut self) {
        self.active_count.fetch_sub(1, Ordering::SeqCst);
        tracing::trace!(kind = self.kind.as_str(), "Actor finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_id_unique() {
        let id1 = ConnectionId::new();
        let id2 = ConnectionId::new();
        assert_ne!(id1, id2);
        assert!(id2.as_u64() > id1.as_u64());
    }

    #[test]
    fn tracker_counts() {
        let tracker = ConnectionTracker::new();
        assert_eq!(tracker.active_count(), 0);

        let guard1 = tracker.track(ActorKind::Http);
        assert_eq!(tracker.active_count(), 1);

        let guard2 = tracker.track(ActorKind::Job);
        assert_eq!(guard2.kind(), ActorKind::Job);
        assert_eq!(tracker.active_count(), 2);

        drop(guard1);
        assert_eq!(tracker.active_count(), 1);

        drop(guard2);
        assert_eq!(tracker.active_count(), 0);
    }

    #[tokio::test]
    async fn drain_waits_for_guards() {
        let tracker = ConnectionTracker::new();
        let guard = tracker.track(ActorKind::Channel);

        assert!(!tracker.wait_for_drain(Duration::from_millis(150)).await);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            drop(guard);
        });
        assert!(tracker.wait_for_drain(Duration::from_secs(2)).await);
    }
}
