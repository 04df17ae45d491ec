//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits, error classification)
//!     → connection.rs (connection ID, live actor tracking)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - Bounded accept queue prevents resource exhaustion
//! - Transient accept errors do not stop the acceptor
//! - Every actor is tracked for graceful shutdown

pub mod connection;
pub mod listener;

pub use connection::{ActorGuard, ActorKind, ConnectionId, ConnectionTracker};
pub use listener::{Listener, ListenerError};
