//! Push channel subsystem.
//!
//! # Data Flow
//! ```text
//! HTTP upgrade request
//!     → session.rs (mint identity, register, push identity, drain reads)
//!     ← message.rs (id / result / error frames)
//!     ← Registry (results routed by identity)
//! ```
//!
//! # Design Decisions
//! - Server → client only; inbound frames are discarded
//! - Unbounded outbound queue, single write in flight
//! - Identity lives exactly as long as the session

pub mod message;
pub mod session;

pub use message::PushMessage;
pub use session::{run_session, ChannelHandle};
