//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → connection.rs (HTTP/1.1 keep-alive loop, idle timeout)
//!     → server.rs (middleware, dispatch by method and path)
//!         ├─ Upgrade: websocket → channel session
//!         ├─ GET/HEAD           → files.rs (document root)
//!         ├─ POST /api/count    → jobs.rs → request.rs validation → dispatch
//!         └─ anything else      → 400
//!     → response.rs (error bodies)
//! ```

pub mod connection;
pub mod files;
pub mod jobs;
pub mod mime;
pub mod request;
pub mod response;
pub mod server;

pub use connection::HttpConnection;
pub use server::{AppState, HttpServer};
