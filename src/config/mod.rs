//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! built-in defaults
//!     → loader.rs (optional TOML file)
//!     → cli.rs (flags and environment variables)
//!     → validation.rs (semantic checks, absolute paths)
//!     → ServerConfig + ResolvedPaths (immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no live reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde, clap) from semantic checks

pub mod cli;
pub mod loader;
pub mod schema;
pub mod validation;

pub use cli::Cli;
pub use loader::{load_config, ConfigError, LoadedConfig};
pub use schema::{
    HttpConfig, LifecycleConfig, ListenerConfig, LogFormat, ObservabilityConfig, PathsConfig,
    ServerConfig, WorkerConfig,
};
pub use validation::{validate_config, ResolvedPaths, ValidationError};
