//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (host, port, connection limit).
    pub listener: ListenerConfig,

    /// Per-connection HTTP limits.
    pub http: HttpConfig,

    /// Filesystem locations shared by every actor.
    pub paths: PathsConfig,

    /// External worker settings.
    pub worker: WorkerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Startup and shutdown settings.
    pub lifecycle: LifecycleConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host (IP address) to listen on.
    pub host: String,

    /// Port to listen on. `0` picks an ephemeral port.
    pub port: u16,

    /// Maximum concurrent HTTP connections (backpressure).
    pub max_connections: usize,
}

impl ListenerConfig {
    /// Resolve the configured host and port into a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        let ip: IpAddr = self.host.parse()?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            max_connections: 10_000,
        }
    }
}

/// HTTP connection limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// A connection is closed if no complete request header arrives within this window.
    pub idle_timeout_secs: u64,

    /// Maximum accepted request body size in bytes.
    pub body_limit_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 30,
            body_limit_bytes: 20_000,
        }
    }
}

/// Filesystem locations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Document root served to `GET` requests.
    pub docs: Option<PathBuf>,

    /// Directory holding job input files.
    pub tmp_storage: PathBuf,

    /// Worker executable invoked once per job.
    pub worker_executable: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            docs: None,
            tmp_storage: PathBuf::from("."),
            worker_executable: None,
        }
    }
}

/// External worker settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Operation character used when a submission does not name one.
    pub default_operation: char,

    /// Maximum number of worker output bytes kept as the result.
    pub output_limit_bytes: usize,

    /// Push an `error` message to the owning channel when a job fails.
    pub report_failures: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            default_operation: 'a',
            output_limit_bytes: 2_000,
            report_failures: false,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Startup and shutdown settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// How long shutdown waits for live connections, channels and jobs.
    pub shutdown_grace_secs: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            shutdown_grace_secs: 30,
        }
    }
}
