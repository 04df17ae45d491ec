//! Character counting job server.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────┐
//!                      │                  CHCOUNT SERVER                   │
//!                      │                                                   │
//!   Browser            │  ┌─────────┐   ┌──────────┐   ┌──────────────┐    │
//!   ───── GET ─────────┼─▶│   net   │──▶│   http   │──▶│  doc root    │    │
//!   ──── POST ─────────┼─▶│listener │   │connection│   └──────────────┘    │
//!                      │  └─────────┘   └────┬─────┘                       │
//!                      │                     │ POST /api/count             │
//!                      │                     ▼                             │
//!                      │               ┌──────────┐   ┌──────────────┐     │
//!                      │               │ dispatch │──▶│ chcount child│     │
//!                      │               │   job    │◀──│   process    │     │
//!                      │               └────┬─────┘   └──────────────┘     │
//!                      │                    │ result                       │
//!                      │                    ▼                              │
//!   ◀── WebSocket ─────┼──────────── ┌──────────┐                          │
//!                      │             │ registry │ identity → channel        │
//!                      │             │ channel  │                          │
//!                      │             └──────────┘                          │
//!                      └──────────────────────────────────────────────────┘
//! ```

use clap::{CommandFactory, Parser};

use chcount_server::config::{load_config, Cli, ConfigError};
use chcount_server::lifecycle;
use chcount_server::observability::logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match load_config(&cli) {
        Ok(loaded) => loaded,
        Err(e) => {
            report_config_error(&e);
            std::process::exit(1);
        }
    };

    if let Err(e) = logging::init_logging(&loaded.config.observability) {
        eprintln!("Failed to initialize logging: {e}");
        std::process::exit(1);
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %loaded.config.listener.host,
        port = loaded.config.listener.port,
        docs = %loaded.paths.docs.display(),
        tmp_storage = %loaded.paths.tmp_storage.display(),
        worker = %loaded.paths.worker_executable.display(),
        "chcount-server starting"
    );

    if let Err(e) = lifecycle::run(loaded).await {
        tracing::error!(error = %e, "Server failed");
        std::process::exit(1);
    }
}

fn report_config_error(error: &ConfigError) {
    match error {
        ConfigError::Validation(errors) => {
            for e in errors {
                eprintln!("error: {e}");
            }
        }
        other => eprintln!("error: {other}"),
    }
    eprintln!();
    let _ = Cli::command().print_help();
}
