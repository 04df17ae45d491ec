//! Command-line flags.
//!
//! Every flag is optional; a flag that is present overrides the value loaded
//! from the config file, which in turn overrides the built-in default.

use std::path::PathBuf;

use clap::Parser;

use crate::config::schema::{LogFormat, ServerConfig};

#[derive(Debug, Default, Parser)]
#[command(name = "chcount-server")]
#[command(about = "Character counting job server with WebSocket result delivery", long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, env = "CHCOUNT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Host on which server listens
    #[arg(short = 'H', long, env = "CHCOUNT_HOST")]
    pub host: Option<String>,

    /// Port on which server listens
    #[arg(short = 'P', long, env = "CHCOUNT_PORT")]
    pub port: Option<u16>,

    /// Served documents location directory
    #[arg(short = 'D', long, env = "CHCOUNT_DOCS")]
    pub docs: Option<PathBuf>,

    /// Temporary storage directory
    #[arg(short = 'T', long, env = "CHCOUNT_TMP_STORAGE")]
    pub tmp_storage: Option<PathBuf>,

    /// Chcount executable path
    #[arg(long, env = "CHCOUNT_EXECUTABLE")]
    pub chcount_executable: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "CHCOUNT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum, env = "CHCOUNT_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,
}

impl Cli {
    /// Apply the flags that were given on top of `config`.
    pub fn apply(&self, config: &mut ServerConfig) {
        if let Some(host) = &self.host {
            config.listener.host = host.clone();
        }
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(docs) = &self.docs {
            config.paths.docs = Some(docs.clone());
        }
        if let Some(tmp) = &self.tmp_storage {
            config.paths.tmp_storage = tmp.clone();
        }
        if let Some(exe) = &self.chcount_executable {
            config.paths.worker_executable = Some(exe.clone());
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.observability.log_format = format;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_flags() {
        let cli = Cli::try_parse_from([
            "chcount-server",
            "-H",
            "0.0.0.0",
            "-P",
            "8080",
            "-D",
            "/srv/docs",
            "-T",
            "/tmp",
            "--chcount-executable",
            "/usr/local/bin/chcount",
        ])
        .unwrap();

        let mut config = ServerConfig::default();
        cli.apply(&mut config);

        assert_eq!(config.listener.host, "0.0.0.0");
        assert_eq!(config.listener.port, 8080);
        assert_eq!(config.paths.docs, Some(PathBuf::from("/srv/docs")));
        assert_eq!(config.paths.tmp_storage, PathBuf::from("/tmp"));
        assert_eq!(
            config.paths.worker_executable,
            Some(PathBuf::from("/usr/local/bin/chcount"))
        );
    }

    #[test]
    fn absent_flags_leave_config_untouched() {
        let mut config = ServerConfig::default();
        config.listener.port = 4444;
        Cli::default().apply(&mut config);
        assert_eq!(config.listener.port, 4444);
        assert_eq!(config.listener.host, "127.0.0.1");
    }

    #[test]
    fn rejects_negative_port() {
        assert!(Cli::try_parse_from(["chcount-server", "-P", "-1"]).is_err());
    }
}
