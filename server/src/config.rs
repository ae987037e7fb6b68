//! CLI flags layered over an optional TOML file, resolved into a [`Config`].

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;

use crate::error::ServerError;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 9090;
const DEFAULT_CLIENT_THREADS: usize = 2;
const DEFAULT_REFRESH_INTERVAL_S: u64 = 10;
const DEFAULT_NOTIFY_INTERVAL_S: u64 = 10;

/// phrasedex — concurrent full-text phrase-search server.
#[derive(Parser, Debug)]
#[command(name = "phrasedex", version, about, long_about = None)]
pub struct Cli {
    /// Root directory of the document tree to index and watch.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Bind address for the listening socket.
    #[arg(long)]
    pub host: Option<String>,

    /// TCP port to listen on.
    #[arg(long)]
    pub port: Option<u16>,

    /// Size of the tokenization/merge worker pool (default: logical CPUs).
    #[arg(long)]
    pub worker_threads: Option<usize>,

    /// Size of the session-handler client pool.
    #[arg(long)]
    pub client_threads: Option<usize>,

    /// File-watcher polling period, in seconds.
    #[arg(long)]
    pub refresh_interval_s: Option<u64>,

    /// Queue-position notifier period, in seconds.
    #[arg(long)]
    pub notify_interval_s: Option<u64>,

    /// Optional TOML file supplying any of the above options.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// The subset of [`Cli`] that may also come from a TOML file; every field is
/// optional there since CLI flags and defaults can supply it instead.
#[derive(Deserialize, Default, Debug)]
struct FileConfig {
    data_dir: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    worker_threads: Option<usize>,
    client_threads: Option<usize>,
    refresh_interval_s: Option<u64>,
    notify_interval_s: Option<u64>,
}

/// Fully resolved, validated server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub worker_threads: usize,
    pub client_threads: usize,
    pub refresh_interval_s: u64,
    pub notify_interval_s: u64,
}

impl Config {
    /// Resolve CLI flags over an optional TOML file over built-in defaults.
    pub fn resolve(cli: Cli) -> Result<Self, ServerError> {
        let file = match &cli.config {
            Some(path) => load_file_config(path)?,
            None => FileConfig::default(),
        };

        let data_dir = cli
            .data_dir
            .or(file.data_dir)
            .ok_or_else(|| ServerError::StartupFatal("data_dir must be set via --data-dir or a config file".into()))?;

        let worker_threads = cli
            .worker_threads
            .or(file.worker_threads)
            .unwrap_or_else(num_cpus::get);
        let client_threads =
            cli.client_threads.or(file.client_threads).unwrap_or(DEFAULT_CLIENT_THREADS);

        if worker_threads == 0 {
            return Err(ServerError::StartupFatal("worker_threads must be at least 1".into()));
        }
        if client_threads == 0 {
            return Err(ServerError::StartupFatal("client_threads must be at least 1".into()));
        }

        Ok(Config {
            data_dir,
            host: cli.host.or(file.host).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(file.port).unwrap_or(DEFAULT_PORT),
            worker_threads,
            client_threads,
            refresh_interval_s: cli
                .refresh_interval_s
                .or(file.refresh_interval_s)
                .unwrap_or(DEFAULT_REFRESH_INTERVAL_S),
            notify_interval_s: cli
                .notify_interval_s
                .or(file.notify_interval_s)
                .unwrap_or(DEFAULT_NOTIFY_INTERVAL_S),
        })
    }
}

fn load_file_config(path: &Path) -> Result<FileConfig, ServerError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        ServerError::StartupFatal(format!("could not read config file {}: {e}", path.display()))
    })?;
    toml::from_str(&text).map_err(|e| {
        ServerError::StartupFatal(format!("invalid config file {}: {e}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_cli() -> Cli {
        Cli {
            data_dir: Some(PathBuf::from("/tmp/does-not-need-to-exist")),
            host: None,
            port: None,
            worker_threads: None,
            client_threads: None,
            refresh_interval_s: None,
            notify_interval_s: None,
            config: None,
        }
    }

    #[test]
    fn defaults_apply_when_nothing_else_is_set() {
        let config = Config::resolve(base_cli()).unwrap();
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.client_threads, DEFAULT_CLIENT_THREADS);
        assert!(config.worker_threads >= 1);
    }

    #[test]
    fn missing_data_dir_is_startup_fatal() {
        let mut cli = base_cli();
        cli.data_dir = None;
        assert!(matches!(Config::resolve(cli), Err(ServerError::StartupFatal(_))));
    }

    #[test]
    fn zero_worker_threads_is_rejected() {
        let mut cli = base_cli();
        cli.worker_threads = Some(0);
        assert!(matches!(Config::resolve(cli), Err(ServerError::StartupFatal(_))));
    }

    #[test]
    fn cli_flag_overrides_file_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("phrasedex.toml");
        std::fs::write(&path, "port = 7000\nhost = \"127.0.0.1\"\n").unwrap();

        let mut cli = base_cli();
        cli.config = Some(path);
        cli.port = Some(9999);

        let config = Config::resolve(cli).unwrap();
        assert_eq!(config.port, 9999, "CLI flag must win over file config");
        assert_eq!(config.host, "127.0.0.1", "file config fills in what the CLI left unset");
    }
}
