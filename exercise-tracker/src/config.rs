use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DATABASE_URL: &str = "sqlite://exercise-tracker.db?mode=rwc";
const DEFAULT_STORE_TIMEOUT: &str = "5s";

#[derive(Debug, Parser)]
#[command(
    name = "exercise-tracker",
    version,
    about = "Exercise tracking REST API: users, exercises and date-filtered logs"
)]
pub struct Cli {
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<SocketAddr>,

    /// SQLite URL, or `memory` for a throwaway in-process store.
    #[arg(long, value_name = "URL")]
    pub database_url: Option<String>,

    /// Directory holding `index.html`.
    #[arg(long, value_name = "DIR")]
    pub static_dir: Option<PathBuf>,

    #[arg(long, value_name = "DIR")]
    pub public_dir: Option<PathBuf>,

    /// How long a request waits for a store connection, e.g. `5s`.
    #[arg(long, value_name = "DURATION")]
    pub store_timeout: Option<String>,

    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub database_url: String,
    pub static_dir: PathBuf,
    pub public_dir: PathBuf,
    pub store_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config in {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid port in env var {key}: {value}")]
    InvalidPort { key: String, value: String },
    #[error("invalid value for env var {key}: not unicode")]
    NotUnicode { key: String },
    #[error("invalid store timeout {value:?}: {source}")]
    InvalidDuration {
        value: String,
        source: humantime::DurationError,
    },
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    bind: Option<SocketAddr>,
    database_url: Option<String>,
    static_dir: Option<PathBuf>,
    public_dir: Option<PathBuf>,
    store_timeout: Option<String>,
}

/// Values taken from the process environment (`PORT`, `DATABASE_URL`).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    pub port: Option<u16>,
    pub database_url: Option<String>,
}

impl EnvConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = read_env("PORT")?
            .map(|value| parse_port("PORT", &value))
            .transpose()?;
        let database_url = read_env("DATABASE_URL")?;
        Ok(Self { port, database_url })
    }
}

impl AppConfig {
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let env = EnvConfig::from_env()?;
        let from_file = read_file_config(cli.config.as_deref())?;
        Self::resolve(cli, from_file, env)
    }

    /// Precedence: command line, then environment, then config file, then
    /// defaults.
    fn resolve(cli: Cli, from_file: FileConfig, env: EnvConfig) -> Result<Self, ConfigError> {
        let bind = cli
            .bind
            .or_else(|| env.port.map(|port| SocketAddr::from(([0, 0, 0, 0], port))))
            .or(from_file.bind)
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)));
        let database_url = cli
            .database_url
            .or(env.database_url)
            .or(from_file.database_url)
            .unwrap_or_else(|| String::from(DEFAULT_DATABASE_URL));
        let static_dir = cli
            .static_dir
            .or(from_file.static_dir)
            .unwrap_or_else(|| PathBuf::from("./views"));
        let public_dir = cli
            .public_dir
            .or(from_file.public_dir)
            .unwrap_or_else(|| PathBuf::from("./public"));
        let store_timeout = cli
            .store_timeout
            .or(from_file.store_timeout)
            .unwrap_or_else(|| String::from(DEFAULT_STORE_TIMEOUT));
        let store_timeout =
            humantime::parse_duration(&store_timeout).map_err(|source| ConfigError::InvalidDuration {
                value: store_timeout.clone(),
                source,
            })?;

        Ok(Self {
            bind,
            database_url,
            static_dir,
            public_dir,
            store_timeout,
        })
    }
}

fn read_file_config(path: Option<&Path>) -> Result<FileConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(FileConfig::default());
    };

    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;

    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

fn read_env(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode {
            key: String::from(key),
        }),
    }
}

fn parse_port(key: &str, raw: &str) -> Result<u16, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidPort {
        key: String::from(key),
        value: String::from(raw),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use super::*;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["exercise-tracker"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_apply_without_any_source() {
        let config = AppConfig::resolve(cli(&[]), FileConfig::default(), EnvConfig::default()).unwrap();
        assert_eq!(config.bind, SocketAddr::from(([0, 0, 0, 0], 3000)));
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.static_dir, PathBuf::from("./views"));
        assert_eq!(config.store_timeout, Duration::from_secs(5));
    }

    #[test]
    fn env_port_overrides_file_but_not_cli() {
        let env = EnvConfig {
            port: Some(8080),
            database_url: Some(String::from("memory")),
        };
        let file = FileConfig {
            bind: Some(SocketAddr::from(([127, 0, 0, 1], 9000))),
            database_url: Some(String::from("sqlite://file.db")),
            ..FileConfig::default()
        };

        let config = AppConfig::resolve(cli(&[]), file, env.clone()).unwrap();
        assert_eq!(config.bind, SocketAddr::from(([0, 0, 0, 0], 8080)));
        assert_eq!(config.database_url, "memory");

        let config = AppConfig::resolve(
            cli(&["--bind", "127.0.0.1:4000", "--database-url", "sqlite://cli.db"]),
            FileConfig::default(),
            env,
        )
        .unwrap();
        assert_eq!(config.bind, SocketAddr::from(([127, 0, 0, 1], 4000)));
        assert_eq!(config.database_url, "sqlite://cli.db");
    }

    #[test]
    fn config_file_is_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.toml");
        std::fs::write(
            &path,
            "bind = \"127.0.0.1:7000\"\nstatic_dir = \"/srv/views\"\nstore_timeout = \"250ms\"\n",
        )
        .unwrap();

        let file = read_file_config(Some(&path)).unwrap();
        let config = AppConfig::resolve(cli(&[]), file, EnvConfig::default()).unwrap();
        assert_eq!(config.bind, SocketAddr::from(([127, 0, 0, 1], 7000)));
        assert_eq!(config.static_dir, PathBuf::from("/srv/views"));
        assert_eq!(config.store_timeout, Duration::from_millis(250));
    }

    #[test]
    fn malformed_config_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "bind = 42").unwrap();

        assert!(matches!(
            read_file_config(Some(&path)),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            read_file_config(Some(&dir.path().join("missing.toml"))),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn invalid_store_timeout_is_rejected() {
        let result = AppConfig::resolve(
            cli(&["--store-timeout", "soon"]),
            FileConfig::default(),
            EnvConfig::default(),
        );
        assert!(matches!(result, Err(ConfigError::InvalidDuration { .. })));
    }

    #[test]
    fn parse_port_accepts_numbers_only() {
        assert_eq!(parse_port("PORT", " 3000 ").ok(), Some(3000));
        assert!(parse_port("PORT", "http").is_err());
        assert!(parse_port("PORT", "70000").is_err());
    }
}
