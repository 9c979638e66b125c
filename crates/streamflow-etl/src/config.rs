//! Pipeline configuration
//!
//! Everything is read from environment variables (a `.env` file is loaded by
//! the binary first). Paths default to the standard layout under
//! `ETL_DATA_DIR`; any individual path can be overridden.

use anyhow::{bail, Context};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_ALERT_RECIPIENT: &str = "admin@example.com";
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/streamflow";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Input and output locations for one pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelinePaths {
    pub catalog: PathBuf,
    pub users: PathBuf,
    pub sessions: PathBuf,
    /// Where the normalized table snapshots are written
    pub snapshot_dir: PathBuf,
    /// Where JSON-lines copies of the flat sources are written
    pub raw_dir: PathBuf,
}

impl PipelinePaths {
    /// Standard layout under a data directory
    pub fn under(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            catalog: data_dir.join("content.json"),
            users: data_dir.join("users.csv"),
            sessions: data_dir.join("viewing_sessions.csv"),
            snapshot_dir: data_dir.join("processed"),
            raw_dir: data_dir.join("raw"),
        }
    }

    pub fn users_json_lines(&self) -> PathBuf {
        self.raw_dir.join("users.jsonl")
    }

    pub fn sessions_json_lines(&self) -> PathBuf {
        self.raw_dir.join("viewing_sessions.jsonl")
    }
}

impl Default for PipelinePaths {
    fn default() -> Self {
        Self::under(DEFAULT_DATA_DIR)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Self {
            url: std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            max_connections: env_parse("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            connect_timeout_secs: env_parse(
                "DATABASE_CONNECT_TIMEOUT",
                DEFAULT_CONNECT_TIMEOUT_SECS,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.url.trim().is_empty() {
            bail!("DATABASE_URL cannot be empty");
        }
        if self.max_connections == 0 {
            bail!("DATABASE_MAX_CONNECTIONS must be greater than 0");
        }
        Ok(())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EtlConfig {
    pub paths: PipelinePaths,
    /// Rows per INSERT statement
    pub batch_size: usize,
    pub alert_recipient: String,
    pub database: DatabaseConfig,
}

impl EtlConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let data_dir = PathBuf::from(
            std::env::var("ETL_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string()),
        );
        let defaults = PipelinePaths::under(&data_dir);

        let config = Self {
            paths: PipelinePaths {
                catalog: env_path("ETL_CATALOG_PATH", defaults.catalog),
                users: env_path("ETL_USERS_PATH", defaults.users),
                sessions: env_path("ETL_SESSIONS_PATH", defaults.sessions),
                snapshot_dir: env_path("ETL_SNAPSHOT_DIR", defaults.snapshot_dir),
                raw_dir: env_path("ETL_RAW_DIR", defaults.raw_dir),
            },
            batch_size: env_parse("ETL_BATCH_SIZE", DEFAULT_BATCH_SIZE)?,
            alert_recipient: std::env::var("ETL_ALERT_RECIPIENT")
                .unwrap_or_else(|_| DEFAULT_ALERT_RECIPIENT.to_string()),
            database: DatabaseConfig::from_env()?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.batch_size == 0 {
            bail!("ETL_BATCH_SIZE must be greater than 0");
        }
        if self.alert_recipient.trim().is_empty() {
            bail!("ETL_ALERT_RECIPIENT cannot be empty");
        }
        self.database.validate()
    }
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            paths: PipelinePaths::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            alert_recipient: DEFAULT_ALERT_RECIPIENT.to_string(),
            database: DatabaseConfig::default(),
        }
    }
}

fn env_path(name: &str, default: PathBuf) -> PathBuf {
    std::env::var_os(name).map(PathBuf::from).unwrap_or(default)
}

fn env_parse<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}: {}", name, value)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "ETL_DATA_DIR",
        "ETL_CATALOG_PATH",
        "ETL_USERS_PATH",
        "ETL_SESSIONS_PATH",
        "ETL_SNAPSHOT_DIR",
        "ETL_RAW_DIR",
        "ETL_BATCH_SIZE",
        "ETL_ALERT_RECIPIENT",
        "DATABASE_URL",
        "DATABASE_MAX_CONNECTIONS",
        "DATABASE_CONNECT_TIMEOUT",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = EtlConfig::from_env().unwrap();

        assert_eq!(config, EtlConfig::default());
        assert_eq!(config.paths.catalog, PathBuf::from("data/content.json"));
        assert_eq!(config.paths.snapshot_dir, PathBuf::from("data/processed"));
        assert_eq!(config.paths.users_json_lines(), PathBuf::from("data/raw/users.jsonl"));
    }

    #[test]
    #[serial]
    fn test_data_dir_and_overrides() {
        clear_env();
        std::env::set_var("ETL_DATA_DIR", "/srv/etl");
        std::env::set_var("ETL_USERS_PATH", "/tmp/users.csv");
        std::env::set_var("ETL_BATCH_SIZE", "250");
        std::env::set_var("DATABASE_MAX_CONNECTIONS", "2");

        let config = EtlConfig::from_env().unwrap();
        clear_env();

        assert_eq!(config.paths.catalog, PathBuf::from("/srv/etl/content.json"));
        assert_eq!(config.paths.users, PathBuf::from("/tmp/users.csv"));
        assert_eq!(config.paths.raw_dir, PathBuf::from("/srv/etl/raw"));
        assert_eq!(config.batch_size, 250);
        assert_eq!(config.database.max_connections, 2);
    }

    #[test]
    #[serial]
    fn test_zero_batch_size_rejected() {
        clear_env();
        std::env::set_var("ETL_BATCH_SIZE", "0");
        let result = EtlConfig::from_env();
        clear_env();

        assert!(result.unwrap_err().to_string().contains("ETL_BATCH_SIZE"));
    }

    #[test]
    #[serial]
    fn test_unparseable_number_rejected() {
        clear_env();
        std::env::set_var("DATABASE_CONNECT_TIMEOUT", "soon");
        let result = EtlConfig::from_env();
        clear_env();

        assert!(result.unwrap_err().to_string().contains("DATABASE_CONNECT_TIMEOUT"));
    }

    #[test]
    fn test_empty_recipient_rejected() {
        let config = EtlConfig {
            alert_recipient: " ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
