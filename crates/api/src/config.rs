use std::str::FromStr;
use std::time::Duration;

use event_store_core::validation::{RuleSetVersion, DEFAULT_DOCUMENT_URI_PATTERN};
use event_store_db::DbConfig;

/// How accepted reports reach the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PersistenceMode {
    /// Respond only after the insert completes; a failed insert is a 500.
    #[default]
    Sync,
    /// Respond once the report is queued; a background writer inserts it
    /// and logs failures.
    Queued,
}

impl FromStr for PersistenceMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sync" | "synchronous" => Ok(PersistenceMode::Sync),
            "queued" | "async" | "asynchronous" => Ok(PersistenceMode::Queued),
            _ => Err(ConfigError::Invalid {
                key: "PERSISTENCE_MODE",
                value: s.to_string(),
            }),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::Invalid {
                key: "LOG_FORMAT",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Server configuration loaded from environment variables.
///
/// All fields except the database URL have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3097`).
    pub port: u16,
    /// Report database connection settings.
    pub db: DbConfig,
    /// HTTP request timeout in seconds (default: `10`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for queued reports to drain (default: `30`).
    pub shutdown_timeout_secs: u64,
    pub persistence_mode: PersistenceMode,
    /// Bound on reports waiting for the background writer (default: `1024`).
    pub persistence_queue_capacity: usize,
    pub ruleset_version: RuleSetVersion,
    /// Trusted-origin pattern for `document-uri`.
    pub document_uri_pattern: String,
    /// Key of the boolean in the `/healthcheck` body (default: `mongo`).
    pub healthcheck_key: String,
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default         |
    /// |------------------------------|-----------------|
    /// | `HOST`                       | `0.0.0.0`       |
    /// | `PORT`                       | `3097`          |
    /// | `DATABASE_URL`               | (required)      |
    /// | `DB_MAX_CONNECTIONS`         | `10`            |
    /// | `DB_CONNECT_TIMEOUT_MS`      | `200`           |
    /// | `DB_STATEMENT_TIMEOUT_MS`    | `1000`          |
    /// | `REQUEST_TIMEOUT_SECS`       | `10`            |
    /// | `SHUTDOWN_TIMEOUT_SECS`      | `30`            |
    /// | `PERSISTENCE_MODE`           | `sync`          |
    /// | `PERSISTENCE_QUEUE_CAPACITY` | `1024`          |
    /// | `CSP_RULESET`                | `v2`            |
    /// | `CSP_DOCUMENT_URI_PATTERN`   | GOV.UK origins  |
    /// | `HEALTHCHECK_KEY`            | `mongo`         |
    /// | `LOG_FORMAT`                 | `text`          |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. Empty values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let mut db = DbConfig::new(database_url);
        db.max_connections = parse_or(&get, "DB_MAX_CONNECTIONS", db.max_connections)?;
        db.connect_timeout = Duration::from_millis(parse_or(&get, "DB_CONNECT_TIMEOUT_MS", 200)?);
        db.statement_timeout =
            Duration::from_millis(parse_or(&get, "DB_STATEMENT_TIMEOUT_MS", 1000)?);

        let ruleset_version = match get("CSP_RULESET") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
                key: "CSP_RULESET",
                value: v,
            })?,
            None => RuleSetVersion::default(),
        };

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&get, "PORT", 3097)?,
            db,
            request_timeout_secs: parse_or(&get, "REQUEST_TIMEOUT_SECS", 10)?,
            shutdown_timeout_secs: parse_or(&get, "SHUTDOWN_TIMEOUT_SECS", 30)?,
            persistence_mode: parse_or(&get, "PERSISTENCE_MODE", PersistenceMode::default())?,
            persistence_queue_capacity: parse_or(&get, "PERSISTENCE_QUEUE_CAPACITY", 1024)?,
            ruleset_version,
            document_uri_pattern: get("CSP_DOCUMENT_URI_PATTERN")
                .unwrap_or_else(|| DEFAULT_DOCUMENT_URI_PATTERN.into()),
            healthcheck_key: get("HEALTHCHECK_KEY").unwrap_or_else(|| "mongo".into()),
            log_format: parse_or(&get, "LOG_FORMAT", LogFormat::default())?,
        })
    }

    /// Upper bound for a store liveness probe: one connect plus one
    /// statement.
    pub fn store_ping_timeout(&self) -> Duration {
        self.db.connect_timeout + self.db.statement_timeout
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}
