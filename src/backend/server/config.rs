/**
 * Server Configuration
 *
 * Layered configuration: built-in defaults, then an optional TOML file
 * (path taken from `NOTECOLLAB_CONFIG`), then environment variables.
 *
 * # Environment Variables
 *
 * - `SERVER_PORT` (default 3000)
 * - `DATABASE_URL` (optional; without it notebooks live in memory)
 * - `JWT_SECRET` (required)
 * - `MAX_CONNECTIONS_PER_ADDRESS` (default 10)
 * - `ADMISSION_TTL_SECS` (default 3600)
 * - `ADMISSION_SWEEP_SECS` (default 300)
 *
 * # Database
 *
 * `load_database` connects and runs migrations. Failures are logged and the
 * server continues with the in-memory store.
 */

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;

use crate::backend::collab::{InMemoryNotebookStore, NotebookStore, PgNotebookStore};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_CONNECTIONS_PER_ADDRESS: usize = 10;
pub const DEFAULT_ADMISSION_TTL_SECS: u64 = 3600;
pub const DEFAULT_ADMISSION_SWEEP_SECS: u64 = 300;

const CONFIG_ENV: &str = "NOTECOLLAB_CONFIG";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
    #[error("missing value: {0}")]
    MissingValue(&'static str),
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub max_connections_per_address: usize,
    pub admission_ttl_secs: u64,
    pub admission_sweep_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: None,
            jwt_secret: String::new(),
            max_connections_per_address: DEFAULT_MAX_CONNECTIONS_PER_ADDRESS,
            admission_ttl_secs: DEFAULT_ADMISSION_TTL_SECS,
            admission_sweep_secs: DEFAULT_ADMISSION_SWEEP_SECS,
        }
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("port", &self.port)
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("max_connections_per_address", &self.max_connections_per_address)
            .field("admission_ttl_secs", &self.admission_ttl_secs)
            .field("admission_sweep_secs", &self.admission_sweep_secs)
            .finish_non_exhaustive()
    }
}

impl ServerConfig {
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Defaults, then the optional config file, then the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        let config = config.with_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply variable overrides from `lookup`
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("SERVER_PORT") {
            self.port = parse_var("SERVER_PORT", port)?;
        }
        if let Some(url) = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()) {
            self.database_url = Some(url);
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.jwt_secret = secret;
        }
        if let Some(max) = lookup("MAX_CONNECTIONS_PER_ADDRESS") {
            self.max_connections_per_address = parse_var("MAX_CONNECTIONS_PER_ADDRESS", max)?;
        }
        if let Some(ttl) = lookup("ADMISSION_TTL_SECS") {
            self.admission_ttl_secs = parse_var("ADMISSION_TTL_SECS", ttl)?;
        }
        if let Some(sweep) = lookup("ADMISSION_SWEEP_SECS") {
            self.admission_sweep_secs = parse_var("ADMISSION_SWEEP_SECS", sweep)?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections_per_address == 0 {
            return Err(ConfigError::InvalidValue {
                name: "MAX_CONNECTIONS_PER_ADDRESS",
                value: "0".to_string(),
            });
        }
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingValue("JWT_SECRET"));
        }
        if self.admission_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                name: "ADMISSION_TTL_SECS",
                value: "0".to_string(),
            });
        }
        // live addresses are renewed by the sweep, so it must run inside the TTL
        if self.admission_sweep_secs == 0 || self.admission_sweep_secs >= self.admission_ttl_secs {
            return Err(ConfigError::InvalidValue {
                name: "ADMISSION_SWEEP_SECS",
                value: self.admission_sweep_secs.to_string(),
            });
        }
        Ok(())
    }

    pub fn admission_ttl(&self) -> Duration {
        Duration::from_secs(self.admission_ttl_secs)
    }

    pub fn admission_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.admission_sweep_secs)
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { name, value })
}

/// Builder for ServerConfig
#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    port: Option<u16>,
    database_url: Option<String>,
    jwt_secret: Option<String>,
    max_connections_per_address: Option<usize>,
    admission_ttl_secs: Option<u64>,
    admission_sweep_secs: Option<u64>,
}

impl ServerConfigBuilder {
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.jwt_secret = Some(secret.into());
        self
    }

    pub fn max_connections_per_address(mut self, max: usize) -> Self {
        self.max_connections_per_address = Some(max);
        self
    }

    pub fn admission_ttl_secs(mut self, secs: u64) -> Self {
        self.admission_ttl_secs = Some(secs);
        self
    }

    pub fn admission_sweep_secs(mut self, secs: u64) -> Self {
        self.admission_sweep_secs = Some(secs);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<ServerConfig, ConfigError> {
        let defaults = ServerConfig::default();
        let config = ServerConfig {
            port: self.port.unwrap_or(defaults.port),
            database_url: self.database_url,
            jwt_secret: self.jwt_secret.unwrap_or(defaults.jwt_secret),
            max_connections_per_address: self
                .max_connections_per_address
                .unwrap_or(defaults.max_connections_per_address),
            admission_ttl_secs: self.admission_ttl_secs.unwrap_or(defaults.admission_ttl_secs),
            admission_sweep_secs: self
                .admission_sweep_secs
                .unwrap_or(defaults.admission_sweep_secs),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Connect to PostgreSQL and run migrations
///
/// Returns `None` when `database_url` is unset or the database is
/// unreachable.
pub async fn load_database(database_url: Option<&str>) -> Option<PgPool> {
    let Some(database_url) = database_url else {
        tracing::warn!("[Server] DATABASE_URL not set. Notebooks are kept in memory.");
        return None;
    };

    tracing::info!("[Server] Connecting to database...");
    let pool = match PgPool::connect(database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("[Server] Failed to create database connection pool: {:?}", e);
            tracing::warn!("[Server] Falling back to the in-memory notebook store.");
            return None;
        }
    };

    tracing::info!("[Server] Running database migrations...");
    match sqlx::migrate!().run(&pool).await {
        Ok(_) => tracing::info!("[Server] Database migrations completed successfully"),
        Err(e) => {
            tracing::error!("[Server] Failed to run database migrations: {}", e);
            tracing::warn!("[Server] Continuing without migrations - schema might not be up to date");
        }
    }

    Some(pool)
}

/// Pick the notebook store for this configuration
pub async fn load_store(config: &ServerConfig) -> Arc<dyn NotebookStore> {
    match load_database(config.database_url.as_deref()).await {
        Some(pool) => Arc::new(PgNotebookStore::new(pool)),
        None => Arc::new(InMemoryNotebookStore::new()),
    }
}
