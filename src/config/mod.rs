/// Configuration management for the Project Management API
///
/// Reads server, database and startup parameters from the process environment.
/// Database connection variables are mandatory; everything else has a default.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Default HTTP bind host
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default HTTP bind port
pub const DEFAULT_PORT: u16 = 8000;
/// Default number of pooled database connections
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
/// Default number of schema bootstrap attempts before giving up
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
/// Default pause between schema bootstrap attempts, in seconds
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 5;
/// Default wait for a pooled connection, in seconds
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Errors raised while reading configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required environment variable is not set
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// An environment variable is set but cannot be used
    #[error("invalid value {value:?} for environment variable {name}")]
    Invalid { name: &'static str, value: String },

    /// A `.env` file exists but could not be read or parsed
    #[error("failed to load .env file: {0}")]
    EnvFile(String),
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Startup retry configuration
    pub startup: StartupConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
}

/// Database connection parameters
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
    /// Database (schema) name
    pub name: String,
    /// Upper bound on pooled connections
    pub max_connections: u32,
    /// How long to wait for a connection before an attempt fails
    pub acquire_timeout_secs: u64,
}

/// Bounded retry parameters for the schema bootstrap
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartupConfig {
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
}

impl Config {
    /// Load configuration from the process environment
    ///
    /// A `.env` file in the working directory is honoured if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        env_file_outcome(dotenvy::dotenv())?;
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));

        let server = ServerConfig {
            host: lookup("APP_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or("APP_PORT", lookup("APP_PORT"), DEFAULT_PORT)?,
        };

        let database = DatabaseConfig {
            host: required("DB_HOST")?,
            port: parse_var("DB_PORT", required("DB_PORT")?)?,
            user: required("DB_USER")?,
            password: required("DB_PASSWORD")?,
            name: required("DB_NAME")?,
            max_connections: parse_or(
                "DB_MAX_CONNECTIONS",
                lookup("DB_MAX_CONNECTIONS"),
                DEFAULT_MAX_CONNECTIONS,
            )?,
            acquire_timeout_secs: parse_or(
                "DB_ACQUIRE_TIMEOUT_SECS",
                lookup("DB_ACQUIRE_TIMEOUT_SECS"),
                DEFAULT_ACQUIRE_TIMEOUT_SECS,
            )?,
        };

        let startup = StartupConfig {
            max_attempts: parse_or(
                "DB_CONNECT_MAX_ATTEMPTS",
                lookup("DB_CONNECT_MAX_ATTEMPTS"),
                DEFAULT_MAX_ATTEMPTS,
            )?,
            retry_delay_secs: parse_or(
                "DB_CONNECT_RETRY_DELAY_SECS",
                lookup("DB_CONNECT_RETRY_DELAY_SECS"),
                DEFAULT_RETRY_DELAY_SECS,
            )?,
        };

        Ok(Self { server, database, startup })
    }
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    /// MySQL connection URL with percent-encoded credentials
    pub fn connection_url(&self) -> Result<String, ConfigError> {
        let invalid = |name: &'static str, value: &str| ConfigError::Invalid {
            name,
            value: value.to_string(),
        };

        let mut url = Url::parse("mysql://localhost").map_err(|_| invalid("DB_HOST", &self.host))?;
        url.set_host(Some(&self.host))
            .map_err(|_| invalid("DB_HOST", &self.host))?;
        url.set_port(Some(self.port))
            .map_err(|_| invalid("DB_PORT", &self.port.to_string()))?;
        url.set_username(&self.user)
            .map_err(|_| invalid("DB_USER", &self.user))?;
        url.set_password(Some(&self.password))
            .map_err(|_| invalid("DB_PASSWORD", "<redacted>"))?;
        url.set_path(&self.name);

        Ok(url.into())
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .finish()
    }
}

impl StartupConfig {
    /// Fixed pause between attempts
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay_secs: DEFAULT_RETRY_DELAY_SECS,
        }
    }
}

/// Absent `.env` is the normal case inside containers; anything else is fatal
fn env_file_outcome<T>(result: dotenvy::Result<T>) -> Result<(), ConfigError> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(ConfigError::EnvFile(e.to_string())),
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(value) => parse_var(name, value),
        None => Ok(default),
    }
}
