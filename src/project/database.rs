/// Connection pool and scoped sessions
///
/// One long-lived pool is built per process and handed down explicitly to
/// whoever needs it. Units of work borrow a [`Session`] from it; the session
/// goes back to the pool when dropped, whatever path the caller exits through.

use crate::config::{ConfigError, DatabaseConfig};
use sqlx::{any::AnyPoolOptions, Any, AnyConnection, AnyPool, Transaction};
use thiserror::Error;

/// Errors produced by the storage layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Connection parameters could not be turned into a URL
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// URL scheme names a driver this service does not speak
    #[error("unsupported database backend: {0}")]
    UnsupportedBackend(String),

    /// Pool construction or session acquisition failed
    #[error("database connection error: {0}")]
    Connection(#[source] sqlx::Error),

    /// Tables could not be created
    #[error("schema creation error: {0}")]
    SchemaCreation(#[source] sqlx::Error),

    /// A project with this name already exists
    #[error("project name already exists: {0}")]
    DuplicateName(String),

    /// A text column value exceeds its declared length
    #[error("{field} exceeds {max} characters")]
    FieldTooLong { field: &'static str, max: usize },

    #[error("database query error: {0}")]
    Query(#[from] sqlx::Error),
}

/// SQL dialect behind the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    MySql,
    Sqlite,
}

impl Backend {
    /// Detect the backend from a connection URL scheme
    pub fn from_url(url: &str) -> Result<Self, DatabaseError> {
        let scheme = url.split(':').next().unwrap_or_default();
        match scheme {
            "mysql" => Ok(Self::MySql),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(DatabaseError::UnsupportedBackend(other.to_string())),
        }
    }
}

/// Process-wide connection pool
///
/// Cheap to clone: clones share the same underlying pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: AnyPool,
    backend: Backend,
}

impl Database {
    /// Build the pool from environment-derived configuration
    ///
    /// No connection is opened here; the first session or schema bootstrap
    /// does that, so an unreachable server is reported by the caller's retry loop.
    pub fn from_config(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let url = config.connection_url()?;
        let options = AnyPoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .acquire_timeout(config.acquire_timeout());
        Self::with_options(&url, options)
    }

    /// Build a lazily connecting pool for an explicit URL
    pub fn connect_lazy(url: &str, max_connections: u32) -> Result<Self, DatabaseError> {
        Self::with_options(url, AnyPoolOptions::new().max_connections(max_connections.max(1)))
    }

    fn with_options(url: &str, options: AnyPoolOptions) -> Result<Self, DatabaseError> {
        let backend = Backend::from_url(url)?;

        sqlx::any::install_default_drivers();

        let max_connections = options.get_max_connections();
        let pool = options
            .connect_lazy(url)
            .map_err(DatabaseError::Connection)?;

        tracing::debug!(?backend, max_connections, "database pool created");

        Ok(Self { pool, backend })
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Raw pool access for schema management
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Borrow a connection and open a transaction on it
    ///
    /// Fails immediately if no connection can be obtained; there is no retry here.
    pub async fn acquire_session(&self) -> Result<Session, DatabaseError> {
        let tx = self.pool.begin().await.map_err(DatabaseError::Connection)?;
        Ok(Session { tx })
    }

    /// Close every pooled connection; later sessions fail
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}

/// Transactional unit of work on one pooled connection
///
/// Dropping a session without [`Session::commit`] rolls its work back and
/// returns the connection to the pool.
pub struct Session {
    tx: Transaction<'static, Any>,
}

impl Session {
    /// Round-trip `SELECT 1` to prove the connection is live
    pub async fn ping(&mut self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&mut *self.tx).await?;
        Ok(())
    }

    /// Connection to run queries against inside this session
    pub fn connection(&mut self) -> &mut AnyConnection {
        &mut self.tx
    }

    pub async fn commit(self) -> Result<(), DatabaseError> {
        self.tx.commit().await?;
        Ok(())
    }
}
