//! SQLite connection pool management.

use kickcache_config::CacheConfig;
use kickcache_core::{CacheError, CacheResult};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// SQLite pool wrapper.
pub struct DatabasePool {
    pool: SqlitePool,
}

impl DatabasePool {
    /// Creates a new database pool from configuration.
    ///
    /// The database file is created when missing. Fails if no connection can
    /// be established within the configured connect timeout.
    pub async fn new(config: &CacheConfig) -> CacheResult<Self> {
        let timeout = config.connect_timeout();
        info!(dsn = %config.sqlite_dsn, ?timeout, "Connecting to SQLite database...");

        let options = connect_options(&config.sqlite_dsn, timeout)?;
        let connect = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .acquire_timeout(timeout)
            .connect_with(options);

        let pool = match tokio::time::timeout(timeout, connect).await {
            Ok(Ok(pool)) => pool,
            Ok(Err(e)) => {
                warn!("Failed to connect to database: {}", e);
                return Err(CacheError::unavailable(format!("Failed to connect: {}", e)));
            }
            Err(_) => {
                warn!(?timeout, "Timed out connecting to database");
                return Err(CacheError::unavailable(format!(
                    "Connect timed out after {:?}",
                    timeout
                )));
            }
        };

        info!("SQLite connection pool established");
        Ok(Self { pool })
    }

    /// Creates a `DatabasePool` around an existing pool.
    #[must_use]
    pub fn with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the underlying pool.
    #[must_use]
    pub fn inner(&self) -> &SqlitePool {
        &self.pool
    }

    /// Checks if the database connection is healthy.
    pub async fn health_check(&self) -> CacheResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| CacheError::unavailable(format!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Closes the database pool.
    pub async fn close(&self) {
        info!("Closing database connection pool...");
        self.pool.close().await;
        info!("Database connection pool closed");
    }

    /// Returns true once the pool has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}

impl std::fmt::Debug for DatabasePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabasePool")
            .field("size", &self.pool.size())
            .field("num_idle", &self.pool.num_idle())
            .finish()
    }
}

/// Builds connect options from either a `sqlite:` URL or a plain file path.
fn connect_options(dsn: &str, busy_timeout: Duration) -> CacheResult<SqliteConnectOptions> {
    let dsn = dsn.trim();
    if dsn.is_empty() {
        return Err(CacheError::configuration("SQLite DSN is empty"));
    }

    let options = if dsn.starts_with("sqlite:") {
        SqliteConnectOptions::from_str(dsn)
            .map_err(|e| CacheError::configuration(format!("Invalid SQLite DSN '{}': {}", dsn, e)))?
    } else {
        SqliteConnectOptions::new().filename(dsn)
    };

    Ok(options.create_if_missing(true).busy_timeout(busy_timeout))
}
