//! SQLite-backed cache driver.

use crate::pool::DatabasePool;
use crate::traits::CacheDriver;
use async_trait::async_trait;
use kickcache_config::CacheConfig;
use kickcache_core::{CacheError, CacheResult, Clock, SystemClock};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Keys bound per `DELETE ... IN (...)` statement; SQLite caps bound parameters.
const DELETE_CHUNK_SIZE: usize = 500;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS cache (
    key   TEXT PRIMARY KEY,
    value BLOB NOT NULL,
    date  BIGINT NOT NULL
)";

const CREATE_DATE_INDEX: &str = "CREATE INDEX IF NOT EXISTS cache_date_idx ON cache (date)";

/// Persistent driver storing `(key, value, date)` rows in a single table.
pub struct SqliteCacheDriver {
    pool: DatabasePool,
    clock: Arc<dyn Clock>,
    vacuum_on_init: bool,
    closed: AtomicBool,
}

impl SqliteCacheDriver {
    /// Connects to the configured database, failing fast on timeout.
    ///
    /// The schema is not touched until [`CacheDriver::init`] runs.
    pub async fn connect(config: &CacheConfig) -> CacheResult<Self> {
        let pool = DatabasePool::new(config).await?;
        Ok(Self::with_pool(pool).vacuum_on_init(config.vacuum_on_init))
    }

    /// Wraps an already-connected pool.
    #[must_use]
    pub fn with_pool(pool: DatabasePool) -> Self {
        Self {
            pool,
            clock: Arc::new(SystemClock),
            vacuum_on_init: false,
            closed: AtomicBool::new(false),
        }
    }

    /// Replaces the clock used by expiry queries.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Compacts the database file after schema creation.
    #[must_use]
    pub fn vacuum_on_init(mut self, vacuum: bool) -> Self {
        self.vacuum_on_init = vacuum;
        self
    }

    /// Returns the underlying pool.
    #[must_use]
    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// Creates the table and index under a write lock taken up front.
    async fn create_schema(&self) -> Result<(), sqlx::Error> {
        let mut conn = self.pool.inner().acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

        match create_tables(&mut conn).await {
            Ok(()) => {
                sqlx::query("COMMIT").execute(&mut *conn).await?;
                Ok(())
            }
            Err(e) => {
                if let Err(rollback_err) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                    warn!(error = %rollback_err, "Failed to roll back schema creation");
                }
                Err(e)
            }
        }
    }
}

async fn create_tables(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(CREATE_TABLE).execute(&mut *conn).await?;
    sqlx::query(CREATE_DATE_INDEX).execute(&mut *conn).await?;
    Ok(())
}

impl std::fmt::Debug for SqliteCacheDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteCacheDriver")
            .field("pool", &self.pool)
            .field("vacuum_on_init", &self.vacuum_on_init)
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CacheDriver for SqliteCacheDriver {
    async fn init(&self) -> CacheResult<()> {
        self.create_schema()
            .await
            .map_err(|e| CacheError::unavailable(format!("Failed to create schema: {}", e)))?;

        if self.vacuum_on_init {
            // VACUUM cannot run inside a transaction.
            sqlx::query("VACUUM")
                .execute(self.pool.inner())
                .await
                .map_err(|e| CacheError::unavailable(format!("Failed to vacuum: {}", e)))?;
        }

        info!(vacuum = self.vacuum_on_init, "Cache schema ready");
        Ok(())
    }

    async fn ping(&self) -> CacheResult<()> {
        self.pool.health_check().await
    }

    async fn insert(&self, key: &str, value: &[u8], date: i64) -> CacheResult<bool> {
        let mut tx = self.pool.inner().begin().await?;
        let result = sqlx::query(
            "INSERT INTO cache (key, value, date) VALUES (?, ?, ?) ON CONFLICT(key) DO NOTHING",
        )
        .bind(key)
        .bind(value)
        .bind(date)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        let inserted = result.rows_affected() > 0;
        if !inserted {
            debug!(key = %key, "Key already present, insert skipped");
        }
        Ok(inserted)
    }

    async fn select(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let value = sqlx::query_scalar::<_, Vec<u8>>("SELECT value FROM cache WHERE key = ?")
            .bind(key)
            .fetch_optional(self.pool.inner())
            .await?;
        Ok(value)
    }

    async fn select_expired(&self, expire_after: i64) -> CacheResult<Vec<String>> {
        let now = self.clock.now_unix();
        let keys = sqlx::query_scalar::<_, String>("SELECT key FROM cache WHERE (? - date) > ? - 1")
            .bind(now)
            .bind(expire_after)
            .fetch_all(self.pool.inner())
            .await?;
        Ok(keys)
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        let mut tx = self.pool.inner().begin().await?;
        let result = sqlx::query("DELETE FROM cache WHERE key = ?")
            .bind(key)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_many(&self, keys: &[String]) -> CacheResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }

        let mut deleted = 0;
        let mut tx = self.pool.inner().begin().await?;
        for chunk in keys.chunks(DELETE_CHUNK_SIZE) {
            let mut builder: QueryBuilder<'_, Sqlite> =
                QueryBuilder::new("DELETE FROM cache WHERE key IN (");
            let mut separated = builder.separated(", ");
            for key in chunk {
                separated.push_bind(key.as_str());
            }
            separated.push_unseparated(")");

            deleted += builder.build().execute(&mut *tx).await?.rows_affected();
        }
        tx.commit().await?;

        debug!(requested = keys.len(), deleted, "Deleted cache keys");
        Ok(deleted)
    }

    async fn len(&self) -> CacheResult<u64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM cache")
            .fetch_one(self.pool.inner())
            .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn close(&self) -> CacheResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            debug!("SQLite driver already closed");
            return Ok(());
        }
        self.pool.close().await;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}
