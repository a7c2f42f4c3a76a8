//! Common test infrastructure for database integration tests.

use kickcache_config::CacheConfig;
use kickcache_core::FixedClock;
use kickcache_repository::{CacheDriver, SqliteCacheDriver};
use std::sync::Arc;
use tempfile::TempDir;

/// Test database wrapper.
///
/// Owns a temporary directory holding a fresh SQLite file and an initialized
/// driver whose clock is under test control.
pub struct TestDatabase {
    _dir: TempDir,
    driver: Arc<SqliteCacheDriver>,
    clock: Arc<FixedClock>,
}

impl TestDatabase {
    /// Creates a new test database with the clock frozen at `now`.
    pub async fn new(now: i64) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = CacheConfig {
            sqlite_dsn: dir.path().join("cache.sqlite3").to_string_lossy().into_owned(),
            connect_timeout_secs: 5,
            vacuum_on_init: true,
            ..CacheConfig::default()
        };

        let clock = Arc::new(FixedClock::new(now));
        let driver = SqliteCacheDriver::connect(&config)
            .await
            .expect("Failed to connect to SQLite")
            .with_clock(clock.clone());

        driver.init().await.expect("Failed to create schema");

        Self {
            _dir: dir,
            driver: Arc::new(driver),
            clock,
        }
    }

    /// Returns the shared driver.
    pub fn driver(&self) -> Arc<SqliteCacheDriver> {
        Arc::clone(&self.driver)
    }

    /// Returns the controllable clock.
    pub fn clock(&self) -> &FixedClock {
        &self.clock
    }
}
