//! Common test infrastructure for cache integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use kickcache_config::CacheConfig;
use kickcache_core::{CacheResult, FixedClock};
use kickcache_repository::{CacheDriver, SqliteCacheDriver};
use kickcache_service::Cache;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// In-memory driver that counts closes and can simulate a slow ping.
#[derive(Default)]
pub struct MemoryDriver {
    rows: Mutex<HashMap<String, (Vec<u8>, i64)>>,
    closes: AtomicUsize,
    ping_delay: Option<Duration>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ping_delay(delay: Duration) -> Self {
        Self {
            ping_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn date_of(&self, key: &str) -> Option<i64> {
        self.rows.lock().unwrap().get(key).map(|(_, date)| *date)
    }
}

#[async_trait]
impl CacheDriver for MemoryDriver {
    async fn init(&self) -> CacheResult<()> {
        Ok(())
    }

    async fn ping(&self) -> CacheResult<()> {
        if let Some(delay) = self.ping_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    async fn insert(&self, key: &str, value: &[u8], date: i64) -> CacheResult<bool> {
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(key) {
            return Ok(false);
        }
        rows.insert(key.to_string(), (value.to_vec(), date));
        Ok(true)
    }

    async fn select(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        Ok(self.rows.lock().unwrap().get(key).map(|(v, _)| v.clone()))
    }

    async fn select_expired(&self, _expire_after: i64) -> CacheResult<Vec<String>> {
        Ok(Vec::new())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        Ok(self.rows.lock().unwrap().remove(key).is_some())
    }

    async fn delete_many(&self, keys: &[String]) -> CacheResult<u64> {
        let mut rows = self.rows.lock().unwrap();
        Ok(keys.iter().filter(|k| rows.remove(*k).is_some()).count() as u64)
    }

    async fn len(&self) -> CacheResult<u64> {
        Ok(self.rows.lock().unwrap().len() as u64)
    }

    async fn close(&self) -> CacheResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// SQLite-backed cache in a temporary directory with a controllable clock.
pub struct SqliteCache {
    _dir: TempDir,
    pub cache: Arc<Cache>,
    pub clock: Arc<FixedClock>,
}

impl SqliteCache {
    pub async fn new(now: i64) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = CacheConfig {
            sqlite_dsn: dir.path().join("cache.sqlite3").to_string_lossy().into_owned(),
            connect_timeout_secs: 5,
            ..CacheConfig::default()
        };

        let clock = Arc::new(FixedClock::new(now));
        let driver = SqliteCacheDriver::connect(&config)
            .await
            .expect("Failed to connect to SQLite")
            .with_clock(clock.clone());
        let cache = Cache::with_clock(Arc::new(driver), clock.clone())
            .await
            .expect("Failed to initialize cache");

        Self {
            _dir: dir,
            cache: Arc::new(cache),
            clock,
        }
    }
}
