//! Driver used when caching is disabled.

use crate::traits::CacheDriver;
use async_trait::async_trait;
use kickcache_core::CacheResult;

/// Always-miss driver: writes are accepted and discarded, reads find nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCacheDriver;

impl NoopCacheDriver {
    /// Creates a new no-op driver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CacheDriver for NoopCacheDriver {
    async fn init(&self) -> CacheResult<()> {
        Ok(())
    }

    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }

    async fn insert(&self, _key: &str, _value: &[u8], _date: i64) -> CacheResult<bool> {
        Ok(false)
    }

    async fn select(&self, _key: &str) -> CacheResult<Option<Vec<u8>>> {
        Ok(None)
    }

    async fn select_expired(&self, _expire_after: i64) -> CacheResult<Vec<String>> {
        Ok(Vec::new())
    }

    async fn delete(&self, _key: &str) -> CacheResult<bool> {
        Ok(false)
    }

    async fn delete_many(&self, _keys: &[String]) -> CacheResult<u64> {
        Ok(0)
    }

    async fn len(&self) -> CacheResult<u64> {
        Ok(0)
    }

    async fn close(&self) -> CacheResult<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
