//! Storage driver trait definition.

use async_trait::async_trait;
use kickcache_core::CacheResult;

/// Byte-oriented key-value store with insertion-date metadata.
///
/// Keys are fully qualified storage keys; values are opaque bytes.
/// Implementations must be safe to share between request handlers and
/// the expiration sweeper.
#[async_trait]
pub trait CacheDriver: Send + Sync {
    /// Creates the backing schema if it does not exist yet.
    async fn init(&self) -> CacheResult<()>;

    /// Checks that the backing store is reachable.
    async fn ping(&self) -> CacheResult<()>;

    /// Inserts `value` under `key` with the given unix `date`.
    ///
    /// Returns `false` without touching the stored row when `key` already exists.
    async fn insert(&self, key: &str, value: &[u8], date: i64) -> CacheResult<bool>;

    /// Selects the value stored under `key`.
    async fn select(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Selects every key whose age (`now - date`) is at least `expire_after` seconds.
    async fn select_expired(&self, expire_after: i64) -> CacheResult<Vec<String>>;

    /// Deletes `key`, returning whether a row was present.
    async fn delete(&self, key: &str) -> CacheResult<bool>;

    /// Deletes every listed key, returning how many rows were removed.
    async fn delete_many(&self, keys: &[String]) -> CacheResult<u64>;

    /// Counts stored entries.
    async fn len(&self) -> CacheResult<u64>;

    /// Returns true if no entries are stored.
    async fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.len().await? == 0)
    }

    /// Releases the underlying connections.
    async fn close(&self) -> CacheResult<()>;

    /// Short driver name used in logs.
    fn name(&self) -> &'static str;
}
