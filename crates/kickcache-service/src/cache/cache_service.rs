//! Read-through cache façade over a storage driver.

use super::cache_keys::storage_key;
use super::Namespace;
use crate::metrics::CacheMetrics;
use kickcache_core::{CacheError, CacheResult, Clock, SystemClock};
use kickcache_repository::CacheDriver;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Result of a read-through lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOutcome {
    /// Cached or freshly fetched bytes.
    pub value: Vec<u8>,
    /// True when the value came from storage.
    pub hit: bool,
    /// True when this call wrote the value to storage.
    pub stored: bool,
}

/// Cache façade.
///
/// Derives storage keys from a [`Namespace`] and the caller key, stamps
/// inserted entries with `now + extra_ttl` and owns the driver's lifetime.
///
/// Owners must call [`Cache::close`]. Dropping an open cache inside a tokio
/// runtime spawns a best-effort close of the driver.
///
/// Read-through calls do not coalesce concurrent misses: two callers missing
/// the same key both fetch, both get their value back, and only the first
/// insert is kept.
pub struct Cache {
    driver: Arc<dyn CacheDriver>,
    clock: Arc<dyn Clock>,
    closed: AtomicBool,
}

impl Cache {
    /// Initializes `driver` and wraps it in a cache.
    pub async fn new(driver: Arc<dyn CacheDriver>) -> CacheResult<Self> {
        Self::with_clock(driver, Arc::new(SystemClock)).await
    }

    /// Like [`Cache::new`] with an explicit clock.
    pub async fn with_clock(
        driver: Arc<dyn CacheDriver>,
        clock: Arc<dyn Clock>,
    ) -> CacheResult<Self> {
        if let Err(e) = driver.init().await {
            if let Err(close_err) = driver.close().await {
                warn!(error = %close_err, "Failed to close driver after init error");
            }
            return Err(e);
        }
        info!(driver = driver.name(), "Cache initialized");

        Ok(Self {
            driver,
            clock,
            closed: AtomicBool::new(false),
        })
    }

    fn ensure_open(&self) -> CacheResult<()> {
        if self.is_closed() {
            Err(CacheError::Closed)
        } else {
            Ok(())
        }
    }

    fn expiry_date(&self, namespace: &Namespace) -> i64 {
        self.clock
            .now_unix()
            .saturating_add(namespace.extra_ttl_secs())
    }

    /// Stores `value` under `key`. Returns false if the key already exists.
    pub async fn insert(&self, namespace: &Namespace, key: &str, value: &[u8]) -> CacheResult<bool> {
        self.ensure_open()?;
        let key = storage_key(namespace, key);
        self.driver
            .insert(&key, value, self.expiry_date(namespace))
            .await
    }

    /// Selects the value stored under `key`.
    pub async fn select(&self, namespace: &Namespace, key: &str) -> CacheResult<Option<Vec<u8>>> {
        self.ensure_open()?;
        self.driver.select(&storage_key(namespace, key)).await
    }

    /// Deletes `key`, returning whether it was present.
    pub async fn delete(&self, namespace: &Namespace, key: &str) -> CacheResult<bool> {
        self.ensure_open()?;
        self.driver.delete(&storage_key(namespace, key)).await
    }

    /// Deletes fully qualified storage keys.
    pub async fn delete_many(&self, keys: &[String]) -> CacheResult<u64> {
        self.ensure_open()?;
        self.driver.delete_many(keys).await
    }

    /// Returns the storage keys whose recorded date is at least `threshold` seconds old.
    pub async fn select_expired(&self, threshold: i64) -> CacheResult<Vec<String>> {
        self.ensure_open()?;
        self.driver.select_expired(threshold).await
    }

    /// Counts stored entries.
    pub async fn len(&self) -> CacheResult<u64> {
        self.ensure_open()?;
        self.driver.len().await
    }

    /// Returns true if nothing is stored.
    pub async fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.len().await? == 0)
    }

    /// Pings the driver, failing with [`CacheError::Timeout`] after `timeout`.
    pub async fn ping(&self, timeout: Duration) -> CacheResult<()> {
        self.ensure_open()?;
        match tokio::time::timeout(timeout, self.driver.ping()).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout(format!("ping exceeded {:?}", timeout))),
        }
    }

    /// Closes the cache. Only the first call reaches the driver.
    pub async fn close(&self) -> CacheResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            debug!("Cache already closed");
            return Ok(());
        }
        info!(driver = self.driver.name(), "Closing cache");
        self.driver.close().await
    }

    /// Returns true once [`Cache::close`] has run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Returns the driver name.
    #[must_use]
    pub fn driver_name(&self) -> &'static str {
        self.driver.name()
    }

    /// Returns the cached value for `key`, or fetches and stores it.
    ///
    /// A failed fetch is returned unchanged and nothing is stored. A failed
    /// store is logged and the fetched value is still returned.
    pub async fn cache_func<F, Fut, E>(
        &self,
        namespace: &Namespace,
        key: &str,
        fetch: F,
    ) -> Result<CacheOutcome, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<u8>, E>>,
        E: From<CacheError>,
    {
        if let Some(value) = self.lookup(namespace, key).await? {
            return Ok(CacheOutcome {
                value,
                hit: true,
                stored: false,
            });
        }

        let value = match fetch().await {
            Ok(value) => value,
            Err(e) => {
                CacheMetrics::fetch_error(namespace.name());
                return Err(e);
            }
        };

        let stored = self.store(namespace, key, &value).await;
        Ok(CacheOutcome {
            value,
            hit: false,
            stored,
        })
    }

    /// Like [`Cache::cache_func`], but serializes the fetched value as JSON.
    pub async fn cache_func_json<T, F, Fut, E>(
        &self,
        namespace: &Namespace,
        key: &str,
        fetch: F,
    ) -> Result<CacheOutcome, E>
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<CacheError>,
    {
        if let Some(value) = self.lookup(namespace, key).await? {
            return Ok(CacheOutcome {
                value,
                hit: true,
                stored: false,
            });
        }

        let fetched = match fetch().await {
            Ok(fetched) => fetched,
            Err(e) => {
                CacheMetrics::fetch_error(namespace.name());
                return Err(e);
            }
        };
        let value = serde_json::to_vec(&fetched).map_err(CacheError::from)?;

        let stored = self.store(namespace, key, &value).await;
        Ok(CacheOutcome {
            value,
            hit: false,
            stored,
        })
    }

    async fn lookup(&self, namespace: &Namespace, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let value = self.select(namespace, key).await?;
        if value.is_some() {
            debug!(namespace = namespace.name(), key = %key, "Cache hit");
            CacheMetrics::hit(namespace.name());
        } else {
            debug!(namespace = namespace.name(), key = %key, "Cache miss");
            CacheMetrics::miss(namespace.name());
        }
        Ok(value)
    }

    async fn store(&self, namespace: &Namespace, key: &str, value: &[u8]) -> bool {
        match self.insert(namespace, key, value).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(
                    namespace = namespace.name(),
                    key = %key,
                    error = %e,
                    "Failed to store fetched value"
                );
                CacheMetrics::store_failure(namespace.name());
                false
            }
        }
    }
}

impl Drop for Cache {
    fn drop(&mut self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                warn!("Cache dropped without close, closing driver in background");
                let driver = Arc::clone(&self.driver);
                handle.spawn(async move {
                    if let Err(e) = driver.close().await {
                        warn!(error = %e, "Background driver close failed");
                    }
                });
            }
            Err(_) => warn!("Cache dropped without close outside a runtime, driver left open"),
        }
    }
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("driver", &self.driver.name())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
