//! Common test infrastructure for expiration integration tests.

use kickcache_config::CacheConfig;
use kickcache_core::FixedClock;
use kickcache_repository::SqliteCacheDriver;
use kickcache_service::{Cache, Namespace, NamespaceRegistry};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// SQLite-backed cache with a controllable clock.
pub struct TestCache {
    _dir: TempDir,
    pub cache: Arc<Cache>,
    pub clock: Arc<FixedClock>,
    pub registry: NamespaceRegistry,
}

impl TestCache {
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

        let mut registry = NamespaceRegistry::with_defaults();
        let mapping = serde_json::json!({ "MATCH_INFO": 60 });
        registry
            .apply_extra_ttl(mapping.as_object().expect("object"))
            .expect("valid extra TTL");

        Self {
            _dir: dir,
            cache: Arc::new(cache),
            clock,
            registry,
        }
    }

    pub fn namespace(&self, name: &str) -> &Namespace {
        self.registry.get(name).expect("known namespace")
    }
}

/// Polls `condition` until it holds or two seconds pass.
pub async fn eventually<F, Fut>(mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        if condition().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
