//! Process core: owns the cache, the namespace registry and the sweeper.

use kickcache_config::AppConfig;
use kickcache_core::{CacheError, CacheResult};
use kickcache_jobs::{ExpirationError, ExpirationMachine};
use kickcache_repository::{CacheDriver, NoopCacheDriver, SqliteCacheDriver};
use kickcache_service::{Cache, Namespace, NamespaceRegistry};
use std::sync::Arc;
use tracing::{info, warn};

/// Running cache subsystem.
///
/// Built once by [`Core::init`]; [`Core::shutdown`] must run on every exit path.
#[derive(Debug)]
pub struct Core {
    cache: Arc<Cache>,
    registry: Arc<NamespaceRegistry>,
    expiration: Option<ExpirationMachine>,
}

impl Core {
    /// Loads the namespace registry, opens the cache and starts the sweeper.
    ///
    /// The sweeper is only started when caching is enabled and the interval
    /// is positive. If starting it fails the cache is closed before returning.
    pub async fn init(config: &AppConfig) -> CacheResult<Self> {
        let registry = Arc::new(load_registry(config)?);

        let driver: Arc<dyn CacheDriver> = if config.cache.enabled {
            Arc::new(SqliteCacheDriver::connect(&config.cache).await?)
        } else {
            info!("Caching disabled, every lookup goes upstream");
            Arc::new(NoopCacheDriver::new())
        };
        let cache = Arc::new(Cache::new(driver).await?);

        let interval = config.expiration.interval().filter(|_| config.cache.enabled);
        let expiration = match interval {
            Some(interval) => {
                let machine = ExpirationMachine::new(Arc::clone(&cache));
                if let Err(e) = machine.start(interval).await {
                    if let Err(close_err) = cache.close().await {
                        warn!(error = %close_err, "Failed to close cache after sweeper error");
                    }
                    return Err(into_cache_error(e));
                }
                Some(machine)
            }
            None => {
                info!("Expiration machine disabled");
                None
            }
        };

        Ok(Self {
            cache,
            registry,
            expiration,
        })
    }

    /// Returns the shared cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<Cache> {
        &self.cache
    }

    /// Returns the frozen namespace registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<NamespaceRegistry> {
        &self.registry
    }

    /// Looks up a namespace by name.
    #[must_use]
    pub fn namespace(&self, name: &str) -> Option<&Namespace> {
        self.registry.get(name)
    }

    /// Returns true while the sweeper worker is running.
    #[must_use]
    pub fn expiration_running(&self) -> bool {
        self.expiration
            .as_ref()
            .is_some_and(ExpirationMachine::is_started)
    }

    /// Stops the sweeper and closes the cache. Safe to call more than once.
    pub async fn shutdown(&self) -> CacheResult<()> {
        if let Some(machine) = &self.expiration {
            match machine.stop().await {
                Ok(()) | Err(ExpirationError::NotRunning) => {}
                Err(e) => warn!(error = %e, "Failed to stop expiration machine"),
            }
        }
        self.cache.close().await?;
        info!("Core shutdown complete");
        Ok(())
    }
}

fn load_registry(config: &AppConfig) -> CacheResult<NamespaceRegistry> {
    let mut registry = NamespaceRegistry::with_defaults();
    match config.expiration.extra_ttl_path() {
        Some(path) => {
            registry.load_or_bootstrap(path)?;
        }
        None => info!("No extra TTL file configured, every namespace keeps zero extra TTL"),
    }
    Ok(registry)
}

fn into_cache_error(err: ExpirationError) -> CacheError {
    match err {
        ExpirationError::Cache(e) => e,
        other => CacheError::internal(other.to_string()),
    }
}
