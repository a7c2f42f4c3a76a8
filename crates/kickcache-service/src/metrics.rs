//! Cache hit/miss metrics.

use metrics::{counter, describe_counter};

/// Metric names for the read-through cache.
pub mod names {
    /// Lookups answered from storage.
    pub const CACHE_HITS_TOTAL: &str = "kickcache_cache_hits_total";
    /// Lookups that had to call the upstream fetcher.
    pub const CACHE_MISSES_TOTAL: &str = "kickcache_cache_misses_total";
    /// Upstream fetches that returned an error.
    pub const CACHE_FETCH_ERRORS_TOTAL: &str = "kickcache_cache_fetch_errors_total";
    /// Fetched values that could not be written back.
    pub const CACHE_STORE_FAILURES_TOTAL: &str = "kickcache_cache_store_failures_total";
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(
        names::CACHE_HITS_TOTAL,
        "Total number of lookups answered from the cache"
    );
    describe_counter!(
        names::CACHE_MISSES_TOTAL,
        "Total number of lookups that called the upstream"
    );
    describe_counter!(
        names::CACHE_FETCH_ERRORS_TOTAL,
        "Total number of failed upstream fetches"
    );
    describe_counter!(
        names::CACHE_STORE_FAILURES_TOTAL,
        "Total number of fetched values that failed to store"
    );
}

/// Cache metrics recorder.
#[derive(Clone, Copy, Debug)]
pub struct CacheMetrics;

impl CacheMetrics {
    /// Record a cache hit.
    pub fn hit(namespace: &str) {
        counter!(names::CACHE_HITS_TOTAL, "namespace" => namespace.to_string()).increment(1);
    }

    /// Record a cache miss.
    pub fn miss(namespace: &str) {
        counter!(names::CACHE_MISSES_TOTAL, "namespace" => namespace.to_string()).increment(1);
    }

    /// Record a failed upstream fetch.
    pub fn fetch_error(namespace: &str) {
        counter!(names::CACHE_FETCH_ERRORS_TOTAL, "namespace" => namespace.to_string())
            .increment(1);
    }

    /// Record a failed write-back.
    pub fn store_failure(namespace: &str) {
        counter!(names::CACHE_STORE_FAILURES_TOTAL, "namespace" => namespace.to_string())
            .increment(1);
    }
}
