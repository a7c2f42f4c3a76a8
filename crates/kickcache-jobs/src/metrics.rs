//! Metrics for the expiration sweeper.

use metrics::{counter, describe_counter, describe_gauge, gauge};

/// Metric names for the expiration sweeper.
pub mod names {
    /// Total expired entries deleted.
    pub const EXPIRED_DELETED_TOTAL: &str = "kickcache_expired_deleted_total";
    /// Total sweeps that failed.
    pub const SWEEP_FAILURES_TOTAL: &str = "kickcache_sweep_failures_total";
    /// Whether the sweeper worker is running.
    pub const EXPIRATION_RUNNING: &str = "kickcache_expiration_running";
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(
        names::EXPIRED_DELETED_TOTAL,
        "Total number of expired cache entries deleted"
    );
    describe_counter!(
        names::SWEEP_FAILURES_TOTAL,
        "Total number of failed expiration sweeps"
    );
    describe_gauge!(
        names::EXPIRATION_RUNNING,
        "Whether the expiration worker is running (1) or not (0)"
    );
}

/// Expiration metrics recorder.
#[derive(Clone, Copy, Debug)]
pub struct ExpirationMetrics;

impl ExpirationMetrics {
    /// Record deleted entries.
    pub fn deleted(count: u64) {
        counter!(names::EXPIRED_DELETED_TOTAL).increment(count);
    }

    /// Record a failed sweep.
    pub fn sweep_failed() {
        counter!(names::SWEEP_FAILURES_TOTAL).increment(1);
    }

    /// Record the worker state.
    pub fn set_running(running: bool) {
        gauge!(names::EXPIRATION_RUNNING).set(if running { 1.0 } else { 0.0 });
    }
}
