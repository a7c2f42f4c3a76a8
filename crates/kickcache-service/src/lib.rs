//! # Kickcache Service
//!
//! The cache façade, its read-through helpers and the namespace registry.

pub mod cache;
pub mod metrics;

pub use cache::*;
pub use self::metrics::{register_metrics, CacheMetrics};
