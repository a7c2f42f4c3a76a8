//! Read-through caching in front of the upstream API.
//!
//! Entries are grouped into namespaces, one per upstream endpoint kind. Each
//! namespace owns a one-character storage key prefix and an extra TTL loaded
//! from configuration.

pub mod cache_keys;
mod cache_service;
mod namespace;

pub use cache_keys::{generate_key, storage_key};
pub use cache_service::{Cache, CacheOutcome};
pub use namespace::{default_extra_ttl, write_default_extra_ttl, Namespace, NamespaceRegistry};
