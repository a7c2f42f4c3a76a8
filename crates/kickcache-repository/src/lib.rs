//! # Kickcache Repository
//!
//! Storage drivers behind the read-through cache:
//!
//! ```text
//! Cache façade
//!   ↓  Arc<dyn CacheDriver>   (driver interface)
//! SqliteCacheDriver | NoopCacheDriver
//!   ↓
//! SQLite (DatabasePool)
//! ```

pub mod noop;
pub mod pool;
pub mod sqlite;
pub mod traits;

pub use noop::NoopCacheDriver;
pub use pool::DatabasePool;
pub use sqlite::SqliteCacheDriver;
pub use traits::CacheDriver;
