//! SQLite storage implementation.

mod cache_driver;

pub use cache_driver::SqliteCacheDriver;
