//! Kickcache Jobs - background expiration of cached entries.
//!
//! # Architecture
//!
//! ```text
//!  ExpirationMachine::start(interval)
//!     │  sweep(0) once, synchronously
//!     ▼
//!  ┌──────────────────────────────────────────┐
//!  │ worker task (tokio::spawn)               │
//!  │   every tick: select_expired(0)          │
//!  │               delete_many(keys)          │
//!  │   closed cache  → exit, running = false  │
//!  │   other errors  → log, wait next tick    │
//!  └──────────────────────────────────────────┘
//!     ▲
//!     │  shutdown signal + join
//!  ExpirationMachine::stop()
//! ```

pub mod error;
pub mod expiration;
pub mod metrics;

pub use error::{ExpirationError, ExpirationResult};
pub use expiration::ExpirationMachine;
pub use self::metrics::{register_metrics, ExpirationMetrics};
