//! # Kickcache Core
//!
//! Core types shared by every layer of the read-through cache:
//! the unified error enum, the result alias, the clock abstraction
//! and logging initialization.

pub mod clock;
pub mod error;
pub mod result;
pub mod telemetry;

pub use clock::*;
pub use error::*;
pub use result::*;
