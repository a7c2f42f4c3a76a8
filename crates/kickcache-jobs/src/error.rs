//! Expiration machine error types.

use kickcache_core::CacheError;
use thiserror::Error;

/// Result type for expiration machine operations.
pub type ExpirationResult<T> = Result<T, ExpirationError>;

/// Expiration machine errors.
#[derive(Debug, Error)]
pub enum ExpirationError {
    /// `start` was called while the worker is running.
    #[error("Expiration machine already running")]
    AlreadyRunning,

    /// `stop` was called while no worker exists.
    #[error("Expiration machine isn't started")]
    NotRunning,

    /// The sweep interval must be positive.
    #[error("Invalid sweep interval: {0:?}")]
    InvalidInterval(std::time::Duration),

    /// A sweep failed.
    #[error("Sweep failed: {0}")]
    Cache(#[from] CacheError),
}

impl ExpirationError {
    /// Returns true for start/stop misuse.
    #[must_use]
    pub const fn is_state_error(&self) -> bool {
        matches!(self, Self::AlreadyRunning | Self::NotRunning)
    }
}
