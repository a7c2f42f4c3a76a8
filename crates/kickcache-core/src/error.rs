//! Unified error types for the cache subsystem.

use thiserror::Error;

/// Unified error type shared by drivers, the cache façade and the loaders.
///
/// Duplicate keys are deliberately absent: an insert that finds an existing
/// row reports `false` instead of failing.
#[derive(Error, Debug)]
pub enum CacheError {
    // ============ Storage Errors ============
    /// The backing store could not be reached or initialized.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A query against the backing store failed.
    #[error("Database error: {0}")]
    Database(String),

    /// The cache was used after `close()`.
    #[error("Cache is closed")]
    Closed,

    // ============ Configuration Errors ============
    /// Configuration could not be read or parsed.
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ============ Value Errors ============
    /// A value could not be serialized before storing.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Operation did not finish within its deadline.
    #[error("Operation timed out: {0}")]
    Timeout(String),

    // ============ Internal Errors ============
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Closed => "CACHE_CLOSED",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration<T: Into<String>>(message: T) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates a storage-unavailable error.
    #[must_use]
    pub fn unavailable<T: Into<String>>(message: T) -> Self {
        Self::StorageUnavailable(message.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true for errors caused by using a closed cache.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Checks if this error is transient and worth retrying on the next tick.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::StorageUnavailable(_) | Self::Database(_) | Self::Timeout(_)
        )
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for CacheError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::StorageUnavailable(err.to_string())
            }
            _ => Self::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
