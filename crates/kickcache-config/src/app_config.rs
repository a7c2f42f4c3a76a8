//! Application configuration structures.

use kickcache_core::telemetry::TelemetryConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fallback used when the configured connect timeout is zero.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 60;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Application name and metadata.
    #[serde(default)]
    pub app: AppMetadata,

    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Cache storage configuration.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Expiration sweeper configuration.
    #[serde(default)]
    pub expiration: ExpirationConfig,

    /// Logging configuration.
    #[serde(default)]
    pub observability: TelemetryConfig,
}

/// Application metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppMetadata {
    /// Application name.
    pub name: String,
    /// Application version.
    pub version: String,
    /// Environment (development, staging, production).
    pub environment: String,
}

impl Default for AppMetadata {
    fn default() -> Self {
        Self {
            name: "kickcache".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen host.
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// Time allowed for a graceful shutdown in seconds.
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9090,
            shutdown_timeout_secs: 5,
        }
    }
}

impl ServerConfig {
    /// Returns the listen address.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the shutdown timeout as a Duration.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

/// Cache storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Persist values; when false every lookup goes to the upstream.
    pub enabled: bool,
    /// SQLite path or `sqlite:` URL.
    pub sqlite_dsn: String,
    /// Connect timeout in seconds (0 falls back to the default).
    pub connect_timeout_secs: u64,
    /// Maximum pooled connections.
    pub max_connections: u32,
    /// Compact the database file after schema creation.
    pub vacuum_on_init: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sqlite_dsn: "db.sqlite3".to_string(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            max_connections: 5,
            vacuum_on_init: true,
        }
    }
}

impl CacheConfig {
    /// Returns the connect timeout as a Duration.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        if self.connect_timeout_secs == 0 {
            Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS)
        } else {
            Duration::from_secs(self.connect_timeout_secs)
        }
    }
}

/// Expiration sweeper configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpirationConfig {
    /// Sweep interval in seconds; zero or negative disables the sweeper.
    pub interval_secs: i64,
    /// Path of the per-namespace extra TTL file; empty keeps every extra TTL at zero.
    pub extra_ttl_file: String,
}

impl Default for ExpirationConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            extra_ttl_file: "extra_ttl.json".to_string(),
        }
    }
}

impl ExpirationConfig {
    /// Returns the sweep interval, or `None` when the sweeper is disabled.
    #[must_use]
    pub fn interval(&self) -> Option<Duration> {
        u64::try_from(self.interval_secs)
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Returns the extra TTL file path, or `None` when unset.
    #[must_use]
    pub fn extra_ttl_path(&self) -> Option<&str> {
        let path = self.extra_ttl_file.trim();
        (!path.is_empty()).then_some(path)
    }
}
