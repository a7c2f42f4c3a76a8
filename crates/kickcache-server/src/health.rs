//! Health and stats endpoints.

use crate::app::Core;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Bound on the storage ping behind `/health`.
pub const PING_TIMEOUT: Duration = Duration::from_secs(2);

/// Shared handler state.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Running cache subsystem.
    pub core: Arc<Core>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy` or `unhealthy`.
    pub status: String,
    /// Application version.
    pub version: String,
    /// Storage driver in use.
    pub driver: String,
    /// Ping failure, present only when unhealthy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-namespace stats.
#[derive(Debug, Serialize)]
pub struct NamespaceStats {
    /// Namespace name.
    pub name: String,
    /// Storage key prefix.
    pub prefix: String,
    /// Extra TTL in seconds.
    pub extra_ttl_secs: i64,
}

/// Cache stats response.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// Storage driver in use.
    pub driver: String,
    /// Number of stored entries.
    pub entries: u64,
    /// Whether the sweeper worker is running.
    pub expiration_running: bool,
    /// Registered namespaces in registration order.
    pub namespaces: Vec<NamespaceStats>,
}

/// Error body for failed stats queries.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

/// Creates the health router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/stats", get(stats))
        .with_state(state)
}

/// Pings the cache storage; 503 when unreachable.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let cache = state.core.cache();
    let (code, status, error) = match cache.ping(PING_TIMEOUT).await {
        Ok(()) => (StatusCode::OK, "healthy", None),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", Some(e.to_string()))
        }
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            driver: cache.driver_name().to_string(),
            error,
        }),
    )
}

/// Reports the entry count, sweeper state and namespace TTLs.
pub async fn stats(
    State(state): State<AppState>,
) -> Result<Json<StatsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let core = &state.core;
    let entries = core.cache().len().await.map_err(|e| {
        warn!(error = %e, "Failed to count cache entries");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                code: e.error_code().to_string(),
                message: e.to_string(),
            }),
        )
    })?;

    let namespaces = core
        .registry()
        .iter()
        .map(|ns| NamespaceStats {
            name: ns.name().to_string(),
            prefix: ns.prefix().to_string(),
            extra_ttl_secs: ns.extra_ttl_secs(),
        })
        .collect();

    Ok(Json(StatsResponse {
        driver: core.cache().driver_name().to_string(),
        entries,
        expiration_running: core.expiration_running(),
        namespaces,
    }))
}
