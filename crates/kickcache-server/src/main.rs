//! # Kickcache Server
//!
//! Main entry point: loads configuration, opens the cache, starts the
//! expiration sweeper and serves health endpoints until a shutdown signal.

use kickcache_config::{AppConfig, ConfigLoader};
use kickcache_core::telemetry::{init_tracing, TelemetryConfig};
use kickcache_core::{CacheError, CacheResult};
use kickcache_server::app::Core;
use kickcache_server::health::{self, AppState};
use kickcache_server::startup::{print_banner, print_startup_info};
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let config = match ConfigLoader::from_default_location() {
        Ok(loader) => loader.into_config(),
        Err(e) => {
            let _ = init_tracing(&TelemetryConfig::default());
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_tracing(&config.observability) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    print_banner();
    info!("Starting Kickcache Server...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(config).await {
        error!("Application error: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> CacheResult<()> {
    kickcache_service::register_metrics();
    kickcache_jobs::register_metrics();

    let core = Arc::new(Core::init(&config).await?);
    let served = serve(&config, Arc::clone(&core)).await;

    // Shutdown runs whether or not serving succeeded.
    match tokio::time::timeout(config.server.shutdown_timeout(), core.shutdown()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "Core shutdown failed"),
        Err(_) => warn!(
            timeout = ?config.server.shutdown_timeout(),
            "Core shutdown timed out"
        ),
    }

    served?;
    info!("Server shutdown complete");
    Ok(())
}

async fn serve(config: &AppConfig, core: Arc<Core>) -> CacheResult<()> {
    let router = health::router(AppState { core }).layer(TraceLayer::new_for_http());

    let addr = config.server.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CacheError::Internal(format!("Failed to bind {}: {}", addr, e)))?;

    print_startup_info(config);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| CacheError::Internal(format!("HTTP server error: {}", e)))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        () = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        }
    }
}
