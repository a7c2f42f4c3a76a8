//! Server startup utilities.

use kickcache_config::AppConfig;
use tracing::info;

/// Prints the startup banner.
pub fn print_banner() {
    info!(r#"
    __ __ _      __
   / //_/(_)____/ /__________ ______/ /_  ___
  / ,<  / / ___/ //_/ ___/ __ `/ ___/ __ \/ _ \
 / /| |/ / /__/ ,< / /__/ /_/ / /__/ / / /  __/
/_/ |_/_/\___/_/|_|\___/\__,_/\___/_/ /_/\___/
    "#);
}

/// Prints server startup information.
pub fn print_startup_info(config: &AppConfig) {
    let separator = "=".repeat(60);
    let addr = config.server.addr();
    info!("{}", separator);
    info!("Environment: {}", config.app.environment);
    info!("Health:      http://{}/health", addr);
    info!("Stats:       http://{}/stats", addr);
    if config.cache.enabled {
        info!("Cache:       sqlite ({})", config.cache.sqlite_dsn);
    } else {
        info!("Cache:       disabled");
    }
    match config.expiration.interval() {
        Some(interval) if config.cache.enabled => info!("Sweeper:     every {:?}", interval),
        _ => info!("Sweeper:     disabled"),
    }
    info!("{}", separator);
}
