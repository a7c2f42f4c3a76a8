//! Background purge of expired cache entries.

use crate::error::{ExpirationError, ExpirationResult};
use crate::metrics::ExpirationMetrics;
use kickcache_core::CacheError;
use kickcache_service::Cache;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

/// Threshold used by every scheduled sweep: anything already past its
/// recorded date is deleted.
const SWEEP_THRESHOLD: i64 = 0;

struct Worker {
    shutdown_tx: broadcast::Sender<()>,
    handle: JoinHandle<()>,
}

/// Periodically deletes expired entries from a [`Cache`].
///
/// The machine is `Idle` until [`start`](Self::start) succeeds and returns
/// to `Idle` after [`stop`](Self::stop). If the cache is closed underneath a
/// running worker, the worker exits on its own; `stop` still succeeds once
/// afterwards and reaps it.
pub struct ExpirationMachine {
    cache: Arc<Cache>,
    running: Arc<AtomicBool>,
    worker: Mutex<Option<Worker>>,
}

impl ExpirationMachine {
    /// Creates an idle machine sweeping `cache`.
    #[must_use]
    pub fn new(cache: Arc<Cache>) -> Self {
        Self {
            cache,
            running: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
        }
    }

    /// Runs one sweep now, then sweeps every `period` in the background.
    ///
    /// Fails without starting the worker if the first sweep fails.
    pub async fn start(&self, period: Duration) -> ExpirationResult<()> {
        if period.is_zero() {
            return Err(ExpirationError::InvalidInterval(period));
        }
        if self.is_started() {
            return Err(ExpirationError::AlreadyRunning);
        }

        if let Err(e) = sweep_expired(&self.cache, SWEEP_THRESHOLD).await {
            error!(error = %e, "ExpirationMachine: initial sweep failed");
            return Err(e.into());
        }

        let mut worker = self.worker.lock();
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(ExpirationError::AlreadyRunning);
        }

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let handle = tokio::spawn(run_worker(
            Arc::clone(&self.cache),
            Arc::clone(&self.running),
            period,
            shutdown_rx,
        ));
        // A previous worker that exited on a closed cache is replaced here.
        *worker = Some(Worker {
            shutdown_tx,
            handle,
        });

        ExpirationMetrics::set_running(true);
        info!(interval = ?period, "Expiration machine started");
        Ok(())
    }

    /// Signals the worker to exit and waits for it.
    pub async fn stop(&self) -> ExpirationResult<()> {
        let worker = self.worker.lock().take();
        let Some(worker) = worker else {
            return Err(ExpirationError::NotRunning);
        };

        debug!("ExpirationMachine: stopping ...");
        // Send fails only if the worker already exited.
        let _ = worker.shutdown_tx.send(());
        if let Err(e) = worker.handle.await {
            error!(error = %e, "Expiration worker did not exit cleanly");
        }

        self.running.store(false, Ordering::SeqCst);
        ExpirationMetrics::set_running(false);
        info!("Expiration machine stopped");
        Ok(())
    }

    /// Returns true while the background worker is sweeping.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Deletes every entry at least `threshold` seconds past its recorded date.
    ///
    /// Returns the number of deleted entries.
    pub async fn sweep(&self, threshold: i64) -> ExpirationResult<u64> {
        Ok(sweep_expired(&self.cache, threshold).await?)
    }
}

impl std::fmt::Debug for ExpirationMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpirationMachine")
            .field("cache", &self.cache)
            .field("running", &self.is_started())
            .finish_non_exhaustive()
    }
}

async fn sweep_expired(cache: &Cache, threshold: i64) -> Result<u64, CacheError> {
    if cache.is_closed() {
        return Err(CacheError::Closed);
    }

    let keys = cache.select_expired(threshold).await?;
    if keys.is_empty() {
        debug!("Number of expired values: 0");
        return Ok(0);
    }

    let deleted = cache.delete_many(&keys).await?;
    ExpirationMetrics::deleted(deleted);
    debug!(deleted, "Number of expired values: {}", deleted);
    Ok(deleted)
}

async fn run_worker(
    cache: Arc<Cache>,
    running: Arc<AtomicBool>,
    period: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    debug!("ExpirationMachine: running ...");

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately and `start` has just swept.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                debug!("Expiration worker received shutdown signal");
                break;
            }

            _ = ticker.tick() => {
                match sweep_expired(&cache, SWEEP_THRESHOLD).await {
                    Ok(_) => {}
                    Err(e) if e.is_closed() => {
                        error!(error = %e, "ExpirationMachine: cache closed, worker exiting");
                        running.store(false, Ordering::SeqCst);
                        ExpirationMetrics::set_running(false);
                        break;
                    }
                    Err(e) => {
                        error!(error = %e, "ExpirationMachine: while deleting");
                        ExpirationMetrics::sweep_failed();
                    }
                }
            }
        }
    }
}
