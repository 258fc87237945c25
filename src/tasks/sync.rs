//! Sync Task
//!
//! Background task that turns sync requests into debounced saves.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::cache::{ExpiringStore, Snapshot};
use crate::sync::{SaveOutcome, SyncPolicy, SyncRequest};

/// Handle to a running sync task.
///
/// Dropping the handle stops the task at its next wait, like
/// [`shutdown`](Self::shutdown) without waiting for it.
#[derive(Debug)]
pub struct SyncHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SyncHandle {
    /// Stops the task and waits for it, including any save in progress.
    ///
    /// Run this before a final [`flush`] so no older snapshot can land
    /// after it.
    pub async fn shutdown(self) {
        // Err only means the task already stopped
        let _ = self.shutdown.send(true);
        if let Err(err) = self.task.await {
            if !err.is_cancelled() {
                error!("Sync task ended abnormally: {}", err);
            }
        }
    }

    /// Cancels the task without waiting. A save already handed to the
    /// blocking pool still completes.
    pub fn abort(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawns the task that persists the cache when asked to.
///
/// A `Debounced` request starts a quiet-period timer; every further request
/// inside the window restarts it, so a burst of mutations produces a single
/// save. An `Immediate` request skips (or cuts short) the wait. Before
/// saving, the task yields once so pending work on the runtime runs first.
///
/// The snapshot is taken when the save starts, not when it was requested.
///
/// # Arguments
/// * `cache` - shared store to snapshot
/// * `policy` - how and where to save
/// * `debounce` - quiet period before a debounced save
/// * `requests` - receiving half of the store's [`SyncTrigger`](crate::sync::SyncTrigger)
///
/// # Returns
/// A [`SyncHandle`] to shut down before the final [`flush`].
pub fn spawn_sync_task(
    cache: Arc<RwLock<ExpiringStore>>,
    policy: Arc<SyncPolicy>,
    debounce: Duration,
    mut requests: UnboundedReceiver<SyncRequest>,
) -> SyncHandle {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        info!(
            "Starting sync task with a debounce window of {}ms",
            debounce.as_millis()
        );

        loop {
            let request = tokio::select! {
                _ = shutdown_rx.changed() => break,
                request = requests.recv() => match request {
                    Some(request) => request,
                    None => break,
                },
            };

            if request == SyncRequest::Debounced
                && !settle(&mut requests, &mut shutdown_rx, debounce).await
            {
                break;
            }

            // Let other ready tasks run before doing I/O
            tokio::task::yield_now().await;

            let snapshot = cache.read().await.snapshot();
            save_blocking(Arc::clone(&policy), snapshot).await;
        }

        debug!("Sync task stopped");
    });

    SyncHandle {
        shutdown: shutdown_tx,
        task,
    }
}

/// Waits until no request has arrived for `debounce`, or an immediate
/// request shows up. Returns `false` if shutdown was requested meanwhile.
async fn settle(
    requests: &mut UnboundedReceiver<SyncRequest>,
    shutdown: &mut watch::Receiver<bool>,
    debounce: Duration,
) -> bool {
    loop {
        tokio::select! {
            _ = shutdown.changed() => return false,
            next = tokio::time::timeout(debounce, requests.recv()) => match next {
                Ok(Some(SyncRequest::Debounced)) => continue,
                Ok(Some(SyncRequest::Immediate)) | Ok(None) | Err(_) => return true,
            },
        }
    }
}

/// Runs the save on the blocking pool.
async fn save_blocking(policy: Arc<SyncPolicy>, snapshot: Snapshot) -> SaveOutcome {
    match tokio::task::spawn_blocking(move || policy.save(&snapshot)).await {
        Ok(outcome) => {
            log_outcome(outcome);
            outcome
        }
        Err(err) => {
            error!("Sync save panicked or was cancelled: {}", err);
            SaveOutcome::Failed
        }
    }
}

/// Saves the current cache contents right away.
///
/// Used for the final write at shutdown and for on-demand flushes. Waits
/// for any save already running.
pub async fn flush(cache: &RwLock<ExpiringStore>, policy: &Arc<SyncPolicy>) -> SaveOutcome {
    let snapshot = cache.read().await.snapshot();
    save_blocking(Arc::clone(policy), snapshot).await
}

fn log_outcome(outcome: SaveOutcome) {
    match outcome {
        SaveOutcome::Saved { entries, attempts } => {
            debug!("Sync: saved {} entries in {} attempt(s)", entries, attempts)
        }
        SaveOutcome::Abandoned { attempts } => {
            warn!("Sync: abandoned after {} attempts, data kept in memory only", attempts)
        }
        SaveOutcome::Failed => warn!("Sync: save failed, data kept in memory only"),
        SaveOutcome::Skipped => debug!("Sync: no durable store configured"),
    }
}
