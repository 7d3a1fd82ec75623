//! Background drain for leaky bucket queues.

use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::limits::DynamicConfig;
use super::strategies::ACTIVE_QUEUES_KEY;
use crate::error::{RatekeeperError, Result};
use crate::store::{Store, StoreResult};

/// Outcome of one drain pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeakCycle {
    /// Queues visited
    pub queues: usize,
    /// Entries removed
    pub drained: usize,
    /// Pause before the next pass
    pub interval: Duration,
}

/// Removes the oldest entry of every registered leaky bucket queue once per
/// `window / limit`, re-reading the effective configuration before each pass.
///
/// Drains run for all queues at once, so a pass costs one round trip no
/// matter how many clients are active. The leak rate is a global constant:
/// queues are never evicted from the active set, even when empty.
#[derive(Debug, Clone)]
pub struct LeakWorker {
    store: Arc<dyn Store>,
    limits: DynamicConfig,
    error_backoff: Duration,
}

impl LeakWorker {
    pub fn new(store: Arc<dyn Store>, limits: DynamicConfig, error_backoff: Duration) -> Self {
        Self {
            store,
            limits,
            error_backoff,
        }
    }

    /// Run a single drain pass.
    pub async fn run_cycle(&self) -> Result<LeakCycle> {
        let interval = self.limits.resolve().await.leak_interval()?;
        let queues = self.store.smembers(ACTIVE_QUEUES_KEY).await?;

        let popped = join_all(queues.iter().map(|key| self.store.rpop(key)))
            .await
            .into_iter()
            .collect::<StoreResult<Vec<_>>>()?;
        let drained = popped.iter().filter(|entry| entry.is_some()).count();

        debug!(
            queues = queues.len(),
            drained = drained,
            interval = ?interval,
            "Leak cycle complete"
        );

        Ok(LeakCycle {
            queues: queues.len(),
            drained,
            interval,
        })
    }

    /// Drain queues until `signal` resolves.
    ///
    /// A failed pass is logged and retried after the error backoff; the
    /// worker only stops on the signal.
    pub async fn run_with_shutdown<F>(self, signal: F)
    where
        F: Future<Output = ()> + Send,
    {
        tokio::pin!(signal);
        info!(error_backoff = ?self.error_backoff, "Leak worker started");

        loop {
            let delay = match self.run_cycle().await {
                Ok(cycle) => cycle.interval,
                Err(e) => {
                    error!(error = %e, "Leak cycle failed");
                    self.error_backoff
                }
            };

            tokio::select! {
                _ = &mut signal => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!("Leak worker stopped");
    }

    /// Run the worker as a tokio task.
    pub fn spawn(self) -> LeakWorkerHandle {
        let (shutdown, mut rx) = watch::channel(false);
        let join = tokio::spawn(self.run_with_shutdown(async move {
            // A dropped sender stops the worker as well.
            let _ = rx.wait_for(|stop| *stop).await;
        }));

        LeakWorkerHandle { shutdown, join }
    }
}

/// Handle to a spawned [`LeakWorker`]. Dropping it stops the worker.
#[derive(Debug)]
pub struct LeakWorkerHandle {
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl LeakWorkerHandle {
    /// Signal the worker and wait for it to exit.
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.shutdown.send(true);
        self.join
            .await
            .map_err(|e| RatekeeperError::Worker(e.to_string()))
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}
