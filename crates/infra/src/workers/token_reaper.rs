//! Periodic deletion of continuation tokens past the retention horizon.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::token_store::{ContinuationTokenStore, TokenStoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaperConfig {
    /// Wait between cycles.
    pub interval: Duration,
    /// How long past expiry a token is kept before deletion.
    pub retention: chrono::Duration,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(24 * 60 * 60),
            retention: chrono::Duration::days(30),
        }
    }
}

/// Deletes expired continuation tokens on a fixed period.
///
/// Revoked and unrevoked tokens are treated alike; only expiry counts.
#[derive(Clone)]
pub struct TokenReaper {
    store: Arc<dyn ContinuationTokenStore>,
    config: ReaperConfig,
}

impl TokenReaper {
    pub fn new(store: Arc<dyn ContinuationTokenStore>, config: ReaperConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> ReaperConfig {
        self.config
    }

    /// Run a single cycle against `now`, returning how many tokens were removed.
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> Result<u64, TokenStoreError> {
        let cutoff = now - self.config.retention;
        let removed = self.store.delete_expired_before(cutoff).await?;
        info!(removed, cutoff = %cutoff, "expired continuation tokens reaped");
        Ok(removed)
    }

    /// Spawn the periodic loop on the current tokio runtime.
    ///
    /// The first cycle runs immediately. A failed cycle is logged and the
    /// loop waits for the next period.
    pub fn spawn(&self) -> ReaperHandle {
        let shutdown = Arc::new(Notify::new());
        let reaper = self.clone();
        let signal = shutdown.clone();

        let join = tokio::spawn(async move {
            info!(
                interval_secs = reaper.config.interval.as_secs(),
                retention_days = reaper.config.retention.num_days(),
                "token reaper started"
            );
            loop {
                if let Err(err) = reaper.run_cycle(Utc::now()).await {
                    error!(error = %err, "token reaper cycle failed");
                }

                tokio::select! {
                    _ = signal.notified() => break,
                    _ = tokio::time::sleep(reaper.config.interval) => {}
                }
            }
            info!("token reaper stopped");
        });

        ReaperHandle {
            shutdown,
            join: Some(join),
        }
    }
}

/// Handle to stop and join a running reaper.
#[derive(Debug)]
pub struct ReaperHandle {
    shutdown: Arc<Notify>,
    join: Option<JoinHandle<()>>,
}

impl ReaperHandle {
    /// Request shutdown and wait for the loop to exit.
    ///
    /// A cycle already in flight completes first; a pending wait is cut short.
    pub async fn shutdown(mut self) {
        self.shutdown.notify_one();
        if let Some(join) = self.join.take() {
            if let Err(err) = join.await {
                error!(error = %err, "token reaper task ended abnormally");
            }
        }
    }
}

impl Drop for ReaperHandle {
    fn drop(&mut self) {
        if let Some(join) = self.join.take() {
            join.abort();
        }
    }
}
