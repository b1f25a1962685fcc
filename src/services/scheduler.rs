//! Timer that drives refresh cycles
//!
//! The scheduler only decides *when* to refresh. Outcomes are logged and the
//! next attempt happens on the next tick; there is no backoff.

use crate::error::Result;
use crate::services::coordinator::RefreshCoordinator;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Something that can be refreshed on a timer
#[async_trait]
pub trait Refresh: Send + Sync {
    /// Run one cycle
    async fn refresh(&self) -> Result<()>;
}

#[async_trait]
impl Refresh for RefreshCoordinator {
    async fn refresh(&self) -> Result<()> {
        RefreshCoordinator::refresh(self).await.map(|_| ())
    }
}

/// Result of one scheduled cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Success,
    Failure(String),
}

/// Fixed-interval scheduler
#[derive(Debug, Clone)]
pub struct IntervalScheduler {
    interval: Duration,
    cancel: CancellationToken,
}

impl IntervalScheduler {
    /// Scheduler ticking every `interval`
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that stops the scheduler when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop the scheduler
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Spawn the timer loop
    ///
    /// The first cycle runs one interval from now; the caller is expected to
    /// have performed the initial refresh itself. `on_outcome` is called
    /// after every cycle. Cancelling while a cycle runs stops the loop once
    /// that cycle has finished.
    pub fn spawn<R, F>(&self, target: Arc<R>, mut on_outcome: F) -> JoinHandle<()>
    where
        R: Refresh + ?Sized + 'static,
        F: FnMut(RefreshOutcome) + Send + 'static,
    {
        let period = self.interval;
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!("Refreshing every {period:?}");
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("Scheduler cancelled");
                        break;
                    }
                    _ = ticker.tick() => {
                        // A started cycle always runs to completion
                        let outcome = match target.refresh().await {
                            Ok(()) => RefreshOutcome::Success,
                            Err(e) => {
                                warn!("Scheduled refresh failed, retrying in {period:?}: {e}");
                                RefreshOutcome::Failure(e.to_string())
                            }
                        };
                        on_outcome(outcome);
                    }
                }
            }
        })
    }
}
