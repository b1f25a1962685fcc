//! Refresh coordinator
//!
//! Owns the published [`SnapshotStore`]. A refresh cycle fetches the systems
//! list, then each system's dashboard in turn, merges them and publishes the
//! new store in one step. A failed cycle publishes nothing and leaves the
//! previous store in place.

use crate::client::ComfoclimeApi;
use crate::error::{ComfoclimeError, Result};
use crate::services::snapshot::{merge, SnapshotStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, Mutex};
use tracing::{debug, error, info};

/// Coordinator lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RefreshState {
    /// Waiting for the next cycle
    Idle,
    /// A cycle is running
    Refreshing,
    /// The last cycle failed; the previous store is still published
    Error,
}

/// Notification sent after every cycle
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshEvent {
    /// A new store was published
    Updated {
        systems: usize,
        updated_at: DateTime<Utc>,
    },
    /// The cycle failed and nothing was published
    Failed { error: String },
}

/// Periodic fetch-merge-publish of appliance state
pub struct RefreshCoordinator {
    api: Arc<dyn ComfoclimeApi>,
    update_interval: Duration,
    store: watch::Sender<Arc<SnapshotStore>>,
    state: watch::Sender<RefreshState>,
    events: broadcast::Sender<RefreshEvent>,
    last_update_success: AtomicBool,
    /// Serializes cycles
    cycle: Mutex<()>,
}

impl RefreshCoordinator {
    /// Create a coordinator with an empty store
    pub fn new(api: Arc<dyn ComfoclimeApi>, update_interval: Duration) -> Self {
        let (store, _) = watch::channel(Arc::new(SnapshotStore::empty()));
        let (state, _) = watch::channel(RefreshState::Idle);
        let (events, _) = broadcast::channel(16);

        Self {
            api,
            update_interval,
            store,
            state,
            events,
            last_update_success: AtomicBool::new(false),
            cycle: Mutex::new(()),
        }
    }

    /// Time between scheduled cycles
    pub fn update_interval(&self) -> Duration {
        self.update_interval
    }

    /// Currently published store
    pub fn store(&self) -> Arc<SnapshotStore> {
        self.store.borrow().clone()
    }

    /// Receiver that observes every published store
    pub fn subscribe_store(&self) -> watch::Receiver<Arc<SnapshotStore>> {
        self.store.subscribe()
    }

    /// Receiver for per-cycle notifications
    pub fn subscribe(&self) -> broadcast::Receiver<RefreshEvent> {
        self.events.subscribe()
    }

    /// Current lifecycle state
    pub fn state(&self) -> RefreshState {
        *self.state.borrow()
    }

    /// Whether the most recent cycle succeeded
    pub fn last_update_success(&self) -> bool {
        self.last_update_success.load(Ordering::Acquire)
    }

    /// Run one refresh cycle
    ///
    /// Concurrent callers are serialized; each of them runs its own cycle.
    pub async fn refresh(&self) -> Result<Arc<SnapshotStore>> {
        let _guard = self.cycle.lock().await;
        self.state.send_replace(RefreshState::Refreshing);

        match self.fetch_store().await {
            Ok(store) => {
                let store = Arc::new(store);
                let systems = store.len();
                let updated_at = store.updated_at().unwrap_or_else(Utc::now);

                self.store.send_replace(store.clone());
                self.last_update_success.store(true, Ordering::Release);
                self.state.send_replace(RefreshState::Idle);
                // No subscribers is fine
                let _ = self.events.send(RefreshEvent::Updated {
                    systems,
                    updated_at,
                });

                debug!("Published snapshot of {systems} systems");
                Ok(store)
            }
            Err(e) => {
                error!("Error communicating with Comfoclime: {e}");
                self.last_update_success.store(false, Ordering::Release);
                self.state.send_replace(RefreshState::Error);
                let _ = self.events.send(RefreshEvent::Failed {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Initial cycle run while an entry is being set up
    ///
    /// Any failure is reported as [`ComfoclimeError::NotReady`] so the host
    /// can retry the setup later.
    pub async fn first_refresh(&self) -> Result<Arc<SnapshotStore>> {
        self.refresh()
            .await
            .map_err(|e| ComfoclimeError::not_ready(e.to_string()))
    }

    async fn fetch_store(&self) -> Result<SnapshotStore> {
        let systems = self.api.fetch_systems().await?;

        let mut snapshots = HashMap::with_capacity(systems.len());
        for system in &systems {
            let Some(uuid) = system.uuid() else {
                continue;
            };

            let dashboard = self.api.fetch_dashboard(uuid).await?;
            snapshots.insert(uuid.to_string(), merge(system, &dashboard));
        }

        info!(
            "Refresh complete: {} of {} systems",
            snapshots.len(),
            systems.len()
        );
        Ok(SnapshotStore::new(snapshots))
    }
}
