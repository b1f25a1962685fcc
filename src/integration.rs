//! Lifecycle of one configured appliance
//!
//! Setting up an entry performs the first refresh, registers devices, builds
//! sensors and starts the refresh timer. Unloading stops the timer; removing
//! also forgets the entry and its devices.

use crate::client::{ComfoclimeApi, ComfoclimeHttpClient};
use crate::device::{register_devices, DeviceInfo, DeviceRegistry};
use crate::error::Result;
use crate::services::coordinator::RefreshCoordinator;
use crate::services::scheduler::{IntervalScheduler, RefreshOutcome};
use crate::services::sensors::{build_sensors, ComfoclimeSensor};
use crate::setup::{ConfigEntry, EntryRegistry};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// A running entry
pub struct ComfoclimeIntegration {
    entry: ConfigEntry,
    coordinator: Arc<RefreshCoordinator>,
    devices: Vec<DeviceInfo>,
    sensors: Vec<ComfoclimeSensor>,
    scheduler: IntervalScheduler,
    task: JoinHandle<()>,
}

impl ComfoclimeIntegration {
    /// Set up an entry against its appliance over HTTP
    pub async fn setup_entry(
        entry: ConfigEntry,
        registry: &dyn DeviceRegistry,
        update_interval: Duration,
    ) -> Result<Self> {
        let client = ComfoclimeHttpClient::new(&entry.data)?;
        Self::setup_with_api(entry, Arc::new(client), registry, update_interval).await
    }

    /// Set up an entry with a caller-supplied API
    ///
    /// Fails with [`crate::ComfoclimeError::NotReady`] when the first refresh
    /// fails; nothing is registered in that case.
    pub async fn setup_with_api(
        entry: ConfigEntry,
        api: Arc<dyn ComfoclimeApi>,
        registry: &dyn DeviceRegistry,
        update_interval: Duration,
    ) -> Result<Self> {
        let coordinator = Arc::new(RefreshCoordinator::new(api, update_interval));
        let store = coordinator.first_refresh().await?;

        let devices = register_devices(registry, &entry.entry_id, &store).await;
        let sensors = build_sensors(&coordinator);
        info!(
            "Set up {} with {} devices and {} sensors",
            entry.title,
            devices.len(),
            sensors.len()
        );

        let scheduler = IntervalScheduler::new(coordinator.update_interval());
        let title = entry.title.clone();
        let task = scheduler.spawn(coordinator.clone(), move |outcome| match outcome {
            RefreshOutcome::Success => debug!("{title} refreshed"),
            RefreshOutcome::Failure(e) => debug!("{title} refresh failed: {e}"),
        });

        Ok(Self {
            entry,
            coordinator,
            devices,
            sensors,
            scheduler,
            task,
        })
    }

    pub fn entry(&self) -> &ConfigEntry {
        &self.entry
    }

    pub fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.coordinator
    }

    /// Devices registered during setup
    pub fn devices(&self) -> &[DeviceInfo] {
        &self.devices
    }

    /// Sensors built from the first snapshot
    pub fn sensors(&self) -> &[ComfoclimeSensor] {
        &self.sensors
    }

    /// Stop the refresh timer and wait for it to finish
    pub async fn unload(self) -> Result<()> {
        self.scheduler.cancel();
        self.task
            .await
            .map_err(|e| anyhow::anyhow!("Refresh task of {} failed: {e}", self.entry.title))?;
        info!("Unloaded {}", self.entry.title);
        Ok(())
    }

    /// Unload, then drop the entry's devices and the entry itself
    ///
    /// Returns the removed entry, `None` when `entries` did not hold it.
    pub async fn remove(
        self,
        entries: &EntryRegistry,
        registry: &dyn DeviceRegistry,
    ) -> Result<Option<ConfigEntry>> {
        let entry_id = self.entry.entry_id.clone();
        self.unload().await?;

        registry.remove_entry(&entry_id).await;
        let removed = entries.remove(&entry_id).await;
        debug!("Removed entry {entry_id}");
        Ok(removed)
    }
}

impl std::fmt::Debug for ComfoclimeIntegration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComfoclimeIntegration")
            .field("entry", &self.entry.unique_id)
            .field("devices", &self.devices.len())
            .field("sensors", &self.sensors.len())
            .finish()
    }
}
