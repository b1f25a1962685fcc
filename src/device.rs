//! Device registration
//!
//! Every system in the first snapshot becomes one device in the host's
//! device registry, keyed by `(DOMAIN, uuid)`.

use crate::services::snapshot::{DashboardSnapshot, SnapshotStore};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Integration domain, first half of every device identifier
pub const DOMAIN: &str = "comfoclime";

/// Device manufacturer
pub const MANUFACTURER: &str = "Zehnder";

/// Device model
pub const MODEL: &str = "Comfoclime";

/// Registry metadata of one system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// `(DOMAIN, uuid)`
    pub identifiers: (String, String),
    pub manufacturer: String,
    pub model: String,
    /// `displayName`, falling back to `name`
    pub name: Option<String>,
    pub sw_version: Option<String>,
    pub serial_number: String,
}

impl DeviceInfo {
    /// Build device metadata from a merged snapshot
    pub fn from_snapshot(uuid: &str, snapshot: &DashboardSnapshot) -> Self {
        let text = |key: &str| {
            snapshot
                .get(key)
                .and_then(|value| value.as_str())
                .map(str::to_string)
        };

        Self {
            identifiers: (DOMAIN.to_string(), uuid.to_string()),
            manufacturer: MANUFACTURER.to_string(),
            model: MODEL.to_string(),
            name: text("displayName").or_else(|| text("name")),
            sw_version: text("version"),
            serial_number: uuid.to_string(),
        }
    }
}

/// Host-side device registry
#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    /// Create the device or update the existing entry with the same identifiers
    async fn get_or_create(&self, config_entry_id: &str, device: DeviceInfo) -> DeviceInfo;

    /// Drop every device that belongs to a config entry
    async fn remove_entry(&self, config_entry_id: &str);
}

/// Device registry kept in memory
#[derive(Debug, Default)]
pub struct InMemoryDeviceRegistry {
    devices: RwLock<HashMap<(String, String), (String, DeviceInfo)>>,
}

impl InMemoryDeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a device by identifiers
    pub async fn get(&self, domain: &str, uuid: &str) -> Option<DeviceInfo> {
        self.devices
            .read()
            .await
            .get(&(domain.to_string(), uuid.to_string()))
            .map(|(_, device)| device.clone())
    }

    /// Devices registered for a config entry, sorted by serial number
    pub async fn devices_for_entry(&self, config_entry_id: &str) -> Vec<DeviceInfo> {
        let mut devices: Vec<DeviceInfo> = self
            .devices
            .read()
            .await
            .values()
            .filter(|(entry_id, _)| entry_id == config_entry_id)
            .map(|(_, device)| device.clone())
            .collect();
        devices.sort_by(|a, b| a.serial_number.cmp(&b.serial_number));
        devices
    }

    pub async fn len(&self) -> usize {
        self.devices.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.devices.read().await.is_empty()
    }
}

#[async_trait]
impl DeviceRegistry for InMemoryDeviceRegistry {
    async fn get_or_create(&self, config_entry_id: &str, device: DeviceInfo) -> DeviceInfo {
        let mut devices = self.devices.write().await;
        devices.insert(
            device.identifiers.clone(),
            (config_entry_id.to_string(), device.clone()),
        );
        device
    }

    async fn remove_entry(&self, config_entry_id: &str) {
        self.devices
            .write()
            .await
            .retain(|_, (entry_id, _)| entry_id != config_entry_id);
    }
}

/// Register one device per system in `store`, in uuid order
pub async fn register_devices(
    registry: &dyn DeviceRegistry,
    config_entry_id: &str,
    store: &SnapshotStore,
) -> Vec<DeviceInfo> {
    let mut devices = Vec::with_capacity(store.len());
    for uuid in store.uuids() {
        let Some(snapshot) = store.get(uuid) else {
            continue;
        };
        let device = registry
            .get_or_create(config_entry_id, DeviceInfo::from_snapshot(uuid, snapshot))
            .await;
        debug!("Registered device {uuid} ({:?})", device.name);
        devices.push(device);
    }
    devices
}
