//! Merged per-system snapshots and the store that holds one refresh cycle

use crate::client::{Dashboard, System};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Merged view of one system: list-entry fields, then dashboard fields
pub type DashboardSnapshot = Map<String, Value>;

/// Combine a systems list entry with its dashboard
///
/// Dashboard fields overwrite list-entry fields of the same name. Unknown
/// fields are kept as they are.
pub fn merge(system: &System, dashboard: &Dashboard) -> DashboardSnapshot {
    let mut snapshot = system.fields().clone();
    for (key, value) in dashboard {
        snapshot.insert(key.clone(), value.clone());
    }
    snapshot
}

/// Snapshots of every system from one completed refresh cycle
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotStore {
    systems: HashMap<String, DashboardSnapshot>,
    updated_at: Option<DateTime<Utc>>,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::empty()
    }
}

impl SnapshotStore {
    /// Store published before the first successful cycle
    pub fn empty() -> Self {
        Self {
            systems: HashMap::new(),
            updated_at: None,
        }
    }

    /// Store for a cycle that completed now
    pub fn new(systems: HashMap<String, DashboardSnapshot>) -> Self {
        Self {
            systems,
            updated_at: Some(Utc::now()),
        }
    }

    /// Snapshot of one system
    pub fn get(&self, uuid: &str) -> Option<&DashboardSnapshot> {
        self.systems.get(uuid)
    }

    /// Whether a system is present
    pub fn contains(&self, uuid: &str) -> bool {
        self.systems.contains_key(uuid)
    }

    /// Identifiers of all systems, sorted
    pub fn uuids(&self) -> Vec<&str> {
        let mut uuids: Vec<&str> = self.systems.keys().map(String::as_str).collect();
        uuids.sort_unstable();
        uuids
    }

    /// Iterate over all snapshots
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DashboardSnapshot)> {
        self.systems.iter().map(|(uuid, snapshot)| (uuid.as_str(), snapshot))
    }

    /// Number of systems
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Whether the store holds no systems
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Completion time of the cycle that produced this store
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl PartialEq for SnapshotStore {
    // Publication time is ignored
    fn eq(&self, other: &Self) -> bool {
        self.systems == other.systems
    }
}
