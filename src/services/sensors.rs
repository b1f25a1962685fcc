//! Read-only sensors over the published snapshot store
//!
//! A sensor is a (system, catalog field) pair. Sensors are created once from
//! the first snapshot; fields that show up later never get a sensor.

use crate::device::DOMAIN;
use crate::services::coordinator::RefreshCoordinator;
use crate::services::field_catalog::{catalog, FieldDescriptor, SEASON_KEY};
use crate::services::snapshot::SnapshotStore;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Stored value of `key` for system `uuid`, verbatim
///
/// Missing systems, missing keys and JSON `null` all yield `None`.
pub fn project_value<'a>(store: &'a SnapshotStore, uuid: &str, key: &str) -> Option<&'a Value> {
    store
        .get(uuid)
        .and_then(|snapshot| snapshot.get(key))
        .filter(|value| !value.is_null())
}

/// Label of a coded field, `None` when the stored code is not recognized
///
/// Integer-valued floats such as `2.0` count as codes.
pub fn project_coded(
    store: &SnapshotStore,
    uuid: &str,
    field: &FieldDescriptor,
) -> Option<&'static str> {
    project_value(store, uuid, field.key)
        .and_then(as_code)
        .and_then(|code| field.label(code))
}

fn as_code(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|code| code.fract() == 0.0 && code.abs() < i64::MAX as f64)
            .map(|code| code as i64)
    })
}

/// Season label of system `uuid`
pub fn project_season(store: &SnapshotStore, uuid: &str) -> Option<&'static str> {
    catalog()
        .get(SEASON_KEY)
        .and_then(|field| project_coded(store, uuid, field))
}

/// How a sensor turns the stored value into its state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// Value passed through unchanged
    Dashboard,
    /// Integer code translated to a catalog label
    Coded,
}

/// One published read-only value
#[derive(Clone)]
pub struct ComfoclimeSensor {
    coordinator: Arc<RefreshCoordinator>,
    uuid: String,
    unique_id: String,
    field: &'static FieldDescriptor,
    kind: SensorKind,
}

/// Point-in-time view of a sensor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorState {
    pub unique_id: String,
    pub name: &'static str,
    pub value: Option<Value>,
    pub unit: Option<&'static str>,
    pub icon: Option<&'static str>,
    pub available: bool,
}

impl ComfoclimeSensor {
    pub fn new(
        coordinator: Arc<RefreshCoordinator>,
        uuid: impl Into<String>,
        field: &'static FieldDescriptor,
    ) -> Self {
        let uuid = uuid.into();
        let kind = if field.is_coded() {
            SensorKind::Coded
        } else {
            SensorKind::Dashboard
        };

        Self {
            unique_id: format!("{uuid}_{}", field.key),
            coordinator,
            uuid,
            field,
            kind,
        }
    }

    /// `{uuid}_{field key}`
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn key(&self) -> &'static str {
        self.field.key
    }

    pub fn name(&self) -> &'static str {
        self.field.name
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    pub fn field(&self) -> &'static FieldDescriptor {
        self.field
    }

    /// Identifier of the device this sensor belongs to
    pub fn device_identifier(&self) -> (&'static str, &str) {
        (DOMAIN, &self.uuid)
    }

    /// Current value from the latest published store
    pub fn native_value(&self) -> Option<Value> {
        let store = self.coordinator.store();
        match self.kind {
            SensorKind::Dashboard => project_value(&store, &self.uuid, self.field.key).cloned(),
            SensorKind::Coded => project_coded(&store, &self.uuid, self.field).map(Value::from),
        }
    }

    /// Available while the last cycle succeeded and still reported this system
    pub fn available(&self) -> bool {
        self.coordinator.last_update_success() && self.coordinator.store().contains(&self.uuid)
    }

    pub fn state(&self) -> SensorState {
        SensorState {
            unique_id: self.unique_id.clone(),
            name: self.field.name,
            value: self.native_value(),
            unit: self.field.unit.map(|unit| unit.symbol()),
            icon: self.field.icon,
            available: self.available(),
        }
    }
}

impl std::fmt::Debug for ComfoclimeSensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComfoclimeSensor")
            .field("unique_id", &self.unique_id)
            .field("kind", &self.kind)
            .finish()
    }
}

/// One sensor per (system, catalog field) present in the current store
///
/// Systems are visited in uuid order, fields in catalog order.
pub fn build_sensors(coordinator: &Arc<RefreshCoordinator>) -> Vec<ComfoclimeSensor> {
    let store = coordinator.store();

    let mut sensors = Vec::new();
    for uuid in store.uuids() {
        let Some(snapshot) = store.get(uuid) else {
            continue;
        };
        for field in catalog().iter() {
            if snapshot.contains_key(field.key) {
                sensors.push(ComfoclimeSensor::new(coordinator.clone(), uuid, field));
            }
        }
    }
    sensors
}
