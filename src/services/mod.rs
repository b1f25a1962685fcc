//! Polling services for ComfoClime appliances
//!
//! The coordinator fetches and publishes snapshots, the scheduler drives it
//! on a timer, and sensors read from whatever was published last.

pub mod coordinator;
pub mod field_catalog;
pub mod scheduler;
pub mod sensors;
pub mod snapshot;

pub use coordinator::{RefreshCoordinator, RefreshEvent, RefreshState};
pub use field_catalog::{catalog, season_label, FieldCatalog, FieldDescriptor};
pub use scheduler::{IntervalScheduler, Refresh, RefreshOutcome};
pub use sensors::{
    build_sensors, project_coded, project_season, project_value, ComfoclimeSensor, SensorKind,
    SensorState,
};
pub use snapshot::{merge, DashboardSnapshot, SnapshotStore};
