//! ComfoClime API client
//!
//! The appliance exposes two read-only endpoints that matter here:
//!
//! - `GET /system/systems` lists the HVAC units behind the appliance
//! - `GET /system/{uuid}/dashboard` returns the live telemetry of one unit

pub mod http_client;

pub use http_client::ComfoclimeHttpClient;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Path of the systems list endpoint
pub const API_SYSTEMS: &str = "system/systems";

/// Path of the per-system dashboard endpoint
pub fn dashboard_path(uuid: &str) -> String {
    format!("system/{uuid}/dashboard")
}

/// Flat field map returned by the dashboard endpoint
pub type Dashboard = Map<String, Value>;

/// One entry of the systems list
///
/// Only `uuid`, `displayName`, `name` and `version` are interpreted; every
/// other attribute is kept so that it ends up in the merged snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct System(Map<String, Value>);

impl System {
    /// Wrap a raw systems list entry
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// System identifier; `None` when absent or empty
    pub fn uuid(&self) -> Option<&str> {
        self.str_field("uuid").filter(|uuid| !uuid.is_empty())
    }

    /// `displayName`, falling back to `name`
    pub fn display_name(&self) -> Option<&str> {
        self.str_field("displayName").or_else(|| self.str_field("name"))
    }

    /// Firmware/software version
    pub fn version(&self) -> Option<&str> {
        self.str_field("version")
    }

    /// Raw attributes in the order they were received
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }
}

impl From<Map<String, Value>> for System {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Body of `GET /system/systems`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SystemsResponse {
    #[serde(default)]
    systems: Option<Vec<System>>,
}

impl SystemsResponse {
    /// Listed systems; absent, null and empty lists all come back empty
    pub fn into_systems(self) -> Vec<System> {
        self.systems.unwrap_or_default()
    }
}

/// Read access to a ComfoClime appliance
#[async_trait]
pub trait ComfoclimeApi: Send + Sync {
    /// List the systems behind the appliance
    async fn fetch_systems(&self) -> Result<Vec<System>>;

    /// Systems list as seen by the setup handshake
    ///
    /// Implementations that can tell status codes apart should accept only
    /// `200 OK` here.
    async fn probe_systems(&self) -> Result<Vec<System>> {
        self.fetch_systems().await
    }

    /// Fetch the dashboard of one system
    async fn fetch_dashboard(&self, uuid: &str) -> Result<Dashboard>;
}
