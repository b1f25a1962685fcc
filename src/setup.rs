//! Setup handshake for a new appliance
//!
//! A user submits `host` and `port`; the flow de-duplicates on `host:port`,
//! probes the systems endpoint once and either creates a config entry or
//! reports an error code back to the form.

use crate::client::{ComfoclimeApi, ComfoclimeHttpClient, System};
use crate::config::{DeviceConfig, DEFAULT_PORT, DEFAULT_TIMEOUT};
use crate::error::{ComfoclimeError, Result, SetupError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Form input of the user step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInput {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl UserInput {
    pub fn new<S: Into<String>>(host: S) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
        }
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

/// A configured appliance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    /// Random identifier assigned on creation
    pub entry_id: String,
    /// `host:port`
    pub unique_id: String,
    pub title: String,
    pub data: DeviceConfig,
}

impl ConfigEntry {
    /// New entry for `device` with a fresh entry id
    pub fn new(device: DeviceConfig) -> Self {
        Self {
            entry_id: Uuid::new_v4().to_string(),
            unique_id: device.unique_id(),
            title: device.title(),
            data: device,
        }
    }
}

/// Why a flow was aborted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    AlreadyConfigured,
}

impl AbortReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AbortReason::AlreadyConfigured => "already_configured",
        }
    }
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one flow step
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowResult {
    /// Entry created and stored
    CreateEntry { entry: ConfigEntry },
    /// Show the form again, optionally with an error code
    ShowForm { error: Option<SetupError> },
    /// Flow ended without an entry
    Abort { reason: AbortReason },
}

/// Config entries known to the host, keyed by unique id
#[derive(Debug, Default)]
pub struct EntryRegistry {
    entries: RwLock<HashMap<String, ConfigEntry>>,
}

impl EntryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, unique_id: &str) -> bool {
        self.entries.read().await.contains_key(unique_id)
    }

    /// Store an entry; fails when its unique id is already taken
    pub async fn add(&self, entry: ConfigEntry) -> Result<()> {
        let mut entries = self.entries.write().await;
        if entries.contains_key(&entry.unique_id) {
            return Err(ComfoclimeError::invalid_input(format!(
                "Entry {} already configured",
                entry.unique_id
            )));
        }
        entries.insert(entry.unique_id.clone(), entry);
        Ok(())
    }

    /// Remove an entry by its entry id
    pub async fn remove(&self, entry_id: &str) -> Option<ConfigEntry> {
        let mut entries = self.entries.write().await;
        let unique_id = entries
            .values()
            .find(|entry| entry.entry_id == entry_id)
            .map(|entry| entry.unique_id.clone())?;
        entries.remove(&unique_id)
    }

    pub async fn entries(&self) -> Vec<ConfigEntry> {
        let mut entries: Vec<ConfigEntry> = self.entries.read().await.values().cloned().collect();
        entries.sort_by(|a, b| a.unique_id.cmp(&b.unique_id));
        entries
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// Probe the systems list once; an empty list is an error
pub async fn validate_connection(api: &dyn ComfoclimeApi) -> Result<Vec<System>> {
    let systems = api.probe_systems().await?;
    if systems.is_empty() {
        return Err(ComfoclimeError::no_systems_found(
            "Appliance reported an empty systems list",
        ));
    }
    Ok(systems)
}

/// User-initiated setup flow
#[derive(Debug, Clone)]
pub struct ConfigFlow {
    entries: Arc<EntryRegistry>,
    timeout: Duration,
}

impl ConfigFlow {
    pub fn new(entries: Arc<EntryRegistry>) -> Self {
        Self {
            entries,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the probe timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the user step
    ///
    /// Without input the empty form is shown.
    pub async fn step_user(&self, input: Option<UserInput>) -> FlowResult {
        let Some(input) = input else {
            return FlowResult::ShowForm { error: None };
        };

        let device = DeviceConfig::new(input.host.trim())
            .with_port(input.port)
            .with_timeout(self.timeout);

        if self.entries.contains(&device.unique_id()).await {
            return FlowResult::Abort {
                reason: AbortReason::AlreadyConfigured,
            };
        }

        let client = match ComfoclimeHttpClient::new(&device) {
            Ok(client) => client,
            Err(e) => {
                warn!("Cannot reach {}: {e}", device.unique_id());
                return FlowResult::ShowForm {
                    error: Some(SetupError::CannotConnect),
                };
            }
        };

        self.handshake(device, &client).await
    }

    async fn handshake(&self, device: DeviceConfig, api: &dyn ComfoclimeApi) -> FlowResult {
        let unique_id = device.unique_id();

        match validate_connection(api).await {
            Ok(systems) => {
                debug!("{unique_id} reported {} systems", systems.len());
            }
            Err(e) => {
                let code = e.setup_error();
                if code == SetupError::Unknown {
                    error!("Unexpected error while setting up {unique_id}: {e}");
                } else {
                    warn!("Setup of {unique_id} failed ({code}): {e}");
                }
                return FlowResult::ShowForm { error: Some(code) };
            }
        }

        let entry = ConfigEntry::new(device);
        // A concurrent flow may have stored the same appliance meanwhile
        if self.entries.add(entry.clone()).await.is_err() {
            return FlowResult::Abort {
                reason: AbortReason::AlreadyConfigured,
            };
        }

        info!("Created entry {} for {unique_id}", entry.entry_id);
        FlowResult::CreateEntry { entry }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::coordinator::tests::{system, MockApi};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn flow() -> (ConfigFlow, Arc<EntryRegistry>) {
        let entries = Arc::new(EntryRegistry::new());
        (ConfigFlow::new(entries.clone()), entries)
    }

    #[tokio::test]
    async fn no_input_shows_form() {
        let (flow, _) = flow();
        assert_eq!(
            flow.step_user(None).await,
            FlowResult::ShowForm { error: None }
        );
    }

    #[tokio::test]
    async fn creates_entry_on_success() {
        let mut api = MockApi::new();
        api.expect_fetch_systems()
            .times(1)
            .returning(|| Ok(vec![system(json!({"uuid": "abc"}))]));

        let (flow, entries) = flow();
        let device = DeviceConfig::new("10.0.0.5").with_port(8080);
        let FlowResult::CreateEntry { entry } = flow.handshake(device, &api).await else {
            panic!("expected an entry");
        };

        assert_eq!(entry.unique_id, "10.0.0.5:8080");
        assert_eq!(entry.title, "Comfoclime 10.0.0.5:8080");
        assert!(entries.contains("10.0.0.5:8080").await);
    }

    #[tokio::test]
    async fn maps_errors_to_form_codes() {
        let mut api = MockApi::new();
        api.expect_fetch_systems().times(1).returning(|| Ok(vec![]));
        let (flow, entries) = flow();
        assert_eq!(
            flow.handshake(DeviceConfig::new("h"), &api).await,
            FlowResult::ShowForm {
                error: Some(SetupError::NoSystemsFound)
            }
        );

        let mut api = MockApi::new();
        api.expect_fetch_systems()
            .returning(|| Err(ComfoclimeError::timeout("10s")));
        assert_eq!(
            flow.handshake(DeviceConfig::new("h"), &api).await,
            FlowResult::ShowForm {
                error: Some(SetupError::CannotConnect)
            }
        );

        let mut api = MockApi::new();
        api.expect_fetch_systems()
            .returning(|| Err(ComfoclimeError::invalid_input("odd payload")));
        assert_eq!(
            flow.handshake(DeviceConfig::new("h"), &api).await,
            FlowResult::ShowForm {
                error: Some(SetupError::Unknown)
            }
        );

        assert!(entries.is_empty().await);
    }

    #[tokio::test]
    async fn duplicate_aborts_before_probing() {
        let (flow, entries) = flow();
        entries
            .add(ConfigEntry::new(DeviceConfig::new("10.0.0.5")))
            .await
            .unwrap();

        let result = flow.step_user(Some(UserInput::new("10.0.0.5"))).await;
        assert_eq!(
            result,
            FlowResult::Abort {
                reason: AbortReason::AlreadyConfigured
            }
        );
        assert_eq!(entries.len().await, 1);
    }

    #[tokio::test]
    async fn empty_host_cannot_connect() {
        let (flow, _) = flow();
        assert_eq!(
            flow.step_user(Some(UserInput::new("  "))).await,
            FlowResult::ShowForm {
                error: Some(SetupError::CannotConnect)
            }
        );
    }

    #[tokio::test]
    async fn remove_entry_by_id() {
        let entries = EntryRegistry::new();
        let entry = ConfigEntry::new(DeviceConfig::new("a"));
        entries.add(entry.clone()).await.unwrap();
        assert!(entries.add(entry.clone()).await.is_err());

        assert_eq!(entries.remove(&entry.entry_id).await, Some(entry));
        assert!(entries.is_empty().await);
    }

    #[test]
    fn user_input_port_defaults_to_80() {
        let input: UserInput = serde_json::from_value(json!({"host": "h"})).unwrap();
        assert_eq!(input, UserInput::new("h"));
    }
}
