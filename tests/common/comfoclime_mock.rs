//! WireMock-based ComfoClime appliance
//!
//! Serves `/system/systems` and `/system/{uuid}/dashboard` so tests can run
//! the real HTTP client without hardware.

use comfoclime::config::DeviceConfig;
use comfoclime::setup::UserInput;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

/// Mock ComfoClime appliance
pub struct MockComfoclime {
    pub server: MockServer,
}

impl MockComfoclime {
    /// Start an appliance with no endpoints mounted
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Appliance with one system `abc` whose dashboard reports cooling season
    pub async fn with_single_system() -> Self {
        let mock = Self::start().await;
        mock.mock_systems(json!({
            "systems": [{"uuid": "abc", "name": "Unit1", "version": "1.0"}]
        }))
        .await;
        mock.mock_dashboard("abc", json!({"indoorTemperature": 21.5, "season": 2}))
            .await;
        mock
    }

    /// Serve `body` from the systems endpoint
    pub async fn mock_systems(&self, body: Value) {
        self.mock_systems_response(ResponseTemplate::new(200).set_body_json(body))
            .await;
    }

    /// Serve an arbitrary response from the systems endpoint
    pub async fn mock_systems_response(&self, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/system/systems"))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    /// Serve `body` from the dashboard endpoint of `uuid`
    pub async fn mock_dashboard(&self, uuid: &str, body: Value) {
        self.mock_dashboard_response(uuid, ResponseTemplate::new(200).set_body_json(body))
            .await;
    }

    /// Serve an arbitrary response from the dashboard endpoint of `uuid`
    pub async fn mock_dashboard_response(&self, uuid: &str, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(format!("/system/{uuid}/dashboard")))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    /// Drop every mounted endpoint
    pub async fn reset(&self) {
        self.server.reset().await;
    }

    /// Connection settings pointing at this appliance
    pub fn device_config(&self) -> DeviceConfig {
        let address = self.server.address();
        DeviceConfig::new(address.ip().to_string())
            .with_port(address.port())
            .with_timeout(Duration::from_secs(2))
    }

    /// Setup form input pointing at this appliance
    pub fn user_input(&self) -> UserInput {
        let address = self.server.address();
        UserInput::new(address.ip().to_string()).with_port(address.port())
    }
}
