//! HTTP client implementation for ComfoClime appliances
//!
//! Plain `GET` requests without authentication. Every request is bounded by
//! the configured timeout and is attempted exactly once.

use crate::client::{dashboard_path, ComfoclimeApi, Dashboard, System, SystemsResponse, API_SYSTEMS};
use crate::config::DeviceConfig;
use crate::error::{ComfoclimeError, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

/// HTTP client for one ComfoClime appliance
#[derive(Debug, Clone)]
pub struct ComfoclimeHttpClient {
    /// HTTP client instance
    client: Client,

    /// Base URL, `http://{host}:{port}/`
    base_url: Url,

    /// Per-request timeout
    timeout: Duration,
}

impl ComfoclimeHttpClient {
    /// Create a new HTTP client for the given appliance
    pub fn new(config: &DeviceConfig) -> Result<Self> {
        let base_url = config.base_url()?;

        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .user_agent(format!("comfoclime-rs/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ComfoclimeError::connection(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            timeout: config.timeout,
        })
    }

    /// Base URL of the appliance
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Configured per-request timeout
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Build URL for API endpoint
    fn build_url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ComfoclimeError::invalid_input(format!("Invalid URL path {path}: {e}")))
    }

    /// Issue a GET and decode the JSON body
    ///
    /// Statuses rejected by `accept` become connection errors.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        accept: fn(StatusCode) -> bool,
    ) -> Result<T> {
        debug!("GET {url}");

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            let error_msg = format!("Request to {url} failed: {e}");
            if e.is_timeout() {
                ComfoclimeError::timeout(error_msg)
            } else if e.is_connect() {
                ComfoclimeError::connection(error_msg)
            } else {
                ComfoclimeError::Http(e)
            }
        })?;

        let status = response.status();
        if !accept(status) {
            return Err(ComfoclimeError::connection(format!(
                "HTTP error {status} from {url}"
            )));
        }

        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ComfoclimeError::timeout(format!("Reading response from {url} timed out: {e}"))
            } else {
                ComfoclimeError::connection(format!("Failed to read response from {url}: {e}"))
            }
        })?;

        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl ComfoclimeApi for ComfoclimeHttpClient {
    async fn fetch_systems(&self) -> Result<Vec<System>> {
        let url = self.build_url(API_SYSTEMS)?;

        let response: SystemsResponse = self
            .get_json(url, |status| status.is_success())
            .await
            .map_err(|e| {
                error!("Error communicating with Comfoclime: {e}");
                e
            })?;
        let systems = response.into_systems();

        debug!("Received {} systems", systems.len());
        Ok(systems)
    }

    async fn probe_systems(&self) -> Result<Vec<System>> {
        let url = self.build_url(API_SYSTEMS)?;

        let response: SystemsResponse = self
            .get_json(url, |status| status == StatusCode::OK)
            .await?;
        Ok(response.into_systems())
    }

    async fn fetch_dashboard(&self, uuid: &str) -> Result<Dashboard> {
        let url = self.build_url(&dashboard_path(uuid))?;

        let dashboard: Dashboard = self
            .get_json(url, |status| status.is_success())
            .await
            .map_err(|e| {
                error!("Error fetching dashboard for {uuid}: {e}");
                e
            })?;

        debug!("Received dashboard data for {uuid}: {dashboard:?}");
        Ok(dashboard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_endpoint_urls() {
        let client = ComfoclimeHttpClient::new(&DeviceConfig::new("10.0.0.7").with_port(8080))
            .unwrap();

        assert_eq!(
            client.build_url(API_SYSTEMS).unwrap().as_str(),
            "http://10.0.0.7:8080/system/systems"
        );
        assert_eq!(
            client.build_url(&dashboard_path("abc-123")).unwrap().as_str(),
            "http://10.0.0.7:8080/system/abc-123/dashboard"
        );
        assert_eq!(client.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn rejects_empty_host() {
        let err = ComfoclimeHttpClient::new(&DeviceConfig::new("")).unwrap_err();
        assert!(matches!(err, ComfoclimeError::Config(_)));
    }
}
