//! Configuration management for the ComfoClime client

use crate::error::{ComfoclimeError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, time::Duration};
use url::Url;

/// Port the appliance listens on unless told otherwise
pub const DEFAULT_PORT: u16 = 80;

/// Hard per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Period between refresh cycles
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(300);

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Appliance connection settings
    pub device: DeviceConfig,

    /// Refresh schedule
    pub polling: PollingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Appliance connection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DeviceConfig {
    /// Host name or IP address of the appliance
    pub host: String,

    /// HTTP port
    pub port: u16,

    /// Per-request timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

/// Refresh schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Time between two refresh cycles
    #[serde(with = "humantime_serde")]
    pub update_interval: Duration,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable structured JSON logging
    pub json_format: bool,

    /// Log to file (path)
    pub file: Option<PathBuf>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            update_interval: DEFAULT_UPDATE_INTERVAL,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            file: None,
        }
    }
}

impl DeviceConfig {
    /// Connection settings for `host` with default port and timeout
    pub fn new<S: Into<String>>(host: S) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Override the port
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Override the per-request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Identity used to de-duplicate configured appliances
    pub fn unique_id(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Human readable entry title; the port is only shown when non-default
    pub fn title(&self) -> String {
        if self.port == DEFAULT_PORT {
            format!("Comfoclime {}", self.host)
        } else {
            format!("Comfoclime {}:{}", self.host, self.port)
        }
    }

    /// Base URL of the appliance API
    pub fn base_url(&self) -> Result<Url> {
        if self.host.trim().is_empty() {
            return Err(ComfoclimeError::config("Host cannot be empty"));
        }
        format!("http://{}:{}/", self.host, self.port)
            .parse()
            .map_err(|e| ComfoclimeError::config(format!("Invalid host {}: {e}", self.host)))
    }
}

impl ServerConfig {
    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load configuration from a file (TOML, YAML or JSON, picked by extension)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .build()
            .map_err(|e| {
                ComfoclimeError::config(format!("Failed to read {}: {e}", path.display()))
            })?;

        settings
            .try_deserialize()
            .map_err(|e| ComfoclimeError::config(format!("Invalid {}: {e}", path.display())))
    }

    /// Load from an optional file, then let environment variables override it
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(host) = env::var("COMFOCLIME_HOST") {
            self.device.host = host;
        }

        if let Ok(port) = env::var("COMFOCLIME_PORT") {
            self.device.port = port
                .parse()
                .map_err(|e| ComfoclimeError::config(format!("Invalid COMFOCLIME_PORT: {e}")))?;
        }

        if let Ok(timeout) = env::var("COMFOCLIME_TIMEOUT") {
            self.device.timeout = humantime::parse_duration(&timeout)
                .map_err(|e| ComfoclimeError::config(format!("Invalid COMFOCLIME_TIMEOUT: {e}")))?;
        }

        if let Ok(interval) = env::var("COMFOCLIME_UPDATE_INTERVAL") {
            self.polling.update_interval =
                humantime::parse_duration(&interval).map_err(|e| {
                    ComfoclimeError::config(format!("Invalid COMFOCLIME_UPDATE_INTERVAL: {e}"))
                })?;
        }

        if let Ok(level) = env::var("RUST_LOG") {
            self.logging.level = level;
        }

        if let Ok(file) = env::var("COMFOCLIME_LOG_FILE") {
            self.logging.file = Some(PathBuf::from(file));
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.device.host.trim().is_empty() {
            return Err(ComfoclimeError::config("Host cannot be empty"));
        }

        if self.device.port == 0 {
            return Err(ComfoclimeError::config("Port must be greater than zero"));
        }

        if self.device.timeout.is_zero() {
            return Err(ComfoclimeError::config("Timeout must be greater than zero"));
        }

        if self.polling.update_interval.is_zero() {
            return Err(ComfoclimeError::config(
                "Update interval must be greater than zero",
            ));
        }

        self.device.base_url().map(|_| ())
    }
}
