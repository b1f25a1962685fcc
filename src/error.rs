//! Error types for the ComfoClime client
//!
//! Runtime errors are propagated to the caller of a refresh cycle. Errors
//! raised during the setup handshake are additionally folded into a
//! [`SetupError`] code that a host can show next to its setup form.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias for ComfoClime operations
pub type Result<T> = std::result::Result<T, ComfoclimeError>;

/// Error types for ComfoClime operations
#[derive(Error, Debug)]
pub enum ComfoclimeError {
    /// Transport failure or non-success HTTP status
    #[error("Connection error: {0}")]
    Connection(String),

    /// Request exceeded the per-request timeout
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// HTTP client errors not classified as connect or timeout
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing errors
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The appliance answered but reported no systems
    #[error("No systems found: {0}")]
    NoSystemsFound(String),

    /// The first refresh of an entry failed, the entry cannot be set up yet
    #[error("Entry not ready: {0}")]
    NotReady(String),

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors
    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

impl ComfoclimeError {
    /// Create a connection error
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a no-systems error
    pub fn no_systems_found<S: Into<String>>(msg: S) -> Self {
        Self::NoSystemsFound(msg.into())
    }

    /// Create a not-ready error
    pub fn not_ready<S: Into<String>>(msg: S) -> Self {
        Self::NotReady(msg.into())
    }

    /// Whether the error belongs to the connection category
    /// (transport failure, timeout, or non-success status)
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout(_) | Self::Http(_))
    }

    /// Map this error onto the code shown to a user during setup
    pub fn setup_error(&self) -> SetupError {
        match self {
            e if e.is_connection_error() => SetupError::CannotConnect,
            Self::NoSystemsFound(_) => SetupError::NoSystemsFound,
            _ => SetupError::Unknown,
        }
    }
}

/// User-facing error codes of the setup handshake
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SetupError {
    /// Transport error, timeout or non-success status
    CannotConnect,
    /// Success status but an empty or missing systems list
    NoSystemsFound,
    /// Anything else
    Unknown,
}

impl SetupError {
    /// Stable string code
    pub fn as_str(&self) -> &'static str {
        match self {
            SetupError::CannotConnect => "cannot_connect",
            SetupError::NoSystemsFound => "no_systems_found",
            SetupError::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
