//! Async polling client for Zehnder ComfoClime HVAC appliances
//!
//! The appliance exposes a small local JSON API: a systems list and one
//! dashboard per system. This crate polls both on a fixed interval, merges
//! them into one snapshot per system and exposes a catalog of known fields
//! as read-only sensors.
//!
//! # Features
//!
//! - Setup handshake with de-duplication and user-facing error codes
//! - Fetch-merge-publish refresh cycles that never publish partial data
//! - Fixed-interval scheduling with cancellation
//! - Device registration and sensor projection, including coded fields

pub mod client;
pub mod config;
pub mod device;
pub mod error;
pub mod integration;
pub mod logging;
pub mod services;
pub mod setup;

// Re-export main types for convenience
pub use client::{ComfoclimeApi, ComfoclimeHttpClient};
pub use config::ServerConfig;
pub use error::{ComfoclimeError, Result, SetupError};
pub use integration::ComfoclimeIntegration;
pub use services::{RefreshCoordinator, SnapshotStore};
