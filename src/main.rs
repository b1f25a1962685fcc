//! ComfoClime polling client - command line entry point
//!
//! - `check`: run the setup handshake against an appliance
//! - `snapshot`: refresh once and print every sensor as JSON
//! - `poll`: keep refreshing until Ctrl-C, logging each update

use comfoclime::{
    config::ServerConfig,
    device::InMemoryDeviceRegistry,
    integration::ComfoclimeIntegration,
    logging::{init_logging, LogConfig},
    services::{RefreshEvent, SensorState},
    setup::{ConfigEntry, ConfigFlow, EntryRegistry, FlowResult, UserInput},
    ComfoclimeError, Result,
};

use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

/// ComfoClime command line client
#[derive(Parser, Debug)]
#[command(name = "comfoclime")]
#[command(about = "Poll Zehnder ComfoClime appliances and print their sensors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Appliance host name or IP address
    #[arg(long, global = true, env = "COMFOCLIME_HOST")]
    host: Option<String>,

    /// Appliance HTTP port
    #[arg(long, global = true, env = "COMFOCLIME_PORT")]
    port: Option<u16>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Probe the appliance the way the setup form does
    Check,
    /// Refresh once and print all sensors
    Snapshot,
    /// Refresh on the configured interval until interrupted
    Poll,
}

impl Cli {
    /// Merge file, environment and command line settings
    fn server_config(&self) -> Result<ServerConfig> {
        let mut config = ServerConfig::load(self.config.as_deref())?;
        if let Some(host) = &self.host {
            config.device.host = host.clone();
        }
        if let Some(port) = self.port {
            config.device.port = port;
        }
        config.validate()?;
        Ok(config)
    }
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn sensor_states(integration: &ComfoclimeIntegration) -> Vec<SensorState> {
    integration.sensors().iter().map(|sensor| sensor.state()).collect()
}

async fn check(config: &ServerConfig) -> Result<()> {
    let flow = ConfigFlow::new(Arc::new(EntryRegistry::new())).with_timeout(config.device.timeout);
    let input = UserInput::new(config.device.host.clone()).with_port(config.device.port);

    let result = flow.step_user(Some(input)).await;
    print_json(&serde_json::to_value(&result)?)?;

    match result {
        FlowResult::CreateEntry { .. } => Ok(()),
        FlowResult::ShowForm { error } => Err(ComfoclimeError::connection(format!(
            "Setup failed: {}",
            error.map(|code| code.as_str()).unwrap_or("unknown")
        ))),
        FlowResult::Abort { reason } => Err(ComfoclimeError::invalid_input(format!(
            "Setup aborted: {reason}"
        ))),
    }
}

async fn snapshot(config: &ServerConfig) -> Result<()> {
    let registry = InMemoryDeviceRegistry::new();
    let entry = ConfigEntry::new(config.device.clone());
    let integration =
        ComfoclimeIntegration::setup_entry(entry, &registry, config.polling.update_interval)
            .await?;

    print_json(&json!({
        "title": integration.entry().title,
        "devices": integration.devices(),
        "sensors": sensor_states(&integration),
    }))?;

    integration.unload().await
}

async fn poll(config: &ServerConfig) -> Result<()> {
    let registry = InMemoryDeviceRegistry::new();
    let entry = ConfigEntry::new(config.device.clone());
    let integration =
        ComfoclimeIntegration::setup_entry(entry, &registry, config.polling.update_interval)
            .await?;

    let mut events = integration.coordinator().subscribe();
    for state in sensor_states(&integration) {
        info!(sensor = %state.unique_id, value = ?state.value, "Initial value");
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                break;
            }
            event = events.recv() => match event {
                Ok(RefreshEvent::Updated { systems, updated_at }) => {
                    info!("Update at {updated_at} for {systems} systems");
                    for state in sensor_states(&integration) {
                        info!(
                            sensor = %state.unique_id,
                            value = ?state.value,
                            available = state.available,
                            "Sensor"
                        );
                    }
                }
                Ok(RefreshEvent::Failed { error }) => {
                    warn!("Update failed, keeping previous values: {error}");
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Skipped {skipped} refresh events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    integration.unload().await
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.server_config()?;

    init_logging(LogConfig::from_config(&config.logging).with_debug(cli.debug))
        .map_err(|e| ComfoclimeError::config(format!("Failed to initialize logging: {e}")))?;

    info!(
        "Starting comfoclime v{} against {}",
        env!("CARGO_PKG_VERSION"),
        config.device.unique_id()
    );

    match cli.command {
        Command::Check => check(&config).await,
        Command::Snapshot => snapshot(&config).await,
        Command::Poll => poll(&config).await,
    }
}
