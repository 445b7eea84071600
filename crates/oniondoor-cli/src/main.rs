//! OnionDoor: door buzzer controller.
//!
//! Runs the door controller against a simulated digital I/O port and
//! serves operator commands on stdin.

mod cli;
mod console;
mod period;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use oniondoor_controller::DoorController;
use oniondoor_hardware::mock::{MockDeviceCounter, MockDigitalPort};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::console::Console;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --log-level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    info!("Starting OnionDoor {}", oniondoor_core::VERSION);

    let config = cli.door_config();
    let (port, port_handle) = MockDigitalPort::new();
    let builder = DoorController::builder(Arc::new(port)).config(config);

    match cli.simulated_devices {
        Some(count) => {
            let (counter, devices) = MockDeviceCounter::new(count);
            info!("{count} devices associated to the simulated gateway");
            let controller = builder
                .presence(counter)
                .build()
                .context("Invalid door configuration")?;
            console::run(Console::new(Arc::new(controller), port_handle, Some(devices))).await?;
        }
        None => {
            let controller = builder.build().context("Invalid door configuration")?;
            console::run(Console::new(Arc::new(controller), port_handle, None)).await?;
        }
    }

    info!("OnionDoor stopped");
    Ok(())
}
