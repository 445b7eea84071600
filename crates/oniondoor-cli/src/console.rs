//! Line-oriented operator console.
//!
//! Each stdin line is parsed with clap into a [`ConsoleCommand`] and run
//! against the controller. The console stands in for the web front end:
//! activate, deactivate, manual open and status.

use std::sync::Arc;

use anyhow::Context;
use chrono_humanize::HumanTime;
use clap::{CommandFactory, Parser, Subcommand};
use oniondoor_controller::{DoorController, DoorService};
use oniondoor_hardware::DeviceCounter;
use oniondoor_hardware::mock::{MockDeviceCounterHandle, MockDigitalPort, MockDigitalPortHandle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::period::activation_period;

#[derive(Debug, Parser)]
#[command(
    name = "console",
    no_binary_name = true,
    disable_help_flag = true,
    disable_help_subcommand = true,
    disable_version_flag = true
)]
struct ConsoleLine {
    #[command(subcommand)]
    command: ConsoleCommand,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum ConsoleCommand {
    /// Simulate a press of the door button
    Press,

    /// Open the door on the next press for a while (default 2 minutes)
    Activate {
        /// Period such as 90, 2m, 1h30m or "2 minutes"
        period: Vec<String>,
    },

    /// Close the activation window
    Deactivate,

    /// Unlock the door now
    Open,

    /// Show whether the door is activated
    Status,

    /// Set the simulated number of associated devices
    Devices { count: u32 },

    /// Show this help
    Help,

    /// Stop the controller
    #[command(alias = "exit")]
    Quit,
}

/// Parse one console line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<ConsoleCommand>, clap::Error> {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() {
        return Ok(None);
    }
    ConsoleLine::try_parse_from(words).map(|line| Some(line.command))
}

/// What the console should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Quit,
}

/// Console state: the controller plus the simulated transport handles.
pub struct Console<C> {
    controller: Arc<DoorController<MockDigitalPort, C>>,
    port: MockDigitalPortHandle,
    devices: Option<MockDeviceCounterHandle>,
}

impl<C: DeviceCounter + 'static> Console<C> {
    pub fn new(
        controller: Arc<DoorController<MockDigitalPort, C>>,
        port: MockDigitalPortHandle,
        devices: Option<MockDeviceCounterHandle>,
    ) -> Self {
        Self {
            controller,
            port,
            devices,
        }
    }

    /// Run one command.
    ///
    /// # Errors
    ///
    /// Returns an error if the simulated press cannot be delivered.
    pub async fn execute(&self, command: ConsoleCommand) -> anyhow::Result<Reply> {
        let text = match command {
            ConsoleCommand::Press => {
                let pin = self.controller.config().input_pin;
                if self.port.press(pin).await? {
                    "Button pressed".to_string()
                } else {
                    "Press suppressed by debounce".to_string()
                }
            }
            ConsoleCommand::Activate { period } => {
                let period = period.join(" ");
                let requested = (!period.is_empty()).then_some(period.as_str());
                let (duration, source) = activation_period(requested);
                self.controller.activate(duration);
                format!("{}\n{}", source.message(), self.status())
            }
            ConsoleCommand::Deactivate => {
                self.controller.deactivate();
                "Door deactivated!".to_string()
            }
            ConsoleCommand::Open => match self.controller.unlock_door() {
                Some(_) => "Unlocking the door".to_string(),
                None => "Door is already unlocking".to_string(),
            },
            ConsoleCommand::Status => self.status(),
            ConsoleCommand::Devices { count } => match &self.devices {
                Some(devices) => {
                    devices.set_count(count);
                    format!("{count} devices associated")
                }
                None => "No simulated gateway configured".to_string(),
            },
            ConsoleCommand::Help => help(),
            ConsoleCommand::Quit => return Ok(Reply::Quit),
        };

        Ok(Reply::Text(text))
    }

    /// Human-readable status, as the index page showed it.
    pub fn status(&self) -> String {
        let status = self.controller.status();

        let mut text = match status.active_until {
            Some(until) => {
                let remaining = until - self.controller.now();
                format!(
                    "Door is activated until {} ({})",
                    until.format("%Y-%m-%d %H:%M:%S UTC"),
                    HumanTime::from(remaining)
                )
            }
            None => "Door is not activated".to_string(),
        };

        if status.unlocking {
            text.push_str("\nUnlock in progress");
        }
        text
    }
}

fn help() -> String {
    ConsoleLine::command().render_help().to_string()
}

/// Start the door service and serve console commands from stdin until
/// `quit`, end of input, or Ctrl-C.
///
/// # Errors
///
/// Returns an error if the service fails to start or stop, or stdin fails.
pub async fn run<C: DeviceCounter + 'static>(console: Console<C>) -> anyhow::Result<()> {
    let service = DoorService::new(Arc::clone(&console.controller))
        .start()
        .await
        .context("Failed to start door service")?;

    println!("OnionDoor ready. Type `help` for commands.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                None
            }
        };
        let Some(line) = line else {
            break;
        };

        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        match console.execute(command).await {
            Ok(Reply::Text(text)) => println!("{text}"),
            Ok(Reply::Quit) => break,
            Err(e) => {
                warn!("Console command failed: {e:#}");
                println!("error: {e:#}");
            }
        }
    }

    service.shutdown().await.context("Failed to stop door service")?;
    Ok(())
}
