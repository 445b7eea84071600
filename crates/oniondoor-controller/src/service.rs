//! Event pump delivering button edges to the controller.
//!
//! ```text
//! ┌──────────┐  PressEvent   ┌────────────┐  on_button_pressed  ┌────────────────┐
//! │ DigitalIo│──────────────►│ press task │────────────────────►│ DoorController │
//! │  (edge)  │  (bounded)    │ (JoinSet)  │                     │                │
//! └──────────┘               └────────────┘                     └───────┬────────┘
//!      ▲                                                                │ spawn
//!      │                         write(level)                     ┌─────▼──────┐
//!      └──────────────────────────────────────────────────────────┤UnlockCycle │
//!                                                                 └────────────┘
//! ```
//!
//! Presses are handled one at a time, in delivery order.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use oniondoor_controller::{DoorController, DoorService};
//! use oniondoor_hardware::mock::MockDigitalPort;
//!
//! #[tokio::main]
//! async fn main() -> oniondoor_controller::Result<()> {
//!     let (port, _handle) = MockDigitalPort::new();
//!     let controller = Arc::new(DoorController::builder(Arc::new(port)).build()?);
//!
//!     let handle = DoorService::new(controller).start().await?;
//!
//!     // ... run until asked to stop
//!
//!     handle.shutdown().await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use oniondoor_hardware::{DeviceCounter, DigitalIo, EdgeReceiver};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::controller::DoorController;
use crate::error::Result;
use crate::presence::NoGateway;

/// Wires a controller to its port's edge events.
#[derive(Debug)]
pub struct DoorService<P, C = NoGateway> {
    controller: Arc<DoorController<P, C>>,
}

impl<P, C> DoorService<P, C>
where
    P: DigitalIo + 'static,
    C: DeviceCounter + 'static,
{
    pub fn new(controller: Arc<DoorController<P, C>>) -> Self {
        Self { controller }
    }

    /// Lock the output, subscribe to the button and spawn the event pump.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the initial lock write or the edge
    /// subscription fails. Nothing is left running in that case.
    pub async fn start(self) -> Result<DoorServiceHandle<P, C>> {
        let config = self.controller.config();
        let input_pin = config.input_pin;
        let debounce = config.debounce();

        self.controller.lock_output().await?;
        let presses = self
            .controller
            .port()
            .subscribe_edge(input_pin, debounce)
            .await?;
        info!("Listening for button presses on {input_pin}");

        let mut tasks = JoinSet::new();
        tasks.spawn(press_task(Arc::clone(&self.controller), presses));

        Ok(DoorServiceHandle {
            controller: self.controller,
            tasks,
        })
    }
}

async fn press_task<P, C>(
    controller: Arc<DoorController<P, C>>,
    mut presses: EdgeReceiver,
) -> Result<()>
where
    P: DigitalIo + 'static,
    C: DeviceCounter,
{
    while let Some(event) = presses.recv().await {
        let outcome = controller.on_button_pressed(event.at).await;
        debug!("Press at {} handled: {:?}", event.at, outcome.path);
    }

    debug!("Edge subscription closed");
    Ok(())
}

/// Handle to a running [`DoorService`].
pub struct DoorServiceHandle<P, C = NoGateway> {
    controller: Arc<DoorController<P, C>>,
    tasks: JoinSet<Result<()>>,
}

impl<P, C> DoorServiceHandle<P, C>
where
    P: DigitalIo + 'static,
    C: DeviceCounter + 'static,
{
    pub fn controller(&self) -> &Arc<DoorController<P, C>> {
        &self.controller
    }

    /// Stop the event pump and leave the door locked.
    ///
    /// An unlock cycle already in flight runs to completion first. Task
    /// errors and panics are logged, not returned.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the final lock write fails.
    pub async fn shutdown(mut self) -> Result<()> {
        self.tasks.abort_all();

        let mut error_count = 0;
        let mut panic_count = 0;

        while let Some(result) = self.tasks.join_next().await {
            match classify_task_result(result) {
                TaskTermination::Success | TaskTermination::Cancelled => {}
                TaskTermination::Error => error_count += 1,
                TaskTermination::Panic => panic_count += 1,
            }
        }

        if error_count + panic_count > 0 {
            warn!("Event pump stopped with {error_count} errors and {panic_count} panics");
        }

        self.controller.wait_until_locked().await;
        self.controller.lock_output().await?;
        info!("Door service stopped");

        Ok(())
    }
}

impl<P, C> std::fmt::Debug for DoorServiceHandle<P, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DoorServiceHandle")
            .field("tasks", &self.tasks.len())
            .finish_non_exhaustive()
    }
}

/// Task termination classification for shutdown handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskTermination {
    Success,
    Error,
    /// Expected during shutdown.
    Cancelled,
    Panic,
}

fn classify_task_result(
    result: std::result::Result<Result<()>, tokio::task::JoinError>,
) -> TaskTermination {
    match result {
        Ok(Ok(())) => TaskTermination::Success,
        Ok(Err(_)) => TaskTermination::Error,
        Err(e) if e.is_cancelled() => TaskTermination::Cancelled,
        Err(_) => TaskTermination::Panic,
    }
}
