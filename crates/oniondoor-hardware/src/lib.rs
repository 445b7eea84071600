//! Transport abstraction layer for the OnionDoor buzzer controller.
//!
//! This crate defines the two collaborators the door controller depends on
//! only through an interface:
//!
//! - [`DigitalIo`]: a digital I/O port that delivers debounced button
//!   presses and drives the relay output.
//! - [`DeviceCounter`]: a local network gateway reporting how many devices
//!   are associated, used as a presence signal.
//!
//! # Design Philosophy
//!
//! - **Async-first**: every operation returns a `Send` future so the
//!   controller can call the port from spawned tokio tasks.
//! - **Transport owns the wire**: pin numbering, pull direction and debounce
//!   hardware stay on this side of the seam.
//! - **Error-aware**: all operations return [`Result<T>`][error::Result]
//!   carrying a [`HardwareError`]; nothing here retries.
//!
//! # Example
//!
//! ```no_run
//! use oniondoor_core::{Level, PinId};
//! use oniondoor_hardware::{DigitalIo, Result};
//! use std::time::Duration;
//!
//! async fn wait_for_press<P: DigitalIo>(port: &P, button: PinId) -> Result<()> {
//!     let mut presses = port.subscribe_edge(button, Duration::from_millis(200)).await?;
//!     if let Some(press) = presses.recv().await {
//!         println!("pressed at {}", press.at);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Mock Implementations
//!
//! The [`mock`] module provides [`MockDigitalPort`](mock::MockDigitalPort)
//! and [`MockDeviceCounter`](mock::MockDeviceCounter) for development and
//! testing without physical hardware.

pub mod error;
pub mod mock;
pub mod traits;

// Re-export commonly used types for convenience
pub use error::{HardwareError, Result};
pub use traits::{DeviceCounter, DigitalIo, EdgeReceiver};
