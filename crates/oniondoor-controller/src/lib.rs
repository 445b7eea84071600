//! Door access controller for the OnionDoor buzzer.
//!
//! A visitor presses the intercom button; the controller decides whether to
//! energize the door opener relay based on:
//!
//! - an operator-opened, time-bounded [activation window](activation),
//! - a [presence check](presence) against the office network gateway,
//! - a two-press [secret handshake](handshake).
//!
//! An accepted press launches one [unlock cycle](unlock) on a background
//! task: a short delay, the relay energized for a few seconds, then
//! released. Overlapping requests are ignored while a cycle is in flight.
//!
//! [`DoorService`] connects a [`DoorController`] to the edge events of a
//! [`DigitalIo`](oniondoor_hardware::DigitalIo) port.

pub mod activation;
pub mod config;
pub mod controller;
pub mod error;
pub mod handshake;
pub mod presence;
pub mod service;
pub mod unlock;

pub use config::{BaselineComparison, DoorConfig, HandshakeWindow, OutputPolarity, PresenceConfig};
pub use controller::{DoorController, DoorControllerBuilder, DoorStatus, PressOutcome, PressPath};
pub use error::{DoorError, Result};
pub use handshake::{HandshakeOutcome, HandshakeState};
pub use presence::NoGateway;
pub use service::{DoorService, DoorServiceHandle};
pub use unlock::{UnlockPhase, UnlockTask, UnlockTiming};
