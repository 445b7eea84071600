//! Transport trait definitions.
//!
//! These traits are the only contact the door controller has with the
//! outside world: a digital I/O port delivering button edges and driving the
//! relay output, and a gateway reporting how many devices are associated to
//! the local network. Pin numbering, pull direction and hardware debounce
//! configuration stay behind these seams.
//!
//! Methods return `impl Future + Send` rather than a bare `async fn` so the
//! controller can drive a port from a spawned tokio task. Implementors may
//! still write the methods as `async fn`.

use std::future::Future;
use std::time::Duration;

use oniondoor_core::{Level, PinId, PressEvent};
use tokio::sync::mpsc;

use crate::error::Result;

/// Receiving end of an edge subscription.
///
/// The channel is bounded; the port owns the sending half and closes it
/// when the subscription ends.
pub type EdgeReceiver = mpsc::Receiver<PressEvent>;

/// Digital I/O port abstraction.
///
/// # Object Safety
///
/// **NOTE**: This trait is NOT object-safe because its methods return
/// `impl Future`. Use generic type parameters:
///
/// ```no_run
/// use oniondoor_core::{Level, PinId};
/// use oniondoor_hardware::{DigitalIo, Result};
///
/// async fn release<P: DigitalIo>(port: &P, relay: PinId) -> Result<()> {
///     port.write(relay, Level::Low).await
/// }
/// ```
pub trait DigitalIo: Send + Sync {
    /// Subscribe to debounced press edges on an input pin.
    ///
    /// Suppressing repeated edges within `debounce` is the port's job; every
    /// event delivered on the returned channel is one distinct press, stamped
    /// at capture.
    ///
    /// # Errors
    ///
    /// Returns an error if edge detection cannot be registered on the pin.
    fn subscribe_edge(
        &self,
        pin: PinId,
        debounce: Duration,
    ) -> impl Future<Output = Result<EdgeReceiver>> + Send;

    /// Drive an output pin to a level.
    ///
    /// # Errors
    ///
    /// Returns an error if the port fails to drive the pin.
    fn write(&self, pin: PinId, level: Level) -> impl Future<Output = Result<()>> + Send;
}

/// Source of the number of devices currently associated to the local
/// network gateway.
///
/// ```no_run
/// use oniondoor_hardware::{DeviceCounter, Result};
///
/// async fn anyone_home<C: DeviceCounter>(counter: &C, baseline: u32) -> Result<bool> {
///     Ok(counter.associated_device_count().await? > baseline)
/// }
/// ```
pub trait DeviceCounter: Send + Sync {
    /// Number of associated devices right now.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway cannot be queried.
    fn associated_device_count(&self) -> impl Future<Output = Result<u32>> + Send;
}
