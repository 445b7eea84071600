//! Mock digital I/O port for testing and development.
//!
//! This module provides a simulated port that can be driven programmatically
//! without a GPIO header. Tests press the button through a
//! [`MockDigitalPortHandle`] and inspect every level the controller wrote.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use oniondoor_core::constants::EDGE_CHANNEL_CAPACITY;
use oniondoor_core::{Clock, Level, PinId, PressEvent, SystemClock};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::{
    HardwareError, Result,
    traits::{DigitalIo, EdgeReceiver},
};

/// A single output write recorded by the mock port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinWrite {
    /// Pin that was driven.
    pub pin: PinId,

    /// Level it was driven to.
    pub level: Level,

    /// Runtime instant of the write (follows paused tokio time in tests).
    pub at: Instant,
}

#[derive(Debug)]
struct EdgeSubscription {
    tx: mpsc::Sender<PressEvent>,
    debounce: chrono::Duration,
    last_delivered: Option<DateTime<Utc>>,
}

struct Shared {
    name: String,
    clock: Arc<dyn Clock>,
    subscriptions: Mutex<HashMap<PinId, EdgeSubscription>>,
    writes: Mutex<Vec<PinWrite>>,
    levels: Mutex<HashMap<PinId, Level>>,
    fail_writes: AtomicBool,
    fail_subscribe: AtomicBool,
}

impl Shared {
    fn subscriptions(&self) -> MutexGuard<'_, HashMap<PinId, EdgeSubscription>> {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn writes(&self) -> MutexGuard<'_, Vec<PinWrite>> {
        self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn levels(&self) -> MutexGuard<'_, HashMap<PinId, Level>> {
        self.levels.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Mock digital I/O port.
///
/// Edges injected through the handle are debounced against their capture
/// timestamps, exactly as a real transport would before handing them to the
/// controller.
///
/// # Examples
///
/// ```
/// use oniondoor_core::{Level, PinId};
/// use oniondoor_hardware::mock::MockDigitalPort;
/// use oniondoor_hardware::DigitalIo;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> oniondoor_hardware::Result<()> {
///     let (port, handle) = MockDigitalPort::new();
///     let button = PinId::new(11).unwrap();
///     let relay = PinId::new(13).unwrap();
///
///     let mut presses = port.subscribe_edge(button, Duration::from_millis(200)).await?;
///     handle.press(button).await?;
///     assert!(presses.recv().await.is_some());
///
///     port.write(relay, Level::High).await?;
///     assert_eq!(handle.level(relay), Some(Level::High));
///     Ok(())
/// }
/// ```
pub struct MockDigitalPort {
    shared: Arc<Shared>,
}

impl MockDigitalPort {
    /// Create a new mock port stamping presses with the system clock.
    ///
    /// Returns a tuple of (MockDigitalPort, MockDigitalPortHandle) where the
    /// handle can be used to press the button and inspect writes.
    pub fn new() -> (Self, MockDigitalPortHandle) {
        Self::with_clock("Mock Digital Port", Arc::new(SystemClock))
    }

    /// Create a new mock port with a custom name and capture clock.
    pub fn with_clock(
        name: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> (Self, MockDigitalPortHandle) {
        let shared = Arc::new(Shared {
            name: name.into(),
            clock,
            subscriptions: Mutex::new(HashMap::new()),
            writes: Mutex::new(Vec::new()),
            levels: Mutex::new(HashMap::new()),
            fail_writes: AtomicBool::new(false),
            fail_subscribe: AtomicBool::new(false),
        });

        let port = Self {
            shared: Arc::clone(&shared),
        };
        let handle = MockDigitalPortHandle { shared };

        (port, handle)
    }
}

impl std::fmt::Debug for MockDigitalPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockDigitalPort")
            .field("name", &self.shared.name)
            .finish_non_exhaustive()
    }
}

impl DigitalIo for MockDigitalPort {
    async fn subscribe_edge(&self, pin: PinId, debounce: Duration) -> Result<EdgeReceiver> {
        if self.shared.fail_subscribe.load(Ordering::SeqCst) {
            return Err(HardwareError::subscribe_failed(pin, "injected failure"));
        }

        let debounce = chrono::Duration::from_std(debounce)
            .map_err(|e| HardwareError::subscribe_failed(pin, e.to_string()))?;
        let (tx, rx) = mpsc::channel(EDGE_CHANNEL_CAPACITY);

        self.shared.subscriptions().insert(
            pin,
            EdgeSubscription {
                tx,
                debounce,
                last_delivered: None,
            },
        );
        debug!("{}: edge detection on {}", self.shared.name, pin);

        Ok(rx)
    }

    async fn write(&self, pin: PinId, level: Level) -> Result<()> {
        if self.shared.fail_writes.load(Ordering::SeqCst) {
            return Err(HardwareError::write_failed(pin, "injected failure"));
        }

        self.shared.writes().push(PinWrite {
            pin,
            level,
            at: Instant::now(),
        });
        self.shared.levels().insert(pin, level);
        trace!("{}: {} -> {}", self.shared.name, pin, level);

        Ok(())
    }
}

/// Handle for controlling a mock port.
///
/// The handle can be cloned and shared across tasks.
#[derive(Clone)]
pub struct MockDigitalPortHandle {
    shared: Arc<Shared>,
}

impl MockDigitalPortHandle {
    /// Press the button on `pin` now, according to the port's clock.
    ///
    /// Returns `true` if the press was delivered and `false` if it fell
    /// inside the debounce period of the previous delivered press.
    ///
    /// # Errors
    ///
    /// Returns an error if nobody subscribed to the pin or the subscriber
    /// has gone away.
    pub async fn press(&self, pin: PinId) -> Result<bool> {
        let at = self.shared.clock.now();
        self.press_at(pin, at).await
    }

    /// Press the button on `pin` with an explicit capture timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if nobody subscribed to the pin or the subscriber
    /// has gone away.
    pub async fn press_at(&self, pin: PinId, at: DateTime<Utc>) -> Result<bool> {
        let tx = {
            let mut subscriptions = self.shared.subscriptions();
            let subscription = subscriptions
                .get_mut(&pin)
                .ok_or_else(|| HardwareError::not_subscribed(pin))?;

            if let Some(last) = subscription.last_delivered
                && at - last < subscription.debounce
            {
                trace!("{}: bounce on {} suppressed", self.shared.name, pin);
                return Ok(false);
            }

            subscription.last_delivered = Some(at);
            subscription.tx.clone()
        };

        tx.send(PressEvent::new(at))
            .await
            .map_err(|_| HardwareError::disconnected("Edge subscriber dropped"))?;

        Ok(true)
    }

    /// Make every following write fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.shared.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every following subscription fail (or succeed again).
    pub fn fail_subscribe(&self, fail: bool) {
        self.shared.fail_subscribe.store(fail, Ordering::SeqCst);
    }

    /// All writes so far, oldest first.
    pub fn writes(&self) -> Vec<PinWrite> {
        self.shared.writes().clone()
    }

    /// Writes to a single pin, oldest first.
    pub fn writes_to(&self, pin: PinId) -> Vec<PinWrite> {
        self.shared
            .writes()
            .iter()
            .filter(|w| w.pin == pin)
            .copied()
            .collect()
    }

    /// Last level written to `pin`, if any.
    pub fn level(&self, pin: PinId) -> Option<Level> {
        self.shared.levels().get(&pin).copied()
    }

    /// Whether some subscriber is listening on `pin`.
    pub fn is_subscribed(&self, pin: PinId) -> bool {
        self.shared
            .subscriptions()
            .get(&pin)
            .is_some_and(|s| !s.tx.is_closed())
    }

    /// Get the port name.
    pub fn name(&self) -> &str {
        &self.shared.name
    }
}

impl std::fmt::Debug for MockDigitalPortHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockDigitalPortHandle")
            .field("name", &self.shared.name)
            .finish_non_exhaustive()
    }
}
