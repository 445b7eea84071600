//! Door controller orchestration.
//!
//! The controller owns the activation window, the handshake detector and
//! the unlock cycle. Every button press goes through
//! [`DoorController::on_button_pressed`]:
//!
//! ```text
//!   press ──► activated? ──yes──────────────────────────► unlock
//!                │no
//!                ▼
//!             occupied? ──yes───────────────────────────► unlock
//!                │no
//!                ▼
//!             handshake enabled? ──yes──► record_event ──success──► unlock
//!                │no
//!                ▼
//!             ignored
//! ```
//!
//! State is guarded by short-lived `std::sync::Mutex` locks that are never
//! held across an `.await`, so a controller can be shared behind an `Arc`
//! between the event pump and operator-facing callers.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use oniondoor_controller::DoorController;
//! use oniondoor_hardware::mock::MockDigitalPort;
//!
//! #[tokio::main]
//! async fn main() -> oniondoor_controller::Result<()> {
//!     let (port, _handle) = MockDigitalPort::new();
//!     let controller = DoorController::builder(Arc::new(port)).build()?;
//!
//!     controller.activate(Duration::from_secs(120));
//!     assert!(controller.is_activated());
//!     Ok(())
//! }
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use oniondoor_core::{Clock, SystemClock};
use oniondoor_hardware::{DeviceCounter, DigitalIo};
use serde::Serialize;
use tracing::debug;

use crate::activation::ActivationWindow;
use crate::config::DoorConfig;
use crate::error::Result;
use crate::handshake::{HandshakeOutcome, HandshakeState, SecretHandshake};
use crate::presence::{NoGateway, PresenceCheck};
use crate::unlock::{UnlockCycle, UnlockPhase, UnlockTask};

/// Which branch a button press took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressPath {
    /// The activation window was open.
    Activated,

    /// The presence check reported occupancy.
    Occupied,

    /// The press was fed to the handshake detector.
    Handshake(HandshakeOutcome),

    /// Not activated, not occupied, handshake disabled.
    Ignored,
}

/// What a button press did.
#[derive(Debug)]
pub struct PressOutcome {
    pub path: PressPath,

    /// The unlock cycle launched by this press, if any.
    ///
    /// `None` when the press did not call for an unlock or a cycle was
    /// already in flight.
    pub unlock: Option<UnlockTask>,
}

impl PressOutcome {
    /// Whether this press launched a new unlock cycle.
    pub fn triggered_unlock(&self) -> bool {
        self.unlock.is_some()
    }
}

/// Point-in-time view of the controller for operator surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DoorStatus {
    pub activated: bool,
    pub active_until: Option<DateTime<Utc>>,

    /// An unlock cycle is in flight.
    pub unlocking: bool,
}

/// The door access controller.
pub struct DoorController<P, C = NoGateway> {
    config: DoorConfig,
    clock: Arc<dyn Clock>,
    activation: Mutex<ActivationWindow>,
    handshake: Option<Mutex<SecretHandshake>>,
    presence: PresenceCheck<C>,
    unlock: UnlockCycle<P>,
    port: Arc<P>,
}

impl<P: DigitalIo + 'static> DoorController<P> {
    /// Start building a controller driving `port`.
    pub fn builder(port: Arc<P>) -> DoorControllerBuilder<P> {
        DoorControllerBuilder {
            port,
            config: DoorConfig::default(),
            clock: Arc::new(SystemClock),
            counter: None,
        }
    }
}

impl<P, C> DoorController<P, C>
where
    P: DigitalIo + 'static,
    C: DeviceCounter,
{
    /// Handle a debounced press captured at `at`.
    ///
    /// Activation is judged against the capture time, not the processing
    /// time. The presence check is only consulted when the window is closed.
    pub async fn on_button_pressed(&self, at: DateTime<Utc>) -> PressOutcome {
        let activated = self.activation().is_activated(at);

        let path = if activated {
            debug!(path = "activation", "Door button pressed while activated");
            PressPath::Activated
        } else if self.presence.is_occupied().await {
            debug!(path = "presence", "Door button pressed while activated");
            PressPath::Occupied
        } else {
            debug!("Door button pressed while not activated");
            match &self.handshake {
                Some(handshake) => {
                    let outcome = lock(handshake).record_event(at);
                    PressPath::Handshake(outcome)
                }
                None => PressPath::Ignored,
            }
        };

        let unlock = match path {
            PressPath::Activated | PressPath::Occupied => self.unlock_door(),
            PressPath::Handshake(outcome) if outcome.is_success() => self.unlock_door(),
            _ => None,
        };

        PressOutcome { path, unlock }
    }

    /// Trigger an unlock cycle (manual override).
    ///
    /// Returns `None` if a cycle is already in flight.
    pub fn unlock_door(&self) -> Option<UnlockTask> {
        self.unlock.trigger()
    }

    /// Open the activation window for `period` from now.
    pub fn activate(&self, period: Duration) -> DateTime<Utc> {
        let until = self.activation().activate(self.clock.now(), period);
        debug!("Door activated until {until}");
        until
    }

    /// Close the activation window. Does not interrupt a running unlock.
    pub fn deactivate(&self) {
        self.activation().deactivate();
        debug!("Door deactivated");
    }

    pub fn is_activated(&self) -> bool {
        self.activation().is_activated(self.clock.now())
    }

    /// Deadline of the activation window, if it is still open.
    pub fn active_until(&self) -> Option<DateTime<Utc>> {
        let mut activation = self.activation();
        if activation.is_activated(self.clock.now()) {
            activation.active_until()
        } else {
            None
        }
    }

    pub fn status(&self) -> DoorStatus {
        let active_until = self.active_until();
        DoorStatus {
            activated: active_until.is_some(),
            active_until,
            unlocking: self.unlock.is_unlocked(),
        }
    }

    /// Whether an unlock cycle is in flight.
    pub fn is_unlocked(&self) -> bool {
        self.unlock.is_unlocked()
    }

    pub fn unlock_phase(&self) -> UnlockPhase {
        self.unlock.phase()
    }

    /// Drive the relay to its released level.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the write fails.
    pub async fn lock_output(&self) -> Result<()> {
        self.unlock.lock().await
    }

    /// Wait for an in-flight unlock cycle to finish.
    pub async fn wait_until_locked(&self) {
        self.unlock.wait_until_locked().await
    }

    /// `None` when the handshake is disabled.
    pub fn handshake_state(&self) -> Option<HandshakeState> {
        self.handshake.as_ref().map(|h| lock(h).state())
    }

    pub fn presence_enabled(&self) -> bool {
        self.presence.is_enabled()
    }

    pub fn config(&self) -> &DoorConfig {
        &self.config
    }

    pub fn port(&self) -> &Arc<P> {
        &self.port
    }

    /// Current time according to the controller's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn activation(&self) -> MutexGuard<'_, ActivationWindow> {
        lock(&self.activation)
    }
}

impl<P, C> std::fmt::Debug for DoorController<P, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DoorController")
            .field("config", &self.config)
            .field("activation", &*lock(&self.activation))
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Builder for [`DoorController`].
pub struct DoorControllerBuilder<P, C = NoGateway> {
    port: Arc<P>,
    config: DoorConfig,
    clock: Arc<dyn Clock>,
    counter: Option<C>,
}

impl<P, C> DoorControllerBuilder<P, C>
where
    P: DigitalIo + 'static,
    C: DeviceCounter,
{
    pub fn config(mut self, config: DoorConfig) -> Self {
        self.config = config;
        self
    }

    /// Clock for activation expiry and operator-initiated timestamps.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Device counter backing the presence check.
    pub fn presence<D: DeviceCounter>(self, counter: D) -> DoorControllerBuilder<P, D> {
        DoorControllerBuilder {
            port: self.port,
            config: self.config,
            clock: self.clock,
            counter: Some(counter),
        }
    }

    /// Validate the configuration and build the controller.
    ///
    /// # Errors
    ///
    /// Returns [`DoorError::Config`](crate::DoorError::Config) if the
    /// configuration is contradictory.
    pub fn build(self) -> Result<DoorController<P, C>> {
        let config = self.config;
        config.validate()?;

        let handshake = config
            .handshake_enabled
            .then(|| Mutex::new(SecretHandshake::new(config.handshake_window)));
        let presence = PresenceCheck::new(config.presence, self.counter);
        let unlock = UnlockCycle::new(
            Arc::clone(&self.port),
            config.output_pin,
            config.output_polarity,
            config.unlock_timing(),
        );

        Ok(DoorController {
            config,
            clock: self.clock,
            activation: Mutex::new(ActivationWindow::new()),
            handshake,
            presence,
            unlock,
            port: self.port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HandshakeWindow, PresenceConfig};
    use crate::error::DoorError;
    use oniondoor_core::ManualClock;
    use oniondoor_hardware::mock::{MockDeviceCounter, MockDigitalPort};

    fn controller(config: DoorConfig) -> (DoorController<MockDigitalPort>, ManualClock) {
        let clock = ManualClock::default();
        let (port, _handle) = MockDigitalPort::new();
        let controller = DoorController::builder(Arc::new(port))
            .config(config)
            .clock(Arc::new(clock.clone()))
            .build()
            .unwrap();
        (controller, clock)
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let (port, _handle) = MockDigitalPort::new();
        let result = DoorController::builder(Arc::new(port))
            .config(DoorConfig {
                handshake_window: HandshakeWindow {
                    min_seconds: 20,
                    max_seconds: 5,
                },
                ..DoorConfig::default()
            })
            .build();

        assert!(matches!(result, Err(DoorError::Config(_))));
    }

    #[test]
    fn test_activation_expires_lazily() {
        let (controller, clock) = controller(DoorConfig::default());

        let until = controller.activate(Duration::from_secs(120));
        assert_eq!(controller.active_until(), Some(until));
        assert!(controller.status().activated);

        clock.advance(Duration::from_secs(120));
        assert!(!controller.is_activated());
        assert_eq!(controller.active_until(), None);
    }

    #[test]
    fn test_zero_period_is_immediately_expired() {
        let (controller, _clock) = controller(DoorConfig::default());

        controller.activate(Duration::ZERO);
        assert!(!controller.is_activated());
    }

    #[test]
    fn test_deactivate() {
        let (controller, _clock) = controller(DoorConfig::default());

        controller.activate(Duration::from_secs(120));
        controller.deactivate();

        assert_eq!(
            controller.status(),
            DoorStatus {
                activated: false,
                active_until: None,
                unlocking: false,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_press_without_credentials_is_ignored() {
        let (controller, clock) = controller(DoorConfig::default());

        let outcome = controller.on_button_pressed(clock.now()).await;

        assert_eq!(outcome.path, PressPath::Ignored);
        assert!(!outcome.triggered_unlock());
        assert_eq!(controller.handshake_state(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_handshake_press_never_unlocks() {
        let (controller, clock) = controller(DoorConfig {
            handshake_enabled: true,
            ..DoorConfig::default()
        });

        let outcome = controller.on_button_pressed(clock.now()).await;

        assert_eq!(outcome.path, PressPath::Handshake(HandshakeOutcome::Pending));
        assert!(!outcome.triggered_unlock());
        assert!(matches!(
            controller.handshake_state(),
            Some(HandshakeState::Waiting { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_activated_press_skips_handshake() {
        let (controller, clock) = controller(DoorConfig {
            handshake_enabled: true,
            ..DoorConfig::default()
        });
        controller.activate(Duration::from_secs(120));

        let outcome = controller.on_button_pressed(clock.now()).await;

        assert_eq!(outcome.path, PressPath::Activated);
        assert!(outcome.triggered_unlock());
        assert_eq!(controller.handshake_state(), Some(HandshakeState::Idle));
    }

    #[tokio::test(start_paused = true)]
    async fn test_press_judged_at_capture_time() {
        let (controller, clock) = controller(DoorConfig::default());
        let captured = clock.now();
        controller.activate(Duration::from_secs(10));

        clock.advance(Duration::from_secs(30));
        let outcome = controller.on_button_pressed(captured).await;

        assert_eq!(outcome.path, PressPath::Activated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_presence_path() {
        let clock = ManualClock::default();
        let (port, _handle) = MockDigitalPort::new();
        let (counter, devices) = MockDeviceCounter::new(5);
        let controller = DoorController::builder(Arc::new(port))
            .config(DoorConfig {
                presence: PresenceConfig {
                    enabled: true,
                    baseline: 3,
                    ..PresenceConfig::default()
                },
                ..DoorConfig::default()
            })
            .clock(Arc::new(clock.clone()))
            .presence(counter)
            .build()
            .unwrap();

        assert!(controller.presence_enabled());
        let outcome = controller.on_button_pressed(clock.now()).await;
        assert_eq!(outcome.path, PressPath::Occupied);
        outcome.unlock.unwrap().wait().await.unwrap();

        devices.set_count(2);
        let outcome = controller.on_button_pressed(clock.now()).await;
        assert_eq!(outcome.path, PressPath::Ignored);
        assert_eq!(devices.queries(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_window_skips_presence_query() {
        let clock = ManualClock::default();
        let (port, _handle) = MockDigitalPort::new();
        let (counter, devices) = MockDeviceCounter::new(0);
        devices.hang_queries(true);
        let controller = DoorController::builder(Arc::new(port))
            .config(DoorConfig {
                presence: PresenceConfig {
                    enabled: true,
                    ..PresenceConfig::default()
                },
                ..DoorConfig::default()
            })
            .clock(Arc::new(clock.clone()))
            .presence(counter)
            .build()
            .unwrap();
        controller.activate(Duration::from_secs(120));

        let outcome = controller.on_button_pressed(clock.now()).await;

        assert_eq!(outcome.path, PressPath::Activated);
        assert!(outcome.triggered_unlock());
        assert_eq!(devices.queries(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_press_during_cycle_does_not_retrigger() {
        let (controller, clock) = controller(DoorConfig::default());
        controller.activate(Duration::from_secs(120));

        let first = controller.on_button_pressed(clock.now()).await;
        let second = controller.on_button_pressed(clock.now()).await;

        assert!(first.triggered_unlock());
        assert_eq!(second.path, PressPath::Activated);
        assert!(!second.triggered_unlock());
        assert!(controller.status().unlocking);
    }
}
