//! Non-reentrant unlock sequencing.
//!
//! ```text
//!            trigger          after delay          after hold
//!   Locked ──────────► Pending ───────────► Unlocked ─────────► Locked
//!                        │ (energize)                (release)
//!                        │
//!   trigger while not Locked: ignored
//! ```
//!
//! The phase doubles as the guard flag. Leaving `Locked` is a single
//! compare-and-swap, so two concurrent triggers can never both launch a
//! cycle. The phase returns to `Locked` only once the release write has
//! completed (or failed); a cycle never outlives its guard.

use std::future::Future;
use std::pin::pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use oniondoor_core::constants::{DEFAULT_UNLOCK_DELAY_MS, DEFAULT_UNLOCK_HOLD_SECONDS};
use oniondoor_core::PinId;
use oniondoor_hardware::DigitalIo;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::config::OutputPolarity;
use crate::error::{DoorError, Result};

/// Delay and hold durations of one unlock cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlockTiming {
    /// Wait between trigger and energizing the relay.
    pub delay: Duration,

    /// How long the relay stays energized.
    pub hold: Duration,
}

impl Default for UnlockTiming {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(DEFAULT_UNLOCK_DELAY_MS),
            hold: Duration::from_secs(DEFAULT_UNLOCK_HOLD_SECONDS),
        }
    }
}

/// Where the unlock cycle currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum UnlockPhase {
    /// No cycle running.
    Locked = 0,

    /// Cycle triggered, waiting out the delay.
    Pending = 1,

    /// Relay energized.
    Unlocked = 2,
}

impl UnlockPhase {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Pending,
            2 => Self::Unlocked,
            _ => Self::Locked,
        }
    }
}

impl std::fmt::Display for UnlockPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Locked => write!(f, "Locked"),
            Self::Pending => write!(f, "Pending"),
            Self::Unlocked => write!(f, "Unlocked"),
        }
    }
}

#[derive(Debug)]
struct Guard {
    phase: AtomicU8,
    released: Notify,
}

impl Guard {
    fn phase(&self) -> UnlockPhase {
        UnlockPhase::from_u8(self.phase.load(Ordering::SeqCst))
    }

    fn try_acquire(&self) -> bool {
        self.phase
            .compare_exchange(
                UnlockPhase::Locked as u8,
                UnlockPhase::Pending as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    fn set(&self, phase: UnlockPhase) {
        self.phase.store(phase as u8, Ordering::SeqCst);
    }
}

/// Returns the phase to `Locked` when the cycle ends, however it ends.
struct PhaseReset(Arc<Guard>);

impl Drop for PhaseReset {
    fn drop(&mut self) {
        self.0.set(UnlockPhase::Locked);
        self.0.released.notify_waiters();
    }
}

/// Handle to a running unlock cycle.
///
/// Dropping it detaches the cycle; it still runs to completion.
#[derive(Debug)]
pub struct UnlockTask(JoinHandle<oniondoor_hardware::Result<()>>);

impl UnlockTask {
    /// Wait for the cycle to finish.
    ///
    /// # Errors
    ///
    /// Returns the first transport error of the cycle, or
    /// [`DoorError::UnlockTask`] if the task panicked or was aborted.
    pub async fn wait(self) -> Result<()> {
        match self.0.await {
            Ok(result) => result.map_err(DoorError::from),
            Err(e) => Err(DoorError::UnlockTask(e.to_string())),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.0.is_finished()
    }
}

/// Drives the relay output through delay, energize, hold and release.
#[derive(Debug)]
pub struct UnlockCycle<P> {
    port: Arc<P>,
    pin: PinId,
    polarity: OutputPolarity,
    timing: UnlockTiming,
    guard: Arc<Guard>,
}

impl<P: DigitalIo + 'static> UnlockCycle<P> {
    pub fn new(port: Arc<P>, pin: PinId, polarity: OutputPolarity, timing: UnlockTiming) -> Self {
        Self {
            port,
            pin,
            polarity,
            timing,
            guard: Arc::new(Guard {
                phase: AtomicU8::new(UnlockPhase::Locked as u8),
                released: Notify::new(),
            }),
        }
    }

    pub fn phase(&self) -> UnlockPhase {
        self.guard.phase()
    }

    /// Whether a cycle is in flight (the guard flag).
    pub fn is_unlocked(&self) -> bool {
        self.phase() != UnlockPhase::Locked
    }

    pub fn timing(&self) -> UnlockTiming {
        self.timing
    }

    /// Start a cycle on a background task.
    ///
    /// Returns `None` without side effects if a cycle is already in flight.
    /// Must be called from within a tokio runtime.
    pub fn trigger(&self) -> Option<UnlockTask> {
        if !self.guard.try_acquire() {
            debug!("Unlock already in progress, ignoring trigger");
            return None;
        }

        let reset = PhaseReset(Arc::clone(&self.guard));
        let port = Arc::clone(&self.port);
        let pin = self.pin;
        let polarity = self.polarity;
        let timing = self.timing;

        let handle = tokio::spawn(async move {
            let result = run_cycle(&*port, pin, polarity, timing, &reset.0).await;
            if let Err(e) = &result {
                error!("Unlock cycle on {pin} failed: {e}");
            }
            drop(reset);
            result
        });

        Some(UnlockTask(handle))
    }

    /// Drive the relay to its released level.
    ///
    /// Does not touch the guard; an in-flight cycle keeps running.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the write fails.
    pub async fn lock(&self) -> Result<()> {
        self.port.write(self.pin, self.polarity.released()).await?;
        Ok(())
    }

    /// Wait until no cycle is in flight.
    pub fn wait_until_locked(&self) -> impl Future<Output = ()> + Send + 'static {
        let guard = Arc::clone(&self.guard);
        async move {
            loop {
                let mut released = pin!(guard.released.notified());
                released.as_mut().enable();
                if guard.phase() == UnlockPhase::Locked {
                    return;
                }
                released.await;
            }
        }
    }
}

async fn run_cycle<P: DigitalIo>(
    port: &P,
    pin: PinId,
    polarity: OutputPolarity,
    timing: UnlockTiming,
    guard: &Guard,
) -> oniondoor_hardware::Result<()> {
    tokio::time::sleep(timing.delay).await;

    debug!("Unlocking the door");
    port.write(pin, polarity.energized()).await?;
    guard.set(UnlockPhase::Unlocked);

    tokio::time::sleep(timing.hold).await;

    debug!("Locking the door");
    port.write(pin, polarity.released()).await
}
