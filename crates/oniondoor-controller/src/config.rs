//! Controller configuration.
//!
//! [`DoorConfig`] is plain data: it can be deserialized from any serde
//! format, built from command-line flags, or constructed in tests. Call
//! [`DoorConfig::validate`] before handing it to a controller (the
//! controller builder does this for you).
//!
//! # Examples
//!
//! ```
//! use oniondoor_controller::config::DoorConfig;
//! use std::time::Duration;
//!
//! let config = DoorConfig {
//!     handshake_enabled: true,
//!     ..DoorConfig::default()
//! };
//!
//! config.validate().unwrap();
//! assert_eq!(config.unlock_timing().hold, Duration::from_secs(3));
//! ```

use std::time::Duration;

use oniondoor_core::constants::{
    DEFAULT_DEBOUNCE_MS, DEFAULT_HANDSHAKE_MAX_SECONDS, DEFAULT_HANDSHAKE_MIN_SECONDS,
    DEFAULT_PRESENCE_TIMEOUT_MS, DEFAULT_UNLOCK_DELAY_MS, DEFAULT_UNLOCK_HOLD_SECONDS,
};
use oniondoor_core::{Error, Level, PinId, Result};
use serde::{Deserialize, Serialize};

use crate::unlock::UnlockTiming;

/// Which output level energizes the door opener relay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputPolarity {
    /// HIGH energizes, LOW releases.
    #[default]
    ActiveHigh,

    /// LOW energizes, HIGH releases.
    ActiveLow,
}

impl OutputPolarity {
    /// Level that energizes the relay (door unlocked).
    pub fn energized(self) -> Level {
        match self {
            Self::ActiveHigh => Level::High,
            Self::ActiveLow => Level::Low,
        }
    }

    /// Level that releases the relay (door locked).
    pub fn released(self) -> Level {
        self.energized().inverted()
    }
}

/// Accepted spacing between the two presses of a handshake, in seconds.
///
/// Both bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeWindow {
    pub min_seconds: u64,
    pub max_seconds: u64,
}

impl HandshakeWindow {
    /// Whether `elapsed` falls inside the window.
    ///
    /// # Examples
    ///
    /// ```
    /// use oniondoor_controller::config::HandshakeWindow;
    ///
    /// let window = HandshakeWindow::default();
    /// assert!(window.contains(chrono::Duration::seconds(10)));
    /// assert!(window.contains(chrono::Duration::seconds(15)));
    /// assert!(!window.contains(chrono::Duration::milliseconds(15_010)));
    /// ```
    pub fn contains(&self, elapsed: chrono::Duration) -> bool {
        elapsed >= seconds(self.min_seconds) && elapsed <= seconds(self.max_seconds)
    }
}

impl Default for HandshakeWindow {
    fn default() -> Self {
        Self {
            min_seconds: DEFAULT_HANDSHAKE_MIN_SECONDS,
            max_seconds: DEFAULT_HANDSHAKE_MAX_SECONDS,
        }
    }
}

fn seconds(s: u64) -> chrono::Duration {
    chrono::Duration::from_std(Duration::from_secs(s)).unwrap_or(chrono::Duration::MAX)
}

/// How the live device count is compared against the baseline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineComparison {
    /// Occupied when the count is strictly above the baseline.
    #[default]
    GreaterThan,

    /// Occupied when the count is at or above the baseline.
    AtLeast,
}

impl BaselineComparison {
    /// Whether `count` indicates occupancy against `baseline`.
    pub fn is_occupied(self, count: u32, baseline: u32) -> bool {
        match self {
            Self::GreaterThan => count > baseline,
            Self::AtLeast => count >= baseline,
        }
    }
}

/// Presence check settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    /// Consult the gateway on presses outside an activation window.
    pub enabled: bool,

    /// Device count of an empty office.
    pub baseline: u32,

    pub comparison: BaselineComparison,

    /// Upper bound on one device count query.
    pub timeout_ms: u64,
}

impl PresenceConfig {
    /// Query timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            baseline: 0,
            comparison: BaselineComparison::default(),
            timeout_ms: DEFAULT_PRESENCE_TIMEOUT_MS,
        }
    }
}

/// Complete door controller configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoorConfig {
    /// Pin the door button is wired to.
    pub input_pin: PinId,

    /// Pin driving the door opener relay.
    pub output_pin: PinId,

    /// Debounce period requested from the transport.
    pub debounce_ms: u64,

    /// Delay between trigger and energizing the relay.
    pub unlock_delay_ms: u64,

    /// How long the relay stays energized.
    pub unlock_hold_seconds: u64,

    pub output_polarity: OutputPolarity,

    /// Accept the two-press handshake as an unlock credential.
    pub handshake_enabled: bool,

    pub handshake_window: HandshakeWindow,

    pub presence: PresenceConfig,
}

impl DoorConfig {
    /// Check the configuration for contradictions.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The handshake window minimum exceeds its maximum
    /// - The button and the relay share a pin
    pub fn validate(&self) -> Result<()> {
        let window = self.handshake_window;
        if window.min_seconds > window.max_seconds {
            return Err(Error::InvalidHandshakeWindow {
                min_seconds: window.min_seconds,
                max_seconds: window.max_seconds,
            });
        }

        if self.input_pin == self.output_pin {
            return Err(Error::InvalidConfig(format!(
                "button and relay both wired to {}",
                self.input_pin
            )));
        }

        Ok(())
    }

    /// Debounce period as a duration.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Delay and hold of the unlock cycle.
    pub fn unlock_timing(&self) -> UnlockTiming {
        UnlockTiming {
            delay: Duration::from_millis(self.unlock_delay_ms),
            hold: Duration::from_secs(self.unlock_hold_seconds),
        }
    }
}

impl Default for DoorConfig {
    fn default() -> Self {
        Self {
            input_pin: PinId::DEFAULT_INPUT,
            output_pin: PinId::DEFAULT_OUTPUT,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            unlock_delay_ms: DEFAULT_UNLOCK_DELAY_MS,
            unlock_hold_seconds: DEFAULT_UNLOCK_HOLD_SECONDS,
            output_polarity: OutputPolarity::default(),
            handshake_enabled: false,
            handshake_window: HandshakeWindow::default(),
            presence: PresenceConfig::default(),
        }
    }
}
