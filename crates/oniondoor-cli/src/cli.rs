//! Command-line definition using clap derive.

use clap::{Parser, ValueEnum};
use oniondoor_controller::{
    BaselineComparison, DoorConfig, HandshakeWindow, OutputPolarity, PresenceConfig,
};
use oniondoor_core::PinId;

#[derive(Debug, Parser)]
#[command(name = "oniondoor", version, about = "Door buzzer controller")]
pub struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "ONIONDOOR_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Header pin the door button is wired to
    #[arg(long, env = "ONIONDOOR_INPUT_PIN", default_value = "11")]
    pub input_pin: PinId,

    /// Header pin driving the door opener relay
    #[arg(long, env = "ONIONDOOR_OUTPUT_PIN", default_value = "13")]
    pub output_pin: PinId,

    /// Button debounce period in milliseconds
    #[arg(long, env = "ONIONDOOR_DEBOUNCE_MS", default_value_t = 200)]
    pub debounce_ms: u64,

    /// Delay before energizing the relay, in milliseconds
    #[arg(long, env = "ONIONDOOR_UNLOCK_DELAY_MS", default_value_t = 2000)]
    pub unlock_delay_ms: u64,

    /// How long the door stays unlocked, in seconds
    #[arg(long, env = "ONIONDOOR_UNLOCK_HOLD_SECONDS", default_value_t = 3)]
    pub unlock_hold_seconds: u64,

    /// Relay output level that unlocks the door
    #[arg(long, env = "ONIONDOOR_POLARITY", value_enum, default_value_t = Polarity::ActiveHigh)]
    pub polarity: Polarity,

    /// Accept the two-press secret handshake
    #[arg(long, env = "ONIONDOOR_ENABLE_HANDSHAKE")]
    pub enable_handshake: bool,

    /// Earliest accepted second press, in seconds after the first
    #[arg(long, env = "ONIONDOOR_HANDSHAKE_MIN", default_value_t = 10)]
    pub handshake_min: u64,

    /// Latest accepted second press, in seconds after the first
    #[arg(long, env = "ONIONDOOR_HANDSHAKE_MAX", default_value_t = 15)]
    pub handshake_max: u64,

    /// Open on any press while the office network looks occupied
    #[arg(long, env = "ONIONDOOR_ENABLE_PRESENCE")]
    pub enable_presence: bool,

    /// Associated device count of an empty office
    #[arg(long, env = "ONIONDOOR_PRESENCE_BASELINE", default_value_t = 0)]
    pub presence_baseline: u32,

    /// How the device count is compared against the baseline
    #[arg(long, env = "ONIONDOOR_PRESENCE_COMPARISON", value_enum, default_value_t = Comparison::GreaterThan)]
    pub presence_comparison: Comparison,

    /// Give up on a gateway that has not answered after this many milliseconds
    #[arg(long, env = "ONIONDOOR_PRESENCE_TIMEOUT_MS", default_value_t = 500)]
    pub presence_timeout_ms: u64,

    /// Simulate a gateway reporting this many associated devices
    #[arg(long, env = "ONIONDOOR_SIMULATED_DEVICES")]
    pub simulated_devices: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

impl From<Polarity> for OutputPolarity {
    fn from(polarity: Polarity) -> Self {
        match polarity {
            Polarity::ActiveHigh => OutputPolarity::ActiveHigh,
            Polarity::ActiveLow => OutputPolarity::ActiveLow,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Comparison {
    GreaterThan,
    AtLeast,
}

impl From<Comparison> for BaselineComparison {
    fn from(comparison: Comparison) -> Self {
        match comparison {
            Comparison::GreaterThan => BaselineComparison::GreaterThan,
            Comparison::AtLeast => BaselineComparison::AtLeast,
        }
    }
}

impl Cli {
    /// Controller configuration described by the flags.
    pub fn door_config(&self) -> DoorConfig {
        DoorConfig {
            input_pin: self.input_pin,
            output_pin: self.output_pin,
            debounce_ms: self.debounce_ms,
            unlock_delay_ms: self.unlock_delay_ms,
            unlock_hold_seconds: self.unlock_hold_seconds,
            output_polarity: self.polarity.into(),
            handshake_enabled: self.enable_handshake,
            handshake_window: HandshakeWindow {
                min_seconds: self.handshake_min,
                max_seconds: self.handshake_max,
            },
            presence: PresenceConfig {
                enabled: self.enable_presence,
                baseline: self.presence_baseline,
                comparison: self.presence_comparison.into(),
                timeout_ms: self.presence_timeout_ms,
            },
        }
    }
}
