//! Default timing and wiring constants for the door buzzer controller.
//!
//! These values describe the intercom circuit the controller was built for:
//! a push button wired to one digital input and a relay across the door
//! opener switch wired to one digital output. Every value here is only a
//! default; the controller reads the effective values from its configuration.
//!
//! # Unlock Timeline
//!
//! ```text
//! press        +2s (delay)          +3s (hold)
//!   |------------|=====================|
//!   ^            ^                     ^
//!   trigger      relay energized       relay released
//! ```
//!
//! # Handshake Timeline
//!
//! A held buzzer repeats a press about every five seconds. The second press
//! is accepted only in the third five-second period after the first:
//!
//! ```text
//!  t=0s                      t=10s        t=15s
//!   |-------- rejected --------|== accept ==|---- rejected ---->
//!   first press                 (inclusive)
//! ```
//!
//! # Usage
//!
//! ```
//! use oniondoor_core::constants::*;
//! use std::time::Duration;
//!
//! let hold = Duration::from_secs(DEFAULT_UNLOCK_HOLD_SECONDS);
//! assert_eq!(hold, Duration::from_secs(3));
//! assert!(DEFAULT_HANDSHAKE_MIN_SECONDS < DEFAULT_HANDSHAKE_MAX_SECONDS);
//! ```

// ============================================================================
// Wiring
// ============================================================================

/// Input pin the door button is wired to (physical BOARD numbering).
pub const DEFAULT_INPUT_PIN: u8 = 11;

/// Output pin driving the door opener relay (physical BOARD numbering).
pub const DEFAULT_OUTPUT_PIN: u8 = 13;

/// Debounce period applied by the transport to button edges, in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 200;

// ============================================================================
// Unlock Cycle
// ============================================================================

/// Delay between an unlock trigger and energizing the relay, in milliseconds.
///
/// Paces the release so it reads as a deliberate unlock rather than an
/// instant jolt.
pub const DEFAULT_UNLOCK_DELAY_MS: u64 = 2000;

/// How long the relay stays energized, in seconds.
pub const DEFAULT_UNLOCK_HOLD_SECONDS: u64 = 3;

// ============================================================================
// Handshake
// ============================================================================

/// Earliest accepted second press after the first, in seconds (inclusive).
pub const DEFAULT_HANDSHAKE_MIN_SECONDS: u64 = 10;

/// Latest accepted second press after the first, in seconds (inclusive).
pub const DEFAULT_HANDSHAKE_MAX_SECONDS: u64 = 15;

// ============================================================================
// Activation
// ============================================================================

/// Activation period used when an operator supplies no usable period, in seconds.
pub const DEFAULT_ACTIVATION_SECONDS: u64 = 2 * 60;

// ============================================================================
// Presence
// ============================================================================

/// How long a press waits for the gateway's device count, in milliseconds.
///
/// A gateway that has not answered by then counts as "not occupied".
pub const DEFAULT_PRESENCE_TIMEOUT_MS: u64 = 500;

// ============================================================================
// Channels
// ============================================================================

/// Capacity of the bounded channel carrying press events from the transport.
pub const EDGE_CHANNEL_CAPACITY: usize = 32;
