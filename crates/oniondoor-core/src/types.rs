use crate::{
    Result,
    constants::{DEFAULT_INPUT_PIN, DEFAULT_OUTPUT_PIN},
    error::Error,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Highest physical pin number on a 40-pin expansion header.
const MAX_PIN: u8 = 40;

/// Digital I/O pin identifier (physical header numbering, 1-40).
///
/// The controller treats the number as opaque and only hands it to the
/// transport. Electrical configuration such as pull direction belongs to
/// the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PinId(u8);

impl PinId {
    /// Pin the door button is wired to by default.
    pub const DEFAULT_INPUT: PinId = PinId(DEFAULT_INPUT_PIN);

    /// Pin the door opener relay is wired to by default.
    pub const DEFAULT_OUTPUT: PinId = PinId(DEFAULT_OUTPUT_PIN);

    /// Create a new pin identifier with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidPin` if the number is outside 1-40.
    pub fn new(pin: u8) -> Result<Self> {
        if !(1..=MAX_PIN).contains(&pin) {
            return Err(Error::InvalidPin(format!(
                "Pin must be 1-{MAX_PIN}, got {pin}"
            )));
        }
        Ok(PinId(pin))
    }

    /// Get the raw pin number.
    #[must_use]
    pub fn as_u8(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "pin {}", self.0)
    }
}

impl std::str::FromStr for PinId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let pin: u8 = s
            .trim()
            .parse()
            .map_err(|_| Error::InvalidPin(format!("Not a pin number: {s}")))?;
        PinId::new(pin)
    }
}

impl TryFrom<u8> for PinId {
    type Error = Error;

    fn try_from(pin: u8) -> Result<Self> {
        PinId::new(pin)
    }
}

impl From<PinId> for u8 {
    fn from(pin: PinId) -> Self {
        pin.0
    }
}

/// Logic level of a digital pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// The opposite level.
    #[must_use]
    pub fn inverted(self) -> Self {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Level::Low => write!(f, "LOW"),
            Level::High => write!(f, "HIGH"),
        }
    }
}

/// A debounced button press, stamped when the edge was captured.
///
/// Timing decisions are made against `at`, never against the time the
/// event happens to be processed, so queueing delay does not skew the
/// handshake window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PressEvent {
    /// When the button transitioned to pressed.
    pub at: DateTime<Utc>,
}

impl PressEvent {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self { at }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("11", 11)]
    #[case("13", 13)]
    #[case(" 1 ", 1)]
    #[case("40", 40)]
    fn test_pin_id_valid(#[case] input: &str, #[case] expected: u8) {
        let pin: PinId = input.parse().unwrap();
        assert_eq!(pin.as_u8(), expected);
    }

    #[rstest]
    #[case("0")]
    #[case("41")]
    #[case("abc")]
    #[case("")]
    fn test_pin_id_invalid(#[case] input: &str) {
        assert!(input.parse::<PinId>().is_err());
    }

    #[test]
    fn test_pin_id_display() {
        assert_eq!(PinId::new(13).unwrap().to_string(), "pin 13");
    }

    #[test]
    fn test_pin_id_serde_validates() {
        let pin: PinId = serde_json::from_str("11").unwrap();
        assert_eq!(pin.as_u8(), 11);
        assert_eq!(serde_json::to_string(&pin).unwrap(), "11");

        assert!(serde_json::from_str::<PinId>("99").is_err());
    }

    #[test]
    fn test_level_inverted() {
        assert_eq!(Level::Low.inverted(), Level::High);
        assert_eq!(Level::High.inverted(), Level::Low);
    }

    #[test]
    fn test_level_display() {
        assert_eq!(Level::High.to_string(), "HIGH");
        assert_eq!(Level::Low.to_string(), "LOW");
    }
}
