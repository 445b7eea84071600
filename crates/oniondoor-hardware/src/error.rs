//! Error types for transport operations.
//!
//! This module defines errors raised by the digital I/O port and the
//! presence collaborator. The controller never retries them; it propagates
//! them to whoever started the operation.

use oniondoor_core::PinId;

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during hardware device operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Device is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Driving an output pin failed.
    #[error("Write to {pin} failed: {message}")]
    WriteFailed { pin: PinId, message: String },

    /// Registering for edge events on an input pin failed.
    #[error("Subscribe to {pin} failed: {message}")]
    SubscribeFailed { pin: PinId, message: String },

    /// An edge was injected on a pin nobody subscribed to.
    #[error("No edge subscription on {pin}")]
    NotSubscribed { pin: PinId },

    /// Querying the presence gateway failed.
    #[error("Device count query failed: {message}")]
    QueryFailed { message: String },

    /// A collaborator did not answer in time.
    #[error("Operation timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new write failure.
    pub fn write_failed(pin: PinId, message: impl Into<String>) -> Self {
        Self::WriteFailed {
            pin,
            message: message.into(),
        }
    }

    /// Create a new subscribe failure.
    pub fn subscribe_failed(pin: PinId, message: impl Into<String>) -> Self {
        Self::SubscribeFailed {
            pin,
            message: message.into(),
        }
    }

    /// Create a new missing subscription error.
    pub fn not_subscribed(pin: PinId) -> Self {
        Self::NotSubscribed { pin }
    }

    /// Create a new device count query failure.
    pub fn query_failed(message: impl Into<String>) -> Self {
        Self::QueryFailed {
            message: message.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pin(n: u8) -> PinId {
        PinId::new(n).unwrap()
    }

    #[test]
    fn test_disconnected_error() {
        let error = HardwareError::disconnected("gpiochip0");
        assert!(matches!(error, HardwareError::Disconnected { .. }));
        assert_eq!(error.to_string(), "Device disconnected: gpiochip0");
    }

    #[test]
    fn test_write_failed_error() {
        let error = HardwareError::write_failed(pin(13), "bus error");
        assert!(matches!(error, HardwareError::WriteFailed { .. }));
        assert_eq!(error.to_string(), "Write to pin 13 failed: bus error");
    }

    #[test]
    fn test_subscribe_failed_error() {
        let error = HardwareError::subscribe_failed(pin(11), "edge detection busy");
        assert_eq!(
            error.to_string(),
            "Subscribe to pin 11 failed: edge detection busy"
        );
    }

    #[test]
    fn test_not_subscribed_error() {
        let error = HardwareError::not_subscribed(pin(11));
        assert_eq!(error.to_string(), "No edge subscription on pin 11");
    }

    #[test]
    fn test_query_failed_error() {
        let error = HardwareError::query_failed("gateway unreachable");
        assert_eq!(
            error.to_string(),
            "Device count query failed: gateway unreachable"
        );
    }

    #[test]
    fn test_timeout_error() {
        let error = HardwareError::timeout(3000);
        assert_eq!(error.to_string(), "Operation timeout after 3000ms");
    }
}
