//! Error types for the door controller.

use oniondoor_hardware::HardwareError;

/// Result type alias for controller operations.
pub type Result<T> = std::result::Result<T, DoorError>;

/// Errors surfaced by the door controller.
///
/// Transport failures are propagated as-is; the controller never retries.
#[derive(Debug, thiserror::Error)]
pub enum DoorError {
    /// The configuration is unusable.
    #[error(transparent)]
    Config(#[from] oniondoor_core::Error),

    /// The digital I/O port or presence gateway failed.
    #[error(transparent)]
    Hardware(#[from] HardwareError),

    /// A background unlock cycle was cancelled or panicked.
    #[error("Unlock task failed: {0}")]
    UnlockTask(String),
}
