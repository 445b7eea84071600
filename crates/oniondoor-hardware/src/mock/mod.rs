//! Mock transport implementations for testing and development.
//!
//! This module provides simulated collaborators that can be controlled
//! programmatically without a GPIO header or a network gateway.

pub mod port;
pub mod presence;

// Re-export commonly used types
pub use port::{MockDigitalPort, MockDigitalPortHandle, PinWrite};
pub use presence::{MockDeviceCounter, MockDeviceCounterHandle};
