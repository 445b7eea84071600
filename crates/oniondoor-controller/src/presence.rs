//! Occupancy check against the network gateway.
//!
//! If more devices than usual are associated to the office network, someone
//! is probably inside and a button press may open the door.

use oniondoor_hardware::{DeviceCounter, HardwareError};
use tracing::{debug, warn};

use crate::config::PresenceConfig;

/// Placeholder counter for controllers without a gateway.
///
/// Every query fails, which the presence check treats as "not occupied".
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGateway;

impl DeviceCounter for NoGateway {
    async fn associated_device_count(&self) -> oniondoor_hardware::Result<u32> {
        Err(HardwareError::query_failed("no gateway configured"))
    }
}

/// Presence check over an optional device counter.
#[derive(Debug)]
pub struct PresenceCheck<C = NoGateway> {
    counter: Option<C>,
    config: PresenceConfig,
}

impl<C: DeviceCounter> PresenceCheck<C> {
    /// Build a check from configuration and a counter.
    ///
    /// A check enabled without a counter is disabled with a warning.
    pub fn new(config: PresenceConfig, counter: Option<C>) -> Self {
        let mut config = config;
        if config.enabled && counter.is_none() {
            warn!("Presence check enabled without a device counter, disabling");
            config.enabled = false;
        }
        Self { counter, config }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn config(&self) -> PresenceConfig {
        self.config
    }

    /// Whether the office looks occupied right now.
    ///
    /// Query failures are logged and reported as not occupied, and so is a
    /// gateway that does not answer within the configured timeout.
    pub async fn is_occupied(&self) -> bool {
        if !self.config.enabled {
            return false;
        }
        let Some(counter) = &self.counter else {
            return false;
        };

        let count = tokio::time::timeout(self.config.timeout(), counter.associated_device_count())
            .await
            .unwrap_or_else(|_| Err(HardwareError::timeout(self.config.timeout_ms)));

        match count {
            Ok(count) if self.config.comparison.is_occupied(count, self.config.baseline) => {
                debug!("{count} devices associated, opening");
                true
            }
            Ok(count) => {
                debug!(
                    "{count} devices associated, baseline is {}",
                    self.config.baseline
                );
                false
            }
            Err(e) => {
                warn!("Presence query failed: {e}");
                false
            }
        }
    }
}
