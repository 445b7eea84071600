//! Mock presence gateway for testing and development.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::{HardwareError, Result, traits::DeviceCounter};

#[derive(Debug)]
struct Shared {
    count: AtomicU32,
    fail: AtomicBool,
    hang: AtomicBool,
    queries: AtomicU32,
}

/// Mock device counter reporting a settable number of associated devices.
///
/// # Examples
///
/// ```
/// use oniondoor_hardware::mock::MockDeviceCounter;
/// use oniondoor_hardware::DeviceCounter;
///
/// #[tokio::main]
/// async fn main() -> oniondoor_hardware::Result<()> {
///     let (counter, handle) = MockDeviceCounter::new(3);
///     assert_eq!(counter.associated_device_count().await?, 3);
///
///     handle.set_count(5);
///     assert_eq!(counter.associated_device_count().await?, 5);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockDeviceCounter {
    shared: Arc<Shared>,
}

impl MockDeviceCounter {
    /// Create a counter starting at `count` devices.
    pub fn new(count: u32) -> (Self, MockDeviceCounterHandle) {
        let shared = Arc::new(Shared {
            count: AtomicU32::new(count),
            fail: AtomicBool::new(false),
            hang: AtomicBool::new(false),
            queries: AtomicU32::new(0),
        });

        let counter = Self {
            shared: Arc::clone(&shared),
        };

        (counter, MockDeviceCounterHandle { shared })
    }
}

impl DeviceCounter for MockDeviceCounter {
    async fn associated_device_count(&self) -> Result<u32> {
        self.shared.queries.fetch_add(1, Ordering::SeqCst);
        if self.shared.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.shared.fail.load(Ordering::SeqCst) {
            return Err(HardwareError::query_failed("injected failure"));
        }
        Ok(self.shared.count.load(Ordering::SeqCst))
    }
}

/// Handle for controlling a mock device counter.
#[derive(Debug, Clone)]
pub struct MockDeviceCounterHandle {
    shared: Arc<Shared>,
}

impl MockDeviceCounterHandle {
    /// Set the number of associated devices.
    pub fn set_count(&self, count: u32) {
        self.shared.count.store(count, Ordering::SeqCst);
    }

    /// Current number of associated devices.
    pub fn count(&self) -> u32 {
        self.shared.count.load(Ordering::SeqCst)
    }

    /// Make every following query fail (or succeed again).
    pub fn fail_queries(&self, fail: bool) {
        self.shared.fail.store(fail, Ordering::SeqCst);
    }

    /// Make every following query block forever, like an unresponsive gateway.
    pub fn hang_queries(&self, hang: bool) {
        self.shared.hang.store(hang, Ordering::SeqCst);
    }

    /// Number of queries received so far.
    pub fn queries(&self) -> u32 {
        self.shared.queries.load(Ordering::SeqCst)
    }
}
