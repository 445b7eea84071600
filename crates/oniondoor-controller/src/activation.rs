//! Time-bounded activation window.
//!
//! While the window is open any button press unlocks the door. Expiry is
//! lazy: the window is cleared the first time it is consulted at or past
//! its deadline, there is no timer.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Optional deadline until which button presses are honored unconditionally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivationWindow {
    active_until: Option<DateTime<Utc>>,
}

impl ActivationWindow {
    /// A closed window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the window for `period` starting at `now`.
    ///
    /// Replaces any existing deadline, earlier or later. Periods that would
    /// overflow the calendar saturate to the latest representable time.
    pub fn activate(&mut self, now: DateTime<Utc>, period: Duration) -> DateTime<Utc> {
        let until = chrono::Duration::from_std(period)
            .ok()
            .and_then(|period| now.checked_add_signed(period))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        self.active_until = Some(until);
        until
    }

    /// Close the window. Idempotent.
    pub fn deactivate(&mut self) {
        self.active_until = None;
    }

    /// Whether the window is open at `now`.
    ///
    /// The deadline itself is exclusive. An expired deadline is cleared as a
    /// side effect.
    pub fn is_activated(&mut self, now: DateTime<Utc>) -> bool {
        match self.active_until {
            Some(until) if now < until => true,
            Some(_) => {
                self.active_until = None;
                false
            }
            None => false,
        }
    }

    /// The stored deadline, if any, without checking expiry.
    pub fn active_until(&self) -> Option<DateTime<Utc>> {
        self.active_until
    }
}
