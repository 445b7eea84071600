//! Two-press secret handshake.
//!
//! The first press arms the handshake; the second press succeeds if it
//! lands inside the configured window after the first. Either way the
//! machine returns to [`HandshakeState::Idle`], so a third press always
//! starts a fresh attempt.
//!
//! ```text
//!            press                 press (in window)
//!   Idle ───────────► Waiting ──────────────────────► Idle  => Success
//!                        │
//!                        │ press (outside window)
//!                        └──────────────────────────► Idle  => Failure
//! ```

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::config::HandshakeWindow;

/// Handshake progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HandshakeState {
    /// No attempt in progress.
    #[default]
    Idle,

    /// First press recorded at `anchor`.
    Waiting { anchor: DateTime<Utc> },
}

impl std::fmt::Display for HandshakeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Waiting { anchor } => write!(f, "Waiting since {anchor}"),
        }
    }
}

/// Result of feeding one press into the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeOutcome {
    /// First press recorded; waiting for the second.
    Pending,

    /// Second press landed inside the window.
    Success { elapsed: chrono::Duration },

    /// Second press landed outside the window.
    Failure { elapsed: chrono::Duration },
}

impl HandshakeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Secret handshake state machine.
#[derive(Debug, Clone)]
pub struct SecretHandshake {
    window: HandshakeWindow,
    state: HandshakeState,
}

impl SecretHandshake {
    pub fn new(window: HandshakeWindow) -> Self {
        Self {
            window,
            state: HandshakeState::Idle,
        }
    }

    /// Feed a press captured at `at`.
    ///
    /// The elapsed time is measured between capture timestamps, so the
    /// outcome does not depend on when the press is processed.
    pub fn record_event(&mut self, at: DateTime<Utc>) -> HandshakeOutcome {
        match self.state {
            HandshakeState::Idle => {
                self.state = HandshakeState::Waiting { anchor: at };
                debug!("Handshake started");
                HandshakeOutcome::Pending
            }
            HandshakeState::Waiting { anchor } => {
                self.state = HandshakeState::Idle;
                let elapsed = at - anchor;

                if self.window.contains(elapsed) {
                    info!("Successful handshake");
                    HandshakeOutcome::Success { elapsed }
                } else {
                    debug!("Failed handshake after {} seconds", elapsed.num_seconds());
                    HandshakeOutcome::Failure { elapsed }
                }
            }
        }
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    pub fn window(&self) -> HandshakeWindow {
        self.window
    }
}
