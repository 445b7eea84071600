use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid handshake window: min {min_seconds}s exceeds max {max_seconds}s")]
    InvalidHandshakeWindow { min_seconds: u64, max_seconds: u64 },

    #[error("Invalid pin: {0}")]
    InvalidPin(String),
}

pub type Result<T> = std::result::Result<T, Error>;
