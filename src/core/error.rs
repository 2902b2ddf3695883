use std::io;
use thiserror::Error;

/// Custom error types for the Optolink client
///
/// Recoverable link faults never show up here; they are reported through
/// [`crate::protocol::Outcome::LinkFault`].
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Protocol desynchronized: {0}")]
    Desync(String),

    #[error("Checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    Checksum { expected: u8, actual: u8 },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Time-series sink error: {0}")]
    Sink(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Creates a new connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Error::Connection(msg.into())
    }

    /// Creates a new desynchronization error
    pub fn desync(msg: impl Into<String>) -> Self {
        Error::Desync(msg.into())
    }

    /// Creates a new invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Creates a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Creates a new sink error
    pub fn sink(msg: impl Into<String>) -> Self {
        Error::Sink(msg.into())
    }

    /// Creates a new invalid state error
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Error::InvalidState(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::desync("echo mismatch");
        assert!(matches!(err, Error::Desync(_)));
        assert_eq!(err.to_string(), "Protocol desynchronized: echo mismatch");
    }

    #[test]
    fn test_checksum_display() {
        let err = Error::Checksum { expected: 0x1f, actual: 0x20 };
        assert_eq!(err.to_string(), "Checksum mismatch: expected 0x1f, got 0x20");
    }

    #[test]
    fn test_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::Other, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
