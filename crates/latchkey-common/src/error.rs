//! Error types for Latchkey
//!
//! This module defines:
//! - `StoreError`: failures reported by a store client adapter
//! - `LockError`: failures surfaced by the lock handle

use std::time::Duration;

/// Boxed error used to carry backend-specific failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by a store client adapter.
///
/// The lock handle never interprets or retries these; they reach the caller
/// with the backend error preserved as the source.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("store connection error: {0}")]
    Connection(#[source] BoxError),

    #[error("store command error: {0}")]
    Command(#[source] BoxError),

    #[error("unexpected store reply: {0}")]
    UnexpectedReply(String),
}

impl StoreError {
    pub fn connection(err: impl Into<BoxError>) -> Self {
        StoreError::Connection(err.into())
    }

    pub fn command(err: impl Into<BoxError>) -> Self {
        StoreError::Command(err.into())
    }
}

/// Errors surfaced by lock operations
#[derive(thiserror::Error, Debug)]
pub enum LockError {
    #[error("timed out after {waited:?} acquiring lock '{key}'")]
    AcquireTimeout { key: String, waited: Duration },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid lock options: {0}")]
    InvalidOptions(String),
}

impl LockError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, LockError::AcquireTimeout { .. })
    }
}

/// Result type for lock operations
pub type LockResult<T> = Result<T, LockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_timeout_display() {
        let err = LockError::AcquireTimeout {
            key: "lock:jobs".to_string(),
            waited: Duration::from_millis(1500),
        };
        assert!(err.is_timeout());
        assert_eq!(
            err.to_string(),
            "timed out after 1.5s acquiring lock 'lock:jobs'"
        );
    }

    #[test]
    fn test_store_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err: LockError = StoreError::connection(io).into();

        assert!(!err.is_timeout());
        assert_eq!(err.to_string(), "store connection error: refused");
        let source = std::error::Error::source(&err).expect("store error has a source");
        assert_eq!(source.to_string(), "refused");
    }

    #[test]
    fn test_command_error_from_message() {
        let err = StoreError::command("ERR wrong number of arguments");
        assert_eq!(
            err.to_string(),
            "store command error: ERR wrong number of arguments"
        );
    }
}
