//! Latchkey Common - Shared types, errors, and options
//!
//! This crate provides the foundational types used across all Latchkey components:
//! - Error types (`LockError`, `StoreError`)
//! - Lock construction options
//! - Store key naming

pub mod error;
pub mod options;

// Re-exports for convenience
pub use error::{BoxError, LockError, LockResult, StoreError};
pub use options::{LockOptions, MAX_AUTO_RELEASE_MS};

/// Prefix prepended to every lock name to form its store key.
///
/// External tooling may inspect the store directly, so this value is part of
/// the public contract and must not change.
pub const LOCK_KEY_PREFIX: &str = "lock:";

/// Default number of seconds a lock may be held before the store frees it
pub const DEFAULT_AUTO_RELEASE_SECS: u64 = 30;

/// Default delay in milliseconds before the first acquisition retry
pub const DEFAULT_BASE_RETRY_DELAY_MS: u64 = 100;

/// Default number of seconds spent attempting acquisition
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// Build the store key for a lock name.
pub fn lock_key(name: &str) -> String {
    format!("{}{}", LOCK_KEY_PREFIX, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_key() {
        assert_eq!(lock_key("orders"), "lock:orders");
        assert_eq!(lock_key(""), "lock:");
        assert_eq!(lock_key("lock:nested"), "lock:lock:nested");
    }
}
