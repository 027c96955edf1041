//! Store client adapter
//!
//! The lock protocol needs exactly three atomic operations from the shared
//! store. Whether they run over a single connection or one drawn from a pool
//! is up to the implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use latchkey_common::StoreError;

/// Capability surface a lock handle depends on
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Set `key` to `value` with expiry `ttl`, only if `key` does not exist.
    ///
    /// Returns `true` when the value was written. The existence check and the
    /// write must be one atomic store operation.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration)
    -> Result<bool, StoreError>;

    /// Read the current value of `key`
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Delete `key` only if its current value equals `value`.
    ///
    /// Must execute atomically on the store side, never as a client-side
    /// get followed by a delete. Returns `true` when the key was deleted.
    async fn delete_if_equals(&self, key: &str, value: &str) -> Result<bool, StoreError>;
}

#[async_trait]
impl<S: LockStore + ?Sized> LockStore for Arc<S> {
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        (**self).set_if_absent(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key).await
    }

    async fn delete_if_equals(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        (**self).delete_if_equals(key, value).await
    }
}
