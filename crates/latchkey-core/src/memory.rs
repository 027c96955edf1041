// In-memory lock store
// Provides the three atomic lock primitives with per-entry expiry, backed by DashMap

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use latchkey_common::StoreError;
use tokio::time::Instant;
use tracing::debug;

use crate::store::LockStore;

/// A stored value and the instant at which the store drops it
struct StoredValue {
    value: String,
    expires_at: Instant,
}

impl StoredValue {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Number of operations served, per operation kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCalls {
    pub set_if_absent: u64,
    pub get: u64,
    pub delete_if_equals: u64,
}

#[derive(Default)]
struct CallCounters {
    set_if_absent: AtomicU64,
    get: AtomicU64,
    delete_if_equals: AtomicU64,
}

/// Process-local `LockStore` using DashMap.
///
/// Expiry is evaluated lazily on every access using the tokio clock, so
/// paused-time tests observe auto-release deterministically. Each DashMap
/// shard lock makes the conditional operations atomic.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, StoredValue>,
    calls: CallCounters,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of how many operations this store has served
    pub fn calls(&self) -> StoreCalls {
        StoreCalls {
            set_if_absent: self.calls.set_if_absent.load(Ordering::Relaxed),
            get: self.calls.get.load(Ordering::Relaxed),
            delete_if_equals: self.calls.delete_if_equals.load(Ordering::Relaxed),
        }
    }

    /// Number of keys that have not yet expired
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|entry| !entry.value().is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop expired entries, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, stored| !stored.is_expired(now));
        let removed = before.saturating_sub(self.entries.len());

        if removed > 0 {
            debug!(count = removed, "Purged expired lock entries");
        }
        removed
    }
}

#[async_trait]
impl LockStore for MemoryStore {
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        self.calls.set_if_absent.fetch_add(1, Ordering::Relaxed);
        if ttl.is_zero() {
            return Err(StoreError::command("invalid expire time in 'set' command"));
        }

        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .ok_or_else(|| StoreError::command(format!("expire time {:?} out of range", ttl)))?;
        let stored = StoredValue {
            value: value.to_string(),
            expires_at,
        };

        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired(now) {
                    occupied.insert(stored);
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(stored);
                Ok(true)
            }
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.calls.get.fetch_add(1, Ordering::Relaxed);
        let now = Instant::now();

        Ok(self
            .entries
            .get(key)
            .filter(|stored| !stored.is_expired(now))
            .map(|stored| stored.value.clone()))
    }

    async fn delete_if_equals(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        self.calls.delete_if_equals.fetch_add(1, Ordering::Relaxed);
        let now = Instant::now();

        Ok(self
            .entries
            .remove_if(key, |_, stored| {
                !stored.is_expired(now) && stored.value == value
            })
            .is_some())
    }
}
