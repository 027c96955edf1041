//! Lock handle
//!
//! A `Lock` binds a lock name to a store and a random ownership token. The
//! store key holds the token of whichever handle acquired it last; the
//! handle's own `held_since` timestamp is advisory and only used to skip
//! store round trips that cannot change the outcome.
//!
//! Acquisition is a conditional-set retried with exponential backoff until the
//! caller's wait budget runs out. Release is an atomic check-and-delete, so a
//! handle whose lock already expired can never delete a newer holder's key.
//!
//! The local shortcuts assume the client clock and the store clock agree to
//! well within `auto_release`. Under larger drift a shortcut may skip a delete
//! the store still needed, in which case the key simply lingers until its own
//! expiry.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use latchkey_common::{LockError, LockOptions, LockResult, lock_key};
use metrics::counter;
use parking_lot::Mutex;
use rand::RngCore;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::backoff::Backoff;
use crate::metrics::{ACQUIRE_ATTEMPTS_TOTAL, ACQUIRE_TOTAL, RELEASE_TOTAL};
use crate::store::LockStore;

/// Number of random bytes in an ownership token (hex encoded to twice as many chars)
const TOKEN_BYTES: usize = 16;

/// Mutual exclusion lock over a shared store
pub struct Lock<S> {
    store: S,
    name: String,
    key: String,
    token: String,
    options: LockOptions,
    /// Set while this handle believes it holds the lock
    held_since: Mutex<Option<Instant>>,
}

impl<S> std::fmt::Debug for Lock<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lock")
            .field("key", &self.key)
            .field("options", &self.options)
            .field("held_since", &*self.held_since.lock())
            .finish_non_exhaustive()
    }
}

/// Generate a fresh ownership token from the thread-local CSPRNG
fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    const_hex::encode(bytes)
}

impl<S: LockStore> Lock<S> {
    /// Create a handle with default options (30s auto-release, 100ms base retry delay)
    pub fn new(store: S, name: impl Into<String>) -> Self {
        Self::build(store, name.into(), LockOptions::default())
    }

    /// Create a handle with custom options
    pub fn with_options(store: S, name: impl Into<String>, options: LockOptions) -> LockResult<Self> {
        options.validate()?;
        Ok(Self::build(store, name.into(), options))
    }

    fn build(store: S, name: String, options: LockOptions) -> Self {
        Self {
            key: lock_key(&name),
            name,
            store,
            token: generate_token(),
            options,
            held_since: Mutex::new(None),
        }
    }

    /// The lock name as given at construction
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The store key guarded by this handle (`lock:` + name)
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The ownership token written to the store on acquisition
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Timing options this handle was built with
    pub fn options(&self) -> &LockOptions {
        &self.options
    }

    /// The store client this handle talks to
    pub fn store(&self) -> &S {
        &self.store
    }

    /// When this handle last acquired the lock, if it still believes it holds it
    pub fn held_since(&self) -> Option<Instant> {
        *self.held_since.lock()
    }

    fn within_auto_release(&self, since: Instant) -> bool {
        since
            .checked_add(self.options.auto_release)
            .is_none_or(|expires_at| Instant::now() < expires_at)
    }

    /// Acquire the lock, retrying with exponential backoff for at most `max_wait`.
    ///
    /// A `max_wait` of zero makes exactly one attempt.
    pub async fn acquire(&self, max_wait: Duration) -> LockResult<()> {
        let started = Instant::now();
        let mut backoff = Backoff::new(self.options.base_retry_delay, started, max_wait);
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            counter!(ACQUIRE_ATTEMPTS_TOTAL).increment(1);

            // Taken before the round trip so local belief never outlives the store's expiry
            let attempted_at = Instant::now();
            if self
                .store
                .set_if_absent(&self.key, &self.token, self.options.auto_release)
                .await?
            {
                *self.held_since.lock() = Some(attempted_at);
                counter!(ACQUIRE_TOTAL, "outcome" => "acquired").increment(1);
                debug!(key = %self.key, attempts, "Lock acquired");
                return Ok(());
            }

            match backoff.next_sleep(Instant::now()) {
                Some(delay) => {
                    debug!(key = %self.key, attempts, delay_ms = delay.as_millis() as u64, "Lock busy, backing off");
                    sleep(delay).await;
                }
                None => {
                    let waited = started.elapsed();
                    counter!(ACQUIRE_TOTAL, "outcome" => "timeout").increment(1);
                    info!(key = %self.key, attempts, waited_ms = waited.as_millis() as u64, "Timed out acquiring lock");
                    return Err(LockError::AcquireTimeout {
                        key: self.key.clone(),
                        waited,
                    });
                }
            }
        }
    }

    /// Single acquisition attempt; `Ok(false)` when the lock is held elsewhere
    pub async fn try_acquire(&self) -> LockResult<bool> {
        match self.acquire(Duration::ZERO).await {
            Ok(()) => Ok(true),
            Err(LockError::AcquireTimeout { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Release the lock if this handle holds it.
    ///
    /// No-op when the handle never acquired or already released. Past the
    /// auto-release window the store has already dropped the key, so the
    /// remote delete is skipped unless `force_remote` is set. Local state is
    /// cleared even if the store call fails; that failure is returned.
    pub async fn release(&self, force_remote: bool) -> LockResult<()> {
        let held = self.held_since.lock().take();
        let Some(since) = held else {
            return Ok(());
        };

        if !force_remote && !self.within_auto_release(since) {
            counter!(RELEASE_TOTAL, "remote" => "false").increment(1);
            debug!(key = %self.key, "Lock already past auto-release, skipping remote delete");
            return Ok(());
        }

        counter!(RELEASE_TOTAL, "remote" => "true").increment(1);
        let deleted = self.store.delete_if_equals(&self.key, &self.token).await?;
        if deleted {
            debug!(key = %self.key, "Lock released");
        } else {
            debug!(key = %self.key, "Lock no longer owned by this handle, nothing deleted");
        }
        Ok(())
    }

    /// Whether any holder currently owns the lock. Always asks the store.
    pub async fn is_locked(&self) -> LockResult<bool> {
        Ok(self.store.get(&self.key).await?.is_some())
    }

    /// Whether this handle owns the lock.
    ///
    /// Without `force_remote` the answer is inferred from the local acquisition
    /// time and costs no store call.
    pub async fn is_locked_by_me(&self, force_remote: bool) -> LockResult<bool> {
        let Some(since) = self.held_since() else {
            return Ok(false);
        };

        if force_remote {
            let current = self.store.get(&self.key).await?;
            return Ok(current.as_deref() == Some(self.token.as_str()));
        }

        Ok(self.within_auto_release(since))
    }
}

impl<S: LockStore + Clone + 'static> Lock<S> {
    /// Acquire, run `work`, then release on every exit path.
    ///
    /// The lock is released whether `work` returns normally, returns an error
    /// value, or panics (the panic resumes after release). If acquisition fails
    /// `work` never runs. A failed release is logged and ignored here since the
    /// key still expires on its own.
    ///
    /// If the returned future is dropped while `work` is running (a timeout or
    /// a losing `select!` branch), the check-and-delete is spawned onto the
    /// current tokio runtime instead. Outside a runtime the key is left to
    /// expire.
    pub async fn with_lock<F, Fut, T>(&self, max_wait: Duration, work: F) -> LockResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.acquire(max_wait).await?;

        let guard = ReleaseOnDrop { lock: Some(self) };
        let outcome = AssertUnwindSafe(async move { work().await })
            .catch_unwind()
            .await;
        guard.disarm();

        if let Err(e) = self.release(false).await {
            warn!(key = %self.key, error = %e, "Failed to release lock after scoped work");
        }

        match outcome {
            Ok(value) => Ok(value),
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    /// Release without awaiting, for scopes torn down mid-flight
    fn release_detached(&self) {
        let held = self.held_since.lock().take();
        let Some(since) = held else {
            return;
        };
        if !self.within_auto_release(since) {
            counter!(RELEASE_TOTAL, "remote" => "false").increment(1);
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(key = %self.key, "Scoped work cancelled outside a runtime, lock left to expire");
            return;
        };

        counter!(RELEASE_TOTAL, "remote" => "true").increment(1);
        let store = self.store.clone();
        let key = self.key.clone();
        let token = self.token.clone();
        debug!(key = %key, "Scoped work cancelled, releasing lock in background");
        runtime.spawn(async move {
            if let Err(e) = store.delete_if_equals(&key, &token).await {
                warn!(key = %key, error = %e, "Failed to release lock after cancelled scoped work");
            }
        });
    }
}

/// Releases the lock if dropped before `disarm`
struct ReleaseOnDrop<'a, S: LockStore + Clone + 'static> {
    lock: Option<&'a Lock<S>>,
}

impl<S: LockStore + Clone + 'static> ReleaseOnDrop<'_, S> {
    fn disarm(mut self) {
        self.lock = None;
    }
}

impl<S: LockStore + Clone + 'static> Drop for ReleaseOnDrop<'_, S> {
    fn drop(&mut self) {
        if let Some(lock) = self.lock.take() {
            lock.release_detached();
        }
    }
}
