//! Latchkey Core - Store-backed mutual exclusion
//!
//! This crate provides:
//! - `Lock`: the acquisition/release protocol over a shared store
//! - `LockStore`: the store client adapter trait the protocol depends on
//! - `MemoryStore`: an in-process store for tests and single-process use
//! - Lock metrics descriptions

pub mod backoff;
pub mod lock;
pub mod memory;
pub mod metrics;
pub mod store;

pub use backoff::Backoff;
pub use lock::Lock;
pub use memory::{MemoryStore, StoreCalls};
pub use self::metrics::describe_metrics;
pub use store::LockStore;

pub use latchkey_common::{LockError, LockOptions, LockResult, StoreError};
