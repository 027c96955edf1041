//! Latchkey Redis - Store adapters for Redis
//!
//! Two `LockStore` implementations sharing the same command encodings:
//! - `RedisStore`: a single multiplexed connection
//! - `PooledRedisStore`: a `deadpool-redis` pool, one checkout per operation
//!
//! Acquisition uses `SET key token NX PX ttl`. Release runs
//! [`CHECK_AND_DELETE_SCRIPT`] server-side so the comparison and the delete
//! cannot be interleaved with another client's write.
//!
//! This is a single-instance lock. Under Sentinel or Cluster failover a
//! replica may be promoted before it has seen the key, and mutual exclusion
//! is lost until the key would have expired.

mod commands;
mod direct;
mod pooled;

pub use commands::CHECK_AND_DELETE_SCRIPT;
pub use direct::RedisStore;
pub use pooled::{DEFAULT_POOL_SIZE, PooledRedisStore};
