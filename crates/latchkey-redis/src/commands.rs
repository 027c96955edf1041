//! Redis command encodings of the three lock primitives
//!
//! Shared by the direct and pooled stores; each function runs one command on
//! whatever connection it is handed.

use std::sync::LazyLock;
use std::time::Duration;

use latchkey_common::StoreError;
use redis::aio::ConnectionLike;
use redis::{RedisError, Script};

/// Server-side check-and-delete. Deletes `KEYS[1]` only when it holds `ARGV[1]`.
pub const CHECK_AND_DELETE_SCRIPT: &str = "if redis.call('get', KEYS[1]) == ARGV[1] then return redis.call('del', KEYS[1]) else return 0 end";

static CHECK_AND_DELETE: LazyLock<Script> = LazyLock::new(|| Script::new(CHECK_AND_DELETE_SCRIPT));

pub(crate) fn command_error(err: RedisError) -> StoreError {
    if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
        StoreError::connection(err)
    } else {
        StoreError::command(err)
    }
}

/// PX takes whole milliseconds, rejects zero and is capped at a signed 64-bit value
fn ttl_millis(ttl: Duration) -> Result<u64, StoreError> {
    u64::try_from(ttl.as_millis())
        .ok()
        .filter(|millis| i64::try_from(*millis).is_ok())
        .map(|millis| millis.max(1))
        .ok_or_else(|| StoreError::command(format!("expire time {:?} out of range", ttl)))
}

/// `SET key value NX PX ttl`; the reply is nil when the key already exists
pub(crate) async fn set_if_absent<C>(
    con: &mut C,
    key: &str,
    value: &str,
    ttl: Duration,
) -> Result<bool, StoreError>
where
    C: ConnectionLike + Send,
{
    let ttl_ms = ttl_millis(ttl)?;
    let reply: Option<String> = redis::cmd("SET")
        .arg(key)
        .arg(value)
        .arg("NX")
        .arg("PX")
        .arg(ttl_ms)
        .query_async(con)
        .await
        .map_err(command_error)?;

    match reply.as_deref() {
        None => Ok(false),
        Some("OK") => Ok(true),
        Some(other) => Err(StoreError::UnexpectedReply(format!(
            "SET NX returned '{}'",
            other
        ))),
    }
}

pub(crate) async fn get<C>(con: &mut C, key: &str) -> Result<Option<String>, StoreError>
where
    C: ConnectionLike + Send,
{
    redis::cmd("GET")
        .arg(key)
        .query_async(con)
        .await
        .map_err(command_error)
}

pub(crate) async fn delete_if_equals<C>(
    con: &mut C,
    key: &str,
    value: &str,
) -> Result<bool, StoreError>
where
    C: ConnectionLike + Send,
{
    let deleted: i64 = CHECK_AND_DELETE
        .key(key)
        .arg(value)
        .invoke_async(con)
        .await
        .map_err(command_error)?;

    Ok(deleted > 0)
}
