//! Subcommand handlers
//!
//! Handlers are generic over `LockStore` and return values rather than
//! printing, so they run unchanged against the in-memory store.

use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use latchkey_common::{LockOptions, lock_key};
use latchkey_core::{Lock, LockStore};
use latchkey_redis::RedisStore;
use tokio::process::Command;
use tracing::{info, warn};

use crate::cli::Commands;
use crate::settings::Settings;

/// Exit code when the lock could not be acquired in time (`EX_TEMPFAIL`)
pub const EXIT_LOCK_TIMEOUT: i32 = 75;

/// Exit code when the child was terminated without an exit status
const EXIT_NO_STATUS: i32 = 1;

/// Dispatch a parsed subcommand against Redis; returns the process exit code
pub async fn execute(command: Commands, settings: &Settings) -> anyhow::Result<i32> {
    let store = RedisStore::connect(&settings.redis.url)
        .await
        .with_context(|| format!("Failed to connect to redis at {}", settings.redis.url))?;
    let store = Arc::new(store);

    match command {
        Commands::Run {
            name,
            wait,
            auto_release,
            command,
        } => {
            let mut options = settings.lock_options();
            if let Some(secs) = auto_release {
                options = options.with_auto_release_secs(secs);
            }
            let wait = wait.map_or_else(|| settings.acquire_timeout(), Duration::from_secs);
            run_locked(store, &name, options, wait, &command).await
        }
        Commands::Status { name } => {
            let locked = status(store.as_ref(), &name).await?;
            println!("{}", if locked { "locked" } else { "unlocked" });
            Ok(0)
        }
        Commands::Release { name, token } => {
            if release_token(store.as_ref(), &name, &token).await? {
                println!("released");
                Ok(0)
            } else {
                println!("not held by token");
                Ok(1)
            }
        }
    }
}

/// Run `argv` while holding the named lock.
///
/// Returns the child's exit code, or [`EXIT_LOCK_TIMEOUT`] when the lock was
/// not acquired within `wait`.
pub async fn run_locked<S: LockStore + Clone + 'static>(
    store: S,
    name: &str,
    options: LockOptions,
    wait: Duration,
    argv: &[String],
) -> anyhow::Result<i32> {
    let (program, args) = argv.split_first().context("No command given")?;
    let lock = Lock::with_options(store, name, options)?;

    let outcome = lock
        .with_lock(wait, || async {
            info!(
                key = %lock.key(),
                token = %lock.token(),
                program = %program,
                "Running command under lock"
            );
            Command::new(program).args(args).status().await
        })
        .await;

    match outcome {
        Ok(status) => {
            let status = status.with_context(|| format!("Failed to run '{}'", program))?;
            Ok(exit_code(status))
        }
        Err(e) if e.is_timeout() => {
            warn!(key = %lock.key(), waited = ?wait, "Lock not acquired in time");
            Ok(EXIT_LOCK_TIMEOUT)
        }
        Err(e) => Err(e.into()),
    }
}

/// Whether any holder currently owns the named lock
pub async fn status<S: LockStore + ?Sized>(store: &S, name: &str) -> anyhow::Result<bool> {
    Ok(store.get(&lock_key(name)).await?.is_some())
}

/// Delete the named lock only if it still carries `token`
pub async fn release_token<S: LockStore + ?Sized>(
    store: &S,
    name: &str,
    token: &str,
) -> anyhow::Result<bool> {
    let key = lock_key(name);
    let deleted = store.delete_if_equals(&key, token).await?;
    info!(key = %key, deleted, "Administrative release");
    Ok(deleted)
}

fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(EXIT_NO_STATUS)
}
