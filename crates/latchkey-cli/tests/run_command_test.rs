// Integration tests for running commands under a lock
// Uses the in-memory store and real child processes

#![cfg(unix)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use latchkey_cli::commands::{EXIT_LOCK_TIMEOUT, run_locked};
use latchkey_core::{LockOptions, MemoryStore};

fn argv(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_runs_are_serialized() {
    let store = Arc::new(MemoryStore::new());
    let options = LockOptions::default().with_base_retry_delay_ms(20);
    let command = argv(&["sh", "-c", "sleep 0.3"]);

    let started = Instant::now();
    let (first, second) = tokio::join!(
        run_locked(
            store.clone(),
            "nightly",
            options,
            Duration::from_secs(5),
            &command
        ),
        run_locked(
            store.clone(),
            "nightly",
            options,
            Duration::from_secs(5),
            &command
        ),
    );

    assert_eq!(first.unwrap(), 0);
    assert_eq!(second.unwrap(), 0);
    assert!(
        started.elapsed() >= Duration::from_millis(600),
        "runs overlapped: {:?}",
        started.elapsed()
    );
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_second_run_gives_up_with_tempfail() {
    let store = Arc::new(MemoryStore::new());
    let options = LockOptions::default().with_base_retry_delay_ms(20);
    let long_command = argv(&["sh", "-c", "sleep 0.5"]);
    let short_command = argv(&["sh", "-c", "exit 0"]);

    let (long, short) = tokio::join!(
        run_locked(
            store.clone(),
            "nightly",
            options,
            Duration::from_secs(5),
            &long_command
        ),
        async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            run_locked(
                store.clone(),
                "nightly",
                options,
                Duration::from_millis(100),
                &short_command,
            )
            .await
        },
    );

    assert_eq!(long.unwrap(), 0);
    assert_eq!(short.unwrap(), EXIT_LOCK_TIMEOUT);
}

#[tokio::test]
async fn test_different_names_run_independently() {
    let store = Arc::new(MemoryStore::new());
    let options = LockOptions::default();
    let alpha = argv(&["sh", "-c", "sleep 0.1; exit 4"]);
    let beta = argv(&["sh", "-c", "sleep 0.1; exit 5"]);

    let (a, b) = tokio::join!(
        run_locked(
            store.clone(),
            "alpha",
            options,
            Duration::ZERO,
            &alpha
        ),
        run_locked(
            store.clone(),
            "beta",
            options,
            Duration::ZERO,
            &beta
        ),
    );

    assert_eq!(a.unwrap(), 4);
    assert_eq!(b.unwrap(), 5);
}
