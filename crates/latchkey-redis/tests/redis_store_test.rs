// Integration tests for the Redis stores
// Require a running Redis server; set REDIS_URL to override the default address

use std::sync::Arc;
use std::time::Duration;

use latchkey_core::{Lock, LockOptions, LockStore};
use latchkey_redis::{PooledRedisStore, RedisStore};

fn redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379/".to_string())
}

/// Lock names are unique per test run so parallel tests never collide
fn unique_name(test: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("latchkey-test:{}:{}", test, nanos)
}

#[tokio::test]
#[ignore = "requires running redis"]
async fn test_primitives_on_direct_connection() {
    let store = RedisStore::connect(&redis_url()).await.unwrap();
    let key = format!("lock:{}", unique_name("primitives"));
    let ttl = Duration::from_secs(5);

    assert!(store.set_if_absent(&key, "one", ttl).await.unwrap());
    assert!(!store.set_if_absent(&key, "two", ttl).await.unwrap());
    assert_eq!(store.get(&key).await.unwrap().as_deref(), Some("one"));

    assert!(!store.delete_if_equals(&key, "two").await.unwrap());
    assert!(store.delete_if_equals(&key, "one").await.unwrap());
    assert_eq!(store.get(&key).await.unwrap(), None);
}

#[tokio::test]
#[ignore = "requires running redis"]
async fn test_lock_and_unlock_on_pool() {
    let store = Arc::new(PooledRedisStore::new(&redis_url(), 4).unwrap());
    let name = unique_name("pool");
    let lock = Lock::new(store.clone(), name.as_str());

    lock.acquire(Duration::from_secs(10)).await.unwrap();
    assert_eq!(
        store.get(lock.key()).await.unwrap().as_deref(),
        Some(lock.token())
    );

    lock.release(false).await.unwrap();
    assert_eq!(store.get(lock.key()).await.unwrap(), None);
}

#[tokio::test]
#[ignore = "requires running redis"]
async fn test_timeout_when_held_elsewhere() {
    let store = Arc::new(RedisStore::connect(&redis_url()).await.unwrap());
    let name = unique_name("timeout");
    let holder = Lock::new(store.clone(), name.as_str());
    let other = Lock::new(store.clone(), name.as_str());

    holder.acquire(Duration::ZERO).await.unwrap();

    let started = std::time::Instant::now();
    let err = other.acquire(Duration::from_secs(2)).await.unwrap_err();
    let elapsed = started.elapsed();

    assert!(err.is_timeout());
    assert!(elapsed >= Duration::from_millis(1900), "elapsed {elapsed:?}");
    assert!(elapsed <= Duration::from_millis(2100), "elapsed {elapsed:?}");

    holder.release(false).await.unwrap();
}

#[tokio::test]
#[ignore = "requires running redis"]
async fn test_store_expiry_frees_lock() {
    let store = Arc::new(RedisStore::connect(&redis_url()).await.unwrap());
    let name = unique_name("expiry");
    let options = LockOptions::new().with_auto_release_secs(1);
    let stale = Lock::with_options(store.clone(), name.as_str(), options).unwrap();
    let current = Lock::new(store.clone(), name.as_str());

    stale.acquire(Duration::ZERO).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1100)).await;
    current.acquire(Duration::ZERO).await.unwrap();

    // The stale handle's forced release must not delete the new holder's key
    stale.release(true).await.unwrap();
    assert!(current.is_locked_by_me(true).await.unwrap());

    current.release(false).await.unwrap();
}
