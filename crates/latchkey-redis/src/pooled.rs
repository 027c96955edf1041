// Redis store over a deadpool connection pool
// Each operation checks a connection out for exactly that one call

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Config, Connection, Pool, PoolConfig, Runtime};
use latchkey_common::StoreError;
use latchkey_core::LockStore;
use tracing::info;

use crate::commands;

/// Default maximum number of pooled connections
pub const DEFAULT_POOL_SIZE: usize = 8;

/// `LockStore` backed by a shared Redis connection pool.
///
/// Connections return to the pool as soon as the operation finishes, so a
/// lock waiting out its backoff never pins one.
#[derive(Clone)]
pub struct PooledRedisStore {
    pool: Pool,
}

impl PooledRedisStore {
    /// Build a pool for `url` holding at most `max_size` connections.
    ///
    /// Connections are opened lazily on first use.
    pub fn new(url: &str, max_size: usize) -> Result<Self, StoreError> {
        let mut config = Config::from_url(url);
        config.pool = Some(PoolConfig::new(max_size.max(1)));
        let pool = config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(StoreError::connection)?;

        info!(url = %url, max_size, "Created redis connection pool");
        Ok(Self { pool })
    }

    /// Share an existing pool with the lock store
    pub fn from_pool(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    async fn connection(&self) -> Result<Connection, StoreError> {
        self.pool.get().await.map_err(StoreError::connection)
    }
}

#[async_trait]
impl LockStore for PooledRedisStore {
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let mut connection = self.connection().await?;
        commands::set_if_absent(&mut connection, key, value, ttl).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut connection = self.connection().await?;
        commands::get(&mut connection, key).await
    }

    async fn delete_if_equals(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let mut connection = self.connection().await?;
        commands::delete_if_equals(&mut connection, key, value).await
    }
}
