// Redis store over a single multiplexed connection
// Every operation pipelines onto the same connection; cloning the handle is cheap

use std::time::Duration;

use async_trait::async_trait;
use latchkey_common::StoreError;
use latchkey_core::LockStore;
use redis::aio::MultiplexedConnection;
use tracing::info;

use crate::commands;

/// `LockStore` backed by one multiplexed Redis connection
#[derive(Clone)]
pub struct RedisStore {
    connection: MultiplexedConnection,
}

impl RedisStore {
    /// Open a connection to `url` (e.g. `redis://127.0.0.1:6379/0`)
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url).map_err(StoreError::connection)?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(StoreError::connection)?;

        info!(url = %url, "Connected to redis");
        Ok(Self { connection })
    }

    /// Wrap an already established connection
    pub fn from_connection(connection: MultiplexedConnection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl LockStore for RedisStore {
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let mut connection = self.connection.clone();
        commands::set_if_absent(&mut connection, key, value, ttl).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut connection = self.connection.clone();
        commands::get(&mut connection, key).await
    }

    async fn delete_if_equals(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let mut connection = self.connection.clone();
        commands::delete_if_equals(&mut connection, key, value).await
    }
}
