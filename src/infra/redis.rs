//! Redis implementation of [`CacheStore`].

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tracing::{debug, info};

use crate::cache::{CacheStore, CacheStoreError};

/// Cache store over a reconnecting multiplexed connection.
///
/// Cloning the manager is cheap; every command clones it so concurrent
/// callers share the underlying socket without holding a lock. A dropped
/// socket is re-established in the background, and commands issued meanwhile
/// fail with `CacheStoreError::Command`.
#[derive(Clone)]
pub struct RedisCacheStore {
    connection: ConnectionManager,
}

impl RedisCacheStore {
    pub async fn connect(url: &str) -> Result<Self, CacheStoreError> {
        let client = redis::Client::open(url).map_err(|err| {
            CacheStoreError::Unavailable(format!("invalid redis url: {err}"))
        })?;
        let connection = client
            .get_connection_manager()
            .await
            .map_err(|err| {
                CacheStoreError::Unavailable(format!("failed to connect to redis: {err}"))
            })?;
        info!(target = "tasklane::cache::redis", "connected to redis");
        Ok(Self { connection })
    }

    pub async fn ping(&self) -> Result<(), CacheStoreError> {
        let mut conn = self.connection.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|err| CacheStoreError::command("PING", err))?;
        Ok(())
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheStoreError> {
        let mut conn = self.connection.clone();
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|err| CacheStoreError::command("SET", err))?;
        debug!(cache_key = key, bytes = value.len(), "[Redis] SET");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheStoreError> {
        let mut conn = self.connection.clone();
        redis::cmd("GET")
            .arg(key)
            .query_async::<Option<Vec<u8>>>(&mut conn)
            .await
            .map_err(|err| CacheStoreError::command("GET", err))
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheStoreError> {
        let mut conn = self.connection.clone();
        redis::cmd("EXISTS")
            .arg(key)
            .query_async::<bool>(&mut conn)
            .await
            .map_err(|err| CacheStoreError::command("EXISTS", err))
    }

    async fn del(&self, key: &str) -> Result<(), CacheStoreError> {
        let mut conn = self.connection.clone();
        let removed = redis::cmd("DEL")
            .arg(key)
            .query_async::<i64>(&mut conn)
            .await
            .map_err(|err| CacheStoreError::command("DEL", err))?;
        debug!(cache_key = key, removed, "[Redis] DEL");
        Ok(())
    }
}
