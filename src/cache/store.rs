//! Key-value store contract consumed by the cache-aside layer.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheStoreError {
    #[error("cache store unavailable: {0}")]
    Unavailable(String),
    #[error("cache command `{command}` failed: {message}")]
    Command {
        command: &'static str,
        message: String,
    },
}

impl CacheStoreError {
    pub fn command(command: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Command {
            command,
            message: err.to_string(),
        }
    }
}

/// A key-value store holding opaque blobs without store-managed expiry.
///
/// Every call is a single round trip; implementations hold no locks across calls.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Store `value` under `key`, overwriting any existing entry.
    async fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheStoreError>;

    /// Fetch the blob under `key`, `None` when absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheStoreError>;

    async fn exists(&self, key: &str) -> Result<bool, CacheStoreError>;

    /// Remove `key`. Removing an absent key succeeds.
    async fn del(&self, key: &str) -> Result<(), CacheStoreError>;
}
