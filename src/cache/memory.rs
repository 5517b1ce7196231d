//! Process-local cache store.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::lock::{rw_read, rw_write};
use super::store::{CacheStore, CacheStoreError};

const SOURCE: &str = "cache::memory";

/// In-memory [`CacheStore`] backed by a `HashMap`.
///
/// Used for the `memory` cache backend and as the default store in tests.
#[derive(Default)]
pub struct MemoryCacheStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        rw_write(&self.entries, SOURCE, "clear").clear();
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheStoreError> {
        rw_write(&self.entries, SOURCE, "set").insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheStoreError> {
        Ok(rw_read(&self.entries, SOURCE, "get").get(key).cloned())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheStoreError> {
        Ok(rw_read(&self.entries, SOURCE, "exists").contains_key(key))
    }

    async fn del(&self, key: &str) -> Result<(), CacheStoreError> {
        rw_write(&self.entries, SOURCE, "del").remove(key);
        Ok(())
    }
}
