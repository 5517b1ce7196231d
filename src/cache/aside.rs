//! Typed access to a [`CacheStore`].
//!
//! Values are encoded as JSON blobs. Decoding into a type that does not match
//! the stored blob fails with [`CacheError::Decode`] rather than yielding a
//! partially populated value.

use std::sync::Arc;

use metrics::counter;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::trace;

use super::store::{CacheStore, CacheStoreError};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Store(#[from] CacheStoreError),
    #[error("failed to serialize value for `{key}`: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to decode cached value for `{key}`: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("no cached value for `{key}`")]
    NotFound { key: String },
}

#[derive(Clone)]
pub struct CacheAside {
    store: Arc<dyn CacheStore>,
}

impl CacheAside {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Serialize `value` and store it under `key`, replacing any previous entry.
    pub async fn cache_value<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize + ?Sized,
    {
        let blob = serde_json::to_vec(value).map_err(|source| CacheError::Serialization {
            key: key.to_string(),
            source,
        })?;
        self.store.set(key, &blob).await?;
        counter!("tasklane_cache_write_total").increment(1);
        trace!(cache_key = key, bytes = blob.len(), "cached value");
        Ok(())
    }

    pub async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.store.exists(key).await?)
    }

    /// Fetch and decode the value under `key`.
    ///
    /// Callers are expected to have checked [`exists`](Self::exists) first; an
    /// absent key reports [`CacheError::NotFound`].
    pub async fn get_cached_value<T>(&self, key: &str) -> Result<T, CacheError>
    where
        T: DeserializeOwned,
    {
        let blob = self
            .store
            .get(key)
            .await?
            .ok_or_else(|| CacheError::NotFound {
                key: key.to_string(),
            })?;
        serde_json::from_slice(&blob).map_err(|source| CacheError::Decode {
            key: key.to_string(),
            source,
        })
    }

    pub async fn remove_from_cache(&self, key: &str) -> Result<(), CacheError> {
        self.store.del(key).await?;
        counter!("tasklane_cache_evict_total").increment(1);
        trace!(cache_key = key, "evicted value");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use async_trait::async_trait;
    use serde::{Deserialize, Serializer};

    use super::*;
    use crate::cache::MemoryCacheStore;

    fn cache() -> CacheAside {
        CacheAside::new(Arc::new(MemoryCacheStore::new()))
    }

    #[tokio::test]
    async fn can_add_something_to_cache() {
        let cache = cache();
        cache.cache_value("key", "value").await.expect("cached");
        assert!(cache.exists("key").await.expect("exists"));
    }

    #[tokio::test]
    async fn can_get_a_cached_value() {
        let cache = cache();
        cache.cache_value("key1", "value1").await.expect("cached");

        let value: String = cache.get_cached_value("key1").await.expect("fetched");
        assert_eq!(value, "value1");
    }

    #[tokio::test]
    async fn overwrites_existing_entry() {
        let cache = cache();
        cache.cache_value("key", &1_u32).await.expect("cached");
        cache.cache_value("key", &2_u32).await.expect("overwritten");

        let value: u32 = cache.get_cached_value("key").await.expect("fetched");
        assert_eq!(value, 2);
    }

    #[tokio::test]
    async fn can_remove_key_from_cache() {
        let cache = cache();
        cache.cache_value("key", "value1").await.expect("cached");
        cache.remove_from_cache("key").await.expect("removed");

        assert!(!cache.exists("key").await.expect("exists"));
        cache
            .remove_from_cache("key")
            .await
            .expect("removing an absent key succeeds");
    }

    #[tokio::test]
    async fn absent_key_reports_not_found() {
        let cache = cache();
        let err = cache
            .get_cached_value::<String>("missing")
            .await
            .expect_err("absent key");
        assert!(matches!(err, CacheError::NotFound { key } if key == "missing"));
    }

    #[tokio::test]
    async fn mismatched_type_reports_decode_error() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Shape {
            sides: u8,
        }

        let cache = cache();
        cache.cache_value("key", "not a shape").await.expect("cached");

        let err = cache
            .get_cached_value::<Shape>("key")
            .await
            .expect_err("decode mismatch");
        assert!(matches!(err, CacheError::Decode { .. }));
    }

    #[tokio::test]
    async fn unencodable_value_reports_serialization_error() {
        struct Unencodable;

        impl Serialize for Unencodable {
            fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("refusing to encode"))
            }
        }

        let store = Arc::new(MemoryCacheStore::new());
        let cache = CacheAside::new(store.clone());
        let err = cache
            .cache_value("key", &Unencodable)
            .await
            .expect_err("serialization failure");
        assert!(matches!(err, CacheError::Serialization { .. }));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn non_string_map_keys_fail_to_serialize() {
        let mut map = BTreeMap::new();
        map.insert((1, 2), "pair");

        let err = cache()
            .cache_value("key", &map)
            .await
            .expect_err("tuple keys are not representable");
        assert!(matches!(err, CacheError::Serialization { .. }));
    }

    struct UnreachableStore;

    #[async_trait]
    impl CacheStore for UnreachableStore {
        async fn set(&self, _key: &str, _value: &[u8]) -> Result<(), CacheStoreError> {
            Err(CacheStoreError::Unavailable("connection refused".into()))
        }

        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheStoreError> {
            Err(CacheStoreError::Unavailable("connection refused".into()))
        }

        async fn exists(&self, _key: &str) -> Result<bool, CacheStoreError> {
            Err(CacheStoreError::Unavailable("connection refused".into()))
        }

        async fn del(&self, _key: &str) -> Result<(), CacheStoreError> {
            Err(CacheStoreError::Unavailable("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn store_failures_surface_as_store_errors() {
        let cache = CacheAside::new(Arc::new(UnreachableStore));

        assert!(matches!(
            cache.exists("key").await,
            Err(CacheError::Store(CacheStoreError::Unavailable(_)))
        ));
        assert!(matches!(
            cache.cache_value("key", "v").await,
            Err(CacheError::Store(_))
        ));
        assert!(matches!(
            cache.get_cached_value::<String>("key").await,
            Err(CacheError::Store(_))
        ));
        assert!(matches!(
            cache.remove_from_cache("key").await,
            Err(CacheError::Store(_))
        ));
    }
}
