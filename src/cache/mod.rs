//! Cache-aside layer for todo snapshots.
//!
//! - [`CacheStore`]: the external key-value collaborator (`set`, `get`, `exists`, `del`).
//! - [`CacheAside`]: serializes domain values into opaque blobs on top of a store.
//! - [`CacheKey`]: deterministic `<namespace>:<id>` keys.
//!
//! The cache is a derived, disposable view. Entries carry no expiry and are only
//! ever populated by writes; the persistent store stays authoritative.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! backend = "redis"          # or "memory"
//! url = "redis://127.0.0.1/"
//! namespace = "tasklane:todo"
//! ```

mod aside;
mod config;
mod keys;
mod lock;
mod memory;
mod store;

pub use aside::{CacheAside, CacheError};
pub use config::{CacheBackend, CacheConfig};
pub use keys::{CacheKey, DEFAULT_NAMESPACE, KeyNamespace, NamespaceError};
pub use memory::MemoryCacheStore;
pub use store::{CacheStore, CacheStoreError};
