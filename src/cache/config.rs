//! Cache backend selection.
//!
//! Controlled via the `[cache]` section of `tasklane.toml`.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use super::keys::KeyNamespace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Process-local map; entries vanish on restart.
    #[default]
    Memory,
    /// Shared Redis instance.
    Redis,
}

impl CacheBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheBackend::Memory => "memory",
            CacheBackend::Redis => "redis",
        }
    }
}

impl fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(CacheBackend::Memory),
            "redis" => Ok(CacheBackend::Redis),
            other => Err(format!("unknown cache backend `{other}`")),
        }
    }
}

/// Resolved cache settings.
#[derive(Debug, Clone, Default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Connection URL; required for the redis backend.
    pub url: Option<String>,
    pub namespace: KeyNamespace,
}
