//! Cache key derivation.
//!
//! Keys follow `<namespace>:<id>`, one key per todo identity.

use std::fmt;

use thiserror::Error;

pub const DEFAULT_NAMESPACE: &str = "tasklane:todo";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NamespaceError {
    #[error("cache namespace must not be empty")]
    Empty,
    #[error("cache namespace `{0}` must not end with `:`")]
    TrailingSeparator(String),
    #[error("cache namespace `{0}` must not contain whitespace")]
    Whitespace(String),
}

/// Validated prefix shared by every key of one entity type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyNamespace(String);

impl KeyNamespace {
    pub fn new(value: impl Into<String>) -> Result<Self, NamespaceError> {
        let value = value.into();
        if value.is_empty() {
            return Err(NamespaceError::Empty);
        }
        if value.ends_with(':') {
            return Err(NamespaceError::TrailingSeparator(value));
        }
        if value.chars().any(char::is_whitespace) {
            return Err(NamespaceError::Whitespace(value));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn key(&self, id: i64) -> CacheKey {
        CacheKey(format!("{}:{id}", self.0))
    }
}

impl Default for KeyNamespace {
    fn default() -> Self {
        Self(DEFAULT_NAMESPACE.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
