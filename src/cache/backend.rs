//! Cache backend contract.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {message}")]
    Backend { message: String },
}

impl CacheError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

/// Key-value store with server-side expiry.
///
/// TTL is advisory: the backend expires entries on its own clock and an
/// expired entry reads as absent. Implementations are shared across tasks
/// and must be internally synchronized per call; no coordination across
/// calls is assumed by the callers.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Fetch the value stored under `key`, or `None` when absent/expired.
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError>;

    /// Store `value` under `key`, expiring after `ttl`.
    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError>;

    /// Remove the entry under `key`. Deleting an absent key is not an error.
    async fn del(&self, key: &str) -> Result<(), CacheError>;
}
