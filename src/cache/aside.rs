//! Cache-aside accessor: get-or-compute-and-populate over a backend.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use metrics::counter;
use tracing::warn;

use super::backend::{CacheBackend, CacheError};

/// Metric keys emitted by the cache-aside accessor.
pub mod metric_names {
    pub const CACHE_HIT: &str = "tagweave_cache_hit_total";
    pub const CACHE_MISS: &str = "tagweave_cache_miss_total";
    pub const CACHE_INVALIDATE: &str = "tagweave_cache_invalidate_total";
}

/// Read-through accessor over a shared [`CacheBackend`].
///
/// There is no negative caching and no stampede protection: concurrent
/// misses on the same key each run their compute independently and the
/// last write-back wins.
#[derive(Clone)]
pub struct CacheAside {
    backend: Arc<dyn CacheBackend>,
}

impl CacheAside {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    /// Return the bytes under `key`, computing and populating on a miss.
    ///
    /// A backend read failure fails the whole call. A compute failure
    /// propagates and caches nothing. After a successful compute the
    /// write-back is best-effort: a populate failure is logged and the
    /// computed value is still returned.
    pub async fn get_with<F, Fut, E>(&self, key: &str, ttl: Duration, compute: F) -> Result<Bytes, E>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<Bytes, E>> + Send,
        E: From<CacheError>,
    {
        if let Some(hit) = self.backend.get(key).await.map_err(E::from)? {
            counter!(metric_names::CACHE_HIT).increment(1);
            return Ok(hit);
        }
        counter!(metric_names::CACHE_MISS).increment(1);

        let value = compute().await?;
        if let Err(err) = self.backend.set(key, value.clone(), ttl).await {
            warn!(key, error = %err, "cache populate failed after compute; serving computed value");
        }
        Ok(value)
    }

    /// Remove the entry under `key`; absent keys are a no-op.
    pub async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.backend.del(key).await
    }

    /// Write-path invalidation. A backend failure is logged and swallowed;
    /// the stale entry ages out at its TTL.
    pub async fn invalidate(&self, key: &str) {
        counter!(metric_names::CACHE_INVALIDATE).increment(1);
        if let Err(err) = self.backend.del(key).await {
            warn!(key, error = %err, "cache invalidation failed; entry stale until TTL");
        }
    }
}
