//! In-process cache backend with LRU eviction and per-entry TTL.

use std::num::NonZeroUsize;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;

use crate::util::lock::rw_write;

use super::backend::{CacheBackend, CacheError};

const SOURCE: &str = "cache::memory";

const DEFAULT_ENTRY_LIMIT: usize = 1024;

struct Entry {
    value: Bytes,
    expires_at: Instant,
}

/// Reference [`CacheBackend`] backed by an in-process LRU map.
///
/// Expiry is lazy: an entry past its deadline is dropped on the read that
/// observes it. Capacity pressure evicts least-recently-used entries.
pub struct MemoryCache {
    entries: RwLock<LruCache<String, Entry>>,
}

impl MemoryCache {
    pub fn new(entry_limit: usize) -> Self {
        // Settings validation rejects zero; clamp to one regardless so a
        // hand-built config cannot panic the cache.
        let capacity = NonZeroUsize::new(entry_limit).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
        }
    }

    /// Number of live entries, counting expired-but-unswept ones.
    pub fn len(&self) -> usize {
        rw_write(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_ENTRY_LIMIT)
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        // LRU promotion mutates the map, so reads take the write guard.
        let mut entries = rw_write(&self.entries, SOURCE, "get");
        let expired = match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                return Ok(Some(entry.value.clone()));
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        rw_write(&self.entries, SOURCE, "set").put(key.to_string(), entry);
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        rw_write(&self.entries, SOURCE, "del").pop(key);
        Ok(())
    }
}
