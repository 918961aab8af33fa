//! Tagweave cache tier.
//!
//! A read-through (cache-aside) accessor over a pluggable key-value
//! backend with per-entry TTL:
//!
//! - [`CacheBackend`]: the collaborator contract (get / set-with-TTL / del)
//! - [`CacheAside`]: get-or-compute-and-populate plus explicit delete
//! - [`MemoryCache`]: in-process reference backend (LRU + TTL)
//! - [`keys`]: the cache key namespaces for tag lookups

mod aside;
mod backend;
pub mod keys;
mod memory;

pub use aside::{CacheAside, metric_names};
pub use backend::{CacheBackend, CacheError};
pub use memory::MemoryCache;
