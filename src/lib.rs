//! Tagweave: a cache-aside content-tagging resolution core.
//!
//! Extracts hashtag tokens from free-form text, persists them per owning
//! user with at-most-one-record-per-(owner, name) semantics, and serves
//! lookups through a read-through cache with explicit invalidation on
//! write. Transport, authentication, and concrete storage backends are
//! collaborators behind traits; the crate ships in-memory reference
//! implementations for embedding and tests.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub(crate) mod util;
