use thiserror::Error;

use crate::application::identity::IdentityError;
use crate::application::repos::RepoError;
use crate::cache::CacheError;

/// Errors surfaced by the tag resolution service.
///
/// Nothing is retried internally. Store and cache failures pass through
/// unmodified; the only swallowed failure class is the best-effort cache
/// write-back after a successful compute, which is logged instead.
#[derive(Debug, Error)]
pub enum TagError {
    #[error(transparent)]
    Unauthorized(#[from] IdentityError),
    #[error("tag not found")]
    NotFound,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl TagError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}
