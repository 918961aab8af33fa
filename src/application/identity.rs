//! Caller identity resolution.
//!
//! Boundary layers resolve the authenticated principal once per request and
//! pass the owner id explicitly into service operations, keeping the
//! authorization dependency visible in every signature instead of ambient.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("caller identity could not be resolved")]
    Unauthorized,
}

/// Maps opaque request credentials to the owning principal.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve_owner(&self, credentials: &str) -> Result<Uuid, IdentityError>;
}
