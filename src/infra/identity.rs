//! Token-table identity resolver.
//!
//! Reference implementation of [`IdentityResolver`] mapping opaque bearer
//! tokens to owner ids. Real deployments put a session or token-validation
//! service behind the same trait.

use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::identity::{IdentityError, IdentityResolver};

#[derive(Default)]
pub struct TokenTableIdentity {
    owners_by_token: HashMap<String, Uuid>,
}

impl TokenTableIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, token: impl Into<String>, owner: Uuid) {
        self.owners_by_token.insert(token.into(), owner);
    }
}

#[async_trait]
impl IdentityResolver for TokenTableIdentity {
    async fn resolve_owner(&self, credentials: &str) -> Result<Uuid, IdentityError> {
        self.owners_by_token
            .get(credentials)
            .copied()
            .ok_or(IdentityError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn known_token_resolves_unknown_fails() {
        let owner = Uuid::new_v4();
        let mut resolver = TokenTableIdentity::new();
        resolver.register("token-1", owner);

        assert_eq!(resolver.resolve_owner("token-1").await.unwrap(), owner);
        assert_eq!(
            resolver.resolve_owner("nope").await.unwrap_err(),
            IdentityError::Unauthorized
        );
    }
}
