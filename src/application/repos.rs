//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::TagRecord;

/// Name of the compound uniqueness constraint on live `(owner, name)` pairs.
///
/// Adapters report a violation as [`RepoError::Duplicate`] carrying this
/// constraint so callers can distinguish a lost creation race from other
/// persistence failures.
pub const TAG_OWNER_NAME_CONSTRAINT: &str = "tags_owner_name_key";

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn duplicate(constraint: impl Into<String>) -> Self {
        Self::Duplicate {
            constraint: constraint.into(),
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }
}

#[derive(Debug, Clone)]
pub struct NewTag {
    pub owner: Uuid,
    pub name: String,
    pub archived: bool,
}

/// Partial update of a tag; unset fields are left untouched.
///
/// Adapters always stamp `updated_at` alongside whatever is set here.
#[derive(Debug, Clone, Default)]
pub struct TagChanges {
    pub name: Option<String>,
    pub archived: Option<bool>,
}

impl TagChanges {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn set_archived(archived: bool) -> Self {
        Self {
            archived: Some(archived),
            ..Self::default()
        }
    }
}

/// Page request for owner-scoped tag listings.
///
/// `page * size` rows are skipped and at most `size` returned, ordered by
/// creation time or last-activity time (`updated_at` falling back to
/// `created_at` for never-updated tags).
#[derive(Debug, Clone, Copy)]
pub struct TagPage {
    pub page: u64,
    pub size: u64,
    pub sort_by_create: bool,
    pub descending: bool,
    pub archived: bool,
}

/// Owner-scoped persistence for tags.
///
/// Every operation filters by owner; a caller can never observe or touch
/// another principal's tags through this trait. Single calls are atomic at
/// the backing store, nothing here coordinates across calls.
#[async_trait]
pub trait TagsRepo: Send + Sync {
    /// Insert a new tag, assigning its id and creation timestamp.
    ///
    /// Fails with [`RepoError::Duplicate`] when a live tag with the same
    /// `(owner, name)` already exists.
    async fn insert(&self, tag: NewTag) -> Result<TagRecord, RepoError>;

    async fn find_by_owner_and_name(
        &self,
        owner: Uuid,
        name: &str,
    ) -> Result<Option<TagRecord>, RepoError>;

    async fn find_by_id(&self, owner: Uuid, id: Uuid) -> Result<Option<TagRecord>, RepoError>;

    async fn find_page(&self, owner: Uuid, page: TagPage) -> Result<Vec<TagRecord>, RepoError>;

    /// Apply a partial update to the tag matching `(owner, id)`, stamping
    /// `updated_at`. Returns the updated record, or `None` when nothing
    /// matched (which is not an error).
    ///
    /// A rename onto another live tag's name fails with
    /// [`RepoError::Duplicate`], same as an insert would.
    async fn update_fields(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: TagChanges,
    ) -> Result<Option<TagRecord>, RepoError>;

    /// Delete the tag matching `(owner, id)` if and only if it is archived.
    /// Reports whether a record was actually removed.
    async fn delete_archived(&self, owner: Uuid, id: Uuid) -> Result<bool, RepoError>;
}
