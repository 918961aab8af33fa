//! In-memory tags repository.
//!
//! Reference implementation of [`TagsRepo`] over an in-process document
//! collection, for embedding and tests. Each trait call takes the lock
//! once, mirroring the per-call atomicity the contract assumes from a real
//! backing store; the compound `(owner, name)` uniqueness check and the
//! insert happen under the same guard.

use std::sync::RwLock;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    NewTag, RepoError, TAG_OWNER_NAME_CONSTRAINT, TagChanges, TagPage, TagsRepo,
};
use crate::domain::entities::TagRecord;
use crate::util::lock::{rw_read, rw_write};

const SOURCE: &str = "infra::memory";

#[derive(Default)]
pub struct MemoryTagsRepo {
    docs: RwLock<Vec<TagRecord>>,
}

impl MemoryTagsRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored documents across all owners.
    pub fn len(&self) -> usize {
        rw_read(&self.docs, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TagsRepo for MemoryTagsRepo {
    async fn insert(&self, tag: NewTag) -> Result<TagRecord, RepoError> {
        let mut docs = rw_write(&self.docs, SOURCE, "insert");
        if docs
            .iter()
            .any(|doc| doc.owner == tag.owner && doc.name == tag.name)
        {
            return Err(RepoError::duplicate(TAG_OWNER_NAME_CONSTRAINT));
        }

        let record = TagRecord {
            id: Uuid::new_v4(),
            owner: tag.owner,
            name: tag.name,
            archived: tag.archived,
            created_at: OffsetDateTime::now_utc(),
            updated_at: None,
        };
        docs.push(record.clone());
        Ok(record)
    }

    async fn find_by_owner_and_name(
        &self,
        owner: Uuid,
        name: &str,
    ) -> Result<Option<TagRecord>, RepoError> {
        let docs = rw_read(&self.docs, SOURCE, "find_by_owner_and_name");
        Ok(docs
            .iter()
            .find(|doc| doc.owner == owner && doc.name == name)
            .cloned())
    }

    async fn find_by_id(&self, owner: Uuid, id: Uuid) -> Result<Option<TagRecord>, RepoError> {
        let docs = rw_read(&self.docs, SOURCE, "find_by_id");
        Ok(docs
            .iter()
            .find(|doc| doc.owner == owner && doc.id == id)
            .cloned())
    }

    async fn find_page(&self, owner: Uuid, page: TagPage) -> Result<Vec<TagRecord>, RepoError> {
        let docs = rw_read(&self.docs, SOURCE, "find_page");
        let mut rows: Vec<TagRecord> = docs
            .iter()
            .filter(|doc| doc.owner == owner && doc.archived == page.archived)
            .cloned()
            .collect();

        // Never-updated tags sort by creation time, like a COALESCE over
        // the two columns. Id breaks ties deterministically.
        rows.sort_by_key(|doc| {
            let primary = if page.sort_by_create {
                doc.created_at
            } else {
                doc.updated_at.unwrap_or(doc.created_at)
            };
            (primary, doc.id)
        });
        if page.descending {
            rows.reverse();
        }

        let skip = usize::try_from(page.page.saturating_mul(page.size)).unwrap_or(usize::MAX);
        let take = usize::try_from(page.size).unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(skip).take(take).collect())
    }

    async fn update_fields(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: TagChanges,
    ) -> Result<Option<TagRecord>, RepoError> {
        let mut docs = rw_write(&self.docs, SOURCE, "update_fields");
        let Some(pos) = docs
            .iter()
            .position(|doc| doc.owner == owner && doc.id == id)
        else {
            return Ok(None);
        };

        // A rename lands on the same compound constraint as an insert.
        if let Some(name) = changes.name.as_deref() {
            if docs
                .iter()
                .any(|doc| doc.owner == owner && doc.name == name && doc.id != id)
            {
                return Err(RepoError::duplicate(TAG_OWNER_NAME_CONSTRAINT));
            }
        }

        let doc = &mut docs[pos];
        if let Some(name) = changes.name {
            doc.name = name;
        }
        if let Some(archived) = changes.archived {
            doc.archived = archived;
        }
        doc.updated_at = Some(OffsetDateTime::now_utc());
        Ok(Some(doc.clone()))
    }

    async fn delete_archived(&self, owner: Uuid, id: Uuid) -> Result<bool, RepoError> {
        let mut docs = rw_write(&self.docs, SOURCE, "delete_archived");
        let before = docs.len();
        docs.retain(|doc| !(doc.owner == owner && doc.id == id && doc.archived));
        Ok(docs.len() < before)
    }
}
