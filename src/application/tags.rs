//! Tag resolution service.
//!
//! Orchestrates the hashtag parser, the owner-scoped tags repository, and
//! the cache-aside accessor. Reads by name or id go through the cache with
//! a TTL; mutations write the store first and then invalidate every cache
//! key the touched record can appear under (id key, old name key, and the
//! new name key on rename), so no read path outlives a mutation beyond the
//! TTL window.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::debug;
use uuid::Uuid;

use crate::application::error::TagError;
use crate::application::repos::{NewTag, RepoError, TagChanges, TagPage, TagsRepo};
use crate::cache::CacheAside;
use crate::cache::keys::{tag_id_key, tag_name_key};
use crate::domain::entities::TagRecord;
use crate::domain::hashtags::parse_hashtags;

const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);
const DEFAULT_MAX_PAGE_SIZE: u64 = 100;

/// Tunables for the resolution service.
#[derive(Debug, Clone)]
pub struct TagServiceConfig {
    /// Expiry for name-keyed and id-keyed cache entries.
    pub cache_ttl: Duration,
    /// Hard cap applied to caller-supplied list page sizes.
    pub max_page_size: u64,
}

impl Default for TagServiceConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

impl From<&crate::config::Settings> for TagServiceConfig {
    fn from(settings: &crate::config::Settings) -> Self {
        Self {
            cache_ttl: Duration::from_secs(settings.cache.ttl_secs),
            max_page_size: settings.list.max_page_size,
        }
    }
}

/// Create, look up, and mutate tags for one owner at a time.
///
/// Callers resolve the owner once at the boundary (see
/// [`crate::application::identity::IdentityResolver`]) and pass it into
/// every operation; the repository filters by it on each call, so
/// cross-owner access is structurally impossible here.
#[derive(Clone)]
pub struct TagResolutionService {
    repo: Arc<dyn TagsRepo>,
    cache: CacheAside,
    config: TagServiceConfig,
}

impl TagResolutionService {
    pub fn new(repo: Arc<dyn TagsRepo>, cache: CacheAside, config: TagServiceConfig) -> Self {
        Self {
            repo,
            cache,
            config,
        }
    }

    /// Insert a new tag and return its id. The cache is untouched: entries
    /// are populated lazily on first read.
    pub async fn create(&self, owner: Uuid, name: &str) -> Result<Uuid, TagError> {
        ensure_non_empty(name)?;
        let record = self
            .repo
            .insert(NewTag {
                owner,
                name: name.to_string(),
                archived: false,
            })
            .await?;
        Ok(record.id)
    }

    /// Apply a partial update to `(owner, id)`. A rename onto a name held
    /// by another live tag fails with the store's duplicate error.
    ///
    /// Invalidation runs after the store call whether or not it matched a
    /// record, and whether or not it failed: a concurrent reader observes
    /// the pre-write or post-write state, never a cached value older than
    /// the completed invalidation.
    pub async fn update(&self, owner: Uuid, id: Uuid, changes: TagChanges) -> Result<(), TagError> {
        if let Some(new_name) = changes.name.as_deref() {
            ensure_non_empty(new_name)?;
        }

        let existing = self.repo.find_by_id(owner, id).await?;
        let result = self.repo.update_fields(owner, id, changes.clone()).await;

        self.cache.invalidate(&tag_id_key(owner, id)).await;
        if let Some(prev) = &existing {
            self.cache.invalidate(&tag_name_key(owner, &prev.name)).await;
            if let Some(new_name) = changes.name.as_deref() {
                if new_name != prev.name {
                    self.cache.invalidate(&tag_name_key(owner, new_name)).await;
                }
            }
        }

        result.map(|_| ()).map_err(TagError::from)
    }

    /// Delete `(owner, id)`, which must be archived.
    ///
    /// A zero-row delete surfaces as [`TagError::NotFound`]; a live
    /// (unarchived) tag and a missing one are indistinguishable to the
    /// caller.
    pub async fn delete(&self, owner: Uuid, id: Uuid) -> Result<(), TagError> {
        let existing = self.repo.find_by_id(owner, id).await?;
        let removed = self.repo.delete_archived(owner, id).await;

        self.cache.invalidate(&tag_id_key(owner, id)).await;
        if let Some(prev) = &existing {
            self.cache.invalidate(&tag_name_key(owner, &prev.name)).await;
        }

        if removed? {
            Ok(())
        } else {
            Err(TagError::NotFound)
        }
    }

    /// Resolve `(owner, name)` to an id, creating the tag when absent.
    pub async fn get_or_create(&self, owner: Uuid, name: &str) -> Result<Uuid, TagError> {
        Ok(self.get_or_create_record(owner, name).await?.id)
    }

    /// Cache-aside read by name; a store miss is [`TagError::NotFound`] and
    /// is never cached.
    pub async fn get_by_name(&self, owner: Uuid, name: &str) -> Result<TagRecord, TagError> {
        let key = tag_name_key(owner, name);
        let payload = self
            .cache
            .get_with(&key, self.config.cache_ttl, || async move {
                let record = self
                    .repo
                    .find_by_owner_and_name(owner, name)
                    .await?
                    .ok_or(TagError::NotFound)?;
                encode_record(&record)
            })
            .await?;
        decode_record(&payload)
    }

    /// Cache-aside read by id; same miss semantics as [`Self::get_by_name`].
    pub async fn get_by_id(&self, owner: Uuid, id: Uuid) -> Result<TagRecord, TagError> {
        let key = tag_id_key(owner, id);
        let payload = self
            .cache
            .get_with(&key, self.config.cache_ttl, || async move {
                let record = self
                    .repo
                    .find_by_id(owner, id)
                    .await?
                    .ok_or(TagError::NotFound)?;
                encode_record(&record)
            })
            .await?;
        decode_record(&payload)
    }

    /// Uncached paginated listing. The caller-supplied size is clamped to
    /// the configured cap.
    pub async fn list(&self, owner: Uuid, page: TagPage) -> Result<Vec<TagRecord>, TagError> {
        let mut page = page;
        if page.size > self.config.max_page_size {
            debug!(
                requested = page.size,
                cap = self.config.max_page_size,
                "clamping tag list page size"
            );
            page.size = self.config.max_page_size;
        }
        self.repo.find_page(owner, page).await.map_err(TagError::from)
    }

    /// Extract hashtags from `content` and resolve each one to a tag id,
    /// creating missing tags on the way.
    ///
    /// Returns one id per extracted token in extraction order, duplicates
    /// preserved. Each token is resolved through the name-keyed cache, so
    /// a token repeated within one call costs at most one store round trip.
    pub async fn resolve_tags_in_content(
        &self,
        owner: Uuid,
        content: &str,
    ) -> Result<Vec<Uuid>, TagError> {
        let names = parse_hashtags(content);
        let mut ids = Vec::with_capacity(names.len());

        for name in &names {
            let key = tag_name_key(owner, name);
            let payload = self
                .cache
                .get_with(&key, self.config.cache_ttl, || async move {
                    let record = self.get_or_create_record(owner, name).await?;
                    encode_record(&record)
                })
                .await?;
            ids.push(decode_record(&payload)?.id);
        }

        Ok(ids)
    }

    async fn get_or_create_record(&self, owner: Uuid, name: &str) -> Result<TagRecord, TagError> {
        ensure_non_empty(name)?;

        if let Some(existing) = self.repo.find_by_owner_and_name(owner, name).await? {
            return Ok(existing);
        }

        match self
            .repo
            .insert(NewTag {
                owner,
                name: name.to_string(),
                archived: false,
            })
            .await
        {
            Ok(created) => Ok(created),
            // Lost the creation race: a concurrent call inserted the same
            // name between our lookup and insert. The constraint signal
            // means the record exists now, so fetch it.
            Err(RepoError::Duplicate { .. }) => self
                .repo
                .find_by_owner_and_name(owner, name)
                .await?
                .ok_or(TagError::NotFound),
            Err(err) => Err(err.into()),
        }
    }
}

fn ensure_non_empty(name: &str) -> Result<(), TagError> {
    if name.trim().is_empty() {
        return Err(TagError::validation("tag name must not be empty"));
    }
    Ok(())
}

fn encode_record(record: &TagRecord) -> Result<Bytes, TagError> {
    serde_json::to_vec(record)
        .map(Bytes::from)
        .map_err(|err| TagError::validation(format!("tag record not serializable: {err}")))
}

fn decode_record(payload: &Bytes) -> Result<TagRecord, TagError> {
    serde_json::from_slice(payload)
        .map_err(|err| TagError::validation(format!("malformed cached tag payload: {err}")))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::cache::MemoryCache;
    use crate::infra::memory::MemoryTagsRepo;

    fn service() -> TagResolutionService {
        service_with(Arc::new(MemoryTagsRepo::new()))
    }

    fn service_with(repo: Arc<dyn TagsRepo>) -> TagResolutionService {
        TagResolutionService::new(
            repo,
            CacheAside::new(Arc::new(MemoryCache::default())),
            TagServiceConfig::default(),
        )
    }

    #[tokio::test]
    async fn create_rejects_empty_name() {
        let service = service();
        let result = service.create(Uuid::new_v4(), "  ").await;
        assert!(matches!(result, Err(TagError::Validation(_))));
    }

    #[tokio::test]
    async fn get_or_create_reuses_the_existing_tag() {
        let service = service();
        let owner = Uuid::new_v4();

        let first = service.get_or_create(owner, "rust").await.unwrap();
        let second = service.get_or_create(owner, "rust").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn update_is_visible_through_get_by_id() {
        let service = service();
        let owner = Uuid::new_v4();
        let id = service.create(owner, "draft").await.unwrap();

        // Prime the id-keyed cache entry.
        assert_eq!(service.get_by_id(owner, id).await.unwrap().name, "draft");

        service
            .update(owner, id, TagChanges::rename("final"))
            .await
            .unwrap();

        let record = service.get_by_id(owner, id).await.unwrap();
        assert_eq!(record.name, "final");
        assert!(record.updated_at.is_some());
    }

    #[tokio::test]
    async fn rename_does_not_leave_a_stale_name_entry() {
        let service = service();
        let owner = Uuid::new_v4();
        let id = service.create(owner, "old").await.unwrap();

        // Prime both name-keyed entries.
        assert!(service.get_by_name(owner, "old").await.is_ok());
        assert!(service.get_by_name(owner, "new").await.is_err());

        service
            .update(owner, id, TagChanges::rename("new"))
            .await
            .unwrap();

        assert!(service.get_by_name(owner, "old").await.unwrap_err().is_not_found());
        assert_eq!(service.get_by_name(owner, "new").await.unwrap().id, id);
    }

    #[tokio::test]
    async fn rename_cannot_collide_with_a_live_name() {
        let service = service();
        let owner = Uuid::new_v4();
        let a = service.create(owner, "a").await.unwrap();
        let b = service.create(owner, "b").await.unwrap();

        let err = service
            .update(owner, b, TagChanges::rename("a"))
            .await
            .unwrap_err();
        assert!(matches!(err, TagError::Repo(ref repo) if repo.is_duplicate()));

        // Exactly one tag answers to each name afterwards.
        assert_eq!(service.get_by_name(owner, "a").await.unwrap().id, a);
        assert_eq!(service.get_by_name(owner, "b").await.unwrap().id, b);
    }

    #[tokio::test]
    async fn update_of_missing_tag_succeeds_silently() {
        let service = service();
        service
            .update(Uuid::new_v4(), Uuid::new_v4(), TagChanges::set_archived(true))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn delete_requires_archived() {
        let service = service();
        let owner = Uuid::new_v4();
        let id = service.create(owner, "keep").await.unwrap();

        let result = service.delete(owner, id).await;
        assert!(result.unwrap_err().is_not_found());

        service
            .update(owner, id, TagChanges::set_archived(true))
            .await
            .unwrap();
        service.delete(owner, id).await.unwrap();

        assert!(service.get_by_id(owner, id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn resolution_preserves_order_and_duplicates() {
        let service = service();
        let owner = Uuid::new_v4();

        let ids = service
            .resolve_tags_in_content(owner, "#x #x #y ")
            .await
            .unwrap();

        assert_eq!(ids.len(), 3);
        assert_eq!(ids[0], ids[1]);
        assert_ne!(ids[0], ids[2]);

        // Exactly one document per name exists afterwards.
        assert_eq!(service.get_by_name(owner, "x").await.unwrap().id, ids[0]);
        assert_eq!(service.get_by_name(owner, "y").await.unwrap().id, ids[2]);
    }

    #[tokio::test]
    async fn resolution_and_get_by_name_share_cache_payloads() {
        let service = service();
        let owner = Uuid::new_v4();

        let ids = service
            .resolve_tags_in_content(owner, "#shared ")
            .await
            .unwrap();
        // The resolve path populated the name key; the by-name read must
        // decode the same payload.
        let record = service.get_by_name(owner, "shared").await.unwrap();
        assert_eq!(record.id, ids[0]);
    }

    #[tokio::test]
    async fn content_without_tags_resolves_to_nothing() {
        let service = service();
        let ids = service
            .resolve_tags_in_content(Uuid::new_v4(), "plain prose")
            .await
            .unwrap();
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn list_clamps_oversized_pages() {
        let service = service();
        let owner = Uuid::new_v4();
        for i in 0..120 {
            service.create(owner, &format!("tag{i}")).await.unwrap();
        }

        let rows = service
            .list(
                owner,
                TagPage {
                    page: 0,
                    size: 10_000,
                    sort_by_create: true,
                    descending: false,
                    archived: false,
                },
            )
            .await
            .unwrap();
        assert_eq!(rows.len() as u64, TagServiceConfig::default().max_page_size);
    }

    /// Repo simulating a lost creation race: the first lookup misses,
    /// the insert collides with the concurrent winner, and the re-fetch
    /// sees the winner's record.
    struct RacingRepo {
        winner: TagRecord,
        lookup_missed: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl TagsRepo for RacingRepo {
        async fn insert(&self, _tag: NewTag) -> Result<TagRecord, RepoError> {
            Err(RepoError::duplicate(
                crate::application::repos::TAG_OWNER_NAME_CONSTRAINT,
            ))
        }

        async fn find_by_owner_and_name(
            &self,
            _owner: Uuid,
            _name: &str,
        ) -> Result<Option<TagRecord>, RepoError> {
            if self
                .lookup_missed
                .swap(true, std::sync::atomic::Ordering::SeqCst)
            {
                Ok(Some(self.winner.clone()))
            } else {
                Ok(None)
            }
        }

        async fn find_by_id(&self, _owner: Uuid, _id: Uuid) -> Result<Option<TagRecord>, RepoError> {
            unreachable!("not used in this test")
        }

        async fn find_page(
            &self,
            _owner: Uuid,
            _page: TagPage,
        ) -> Result<Vec<TagRecord>, RepoError> {
            unreachable!("not used in this test")
        }

        async fn update_fields(
            &self,
            _owner: Uuid,
            _id: Uuid,
            _changes: TagChanges,
        ) -> Result<Option<TagRecord>, RepoError> {
            unreachable!("not used in this test")
        }

        async fn delete_archived(&self, _owner: Uuid, _id: Uuid) -> Result<bool, RepoError> {
            unreachable!("not used in this test")
        }
    }

    /// Repo whose every call fails the way a lost database connection
    /// would.
    struct DownRepo;

    #[async_trait]
    impl TagsRepo for DownRepo {
        async fn insert(&self, _tag: NewTag) -> Result<TagRecord, RepoError> {
            Err(RepoError::from_persistence("connection reset by peer"))
        }

        async fn find_by_owner_and_name(
            &self,
            _owner: Uuid,
            _name: &str,
        ) -> Result<Option<TagRecord>, RepoError> {
            Err(RepoError::from_persistence("connection reset by peer"))
        }

        async fn find_by_id(&self, _owner: Uuid, _id: Uuid) -> Result<Option<TagRecord>, RepoError> {
            Err(RepoError::from_persistence("connection reset by peer"))
        }

        async fn find_page(
            &self,
            _owner: Uuid,
            _page: TagPage,
        ) -> Result<Vec<TagRecord>, RepoError> {
            Err(RepoError::from_persistence("connection reset by peer"))
        }

        async fn update_fields(
            &self,
            _owner: Uuid,
            _id: Uuid,
            _changes: TagChanges,
        ) -> Result<Option<TagRecord>, RepoError> {
            Err(RepoError::from_persistence("connection reset by peer"))
        }

        async fn delete_archived(&self, _owner: Uuid, _id: Uuid) -> Result<bool, RepoError> {
            Err(RepoError::from_persistence("connection reset by peer"))
        }
    }

    #[tokio::test]
    async fn store_failures_pass_through_unretried() {
        let service = service_with(Arc::new(DownRepo));
        let owner = Uuid::new_v4();

        let err = service.create(owner, "x").await.unwrap_err();
        assert!(matches!(err, TagError::Repo(RepoError::Persistence(_))));

        // The failed compute cached nothing: a by-name read fails the same
        // way instead of serving a phantom entry.
        let err = service.get_by_name(owner, "x").await.unwrap_err();
        assert!(matches!(err, TagError::Repo(RepoError::Persistence(_))));
    }

    #[tokio::test]
    async fn lost_creation_race_refetches_the_winner() {
        let owner = Uuid::new_v4();
        let winner = TagRecord {
            id: Uuid::new_v4(),
            owner,
            name: "contended".to_string(),
            archived: false,
            created_at: time::OffsetDateTime::now_utc(),
            updated_at: None,
        };
        let service = service_with(Arc::new(RacingRepo {
            winner: winner.clone(),
            lookup_missed: std::sync::atomic::AtomicBool::new(false),
        }));

        let resolved = service.get_or_create(owner, "contended").await.unwrap();
        assert_eq!(resolved, winner.id);
    }
}
