//! Domain entities mirrored from persistent storage.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// A hashtag owned by a single principal.
///
/// `(owner, name)` is unique among live tags; the repository layer enforces
/// the constraint and reports violations as duplicates. `updated_at` stays
/// `None` until the first partial update touches the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagRecord {
    pub id: Uuid,
    pub owner: Uuid,
    pub name: String,
    pub archived: bool,
    #[serde(with = "time::serde::timestamp")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::timestamp::option")]
    pub updated_at: Option<OffsetDateTime>,
}
