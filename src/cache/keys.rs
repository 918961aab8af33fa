//! Cache key namespaces for tag lookups.
//!
//! By-name and by-id entries live in disjoint namespaces (`Tag-` vs `#-`)
//! so a rename never collides with an id-keyed entry. Both namespaces are
//! scoped by owner: tag names are private to their owner, and an unscoped
//! key would let one principal read another's cached record. Deployments
//! migrating from the legacy unscoped formats (`Tag-<name>`, `#-<hexID>`)
//! must flush the shared cache when rolling this scheme out.

use uuid::Uuid;

/// Key for by-name lookups: `Tag-<owner>-<name>`.
pub fn tag_name_key(owner: Uuid, name: &str) -> String {
    format!("Tag-{}-{name}", owner.simple())
}

/// Key for by-id lookups: `#-<owner>-<id>`.
pub fn tag_id_key(owner: Uuid, id: Uuid) -> String {
    format!("#-{}-{}", owner.simple(), id.simple())
}
