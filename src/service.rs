//! Caller-facing whitelist service.
//!
//! Thin facade over the repositories and the membership query engine:
//! resolves group names, applies the listing format (enabled markers,
//! relation-count annotations), and routes member listings through the
//! rendering hook. All group-scoped operations distinguish "group does
//! not exist" ([`DbError::GroupNotFound`]) from "group exists, nothing
//! matched" (`Ok(None)` / empty vec).

use crate::db::{Database, DbError, Group};
use crate::render::EntityRenderer;
use crate::types::{EntityKind, ExceptionKind};

/// Marker prefixes for group names in listings.
const ENABLED_MARK: &str = "✅ ";
const DISABLED_MARK: &str = "❌ ";

/// One page of formatted listing entries plus the total result count.
#[derive(Debug, Clone)]
pub struct Listing {
    pub entries: Vec<String>,
    pub total: i64,
}

/// Whitelist service facade.
#[derive(Clone)]
pub struct WhitelistService {
    db: Database,
}

impl WhitelistService {
    /// Create a new whitelist service over a database handle.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Access the underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }

    // ------------------------------------------------------------------
    // Group lifecycle
    // ------------------------------------------------------------------

    /// Create a group. Fails with [`DbError::GroupExists`] on a
    /// case-insensitive name collision.
    pub async fn create_group(&self, name: &str) -> Result<Group, DbError> {
        self.db.groups().create(name).await
    }

    /// Rename a group. `Ok(None)` if `old` does not exist;
    /// [`DbError::GroupExists`] if `new` collides with another group.
    pub async fn rename_group(&self, old: &str, new: &str) -> Result<Option<Group>, DbError> {
        self.db.groups().rename(old, new).await
    }

    /// Enable or disable a group. Returns false if the group is absent.
    pub async fn set_group_enabled(&self, name: &str, enabled: bool) -> Result<bool, DbError> {
        self.db.groups().set_enabled(name, enabled).await
    }

    /// Delete a group and all of its relations. Returns false if absent.
    pub async fn delete_group(&self, name: &str) -> Result<bool, DbError> {
        self.db.groups().delete(name).await
    }

    /// Look up a group by name, case-insensitively.
    pub async fn find_group(&self, name: &str) -> Result<Option<Group>, DbError> {
        self.db.groups().find_by_name(name).await
    }

    // ------------------------------------------------------------------
    // Bulk relation management
    // ------------------------------------------------------------------

    /// Relate entities to a named group; returns the newly related ids.
    pub async fn add_members(
        &self,
        group: &str,
        kind: EntityKind,
        ids: &[u64],
    ) -> Result<Vec<u64>, DbError> {
        let group = self.db.groups().require(group).await?;
        self.db.members().add_to_group(group.id, kind, ids).await
    }

    /// Unrelate entities from a named group; returns the ids actually removed.
    pub async fn remove_members(
        &self,
        group: &str,
        kind: EntityKind,
        ids: &[u64],
    ) -> Result<Vec<u64>, DbError> {
        let group = self.db.groups().require(group).await?;
        self.db.members().remove_from_group(group.id, kind, ids).await
    }

    /// Relate exceptions to a named group; returns the newly related names.
    pub async fn add_exceptions(
        &self,
        group: &str,
        kind: ExceptionKind,
        names: &[&str],
    ) -> Result<Vec<String>, DbError> {
        let group = self.db.groups().require(group).await?;
        self.db.exceptions().add_to_group(group.id, kind, names).await
    }

    /// Unrelate exceptions from a named group; returns the names actually removed.
    pub async fn remove_exceptions(
        &self,
        group: &str,
        kind: ExceptionKind,
        names: &[&str],
    ) -> Result<Vec<String>, DbError> {
        let group = self.db.groups().require(group).await?;
        self.db
            .exceptions()
            .remove_from_group(group.id, kind, names)
            .await
    }

    /// Hard-delete an entity record everywhere. Returns false if absent.
    pub async fn purge_member(&self, kind: EntityKind, id: u64) -> Result<bool, DbError> {
        self.db.members().purge(kind, id).await
    }

    /// Hard-delete an exception record everywhere. Returns false if absent.
    pub async fn purge_exception(&self, kind: ExceptionKind, name: &str) -> Result<bool, DbError> {
        self.db.exceptions().purge(kind, name).await
    }

    /// Remove a group's member relations, optionally filtered by kind.
    pub async fn clear_members(
        &self,
        group: &str,
        kind: Option<EntityKind>,
    ) -> Result<u64, DbError> {
        let group = self.db.groups().require(group).await?;
        self.db.members().clear_group(group.id, kind).await
    }

    /// Remove a group's exception relations, optionally filtered by kind.
    pub async fn clear_exceptions(
        &self,
        group: &str,
        kind: Option<ExceptionKind>,
    ) -> Result<u64, DbError> {
        let group = self.db.groups().require(group).await?;
        self.db.exceptions().clear_group(group.id, kind).await
    }

    // ------------------------------------------------------------------
    // Predicates
    // ------------------------------------------------------------------

    /// Is the entity a member of the named group?
    pub async fn is_member(
        &self,
        id: u64,
        kind: EntityKind,
        group: &str,
    ) -> Result<bool, DbError> {
        let group = self.db.groups().require(group).await?;
        Ok(self.db.membership().is_member(id, kind, group.id).await?)
    }

    /// Is the exception exempted within the named group?
    pub async fn is_exempted(
        &self,
        name: &str,
        kind: ExceptionKind,
        group: &str,
    ) -> Result<bool, DbError> {
        let group = self.db.groups().require(group).await?;
        Ok(self.db.membership().is_exempted(name, kind, group.id).await?)
    }

    /// True iff at least one enabled group contains both the exception
    /// and the entity. The only predicate that filters on the enabled flag.
    pub async fn is_exempted_anywhere_enabled(
        &self,
        name: &str,
        exception_kind: ExceptionKind,
        entity_id: u64,
        entity_kind: EntityKind,
    ) -> Result<bool, DbError> {
        Ok(self
            .db
            .membership()
            .is_exempted_anywhere_enabled(name, exception_kind, entity_id, entity_kind)
            .await?)
    }

    // ------------------------------------------------------------------
    // Listings
    // ------------------------------------------------------------------

    /// All groups, with enabled markers.
    pub async fn list_groups(&self, page: i64) -> Result<Option<Listing>, DbError> {
        Ok(self.db.membership().groups(page).await?.map(group_listing))
    }

    /// Groups containing the given entity, with enabled markers.
    pub async fn list_groups_for_member(
        &self,
        id: u64,
        kind: EntityKind,
        page: i64,
    ) -> Result<Option<Listing>, DbError> {
        Ok(self
            .db
            .membership()
            .groups_for_member(id, kind, page)
            .await?
            .map(group_listing))
    }

    /// Groups containing the given exception name, with enabled markers.
    /// `Ok(None)` also covers an unknown exception record.
    pub async fn list_groups_for_exception(
        &self,
        name: &str,
        kind: ExceptionKind,
        page: i64,
    ) -> Result<Option<Listing>, DbError> {
        let Some(exception) = self.db.exceptions().find(kind, name).await? else {
            return Ok(None);
        };

        Ok(self
            .db
            .membership()
            .groups_for_exception(exception.id, page)
            .await?
            .map(group_listing))
    }

    /// Groups, in any enabled state, containing both the exception and
    /// the entity — the paged companion of the enabled-scoped predicate.
    pub async fn list_groups_exempting(
        &self,
        name: &str,
        exception_kind: ExceptionKind,
        entity_id: u64,
        entity_kind: EntityKind,
        page: i64,
    ) -> Result<Option<Listing>, DbError> {
        Ok(self
            .db
            .membership()
            .groups_exempting(name, exception_kind, entity_id, entity_kind, page)
            .await?
            .map(group_listing))
    }

    /// Entity members of a named group, rendered through the hook.
    pub async fn list_group_members(
        &self,
        group: &str,
        kind: EntityKind,
        page: i64,
        renderer: &dyn EntityRenderer,
    ) -> Result<Option<Listing>, DbError> {
        let group = self.db.groups().require(group).await?;

        let Some((ids, total)) = self
            .db
            .membership()
            .member_ids_of_group(group.id, kind, page)
            .await?
        else {
            return Ok(None);
        };

        Ok(Some(Listing {
            entries: renderer.render_many(kind, &ids),
            total,
        }))
    }

    /// Exception names of a named group.
    pub async fn list_group_exceptions(
        &self,
        group: &str,
        kind: ExceptionKind,
        page: i64,
    ) -> Result<Option<Listing>, DbError> {
        let group = self.db.groups().require(group).await?;

        Ok(self
            .db
            .membership()
            .exception_names_of_group(group.id, kind, page)
            .await?
            .map(|(names, total)| Listing {
                entries: names,
                total,
            }))
    }

    /// All exception names of a kind, annotated with their relation count.
    pub async fn list_exceptions(
        &self,
        kind: ExceptionKind,
        page: i64,
    ) -> Result<Option<Listing>, DbError> {
        Ok(self
            .db
            .membership()
            .exception_usage(kind, page)
            .await?
            .map(|(usages, total)| Listing {
                entries: usages
                    .into_iter()
                    .map(|u| {
                        let noun = if u.group_count == 1 { "list" } else { "lists" };
                        format!("{} ({} {})", u.name, u.group_count, noun)
                    })
                    .collect(),
                total,
            }))
    }

    /// Exception names usable by the entity across all enabled groups.
    pub async fn list_exceptions_for_member(
        &self,
        kind: ExceptionKind,
        entity_id: u64,
        entity_kind: EntityKind,
        page: i64,
    ) -> Result<Option<Listing>, DbError> {
        Ok(self
            .db
            .membership()
            .exception_names_for_member(kind, entity_id, entity_kind, page)
            .await?
            .map(|(names, total)| Listing {
                entries: names,
                total,
            }))
    }
}

/// Format a group for display: enabled marker plus case-preserved name.
fn format_group(group: &Group) -> String {
    let mark = if group.enabled {
        ENABLED_MARK
    } else {
        DISABLED_MARK
    };
    format!("{mark}{}", group.name)
}

fn group_listing((groups, total): (Vec<Group>, i64)) -> Listing {
    Listing {
        entries: groups.iter().map(format_group).collect(),
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RawRenderer;

    async fn service() -> WhitelistService {
        WhitelistService::new(Database::new(":memory:").await.unwrap())
    }

    #[tokio::test]
    async fn test_group_markers_in_listing() {
        let svc = service().await;
        svc.create_group("alpha").await.unwrap();
        svc.create_group("beta").await.unwrap();
        svc.set_group_enabled("beta", false).await.unwrap();

        let listing = svc.list_groups(0).await.unwrap().unwrap();
        assert_eq!(listing.total, 2);
        assert_eq!(listing.entries, vec!["✅ alpha", "❌ beta"]);
    }

    #[tokio::test]
    async fn test_group_scoped_ops_distinguish_missing_group() {
        let svc = service().await;

        let err = svc
            .add_members("ghost", EntityKind::User, &[1])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::GroupNotFound(_)));

        // Existing group with no matches is Ok(None), not an error
        svc.create_group("real").await.unwrap();
        let listing = svc
            .list_group_members("real", EntityKind::User, 0, &RawRenderer)
            .await
            .unwrap();
        assert!(listing.is_none());
    }

    #[tokio::test]
    async fn test_exception_usage_annotations() {
        let svc = service().await;
        svc.create_group("a").await.unwrap();
        svc.create_group("b").await.unwrap();

        svc.add_exceptions("a", ExceptionKind::Command, &["play", "skip"])
            .await
            .unwrap();
        svc.add_exceptions("b", ExceptionKind::Command, &["play"])
            .await
            .unwrap();
        svc.remove_exceptions("a", ExceptionKind::Command, &["skip"])
            .await
            .unwrap();

        let listing = svc
            .list_exceptions(ExceptionKind::Command, 0)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(listing.entries, vec!["play (2 lists)", "skip (0 lists)"]);
    }

    #[tokio::test]
    async fn test_members_render_through_hook() {
        let svc = service().await;
        svc.create_group("vip").await.unwrap();
        svc.add_members("vip", EntityKind::User, &[20, 10])
            .await
            .unwrap();

        struct Mention;
        impl EntityRenderer for Mention {
            fn render(&self, _kind: EntityKind, id: u64) -> String {
                format!("<@{id}>")
            }
        }

        let listing = svc
            .list_group_members("vip", EntityKind::User, 0, &Mention)
            .await
            .unwrap()
            .unwrap();
        // Ascending id order, rendered
        assert_eq!(listing.entries, vec!["<@10>", "<@20>"]);
    }
}
