//! Membership query engine: direction-agnostic join queries across the
//! group/member/exception relation tables.
//!
//! Every listing resolves the same way regardless of access direction:
//! count the full result, clamp the requested page against that count,
//! then fetch one page ordered case-insensitively on the displayed name
//! (the NOCASE collation on name columns orders for free; member ids
//! order numerically). A zero count yields `None`, never an empty page.

use super::groups::Group;
use crate::page::{PAGE_SIZE, clamp_skip};
use crate::types::{EntityKind, ExceptionKind};
use sqlx::SqlitePool;

/// An exception name annotated with how many groups relate to it.
#[derive(Debug, Clone)]
pub struct ExceptionUsage {
    pub name: String,
    pub group_count: i64,
}

/// Read-only query interface over the relation tables.
pub struct MembershipQueries<'a> {
    pool: &'a SqlitePool,
}

impl<'a> MembershipQueries<'a> {
    /// Create a new membership query interface.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Is the entity related to this group? No enabled check.
    pub async fn is_member(
        &self,
        entity_id: u64,
        kind: EntityKind,
        group_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM members m
            JOIN group_members gm ON gm.member_id = m.id
            WHERE m.entity_id = ? AND m.kind = ? AND gm.group_id = ?
            "#,
        )
        .bind(entity_id as i64)
        .bind(kind.code())
        .bind(group_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Is the exception related to this group? No enabled check.
    pub async fn is_exempted(
        &self,
        name: &str,
        kind: ExceptionKind,
        group_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM exceptions e
            JOIN group_exceptions ge ON ge.exception_id = e.id
            WHERE e.name = ? AND e.kind = ? AND ge.group_id = ?
            "#,
        )
        .bind(name)
        .bind(kind.code())
        .bind(group_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count > 0)
    }

    /// The core authorization predicate: does at least one *enabled*
    /// group contain both the exception and the entity?
    pub async fn is_exempted_anywhere_enabled(
        &self,
        name: &str,
        exception_kind: ExceptionKind,
        entity_id: u64,
        entity_kind: EntityKind,
    ) -> Result<bool, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM exceptions e
            JOIN group_exceptions ge ON ge.exception_id = e.id
            JOIN groups g ON g.id = ge.group_id AND g.enabled = 1
            JOIN group_members gm ON gm.group_id = g.id
            JOIN members m ON m.id = gm.member_id
            WHERE e.name = ? AND e.kind = ?
              AND m.entity_id = ? AND m.kind = ?
            "#,
        )
        .bind(name)
        .bind(exception_kind.code())
        .bind(entity_id as i64)
        .bind(entity_kind.code())
        .fetch_one(self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Page of all groups, sorted case-insensitively by name.
    pub async fn groups(&self, page: i64) -> Result<Option<(Vec<Group>, i64)>, sqlx::Error> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM groups")
            .fetch_one(self.pool)
            .await?;
        if total <= 0 {
            return Ok(None);
        }

        let rows = sqlx::query_as::<_, (i64, String, bool, i64)>(
            r#"
            SELECT id, name, enabled, created_at
            FROM groups
            ORDER BY name ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(PAGE_SIZE)
        .bind(clamp_skip(page, total))
        .fetch_all(self.pool)
        .await?;

        Ok(Some((into_groups(rows), total)))
    }

    /// Page of groups that contain the given entity.
    pub async fn groups_for_member(
        &self,
        entity_id: u64,
        kind: EntityKind,
        page: i64,
    ) -> Result<Option<(Vec<Group>, i64)>, sqlx::Error> {
        const FROM: &str = r#"
            FROM groups g
            JOIN group_members gm ON gm.group_id = g.id
            JOIN members m ON m.id = gm.member_id
            WHERE m.entity_id = ? AND m.kind = ?
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {FROM}"))
            .bind(entity_id as i64)
            .bind(kind.code())
            .fetch_one(self.pool)
            .await?;
        if total <= 0 {
            return Ok(None);
        }

        let rows = sqlx::query_as::<_, (i64, String, bool, i64)>(&format!(
            "SELECT g.id, g.name, g.enabled, g.created_at {FROM} ORDER BY g.name ASC LIMIT ? OFFSET ?"
        ))
        .bind(entity_id as i64)
        .bind(kind.code())
        .bind(PAGE_SIZE)
        .bind(clamp_skip(page, total))
        .fetch_all(self.pool)
        .await?;

        Ok(Some((into_groups(rows), total)))
    }

    /// Page of groups that contain the given exception record.
    pub async fn groups_for_exception(
        &self,
        exception_id: i64,
        page: i64,
    ) -> Result<Option<(Vec<Group>, i64)>, sqlx::Error> {
        const FROM: &str = r#"
            FROM groups g
            JOIN group_exceptions ge ON ge.group_id = g.id
            WHERE ge.exception_id = ?
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {FROM}"))
            .bind(exception_id)
            .fetch_one(self.pool)
            .await?;
        if total <= 0 {
            return Ok(None);
        }

        let rows = sqlx::query_as::<_, (i64, String, bool, i64)>(&format!(
            "SELECT g.id, g.name, g.enabled, g.created_at {FROM} ORDER BY g.name ASC LIMIT ? OFFSET ?"
        ))
        .bind(exception_id)
        .bind(PAGE_SIZE)
        .bind(clamp_skip(page, total))
        .fetch_all(self.pool)
        .await?;

        Ok(Some((into_groups(rows), total)))
    }

    /// Page of groups, in any enabled state, that contain both the
    /// exception and the entity.
    pub async fn groups_exempting(
        &self,
        name: &str,
        exception_kind: ExceptionKind,
        entity_id: u64,
        entity_kind: EntityKind,
        page: i64,
    ) -> Result<Option<(Vec<Group>, i64)>, sqlx::Error> {
        const FROM: &str = r#"
            FROM groups g
            JOIN group_exceptions ge ON ge.group_id = g.id
            JOIN exceptions e ON e.id = ge.exception_id
            JOIN group_members gm ON gm.group_id = g.id
            JOIN members m ON m.id = gm.member_id
            WHERE e.name = ? AND e.kind = ?
              AND m.entity_id = ? AND m.kind = ?
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {FROM}"))
            .bind(name)
            .bind(exception_kind.code())
            .bind(entity_id as i64)
            .bind(entity_kind.code())
            .fetch_one(self.pool)
            .await?;
        if total <= 0 {
            return Ok(None);
        }

        let rows = sqlx::query_as::<_, (i64, String, bool, i64)>(&format!(
            "SELECT g.id, g.name, g.enabled, g.created_at {FROM} ORDER BY g.name ASC LIMIT ? OFFSET ?"
        ))
        .bind(name)
        .bind(exception_kind.code())
        .bind(entity_id as i64)
        .bind(entity_kind.code())
        .bind(PAGE_SIZE)
        .bind(clamp_skip(page, total))
        .fetch_all(self.pool)
        .await?;

        Ok(Some((into_groups(rows), total)))
    }

    /// Page of entity ids related to one group, ascending by id.
    pub async fn member_ids_of_group(
        &self,
        group_id: i64,
        kind: EntityKind,
        page: i64,
    ) -> Result<Option<(Vec<u64>, i64)>, sqlx::Error> {
        const FROM: &str = r#"
            FROM members m
            JOIN group_members gm ON gm.member_id = m.id
            WHERE gm.group_id = ? AND m.kind = ?
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {FROM}"))
            .bind(group_id)
            .bind(kind.code())
            .fetch_one(self.pool)
            .await?;
        if total <= 0 {
            return Ok(None);
        }

        let rows: Vec<i64> = sqlx::query_scalar(&format!(
            "SELECT m.entity_id {FROM} ORDER BY m.entity_id ASC LIMIT ? OFFSET ?"
        ))
        .bind(group_id)
        .bind(kind.code())
        .bind(PAGE_SIZE)
        .bind(clamp_skip(page, total))
        .fetch_all(self.pool)
        .await?;

        Ok(Some((rows.into_iter().map(|id| id as u64).collect(), total)))
    }

    /// Page of exception names related to one group.
    pub async fn exception_names_of_group(
        &self,
        group_id: i64,
        kind: ExceptionKind,
        page: i64,
    ) -> Result<Option<(Vec<String>, i64)>, sqlx::Error> {
        const FROM: &str = r#"
            FROM exceptions e
            JOIN group_exceptions ge ON ge.exception_id = e.id
            WHERE ge.group_id = ? AND e.kind = ?
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {FROM}"))
            .bind(group_id)
            .bind(kind.code())
            .fetch_one(self.pool)
            .await?;
        if total <= 0 {
            return Ok(None);
        }

        let rows: Vec<String> = sqlx::query_scalar(&format!(
            "SELECT e.name {FROM} ORDER BY e.name ASC LIMIT ? OFFSET ?"
        ))
        .bind(group_id)
        .bind(kind.code())
        .bind(PAGE_SIZE)
        .bind(clamp_skip(page, total))
        .fetch_all(self.pool)
        .await?;

        Ok(Some((rows, total)))
    }

    /// Page of all exception names of a kind, each with the number of
    /// groups currently relating to it (zero included).
    pub async fn exception_usage(
        &self,
        kind: ExceptionKind,
        page: i64,
    ) -> Result<Option<(Vec<ExceptionUsage>, i64)>, sqlx::Error> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM exceptions WHERE kind = ?")
            .bind(kind.code())
            .fetch_one(self.pool)
            .await?;
        if total <= 0 {
            return Ok(None);
        }

        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT e.name, COUNT(ge.group_id)
            FROM exceptions e
            LEFT JOIN group_exceptions ge ON ge.exception_id = e.id
            WHERE e.kind = ?
            GROUP BY e.id
            ORDER BY e.name ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(kind.code())
        .bind(PAGE_SIZE)
        .bind(clamp_skip(page, total))
        .fetch_all(self.pool)
        .await?;

        Ok(Some((
            rows.into_iter()
                .map(|(name, group_count)| ExceptionUsage { name, group_count })
                .collect(),
            total,
        )))
    }

    /// Page of exception names reachable by the entity across all
    /// *enabled* groups.
    pub async fn exception_names_for_member(
        &self,
        kind: ExceptionKind,
        entity_id: u64,
        entity_kind: EntityKind,
        page: i64,
    ) -> Result<Option<(Vec<String>, i64)>, sqlx::Error> {
        const FROM: &str = r#"
            FROM members m
            JOIN group_members gm ON gm.member_id = m.id
            JOIN groups g ON g.id = gm.group_id AND g.enabled = 1
            JOIN group_exceptions ge ON ge.group_id = g.id
            JOIN exceptions e ON e.id = ge.exception_id AND e.kind = ?
            WHERE m.entity_id = ? AND m.kind = ?
        "#;

        // Distinct: several enabled groups may carry the same exception
        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(DISTINCT e.id) {FROM}"))
            .bind(kind.code())
            .bind(entity_id as i64)
            .bind(entity_kind.code())
            .fetch_one(self.pool)
            .await?;
        if total <= 0 {
            return Ok(None);
        }

        let rows: Vec<String> = sqlx::query_scalar(&format!(
            "SELECT DISTINCT e.name {FROM} ORDER BY e.name ASC LIMIT ? OFFSET ?"
        ))
        .bind(kind.code())
        .bind(entity_id as i64)
        .bind(entity_kind.code())
        .bind(PAGE_SIZE)
        .bind(clamp_skip(page, total))
        .fetch_all(self.pool)
        .await?;

        Ok(Some((rows, total)))
    }
}

fn into_groups(rows: Vec<(i64, String, bool, i64)>) -> Vec<Group> {
    rows.into_iter()
        .map(|(id, name, enabled, created_at)| Group {
            id,
            name,
            enabled,
            created_at,
        })
        .collect()
}
