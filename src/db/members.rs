//! Entity member repository: tagged external references and their
//! group relations.
//!
//! Bulk operations are diff-based and idempotent: only previously
//! missing (or previously present, for removal) relation rows are
//! touched, and exactly that difference is reported back. The whole
//! diff runs inside a single transaction so a bulk call never commits
//! partially.

use super::DbError;
use crate::types::EntityKind;
use sqlx::SqlitePool;
use tracing::debug;

/// A registered entity member.
#[derive(Debug, Clone)]
pub struct Member {
    pub id: i64,
    pub entity_id: u64,
    pub kind: EntityKind,
    pub created_at: i64,
}

/// Repository for entity member operations.
pub struct MemberRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> MemberRepository<'a> {
    /// Create a new member repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Register entity records without touching any group relation.
    ///
    /// Existing (id, kind) pairs are skipped; only the newly created
    /// records are returned.
    pub async fn bulk_register(
        &self,
        kind: EntityKind,
        ids: &[u64],
    ) -> Result<Vec<Member>, DbError> {
        let ids = dedup_sorted(ids);
        let now = chrono::Utc::now().timestamp();

        let mut tx = self.pool.begin().await?;
        let mut created = Vec::new();

        for &entity_id in &ids {
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO members (entity_id, kind, created_at)
                VALUES (?, ?, ?)
                "#,
            )
            .bind(entity_id as i64)
            .bind(kind.code())
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() > 0 {
                created.push(Member {
                    id: result.last_insert_rowid(),
                    entity_id,
                    kind,
                    created_at: now,
                });
            }
        }

        tx.commit().await?;

        debug!(kind = %kind, requested = ids.len(), created = created.len(), "Bulk member register");
        Ok(created)
    }

    /// Relate entities to a group, creating missing member rows first.
    ///
    /// Returns the external ids that were newly related; entities already
    /// related to the group (and duplicates in the input) are silently
    /// excluded. Repeating the call returns an empty vec.
    pub async fn add_to_group(
        &self,
        group_id: i64,
        kind: EntityKind,
        ids: &[u64],
    ) -> Result<Vec<u64>, DbError> {
        let ids = dedup_sorted(ids);
        let now = chrono::Utc::now().timestamp();

        let mut tx = self.pool.begin().await?;
        let mut added = Vec::new();

        for &entity_id in &ids {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO members (entity_id, kind, created_at)
                VALUES (?, ?, ?)
                "#,
            )
            .bind(entity_id as i64)
            .bind(kind.code())
            .bind(now)
            .execute(&mut *tx)
            .await?;

            let member_id: i64 = sqlx::query_scalar(
                "SELECT id FROM members WHERE entity_id = ? AND kind = ?",
            )
            .bind(entity_id as i64)
            .bind(kind.code())
            .fetch_one(&mut *tx)
            .await?;

            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO group_members (group_id, member_id)
                VALUES (?, ?)
                "#,
            )
            .bind(group_id)
            .bind(member_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() > 0 {
                added.push(entity_id);
            }
        }

        tx.commit().await?;

        debug!(group_id, kind = %kind, requested = ids.len(), added = added.len(), "Bulk member add");
        Ok(added)
    }

    /// Unrelate entities from a group.
    ///
    /// Returns the external ids whose relation actually existed and was
    /// removed. Member rows themselves are never deleted here.
    pub async fn remove_from_group(
        &self,
        group_id: i64,
        kind: EntityKind,
        ids: &[u64],
    ) -> Result<Vec<u64>, DbError> {
        let ids = dedup_sorted(ids);

        let mut tx = self.pool.begin().await?;
        let mut removed = Vec::new();

        for &entity_id in &ids {
            let member_id: Option<i64> = sqlx::query_scalar(
                "SELECT id FROM members WHERE entity_id = ? AND kind = ?",
            )
            .bind(entity_id as i64)
            .bind(kind.code())
            .fetch_optional(&mut *tx)
            .await?;

            let Some(member_id) = member_id else {
                continue;
            };

            let result = sqlx::query(
                "DELETE FROM group_members WHERE group_id = ? AND member_id = ?",
            )
            .bind(group_id)
            .bind(member_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() > 0 {
                removed.push(entity_id);
            }
        }

        tx.commit().await?;

        debug!(group_id, kind = %kind, requested = ids.len(), removed = removed.len(), "Bulk member remove");
        Ok(removed)
    }

    /// Hard-delete a member record regardless of group.
    /// Relation rows are removed via CASCADE. Returns false if absent.
    pub async fn purge(&self, kind: EntityKind, entity_id: u64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM members WHERE entity_id = ? AND kind = ?")
            .bind(entity_id as i64)
            .bind(kind.code())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove all member relations for a group, optionally filtered by
    /// kind. Member rows are kept. Returns the number of relations removed.
    pub async fn clear_group(
        &self,
        group_id: i64,
        kind: Option<EntityKind>,
    ) -> Result<u64, DbError> {
        let result = match kind {
            Some(kind) => {
                sqlx::query(
                    r#"
                    DELETE FROM group_members
                    WHERE group_id = ? AND member_id IN
                        (SELECT id FROM members WHERE kind = ?)
                    "#,
                )
                .bind(group_id)
                .bind(kind.code())
                .execute(self.pool)
                .await?
            }
            None => {
                sqlx::query("DELETE FROM group_members WHERE group_id = ?")
                    .bind(group_id)
                    .execute(self.pool)
                    .await?
            }
        };

        Ok(result.rows_affected())
    }

    /// Find a member record by (external id, kind).
    pub async fn find(&self, kind: EntityKind, entity_id: u64) -> Result<Option<Member>, DbError> {
        let row = sqlx::query_as::<_, (i64, i64, i64, i64)>(
            r#"
            SELECT id, entity_id, kind, created_at
            FROM members
            WHERE entity_id = ? AND kind = ?
            "#,
        )
        .bind(entity_id as i64)
        .bind(kind.code())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|(id, entity_id, _, created_at)| Member {
            id,
            entity_id: entity_id as u64,
            kind,
            created_at,
        }))
    }
}

/// Collapse duplicates and fix an order for deterministic results.
fn dedup_sorted(ids: &[u64]) -> Vec<u64> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}
