//! Exception record repository: named command/module exemptions and
//! their group relations.
//!
//! Names are case-preserving in storage and case-insensitive everywhere
//! else (lookups, uniqueness, input deduplication). Exceptions join
//! directly to groups; there is no other anchor.

use super::DbError;
use crate::types::ExceptionKind;
use sqlx::SqlitePool;
use std::collections::HashSet;
use tracing::debug;

/// A registered exception record.
#[derive(Debug, Clone)]
pub struct Exception {
    pub id: i64,
    pub name: String,
    pub kind: ExceptionKind,
    pub created_at: i64,
}

/// Repository for exception record operations.
pub struct ExceptionRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ExceptionRepository<'a> {
    /// Create a new exception repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Relate exceptions to a group, creating missing records first.
    ///
    /// Returns the stored (case-preserved) names that were newly related;
    /// names already related and case-insensitive duplicates in the input
    /// are silently excluded. Repeating the call returns an empty vec.
    pub async fn add_to_group(
        &self,
        group_id: i64,
        kind: ExceptionKind,
        names: &[&str],
    ) -> Result<Vec<String>, DbError> {
        let names = dedup_nocase(names);
        let now = chrono::Utc::now().timestamp();

        let mut tx = self.pool.begin().await?;
        let mut added = Vec::new();

        for name in &names {
            // The UNIQUE(name, kind) index is NOCASE, so any casing of an
            // existing name is ignored here and the stored casing wins.
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO exceptions (name, kind, created_at)
                VALUES (?, ?, ?)
                "#,
            )
            .bind(name)
            .bind(kind.code())
            .bind(now)
            .execute(&mut *tx)
            .await?;

            let (exception_id, stored_name): (i64, String) = sqlx::query_as(
                "SELECT id, name FROM exceptions WHERE name = ? AND kind = ?",
            )
            .bind(name)
            .bind(kind.code())
            .fetch_one(&mut *tx)
            .await?;

            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO group_exceptions (group_id, exception_id)
                VALUES (?, ?)
                "#,
            )
            .bind(group_id)
            .bind(exception_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() > 0 {
                added.push(stored_name);
            }
        }

        tx.commit().await?;

        debug!(group_id, kind = %kind, requested = names.len(), added = added.len(), "Bulk exception add");
        Ok(added)
    }

    /// Unrelate exceptions from a group.
    ///
    /// Returns the stored names whose relation actually existed and was
    /// removed. Exception records themselves are never deleted here.
    pub async fn remove_from_group(
        &self,
        group_id: i64,
        kind: ExceptionKind,
        names: &[&str],
    ) -> Result<Vec<String>, DbError> {
        let names = dedup_nocase(names);

        let mut tx = self.pool.begin().await?;
        let mut removed = Vec::new();

        for name in &names {
            let row: Option<(i64, String)> = sqlx::query_as(
                "SELECT id, name FROM exceptions WHERE name = ? AND kind = ?",
            )
            .bind(name)
            .bind(kind.code())
            .fetch_optional(&mut *tx)
            .await?;

            let Some((exception_id, stored_name)) = row else {
                continue;
            };

            let result = sqlx::query(
                "DELETE FROM group_exceptions WHERE group_id = ? AND exception_id = ?",
            )
            .bind(group_id)
            .bind(exception_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() > 0 {
                removed.push(stored_name);
            }
        }

        tx.commit().await?;

        debug!(group_id, kind = %kind, requested = names.len(), removed = removed.len(), "Bulk exception remove");
        Ok(removed)
    }

    /// Hard-delete an exception record regardless of group.
    /// Relation rows are removed via CASCADE. Returns false if absent.
    pub async fn purge(&self, kind: ExceptionKind, name: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM exceptions WHERE name = ? AND kind = ?")
            .bind(name)
            .bind(kind.code())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove all exception relations for a group, optionally filtered by
    /// kind. Exception rows are kept. Returns the number of relations removed.
    pub async fn clear_group(
        &self,
        group_id: i64,
        kind: Option<ExceptionKind>,
    ) -> Result<u64, DbError> {
        let result = match kind {
            Some(kind) => {
                sqlx::query(
                    r#"
                    DELETE FROM group_exceptions
                    WHERE group_id = ? AND exception_id IN
                        (SELECT id FROM exceptions WHERE kind = ?)
                    "#,
                )
                .bind(group_id)
                .bind(kind.code())
                .execute(self.pool)
                .await?
            }
            None => {
                sqlx::query("DELETE FROM group_exceptions WHERE group_id = ?")
                    .bind(group_id)
                    .execute(self.pool)
                    .await?
            }
        };

        Ok(result.rows_affected())
    }

    /// Find an exception record by (name, kind), case-insensitively.
    pub async fn find(&self, kind: ExceptionKind, name: &str) -> Result<Option<Exception>, DbError> {
        let row = sqlx::query_as::<_, (i64, String, i64)>(
            r#"
            SELECT id, name, created_at
            FROM exceptions
            WHERE name = ? AND kind = ?
            "#,
        )
        .bind(name)
        .bind(kind.code())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|(id, name, created_at)| Exception {
            id,
            name,
            kind,
            created_at,
        }))
    }
}

/// Collapse case-insensitive duplicates, keeping the first spelling.
fn dedup_nocase(names: &[&str]) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .iter()
        .filter(|n| seen.insert(n.to_lowercase()))
        .map(|n| n.to_string())
        .collect()
}
