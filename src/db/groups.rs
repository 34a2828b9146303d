//! Group repository: whitelist group lifecycle.
//!
//! Group names are case-preserving but unique case-insensitively
//! (COLLATE NOCASE on the column). Deleting a group cascades both
//! relation sets.

use super::DbError;
use sqlx::SqlitePool;
use tracing::info;

/// A whitelist group.
#[derive(Debug, Clone)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub enabled: bool,
    pub created_at: i64,
}

/// Repository for group lifecycle operations.
pub struct GroupRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> GroupRepository<'a> {
    /// Create a new group repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new group.
    ///
    /// Fails with [`DbError::GroupExists`] if a group with the same
    /// case-insensitive name already exists.
    pub async fn create(&self, name: &str) -> Result<Group, DbError> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO groups (name, enabled, created_at)
            VALUES (?, 1, ?)
            "#,
        )
        .bind(name)
        .bind(now)
        .execute(self.pool)
        .await
        .map_err(|e| {
            // The UNIQUE index is NOCASE, so this catches any casing
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return DbError::GroupExists(name.to_string());
            }
            DbError::from(e)
        })?;

        let id = result.last_insert_rowid();
        info!(group = %name, id, "Group created");

        Ok(Group {
            id,
            name: name.to_string(),
            enabled: true,
            created_at: now,
        })
    }

    /// Rename a group.
    ///
    /// Returns `Ok(None)` if `old` does not name a group. Renaming onto a
    /// name held by a *different* group is rejected with
    /// [`DbError::GroupExists`]; re-casing a group's own name is allowed.
    pub async fn rename(&self, old: &str, new: &str) -> Result<Option<Group>, DbError> {
        let Some(group) = self.find_by_name(old).await? else {
            return Ok(None);
        };

        if let Some(other) = self.find_by_name(new).await?
            && other.id != group.id
        {
            return Err(DbError::GroupExists(new.to_string()));
        }

        sqlx::query("UPDATE groups SET name = ? WHERE id = ?")
            .bind(new)
            .bind(group.id)
            .execute(self.pool)
            .await?;

        info!(from = %old, to = %new, "Group renamed");

        Ok(Some(Group {
            name: new.to_string(),
            ..group
        }))
    }

    /// Enable or disable a group. Returns false if the group does not exist.
    pub async fn set_enabled(&self, name: &str, enabled: bool) -> Result<bool, DbError> {
        let result = sqlx::query("UPDATE groups SET enabled = ? WHERE name = ? COLLATE NOCASE")
            .bind(enabled)
            .bind(name)
            .execute(self.pool)
            .await?;

        let found = result.rows_affected() > 0;
        if found {
            info!(group = %name, enabled, "Group enabled flag set");
        }
        Ok(found)
    }

    /// Delete a group and both relation sets referencing it.
    /// Returns false if the group does not exist.
    pub async fn delete(&self, name: &str) -> Result<bool, DbError> {
        // Relation rows are deleted via CASCADE
        let result = sqlx::query("DELETE FROM groups WHERE name = ? COLLATE NOCASE")
            .bind(name)
            .execute(self.pool)
            .await?;

        let found = result.rows_affected() > 0;
        if found {
            info!(group = %name, "Group deleted");
        }
        Ok(found)
    }

    /// Find a group by name, case-insensitively.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Group>, DbError> {
        let row = sqlx::query_as::<_, (i64, String, bool, i64)>(
            r#"
            SELECT id, name, enabled, created_at
            FROM groups
            WHERE name = ? COLLATE NOCASE
            "#,
        )
        .bind(name)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|(id, name, enabled, created_at)| Group {
            id,
            name,
            enabled,
            created_at,
        }))
    }

    /// Resolve a group by name or fail with [`DbError::GroupNotFound`].
    pub async fn require(&self, name: &str) -> Result<Group, DbError> {
        self.find_by_name(name)
            .await?
            .ok_or_else(|| DbError::GroupNotFound(name.to_string()))
    }
}
