//! Migration history tracking.
//!
//! Manages the `_shale_migrations` table recording which migrations have
//! been applied to the database.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;

use crate::error::{MigrateError, Result};

/// Name of the history table; introspection skips it.
pub const HISTORY_TABLE: &str = "_shale_migrations";

/// SQL to create the history table.
pub const CREATE_HISTORY_TABLE_SQL: &str = r"
CREATE TABLE IF NOT EXISTS _shale_migrations (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// A record of an applied migration.
#[derive(Debug, Clone)]
pub struct AppliedMigration {
    /// Migration identifier.
    pub id: String,
    /// Human-chosen migration name.
    pub name: String,
    /// When the migration was applied.
    pub applied_at: DateTime<Utc>,
}

/// Manages the migration history in the database.
pub struct MigrationHistory {
    pool: SqlitePool,
}

impl MigrationHistory {
    /// Creates a new history manager.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Ensures the history table exists.
    ///
    /// # Errors
    ///
    /// Returns a database error when the table cannot be created.
    pub async fn ensure_table(&self) -> Result<()> {
        sqlx::query(CREATE_HISTORY_TABLE_SQL)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Records a migration as applied.
    ///
    /// # Errors
    ///
    /// Returns a database error (including on duplicate id).
    pub async fn record_applied(&self, id: &str, name: &str) -> Result<()> {
        sqlx::query("INSERT INTO _shale_migrations (id, name) VALUES (?, ?)")
            .bind(id)
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Removes a migration record (for rollback).
    ///
    /// # Errors
    ///
    /// [`MigrateError::MigrationNotFound`] when the id was never recorded.
    pub async fn record_unapplied(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM _shale_migrations WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(MigrateError::MigrationNotFound { id: id.to_string() });
        }
        Ok(())
    }

    /// Checks whether a migration has been applied.
    ///
    /// # Errors
    ///
    /// Returns a database error when the query fails.
    pub async fn is_applied(&self, id: &str) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM _shale_migrations WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// All applied migrations, in identifier (creation) order.
    ///
    /// # Errors
    ///
    /// Returns a database error when the query fails.
    pub async fn get_applied(&self) -> Result<Vec<AppliedMigration>> {
        let rows: Vec<(String, String, String)> =
            sqlx::query_as("SELECT id, name, applied_at FROM _shale_migrations ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, applied_at)| AppliedMigration {
                id,
                name,
                applied_at: parse_applied_at(&applied_at),
            })
            .collect())
    }

    /// The most recently applied migration, if any.
    ///
    /// # Errors
    ///
    /// Returns a database error when the query fails.
    pub async fn get_last_applied(&self) -> Result<Option<AppliedMigration>> {
        Ok(self.get_applied().await?.pop())
    }
}

fn parse_applied_at(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| {
            // SQLite datetime('now') format fallback.
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .map(|dt| dt.and_utc())
                .unwrap_or_else(|_| Utc::now())
        })
}
