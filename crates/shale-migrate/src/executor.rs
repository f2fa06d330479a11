//! Migration execution.
//!
//! Renders a migration's operations through a dialect and runs the
//! resulting statements against the database, recording history. Comment
//! statements (the no-changes marker and unsupported-change notices) are
//! printed in dry runs but never executed.

use sqlx::sqlite::SqlitePool;
use tracing::{debug, info};

use shale_core::dialect::SqlDialect;
use shale_core::generate::Migration;

use crate::error::{MigrateError, Result};
use crate::history::MigrationHistory;

/// Applies and rolls back migrations against a SQLite database.
pub struct MigrationExecutor<D: SqlDialect> {
    pool: SqlitePool,
    dialect: D,
    history: MigrationHistory,
    dry_run: bool,
}

impl<D: SqlDialect> MigrationExecutor<D> {
    /// Creates an executor over the given pool and dialect.
    #[must_use]
    pub fn new(pool: SqlitePool, dialect: D) -> Self {
        let history = MigrationHistory::new(pool.clone());
        Self {
            pool,
            dialect,
            history,
            dry_run: false,
        }
    }

    /// Enables or disables dry-run mode. In a dry run, SQL is rendered
    /// and returned but nothing is executed or recorded.
    #[must_use]
    pub const fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Ensures the history table exists.
    ///
    /// # Errors
    ///
    /// Returns a database error when the table cannot be created.
    pub async fn init(&self) -> Result<()> {
        self.history.ensure_table().await
    }

    /// Access to the migration history.
    #[must_use]
    pub const fn history(&self) -> &MigrationHistory {
        &self.history
    }

    /// Filters out migrations that have already been applied.
    ///
    /// # Errors
    ///
    /// Returns a database error when the history cannot be read.
    pub async fn pending(&self, artifacts: Vec<Migration>) -> Result<Vec<Migration>> {
        let mut pending = Vec::new();
        for migration in artifacts {
            if !self.history.is_applied(&migration.id).await? {
                pending.push(migration);
            }
        }
        Ok(pending)
    }

    /// Applies a migration's forward operations.
    ///
    /// Returns the rendered statements. A migration that is already
    /// applied is skipped and yields no statements.
    ///
    /// # Errors
    ///
    /// Returns a database error when a statement fails; earlier
    /// statements of the migration are not rolled back.
    pub async fn apply(&self, migration: &Migration) -> Result<Vec<String>> {
        if self.history.is_applied(&migration.id).await? {
            info!(id = %migration.id, "migration already applied, skipping");
            return Ok(Vec::new());
        }

        let statements = migration.script(&self.dialect, false);
        if self.dry_run {
            info!(id = %migration.id, "dry run, not executing");
            return Ok(statements);
        }

        self.run_script(&statements).await?;
        self.history
            .record_applied(&migration.id, &migration.name)
            .await?;
        info!(id = %migration.id, name = %migration.name, "applied migration");
        Ok(statements)
    }

    /// Runs a migration's reverse operations and forgets it from history.
    ///
    /// # Errors
    ///
    /// [`MigrateError::MigrationNotFound`] when the migration is not
    /// recorded as applied; otherwise a database error when a statement
    /// fails.
    pub async fn rollback(&self, migration: &Migration) -> Result<Vec<String>> {
        if !self.history.is_applied(&migration.id).await? {
            return Err(MigrateError::MigrationNotFound {
                id: migration.id.clone(),
            });
        }

        let statements = migration.script(&self.dialect, true);
        if self.dry_run {
            info!(id = %migration.id, "dry run, not executing");
            return Ok(statements);
        }

        self.run_script(&statements).await?;
        self.history.record_unapplied(&migration.id).await?;
        info!(id = %migration.id, name = %migration.name, "rolled back migration");
        Ok(statements)
    }

    async fn run_script(&self, statements: &[String]) -> Result<()> {
        for statement in statements {
            if statement.trim_start().starts_with("--") {
                debug!(%statement, "skipping comment statement");
                continue;
            }
            debug!(%statement, "executing");
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}
