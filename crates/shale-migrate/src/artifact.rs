//! Migration artifact storage.
//!
//! Each generated migration is written to the migrations directory as
//! `<id>.json`, a serialized forward/reverse operation list. Identifiers
//! are timestamp-derived, so lexicographic filename order is creation
//! order and determines apply order.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use shale_core::generate::Migration;

use crate::error::Result;
use crate::snapshot::SNAPSHOT_FILE;

/// Stores migration artifacts in the migrations directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Creates a store rooted at the given migrations directory.
    #[must_use]
    pub fn new(migrations_dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: migrations_dir.into(),
        }
    }

    /// The migrations directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes the migration as `<id>.json`, creating the directory if
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory or file cannot be written.
    pub fn save(&self, migration: &Migration) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{}.json", migration.id));
        fs::write(&path, serde_json::to_string_pretty(migration)?)?;
        info!(path = %path.display(), "migration written");
        Ok(path)
    }

    /// Loads every stored migration, sorted by identifier.
    ///
    /// A missing directory means no migrations exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error when a file cannot be read or parsed.
    pub fn load_all(&self) -> Result<Vec<Migration>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut migrations = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json")
                && path.file_name().is_some_and(|n| n != SNAPSHOT_FILE)
            {
                let contents = fs::read_to_string(&path)?;
                migrations.push(serde_json::from_str::<Migration>(&contents)?);
            }
        }
        migrations.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(migrations)
    }

    /// Looks up one stored migration by id.
    ///
    /// # Errors
    ///
    /// [`crate::error::MigrateError::MigrationNotFound`] when no artifact
    /// has that id.
    pub fn load(&self, id: &str) -> Result<Migration> {
        self.load_all()?
            .into_iter()
            .find(|m| m.id == id)
            .ok_or_else(|| crate::error::MigrateError::MigrationNotFound { id: id.to_string() })
    }

    /// Identifier of the latest stored migration, if any.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`load_all`](Self::load_all).
    pub fn latest_id(&self) -> Result<Option<String>> {
        Ok(self.load_all()?.pop().map(|m| m.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SnapshotStore;
    use chrono::{TimeZone, Utc};
    use shale_core::generate::generate;
    use shale_core::schema::{Column, ColumnType, Schema, Table};
    use tempfile::TempDir;

    fn sample_migration(name: &str, hour: u32) -> Migration {
        let new = Schema::new().table(
            Table::new("users").column(Column::new("id", ColumnType::Integer).primary_key()),
        );
        let at = Utc.with_ymd_and_hms(2024, 3, 15, hour, 0, 0).unwrap();
        generate(None, &new, name, at)
    }

    #[test]
    fn empty_directory_lists_nothing() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().join("missing"));
        assert!(store.load_all().unwrap().is_empty());
        assert!(store.latest_id().unwrap().is_none());
    }

    #[test]
    fn artifacts_are_listed_in_id_order() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());

        let later = sample_migration("second", 12);
        let earlier = sample_migration("first", 9);
        store.save(&later).unwrap();
        store.save(&earlier).unwrap();

        let all = store.load_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "first");
        assert_eq!(all[1].name, "second");
        assert_eq!(store.latest_id().unwrap(), Some(later.id));
    }

    #[test]
    fn snapshot_file_is_not_mistaken_for_an_artifact() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        SnapshotStore::new(dir.path())
            .save(&Schema::new())
            .unwrap();
        store.save(&sample_migration("only", 10)).unwrap();

        let all = store.load_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "only");
    }

    #[test]
    fn load_round_trips_operations() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let migration = sample_migration("init", 10);
        store.save(&migration).unwrap();

        let loaded = store.load(&migration.id).unwrap();
        assert_eq!(loaded, migration);
        assert!(store.load("20990101000000_nope").is_err());
    }
}
