//! Schema snapshot persistence.
//!
//! The "old" schema for the next generation run is whatever was last
//! written to a well-known file in the migrations directory. The store is
//! an explicit collaborator: callers load the snapshot and pass it into
//! the differ/generator as a parameter, never as hidden global state.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use shale_core::schema::Schema;

use crate::error::Result;

/// Well-known snapshot filename inside the migrations directory.
pub const SNAPSHOT_FILE: &str = "schema.json";

/// Loads and saves the JSON-serialized schema snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Creates a store rooted at the given migrations directory.
    #[must_use]
    pub fn new(migrations_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: migrations_dir.into().join(SNAPSHOT_FILE),
        }
    }

    /// Path of the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored snapshot.
    ///
    /// A missing file is not an error; it means no schema has been
    /// snapshotted yet (the very first migration).
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be read or
    /// parsed.
    pub fn load(&self) -> Result<Option<Schema>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no schema snapshot found");
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)?;
        let schema = serde_json::from_str(&contents)?;
        Ok(Some(schema))
    }

    /// Writes the snapshot, creating the migrations directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory or file cannot be written.
    pub fn save(&self, schema: &Schema) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(schema)?;
        fs::write(&self.path, contents)?;
        debug!(path = %self.path.display(), "schema snapshot written");
        Ok(())
    }
}
