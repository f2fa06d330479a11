//! SQLite migration tooling around the `shale-core` engine.
//!
//! The core computes diffs and generates reversible operations from pure
//! schema values; this crate supplies everything that touches the outside
//! world:
//!
//! - **Introspection** - reads the live database schema via PRAGMA
//!   queries ([`introspect`])
//! - **Snapshot store** - the JSON schema snapshot used as the "old"
//!   schema on the next run ([`snapshot`])
//! - **Artifact store** - one JSON file per generated migration, applied
//!   in identifier order ([`artifact`])
//! - **History** - the `_shale_migrations` table ([`history`])
//! - **Executor** - renders operations to SQL and runs them, forward or
//!   reverse ([`executor`])
//!
//! The `shale-migrate` binary wires these together behind a CLI:
//!
//! ```bash
//! # Show what would change
//! shale-migrate plan --schema desired.json
//!
//! # Generate a migration and refresh the snapshot
//! shale-migrate make --schema desired.json --name add_email
//!
//! # Apply pending migrations
//! shale-migrate migrate
//!
//! # Roll back the most recent one
//! shale-migrate rollback
//! ```

pub mod artifact;
pub mod error;
pub mod executor;
pub mod history;
pub mod introspect;
pub mod snapshot;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::artifact::ArtifactStore;
    pub use crate::error::{MigrateError, Result};
    pub use crate::executor::MigrationExecutor;
    pub use crate::history::{AppliedMigration, MigrationHistory};
    pub use crate::introspect::introspect_schema;
    pub use crate::snapshot::SnapshotStore;
}
