//! Schema-evolution engine.
//!
//! `shale-core` reconciles two independently-produced schema snapshots,
//! one read from a live database (or a prior stored snapshot) and one
//! derived from the application's declarative model, and turns the
//! difference into reversible migrations:
//!
//! - **Schema model** - engine-agnostic tables, columns, indexes and
//!   foreign keys ([`schema`])
//! - **Differ** - structured changeset plus human-readable summary
//!   ([`diff`])
//! - **Generator** - ordered forward/reverse operations, including the
//!   table-recreation work-around for column removal ([`generate`])
//! - **Dependency analyzer** - safe multi-table insert/delete ordering
//!   over the foreign-key graph ([`depend`])
//! - **Dialect** - the single step that flattens operations to SQL
//!   ([`dialect`])
//!
//! Everything here is pure and synchronous: inputs are immutable value
//! snapshots, outputs are freshly allocated, and no function touches a
//! connection or the filesystem.
//!
//! # Example
//!
//! ```rust
//! use chrono::Utc;
//! use shale_core::prelude::*;
//!
//! let desired = Schema::new().table(
//!     Table::new("users")
//!         .column(Column::new("id", ColumnType::Integer).primary_key())
//!         .column(Column::new("name", ColumnType::Text).not_null()),
//! );
//!
//! let migration = generate(None, &desired, "init", Utc::now());
//! assert!(migration.has_operations());
//!
//! for statement in migration.script(&SqliteDialect::new(), false) {
//!     println!("{statement};");
//! }
//! ```

pub mod depend;
pub mod dialect;
pub mod diff;
pub mod error;
pub mod generate;
pub mod operation;
pub mod schema;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::depend::DependencyAnalyzer;
    pub use crate::dialect::{SqlDialect, SqliteDialect};
    pub use crate::diff::{has_changes, Changeset, ColumnAlteration, TableChanges};
    pub use crate::error::{Error, Result};
    pub use crate::generate::{
        generate, Migration, MigrationId, UnsupportedChange, NO_CHANGES_MARKER,
    };
    pub use crate::operation::Operation;
    pub use crate::schema::{
        Column, ColumnType, ForeignKey, Index, OnDeleteAction, Schema, Table,
    };
}
