//! Migration code generation.
//!
//! Turns a [`Changeset`] into ordered forward and reverse operation
//! lists, wrapped in a timestamp-identified [`Migration`]. The target
//! engine cannot drop a column in place, so column removal (and the
//! reversal of a column addition) is expressed through the
//! table-recreation pattern: rename the table out of the way, create the
//! resulting shape, copy surviving rows by explicit column list, drop the
//! temporary table.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::dialect::SqlDialect;
use crate::diff::Changeset;
use crate::operation::Operation;
use crate::schema::{ForeignKey, Schema, Table};

/// Marker emitted in place of statements when a migration is empty.
pub const NO_CHANGES_MARKER: &str = "-- no changes detected";

/// A detected difference the generator cannot safely express as SQL.
///
/// These are surfaced alongside the generated operations, never silently
/// dropped and never emitted as incorrect statements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnsupportedChange {
    /// A column's type, nullability or key membership changed in place.
    AlterColumn {
        /// Owning table.
        table: String,
        /// Affected column.
        column: String,
    },

    /// A foreign key was added to or removed from an already-existing
    /// table. The engine fixes foreign keys at table-creation time, so
    /// only tables created fresh in the same changeset get them.
    ForeignKeyChange {
        /// Owning table.
        table: String,
        /// The foreign key involved.
        foreign_key: ForeignKey,
        /// True when the key was added, false when removed.
        added: bool,
    },
}

impl fmt::Display for UnsupportedChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlterColumn { table, column } => write!(
                f,
                "cannot alter column {table}.{column} in place; write a manual migration"
            ),
            Self::ForeignKeyChange {
                table,
                foreign_key,
                added,
            } => {
                let verb = if *added { "add" } else { "drop" };
                write!(
                    f,
                    "cannot {verb} foreign key {table}.{} -> {}.{} on an existing table",
                    foreign_key.column,
                    foreign_key.referenced_table,
                    foreign_key.referenced_column
                )
            }
        }
    }
}

/// A named, reversible unit of schema change with a stable identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Migration {
    /// Timestamp-derived identifier; lexicographic order is creation
    /// order.
    pub id: String,
    /// Human-chosen migration name.
    pub name: String,
    /// Forward operations, in execution order.
    pub up: Vec<Operation>,
    /// Reverse operations, in execution order.
    pub down: Vec<Operation>,
    /// Detected changes that were not code-generated.
    pub unsupported: Vec<UnsupportedChange>,
}

impl Migration {
    /// Whether the migration carries any forward operation.
    #[must_use]
    pub fn has_operations(&self) -> bool {
        !self.up.is_empty()
    }

    /// Renders the forward or reverse procedure as SQL statements.
    ///
    /// An empty operation list yields the explicit no-changes marker, so
    /// the rendered body is never empty. Unsupported changes are appended
    /// to the forward script as comment statements.
    #[must_use]
    pub fn script(&self, dialect: &dyn SqlDialect, reverse: bool) -> Vec<String> {
        let operations = if reverse { &self.down } else { &self.up };

        let mut statements: Vec<String> =
            operations.iter().map(|op| dialect.render(op)).collect();
        if statements.is_empty() {
            statements.push(NO_CHANGES_MARKER.to_string());
        }
        if !reverse {
            for change in &self.unsupported {
                statements.push(format!("-- {change}"));
            }
        }
        statements
    }
}

/// A collision-free, monotonically increasing migration identifier.
///
/// Rendered as `<YYYYmmddHHMMSS>_<slug>`; when the timestamp does not
/// sort after the previous identifier (two generations within the same
/// second), it is advanced until it does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationId {
    timestamp: DateTime<Utc>,
    slug: String,
}

impl MigrationId {
    /// Creates an identifier from a name and a timestamp.
    #[must_use]
    pub fn new(name: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            slug: slugify(name),
        }
    }

    /// Advances the timestamp until this identifier sorts after
    /// `previous` (the latest existing identifier, if any).
    #[must_use]
    pub fn after(mut self, previous: Option<&str>) -> Self {
        if let Some(previous) = previous {
            let previous_stamp = previous.get(..14).unwrap_or(previous);
            while self.stamp().as_str() <= previous_stamp {
                self.timestamp += Duration::seconds(1);
            }
        }
        self
    }

    fn stamp(&self) -> String {
        self.timestamp.format("%Y%m%d%H%M%S").to_string()
    }
}

impl fmt::Display for MigrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.stamp(), self.slug)
    }
}

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    slug.trim_matches('_').to_string()
}

/// Generates a migration taking `old` to `new`.
///
/// An absent `old` is treated as an empty schema. The reverse list undoes
/// the forward list step by step, in opposite order.
#[must_use]
pub fn generate(
    old: Option<&Schema>,
    new: &Schema,
    name: &str,
    timestamp: DateTime<Utc>,
) -> Migration {
    let empty = Schema::new();
    let old = old.unwrap_or(&empty);
    let changeset = Changeset::between(Some(old), new);

    let mut chunks: Vec<(Vec<Operation>, Vec<Operation>)> = Vec::new();
    let mut unsupported = Vec::new();

    for table in &changeset.created_tables {
        let mut up = vec![Operation::create_table(table.clone())];
        for index in &table.indexes {
            up.push(Operation::create_index(&table.name, index.clone()));
        }
        chunks.push((up, vec![Operation::drop_table(&table.name)]));
    }

    for changes in &changeset.changed_tables {
        let (Some(old_table), Some(new_table)) = (
            old.get_table(&changes.table),
            new.get_table(&changes.table),
        ) else {
            continue;
        };

        let recreated = !changes.dropped_columns.is_empty();
        if recreated {
            // One recreation takes care of every column-level change at
            // once; added columns are part of the resulting shape.
            chunks.push((
                recreate_table(new_table, surviving_columns(new_table, old_table)),
                recreate_table(old_table, surviving_columns(old_table, new_table)),
            ));
        } else if !changes.added_columns.is_empty() {
            let up = changes
                .added_columns
                .iter()
                .map(|c| Operation::add_column(&changes.table, c.clone()))
                .collect();
            chunks.push((
                up,
                recreate_table(old_table, surviving_columns(old_table, new_table)),
            ));
        }

        // Recreation already rebuilds the target shape's indexes; only
        // handle index diffs individually when the table survived as-is.
        if !recreated {
            for index in &changes.added_indexes {
                chunks.push((
                    vec![Operation::create_index(&changes.table, index.clone())],
                    vec![Operation::drop_index(&index.name)],
                ));
            }
            for index in &changes.dropped_indexes {
                chunks.push((
                    vec![Operation::drop_index(&index.name)],
                    vec![Operation::create_index(&changes.table, index.clone())],
                ));
            }
        }

        for alteration in &changes.altered_columns {
            unsupported.push(UnsupportedChange::AlterColumn {
                table: changes.table.clone(),
                column: alteration.new.name.clone(),
            });
        }
        for fk in &changes.added_foreign_keys {
            unsupported.push(UnsupportedChange::ForeignKeyChange {
                table: changes.table.clone(),
                foreign_key: fk.clone(),
                added: true,
            });
        }
        for fk in &changes.dropped_foreign_keys {
            unsupported.push(UnsupportedChange::ForeignKeyChange {
                table: changes.table.clone(),
                foreign_key: fk.clone(),
                added: false,
            });
        }
    }

    for table in &changeset.dropped_tables {
        let mut down = vec![Operation::create_table(table.clone())];
        for index in &table.indexes {
            down.push(Operation::create_index(&table.name, index.clone()));
        }
        chunks.push((vec![Operation::drop_table(&table.name)], down));
    }

    let mut up = Vec::new();
    let mut down = Vec::new();
    for (chunk_up, _) in &chunks {
        up.extend(chunk_up.iter().cloned());
    }
    for (_, chunk_down) in chunks.iter().rev() {
        down.extend(chunk_down.iter().cloned());
    }

    Migration {
        id: MigrationId::new(name, timestamp).to_string(),
        name: name.to_string(),
        up,
        down,
        unsupported,
    }
}

/// Columns of `target` that also exist in `other`, in `target`'s
/// declaration order. These are the columns a row copy can carry over.
fn surviving_columns(target: &Table, other: &Table) -> Vec<String> {
    target
        .columns
        .iter()
        .filter(|c| other.get_column(&c.name).is_some())
        .map(|c| c.name.clone())
        .collect()
}

/// The table-recreation pattern, ending in shape `target`: rename the
/// live table to a temporary name, create the target shape, copy
/// surviving rows, drop the temporary table, then rebuild the target's
/// indexes (lost with the renamed original).
fn recreate_table(target: &Table, copy_columns: Vec<String>) -> Vec<Operation> {
    let temp = format!("{}_old", target.name);
    let mut ops = vec![
        Operation::rename_table(&target.name, &temp),
        Operation::create_table(target.clone()),
        Operation::copy_rows(&temp, &target.name, copy_columns),
        Operation::drop_table(&temp),
    ];
    for index in &target.indexes {
        ops.push(Operation::create_index(&target.name, index.clone()));
    }
    ops
}
