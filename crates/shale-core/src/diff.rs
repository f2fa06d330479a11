//! Schema diffing.
//!
//! Compares two schema snapshots and produces a structured [`Changeset`]
//! plus a human-readable summary. Tables and columns are matched by name,
//! indexes by their (globally unique) name, and foreign keys by the
//! composite (column, referenced table, referenced column) identity since
//! they carry no name of their own. A rename is represented as a drop plus
//! an add; it is never specially detected.

use serde::{Deserialize, Serialize};

use crate::schema::{Column, ForeignKey, Index, Schema, Table};

/// An in-place column modification detected between two snapshots.
///
/// Alterations are reported for diagnosis but never auto-migrated; the
/// generator leaves them for a manual migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnAlteration {
    /// The column, before.
    pub old: Column,
    /// The column, after.
    pub new: Column,
}

impl ColumnAlteration {
    /// Whether the storage class changed.
    #[must_use]
    pub fn type_changed(&self) -> bool {
        self.old.column_type != self.new.column_type
    }

    /// Whether the NOT NULL constraint changed.
    #[must_use]
    pub const fn nullability_changed(&self) -> bool {
        self.old.not_null != self.new.not_null
    }

    /// Whether primary-key membership changed.
    #[must_use]
    pub const fn primary_key_changed(&self) -> bool {
        self.old.primary_key != self.new.primary_key
    }
}

/// Differences within a table present in both snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableChanges {
    /// Name of the affected table.
    pub table: String,
    /// Columns present only in the new snapshot, in declaration order.
    pub added_columns: Vec<Column>,
    /// Columns present only in the old snapshot (full definition, so the
    /// reverse operation can recreate them).
    pub dropped_columns: Vec<Column>,
    /// Columns whose type, nullability or key membership differ.
    pub altered_columns: Vec<ColumnAlteration>,
    /// Indexes present only in the new snapshot.
    pub added_indexes: Vec<Index>,
    /// Indexes present only in the old snapshot.
    pub dropped_indexes: Vec<Index>,
    /// Foreign keys present only in the new snapshot.
    pub added_foreign_keys: Vec<ForeignKey>,
    /// Foreign keys present only in the old snapshot.
    pub dropped_foreign_keys: Vec<ForeignKey>,
}

impl TableChanges {
    fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            added_columns: Vec::new(),
            dropped_columns: Vec::new(),
            altered_columns: Vec::new(),
            added_indexes: Vec::new(),
            dropped_indexes: Vec::new(),
            added_foreign_keys: Vec::new(),
            dropped_foreign_keys: Vec::new(),
        }
    }

    /// Whether no difference was found for this table.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added_columns.is_empty()
            && self.dropped_columns.is_empty()
            && self.altered_columns.is_empty()
            && self.added_indexes.is_empty()
            && self.dropped_indexes.is_empty()
            && self.added_foreign_keys.is_empty()
            && self.dropped_foreign_keys.is_empty()
    }
}

/// The structured result of diffing two schemas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changeset {
    /// Tables present only in the new snapshot (full definition, indexes
    /// included, to be created alongside).
    pub created_tables: Vec<Table>,
    /// Tables present only in the old snapshot (full definition, so the
    /// reverse operation can recreate them exactly).
    pub dropped_tables: Vec<Table>,
    /// Per-table differences for tables present in both snapshots. Tables
    /// with no differences are omitted.
    pub changed_tables: Vec<TableChanges>,
}

impl Changeset {
    /// Computes the changeset from `old` to `new`.
    ///
    /// An absent `old` is treated as an empty schema, representing the
    /// very first migration.
    #[must_use]
    pub fn between(old: Option<&Schema>, new: &Schema) -> Self {
        let empty = Schema::new();
        let old = old.unwrap_or(&empty);

        let mut changeset = Self::default();

        for table in &new.tables {
            match old.get_table(&table.name) {
                None => changeset.created_tables.push(table.clone()),
                Some(old_table) => {
                    let changes = diff_table(old_table, table);
                    if !changes.is_empty() {
                        changeset.changed_tables.push(changes);
                    }
                }
            }
        }

        for table in &old.tables {
            if new.get_table(&table.name).is_none() {
                changeset.dropped_tables.push(table.clone());
            }
        }

        changeset
    }

    /// Whether no structural difference was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.created_tables.is_empty()
            && self.dropped_tables.is_empty()
            && self.changed_tables.is_empty()
    }

    /// Renders the changeset as ordered, human-readable lines.
    ///
    /// Grouping: created tables, dropped tables, then per changed table:
    /// added columns, dropped columns, altered columns (type before
    /// nullability), added indexes, dropped indexes, added foreign keys,
    /// dropped foreign keys. An empty vector means no changes were
    /// detected.
    #[must_use]
    pub fn summary(&self) -> Vec<String> {
        let mut lines = Vec::new();

        for table in &self.created_tables {
            lines.push(format!("Create table: {}", table.name));
        }
        for table in &self.dropped_tables {
            lines.push(format!("Drop table: {}", table.name));
        }
        for changes in &self.changed_tables {
            let table = &changes.table;
            for column in &changes.added_columns {
                lines.push(format!("Add column: {table}.{}", column.name));
            }
            for column in &changes.dropped_columns {
                lines.push(format!("Drop column: {table}.{}", column.name));
            }
            for alteration in &changes.altered_columns {
                let name = &alteration.new.name;
                if alteration.type_changed() {
                    lines.push(format!(
                        "Alter column: {table}.{name} type {} -> {}",
                        alteration.old.column_type.sql_name(),
                        alteration.new.column_type.sql_name()
                    ));
                }
                if alteration.nullability_changed() {
                    let state = if alteration.new.not_null {
                        "NOT NULL"
                    } else {
                        "NULL"
                    };
                    lines.push(format!("Alter column: {table}.{name} now {state}"));
                }
                if alteration.primary_key_changed() {
                    let state = if alteration.new.primary_key {
                        "added to"
                    } else {
                        "removed from"
                    };
                    lines.push(format!(
                        "Alter column: {table}.{name} {state} primary key"
                    ));
                }
            }
            for index in &changes.added_indexes {
                lines.push(format!("Add index: {} on {table}", index.name));
            }
            for index in &changes.dropped_indexes {
                lines.push(format!("Drop index: {} on {table}", index.name));
            }
            for fk in &changes.added_foreign_keys {
                lines.push(format!(
                    "Add foreign key: {table}.{} -> {}.{}",
                    fk.column, fk.referenced_table, fk.referenced_column
                ));
            }
            for fk in &changes.dropped_foreign_keys {
                lines.push(format!(
                    "Drop foreign key: {table}.{} -> {}.{}",
                    fk.column, fk.referenced_table, fk.referenced_column
                ));
            }
        }

        lines
    }
}

/// Cheap existence check: true as soon as any structural difference is
/// found, without building the full changeset.
///
/// Agrees with [`Changeset::between`]: this returns true exactly when the
/// changeset is non-empty.
#[must_use]
pub fn has_changes(old: Option<&Schema>, new: &Schema) -> bool {
    let empty = Schema::new();
    let old = old.unwrap_or(&empty);

    if old.tables.len() != new.tables.len() {
        return true;
    }

    for table in &new.tables {
        let Some(old_table) = old.get_table(&table.name) else {
            return true;
        };
        if table_differs(old_table, table) {
            return true;
        }
    }

    false
}

fn table_differs(old: &Table, new: &Table) -> bool {
    if old.columns.len() != new.columns.len()
        || old.indexes.len() != new.indexes.len()
        || old.foreign_keys.len() != new.foreign_keys.len()
    {
        return true;
    }

    for column in &new.columns {
        let Some(old_column) = old.get_column(&column.name) else {
            return true;
        };
        if old_column.column_type != column.column_type
            || old_column.not_null != column.not_null
            || old_column.primary_key != column.primary_key
        {
            return true;
        }
    }

    if new
        .indexes
        .iter()
        .any(|index| !old.indexes.iter().any(|i| i.name == index.name))
    {
        return true;
    }

    new.foreign_keys
        .iter()
        .any(|fk| !old.foreign_keys.iter().any(|f| f.identity() == fk.identity()))
}

fn diff_table(old: &Table, new: &Table) -> TableChanges {
    let mut changes = TableChanges::new(&new.name);

    for column in &new.columns {
        match old.get_column(&column.name) {
            None => changes.added_columns.push(column.clone()),
            Some(old_column) => {
                let alteration = ColumnAlteration {
                    old: old_column.clone(),
                    new: column.clone(),
                };
                if alteration.type_changed()
                    || alteration.nullability_changed()
                    || alteration.primary_key_changed()
                {
                    changes.altered_columns.push(alteration);
                }
            }
        }
    }
    for column in &old.columns {
        if new.get_column(&column.name).is_none() {
            changes.dropped_columns.push(column.clone());
        }
    }

    for index in &new.indexes {
        if !old.indexes.iter().any(|i| i.name == index.name) {
            changes.added_indexes.push(index.clone());
        }
    }
    for index in &old.indexes {
        if !new.indexes.iter().any(|i| i.name == index.name) {
            changes.dropped_indexes.push(index.clone());
        }
    }

    for fk in &new.foreign_keys {
        if !old
            .foreign_keys
            .iter()
            .any(|f| f.identity() == fk.identity())
        {
            changes.added_foreign_keys.push(fk.clone());
        }
    }
    for fk in &old.foreign_keys {
        if !new
            .foreign_keys
            .iter()
            .any(|f| f.identity() == fk.identity())
        {
            changes.dropped_foreign_keys.push(fk.clone());
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnType, OnDeleteAction};

    fn users_table() -> Table {
        Table::new("users")
            .column(Column::new("id", ColumnType::Integer).primary_key())
            .column(Column::new("name", ColumnType::Text).not_null())
    }

    #[test]
    fn identical_schemas_produce_empty_changeset() {
        let schema = Schema::new().table(users_table());
        let changeset = Changeset::between(Some(&schema), &schema);
        assert!(changeset.is_empty());
        assert!(changeset.summary().is_empty());
        assert!(!has_changes(Some(&schema), &schema));
    }

    #[test]
    fn absent_old_schema_creates_everything() {
        let new = Schema::new().table(users_table());
        let changeset = Changeset::between(None, &new);
        assert_eq!(changeset.created_tables.len(), 1);
        assert_eq!(changeset.created_tables[0].name, "users");
        assert!(has_changes(None, &new));
    }

    #[test]
    fn dropped_table_carries_full_definition() {
        let old = Schema::new().table(users_table());
        let new = Schema::new();
        let changeset = Changeset::between(Some(&old), &new);
        assert!(changeset.created_tables.is_empty());
        assert_eq!(changeset.dropped_tables.len(), 1);
        assert_eq!(changeset.dropped_tables[0].columns.len(), 2);
    }

    #[test]
    fn added_and_dropped_columns_are_detected() {
        let old = Schema::new().table(users_table());
        let new = Schema::new().table(
            Table::new("users")
                .column(Column::new("id", ColumnType::Integer).primary_key())
                .column(Column::new("email", ColumnType::Text)),
        );

        let changeset = Changeset::between(Some(&old), &new);
        assert_eq!(changeset.changed_tables.len(), 1);
        let changes = &changeset.changed_tables[0];
        assert_eq!(changes.added_columns.len(), 1);
        assert_eq!(changes.added_columns[0].name, "email");
        assert_eq!(changes.dropped_columns.len(), 1);
        assert_eq!(changes.dropped_columns[0].name, "name");
        assert!(has_changes(Some(&old), &new));
    }

    #[test]
    fn type_and_nullability_changes_are_reported_not_dropped() {
        let old = Schema::new().table(users_table());
        let new = Schema::new().table(
            Table::new("users")
                .column(Column::new("id", ColumnType::Integer).primary_key())
                .column(Column::new("name", ColumnType::Blob)),
        );

        let changeset = Changeset::between(Some(&old), &new);
        let changes = &changeset.changed_tables[0];
        assert_eq!(changes.altered_columns.len(), 1);
        let alteration = &changes.altered_columns[0];
        assert!(alteration.type_changed());
        assert!(alteration.nullability_changed());
        assert!(!alteration.primary_key_changed());
        assert!(has_changes(Some(&old), &new));
    }

    #[test]
    fn indexes_are_diffed_by_name() {
        let old = Schema::new().table(
            users_table().index(Index::new("idx_users_name", vec!["name".into()])),
        );
        let new = Schema::new().table(
            users_table().index(Index::new("idx_users_name_v2", vec!["name".into()]).unique()),
        );

        let changeset = Changeset::between(Some(&old), &new);
        let changes = &changeset.changed_tables[0];
        assert_eq!(changes.added_indexes.len(), 1);
        assert_eq!(changes.added_indexes[0].name, "idx_users_name_v2");
        assert_eq!(changes.dropped_indexes.len(), 1);
        assert_eq!(changes.dropped_indexes[0].name, "idx_users_name");
    }

    #[test]
    fn foreign_keys_are_diffed_by_composite_identity() {
        let old = Schema::new().table(
            users_table().foreign_key(ForeignKey::new("team_id", "teams", "id")),
        );
        // Same identity, different on-delete action: not a difference.
        let new = Schema::new().table(users_table().foreign_key(
            ForeignKey::new("team_id", "teams", "id").on_delete(OnDeleteAction::Cascade),
        ));

        let changeset = Changeset::between(Some(&old), &new);
        assert!(changeset.is_empty());
        assert!(!has_changes(Some(&old), &new));

        let retargeted = Schema::new().table(
            users_table().foreign_key(ForeignKey::new("team_id", "groups", "id")),
        );
        let changeset = Changeset::between(Some(&old), &retargeted);
        let changes = &changeset.changed_tables[0];
        assert_eq!(changes.added_foreign_keys.len(), 1);
        assert_eq!(changes.dropped_foreign_keys.len(), 1);
        assert!(has_changes(Some(&old), &retargeted));
    }

    #[test]
    fn summary_orders_groups_deterministically() {
        let old = Schema::new()
            .table(users_table())
            .table(Table::new("legacy").column(Column::new("id", ColumnType::Integer)));
        let new = Schema::new()
            .table(
                Table::new("users")
                    .column(Column::new("id", ColumnType::Integer).primary_key())
                    .column(Column::new("name", ColumnType::Text).not_null())
                    .column(Column::new("age", ColumnType::Integer))
                    .index(Index::new("idx_users_age", vec!["age".into()])),
            )
            .table(Table::new("audit").column(Column::new("id", ColumnType::Integer)));

        let lines = Changeset::between(Some(&old), &new).summary();
        assert_eq!(
            lines,
            vec![
                "Create table: audit",
                "Drop table: legacy",
                "Add column: users.age",
                "Add index: idx_users_age on users",
            ]
        );
    }

    #[test]
    fn has_changes_agrees_with_diff_on_table_rename() {
        // Same table count, different names.
        let old = Schema::new().table(Table::new("a"));
        let new = Schema::new().table(Table::new("b"));
        assert!(has_changes(Some(&old), &new));
        assert!(!Changeset::between(Some(&old), &new).is_empty());
    }
}
