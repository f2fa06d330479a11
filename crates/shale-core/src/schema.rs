//! Engine-agnostic schema model.
//!
//! A [`Schema`] is an immutable value snapshot of a database's structure
//! at one instant: tables, columns, indexes and foreign keys. Snapshots
//! come from two places, live introspection (or a prior stored snapshot)
//! and the application's declarative model, and are never mutated in
//! place; the differ and generator only read them.

use serde::{Deserialize, Serialize};

/// Column storage class.
///
/// The target engine resolves every declared type to one of four storage
/// classes, so the model fixes the vocabulary up front instead of carrying
/// free-form type strings through diffing and code generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Integer,
    Text,
    Real,
    Blob,
}

impl ColumnType {
    /// SQL keyword for this type.
    #[must_use]
    pub const fn sql_name(self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Text => "TEXT",
            Self::Real => "REAL",
            Self::Blob => "BLOB",
        }
    }
}

/// Referential action taken when a referenced row is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnDeleteAction {
    NoAction,
    Cascade,
    SetNull,
    Restrict,
}

impl OnDeleteAction {
    /// SQL clause text for this action.
    #[must_use]
    pub const fn to_sql(self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::Restrict => "RESTRICT",
        }
    }
}

/// A single column definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name, unique within its table.
    pub name: String,
    /// Storage class.
    pub column_type: ColumnType,
    /// Whether the column carries a NOT NULL constraint.
    pub not_null: bool,
    /// Default value as its textual SQL representation, if any.
    pub default_value: Option<String>,
    /// Whether the column is part of the table's primary key.
    pub primary_key: bool,
}

impl Column {
    /// Creates a nullable, non-key column of the given type.
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            not_null: false,
            default_value: None,
            primary_key: false,
        }
    }

    /// Marks the column NOT NULL.
    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Sets the default value (textual SQL form, e.g. `"0"` or `"'a'"`).
    #[must_use]
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Marks the column as (part of) the primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }
}

/// An index over one or more columns.
///
/// Index names are global in the target engine, not scoped to a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// Globally unique index name.
    pub name: String,
    /// Covered columns, in index order.
    pub columns: Vec<String>,
    /// Whether the index enforces uniqueness.
    pub unique: bool,
}

impl Index {
    /// Creates a non-unique index over the given columns.
    #[must_use]
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            unique: false,
        }
    }

    /// Marks the index unique.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// A foreign-key constraint from one column to a referenced column.
///
/// Foreign keys have no independent name in this model; their identity is
/// the (column, referenced table, referenced column) triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Local (dependent) column.
    pub column: String,
    /// Referenced table name.
    pub referenced_table: String,
    /// Referenced column name.
    pub referenced_column: String,
    /// Action on delete of the referenced row, when one is set.
    pub on_delete: Option<OnDeleteAction>,
}

impl ForeignKey {
    /// Creates a foreign key with no explicit on-delete action.
    #[must_use]
    pub fn new(
        column: impl Into<String>,
        referenced_table: impl Into<String>,
        referenced_column: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            referenced_table: referenced_table.into(),
            referenced_column: referenced_column.into(),
            on_delete: None,
        }
    }

    /// Sets the on-delete action.
    #[must_use]
    pub const fn on_delete(mut self, action: OnDeleteAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    /// Composite identity used when diffing foreign keys.
    #[must_use]
    pub fn identity(&self) -> (&str, &str, &str) {
        (
            &self.column,
            &self.referenced_table,
            &self.referenced_column,
        )
    }
}

/// A table: ordered columns plus its indexes and foreign keys.
///
/// Column order is creation order and matters for generated code, not for
/// identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Table name, unique within a schema.
    pub name: String,
    /// Columns in declaration order.
    pub columns: Vec<Column>,
    /// Indexes on this table, keyed by (globally unique) name.
    pub indexes: Vec<Index>,
    /// Foreign-key constraints.
    pub foreign_keys: Vec<ForeignKey>,
}

impl Table {
    /// Creates an empty table.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Appends a column.
    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Adds an index.
    #[must_use]
    pub fn index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    /// Adds a foreign key.
    #[must_use]
    pub fn foreign_key(mut self, foreign_key: ForeignKey) -> Self {
        self.foreign_keys.push(foreign_key);
        self
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Primary-key column names, in declaration order.
    #[must_use]
    pub fn primary_key_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Whether the primary key spans more than one column.
    ///
    /// A composite key must be emitted as a table-level constraint, never
    /// as a column-level modifier.
    #[must_use]
    pub fn has_composite_primary_key(&self) -> bool {
        self.columns.iter().filter(|c| c.primary_key).count() > 1
    }
}

/// A full schema snapshot: an unordered collection of tables keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Tables, each with a unique name.
    pub tables: Vec<Table>,
}

impl Schema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table.
    #[must_use]
    pub fn table(mut self, table: Table) -> Self {
        self.tables.push(table);
        self
    }

    /// Looks up a table by name.
    #[must_use]
    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// All table names, in insertion order.
    #[must_use]
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    /// Whether the schema has no tables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_builder_sets_constraints() {
        let col = Column::new("email", ColumnType::Text)
            .not_null()
            .default_value("''");
        assert_eq!(col.name, "email");
        assert_eq!(col.column_type, ColumnType::Text);
        assert!(col.not_null);
        assert_eq!(col.default_value.as_deref(), Some("''"));
        assert!(!col.primary_key);
    }

    #[test]
    fn single_primary_key_is_not_composite() {
        let table = Table::new("users")
            .column(Column::new("id", ColumnType::Integer).primary_key())
            .column(Column::new("name", ColumnType::Text));
        assert!(!table.has_composite_primary_key());
        assert_eq!(table.primary_key_columns(), vec!["id"]);
    }

    #[test]
    fn composite_primary_key_preserves_declaration_order() {
        let table = Table::new("order_lines")
            .column(Column::new("order_id", ColumnType::Integer).primary_key())
            .column(Column::new("line_number", ColumnType::Integer).primary_key())
            .column(Column::new("qty", ColumnType::Integer));
        assert!(table.has_composite_primary_key());
        assert_eq!(
            table.primary_key_columns(),
            vec!["order_id", "line_number"]
        );
    }

    #[test]
    fn foreign_key_identity_ignores_on_delete() {
        let a = ForeignKey::new("category_id", "categories", "id");
        let b = ForeignKey::new("category_id", "categories", "id")
            .on_delete(OnDeleteAction::Cascade);
        assert_eq!(a.identity(), b.identity());
        assert_ne!(a, b);
    }

    #[test]
    fn schema_lookup_by_name() {
        let schema = Schema::new()
            .table(Table::new("users"))
            .table(Table::new("posts"));
        assert!(schema.get_table("users").is_some());
        assert!(schema.get_table("missing").is_none());
        assert_eq!(schema.table_names(), vec!["users", "posts"]);
    }

    #[test]
    fn schema_snapshot_round_trips_through_json() {
        let schema = Schema::new().table(
            Table::new("products")
                .column(Column::new("id", ColumnType::Integer).primary_key())
                .column(Column::new("price", ColumnType::Real).not_null())
                .column(Column::new("category_id", ColumnType::Integer))
                .index(Index::new("idx_products_price", vec!["price".into()]))
                .foreign_key(
                    ForeignKey::new("category_id", "categories", "id")
                        .on_delete(OnDeleteAction::SetNull),
                ),
        );

        let json = serde_json::to_string(&schema).unwrap();
        let back: Schema = serde_json::from_str(&json).unwrap();
        assert_eq!(schema, back);
    }
}
