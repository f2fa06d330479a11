//! Migration operations.
//!
//! Each schema change is represented as a structured, tagged value; the
//! diff and ordering logic never touch SQL text. Flattening an operation
//! to a literal statement is the dialect's job (see [`crate::dialect`]),
//! done in a single rendering step.

use serde::{Deserialize, Serialize};

use crate::schema::{Column, Index, Table};

/// A single schema-change operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Create a table, including its column-level and table-level
    /// constraints (composite primary key, foreign keys).
    CreateTable {
        /// Full definition of the table to create.
        table: Table,
    },

    /// Drop a table (and implicitly its indexes).
    DropTable {
        /// Name of the table to drop.
        name: String,
    },

    /// Rename a table. Used by the table-recreation pattern to move the
    /// existing table out of the way.
    RenameTable {
        /// Current name.
        from: String,
        /// New name.
        to: String,
    },

    /// Append a column to an existing table.
    AddColumn {
        /// Table to alter.
        table: String,
        /// Column to append.
        column: Column,
    },

    /// Copy rows between two tables by explicit column list. The copy leg
    /// of the table-recreation pattern; only surviving columns are listed.
    CopyRows {
        /// Source table.
        from: String,
        /// Destination table.
        to: String,
        /// Columns to copy, in destination declaration order.
        columns: Vec<String>,
    },

    /// Create an index.
    CreateIndex {
        /// Table the index covers.
        table: String,
        /// Index definition.
        index: Index,
    },

    /// Drop an index by its (globally unique) name.
    DropIndex {
        /// Index name.
        name: String,
    },
}

impl Operation {
    /// Creates a `CreateTable` operation.
    #[must_use]
    pub const fn create_table(table: Table) -> Self {
        Self::CreateTable { table }
    }

    /// Creates a `DropTable` operation.
    #[must_use]
    pub fn drop_table(name: impl Into<String>) -> Self {
        Self::DropTable { name: name.into() }
    }

    /// Creates a `RenameTable` operation.
    #[must_use]
    pub fn rename_table(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::RenameTable {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Creates an `AddColumn` operation.
    #[must_use]
    pub fn add_column(table: impl Into<String>, column: Column) -> Self {
        Self::AddColumn {
            table: table.into(),
            column,
        }
    }

    /// Creates a `CopyRows` operation.
    #[must_use]
    pub fn copy_rows(
        from: impl Into<String>,
        to: impl Into<String>,
        columns: Vec<String>,
    ) -> Self {
        Self::CopyRows {
            from: from.into(),
            to: to.into(),
            columns,
        }
    }

    /// Creates a `CreateIndex` operation.
    #[must_use]
    pub fn create_index(table: impl Into<String>, index: Index) -> Self {
        Self::CreateIndex {
            table: table.into(),
            index,
        }
    }

    /// Creates a `DropIndex` operation.
    #[must_use]
    pub fn drop_index(name: impl Into<String>) -> Self {
        Self::DropIndex { name: name.into() }
    }

    /// Short human-readable description, for logs and dry runs.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::CreateTable { table } => format!("create table {}", table.name),
            Self::DropTable { name } => format!("drop table {name}"),
            Self::RenameTable { from, to } => format!("rename table {from} to {to}"),
            Self::AddColumn { table, column } => {
                format!("add column {table}.{}", column.name)
            }
            Self::CopyRows { from, to, .. } => format!("copy rows {from} -> {to}"),
            Self::CreateIndex { index, table } => {
                format!("create index {} on {table}", index.name)
            }
            Self::DropIndex { name } => format!("drop index {name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;

    #[test]
    fn constructors_build_expected_variants() {
        let op = Operation::add_column("users", Column::new("age", ColumnType::Integer));
        assert!(matches!(op, Operation::AddColumn { ref table, .. } if table == "users"));

        let op = Operation::copy_rows("users_old", "users", vec!["id".into()]);
        assert_eq!(op.description(), "copy rows users_old -> users");
    }

    #[test]
    fn descriptions_name_the_affected_objects() {
        let table = Table::new("posts");
        assert_eq!(
            Operation::create_table(table).description(),
            "create table posts"
        );
        assert_eq!(
            Operation::rename_table("posts", "posts_old").description(),
            "rename table posts to posts_old"
        );
        assert_eq!(
            Operation::drop_index("idx_posts_title").description(),
            "drop index idx_posts_title"
        );
    }
}
