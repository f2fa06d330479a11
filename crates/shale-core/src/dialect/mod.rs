//! SQL rendering for migration operations.
//!
//! The dialect is the single place where structured [`Operation`] values
//! are flattened to literal SQL; nothing upstream of it builds statement
//! text.

mod sqlite;

pub use sqlite::SqliteDialect;

use crate::operation::Operation;
use crate::schema::{Column, ColumnType};

/// Trait for engine-specific SQL generation.
pub trait SqlDialect: Send + Sync {
    /// Returns the dialect name.
    fn name(&self) -> &'static str;

    /// Renders one operation as one SQL statement.
    fn render(&self, operation: &Operation) -> String;

    /// Returns the SQL type name for the given storage class.
    fn type_name(&self, column_type: ColumnType) -> &'static str {
        column_type.sql_name()
    }

    /// Quotes an identifier (table name, column name, index name).
    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{name}\"")
    }

    /// Renders a column definition.
    ///
    /// `inline_primary_key` is set only when the owning table has exactly
    /// one primary-key column; composite keys are emitted as a table-level
    /// constraint instead.
    fn column_definition(&self, column: &Column, inline_primary_key: bool) -> String {
        let mut parts = vec![
            self.quote_identifier(&column.name),
            self.type_name(column.column_type).to_string(),
        ];

        if inline_primary_key {
            parts.push("PRIMARY KEY".to_string());
        }

        if column.not_null && !inline_primary_key {
            parts.push("NOT NULL".to_string());
        }

        if let Some(ref default) = column.default_value {
            parts.push(format!("DEFAULT {default}"));
        }

        parts.join(" ")
    }
}
