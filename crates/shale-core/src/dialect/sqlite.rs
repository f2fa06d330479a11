//! SQLite dialect.
//!
//! SQLite fixes primary keys and foreign keys at table-creation time and
//! cannot drop a column in place; the generator compensates with the
//! table-recreation pattern, so this dialect only ever renders the seven
//! first-class operations.

use crate::operation::Operation;
use crate::schema::{Index, Table};

use super::SqlDialect;

/// SQLite SQL renderer.
#[derive(Debug, Clone, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Renders a full CREATE TABLE statement.
    ///
    /// A column gets an inline PRIMARY KEY modifier only when it is the
    /// table's single key column; two or more key columns are emitted as
    /// a table-level `PRIMARY KEY (...)` constraint in declaration order.
    /// Foreign keys are table-level constraints, with an ON DELETE clause
    /// only when an action is set.
    fn create_table_sql(&self, table: &Table) -> String {
        let single_pk = !table.has_composite_primary_key();

        let mut sql = String::from("CREATE TABLE ");
        sql.push_str(&self.quote_identifier(&table.name));
        sql.push_str(" (\n  ");

        let col_defs: Vec<String> = table
            .columns
            .iter()
            .map(|c| self.column_definition(c, single_pk && c.primary_key))
            .collect();
        sql.push_str(&col_defs.join(",\n  "));

        if table.has_composite_primary_key() {
            let quoted: Vec<String> = table
                .primary_key_columns()
                .iter()
                .map(|c| self.quote_identifier(c))
                .collect();
            sql.push_str(",\n  PRIMARY KEY (");
            sql.push_str(&quoted.join(", "));
            sql.push(')');
        }

        for fk in &table.foreign_keys {
            sql.push_str(",\n  FOREIGN KEY (");
            sql.push_str(&self.quote_identifier(&fk.column));
            sql.push_str(") REFERENCES ");
            sql.push_str(&self.quote_identifier(&fk.referenced_table));
            sql.push_str(" (");
            sql.push_str(&self.quote_identifier(&fk.referenced_column));
            sql.push(')');
            if let Some(action) = fk.on_delete {
                sql.push_str(" ON DELETE ");
                sql.push_str(action.to_sql());
            }
        }

        sql.push_str("\n)");
        sql
    }

    fn create_index_sql(&self, table: &str, index: &Index) -> String {
        let mut sql = String::from("CREATE ");
        if index.unique {
            sql.push_str("UNIQUE ");
        }
        sql.push_str("INDEX ");
        sql.push_str(&self.quote_identifier(&index.name));
        sql.push_str(" ON ");
        sql.push_str(&self.quote_identifier(table));
        sql.push_str(" (");

        let quoted: Vec<String> = index
            .columns
            .iter()
            .map(|c| self.quote_identifier(c))
            .collect();
        sql.push_str(&quoted.join(", "));
        sql.push(')');
        sql
    }

    fn copy_rows_sql(&self, from: &str, to: &str, columns: &[String]) -> String {
        let quoted: Vec<String> = columns.iter().map(|c| self.quote_identifier(c)).collect();
        let list = quoted.join(", ");
        format!(
            "INSERT INTO {} ({list}) SELECT {list} FROM {}",
            self.quote_identifier(to),
            self.quote_identifier(from)
        )
    }
}

impl SqlDialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn render(&self, operation: &Operation) -> String {
        match operation {
            Operation::CreateTable { table } => self.create_table_sql(table),
            Operation::DropTable { name } => {
                format!("DROP TABLE {}", self.quote_identifier(name))
            }
            Operation::RenameTable { from, to } => format!(
                "ALTER TABLE {} RENAME TO {}",
                self.quote_identifier(from),
                self.quote_identifier(to)
            ),
            Operation::AddColumn { table, column } => format!(
                "ALTER TABLE {} ADD COLUMN {}",
                self.quote_identifier(table),
                self.column_definition(column, false)
            ),
            Operation::CopyRows { from, to, columns } => self.copy_rows_sql(from, to, columns),
            Operation::CreateIndex { table, index } => self.create_index_sql(table, index),
            Operation::DropIndex { name } => {
                format!("DROP INDEX {}", self.quote_identifier(name))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, ColumnType, ForeignKey, OnDeleteAction};

    fn dialect() -> SqliteDialect {
        SqliteDialect::new()
    }

    #[test]
    fn create_table_with_single_primary_key_inlines_it() {
        let table = Table::new("users")
            .column(Column::new("id", ColumnType::Integer).primary_key())
            .column(Column::new("name", ColumnType::Text).not_null());

        let sql = dialect().render(&Operation::create_table(table));
        assert_eq!(
            sql,
            "CREATE TABLE \"users\" (\n  \"id\" INTEGER PRIMARY KEY,\n  \"name\" TEXT NOT NULL\n)"
        );
    }

    #[test]
    fn create_table_with_composite_key_uses_table_constraint() {
        let table = Table::new("order_lines")
            .column(Column::new("order_id", ColumnType::Integer).primary_key())
            .column(Column::new("line_number", ColumnType::Integer).primary_key());

        let sql = dialect().render(&Operation::create_table(table));
        assert!(!sql.contains("INTEGER PRIMARY KEY"));
        assert!(sql.contains("PRIMARY KEY (\"order_id\", \"line_number\")"));
    }

    #[test]
    fn create_table_emits_foreign_keys_with_optional_on_delete() {
        let table = Table::new("products")
            .column(Column::new("id", ColumnType::Integer).primary_key())
            .column(Column::new("category_id", ColumnType::Integer))
            .foreign_key(
                ForeignKey::new("category_id", "categories", "id")
                    .on_delete(OnDeleteAction::SetNull),
            );

        let sql = dialect().render(&Operation::create_table(table));
        assert!(sql.contains(
            "FOREIGN KEY (\"category_id\") REFERENCES \"categories\" (\"id\") ON DELETE SET NULL"
        ));

        let bare = Table::new("products")
            .column(Column::new("category_id", ColumnType::Integer))
            .foreign_key(ForeignKey::new("category_id", "categories", "id"));
        let sql = dialect().render(&Operation::create_table(bare));
        assert!(sql.contains("REFERENCES \"categories\" (\"id\")"));
        assert!(!sql.contains("ON DELETE"));
    }

    #[test]
    fn add_column_renders_constraints() {
        let op = Operation::add_column(
            "users",
            Column::new("age", ColumnType::Integer)
                .not_null()
                .default_value("0"),
        );
        assert_eq!(
            dialect().render(&op),
            "ALTER TABLE \"users\" ADD COLUMN \"age\" INTEGER NOT NULL DEFAULT 0"
        );
    }

    #[test]
    fn copy_rows_lists_columns_symmetrically() {
        let op = Operation::copy_rows("products_old", "products", vec![
            "id".into(),
            "name".into(),
        ]);
        assert_eq!(
            dialect().render(&op),
            "INSERT INTO \"products\" (\"id\", \"name\") \
             SELECT \"id\", \"name\" FROM \"products_old\""
        );
    }

    #[test]
    fn index_statements_preserve_uniqueness_and_columns() {
        let index = Index::new("idx_users_email", vec!["email".into()]).unique();
        assert_eq!(
            dialect().render(&Operation::create_index("users", index)),
            "CREATE UNIQUE INDEX \"idx_users_email\" ON \"users\" (\"email\")"
        );
        assert_eq!(
            dialect().render(&Operation::drop_index("idx_users_email")),
            "DROP INDEX \"idx_users_email\""
        );
    }

    #[test]
    fn rename_and_drop_table_statements() {
        assert_eq!(
            dialect().render(&Operation::rename_table("products", "products_old")),
            "ALTER TABLE \"products\" RENAME TO \"products_old\""
        );
        assert_eq!(
            dialect().render(&Operation::drop_table("products_old")),
            "DROP TABLE \"products_old\""
        );
    }
}
