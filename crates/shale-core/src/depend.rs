//! Foreign-key dependency ordering.
//!
//! Given the foreign-key graph over a requested subset of tables, computes
//! a safe insert order (referenced tables first) and its derived delete
//! order, and reports self-referencing tables. Cycles among distinct
//! tables are fatal for the requested ordering; a self-reference never is.

use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};
use crate::schema::Schema;

/// Analyzes foreign-key dependencies between tables of one schema.
#[derive(Debug, Clone)]
pub struct DependencyAnalyzer {
    /// For each table, the distinct tables it references (self-references
    /// excluded).
    references: HashMap<String, Vec<String>>,
    /// Tables with a foreign key pointing at themselves.
    self_referencing: HashSet<String>,
}

impl DependencyAnalyzer {
    /// Builds the analyzer from a schema snapshot.
    #[must_use]
    pub fn new(schema: &Schema) -> Self {
        let mut references: HashMap<String, Vec<String>> = HashMap::new();
        let mut self_referencing = HashSet::new();

        for table in &schema.tables {
            let entry = references.entry(table.name.clone()).or_default();
            for fk in &table.foreign_keys {
                if fk.referenced_table == table.name {
                    self_referencing.insert(table.name.clone());
                } else if !entry.contains(&fk.referenced_table) {
                    entry.push(fk.referenced_table.clone());
                }
            }
        }

        Self {
            references,
            self_referencing,
        }
    }

    /// Whether the table has a foreign key referencing itself.
    ///
    /// Self-references are excluded from the ordering graph, so they never
    /// trigger a cycle error; callers that need special insert handling
    /// (e.g. a deferred parent reference) check this instead.
    #[must_use]
    pub fn has_self_reference(&self, table: &str) -> bool {
        self.self_referencing.contains(table)
    }

    /// Computes a safe insert order over the requested tables.
    ///
    /// Edges are drawn only between members of the requested set; foreign
    /// keys pointing outside it are irrelevant to ordering among these
    /// tables. Ties are broken by input order, so the result is
    /// reproducible across runs.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownTable`] when a requested name is not in the schema;
    /// [`Error::CircularDependency`] when the requested tables reference
    /// each other in a cycle, naming every implicated table
    /// alphabetically. No partial order is returned.
    pub fn insert_order(&self, tables: &[&str]) -> Result<Vec<String>> {
        for &name in tables {
            if !self.references.contains_key(name) {
                return Err(Error::UnknownTable {
                    name: name.to_string(),
                });
            }
        }

        let requested: HashSet<&str> = tables.iter().copied().collect();

        // In-set dependencies per table, and the reverse adjacency used to
        // release dependents as their prerequisites are emitted.
        let mut remaining: HashMap<&str, usize> = HashMap::new();
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
        for &name in tables {
            let deps: Vec<&str> = self.references[name]
                .iter()
                .map(String::as_str)
                .filter(|dep| requested.contains(dep))
                .collect();
            remaining.insert(name, deps.len());
            for dep in deps {
                dependents.entry(dep).or_default().push(name);
            }
        }

        let mut order = Vec::with_capacity(tables.len());
        let mut emitted: HashSet<&str> = HashSet::new();

        // Kahn's algorithm; each round emits the first ready table in
        // input order.
        loop {
            let next = tables
                .iter()
                .copied()
                .find(|name| !emitted.contains(name) && remaining[name] == 0);
            let Some(name) = next else { break };

            emitted.insert(name);
            order.push(name.to_string());
            if let Some(deps) = dependents.get(name) {
                for &dependent in deps {
                    if let Some(count) = remaining.get_mut(dependent) {
                        *count = count.saturating_sub(1);
                    }
                }
            }
        }

        if order.len() < tables.len() {
            let mut cycle: Vec<String> = tables
                .iter()
                .filter(|name| !emitted.contains(*name))
                .map(ToString::to_string)
                .collect();
            cycle.sort();
            return Err(Error::CircularDependency { tables: cycle });
        }

        Ok(order)
    }

    /// Computes a safe delete order: the exact reverse of
    /// [`insert_order`](Self::insert_order) over the same tables, derived
    /// rather than independently computed so the two can never disagree.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`insert_order`](Self::insert_order).
    pub fn delete_order(&self, tables: &[&str]) -> Result<Vec<String>> {
        let mut order = self.insert_order(tables)?;
        order.reverse();
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, ColumnType, ForeignKey, Table};

    fn shop_schema() -> Schema {
        Schema::new()
            .table(
                Table::new("categories")
                    .column(Column::new("id", ColumnType::Integer).primary_key()),
            )
            .table(
                Table::new("products")
                    .column(Column::new("id", ColumnType::Integer).primary_key())
                    .column(Column::new("category_id", ColumnType::Integer))
                    .foreign_key(ForeignKey::new("category_id", "categories", "id")),
            )
            .table(
                Table::new("order_lines")
                    .column(Column::new("id", ColumnType::Integer).primary_key())
                    .column(Column::new("product_id", ColumnType::Integer))
                    .foreign_key(ForeignKey::new("product_id", "products", "id")),
            )
    }

    #[test]
    fn referenced_tables_come_first() {
        let analyzer = DependencyAnalyzer::new(&shop_schema());
        let order = analyzer.insert_order(&["products", "categories"]).unwrap();
        assert_eq!(order, vec!["categories", "products"]);
    }

    #[test]
    fn delete_order_is_exact_reverse_of_insert_order() {
        let analyzer = DependencyAnalyzer::new(&shop_schema());
        let insert = analyzer
            .insert_order(&["order_lines", "products", "categories"])
            .unwrap();
        let mut expected = insert;
        expected.reverse();
        assert_eq!(
            analyzer
                .delete_order(&["order_lines", "products", "categories"])
                .unwrap(),
            expected
        );
        assert_eq!(expected, vec!["order_lines", "products", "categories"]);
    }

    #[test]
    fn ties_break_by_input_order() {
        let schema = Schema::new()
            .table(Table::new("a"))
            .table(Table::new("b"))
            .table(Table::new("c"));
        let analyzer = DependencyAnalyzer::new(&schema);
        assert_eq!(
            analyzer.insert_order(&["c", "a", "b"]).unwrap(),
            vec!["c", "a", "b"]
        );
        assert_eq!(
            analyzer.insert_order(&["b", "c", "a"]).unwrap(),
            vec!["b", "c", "a"]
        );
    }

    #[test]
    fn foreign_keys_outside_requested_set_are_ignored() {
        let analyzer = DependencyAnalyzer::new(&shop_schema());
        // products references categories, but categories is not requested.
        let order = analyzer.insert_order(&["products", "order_lines"]).unwrap();
        assert_eq!(order, vec!["products", "order_lines"]);
    }

    #[test]
    fn self_reference_is_reported_but_never_a_cycle() {
        let schema = Schema::new()
            .table(
                Table::new("employees")
                    .column(Column::new("id", ColumnType::Integer).primary_key())
                    .column(Column::new("manager_id", ColumnType::Integer))
                    .foreign_key(ForeignKey::new("manager_id", "employees", "id")),
            )
            .table(Table::new("offices").column(Column::new("id", ColumnType::Integer)));
        let analyzer = DependencyAnalyzer::new(&schema);

        assert!(analyzer.has_self_reference("employees"));
        assert!(!analyzer.has_self_reference("offices"));

        let order = analyzer.insert_order(&["employees", "offices"]).unwrap();
        assert_eq!(order, vec!["employees", "offices"]);
    }

    #[test]
    fn mutual_references_raise_a_cycle_error_naming_both() {
        let schema = Schema::new()
            .table(
                Table::new("books")
                    .column(Column::new("author_id", ColumnType::Integer))
                    .foreign_key(ForeignKey::new("author_id", "authors", "id")),
            )
            .table(
                Table::new("authors")
                    .column(Column::new("favorite_book_id", ColumnType::Integer))
                    .foreign_key(ForeignKey::new("favorite_book_id", "books", "id")),
            );
        let analyzer = DependencyAnalyzer::new(&schema);

        let err = analyzer.insert_order(&["books", "authors"]).unwrap_err();
        assert_eq!(
            err,
            Error::CircularDependency {
                tables: vec!["authors".into(), "books".into()],
            }
        );
        let message = err.to_string();
        assert!(message.contains("authors"));
        assert!(message.contains("books"));
    }

    #[test]
    fn unknown_table_is_an_input_error() {
        let analyzer = DependencyAnalyzer::new(&shop_schema());
        let err = analyzer.insert_order(&["products", "missing"]).unwrap_err();
        assert_eq!(
            err,
            Error::UnknownTable {
                name: "missing".into(),
            }
        );
    }
}
