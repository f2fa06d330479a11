//! Live-schema introspection.
//!
//! Reads the current structure of a SQLite database into a core
//! [`Schema`] value using catalog and PRAGMA queries, skipping internal
//! tables (`sqlite_%`) and the migration-history table. The rest of the
//! system is agnostic to where a schema came from; this is just one
//! producer.

use sqlx::sqlite::SqlitePool;
use tracing::debug;

use shale_core::schema::{Column, ColumnType, ForeignKey, Index, OnDeleteAction, Schema, Table};

use crate::error::Result;
use crate::history::HISTORY_TABLE;

/// Reads the full schema of the connected database.
///
/// # Errors
///
/// Returns a database error when any catalog or PRAGMA query fails.
pub async fn introspect_schema(pool: &SqlitePool) -> Result<Schema> {
    let names: Vec<(String,)> = sqlx::query_as(
        "SELECT name FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' AND name != ? \
         ORDER BY name",
    )
    .bind(HISTORY_TABLE)
    .fetch_all(pool)
    .await?;

    let mut schema = Schema::new();
    for (name,) in names {
        let table = introspect_table(pool, &name).await?;
        schema = schema.table(table);
    }

    resolve_implicit_fk_targets(&mut schema);

    debug!(tables = schema.tables.len(), "introspected schema");
    Ok(schema)
}

async fn introspect_table(pool: &SqlitePool, name: &str) -> Result<Table> {
    let mut table = Table::new(name);

    // PRAGMA statements do not take bound parameters; the table names come
    // from sqlite_master, not from user input.
    let columns: Vec<(i64, String, String, i64, Option<String>, i64)> =
        sqlx::query_as(&format!("PRAGMA table_info(\"{name}\")"))
            .fetch_all(pool)
            .await?;

    for (_cid, column_name, declared_type, not_null, default_value, pk) in columns {
        let mut column = Column::new(column_name, column_type_from_declared(&declared_type));
        if not_null != 0 {
            column = column.not_null();
        }
        if let Some(default) = default_value {
            column = column.default_value(default);
        }
        if pk > 0 {
            column = column.primary_key();
        }
        table = table.column(column);
    }

    let indexes: Vec<(i64, String, i64, String, i64)> =
        sqlx::query_as(&format!("PRAGMA index_list(\"{name}\")"))
            .fetch_all(pool)
            .await?;

    for (_seq, index_name, unique, origin, _partial) in indexes {
        // Only explicitly created indexes; "pk" and "u" origins are
        // auto-created alongside constraints.
        if origin != "c" {
            continue;
        }
        let info: Vec<(i64, i64, Option<String>)> =
            sqlx::query_as(&format!("PRAGMA index_info(\"{index_name}\")"))
                .fetch_all(pool)
                .await?;
        let columns: Vec<String> = info.into_iter().filter_map(|(_, _, c)| c).collect();

        let mut index = Index::new(index_name, columns);
        if unique != 0 {
            index = index.unique();
        }
        table = table.index(index);
    }

    let foreign_keys: Vec<(i64, i64, String, String, Option<String>, String, String, String)> =
        sqlx::query_as(&format!("PRAGMA foreign_key_list(\"{name}\")"))
            .fetch_all(pool)
            .await?;

    for (_id, _seq, referenced_table, from, to, _on_update, on_delete, _match) in foreign_keys {
        // An absent target column means the key references the table's
        // implicit primary key; resolved once all tables are loaded.
        let mut fk = ForeignKey::new(from, referenced_table, to.unwrap_or_default());
        if let Some(action) = on_delete_action(&on_delete) {
            fk = fk.on_delete(action);
        }
        table = table.foreign_key(fk);
    }

    Ok(table)
}

/// Maps a declared column type to its storage class, following the
/// engine's affinity rules.
fn column_type_from_declared(declared: &str) -> ColumnType {
    let upper = declared.to_uppercase();
    if upper.contains("INT") {
        ColumnType::Integer
    } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
        ColumnType::Text
    } else if upper.is_empty() || upper.contains("BLOB") {
        ColumnType::Blob
    } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
        ColumnType::Real
    } else {
        // Numeric affinity.
        ColumnType::Integer
    }
}

/// Maps the reported on-delete clause to an action. "NO ACTION" is the
/// engine default for an absent clause, so it maps back to absence.
fn on_delete_action(reported: &str) -> Option<OnDeleteAction> {
    match reported {
        "CASCADE" => Some(OnDeleteAction::Cascade),
        "SET NULL" => Some(OnDeleteAction::SetNull),
        "RESTRICT" => Some(OnDeleteAction::Restrict),
        _ => None,
    }
}

/// Fills in foreign-key target columns that referenced an implicit
/// primary key, using the referenced table's key column when it has
/// exactly one.
fn resolve_implicit_fk_targets(schema: &mut Schema) {
    let primary_keys: Vec<(String, Option<String>)> = schema
        .tables
        .iter()
        .map(|t| {
            let pk = t.primary_key_columns();
            let single = (pk.len() == 1).then(|| pk[0].to_string());
            (t.name.clone(), single)
        })
        .collect();

    for table in &mut schema.tables {
        for fk in &mut table.foreign_keys {
            if fk.referenced_column.is_empty() {
                if let Some((_, Some(pk))) = primary_keys
                    .iter()
                    .find(|(name, _)| *name == fk.referenced_table)
                {
                    fk.referenced_column.clone_from(pk);
                }
            }
        }
    }
}
