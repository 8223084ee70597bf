//! Static schema registry and destructive reset.
//!
//! # Responsibility
//! - Declare the mapped tables and their dependency order.
//! - Drop and recreate the mapped schema on request.
//!
//! # Invariants
//! - `MAPPED_TABLES` is ordered parents first; drops run in reverse.
//! - Reset is all-or-nothing: drop, version rewind and re-create share one
//!   transaction.
//! - Reset destroys every stored row. There is no undo.

use super::migrations::{apply_migrations_in_tx, current_user_version};
use super::DbResult;
use log::{error, warn};
use rusqlite::{Connection, TransactionBehavior};
use std::time::Instant;

/// Mapping of one entity (or link) table and its columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableMapping {
    pub table: &'static str,
    pub columns: &'static [&'static str],
}

/// Every table owned by the storefront schema, parents first.
pub const MAPPED_TABLES: &[TableMapping] = &[
    TableMapping {
        table: "stores",
        columns: &["id", "name"],
    },
    TableMapping {
        table: "products",
        columns: &["id", "name", "price"],
    },
    TableMapping {
        table: "employees",
        columns: &["id", "first_name", "last_name", "store_id", "position"],
    },
    TableMapping {
        table: "store_products",
        columns: &["store_id", "product_id", "position"],
    },
];

/// Drops every mapped table and recreates the schema from migrations.
///
/// # Side effects
/// - Irreversibly deletes all stores, products, employees and links.
/// - Emits `schema_reset` logging events with duration and status.
pub fn reset_schema(conn: &mut Connection) -> DbResult<()> {
    let started_at = Instant::now();
    warn!(
        "event=schema_reset module=db status=start tables={} destructive=true",
        MAPPED_TABLES.len()
    );

    match drop_and_create(conn) {
        Ok(()) => {
            warn!(
                "event=schema_reset module=db status=ok duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(())
        }
        Err(err) => {
            error!(
                "event=schema_reset module=db status=error duration_ms={} error_code=schema_reset_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn drop_and_create(conn: &mut Connection) -> DbResult<()> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    for mapping in MAPPED_TABLES.iter().rev() {
        tx.execute_batch(&format!("DROP TABLE IF EXISTS {};", mapping.table))?;
    }
    tx.execute_batch("PRAGMA user_version = 0;")?;
    apply_migrations_in_tx(&tx)?;
    tx.commit()?;
    Ok(())
}

/// Returns whether the connection carries every mapped table and column.
pub fn schema_matches_mapping(conn: &Connection) -> DbResult<bool> {
    for mapping in MAPPED_TABLES {
        let columns = table_columns(conn, mapping.table)?;
        if columns.is_empty() {
            return Ok(false);
        }
        if !mapping
            .columns
            .iter()
            .all(|column| columns.iter().any(|actual| actual == column))
        {
            return Ok(false);
        }
    }
    Ok(current_user_version(conn)? > 0)
}

fn table_columns(conn: &Connection, table: &str) -> DbResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get::<_, String>(1)?);
    }
    Ok(columns)
}
