#![forbid(unsafe_code)]

use super::super::{StorageFailure, StoreError};
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::BTreeSet;

pub(in crate::store) const SCHEMA_VERSION: &str = "1";

const REQUIRED_TABLES: [&str; 2] = ["meta", "file_tree"];

/// Refuses databases that were not written by this store.
pub(in crate::store) fn preflight_gate(conn: &Connection) -> Result<(), StoreError> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
    )?;
    let mut rows = stmt.query([])?;
    let mut tables = BTreeSet::new();
    while let Some(row) = rows.next()? {
        tables.insert(row.get::<_, String>(0)?);
    }

    if tables.is_empty() {
        return Ok(());
    }

    if tables
        .iter()
        .any(|table| !REQUIRED_TABLES.contains(&table.as_str()))
    {
        return Err(reset_required("unsupported tables detected"));
    }
    if REQUIRED_TABLES.iter().any(|table| !tables.contains(*table)) {
        return Err(reset_required("required table is missing"));
    }

    let version = conn
        .query_row(
            "SELECT value FROM meta WHERE key='schema_version'",
            [],
            |row| row.get::<_, String>(0),
        )
        .optional()?;

    match version.as_deref() {
        Some(SCHEMA_VERSION) => Ok(()),
        Some(_) => Err(reset_required("schema version mismatch")),
        None => Err(reset_required("schema version row is missing")),
    }
}

pub(in crate::store) fn install_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS meta (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS file_tree (
          key TEXT PRIMARY KEY,
          revision INTEGER NOT NULL CHECK(revision > 0),
          value TEXT NOT NULL,
          updated_at_ms INTEGER NOT NULL
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO meta(key, value) VALUES (?1, ?2)",
        params!["schema_version", SCHEMA_VERSION],
    )?;

    Ok(())
}

fn reset_required(message: &'static str) -> StoreError {
    StoreError::StorageUnavailable(StorageFailure::ResetRequired(message))
}
