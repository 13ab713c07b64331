#![forbid(unsafe_code)]

use super::super::StoreError;
use super::time::now_ms;
use rusqlite::{Connection, OptionalExtension, Transaction, params};

/// Key of the single row holding the whole tree.
const RECORD_KEY: &str = "file_tree";

#[derive(Debug)]
pub(in crate::store) struct StoredRecord {
    pub(in crate::store) revision: i64,
    pub(in crate::store) value: String,
}

pub(in crate::store) fn read_record(conn: &Connection) -> Result<Option<StoredRecord>, StoreError> {
    Ok(conn
        .query_row(
            "SELECT revision, value FROM file_tree WHERE key=?1",
            params![RECORD_KEY],
            |row| {
                Ok(StoredRecord {
                    revision: row.get(0)?,
                    value: row.get(1)?,
                })
            },
        )
        .optional()?)
}

pub(in crate::store) fn record_revision(conn: &Connection) -> Result<i64, StoreError> {
    Ok(conn
        .query_row(
            "SELECT revision FROM file_tree WHERE key=?1",
            params![RECORD_KEY],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .unwrap_or(0))
}

/// Replaces the record and returns the new revision.
pub(in crate::store) fn write_record_tx(
    tx: &Transaction<'_>,
    previous_revision: i64,
    value: &str,
) -> Result<i64, StoreError> {
    let revision = previous_revision.saturating_add(1);
    tx.execute(
        r#"
        INSERT INTO file_tree(key, revision, value, updated_at_ms)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(key) DO UPDATE SET revision=excluded.revision, value=excluded.value, updated_at_ms=excluded.updated_at_ms
        "#,
        params![RECORD_KEY, revision, value, now_ms()],
    )?;
    Ok(revision)
}
