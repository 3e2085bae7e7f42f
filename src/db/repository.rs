//! Key-value rows backing the persistent store.
//!
//! Each row holds one whole collection as a JSON document. Callers own
//! (de)serialization; this layer only moves strings.

use rusqlite::{params, Connection};

use super::DatabaseError;

/// Get the raw value stored at `key`. Returns None if not set.
pub fn get_value(conn: &Connection, key: &str) -> Result<Option<String>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT value FROM kv_store WHERE key = ?1")?;
    match stmt.query_row([key], |row| row.get::<_, String>(0)) {
        Ok(val) => Ok(Some(val)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(DatabaseError::from(e)),
    }
}

/// Overwrite the value at `key` (upsert).
pub fn set_value(conn: &Connection, key: &str, value: &str) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO kv_store (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
        params![key, value],
    )?;
    Ok(())
}

/// Delete every listed key in one transaction. Missing keys are ignored.
pub fn delete_values(conn: &mut Connection, keys: &[&str]) -> Result<(), DatabaseError> {
    let tx = conn.transaction()?;
    for key in keys {
        tx.execute("DELETE FROM kv_store WHERE key = ?1", [key])?;
    }
    tx.commit()?;
    Ok(())
}

/// All stored keys, sorted.
pub fn list_keys(conn: &Connection) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT key FROM kv_store ORDER BY key")?;
    let keys = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(keys)
}
