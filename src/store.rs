//! Durable key-value store for the three top-level collections.
//!
//! Values are whole JSON documents. `save` overwrites the full value and
//! `clear` removes keys outright; there is no partial update.

use std::collections::HashMap;
use std::path::Path;

use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::db::{self, DatabaseError};

/// Fixed storage identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    Patients,
    Appointments,
    Settings,
}

impl StoreKey {
    pub const ALL: [StoreKey; 3] = [Self::Patients, Self::Appointments, Self::Settings];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Patients => "pf_patients",
            Self::Appointments => "pf_appointments",
            Self::Settings => "pf_settings",
        }
    }
}

impl std::fmt::Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Stored value at {key} is malformed: {reason}")]
    Malformed { key: StoreKey, reason: String },

    #[error("Could not serialize value for {key}: {reason}")]
    Serialize { key: StoreKey, reason: String },
}

/// Synchronous whole-value persistence.
pub trait PersistentStore {
    /// Raw JSON at `key`, `None` when nothing was ever saved.
    fn read_raw(&self, key: StoreKey) -> Result<Option<String>, StoreError>;

    fn write_raw(&mut self, key: StoreKey, json: &str) -> Result<(), StoreError>;

    fn remove(&mut self, keys: &[StoreKey]) -> Result<(), StoreError>;

    /// Parsed value at `key`. A value that does not parse is an error,
    /// never silently replaced.
    fn load<T: DeserializeOwned>(&self, key: StoreKey) -> Result<Option<T>, StoreError> {
        match self.read_raw(key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| StoreError::Malformed {
                    key,
                    reason: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    fn save<T: Serialize + ?Sized>(&mut self, key: StoreKey, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string(value).map_err(|e| StoreError::Serialize {
            key,
            reason: e.to_string(),
        })?;
        self.write_raw(key, &json)?;
        tracing::debug!(key = key.as_str(), bytes = json.len(), "Saved collection");
        Ok(())
    }

    fn clear(&mut self, keys: &[StoreKey]) -> Result<(), StoreError> {
        self.remove(keys)?;
        tracing::info!(count = keys.len(), "Cleared stored collections");
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════
// SQLite-backed store
// ═══════════════════════════════════════════════════════════

/// Store backed by the `kv_store` table of a SQLite database.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database file and run migrations.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = db::open_database(path)?;
        let stored = db::list_keys(&conn)?;
        tracing::info!(path = %path.display(), keys = ?stored, "Opened practice store");
        Ok(Self { conn })
    }

    /// Throwaway store for tests and previews.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self {
            conn: db::open_memory_database()?,
        })
    }
}

impl PersistentStore for SqliteStore {
    fn read_raw(&self, key: StoreKey) -> Result<Option<String>, StoreError> {
        Ok(db::get_value(&self.conn, key.as_str())?)
    }

    fn write_raw(&mut self, key: StoreKey, json: &str) -> Result<(), StoreError> {
        Ok(db::set_value(&self.conn, key.as_str(), json)?)
    }

    fn remove(&mut self, keys: &[StoreKey]) -> Result<(), StoreError> {
        let names: Vec<&str> = keys.iter().map(StoreKey::as_str).collect();
        Ok(db::delete_values(&mut self.conn, &names)?)
    }
}

// ═══════════════════════════════════════════════════════════
// In-memory store
// ═══════════════════════════════════════════════════════════

/// HashMap store. Counts writes so tests can assert when persistence ran.
#[derive(Default)]
pub struct MemoryStore {
    values: HashMap<StoreKey, String>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `write_raw` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    pub fn contains(&self, key: StoreKey) -> bool {
        self.values.contains_key(&key)
    }
}

impl PersistentStore for MemoryStore {
    fn read_raw(&self, key: StoreKey) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(&key).cloned())
    }

    fn write_raw(&mut self, key: StoreKey, json: &str) -> Result<(), StoreError> {
        self.values.insert(key, json.to_string());
        self.writes += 1;
        Ok(())
    }

    fn remove(&mut self, keys: &[StoreKey]) -> Result<(), StoreError> {
        for key in keys {
            self.values.remove(key);
        }
        Ok(())
    }
}
