//! Key/value slot stores
//!
//! A slot holds one logical entity (content, title, settings, sources,
//! theme) as text. Every `save` stands alone: a failure between two saves
//! leaves one slot stale but never corrupts another.

use std::collections::HashMap;
use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::config::Config;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::schema::{init_schema, needs_init, schema_version, SCHEMA_VERSION};

/// Durable key/value storage with no cross-key atomicity
pub trait SlotStore {
    /// Read a slot; `None` when the key was never written
    fn load(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write a slot, replacing any previous value
    fn save(&mut self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove a slot; removing an absent key is not an error
    fn remove(&mut self, key: &str) -> StorageResult<()>;
}

/// SQLite-backed slot store
pub struct SqliteSlotStore {
    conn: Connection,
}

impl SqliteSlotStore {
    /// Open or create the slot database described by `config`
    pub fn open(config: &Config) -> StorageResult<Self> {
        Self::open_path(&config.sqlite_path())
    }

    /// Open or create a slot database at a specific path
    pub fn open_path(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        debug!("Opened slot database at {:?}", path);
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StorageResult<Self> {
        if needs_init(&conn) {
            init_schema(&conn)?;
        } else if let Some(found) = schema_version(&conn)? {
            if found > SCHEMA_VERSION {
                return Err(StorageError::UnsupportedSchema {
                    found,
                    supported: SCHEMA_VERSION,
                });
            }
        }

        Ok(Self { conn })
    }

    /// List every stored key (sorted)
    pub fn keys(&self) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT key FROM slots ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }
}

impl SlotStore for SqliteSlotStore {
    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM slots WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn save(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO slots (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().timestamp()],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM slots WHERE key = ?1", [key])?;
        Ok(())
    }
}

/// In-process slot store
#[derive(Debug, Default, Clone)]
pub struct MemorySlotStore {
    slots: HashMap<String, String>,
    writes: usize,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of populated slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of `save` calls so far
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl SlotStore for MemorySlotStore {
    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.slots.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.slots.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        self.slots.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sqlite_save_and_load() {
        let mut store = SqliteSlotStore::open_in_memory().unwrap();

        assert!(store.load("title").unwrap().is_none());

        store.save("title", "My Essay").unwrap();
        assert_eq!(store.load("title").unwrap().as_deref(), Some("My Essay"));

        store.save("title", "Renamed").unwrap();
        assert_eq!(store.load("title").unwrap().as_deref(), Some("Renamed"));
        assert_eq!(store.keys().unwrap(), vec!["title".to_string()]);
    }

    #[test]
    fn test_sqlite_remove() {
        let mut store = SqliteSlotStore::open_in_memory().unwrap();
        store.save("theme", "light").unwrap();
        store.remove("theme").unwrap();
        assert!(store.load("theme").unwrap().is_none());

        // Removing again is fine
        store.remove("theme").unwrap();
    }

    #[test]
    fn test_sqlite_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a").join("slots.db");

        {
            let mut store = SqliteSlotStore::open_path(&path).unwrap();
            store.save("sources", r#"["A","B"]"#).unwrap();
        }

        let store = SqliteSlotStore::open_path(&path).unwrap();
        assert_eq!(
            store.load("sources").unwrap().as_deref(),
            Some(r#"["A","B"]"#)
        );
    }

    #[test]
    fn test_sqlite_rejects_newer_schema() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("slots.db");

        {
            let store = SqliteSlotStore::open_path(&path).unwrap();
            store
                .conn
                .execute(
                    "UPDATE schema_info SET value = '99' WHERE key = 'version'",
                    [],
                )
                .unwrap();
        }

        let result = SqliteSlotStore::open_path(&path);
        assert!(matches!(
            result,
            Err(StorageError::UnsupportedSchema { found: 99, .. })
        ));
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemorySlotStore::new();
        assert!(store.is_empty());

        store.save("a", "1").unwrap();
        store.save("b", "2").unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.load("a").unwrap().as_deref(), Some("1"));

        store.remove("a").unwrap();
        assert!(store.load("a").unwrap().is_none());
    }
}
