//! Durable key-value storage and the persisted snapshot built on top of it.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use super::traits::{Cacheable, QueryKey};
use crate::error::StorageError;

/// Synchronous string key-value store shared for the whole process lifetime.
pub trait KeyValueStore: Send + Sync {
  /// Read the value stored under `key`. Absence is not an error.
  fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

  /// Store `value` under `key`, overwriting any prior value.
  fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

  /// Remove `key` unconditionally.
  fn remove(&self, key: &str) -> Result<(), StorageError>;

  /// Whether anything is stored under `key`.
  fn contains(&self, key: &str) -> Result<bool, StorageError> {
    Ok(self.get(key)?.is_some())
  }
}

/// Storage implementation that doesn't persist anything.
/// Used when persistence is disabled - all operations are no-ops.
pub struct NoopStore;

impl KeyValueStore for NoopStore {
  fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
    Ok(None) // Always absent
  }

  fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
    Ok(()) // Discard
  }

  fn remove(&self, _key: &str) -> Result<(), StorageError> {
    Ok(())
  }
}

/// In-memory store used as a test double.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
  values: Mutex<std::collections::HashMap<String, String>>,
}

#[cfg(test)]
impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
  fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
    let values = self.values.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    Ok(values.get(key).cloned())
  }

  fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
    let mut values = self.values.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    values.insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<(), StorageError> {
    let mut values = self.values.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    values.remove(key);
    Ok(())
  }

  fn contains(&self, key: &str) -> Result<bool, StorageError> {
    let values = self.values.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    Ok(values.contains_key(key))
  }
}

/// SQLite-backed key-value store.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

/// Schema for the key-value table.
const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv_cache (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    stored_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

impl SqliteStore {
  /// Open the store at `path`, or at the default location when `None`.
  pub fn open(path: Option<&Path>) -> Result<Self, StorageError> {
    let path = match path {
      Some(p) => p.to_path_buf(),
      None => Self::default_path()?,
    };

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| StorageError::Open(format!("Failed to create cache directory: {}", e)))?;
    }

    let conn = Connection::open(&path).map_err(|e| {
      StorageError::Open(format!(
        "Failed to open cache database at {}: {}",
        path.display(),
        e
      ))
    })?;

    Self::from_connection(conn)
  }

  /// Open a throwaway in-memory database.
  #[cfg(test)]
  pub fn open_in_memory() -> Result<Self, StorageError> {
    let conn = Connection::open_in_memory().map_err(|e| StorageError::Open(e.to_string()))?;
    Self::from_connection(conn)
  }

  fn from_connection(conn: Connection) -> Result<Self, StorageError> {
    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| StorageError::Open(format!("Failed to run cache migrations: {}", e)))?;

    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  /// Get the default database path.
  pub fn default_path() -> Result<PathBuf, StorageError> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| StorageError::Open("Could not determine data directory".to_string()))?;

    Ok(data_dir.join("todomaster").join("cache.db"))
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StorageError> {
    self.conn.lock().map_err(|_| StorageError::Lock)
  }
}

impl KeyValueStore for SqliteStore {
  fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
    let conn = self.lock()?;
    let value = conn
      .query_row(
        "SELECT value FROM kv_cache WHERE key = ?",
        params![key],
        |row| row.get(0),
      )
      .optional()?;
    Ok(value)
  }

  fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
    let conn = self.lock()?;
    conn.execute(
      "INSERT OR REPLACE INTO kv_cache (key, value, stored_at) VALUES (?, ?, datetime('now'))",
      params![key, value],
    )?;
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<(), StorageError> {
    let conn = self.lock()?;
    conn.execute("DELETE FROM kv_cache WHERE key = ?", params![key])?;
    Ok(())
  }

  fn contains(&self, key: &str) -> Result<bool, StorageError> {
    let conn = self.lock()?;
    let found = conn
      .query_row("SELECT 1 FROM kv_cache WHERE key = ?", params![key], |_| Ok(()))
      .optional()?;
    Ok(found.is_some())
  }
}

/// A snapshot read back from durable storage.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PersistedSnapshot<T> {
  pub items: Vec<T>,
  pub stored_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct SnapshotRef<'a, T> {
  items: &'a [T],
  stored_at: DateTime<Utc>,
}

/// Serialized copy of one query's collection in a [`KeyValueStore`].
pub struct PersistedCache<T> {
  store: Arc<dyn KeyValueStore>,
  key: String,
  _entity: PhantomData<fn() -> T>,
}

impl<T: Cacheable> PersistedCache<T> {
  pub fn new<K: QueryKey>(store: Arc<dyn KeyValueStore>, query: &K) -> Self {
    Self {
      store,
      key: format!("{}:{}", T::entity_type(), query.cache_hash()),
      _entity: PhantomData,
    }
  }

  /// The storage key this snapshot lives under.
  #[cfg(test)]
  pub fn key(&self) -> &str {
    &self.key
  }

  /// Read the snapshot. A payload that no longer parses counts as absent
  /// and is dropped from the store.
  pub fn load(&self) -> Result<Option<PersistedSnapshot<T>>, StorageError> {
    let Some(raw) = self.store.get(&self.key)? else {
      return Ok(None);
    };

    match serde_json::from_str::<PersistedSnapshot<T>>(&raw) {
      Ok(snapshot) => {
        debug!(key = %self.key, count = snapshot.items.len(), "loaded persisted snapshot");
        Ok(Some(snapshot))
      }
      Err(e) => {
        warn!(key = %self.key, error = %e, "discarding unreadable persisted snapshot");
        self.store.remove(&self.key)?;
        Ok(None)
      }
    }
  }

  /// Overwrite the snapshot with `items`.
  pub fn save(&self, items: &[T]) -> Result<(), StorageError> {
    let payload = serde_json::to_string(&SnapshotRef {
      items,
      stored_at: Utc::now(),
    })
    .map_err(|e| StorageError::Serialize(e.to_string()))?;
    self.store.set(&self.key, &payload)
  }

  /// Remove the snapshot unconditionally.
  pub fn clear(&self) -> Result<(), StorageError> {
    self.store.remove(&self.key)
  }

  /// Whether a snapshot is currently stored. Does not read the payload.
  pub fn exists(&self) -> Result<bool, StorageError> {
    self.store.contains(&self.key)
  }
}

impl<T> Clone for PersistedCache<T> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      key: self.key.clone(),
      _entity: PhantomData,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
  struct Note {
    id: u32,
    text: String,
  }

  impl Cacheable for Note {
    fn entity_type() -> &'static str {
      "note"
    }
  }

  #[derive(Clone)]
  struct NotesKey;

  impl QueryKey for NotesKey {
    fn cache_hash(&self) -> String {
      "notes".to_string()
    }

    fn description(&self) -> String {
      "all notes".to_string()
    }
  }

  fn note(id: u32, text: &str) -> Note {
    Note {
      id,
      text: text.to_string(),
    }
  }

  #[test]
  fn test_sqlite_store_set_get_remove() {
    let store = SqliteStore::open_in_memory().unwrap();
    assert_eq!(store.get("a").unwrap(), None);

    store.set("a", "one").unwrap();
    assert_eq!(store.get("a").unwrap().as_deref(), Some("one"));

    store.set("a", "two").unwrap();
    assert_eq!(store.get("a").unwrap().as_deref(), Some("two"));

    store.remove("a").unwrap();
    assert_eq!(store.get("a").unwrap(), None);

    // Removing an absent key is fine
    store.remove("a").unwrap();
  }

  #[test]
  fn test_noop_store_never_returns_values() {
    let store = NoopStore;
    store.set("a", "one").unwrap();
    assert_eq!(store.get("a").unwrap(), None);
  }

  #[test]
  fn test_persisted_cache_save_overwrites() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let cache: PersistedCache<Note> = PersistedCache::new(store, &NotesKey);

    assert_eq!(cache.load().unwrap(), None);
    assert!(!cache.exists().unwrap());

    cache.save(&[note(1, "first")]).unwrap();
    cache.save(&[note(2, "second"), note(3, "third")]).unwrap();

    let snapshot = cache.load().unwrap().unwrap();
    assert_eq!(snapshot.items, vec![note(2, "second"), note(3, "third")]);
    assert!(cache.exists().unwrap());
  }

  #[test]
  fn test_persisted_cache_clear() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let cache: PersistedCache<Note> = PersistedCache::new(store, &NotesKey);

    cache.save(&[note(1, "first")]).unwrap();
    cache.clear().unwrap();

    assert_eq!(cache.load().unwrap(), None);
  }

  #[test]
  fn test_corrupt_payload_is_treated_as_absent() {
    let store = Arc::new(MemoryStore::new());
    let cache: PersistedCache<Note> = PersistedCache::new(store.clone(), &NotesKey);

    store.set(cache.key(), "{not json").unwrap();
    assert!(cache.exists().unwrap());

    assert_eq!(cache.load().unwrap(), None);
    assert!(!cache.exists().unwrap());
    assert_eq!(store.get(cache.key()).unwrap(), None);
  }

  #[test]
  fn test_sqlite_contains_tracks_set_and_remove() {
    let store = SqliteStore::open_in_memory().unwrap();
    assert!(!store.contains("a").unwrap());

    store.set("a", "one").unwrap();
    assert!(store.contains("a").unwrap());
    assert!(!store.contains("b").unwrap());

    store.remove("a").unwrap();
    assert!(!store.contains("a").unwrap());
  }

  #[test]
  fn test_key_is_namespaced_by_entity_type() {
    let cache: PersistedCache<Note> = PersistedCache::new(Arc::new(NoopStore), &NotesKey);
    assert_eq!(cache.key(), "note:notes");
  }
}
