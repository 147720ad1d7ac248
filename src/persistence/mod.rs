//! Opaque key-value persistence
//!
//! Features:
//! - Typed values (ints, doubles, timestamps, small lists, JSON text)
//! - In-memory store for tests and ephemeral hosts
//! - JSON file store with temp-file + rename writes
//!
//! Saves are best-effort: callers log failures and carry on.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Persistence failures
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed stored data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("key `{key}` holds a {found}, expected {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// A stored value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum StoredValue {
    Int(i64),
    Double(f64),
    /// Seconds since the Unix epoch
    Timestamp(f64),
    IntList(Vec<i64>),
    Text(String),
}

impl StoredValue {
    pub fn kind(&self) -> &'static str {
        match self {
            StoredValue::Int(_) => "int",
            StoredValue::Double(_) => "double",
            StoredValue::Timestamp(_) => "timestamp",
            StoredValue::IntList(_) => "int list",
            StoredValue::Text(_) => "text",
        }
    }
}

/// Get/set by string key
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<StoredValue>;
    fn set(&mut self, key: &str, value: StoredValue);
    fn remove(&mut self, key: &str);
    /// Push pending writes to durable storage
    fn flush(&mut self) -> Result<(), PersistenceError>;

    fn get_int(&self, key: &str) -> Result<Option<i64>, PersistenceError> {
        match self.get(key) {
            None => Ok(None),
            Some(StoredValue::Int(v)) => Ok(Some(v)),
            Some(other) => Err(mismatch(key, "int", &other)),
        }
    }

    fn get_timestamp(&self, key: &str) -> Result<Option<f64>, PersistenceError> {
        match self.get(key) {
            None => Ok(None),
            Some(StoredValue::Timestamp(v)) | Some(StoredValue::Double(v)) => Ok(Some(v)),
            Some(other) => Err(mismatch(key, "timestamp", &other)),
        }
    }

    fn get_int_list(&self, key: &str) -> Result<Option<Vec<i64>>, PersistenceError> {
        match self.get(key) {
            None => Ok(None),
            Some(StoredValue::IntList(v)) => Ok(Some(v)),
            Some(other) => Err(mismatch(key, "int list", &other)),
        }
    }

    fn get_text(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        match self.get(key) {
            None => Ok(None),
            Some(StoredValue::Text(v)) => Ok(Some(v)),
            Some(other) => Err(mismatch(key, "text", &other)),
        }
    }
}

fn mismatch(key: &str, expected: &'static str, found: &StoredValue) -> PersistenceError {
    PersistenceError::TypeMismatch {
        key: key.to_string(),
        expected,
        found: found.kind(),
    }
}

/// Volatile store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, StoredValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<StoredValue> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: StoredValue) {
        self.values.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }

    fn flush(&mut self) -> Result<(), PersistenceError> {
        Ok(())
    }
}

/// Whole-map JSON file; writes go to a temp file first, then rename
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, StoredValue>,
    dirty: bool,
}

impl JsonFileStore {
    /// Open (or create on first flush) the store at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let json = fs::read_to_string(&path)?;
            let values: BTreeMap<String, StoredValue> = serde_json::from_str(&json)?;
            log::info!("Loaded {} stored values from {}", values.len(), path.display());
            values
        } else {
            log::info!("No store at {}, starting fresh", path.display());
            BTreeMap::new()
        };
        Ok(Self {
            path,
            values,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<StoredValue> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: StoredValue) {
        self.values.insert(key.to_string(), value);
        self.dirty = true;
    }

    fn remove(&mut self, key: &str) {
        if self.values.remove(key).is_some() {
            self.dirty = true;
        }
    }

    fn flush(&mut self) -> Result<(), PersistenceError> {
        if !self.dirty {
            return Ok(());
        }
        let json = serde_json::to_string_pretty(&self.values)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        self.dirty = false;
        log::debug!("Store flushed to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_typed_getters() {
        let mut store = MemoryStore::new();
        store.set("taps", StoredValue::Int(42));
        store.set("milestones", StoredValue::IntList(vec![100, 200]));
        assert_eq!(store.get_int("taps").unwrap(), Some(42));
        assert_eq!(store.get_int("missing").unwrap(), None);
        assert_eq!(store.get_int_list("milestones").unwrap(), Some(vec![100, 200]));

        let err = store.get_int("milestones").unwrap_err();
        assert!(matches!(err, PersistenceError::TypeMismatch { .. }));
        assert!(err.to_string().contains("int list"));
    }

    #[test]
    fn test_json_file_store_round_trip() {
        let dir = std::env::temp_dir().join(format!("dial_toy_store_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("store.json");
        let _ = fs::remove_file(&path);

        let mut store = JsonFileStore::open(&path).unwrap();
        store.set("spins", StoredValue::Int(7));
        store.set("last", StoredValue::Timestamp(1_700_000_000.5));
        store.flush().unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get_int("spins").unwrap(), Some(7));
        assert_eq!(reopened.get_timestamp("last").unwrap(), Some(1_700_000_000.5));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = std::env::temp_dir().join(format!("dial_toy_corrupt_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("store.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(JsonFileStore::open(&path), Err(PersistenceError::Json(_))));
        fs::remove_dir_all(&dir).unwrap();
    }
}
