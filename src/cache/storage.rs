//! Durable Storage Module
//!
//! String key/value backends that the tiered cache persists entries into.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::error::StorageError;

/// A synchronous string key/value store.
///
/// Calls may block on I/O; async callers run them on the blocking pool.
pub trait Storage: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn delete(&self, key: &str) -> Result<(), StorageError>;
    /// Deletes every key starting with `prefix`, returning how many went.
    fn delete_prefix(&self, prefix: &str) -> Result<usize, StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
}

type Map = HashMap<String, String>;

fn lock(map: &Mutex<Map>) -> Result<MutexGuard<'_, Map>, StorageError> {
    map.lock().map_err(|_| StorageError::Poisoned)
}

fn retain_unprefixed(map: &mut Map, prefix: &str) -> usize {
    let before = map.len();
    map.retain(|key, _| !key.starts_with(prefix));
    before - map.len()
}

// == Memory Storage ==
/// Process-local storage, mostly useful in tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(lock(&self.map)?.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        lock(&self.map)?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        lock(&self.map)?.remove(key);
        Ok(())
    }

    fn delete_prefix(&self, prefix: &str) -> Result<usize, StorageError> {
        Ok(retain_unprefixed(&mut *lock(&self.map)?, prefix))
    }

    fn clear(&self) -> Result<(), StorageError> {
        lock(&self.map)?.clear();
        Ok(())
    }
}

// == JSON File Storage ==
/// Storage backed by a single JSON object on disk.
///
/// The whole map is loaded on open and rewritten after every mutation, which
/// suits the handful of small entries a client-side cache persists.
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
    map: Mutex<HashMap<String, String>>,
}

impl JsonFileStorage {
    /// Opens (or lazily creates) the storage file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let map = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => HashMap::new(),
            Ok(text) => serde_json::from_str(&text)?,
            Err(err) if err.kind() == ErrorKind::NotFound => HashMap::new(),
            Err(err) => return Err(err.into()),
        };

        Ok(Self {
            path,
            map: Mutex::new(map),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, map: &HashMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(map)?)?;
        Ok(())
    }
}

impl Storage for JsonFileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(lock(&self.map)?.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut map = lock(&self.map)?;
        map.insert(key.to_string(), value.to_string());
        self.flush(&map)
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut map = lock(&self.map)?;
        if map.remove(key).is_some() {
            self.flush(&map)?;
        }
        Ok(())
    }

    fn delete_prefix(&self, prefix: &str) -> Result<usize, StorageError> {
        let mut map = lock(&self.map)?;
        let removed = retain_unprefixed(&mut map, prefix);
        if removed > 0 {
            self.flush(&map)?;
        }
        Ok(removed)
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut map = lock(&self.map)?;
        map.clear();
        self.flush(&map)
    }
}
