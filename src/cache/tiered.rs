//! Tiered Cache Module
//!
//! Layers a durable [`Storage`] underneath an in-memory [`FetchCache`].
//! Reads go memory, then storage, then network; values found lower down are
//! written back up so the next read is served from memory.
//!
//! Both layers key entries as `"<namespace>:<key>"`, so several tiered
//! caches can share one memory cache and one storage backend. Storage calls
//! run on tokio's blocking pool since backends may do file I/O.

use std::future::Future;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::cache::{CacheEntry, SharedCache, Storage};
use crate::error::{FetchError, StorageError};

// == Tiered Cache ==
pub struct TieredCache<V> {
    memory: SharedCache<V>,
    storage: Arc<dyn Storage>,
    namespace: String,
}

impl<V> Clone for TieredCache<V> {
    fn clone(&self) -> Self {
        Self {
            memory: Arc::clone(&self.memory),
            storage: Arc::clone(&self.storage),
            namespace: self.namespace.clone(),
        }
    }
}

impl<V> TieredCache<V>
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync,
{
    /// Creates a tiered cache whose keys live under `namespace`.
    pub fn new(
        memory: SharedCache<V>,
        storage: Arc<dyn Storage>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            memory,
            storage,
            namespace: namespace.into(),
        }
    }

    /// The in-memory layer.
    pub fn memory(&self) -> &SharedCache<V> {
        &self.memory
    }

    /// Key under which `key` is held in both layers.
    pub fn scoped_key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    async fn on_storage<R, F>(&self, op: F) -> Result<R, StorageError>
    where
        R: Send + 'static,
        F: FnOnce(&dyn Storage) -> Result<R, StorageError> + Send + 'static,
    {
        let storage = Arc::clone(&self.storage);
        tokio::task::spawn_blocking(move || op(storage.as_ref())).await?
    }

    // == Get ==
    /// Looks `key` up in memory, then in storage.
    ///
    /// A fresh persisted entry is copied into memory with its original
    /// timestamp; an expired one is deleted from storage.
    pub async fn get(&self, key: &str) -> Result<Option<V>, StorageError> {
        let scoped = self.scoped_key(key);
        if let Some(value) = self.memory.write().await.get(&scoped) {
            return Ok(Some(value));
        }

        let lookup = scoped.clone();
        let Some(raw) = self.on_storage(move |s| s.read(&lookup)).await? else {
            return Ok(None);
        };
        let entry: CacheEntry<V> = serde_json::from_str(&raw)?;

        let mut memory = self.memory.write().await;
        if entry.is_expired_at(memory.now_ms()) {
            debug!(key, "persisted entry expired");
            drop(memory);
            self.on_storage(move |s| s.delete(&scoped)).await?;
            return Ok(None);
        }

        debug!(key, "persisted entry rehydrated");
        let value = entry.value.clone();
        memory.insert_entry(&scoped, entry);
        Ok(Some(value))
    }

    // == Set ==
    /// Writes `value` through both layers.
    pub async fn set(&self, key: &str, value: V, ttl_ms: u64) -> Result<(), StorageError> {
        let scoped = self.scoped_key(key);
        let entry = {
            let mut memory = self.memory.write().await;
            let entry = CacheEntry::new(value, ttl_ms, memory.now_ms());
            memory.insert_entry(&scoped, entry.clone());
            entry
        };

        let raw = serde_json::to_string(&entry)?;
        self.on_storage(move |s| s.write(&scoped, &raw)).await
    }

    /// Removes `key` from both layers.
    pub async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let scoped = self.scoped_key(key);
        self.memory.write().await.remove(&scoped);
        self.on_storage(move |s| s.delete(&scoped)).await
    }

    /// Empties this namespace in both layers. Other namespaces sharing the
    /// memory cache or the storage backend are left alone.
    pub async fn clear(&self) -> Result<(), StorageError> {
        let prefix = format!("{}:", self.namespace);
        self.memory.write().await.remove_prefix(&prefix);

        let removed = self.on_storage(move |s| s.delete_prefix(&prefix)).await?;
        debug!(namespace = %self.namespace, removed, "tiered cache cleared");
        Ok(())
    }

    // == Get Or Fetch ==
    /// Returns the cached value for `key`, fetching and storing it on a miss.
    ///
    /// Storage failures degrade to a miss (on read) or a memory-only write
    /// (on write); only the fetch itself can fail this call.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: &str,
        ttl_ms: u64,
        fetch: F,
    ) -> Result<V, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, FetchError>>,
    {
        match self.get(key).await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {}
            Err(err) => warn!(key, error = %err, "durable cache read failed, fetching"),
        }

        let value = fetch().await?;

        if let Err(err) = self.set(key, value.clone(), ttl_ms).await {
            warn!(key, error = %err, "durable cache write failed");
        }
        Ok(value)
    }
}
