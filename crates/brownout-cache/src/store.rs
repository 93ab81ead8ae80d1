//! Cache store trait and the in-memory store.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::entry::CachedResponse;
use crate::error::{CacheError, CacheResult};
use crate::key::RequestKey;

/// A named, persistent key to response store.
///
/// Every entry of one store lives under a single logical namespace. A `put`
/// for an existing key replaces the previous entry.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Logical namespace of this store.
    fn namespace(&self) -> &str;

    /// Get the entry for a key.
    async fn get(&self, key: &RequestKey) -> CacheResult<Option<CachedResponse>>;

    /// Store an entry, overwriting any previous one for the key.
    async fn put(&self, key: &RequestKey, entry: CachedResponse) -> CacheResult<()>;

    /// Delete an entry. Returns whether one existed.
    async fn delete(&self, key: &RequestKey) -> CacheResult<bool>;

    /// All keys currently stored.
    async fn keys(&self) -> CacheResult<Vec<RequestKey>>;

    /// Remove every entry in the namespace.
    async fn clear(&self) -> CacheResult<()>;
}

/// Check that a namespace is non-empty and safe to use as a file name.
pub fn validate_namespace(namespace: &str) -> CacheResult<()> {
    let valid = !namespace.is_empty()
        && namespace
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && !namespace.starts_with('.');

    if valid {
        Ok(())
    } else {
        Err(CacheError::InvalidNamespace(namespace.to_string()))
    }
}

/// Process-local cache store.
#[derive(Debug)]
pub struct MemoryCacheStore {
    namespace: String,
    entries: RwLock<HashMap<RequestKey, CachedResponse>>,
}

impl MemoryCacheStore {
    /// Create an empty store for a namespace.
    pub fn new(namespace: impl Into<String>) -> CacheResult<Self> {
        let namespace = namespace.into();
        validate_namespace(&namespace)?;
        Ok(Self {
            namespace,
            entries: RwLock::new(HashMap::new()),
        })
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> CacheError {
    CacheError::Storage("memory store lock poisoned".to_string())
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn get(&self, key: &RequestKey) -> CacheResult<Option<CachedResponse>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(key).cloned())
    }

    async fn put(&self, key: &RequestKey, entry: CachedResponse) -> CacheResult<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.insert(key.clone(), entry);
        Ok(())
    }

    async fn delete(&self, key: &RequestKey) -> CacheResult<bool> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        Ok(entries.remove(key).is_some())
    }

    async fn keys(&self) -> CacheResult<Vec<RequestKey>> {
        let entries = self.entries.read().map_err(poisoned)?;
        let mut keys: Vec<RequestKey> = entries.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    async fn clear(&self) -> CacheResult<()> {
        self.entries.write().map_err(poisoned)?.clear();
        Ok(())
    }
}
