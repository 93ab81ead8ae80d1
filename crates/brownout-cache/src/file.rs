//! Persistent file-backed cache store.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::entry::CachedResponse;
use crate::error::{CacheError, CacheResult};
use crate::key::RequestKey;
use crate::store::{validate_namespace, CacheStore};

/// On-disk layout: one JSON document per namespace.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheDocument {
    namespace: String,
    #[serde(default)]
    entries: BTreeMap<String, CachedResponse>,
}

/// Cache store persisted as `<dir>/<namespace>.json`.
///
/// Writes go to a temporary file which is then renamed over the document,
/// so a crash mid-write leaves the previous document intact.
pub struct FileCacheStore {
    namespace: String,
    path: PathBuf,
    // Serialises read-modify-write cycles on the document.
    lock: Mutex<()>,
}

impl FileCacheStore {
    /// Open (or lazily create) the store for `namespace` under `dir`.
    pub async fn open(dir: impl AsRef<Path>, namespace: impl Into<String>) -> CacheResult<Self> {
        let namespace = namespace.into();
        validate_namespace(&namespace)?;

        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;

        Ok(Self {
            path: dir.join(format!("{}.json", namespace)),
            namespace,
            lock: Mutex::new(()),
        })
    }

    /// Path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> CacheResult<CacheDocument> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| CacheError::Corrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CacheDocument {
                namespace: self.namespace.clone(),
                entries: BTreeMap::new(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_document(&self, document: &CacheDocument) -> CacheResult<()> {
        let bytes = serde_json::to_vec(document)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    // A corrupt document must not block new writes; start over instead.
    async fn read_for_update(&self) -> CacheResult<CacheDocument> {
        match self.read_document().await {
            Err(CacheError::Corrupt { path, reason }) => {
                warn!(path = %path.display(), %reason, "replacing corrupt cache document");
                Ok(CacheDocument {
                    namespace: self.namespace.clone(),
                    entries: BTreeMap::new(),
                })
            }
            other => other,
        }
    }
}

#[async_trait]
impl CacheStore for FileCacheStore {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn get(&self, key: &RequestKey) -> CacheResult<Option<CachedResponse>> {
        let _guard = self.lock.lock().await;
        let document = self.read_document().await?;
        Ok(document.entries.get(key.as_str()).cloned())
    }

    async fn put(&self, key: &RequestKey, entry: CachedResponse) -> CacheResult<()> {
        let _guard = self.lock.lock().await;
        let mut document = self.read_for_update().await?;
        document.entries.insert(key.as_str().to_string(), entry);
        self.write_document(&document).await?;
        debug!(key = %key, namespace = %self.namespace, "stored cache entry");
        Ok(())
    }

    async fn delete(&self, key: &RequestKey) -> CacheResult<bool> {
        let _guard = self.lock.lock().await;
        let mut document = self.read_for_update().await?;
        let existed = document.entries.remove(key.as_str()).is_some();
        if existed {
            self.write_document(&document).await?;
        }
        Ok(existed)
    }

    async fn keys(&self) -> CacheResult<Vec<RequestKey>> {
        let _guard = self.lock.lock().await;
        let document = self.read_document().await?;
        Ok(document.entries.keys().map(RequestKey::from_raw).collect())
    }

    async fn clear(&self) -> CacheResult<()> {
        let _guard = self.lock.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
