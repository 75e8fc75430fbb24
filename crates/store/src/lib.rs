//! Two-tier (memory + disk) content-addressed image cache.
//!
//! Keys are opaque strings derived per photo; values are raw image bytes.
//! The memory tier is a concurrent map with no explicit eviction. The disk
//! tier, a flat directory under the store's root, is the durable copy that
//! survives restarts.

use std::collections::HashMap;
use std::path::PathBuf;

use tokio::sync::RwLock;

/// Errors from the disk tier.
///
/// Callers in the fetch pipeline treat these as best-effort: they log and
/// continue rather than failing the surrounding operation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("image store I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

/// Two-tier image byte cache.
///
/// `get` consults memory first, then disk; a disk hit repopulates the
/// memory tier so repeated reads skip the file system. Deletes are
/// idempotent in both tiers.
pub struct ImageStore {
    memory: RwLock<HashMap<String, Vec<u8>>>,
    root: PathBuf,
}

impl ImageStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;

        Ok(Self {
            memory: RwLock::new(HashMap::new()),
            root,
        })
    }

    /// Fetch the bytes cached under `key`, if any.
    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        if let Some(bytes) = self.memory.read().await.get(key) {
            return Some(bytes.clone());
        }

        match tokio::fs::read(self.path_for(key)).await {
            Ok(bytes) => {
                // Warm the memory tier so the next read skips the disk.
                self.memory
                    .write()
                    .await
                    .insert(key.to_string(), bytes.clone());
                Some(bytes)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(key, error = %e, "Disk tier read failed");
                None
            }
        }
    }

    /// Cache `bytes` under `key`, or remove the entry when `bytes` is `None`.
    pub async fn put(&self, key: &str, bytes: Option<Vec<u8>>) -> Result<(), StoreError> {
        match bytes {
            Some(bytes) => {
                self.memory
                    .write()
                    .await
                    .insert(key.to_string(), bytes.clone());
                tokio::fs::write(self.path_for(key), &bytes).await?;
                Ok(())
            }
            None => self.delete(key).await,
        }
    }

    /// Remove `key` from both tiers. Missing keys are not an error.
    pub async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.memory.write().await.remove(key);

        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    /// Number of entries currently resident in the memory tier.
    pub async fn memory_len(&self) -> usize {
        self.memory.read().await.len()
    }

    /// Resolve a key to its backing file.
    ///
    /// Keys are opaque; path separators are stripped so a malformed key
    /// cannot escape the store root.
    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key.chars().filter(|c| *c != '/' && *c != '\\').collect();
        self.root.join(safe)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
