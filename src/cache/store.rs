use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::cache::entry::{CacheEntry, ENTRY_FORMAT_VERSION};
use crate::types::identifiers::ContentFingerprint;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Entry stored under {expected} claims fingerprint {actual}")]
    FingerprintMismatch { expected: String, actual: String },
    #[error("Unsupported entry format version {0}")]
    UnsupportedFormat(u32),
}

/// Durable fingerprint → entry mapping shared by concurrent requests.
///
/// Implementations must make a single-key write atomic; nothing else is
/// required since entries are never mutated.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &ContentFingerprint) -> Result<Option<CacheEntry>, CacheError>;

    /// Overwriting an existing key with an equivalent entry must be harmless.
    async fn put(&self, entry: &CacheEntry) -> Result<(), CacheError>;
}

#[async_trait]
impl<T> CacheStore for Arc<T>
where
    T: CacheStore + ?Sized,
{
    async fn get(&self, key: &ContentFingerprint) -> Result<Option<CacheEntry>, CacheError> {
        (**self).get(key).await
    }

    async fn put(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        (**self).put(entry).await
    }
}

/// One JSON file per fingerprint: `<root>/<first 2 hex>/<fingerprint>.json`.
///
/// Eviction (size, age) is left to whoever owns the directory.
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entry_path(&self, key: &ContentFingerprint) -> PathBuf {
        let hex = key.as_str();
        self.root.join(&hex[..2]).join(format!("{hex}.json"))
    }
}

#[async_trait]
impl CacheStore for DiskStore {
    async fn get(&self, key: &ContentFingerprint) -> Result<Option<CacheEntry>, CacheError> {
        let bytes = match fs::read(self.entry_path(key)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let entry: CacheEntry = serde_json::from_slice(&bytes)?;

        if entry.format_version != ENTRY_FORMAT_VERSION {
            return Err(CacheError::UnsupportedFormat(entry.format_version));
        }
        // Verify the file belongs to the key it is stored under
        if &entry.fingerprint != key {
            return Err(CacheError::FingerprintMismatch {
                expected: key.to_string(),
                actual: entry.fingerprint.to_string(),
            });
        }
        Ok(Some(entry))
    }

    async fn put(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        let final_path = self.entry_path(&entry.fingerprint);
        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Unique temp name so racing writers never share a half-written file
        let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let temp_path = final_path.with_extension(format!("tmp.{}.{nanos}", std::process::id()));

        let json = serde_json::to_vec_pretty(entry)?;
        let mut f = fs::File::create(&temp_path).await?;
        f.write_all(&json).await?;
        f.sync_all().await?;
        drop(f);

        // Atomic rename; last writer wins with an equivalent entry
        if let Err(e) = fs::rename(&temp_path, &final_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        Ok(())
    }
}

/// Process-local store, mainly for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<ContentFingerprint, CacheEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &ContentFingerprint) -> Result<Option<CacheEntry>, CacheError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::Io(std::io::Error::new(ErrorKind::Other, "cache lock poisoned")))?;
        Ok(entries.get(key).cloned())
    }

    async fn put(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::Io(std::io::Error::new(ErrorKind::Other, "cache lock poisoned")))?;
        entries.insert(entry.fingerprint.clone(), entry.clone());
        Ok(())
    }
}
