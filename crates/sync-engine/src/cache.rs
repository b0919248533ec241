// crates/sync-engine/src/cache.rs
//! Identity cache: content key to remote identifier, per instance
//!
//! The cache is the only state that survives between runs. Entries are
//! written only after the service has confirmed an identifier.

use crate::error::{SyncError, SyncResult};
use crate::types::CacheEntry;
use guidesync_core::{ContentKey, InstanceName, RemoteId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

const CACHE_VERSION: u32 = 1;

/// Storage for identity cache entries, namespaced by instance
pub trait IdentityCacheStore: Send + Sync {
    /// Remote identifier last produced for `key`
    fn lookup(&self, instance: &InstanceName, key: &ContentKey) -> SyncResult<Option<RemoteId>>;

    /// Records (or replaces) the identifier for `entry.trash_id`
    fn store(&self, instance: &InstanceName, entry: CacheEntry) -> SyncResult<()>;

    fn remove(&self, instance: &InstanceName, key: &ContentKey) -> SyncResult<()>;

    /// Every entry for one instance, ordered by key
    fn entries(&self, instance: &InstanceName) -> SyncResult<Vec<CacheEntry>>;

    /// Makes the instance's entries durable
    fn persist(&self, _instance: &InstanceName) -> SyncResult<()> {
        Ok(())
    }
}

type Namespaces = HashMap<InstanceName, BTreeMap<ContentKey, CacheEntry>>;

/// Cache held in memory only
#[derive(Clone, Default)]
pub struct MemoryCacheStore {
    namespaces: Arc<Mutex<Namespaces>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn replace(&self, instance: &InstanceName, entries: Vec<CacheEntry>) -> SyncResult<()> {
        let mut namespaces = self
            .namespaces
            .lock()
            .map_err(|_| SyncError::lock_poisoned())?;
        namespaces.insert(
            instance.clone(),
            entries
                .into_iter()
                .map(|e| (e.trash_id.clone(), e))
                .collect(),
        );
        Ok(())
    }
}

impl IdentityCacheStore for MemoryCacheStore {
    fn lookup(&self, instance: &InstanceName, key: &ContentKey) -> SyncResult<Option<RemoteId>> {
        let namespaces = self
            .namespaces
            .lock()
            .map_err(|_| SyncError::lock_poisoned())?;
        Ok(namespaces
            .get(instance)
            .and_then(|entries| entries.get(key))
            .map(|e| e.id.clone()))
    }

    fn store(&self, instance: &InstanceName, entry: CacheEntry) -> SyncResult<()> {
        let mut namespaces = self
            .namespaces
            .lock()
            .map_err(|_| SyncError::lock_poisoned())?;
        namespaces
            .entry(instance.clone())
            .or_default()
            .insert(entry.trash_id.clone(), entry);
        Ok(())
    }

    fn remove(&self, instance: &InstanceName, key: &ContentKey) -> SyncResult<()> {
        let mut namespaces = self
            .namespaces
            .lock()
            .map_err(|_| SyncError::lock_poisoned())?;
        if let Some(entries) = namespaces.get_mut(instance) {
            entries.remove(key);
        }
        Ok(())
    }

    fn entries(&self, instance: &InstanceName) -> SyncResult<Vec<CacheEntry>> {
        let namespaces = self
            .namespaces
            .lock()
            .map_err(|_| SyncError::lock_poisoned())?;
        Ok(namespaces
            .get(instance)
            .map(|entries| entries.values().cloned().collect())
            .unwrap_or_default())
    }
}

/// On-disk layout of one instance's cache file
#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    #[serde(default)]
    custom_formats: Vec<CacheEntry>,
}

/// Cache persisted as one JSON file per instance
///
/// Files are read on first use of an instance and written atomically by
/// [`IdentityCacheStore::persist`].
pub struct JsonFileCacheStore {
    cache_dir: PathBuf,
    memory: MemoryCacheStore,
    loaded: Mutex<HashSet<InstanceName>>,
}

impl JsonFileCacheStore {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            memory: MemoryCacheStore::new(),
            loaded: Mutex::new(HashSet::new()),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path of the cache file for one instance
    ///
    /// ASCII letters, digits and `-` are kept (lowercased); every other byte
    /// is escaped as `_xx`, so distinct names never share a file.
    pub fn cache_path(&self, instance: &InstanceName) -> PathBuf {
        let mut file_name = String::with_capacity(instance.as_str().len());
        for byte in instance.as_str().bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                file_name.push(char::from(byte.to_ascii_lowercase()));
            } else {
                file_name.push_str(&format!("_{byte:02x}"));
            }
        }
        self.cache_dir.join(format!("{file_name}.json"))
    }

    fn ensure_loaded(&self, instance: &InstanceName) -> SyncResult<()> {
        let mut loaded = self.loaded.lock().map_err(|_| SyncError::lock_poisoned())?;
        if loaded.contains(instance) {
            return Ok(());
        }

        let entries = self.read_file(instance)?;
        log::debug!(
            "Loaded {} cache entries for instance {}",
            entries.len(),
            instance
        );
        self.memory.replace(instance, entries)?;
        loaded.insert(instance.clone());
        Ok(())
    }

    fn read_file(&self, instance: &InstanceName) -> SyncResult<Vec<CacheEntry>> {
        let path = self.cache_path(instance);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&path).map_err(|e| SyncError::Cache {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        match serde_json::from_str::<CacheFile>(&contents) {
            Ok(file) if file.version == CACHE_VERSION => Ok(file.custom_formats),
            Ok(file) => {
                log::warn!(
                    "Ignoring cache {} with unsupported version {}",
                    path.display(),
                    file.version
                );
                Ok(Vec::new())
            }
            Err(e) => {
                log::warn!("Ignoring unreadable cache {}: {}", path.display(), e);
                Ok(Vec::new())
            }
        }
    }

    fn write_atomic(&self, path: &Path, content: &str) -> SyncResult<()> {
        let cache_error = |reason: String| SyncError::Cache {
            path: path.to_path_buf(),
            reason,
        };

        fs::create_dir_all(&self.cache_dir).map_err(|e| cache_error(e.to_string()))?;

        let mut temp_file =
            NamedTempFile::new_in(&self.cache_dir).map_err(|e| cache_error(e.to_string()))?;
        temp_file
            .write_all(content.as_bytes())
            .map_err(|e| cache_error(e.to_string()))?;
        temp_file.flush().map_err(|e| cache_error(e.to_string()))?;
        temp_file
            .persist(path)
            .map_err(|e| cache_error(e.error.to_string()))?;

        Ok(())
    }
}

impl IdentityCacheStore for JsonFileCacheStore {
    fn lookup(&self, instance: &InstanceName, key: &ContentKey) -> SyncResult<Option<RemoteId>> {
        self.ensure_loaded(instance)?;
        self.memory.lookup(instance, key)
    }

    fn store(&self, instance: &InstanceName, entry: CacheEntry) -> SyncResult<()> {
        self.ensure_loaded(instance)?;
        self.memory.store(instance, entry)
    }

    fn remove(&self, instance: &InstanceName, key: &ContentKey) -> SyncResult<()> {
        self.ensure_loaded(instance)?;
        self.memory.remove(instance, key)
    }

    fn entries(&self, instance: &InstanceName) -> SyncResult<Vec<CacheEntry>> {
        self.ensure_loaded(instance)?;
        self.memory.entries(instance)
    }

    fn persist(&self, instance: &InstanceName) -> SyncResult<()> {
        let is_loaded = self
            .loaded
            .lock()
            .map_err(|_| SyncError::lock_poisoned())?
            .contains(instance);
        if !is_loaded {
            return Ok(());
        }

        let file = CacheFile {
            version: CACHE_VERSION,
            custom_formats: self.memory.entries(instance)?,
        };
        let path = self.cache_path(instance);
        let content = serde_json::to_string_pretty(&file).map_err(|e| SyncError::Cache {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        self.write_atomic(&path, &content)?;
        log::debug!("Saved cache for instance {} to {}", instance, path.display());
        Ok(())
    }
}
