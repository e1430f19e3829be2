//! Fast-tier stores
//!
//! [`MemoryStore`] keeps everything in memory under a byte quota.
//! [`FileStore`] adds persistence by rewriting a JSON object file after
//! every mutation, so a new process picks up where the last one stopped.
//! A mutation whose write fails leaves the in-memory view untouched.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::error::{StorageError, StorageResult};
use crate::error::CommonError;
use super::traits::KeyValueStore;

/// Default fast-tier quota (5 MiB)
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Default, Clone)]
struct Entries {
    map: BTreeMap<String, String>,
    bytes: usize,
}

impl Entries {
    fn from_map(map: BTreeMap<String, String>) -> Self {
        let bytes = map.iter().map(|(k, v)| k.len() + v.len()).sum();
        Self { map, bytes }
    }

    /// Insert after checking the quota
    fn insert(&mut self, key: &str, value: &str, quota: usize) -> StorageResult<()> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        let previous = self.map.get(key).map_or(0, |old| key.len() + old.len());
        let attempted = self.bytes - previous + key.len() + value.len();
        if attempted > quota {
            return Err(StorageError::QuotaExceeded {
                key: key.to_string(),
                limit: quota,
                attempted,
            });
        }
        self.map.insert(key.to_string(), value.to_string());
        self.bytes = attempted;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> bool {
        match self.map.remove(key) {
            Some(old) => {
                self.bytes -= key.len() + old.len();
                true
            }
            None => false,
        }
    }
}

/// In-memory fast tier
#[derive(Debug)]
pub struct MemoryStore {
    entries: Mutex<Entries>,
    quota: usize,
}

impl MemoryStore {
    /// Empty store with the default quota
    pub fn new() -> Self {
        Self::with_quota(DEFAULT_QUOTA_BYTES)
    }

    /// Empty store holding at most `quota` bytes of keys and values
    pub fn with_quota(quota: usize) -> Self {
        Self { entries: Mutex::new(Entries::default()), quota }
    }

    /// Bytes currently used
    pub fn used_bytes(&self) -> usize {
        self.entries.lock().bytes
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.lock().map.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.entries.lock().map.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.lock().map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.entries.lock().insert(key, value, self.quota)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.entries.lock().remove(key);
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.entries.lock().map.keys().cloned().collect())
    }

    fn clear(&self) -> StorageResult<()> {
        *self.entries.lock() = Entries::default();
        Ok(())
    }
}

/// File-backed fast tier
///
/// The whole store is one JSON object. Writes go to a sibling temp file that
/// is then renamed over the original.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<Entries>,
    quota: usize,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`
    ///
    /// # Errors
    ///
    /// Fails when the file exists but cannot be read or is not a JSON object
    /// of strings.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        Self::open_with_quota(path, DEFAULT_QUOTA_BYTES)
    }

    /// Open with an explicit quota
    ///
    /// # Errors
    ///
    /// Same as [`FileStore::open`].
    pub fn open_with_quota(path: impl Into<PathBuf>, quota: usize) -> StorageResult<Self> {
        let path = path.into();
        let map = if path.exists() {
            let raw = fs::read_to_string(&path).map_err(io_failure("read"))?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw).map_err(|err| StorageError::Corrupt {
                    key: path.display().to_string(),
                    reason: err.to_string(),
                })?
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, entries: Mutex::new(Entries::from_map(map)), quota })
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &Entries) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_failure("create_dir"))?;
            }
        }
        let bytes = serde_json::to_vec_pretty(&entries.map)
            .map_err(|e| CommonError::serialization_format("JSON", e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, bytes).map_err(io_failure("write"))?;
        fs::rename(&tmp, &self.path).map_err(io_failure("rename"))?;
        Ok(())
    }

    /// Apply `change` to a copy and keep it only once it is on disk
    fn commit<F>(&self, change: F) -> StorageResult<()>
    where
        F: FnOnce(&mut Entries) -> StorageResult<bool>,
    {
        let mut entries = self.entries.lock();
        let mut next = entries.clone();
        if change(&mut next)? {
            self.flush(&next)?;
            *entries = next;
        }
        Ok(())
    }
}

fn io_failure(operation: &'static str) -> impl FnOnce(io::Error) -> StorageError {
    move |err: io::Error| CommonError::persistence_op(operation, err.to_string()).into()
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.lock().map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.commit(|entries| entries.insert(key, value, self.quota).map(|()| true))
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.commit(|entries| Ok(entries.remove(key)))
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.entries.lock().map.keys().cloned().collect())
    }

    fn clear(&self) -> StorageResult<()> {
        self.commit(|entries| {
            *entries = Entries::default();
            Ok(true)
        })
    }
}
