//! Key/value store abstraction shared by both storage tiers

use std::sync::Arc;

use super::error::StorageResult;

/// String-keyed, string-valued store
///
/// Implementations use interior mutability so one instance can be shared
/// behind an `Arc` by every consumer. Keys are unscoped; callers pick names
/// that do not collide.
pub trait KeyValueStore: Send + Sync {
    /// Read a value
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Insert or replace a value
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Delete a value; deleting a missing key is not an error
    fn remove(&self, key: &str) -> StorageResult<()>;

    /// Every key currently stored
    fn keys(&self) -> StorageResult<Vec<String>>;

    /// Whether `key` holds a value
    fn contains(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Delete every value
    fn clear(&self) -> StorageResult<()> {
        for key in self.keys()? {
            self.remove(&key)?;
        }
        Ok(())
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        (**self).remove(key)
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        (**self).keys()
    }

    fn contains(&self, key: &str) -> StorageResult<bool> {
        (**self).contains(key)
    }

    fn clear(&self) -> StorageResult<()> {
        (**self).clear()
    }
}
