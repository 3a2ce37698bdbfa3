use crate::error::{Result, StorageError};
use crate::store::KeyValueStore;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-process storage. Clones share the same map, so two handles behave like
/// two browsing contexts over one storage area.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
    /// Total bytes (keys plus values) the store accepts.
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: Arc::default(),
            quota: Some(quota_bytes),
        }
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, String>>> {
        self.entries
            .read()
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, String>>> {
        self.entries
            .write()
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned".to_string()))
    }

    fn check_quota(&self, entries: &HashMap<String, String>, batch: &[(&str, &str)]) -> Result<()> {
        let Some(limit) = self.quota else {
            return Ok(());
        };

        let mut used: usize = entries.iter().map(|(k, v)| k.len() + v.len()).sum();
        for (key, value) in batch {
            if let Some(old) = entries.get(*key) {
                used = used.saturating_sub(key.len() + old.len());
            }
            used += key.len() + value.len();
        }

        if used > limit {
            let key = batch.first().map(|(k, _)| k.to_string()).unwrap_or_default();
            return Err(StorageError::QuotaExceeded { key, limit });
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.set_many(&[(key, value)])
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.write()?.remove(key);
        Ok(())
    }

    fn replace(&self, key: &str, value: &str) -> Result<bool> {
        let mut entries = self.write()?;
        if !entries.contains_key(key) {
            return Ok(false);
        }
        self.check_quota(&entries, &[(key, value)])?;
        entries.insert(key.to_string(), value.to_string());
        Ok(true)
    }

    fn set_many(&self, batch: &[(&str, &str)]) -> Result<()> {
        let mut entries = self.write()?;
        self.check_quota(&entries, batch)?;
        for (key, value) in batch {
            entries.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        let mut entries = self.write()?;
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}

/// Storage that refuses every operation, the way browser storage behaves in
/// some private-browsing modes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledStore;

impl KeyValueStore for DisabledStore {
    fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(StorageError::Unavailable("storage is disabled".to_string()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Err(StorageError::Unavailable("storage is disabled".to_string()))
    }

    fn remove(&self, _key: &str) -> Result<()> {
        Err(StorageError::Unavailable("storage is disabled".to_string()))
    }
}
