use crate::error::Result;
use std::sync::Arc;

/// Synchronous string key-value storage that outlives a single process run
/// (or a single page load, for the browser-backed equivalent).
///
/// Each key is an independently overwritable cell: a write touches only the
/// keys it names, applied against the backend's current state. Concurrent
/// writers to the same key get last-writer-wins; the batch methods are the
/// only way to change several keys as one unit.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Overwrite `key` only if it is currently present. Returns whether the
    /// write happened. Backends override this to make the check and the write
    /// a single step, so a concurrent removal is never undone.
    fn replace(&self, key: &str, value: &str) -> Result<bool> {
        if self.get(key)?.is_none() {
            return Ok(false);
        }
        self.set(key, value)?;
        Ok(true)
    }

    /// Write several entries together. Backends override this so a reader
    /// never observes half of the batch.
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Remove several keys together.
    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.remove(key)?;
        }
        Ok(())
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }

    fn replace(&self, key: &str, value: &str) -> Result<bool> {
        (**self).replace(key, value)
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        (**self).set_many(entries)
    }

    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        (**self).remove_many(keys)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }

    fn replace(&self, key: &str, value: &str) -> Result<bool> {
        (**self).replace(key, value)
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        (**self).set_many(entries)
    }

    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        (**self).remove_many(keys)
    }
}

// Helper for namespaced key layouts
pub fn storage_key(prefix: &str, name: &str) -> String {
    format!("{}{}", prefix, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    #[test]
    fn test_storage_key() {
        assert_eq!(storage_key("salon_", "access_token"), "salon_access_token");
        assert_eq!(storage_key("", "token_type"), "token_type");
    }

    #[test]
    fn test_shared_store_through_arc() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

        store.set_many(&[("a", "1"), ("b", "2")]).unwrap();
        assert_eq!(store.get("a").unwrap(), Some("1".to_string()));

        store.remove_many(&["a", "b"]).unwrap();
        assert_eq!(store.get("b").unwrap(), None);
        assert!(!store.replace("a", "3").unwrap());
    }
}
