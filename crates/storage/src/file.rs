use crate::error::{Result, StorageError};
use crate::store::KeyValueStore;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Durable storage kept as a single JSON object on disk.
///
/// Mutations re-read the file and rewrite it while holding an exclusive lock
/// on a sibling `.lock` file, so handles in other processes never write back
/// a stale snapshot. The new content goes to a uniquely named temp file that
/// is renamed over the old one; readers see either the old or the new file,
/// never a partial one. A missing file reads as empty.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut lock_path = path.clone().into_os_string();
        lock_path.push(".lock");

        Self {
            path,
            lock_path: PathBuf::from(lock_path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            StorageError::Corrupt(format!("{}: {}", self.path.display(), e))
        })
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let mut tmp = NamedTempFile::new_in(self.parent_dir())?;
        tmp.write_all(serde_json::to_string_pretty(entries)?.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        tracing::trace!("Persisted {} entries to {}", entries.len(), self.path.display());
        Ok(())
    }

    /// Exclusive lock shared by every handle on this path, in any process.
    /// Released when the returned file is dropped.
    fn acquire_lock(&self) -> Result<File> {
        fs::create_dir_all(self.parent_dir())?;

        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&self.lock_path)?;
        lock.lock()?;
        Ok(lock)
    }

    /// Load, apply and persist under the lock. `apply` returns whether the
    /// file needs rewriting along with the caller's result.
    fn mutate<T, F>(&self, apply: F) -> Result<T>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> (bool, T),
    {
        let _lock = self.acquire_lock()?;

        let mut entries = self.load()?;
        let (changed, result) = apply(&mut entries);
        if changed {
            self.persist(&entries)?;
        }
        Ok(result)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.set_many(&[(key, value)])
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.remove_many(&[key])
    }

    fn replace(&self, key: &str, value: &str) -> Result<bool> {
        self.mutate(|entries| match entries.get_mut(key) {
            Some(existing) => {
                *existing = value.to_string();
                (true, true)
            }
            None => (false, false),
        })
    }

    fn set_many(&self, batch: &[(&str, &str)]) -> Result<()> {
        self.mutate(|entries| {
            for (key, value) in batch {
                entries.insert(key.to_string(), value.to_string());
            }
            (true, ())
        })
    }

    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        self.mutate(|entries| {
            let mut changed = false;
            for key in keys {
                changed |= entries.remove(*key).is_some();
            }
            (changed, ())
        })
    }
}
