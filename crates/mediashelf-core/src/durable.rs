use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::error::StoreError;

/// A small, capacity-limited string key-value store that outlives the process.
///
/// Writes that would push the total size of all values past the capacity are
/// rejected with [`StoreError::QuotaExceeded`] and leave the old value intact.
pub trait DurableStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
    /// Bytes currently used across all keys.
    fn usage(&self) -> Result<u64, StoreError>;
    fn capacity(&self) -> u64;
}

fn check_quota(
    key: &str,
    usage: u64,
    previous: u64,
    incoming: u64,
    capacity: u64,
) -> Result<(), StoreError> {
    let needed = usage.saturating_sub(previous) + incoming;
    if needed > capacity {
        return Err(StoreError::QuotaExceeded {
            key: key.to_string(),
            needed,
            capacity,
        });
    }
    Ok(())
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    capacity: u64,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>, capacity: u64) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, capacity })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn size_of(&self, key: &str) -> Result<u64, StoreError> {
        match fs::metadata(self.path_for(key)) {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}

impl DurableStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let mut contents = String::new();
        File::open(&path)?.read_to_string(&mut contents)?;
        Ok(Some(contents))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        check_quota(
            key,
            self.usage()?,
            self.size_of(key)?,
            value.len() as u64,
            self.capacity,
        )?;

        let path = self.path_for(key);
        let temp_path = self.dir.join(format!(".{}.tmp", key));

        // Write to temp file first, then rename for atomicity
        let mut file = File::create(&temp_path)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    fn usage(&self) -> Result<u64, StoreError> {
        let mut total = 0;
        for entry in fs::read_dir(&self.dir)?.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                total += entry.metadata()?.len();
            }
        }
        Ok(total)
    }

    fn capacity(&self) -> u64 {
        self.capacity
    }
}

/// In-process store with the same capacity rule as [`FileStore`].
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    capacity: u64,
}

impl MemoryStore {
    pub fn new(capacity: u64) -> Self {
        Self {
            entries: HashMap::new(),
            capacity,
        }
    }
}

impl DurableStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let previous = self.entries.get(key).map_or(0, |v| v.len() as u64);
        check_quota(key, self.usage()?, previous, value.len() as u64, self.capacity)?;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    fn usage(&self) -> Result<u64, StoreError> {
        Ok(self.entries.values().map(|v| v.len() as u64).sum())
    }

    fn capacity(&self) -> u64 {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::open(dir.path().join("data"), 1024).unwrap();

        assert_eq!(store.get("media_collection").unwrap(), None);
        store.set("media_collection", "[1,2,3]").unwrap();
        assert_eq!(store.get("media_collection").unwrap().as_deref(), Some("[1,2,3]"));
        assert_eq!(store.usage().unwrap(), 7);
        assert!(!dir.path().join("data/.media_collection.tmp").exists());

        store.remove("media_collection").unwrap();
        assert_eq!(store.get("media_collection").unwrap(), None);
        store.remove("media_collection").unwrap();
    }

    #[test]
    fn test_file_store_quota_keeps_previous_value() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::open(dir.path(), 16).unwrap();
        store.set("a", "0123456789").unwrap();

        let err = store.set("b", "0123456789").unwrap_err();
        assert!(err.is_quota());
        assert_eq!(store.get("b").unwrap(), None);

        // Overwriting a key only counts the difference
        store.set("a", "0123456789abcdef").unwrap();
        let err = store.set("a", "0123456789abcdefg").unwrap_err();
        assert!(err.is_quota());
        assert_eq!(store.get("a").unwrap().as_deref(), Some("0123456789abcdef"));
    }

    #[test]
    fn test_memory_store_quota() {
        let mut store = MemoryStore::new(8);
        store.set("k", "12345678").unwrap();
        assert!(store.set("j", "9").unwrap_err().is_quota());
        store.remove("k").unwrap();
        store.set("j", "9").unwrap();
        assert_eq!(store.usage().unwrap(), 1);
        assert_eq!(store.capacity(), 8);
    }
}
