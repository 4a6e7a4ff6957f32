// src/target/store.rs

//! Object store abstraction behind [`RemoteTarget`](super::RemoteTarget).
//!
//! Objects are written whole with a single `put`, which is what gives
//! remote targets their all-or-nothing visibility.

use std::collections::HashMap;
use std::fmt::Debug;
use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tempfile::NamedTempFile;

use crate::errors::{PipelineError, Result};

pub trait ObjectStore: Send + Sync + Debug {
    /// Whether an object is stored under `key`.
    fn head(&self, key: &str) -> Result<bool>;

    /// The object's bytes, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store the whole object in one call.
    fn put(&self, key: &str, bytes: Vec<u8>) -> Result<()>;
}

/// In-memory store, shared between clones.
///
/// `fail_puts` simulates a storage outage for every subsequent `put`.
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    fail_puts: Arc<AtomicBool>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self.lock()?.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>> {
        self.objects
            .lock()
            .map_err(|_| PipelineError::Storage("memory object store lock poisoned".to_string()))
    }
}

impl ObjectStore for MemoryObjectStore {
    fn head(&self, key: &str) -> Result<bool> {
        Ok(self.lock()?.contains_key(key))
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn put(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(PipelineError::Storage(format!(
                "put of '{key}' rejected: store unavailable"
            )));
        }
        self.lock()?.insert(key.to_string(), bytes);
        Ok(())
    }
}

/// Store whose objects live as files below a root directory
/// (a mounted bucket, or a local stand-in for one).
#[derive(Debug, Clone)]
pub struct DirectoryObjectStore {
    root: PathBuf,
}

impl DirectoryObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, key: &str) -> Result<PathBuf> {
        let rel = Path::new(key);
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if key.is_empty() || escapes {
            return Err(PipelineError::Storage(format!("invalid object key '{key}'")));
        }
        Ok(self.root.join(rel))
    }
}

impl ObjectStore for DirectoryObjectStore {
    fn head(&self, key: &str) -> Result<bool> {
        Ok(self.object_path(key)?.is_file())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.object_path(key)?) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PipelineError::Storage(format!("reading object '{key}': {e}"))),
        }
    }

    fn put(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        let path = self.object_path(key)?;
        let parent = path.parent().unwrap_or(&self.root).to_path_buf();
        let storage_err =
            |e: io::Error| PipelineError::Storage(format!("writing object '{key}': {e}"));

        fs::create_dir_all(&parent).map_err(storage_err)?;
        let mut tmp = NamedTempFile::new_in(&parent).map_err(storage_err)?;
        tmp.write_all(&bytes).map_err(storage_err)?;
        tmp.persist(&path).map_err(|e| storage_err(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips_and_fails_on_demand() {
        let store = MemoryObjectStore::new();
        store.put("data/a.csv", b"x".to_vec()).unwrap();
        assert!(store.head("data/a.csv").unwrap());
        assert_eq!(store.get("data/a.csv").unwrap(), Some(b"x".to_vec()));

        store.set_fail_puts(true);
        assert!(store.put("data/b.csv", b"y".to_vec()).is_err());
        assert!(!store.head("data/b.csv").unwrap());
    }

    #[test]
    fn directory_store_rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryObjectStore::new(dir.path());
        assert!(store.put("../outside.csv", vec![1]).is_err());
        assert!(store.put("/abs.csv", vec![1]).is_err());
        assert!(store.put("", vec![1]).is_err());
    }

    #[test]
    fn directory_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryObjectStore::new(dir.path());
        assert_eq!(store.get("data/train.csv").unwrap(), None);
        store.put("data/train.csv", b"a\n1\n".to_vec()).unwrap();
        assert!(store.head("data/train.csv").unwrap());
        assert!(dir.path().join("data/train.csv").is_file());
    }
}
