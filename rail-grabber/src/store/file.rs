//! Disk-backed store.
//!
//! All entries are kept in memory and the whole document is rewritten on
//! every change, which suits the handful of keys the application keeps.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use super::{KeyValueStore, StoreError, StoredValue};

#[derive(Debug)]
struct FileInner {
    path: PathBuf,
    entries: BTreeMap<String, StoredValue>,
}

/// Store persisted as a JSON object on disk. Clones share the same file.
#[derive(Debug, Clone)]
pub struct FileStore {
    inner: Arc<Mutex<FileInner>>,
}

impl FileStore {
    /// Open the store at `path`.
    ///
    /// A missing file is an empty store; it is created on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        let entries = match std::fs::read_to_string(&path) {
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|source| StoreError::Corrupt {
                    path: path.clone(),
                    source,
                })?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StoreError::Read { path, source }),
        };

        Ok(Self {
            inner: Arc::new(Mutex::new(FileInner { path, entries })),
        })
    }

    /// Get the store file path.
    pub fn path(&self) -> PathBuf {
        self.lock().path.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FileInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl FileInner {
    fn save(&self) -> Result<(), StoreError> {
        let write_error = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }

        let json = serde_json::to_string_pretty(&self.entries).map_err(|e| StoreError::Write {
            path: self.path.clone(),
            source: std::io::Error::other(e),
        })?;

        std::fs::write(&self.path, json).map_err(write_error)
    }
}

impl KeyValueStore for FileStore {
    fn load(&self, key: &str) -> Option<StoredValue> {
        self.lock().entries.get(key).cloned()
    }

    fn store(&self, key: &str, value: StoredValue) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.entries.insert(key.to_string(), value);
        inner.save()
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.entries.remove(key).is_some() {
            inner.save()?;
        }
        Ok(())
    }
}
