use crate::{domain::LocalStorage, errors::StorageError};
use std::{
    collections::HashMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::RwLock,
};

/// Local storage backed by a directory: one `<key>.json` file per key.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Creates the directory if it doesn't exist yet.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        tracing::info!(dir = %dir.display(), "Local storage directory ready");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys are fixed identifiers; strip anything that could escape the directory.
        let safe: String = key
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
            .collect();
        self.dir.join(format!("{}.json", safe))
    }
}

impl LocalStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { key: key.to_string(), source }),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        tracing::debug!(
            key,
            path = %path.display(),
            bytes = value.len(),
            "Local storage: writing value"
        );
        fs::write(&path, value).map_err(|source| StorageError::Io { key: key.to_string(), source })
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { key: key.to_string(), source }),
        }
    }
}

/// In-process local storage; contents vanish with the value.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(key: &str) -> StorageError {
    StorageError::Io {
        key: key.to_string(),
        source: std::io::Error::new(ErrorKind::Other, "memory storage lock poisoned"),
    }
}

impl LocalStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let items = self.items.read().map_err(|_| poisoned(key))?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.write().map_err(|_| poisoned(key))?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.items.write().map_err(|_| poisoned(key))?;
        items.remove(key);
        Ok(())
    }
}
