use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, RwLock},
};

use crate::errors::{AppError, AppResult};

/// Device-local string storage, the equivalent of browser `localStorage`.
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> AppResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> AppResult<()>;

    /// Writes several keys together. Backends that can should make this a
    /// single write.
    fn set_many(&self, entries: Vec<(String, String)>) -> AppResult<()> {
        for (key, value) in entries {
            self.set(&key, &value)?;
        }
        Ok(())
    }

    fn clear(&self) -> AppResult<()>;
}

fn lock_error(what: &str) -> AppError {
    AppError::StorageError(format!("{} lock poisoned", what))
}

#[derive(Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        let entries = self.entries.read().map_err(|_| lock_error("store"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut entries = self.entries.write().map_err(|_| lock_error("store"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn set_many(&self, new_entries: Vec<(String, String)>) -> AppResult<()> {
        let mut entries = self.entries.write().map_err(|_| lock_error("store"))?;
        entries.extend(new_entries);
        Ok(())
    }

    fn clear(&self) -> AppResult<()> {
        let mut entries = self.entries.write().map_err(|_| lock_error("store"))?;
        entries.clear();
        Ok(())
    }
}

/// Keeps every key in one JSON object on disk. Writes go to a sibling temp
/// file that is renamed over the original.
pub struct FileStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> AppResult<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_string_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        let _guard = self.guard.lock().map_err(|_| lock_error("file store"))?;
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.set_many(vec![(key.to_string(), value.to_string())])
    }

    fn set_many(&self, new_entries: Vec<(String, String)>) -> AppResult<()> {
        let _guard = self.guard.lock().map_err(|_| lock_error("file store"))?;
        let mut entries = self.read_all()?;
        entries.extend(new_entries);
        self.write_all(&entries)
    }

    fn clear(&self) -> AppResult<()> {
        let _guard = self.guard.lock().map_err(|_| lock_error("file store"))?;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
