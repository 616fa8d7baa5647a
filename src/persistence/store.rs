//! Storage backends for `SaveStore`

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::{PersistenceError, SaveState, SaveStore};

/// JSON file on disk, replaced atomically on every save
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SaveStore for FileStore {
    fn load(&self) -> Result<Option<SaveState>, PersistenceError> {
        match fs::read_to_string(&self.path) {
            Ok(json) => Ok(Some(SaveState::from_json(&json))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, state: &SaveState) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let json = state.to_json()?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-memory store; clones share the same slot
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing save blob
    pub fn with_json(json: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(json.into()))),
        }
    }

    /// Raw JSON last written
    pub fn contents(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl SaveStore for MemoryStore {
    fn load(&self) -> Result<Option<SaveState>, PersistenceError> {
        let slot = self
            .slot
            .lock()
            .map_err(|e| PersistenceError::Storage(e.to_string()))?;
        Ok(slot.as_deref().map(SaveState::from_json))
    }

    fn save(&mut self, state: &SaveState) -> Result<(), PersistenceError> {
        let json = state.to_json()?;
        let mut slot = self
            .slot
            .lock()
            .map_err(|e| PersistenceError::Storage(e.to_string()))?;
        *slot = Some(json);
        Ok(())
    }
}

/// Browser LocalStorage under a fixed key
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone)]
pub struct LocalStorageStore {
    key: String,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    fn storage() -> Result<web_sys::Storage, PersistenceError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| PersistenceError::Storage("LocalStorage unavailable".into()))
    }
}

#[cfg(target_arch = "wasm32")]
impl SaveStore for LocalStorageStore {
    fn load(&self) -> Result<Option<SaveState>, PersistenceError> {
        let json = Self::storage()?
            .get_item(&self.key)
            .map_err(|e| PersistenceError::Storage(format!("{:?}", e)))?;
        Ok(json.as_deref().map(SaveState::from_json))
    }

    fn save(&mut self, state: &SaveState) -> Result<(), PersistenceError> {
        let json = state.to_json()?;
        Self::storage()?
            .set_item(&self.key, &json)
            .map_err(|e| PersistenceError::Storage(format!("{:?}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::UpgradeId;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("astro-rogue-test-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_file_store_missing_is_none() {
        let store = FileStore::new(temp_path("missing.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_file_store_round_trip() {
        let path = temp_path("round_trip.json");
        let mut store = FileStore::new(&path);
        let mut save = SaveState {
            best_score: 77,
            ..SaveState::default()
        };
        save.upgrades.insert(UpgradeId::Scavenger, 2);

        store.save(&save).unwrap();
        assert_eq!(store.load().unwrap(), Some(save));
        assert!(!path.with_extension("json.tmp").exists());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_file_store_corrupt_is_default() {
        let path = temp_path("corrupt.json");
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, "{ broken").unwrap();
        let store = FileStore::new(&path);
        assert_eq!(store.load().unwrap(), Some(SaveState::default()));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_memory_store_shares_slot() {
        let store = MemoryStore::new();
        let mut writer = store.clone();
        assert!(store.load().unwrap().is_none());
        writer
            .save(&SaveState {
                total_currency: 5,
                ..SaveState::default()
            })
            .unwrap();
        assert_eq!(store.load().unwrap().map(|s| s.total_currency), Some(5));
    }
}
