//! Durable progress: save schema, storage backends, background autosave
//!
//! Features:
//! - Flat JSON save with per-field defaults
//! - Atomic file writes (tmp → rename) on native, LocalStorage on web
//! - Non-blocking autosave thread

pub mod autosave;
pub mod save;
pub mod store;

pub use autosave::AutoSaver;
pub use save::SaveState;
#[cfg(target_arch = "wasm32")]
pub use store::LocalStorageStore;
pub use store::{FileStore, MemoryStore};

use thiserror::Error;

/// Failure to read or write a save
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("save file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("save serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Storage(String),
}

/// Load/save port for durable progress
pub trait SaveStore {
    /// `Ok(None)` when nothing has been saved yet
    fn load(&self) -> Result<Option<SaveState>, PersistenceError>;
    fn save(&mut self, state: &SaveState) -> Result<(), PersistenceError>;
}

/// Store handed to the autosaver (must cross to the writer thread on native)
#[cfg(not(target_arch = "wasm32"))]
pub type BoxedStore = Box<dyn SaveStore + Send>;
#[cfg(target_arch = "wasm32")]
pub type BoxedStore = Box<dyn SaveStore>;
