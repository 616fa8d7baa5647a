//! Host configuration
//!
//! A JSON file on native, LocalStorage on web. Every field has a default,
//! so a partial file only overrides what it names.

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_MAX_STEP;
use crate::sim::Arena;
use crate::tuning::Tuning;

/// Session settings and balance table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub arena_width: f32,
    pub arena_height: f32,
    /// Largest dt integrated in one step (seconds)
    pub max_step: f32,
    /// Simulated seconds between autosaves
    pub autosave_interval: f32,
    /// Save file path (native)
    pub save_path: String,
    /// LocalStorage key for the save (web)
    pub storage_key: String,
    /// Fixed run seed; random when absent
    pub seed: Option<u64>,
    pub tuning: Tuning,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            arena_width: 1200.0,
            arena_height: 760.0,
            max_step: DEFAULT_MAX_STEP,
            autosave_interval: 5.0,
            save_path: "astro_rogue_save.json".into(),
            storage_key: "astro_rogue_save".into(),
            seed: None,
            tuning: Tuning::default(),
        }
    }
}

impl Settings {
    /// LocalStorage key for the settings themselves
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "astro_rogue_settings";

    pub fn arena(&self) -> Arena {
        Arena::new(self.arena_width, self.arena_height)
    }

    /// Parse settings JSON and repair out-of-range values
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(json).map(Self::sanitized)
    }

    /// Replace values that would break the simulation with defaults
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.arena_width > 0.0 && self.arena_height > 0.0) {
            log::warn!(
                "Invalid arena size {}x{}, using default",
                self.arena_width,
                self.arena_height
            );
            self.arena_width = defaults.arena_width;
            self.arena_height = defaults.arena_height;
        }
        if !(self.max_step > 0.0 && self.max_step.is_finite()) {
            log::warn!("Invalid max_step {}, using default", self.max_step);
            self.max_step = defaults.max_step;
        }
        if !(self.autosave_interval > 0.0) {
            self.autosave_interval = defaults.autosave_interval;
        }
        self.tuning = self.tuning.sanitized();
        self
    }

    /// Load settings from a JSON file, falling back to defaults
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: impl AsRef<std::path::Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Invalid settings in {}: {}; using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage
            && let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY)
            && let Ok(settings) = Self::from_json(&json)
        {
            log::info!("Loaded settings from LocalStorage");
            return settings;
        }

        log::info!("Using default settings");
        Self::default()
    }
}
