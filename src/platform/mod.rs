//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Logger backend
//! - Default save storage (file on native, LocalStorage on web)
//! - Entropy for unseeded runs

use crate::persistence::BoxedStore;
use crate::settings::Settings;

/// Install the log backend for this target. Safe to call more than once.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    let _ = env_logger::Builder::from_env(env).try_init();
}

#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

/// The save store a host should use by default
#[cfg(not(target_arch = "wasm32"))]
pub fn default_store(settings: &Settings) -> BoxedStore {
    Box::new(crate::persistence::FileStore::new(&settings.save_path))
}

#[cfg(target_arch = "wasm32")]
pub fn default_store(settings: &Settings) -> BoxedStore {
    Box::new(crate::persistence::LocalStorageStore::new(settings.storage_key.clone()))
}

/// Run seed: the configured one, or fresh entropy
pub fn run_seed(settings: &Settings) -> u64 {
    settings.seed.unwrap_or_else(rand::random::<u64>)
}
