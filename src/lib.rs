//! Astro Rogue - top-down arena shooter core with roguelite progression
//!
//! Core modules:
//! - `sim`: Real-time simulation (entities, collisions, AI, spawning)
//! - `progression`: XP, levels, upgrades, prestige
//! - `session`: Host-facing frame loop with autosave
//! - `snapshot`: Render and HUD snapshots for display sinks
//! - `persistence`: Save schema and storage backends
//! - `platform`: Logging setup and default storage per target
//! - `tuning`: Data-driven game balance

pub mod persistence;
pub mod platform;
pub mod progression;
pub mod session;
pub mod settings;
pub mod sim;
pub mod snapshot;
pub mod tuning;

pub use session::{Frame, FrameStatus, Session, SessionSummary};
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Host frame step used by the headless runner (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Largest dt a single step will integrate
    pub const DEFAULT_MAX_STEP: f32 = 1.0 / 30.0;

    /// Enemy and boss projectiles
    pub const HOSTILE_PROJECTILE_RADIUS: f32 = 6.0;
    pub const HOSTILE_PROJECTILE_LIFETIME: f32 = 6.0;
}
