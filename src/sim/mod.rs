//! Real-time simulation module
//!
//! All gameplay logic lives here. This module stays independent of any
//! display surface:
//! - Clamped variable timestep
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod ai;
pub mod collision;
pub mod entity;
pub mod geometry;
pub mod spawn;
pub mod state;
pub mod tick;

pub use ai::AiCommand;
pub use entity::{
    AdvanceContext, Boss, BossKind, DashState, Enemy, EnemyBehavior, EnemyKind, EntityId, Pickup, Player,
    Projectile, ProjectileOwner,
};
pub use geometry::{Arena, circles_overlap, direction_to};
pub use spawn::SpawnDirector;
pub use state::{GameEvent, GamePhase, GameState};
pub use tick::{MoveIntent, TickInput, autopilot, tick};
