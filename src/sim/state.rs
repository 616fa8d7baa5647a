//! Game state and run-level types
//!
//! `GameState` is the explicit context every simulation pass receives.
//! Nothing in the simulation reaches for globals.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::{Boss, BossKind, Enemy, EnemyKind, EntityId, Pickup, Player, Projectile};
use super::geometry::Arena;
use super::spawn::SpawnDirector;
use crate::consts::DEFAULT_MAX_STEP;
use crate::persistence::SaveState;
use crate::progression::{self, PrestigeProgress, UpgradeId};
use crate::tuning::Tuning;

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
    /// Player health reached zero (terminal)
    Defeated,
}

/// Notable things that happened during a step
///
/// Drained by the host after every frame.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    EnemyKilled { id: EntityId, kind: EnemyKind, currency: u64 },
    BossSpawned { id: EntityId, kind: BossKind },
    BossDefeated { id: EntityId, kind: BossKind, currency: u64, shards: u64 },
    PickupCollected { upgrade: UpgradeId },
    LevelUp { level: u32 },
    PlayerDefeated,
}

/// Complete simulation state for one run
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub arena: Arena,
    pub tuning: Tuning,
    /// Upper bound on a single step's dt
    pub max_step: f32,
    /// Steps taken
    pub time_ticks: u64,
    /// Simulated seconds survived
    pub elapsed: f32,
    pub phase: GamePhase,
    pub player: Player,
    /// Live entities (sorted by id)
    pub projectiles: Vec<Projectile>,
    pub enemies: Vec<Enemy>,
    pub bosses: Vec<Boss>,
    pub pickups: Vec<Pickup>,
    pub director: SpawnDirector,
    pub kills: u32,
    pub prestige: PrestigeProgress,
    /// Events since the host last drained them
    pub events: Vec<GameEvent>,
    /// Next entity ID
    next_id: EntityId,
}

impl GameState {
    /// Create a new run with the player at the arena center
    pub fn new(seed: u64, arena: Arena, tuning: Tuning) -> Self {
        let player = Player::new(arena.center(), &tuning.player, 1.0);
        let director = SpawnDirector::new(&tuning.spawn);
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            arena,
            tuning,
            max_step: DEFAULT_MAX_STEP,
            time_ticks: 0,
            elapsed: 0.0,
            phase: GamePhase::Playing,
            player,
            projectiles: Vec::new(),
            enemies: Vec::new(),
            bosses: Vec::new(),
            pickups: Vec::new(),
            director,
            kills: 0,
            prestige: PrestigeProgress::default(),
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn prestige_multiplier(&self) -> f32 {
        progression::prestige_multiplier(self.prestige.count, &self.tuning.progression)
    }

    /// Seed the player and prestige from durable progress, then start at
    /// full health (and a full shield when owned)
    pub fn apply_progress(&mut self, save: &SaveState) {
        self.prestige = PrestigeProgress {
            count: save.prestige_count,
            points: save.prestige_points,
        };
        let player = &mut self.player;
        for (&id, &level) in &save.upgrades {
            player.upgrades.insert(id, id.cap(level));
        }
        player.core.clone_from(&save.core_upgrades);
        player.perks.clone_from(&save.prestige_shop);
        player.currency = save.total_currency;
        player.core_shards = save.core_shards;
        self.refresh_player();
        self.player.health = self.player.max_health();
        if self.player.abilities.spawn_shield {
            self.player.shield = self.tuning.player.shield_capacity;
        }
    }

    /// Recompute derived player stats after upgrades changed
    pub fn refresh_player(&mut self) {
        let mult = self.prestige_multiplier();
        progression::refresh_stats(&mut self.player, &self.tuning.player, mult);
    }

    pub fn live_enemies(&self) -> usize {
        self.enemies.iter().filter(|e| !e.is_expired()).count()
    }

    pub fn live_bosses(&self) -> usize {
        self.bosses.iter().filter(|b| !b.is_expired()).count()
    }

    /// The first live boss, if any
    pub fn active_boss(&self) -> Option<&Boss> {
        self.bosses.iter().find(|b| !b.is_expired())
    }

    /// Positions of every live enemy and boss
    pub fn hostile_positions(&self) -> Vec<Vec2> {
        self.enemies
            .iter()
            .filter(|e| !e.is_expired())
            .map(|e| e.pos)
            .chain(self.bosses.iter().filter(|b| !b.is_expired()).map(|b| b.pos))
            .collect()
    }

    /// Drop every expired entity. Runs once at the end of a step.
    pub fn compact(&mut self) {
        self.projectiles.retain(|p| !p.is_expired());
        self.enemies.retain(|e| !e.is_expired());
        self.bosses.retain(|b| !b.is_expired());
        self.pickups.retain(|p| !p.is_expired());
    }

    /// Ensure entities are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.projectiles.sort_by_key(|p| p.id);
        self.enemies.sort_by_key(|e| e.id);
        self.bosses.sort_by_key(|b| b.id);
        self.pickups.sort_by_key(|p| p.id);
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
