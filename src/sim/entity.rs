//! Entity definitions: player, projectiles, enemies, bosses, pickups
//!
//! `advance` only ever mutates the entity it is called on. Anything that
//! touches another entity (damage, spawning, pickups) is returned as a
//! command or handled by collision resolution.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::ai::{self, AiCommand};
use super::geometry::{Arena, direction_to};
use super::tick::MoveIntent;
use crate::progression::{self, Abilities, CoreUpgradeId, PerkId, SkillId, Stats, UpgradeId};
use crate::tuning::{BossStats, EnemyStats, EnemyTuning, PlayerTuning, Tuning};

/// Stable handle for entities in the per-category arenas
pub type EntityId = u32;

/// Read-only view of the world handed to `advance`
#[derive(Debug, Clone, Copy)]
pub struct AdvanceContext<'a> {
    pub player_pos: Vec2,
    pub player_radius: f32,
    /// Seconds since the run started
    pub elapsed: f32,
    pub arena: Arena,
    /// Positions of live enemies and bosses (homing targets)
    pub hostiles: &'a [Vec2],
    pub tuning: &'a Tuning,
}

/// The player-controlled ship
#[derive(Debug, Clone)]
pub struct Player {
    pub pos: Vec2,
    pub radius: f32,
    pub health: f32,
    /// Absorbs damage before health
    pub shield: f32,
    /// Derived from base tuning + everything owned + prestige
    pub stats: Stats,
    pub abilities: Abilities,
    /// Seconds until the next shot is allowed
    pub fire_cooldown: f32,
    pub currency: u64,
    pub xp: u32,
    pub level: u32,
    pub score: u64,
    /// Unspent points earned by leveling this run
    pub skill_points: u32,
    /// Boss currency for the core tree
    pub core_shards: u64,
    /// Session upgrade levels (permanent purchases plus pickups)
    pub upgrades: BTreeMap<UpgradeId, u32>,
    pub core: BTreeSet<CoreUpgradeId>,
    pub skills: BTreeMap<SkillId, u32>,
    pub perks: BTreeSet<PerkId>,
}

impl Player {
    pub fn new(pos: Vec2, base: &PlayerTuning, prestige_multiplier: f32) -> Self {
        let (stats, abilities) = progression::derive_stats(&[], base, prestige_multiplier);
        Self {
            pos,
            radius: base.radius,
            health: stats.max_health,
            shield: 0.0,
            stats,
            abilities,
            fire_cooldown: 0.0,
            currency: 0,
            xp: 0,
            level: 1,
            score: 0,
            skill_points: 0,
            core_shards: 0,
            upgrades: BTreeMap::new(),
            core: BTreeSet::new(),
            skills: BTreeMap::new(),
            perks: BTreeSet::new(),
        }
    }

    pub fn max_health(&self) -> f32 {
        self.stats.max_health
    }

    pub fn is_defeated(&self) -> bool {
        self.health <= 0.0
    }

    /// Move by the intent direction and clamp inside the arena
    pub fn advance(&mut self, dt: f32, intent: &MoveIntent, arena: &Arena) {
        let dir = intent.direction();
        self.pos += dir * self.stats.move_speed * dt;
        self.pos = arena.clamp_circle(self.pos, self.radius);
        self.fire_cooldown = (self.fire_cooldown - dt).max(0.0);
    }

    /// Consume the fire cooldown if ready. Returns the shot direction.
    ///
    /// Aiming at the player's own position yields no shot.
    pub fn try_fire(&mut self, aim: Vec2) -> Option<Vec2> {
        if self.fire_cooldown > 0.0 {
            return None;
        }
        let dir = direction_to(self.pos, aim);
        if dir == Vec2::ZERO {
            return None;
        }
        self.fire_cooldown = 1.0 / self.stats.fire_rate.max(f32::EPSILON);
        Some(dir)
    }

    /// Apply damage to the shield first, then health, flooring at zero
    pub fn take_damage(&mut self, amount: f32) {
        let absorbed = amount.min(self.shield).max(0.0);
        self.shield -= absorbed;
        self.health = (self.health - (amount - absorbed)).max(0.0);
    }

    /// Recharge the shield up to `capacity`
    pub fn recharge_shield(&mut self, dt: f32, capacity: f32) {
        if self.stats.shield_regen > 0.0 && self.shield < capacity {
            self.shield = (self.shield + self.stats.shield_regen * dt).min(capacity);
        }
    }

    pub fn heal(&mut self, amount: f32) {
        self.health = (self.health + amount).min(self.stats.max_health);
    }
}

/// Who fired a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectileOwner {
    Player,
    Enemy,
    Boss,
}

/// A projectile entity
#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Lump damage per hit for player shots, damage per second for hostile shots
    pub damage: f32,
    /// Seconds left before despawn
    pub ttl: f32,
    pub owner: ProjectileOwner,
    /// Pass through targets (each struck once)
    pub piercing: bool,
    /// Extra targets left to pass through before the shot is spent
    pub pierce: u32,
    /// Hits splash nearby enemies
    pub explosive: bool,
    /// Steer toward the nearest hostile
    pub homing: bool,
    /// Targets already struck by this projectile
    pub hits: Vec<EntityId>,
    /// Consumed by a hit
    pub spent: bool,
}

impl Projectile {
    pub fn new(id: EntityId, pos: Vec2, vel: Vec2, radius: f32, damage: f32, ttl: f32, owner: ProjectileOwner) -> Self {
        Self {
            id,
            pos,
            vel,
            radius,
            damage,
            ttl,
            owner,
            piercing: false,
            pierce: 0,
            explosive: false,
            homing: false,
            hits: Vec::new(),
            spent: false,
        }
    }

    pub fn is_hostile(&self) -> bool {
        self.owner != ProjectileOwner::Player
    }

    pub fn has_hit(&self, target: EntityId) -> bool {
        self.hits.contains(&target)
    }

    pub fn advance(&mut self, dt: f32, ctx: &AdvanceContext) {
        if self.homing
            && let Some(target) = nearest(self.pos, ctx.hostiles)
        {
            let speed = self.vel.length();
            let desired = direction_to(self.pos, target) * speed;
            let blend = (ctx.tuning.player.homing_turn_rate * dt).min(1.0);
            self.vel = (self.vel + (desired - self.vel) * blend).normalize_or_zero() * speed;
        }

        self.pos += self.vel * dt;
        self.ttl -= dt;

        // Leaving the arena ends the projectile's life
        if !ctx.arena.contains(self.pos, self.radius) {
            self.ttl = self.ttl.min(0.0);
        }
    }

    pub fn is_expired(&self) -> bool {
        self.spent || self.ttl <= 0.0
    }
}

fn nearest(from: Vec2, points: &[Vec2]) -> Option<Vec2> {
    points
        .iter()
        .copied()
        .min_by(|a, b| a.distance_squared(from).total_cmp(&b.distance_squared(from)))
}

/// Enemy type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnemyKind {
    Chaser,
    Shooter,
    Dasher,
    Tank,
    Orbiter,
    Splitter,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 6] = [
        EnemyKind::Chaser,
        EnemyKind::Shooter,
        EnemyKind::Dasher,
        EnemyKind::Tank,
        EnemyKind::Orbiter,
        EnemyKind::Splitter,
    ];
}

/// Dasher state machine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DashState {
    Idle,
    Dashing { remaining: f32, dir: Vec2 },
}

/// Per-type behaviour state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnemyBehavior {
    Chaser,
    Shooter { cooldown: f32 },
    Dasher(DashState),
    Tank,
    /// Circles `anchor`; the anchor is fixed at spawn
    Orbiter { anchor: Vec2, angle: f32, radius: f32 },
    /// Heading in radians, jittered every tick
    Splitter { heading: f32 },
}

impl EnemyBehavior {
    pub fn kind(&self) -> EnemyKind {
        match self {
            EnemyBehavior::Chaser => EnemyKind::Chaser,
            EnemyBehavior::Shooter { .. } => EnemyKind::Shooter,
            EnemyBehavior::Dasher(_) => EnemyKind::Dasher,
            EnemyBehavior::Tank => EnemyKind::Tank,
            EnemyBehavior::Orbiter { .. } => EnemyKind::Orbiter,
            EnemyBehavior::Splitter { .. } => EnemyKind::Splitter,
        }
    }

    /// Fresh behaviour state for a newly spawned enemy at `pos`
    pub fn initial(kind: EnemyKind, pos: Vec2, tuning: &EnemyTuning, rng: &mut Pcg32) -> Self {
        match kind {
            EnemyKind::Chaser => EnemyBehavior::Chaser,
            EnemyKind::Shooter => EnemyBehavior::Shooter {
                cooldown: tuning.shooter_fire_interval,
            },
            EnemyKind::Dasher => EnemyBehavior::Dasher(DashState::Idle),
            EnemyKind::Tank => EnemyBehavior::Tank,
            EnemyKind::Orbiter => {
                let lo = tuning.orbiter_min_radius;
                let radius = lo + rng.random::<f32>() * (tuning.orbiter_max_radius - lo).max(0.0);
                let angle = rng.random_range(0.0..std::f32::consts::TAU);
                // Place the anchor so the orbit passes through the spawn point
                let anchor = pos - super::geometry::from_angle(angle) * radius;
                EnemyBehavior::Orbiter { anchor, angle, radius }
            }
            EnemyKind::Splitter => EnemyBehavior::Splitter {
                heading: rng.random_range(0.0..std::f32::consts::TAU),
            },
        }
    }
}

/// An enemy entity
#[derive(Debug, Clone)]
pub struct Enemy {
    pub id: EntityId,
    pub behavior: EnemyBehavior,
    pub pos: Vec2,
    pub vel: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub radius: f32,
    pub speed: f32,
    pub contact_dps: f32,
    pub xp: u32,
    pub currency: u32,
}

impl Enemy {
    /// Build an enemy from its base stats, scaling health by `health_scale`
    pub fn new(id: EntityId, behavior: EnemyBehavior, pos: Vec2, stats: &EnemyStats, health_scale: f32) -> Self {
        let health = (stats.health * health_scale).max(1.0);
        Self {
            id,
            behavior,
            pos,
            vel: Vec2::ZERO,
            health,
            max_health: health,
            radius: stats.radius,
            speed: stats.speed,
            contact_dps: stats.contact_dps,
            xp: stats.xp,
            currency: stats.currency,
        }
    }

    pub fn kind(&self) -> EnemyKind {
        self.behavior.kind()
    }

    /// Run this enemy's AI for one step
    pub fn advance(&mut self, dt: f32, ctx: &AdvanceContext, rng: &mut Pcg32) -> AiCommand {
        ai::drive_enemy(self, dt, ctx, rng)
    }

    pub fn take_damage(&mut self, amount: f32) {
        self.health = (self.health - amount).max(0.0);
    }

    pub fn is_expired(&self) -> bool {
        self.health <= 0.0
    }

    pub fn health_ratio(&self) -> f32 {
        (self.health / self.max_health).clamp(0.0, 1.0)
    }
}

/// Boss identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BossKind {
    Juggernaut,
    Sentinel,
    HiveQueen,
}

impl BossKind {
    pub const ALL: [BossKind; 3] = [BossKind::Juggernaut, BossKind::Sentinel, BossKind::HiveQueen];

    pub fn name(self) -> &'static str {
        match self {
            BossKind::Juggernaut => "Juggernaut",
            BossKind::Sentinel => "Sentinel",
            BossKind::HiveQueen => "Hive Queen",
        }
    }
}

/// A boss entity
#[derive(Debug, Clone)]
pub struct Boss {
    pub id: EntityId,
    pub kind: BossKind,
    pub pos: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub radius: f32,
    pub speed: f32,
    pub contact_dps: f32,
    /// Seconds until the next attack
    pub attack_cooldown: f32,
    pub xp: u32,
    pub currency: u32,
    /// Core shards paid on defeat, before the survival bonus
    pub shards: u32,
}

impl Boss {
    pub fn new(id: EntityId, kind: BossKind, pos: Vec2, stats: &BossStats, health: f32) -> Self {
        Self {
            id,
            kind,
            pos,
            health,
            max_health: health,
            radius: stats.radius,
            speed: stats.speed,
            contact_dps: stats.contact_dps,
            attack_cooldown: stats.attack_interval,
            xp: stats.xp,
            currency: stats.currency,
            shards: stats.shards,
        }
    }

    pub fn advance(&mut self, dt: f32, ctx: &AdvanceContext) -> AiCommand {
        ai::drive_boss(self, dt, ctx)
    }

    pub fn take_damage(&mut self, amount: f32) {
        self.health = (self.health - amount).max(0.0);
    }

    pub fn is_expired(&self) -> bool {
        self.health <= 0.0
    }

    pub fn health_ratio(&self) -> f32 {
        (self.health / self.max_health).clamp(0.0, 1.0)
    }
}

/// An upgrade drop
#[derive(Debug, Clone)]
pub struct Pickup {
    pub id: EntityId,
    pub pos: Vec2,
    pub radius: f32,
    pub upgrade: UpgradeId,
    /// Seconds left before it fades
    pub ttl: f32,
    pub collected: bool,
}

impl Pickup {
    pub fn new(id: EntityId, pos: Vec2, upgrade: UpgradeId, radius: f32, ttl: f32) -> Self {
        Self {
            id,
            pos,
            radius,
            upgrade,
            ttl,
            collected: false,
        }
    }

    /// Drift toward a nearby player and age
    pub fn advance(&mut self, dt: f32, ctx: &AdvanceContext) {
        let spawn = &ctx.tuning.spawn;
        if self.pos.distance(ctx.player_pos) < spawn.pickup_magnet_radius {
            self.pos += direction_to(self.pos, ctx.player_pos) * spawn.pickup_magnet_speed * dt;
        }
        self.ttl -= dt;
    }

    pub fn is_expired(&self) -> bool {
        self.collected || self.ttl <= 0.0
    }
}
