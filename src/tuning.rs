//! Data-driven game balance
//!
//! Every gameplay constant lives here so balancing never needs a code change.
//! All structs are `#[serde(default)]`: a partial tuning file only overrides
//! the fields it names.

use serde::{Deserialize, Serialize};

use crate::sim::{BossKind, EnemyKind};

/// Player base stats before upgrades and prestige
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub max_health: f32,
    /// Pixels per second
    pub speed: f32,
    pub radius: f32,
    pub damage: f32,
    /// Shots per second
    pub fire_rate: f32,
    pub projectile_speed: f32,
    /// Seconds before a player projectile despawns
    pub projectile_lifetime: f32,
    pub projectile_radius: f32,
    /// Health per second while the regeneration upgrade is owned
    pub regen_per_second: f32,
    /// Blend rate (per second) at which homing shots turn toward their target
    pub homing_turn_rate: f32,
    /// Damage the shield soaks before health is touched
    pub shield_capacity: f32,
    /// Damage multiplier on a critical hit
    pub crit_multiplier: f32,
    /// Angle between the two barrels of a double shot (radians)
    pub double_shot_spread: f32,
    pub explosion_radius: f32,
    /// Splash damage as a fraction of the shot's damage
    pub explosion_damage_ratio: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            speed: 220.0,
            radius: 14.0,
            damage: 14.0,
            fire_rate: 5.0,
            projectile_speed: 520.0,
            projectile_lifetime: 4.0,
            projectile_radius: 4.0,
            regen_per_second: 0.5,
            homing_turn_rate: 6.0,
            shield_capacity: 40.0,
            crit_multiplier: 1.5,
            double_shot_spread: 6f32.to_radians(),
            explosion_radius: 36.0,
            explosion_damage_ratio: 0.5,
        }
    }
}

/// Per-type enemy stats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyStats {
    pub health: f32,
    pub speed: f32,
    pub radius: f32,
    /// Damage per second while overlapping the player
    pub contact_dps: f32,
    pub xp: u32,
    pub currency: u32,
}

impl Default for EnemyStats {
    fn default() -> Self {
        Self {
            health: 20.0,
            speed: 100.0,
            radius: 16.0,
            contact_dps: 20.0,
            xp: 12,
            currency: 20,
        }
    }
}

impl EnemyStats {
    fn with(health: f32, speed: f32, radius: f32, contact_dps: f32, xp: u32, currency: u32) -> Self {
        Self {
            health,
            speed,
            radius,
            contact_dps,
            xp,
            currency,
        }
    }
}

/// Enemy roster and per-behaviour parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    pub chaser: EnemyStats,
    pub shooter: EnemyStats,
    pub dasher: EnemyStats,
    pub tank: EnemyStats,
    pub orbiter: EnemyStats,
    pub splitter: EnemyStats,
    /// Fragments spawned when a splitter dies (always chasers)
    pub splitter_child: EnemyStats,
    pub split_count: u32,

    /// Seconds between shooter shots
    pub shooter_fire_interval: f32,
    pub shooter_projectile_speed: f32,
    /// Damage per second while a shooter projectile overlaps the player
    pub shooter_projectile_dps: f32,

    /// Fraction of its speed a dasher drifts at while idle
    pub dasher_idle_speed: f32,
    /// Chance per second that an idle dasher starts a dash
    pub dasher_dash_chance: f32,
    pub dasher_dash_duration: f32,
    /// Dash speed as a multiple of base speed
    pub dasher_dash_speed: f32,

    /// Radians per second
    pub orbiter_angular_rate: f32,
    pub orbiter_min_radius: f32,
    pub orbiter_max_radius: f32,

    /// Max heading change for a splitter, radians per second
    pub splitter_jitter: f32,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            chaser: EnemyStats::with(20.0, 100.0, 16.0, 20.0, 12, 20),
            shooter: EnemyStats::with(44.0, 0.0, 16.0, 15.0, 16, 30),
            dasher: EnemyStats::with(28.0, 160.0, 16.0, 25.0, 18, 35),
            tank: EnemyStats::with(170.0, 36.0, 28.0, 35.0, 36, 60),
            orbiter: EnemyStats::with(36.0, 100.0, 16.0, 20.0, 22, 42),
            splitter: EnemyStats::with(60.0, 120.0, 18.0, 20.0, 26, 48),
            splitter_child: EnemyStats::with(12.0, 140.0, 10.0, 12.0, 6, 8),
            split_count: 2,
            shooter_fire_interval: 1.0,
            shooter_projectile_speed: 260.0,
            shooter_projectile_dps: 60.0,
            dasher_idle_speed: 0.45,
            dasher_dash_chance: 0.4,
            dasher_dash_duration: 0.6,
            dasher_dash_speed: 2.2,
            orbiter_angular_rate: 1.1,
            orbiter_min_radius: 90.0,
            orbiter_max_radius: 160.0,
            splitter_jitter: 4.0,
        }
    }
}

impl EnemyTuning {
    /// Base stats for an enemy kind
    pub fn stats(&self, kind: EnemyKind) -> &EnemyStats {
        match kind {
            EnemyKind::Chaser => &self.chaser,
            EnemyKind::Shooter => &self.shooter,
            EnemyKind::Dasher => &self.dasher,
            EnemyKind::Tank => &self.tank,
            EnemyKind::Orbiter => &self.orbiter,
            EnemyKind::Splitter => &self.splitter,
        }
    }

    fn stats_mut(&mut self, kind: EnemyKind) -> &mut EnemyStats {
        match kind {
            EnemyKind::Chaser => &mut self.chaser,
            EnemyKind::Shooter => &mut self.shooter,
            EnemyKind::Dasher => &mut self.dasher,
            EnemyKind::Tank => &mut self.tank,
            EnemyKind::Orbiter => &mut self.orbiter,
            EnemyKind::Splitter => &mut self.splitter,
        }
    }
}

/// Per-kind boss stats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossStats {
    pub health: f32,
    pub speed: f32,
    pub radius: f32,
    pub contact_dps: f32,
    pub xp: u32,
    pub currency: u32,
    /// Core shards paid out on defeat, before the survival bonus
    pub shards: u32,
    /// Seconds between attacks
    pub attack_interval: f32,
    /// Distance at which the boss stops closing in
    pub stand_off: f32,
    pub projectile_speed: f32,
    pub projectile_dps: f32,
    /// Volley size (Juggernaut) or reinforcement count (HiveQueen)
    pub attack_count: u32,
}

impl Default for BossStats {
    fn default() -> Self {
        Self {
            health: 1200.0,
            speed: 40.0,
            radius: 60.0,
            contact_dps: 60.0,
            xp: 400,
            currency: 600,
            shards: 3,
            attack_interval: 2.0,
            stand_off: 60.0,
            projectile_speed: 200.0,
            projectile_dps: 80.0,
            attack_count: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossTuning {
    pub juggernaut: BossStats,
    pub sentinel: BossStats,
    pub hive_queen: BossStats,
    /// Extra boss health per second of survival
    pub health_per_second: f32,
    /// One bonus shard per this many seconds survived
    pub shard_bonus_period: f32,
}

impl Default for BossTuning {
    fn default() -> Self {
        Self {
            juggernaut: BossStats {
                speed: 20.0,
                attack_interval: 2.6,
                stand_off: 60.0,
                projectile_speed: 180.0,
                projectile_dps: 70.0,
                attack_count: 16,
                shards: 4,
                ..BossStats::default()
            },
            sentinel: BossStats {
                speed: 80.0,
                radius: 50.0,
                attack_interval: 1.0,
                stand_off: 240.0,
                projectile_speed: 320.0,
                projectile_dps: 110.0,
                ..BossStats::default()
            },
            hive_queen: BossStats {
                speed: 36.0 * 0.4,
                radius: 55.0,
                attack_interval: 3.0,
                stand_off: 120.0,
                attack_count: 3,
                ..BossStats::default()
            },
            health_per_second: 18.0,
            shard_bonus_period: 140.0,
        }
    }
}

impl BossTuning {
    pub fn stats(&self, kind: BossKind) -> &BossStats {
        match kind {
            BossKind::Juggernaut => &self.juggernaut,
            BossKind::Sentinel => &self.sentinel,
            BossKind::HiveQueen => &self.hive_queen,
        }
    }

    fn stats_mut(&mut self, kind: BossKind) -> &mut BossStats {
        match kind {
            BossKind::Juggernaut => &mut self.juggernaut,
            BossKind::Sentinel => &mut self.sentinel,
            BossKind::HiveQueen => &mut self.hive_queen,
        }
    }
}

/// Population control and drop constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    /// Master switch (tests and scripted scenarios turn it off)
    pub enabled: bool,
    /// Population floor, topped up immediately
    pub min_enemies: usize,
    /// Population ceiling, never exceeded
    pub max_enemies: usize,
    pub base_interval: f32,
    pub min_interval: f32,
    /// Interval shrink per second of survival
    pub interval_decay: f32,
    /// No spawn lands closer than this to the player
    pub exclusion_radius: f32,
    /// Seconds of survival between boss milestones
    pub boss_interval: f32,
    pub max_bosses: usize,
    /// Enemy health multiplier applied per boss defeated
    pub post_boss_scaling: f32,
    /// Seconds of survival for enemy health to grow by one base unit
    pub health_growth_period: f32,
    /// Probability that a dying enemy drops an upgrade pickup
    pub drop_chance: f32,
    pub pickup_radius: f32,
    pub pickup_lifetime: f32,
    /// Pickups drift toward a player closer than this
    pub pickup_magnet_radius: f32,
    pub pickup_magnet_speed: f32,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            enabled: true,
            min_enemies: 3,
            max_enemies: 40,
            base_interval: 1.8,
            min_interval: 0.5,
            interval_decay: 1.0 / 140.0,
            exclusion_radius: 160.0,
            boss_interval: 55.0,
            max_bosses: 1,
            post_boss_scaling: 1.08,
            health_growth_period: 400.0,
            drop_chance: 0.08,
            pickup_radius: 8.0,
            pickup_lifetime: 12.0,
            pickup_magnet_radius: 140.0,
            pickup_magnet_speed: 120.0,
        }
    }
}

/// Leveling, economy, and prestige constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionTuning {
    /// XP needed to leave level `n` is `n * level_cost`
    pub level_cost: u32,
    /// Minimum run score before prestige unlocks
    pub prestige_threshold: u64,
    /// Permanent multiplier gained per prestige
    pub prestige_bonus: f32,
}

impl Default for ProgressionTuning {
    fn default() -> Self {
        Self {
            level_cost: 100,
            prestige_threshold: 6000,
            prestige_bonus: 0.05,
        }
    }
}

/// Complete balance table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub player: PlayerTuning,
    pub enemies: EnemyTuning,
    pub bosses: BossTuning,
    pub spawn: SpawnTuning,
    pub progression: ProgressionTuning,
}

impl Tuning {
    /// Parse a (possibly partial) tuning table
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json).map(Self::sanitized)
    }

    /// Replace values the simulation cannot run with by their defaults
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        for kind in EnemyKind::ALL {
            let stats = self.enemies.stats_mut(kind);
            if !positive(stats.health) {
                log::warn!("Invalid {:?} health {}, using default", kind, stats.health);
                stats.health = defaults.enemies.stats(kind).health;
            }
        }
        if !positive(self.enemies.splitter_child.health) {
            self.enemies.splitter_child.health = defaults.enemies.splitter_child.health;
        }
        for kind in BossKind::ALL {
            let stats = self.bosses.stats_mut(kind);
            if !positive(stats.health) {
                log::warn!("Invalid {} health {}, using default", kind.name(), stats.health);
                stats.health = defaults.bosses.stats(kind).health;
            }
        }

        let spawn = &mut self.spawn;
        if !(spawn.exclusion_radius >= 0.0 && spawn.exclusion_radius.is_finite()) {
            log::warn!("Invalid exclusion_radius {}, using default", spawn.exclusion_radius);
            spawn.exclusion_radius = defaults.spawn.exclusion_radius;
        }
        if !positive(spawn.post_boss_scaling) {
            spawn.post_boss_scaling = defaults.spawn.post_boss_scaling;
        }
        if !positive(spawn.boss_interval) {
            spawn.boss_interval = defaults.spawn.boss_interval;
        }

        if self.progression.level_cost == 0 {
            log::warn!("level_cost must be at least 1, using default");
            self.progression.level_cost = defaults.progression.level_cost;
        }
        self
    }
}

fn positive(value: f32) -> bool {
    value > 0.0 && value.is_finite()
}
