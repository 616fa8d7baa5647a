//! Experience, leveling, currencies, upgrades, and prestige
//!
//! Upgrades are plain data: each catalog entry names a cost and an
//! [`Effect`], and [`derive_stats`] is the only place effects are
//! interpreted. Derived stats are always recomputed from base tuning plus
//! everything owned, never patched incrementally.
//!
//! Four catalogs feed the same effects:
//! - money upgrades ([`UpgradeId`]), bought with credits or found as pickups
//! - the core tree ([`CoreUpgradeId`]), bought with core shards from bosses
//! - the skill tree ([`SkillId`]), bought with skill points earned this run
//! - the prestige shop ([`PerkId`]), bought with prestige points

mod trees;

pub use trees::{
    CoreDef, CoreUpgradeId, PerkDef, PerkId, SkillDef, SkillId, purchase_core, purchase_perk, purchase_skill,
};

use std::collections::BTreeMap;
use std::fmt;
use std::ops::SubAssign;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::Player;
use crate::tuning::{PlayerTuning, ProgressionTuning};

/// Money upgrade identifiers (closed catalog)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeId {
    Engine,
    AutoFeed,
    Rounds,
    Plating,
    Scavenger,
    LightRounds,
    Homing,
    Piercing,
    Regeneration,
    SpawnShield,
}

/// Player stats an upgrade can modify
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stat {
    MoveSpeed,
    FireRate,
    Damage,
    MaxHealth,
    CurrencyGain,
    ProjectileSpeed,
    /// Chance to shrug off a step's incoming damage
    Evasion,
    CritChance,
    /// Health per second
    Regen,
    /// Shield per second
    ShieldRegen,
}

/// Boolean abilities unlocked by an upgrade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ability {
    Homing,
    Piercing,
    Regeneration,
    DoubleShot,
    Explosive,
    SpawnShield,
}

/// What owning one level of an upgrade does
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    /// `stat += amount` per level
    Add(Stat, f32),
    /// `stat *= factor` per level
    Multiply(Stat, f32),
    /// Ability on at level >= 1; further levels are no-ops
    Unlock(Ability),
    /// Shots pass through this many extra targets; the highest tier wins
    Pierce(u32),
}

/// Catalog entry
#[derive(Debug, Clone, PartialEq)]
pub struct UpgradeDef {
    pub id: UpgradeId,
    pub name: &'static str,
    pub description: &'static str,
    pub base_cost: u64,
    /// Cost multiplier per level already owned
    pub growth: f32,
    /// `None` means unbounded
    pub max_level: Option<u32>,
    pub effect: Effect,
}

static CATALOG: [UpgradeDef; 10] = [
    UpgradeDef {
        id: UpgradeId::Engine,
        name: "Engine",
        description: "+8% move speed per level",
        base_cost: 100,
        growth: 1.9,
        max_level: Some(5),
        effect: Effect::Multiply(Stat::MoveSpeed, 1.08),
    },
    UpgradeDef {
        id: UpgradeId::AutoFeed,
        name: "AutoFeed",
        description: "+12% fire rate per level",
        base_cost: 120,
        growth: 1.9,
        max_level: Some(5),
        effect: Effect::Multiply(Stat::FireRate, 1.12),
    },
    UpgradeDef {
        id: UpgradeId::Rounds,
        name: "Rounds",
        description: "+6 damage per level",
        base_cost: 140,
        growth: 1.9,
        max_level: Some(5),
        effect: Effect::Add(Stat::Damage, 6.0),
    },
    UpgradeDef {
        id: UpgradeId::Plating,
        name: "Plating",
        description: "+25 max health per level",
        base_cost: 160,
        growth: 1.9,
        max_level: Some(5),
        effect: Effect::Add(Stat::MaxHealth, 25.0),
    },
    UpgradeDef {
        id: UpgradeId::Scavenger,
        name: "Scavenger",
        description: "+10% currency per level",
        base_cost: 150,
        growth: 1.9,
        max_level: Some(4),
        effect: Effect::Multiply(Stat::CurrencyGain, 1.10),
    },
    UpgradeDef {
        id: UpgradeId::LightRounds,
        name: "Light Rounds",
        description: "+20% projectile speed per level",
        base_cost: 200,
        growth: 1.9,
        max_level: Some(3),
        effect: Effect::Multiply(Stat::ProjectileSpeed, 1.20),
    },
    UpgradeDef {
        id: UpgradeId::Homing,
        name: "Homing Rounds",
        description: "Shots steer toward the nearest hostile",
        base_cost: 420,
        growth: 1.9,
        max_level: Some(1),
        effect: Effect::Unlock(Ability::Homing),
    },
    UpgradeDef {
        id: UpgradeId::Piercing,
        name: "Piercing Rounds",
        description: "Shots pass through targets",
        base_cost: 380,
        growth: 1.9,
        max_level: Some(1),
        effect: Effect::Unlock(Ability::Piercing),
    },
    UpgradeDef {
        id: UpgradeId::Regeneration,
        name: "Regeneration",
        description: "Slowly regenerate health",
        base_cost: 300,
        growth: 1.9,
        max_level: Some(1),
        effect: Effect::Unlock(Ability::Regeneration),
    },
    UpgradeDef {
        id: UpgradeId::SpawnShield,
        name: "Spawn Shield",
        description: "Start every run behind a shield",
        base_cost: 380,
        growth: 1.9,
        max_level: Some(1),
        effect: Effect::Unlock(Ability::SpawnShield),
    },
];

impl UpgradeId {
    pub const ALL: [UpgradeId; 10] = [
        UpgradeId::Engine,
        UpgradeId::AutoFeed,
        UpgradeId::Rounds,
        UpgradeId::Plating,
        UpgradeId::Scavenger,
        UpgradeId::LightRounds,
        UpgradeId::Homing,
        UpgradeId::Piercing,
        UpgradeId::Regeneration,
        UpgradeId::SpawnShield,
    ];

    /// Catalog entry for this upgrade
    pub fn def(self) -> &'static UpgradeDef {
        &CATALOG[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.def().name
    }

    /// Save-file key
    pub fn key(self) -> &'static str {
        match self {
            UpgradeId::Engine => "engine",
            UpgradeId::AutoFeed => "auto_feed",
            UpgradeId::Rounds => "rounds",
            UpgradeId::Plating => "plating",
            UpgradeId::Scavenger => "scavenger",
            UpgradeId::LightRounds => "light_rounds",
            UpgradeId::Homing => "homing",
            UpgradeId::Piercing => "piercing",
            UpgradeId::Regeneration => "regeneration",
            UpgradeId::SpawnShield => "spawn_shield",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.key() == key)
    }

    /// Stat upgrades stack; ability unlocks do not
    pub fn is_stackable(self) -> bool {
        !matches!(self.def().effect, Effect::Unlock(_))
    }

    /// Clamp a level to this upgrade's max
    pub fn cap(self, level: u32) -> u32 {
        match self.def().max_level {
            Some(max) => level.min(max),
            None => level,
        }
    }
}

/// Cost of buying the next level when `owned` levels are already held
pub fn upgrade_cost(id: UpgradeId, owned: u32) -> u64 {
    let def = id.def();
    (def.base_cost as f64 * (def.growth as f64).powi(owned as i32)).round() as u64
}

/// Stats derived from base tuning, everything owned, and prestige
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub move_speed: f32,
    pub fire_rate: f32,
    pub damage: f32,
    pub max_health: f32,
    pub currency_gain: f32,
    pub projectile_speed: f32,
    /// Probability in `[0, 1]`
    pub evasion: f32,
    /// Probability in `[0, 1]`
    pub crit_chance: f32,
    pub regen: f32,
    pub shield_regen: f32,
    /// Extra targets each shot passes through
    pub pierce: u32,
}

impl Stats {
    fn base(base: &PlayerTuning) -> Self {
        Self {
            move_speed: base.speed,
            fire_rate: base.fire_rate,
            damage: base.damage,
            max_health: base.max_health,
            currency_gain: 1.0,
            projectile_speed: base.projectile_speed,
            evasion: 0.0,
            crit_chance: 0.0,
            regen: 0.0,
            shield_regen: 0.0,
            pierce: 0,
        }
    }

    fn slot(&mut self, stat: Stat) -> &mut f32 {
        match stat {
            Stat::MoveSpeed => &mut self.move_speed,
            Stat::FireRate => &mut self.fire_rate,
            Stat::Damage => &mut self.damage,
            Stat::MaxHealth => &mut self.max_health,
            Stat::CurrencyGain => &mut self.currency_gain,
            Stat::ProjectileSpeed => &mut self.projectile_speed,
            Stat::Evasion => &mut self.evasion,
            Stat::CritChance => &mut self.crit_chance,
            Stat::Regen => &mut self.regen,
            Stat::ShieldRegen => &mut self.shield_regen,
        }
    }
}

/// Ability flags derived from owned upgrades
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Abilities {
    pub homing: bool,
    pub piercing: bool,
    pub regeneration: bool,
    pub double_shot: bool,
    pub explosive: bool,
    pub spawn_shield: bool,
}

impl Abilities {
    fn unlock(&mut self, ability: Ability) {
        match ability {
            Ability::Homing => self.homing = true,
            Ability::Piercing => self.piercing = true,
            Ability::Regeneration => self.regeneration = true,
            Ability::DoubleShot => self.double_shot = true,
            Ability::Explosive => self.explosive = true,
            Ability::SpawnShield => self.spawn_shield = true,
        }
    }
}

/// Every effect the player owns, paired with its (capped) level
pub fn owned_effects(player: &Player) -> Vec<(Effect, u32)> {
    let upgrades = player.upgrades.iter().map(|(&id, &level)| (id.def().effect, id.cap(level)));
    let core = player.core.iter().map(|id| (id.def().effect, 1));
    let skills = player.skills.iter().map(|(&id, &level)| (id.def().effect, id.cap(level)));
    let perks = player.perks.iter().map(|id| (id.def().effect, 1));
    upgrades.chain(core).chain(skills).chain(perks).collect()
}

/// Interpret owned effects against base tuning.
///
/// Additive effects apply before multiplicative ones, so the result does not
/// depend on catalog order. The prestige multiplier scales damage and
/// currency gain.
pub fn derive_stats(owned: &[(Effect, u32)], base: &PlayerTuning, prestige_multiplier: f32) -> (Stats, Abilities) {
    let mut stats = Stats::base(base);
    let mut abilities = Abilities::default();

    for &(effect, level) in owned.iter().filter(|(_, level)| *level > 0) {
        match effect {
            Effect::Add(stat, amount) => *stats.slot(stat) += amount * level as f32,
            Effect::Unlock(ability) => abilities.unlock(ability),
            Effect::Pierce(tier) => stats.pierce = stats.pierce.max(tier),
            Effect::Multiply(..) => {}
        }
    }
    for &(effect, level) in owned {
        if let Effect::Multiply(stat, factor) = effect {
            *stats.slot(stat) *= factor.powi(level as i32);
        }
    }

    if abilities.regeneration {
        stats.regen += base.regen_per_second;
    }
    stats.evasion = stats.evasion.clamp(0.0, 1.0);
    stats.crit_chance = stats.crit_chance.clamp(0.0, 1.0);
    stats.damage *= prestige_multiplier;
    stats.currency_gain *= prestige_multiplier;
    (stats, abilities)
}

/// Permanent multiplier granted by `prestige_count` prestiges
pub fn prestige_multiplier(prestige_count: u32, tuning: &ProgressionTuning) -> f32 {
    1.0 + tuning.prestige_bonus * prestige_count as f32
}

/// Recompute the player's derived stats.
///
/// Raising max health heals by the same amount; lowering it clamps health.
/// Gaining the spawn shield mid-run raises the shield at once.
pub fn refresh_stats(player: &mut Player, base: &PlayerTuning, prestige_multiplier: f32) {
    let (stats, abilities) = derive_stats(&owned_effects(player), base, prestige_multiplier);
    let gained = stats.max_health - player.stats.max_health;
    let shield_gained = abilities.spawn_shield && !player.abilities.spawn_shield;
    player.stats = stats;
    player.abilities = abilities;
    if gained > 0.0 {
        player.health += gained;
    }
    player.health = player.health.clamp(0.0, player.stats.max_health);
    if shield_gained {
        player.shield = base.shield_capacity;
    }
}

/// Grant a kill reward. Returns the currency actually credited.
pub fn award(player: &mut Player, xp: u32, currency: u32) -> u64 {
    let credited = (currency as f32 * player.stats.currency_gain).round() as u64;
    player.xp = player.xp.saturating_add(xp);
    player.currency = player.currency.saturating_add(credited);
    player.score = player.score.saturating_add(credited);
    credited
}

/// Core shards for a boss kill: the boss's base payout plus one per
/// `bonus_period` seconds survived. Returns the shards credited.
pub fn award_shards(player: &mut Player, base: u32, elapsed: f32, bonus_period: f32) -> u64 {
    let bonus = if bonus_period > 0.0 && elapsed > 0.0 {
        (elapsed / bonus_period) as u64
    } else {
        0
    };
    let shards = u64::from(base) + bonus;
    player.core_shards = player.core_shards.saturating_add(shards);
    shards
}

/// XP needed to leave the player's current level
pub fn xp_to_next(player: &Player, tuning: &ProgressionTuning) -> u32 {
    player.level.saturating_mul(tuning.level_cost)
}

/// One progression pass: at most one level gained, xp resets to zero, and
/// each level grants a skill point
pub fn level_up(player: &mut Player, tuning: &ProgressionTuning) -> bool {
    if player.xp >= xp_to_next(player, tuning) {
        player.level += 1;
        player.xp = 0;
        player.skill_points += 1;
        true
    } else {
        false
    }
}

/// Result of collecting an upgrade pickup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickupOutcome {
    /// Level raised to the contained value
    Stacked(u32),
    /// Non-stackable upgrade already owned
    AlreadyOwned,
    /// Stackable upgrade already at max level
    Maxed,
}

/// Apply a pickup payload for the current session
pub fn apply_pickup(player: &mut Player, id: UpgradeId) -> PickupOutcome {
    let level = player.upgrades.entry(id).or_insert(0);
    if !id.is_stackable() && *level > 0 {
        return PickupOutcome::AlreadyOwned;
    }
    let next = id.cap(*level + 1);
    if next == *level {
        return PickupOutcome::Maxed;
    }
    *level = next;
    PickupOutcome::Stacked(next)
}

/// What a purchase is paid with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Currency {
    Credits,
    CoreShards,
    SkillPoints,
    PrestigePoints,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Currency::Credits => "credits",
            Currency::CoreShards => "core shards",
            Currency::SkillPoints => "skill points",
            Currency::PrestigePoints => "prestige points",
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProgressionError {
    #[error("{0} is already at max level")]
    MaxLevel(&'static str),
    #[error("{0} is already owned")]
    AlreadyOwned(&'static str),
    #[error("{item} requires {requires} first")]
    Locked { item: &'static str, requires: &'static str },
    #[error("{item} costs {cost} {currency}, only {available} available")]
    InsufficientFunds {
        item: &'static str,
        currency: Currency,
        cost: u64,
        available: u64,
    },
    #[error("prestige needs a score of {required}, run score is {score}")]
    PrestigeLocked { score: u64, required: u64 },
}

/// Deduct `cost` from `wallet` or report the shortfall
fn pay<T>(wallet: &mut T, cost: T, item: &'static str, currency: Currency) -> Result<(), ProgressionError>
where
    T: Copy + PartialOrd + SubAssign + Into<u64>,
{
    if *wallet < cost {
        return Err(ProgressionError::InsufficientFunds {
            item,
            currency,
            cost: cost.into(),
            available: (*wallet).into(),
        });
    }
    *wallet -= cost;
    Ok(())
}

/// Buy the next permanent level of an upgrade with the player's currency.
///
/// `permanent` is the durable level table; the player's session levels are
/// raised alongside it. Returns the price paid.
pub fn purchase(
    player: &mut Player,
    permanent: &mut BTreeMap<UpgradeId, u32>,
    id: UpgradeId,
) -> Result<u64, ProgressionError> {
    let owned = permanent.get(&id).copied().unwrap_or(0);
    if id.cap(owned + 1) == owned {
        return Err(ProgressionError::MaxLevel(id.name()));
    }
    let cost = upgrade_cost(id, owned);
    pay(&mut player.currency, cost, id.name(), Currency::Credits)?;
    permanent.insert(id, owned + 1);
    let session = player.upgrades.entry(id).or_insert(0);
    *session = id.cap((*session).max(owned) + 1);
    log::info!("Purchased {} level {} for {}", id.name(), owned + 1, cost);
    Ok(cost)
}

/// Prestige bookkeeping carried by the run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrestigeProgress {
    /// Prestiges ever performed; drives the permanent multiplier
    pub count: u32,
    /// Unspent prestige shop currency
    pub points: u32,
}

/// Trade the current run for a permanent multiplier and a prestige point.
///
/// Resets level, xp, score, skills, and health to session defaults. Returns
/// the new prestige count.
pub fn prestige(
    player: &mut Player,
    progress: &mut PrestigeProgress,
    base: &PlayerTuning,
    tuning: &ProgressionTuning,
) -> Result<u32, ProgressionError> {
    if player.score < tuning.prestige_threshold {
        return Err(ProgressionError::PrestigeLocked {
            score: player.score,
            required: tuning.prestige_threshold,
        });
    }
    progress.count += 1;
    progress.points += 1;
    player.level = 1;
    player.xp = 0;
    player.score = 0;
    player.skills.clear();
    player.skill_points = 0;
    refresh_stats(player, base, prestige_multiplier(progress.count, tuning));
    player.health = player.stats.max_health;
    player.shield = if player.abilities.spawn_shield {
        base.shield_capacity
    } else {
        0.0
    };
    log::info!("Prestige {} reached", progress.count);
    Ok(progress.count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn player() -> Player {
        Player::new(Vec2::new(100.0, 100.0), &PlayerTuning::default(), 1.0)
    }

    #[test]
    fn test_catalog_indexed_by_id() {
        for id in UpgradeId::ALL {
            assert_eq!(id.def().id, id);
            assert_eq!(UpgradeId::from_key(id.key()), Some(id));
        }
        assert_eq!(UpgradeId::from_key("warp_drive"), None);
    }

    #[test]
    fn test_level_up_resets_xp() {
        let tuning = ProgressionTuning {
            level_cost: 50,
            ..Default::default()
        };
        let mut p = player();
        p.level = 1;
        p.xp = 50;
        assert!(level_up(&mut p, &tuning));
        assert_eq!(p.level, 2);
        assert_eq!(p.xp, 0);
    }

    #[test]
    fn test_level_up_one_level_per_pass() {
        let tuning = ProgressionTuning {
            level_cost: 50,
            ..Default::default()
        };
        let mut p = player();
        p.xp = 500;
        assert!(level_up(&mut p, &tuning));
        assert_eq!(p.level, 2);
        assert_eq!(p.xp, 0);
        assert!(!level_up(&mut p, &tuning));
    }

    #[test]
    fn test_cost_escalates() {
        assert_eq!(upgrade_cost(UpgradeId::Engine, 0), 100);
        assert_eq!(upgrade_cost(UpgradeId::Engine, 1), 190);
        assert_eq!(upgrade_cost(UpgradeId::Engine, 2), 361);
    }

    #[test]
    fn test_derive_stats_additive_and_multiplicative() {
        let base = PlayerTuning::default();
        let mut p = player();
        p.upgrades.insert(UpgradeId::Rounds, 2);
        p.upgrades.insert(UpgradeId::Engine, 1);
        p.upgrades.insert(UpgradeId::Piercing, 1);
        let (stats, abilities) = derive_stats(&owned_effects(&p), &base, 1.0);
        assert_eq!(stats.damage, base.damage + 12.0);
        assert!((stats.move_speed - base.speed * 1.08).abs() < 1e-3);
        assert!(abilities.piercing);
        assert!(!abilities.homing);
    }

    #[test]
    fn test_prestige_multiplier_scales_damage() {
        let base = PlayerTuning::default();
        let tuning = ProgressionTuning::default();
        let mult = prestige_multiplier(2, &tuning);
        let (stats, _) = derive_stats(&[], &base, mult);
        assert!((stats.damage - base.damage * 1.1).abs() < 1e-3);
    }

    #[test]
    fn test_pickup_non_stackable_is_noop() {
        let mut p = player();
        assert_eq!(apply_pickup(&mut p, UpgradeId::Homing), PickupOutcome::Stacked(1));
        assert_eq!(apply_pickup(&mut p, UpgradeId::Homing), PickupOutcome::AlreadyOwned);
        assert_eq!(p.upgrades[&UpgradeId::Homing], 1);
    }

    #[test]
    fn test_pickup_stacks_until_max() {
        let mut p = player();
        for expected in 1..=3 {
            assert_eq!(
                apply_pickup(&mut p, UpgradeId::LightRounds),
                PickupOutcome::Stacked(expected)
            );
        }
        assert_eq!(apply_pickup(&mut p, UpgradeId::LightRounds), PickupOutcome::Maxed);
    }

    #[test]
    fn test_refresh_stats_heals_on_max_health_gain() {
        let base = PlayerTuning::default();
        let mut p = player();
        p.health = 50.0;
        p.upgrades.insert(UpgradeId::Plating, 1);
        refresh_stats(&mut p, &base, 1.0);
        assert_eq!(p.stats.max_health, 125.0);
        assert_eq!(p.health, 75.0);
    }

    #[test]
    fn test_purchase_deducts_and_levels() {
        let mut p = player();
        p.currency = 300;
        let mut permanent = BTreeMap::new();
        assert_eq!(purchase(&mut p, &mut permanent, UpgradeId::Engine), Ok(100));
        assert_eq!(p.currency, 200);
        assert_eq!(permanent[&UpgradeId::Engine], 1);
        assert_eq!(p.upgrades[&UpgradeId::Engine], 1);

        assert_eq!(purchase(&mut p, &mut permanent, UpgradeId::Engine), Ok(190));
        assert_eq!(p.currency, 10);

        assert_eq!(
            purchase(&mut p, &mut permanent, UpgradeId::Engine),
            Err(ProgressionError::InsufficientFunds {
                item: "Engine",
                currency: Currency::Credits,
                cost: 361,
                available: 10,
            })
        );
        assert_eq!(permanent[&UpgradeId::Engine], 2);
    }

    #[test]
    fn test_purchase_respects_max_level() {
        let mut p = player();
        p.currency = 10_000;
        let mut permanent = BTreeMap::new();
        purchase(&mut p, &mut permanent, UpgradeId::Homing).unwrap();
        assert_eq!(
            purchase(&mut p, &mut permanent, UpgradeId::Homing),
            Err(ProgressionError::MaxLevel("Homing Rounds"))
        );
    }

    #[test]
    fn test_prestige_requires_threshold() {
        let base = PlayerTuning::default();
        let tuning = ProgressionTuning::default();
        let mut p = player();
        let mut progress = PrestigeProgress::default();
        p.score = 10;
        assert!(matches!(
            prestige(&mut p, &mut progress, &base, &tuning),
            Err(ProgressionError::PrestigeLocked { .. })
        ));

        p.score = tuning.prestige_threshold;
        p.level = 7;
        p.xp = 40;
        p.health = 1.0;
        p.skill_points = 2;
        p.skills.insert(SkillId::Evasion, 1);
        assert_eq!(prestige(&mut p, &mut progress, &base, &tuning), Ok(1));
        assert_eq!(progress, PrestigeProgress { count: 1, points: 1 });
        assert_eq!((p.level, p.xp, p.score), (1, 0, 0));
        assert_eq!(p.health, p.stats.max_health);
        assert!(p.stats.damage > base.damage);
        assert!(p.skills.is_empty());
        assert_eq!(p.skill_points, 0);
        assert_eq!(p.stats.evasion, 0.0);
    }

    #[test]
    fn test_prestige_restores_spawn_shield() {
        let base = PlayerTuning::default();
        let tuning = ProgressionTuning::default();
        let mut p = player();
        p.upgrades.insert(UpgradeId::SpawnShield, 1);
        refresh_stats(&mut p, &base, 1.0);
        p.shield = 0.0;
        p.score = tuning.prestige_threshold;
        let mut progress = PrestigeProgress::default();
        prestige(&mut p, &mut progress, &base, &tuning).unwrap();
        assert_eq!(p.shield, base.shield_capacity);
    }

    #[test]
    fn test_level_up_grants_skill_point() {
        let tuning = ProgressionTuning::default();
        let mut p = player();
        p.xp = xp_to_next(&p, &tuning);
        assert!(level_up(&mut p, &tuning));
        assert_eq!(p.skill_points, 1);
    }

    #[test]
    fn test_highest_pierce_tier_wins() {
        let base = PlayerTuning::default();
        let owned = [(Effect::Pierce(2), 1), (Effect::Pierce(1), 1)];
        let (stats, _) = derive_stats(&owned, &base, 1.0);
        assert_eq!(stats.pierce, 2);
    }

    #[test]
    fn test_probabilities_clamped() {
        let base = PlayerTuning::default();
        let owned = [(Effect::Add(Stat::Evasion, 0.6), 3), (Effect::Add(Stat::CritChance, -1.0), 1)];
        let (stats, _) = derive_stats(&owned, &base, 1.0);
        assert_eq!(stats.evasion, 1.0);
        assert_eq!(stats.crit_chance, 0.0);
    }

    #[test]
    fn test_regeneration_unlock_adds_base_regen() {
        let base = PlayerTuning::default();
        let owned = [(Effect::Unlock(Ability::Regeneration), 1), (Effect::Add(Stat::Regen, 0.5), 2)];
        let (stats, abilities) = derive_stats(&owned, &base, 1.0);
        assert!(abilities.regeneration);
        assert!((stats.regen - (base.regen_per_second + 1.0)).abs() < 1e-5);
    }

    #[test]
    fn test_spawn_shield_raised_when_gained() {
        let base = PlayerTuning::default();
        let mut p = player();
        assert_eq!(p.shield, 0.0);
        p.upgrades.insert(UpgradeId::SpawnShield, 1);
        refresh_stats(&mut p, &base, 1.0);
        assert_eq!(p.shield, base.shield_capacity);

        p.shield = 5.0;
        refresh_stats(&mut p, &base, 1.0);
        assert_eq!(p.shield, 5.0);
    }

    #[test]
    fn test_boss_shards_grow_with_survival_time() {
        let mut p = player();
        assert_eq!(award_shards(&mut p, 3, 0.0, 140.0), 3);
        assert_eq!(award_shards(&mut p, 4, 290.0, 140.0), 6);
        assert_eq!(award_shards(&mut p, 3, 500.0, 0.0), 3);
        assert_eq!(p.core_shards, 12);
    }
}
