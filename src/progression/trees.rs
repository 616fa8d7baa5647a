//! Core tree, skill tree, and prestige shop
//!
//! Each catalog is a closed enum indexed into a static table. Core upgrades
//! and perks are owned once and kept across runs; skills are leveled with
//! points earned this run and cleared on prestige.

use serde::{Deserialize, Serialize};

use super::{Ability, Currency, Effect, ProgressionError, Stat, pay};
use crate::sim::Player;

/// Core tree nodes, bought with boss shards
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CoreUpgradeId {
    #[serde(rename = "core_pierce1")]
    PierceI,
    #[serde(rename = "core_pierce2")]
    PierceII,
    #[serde(rename = "core_double")]
    DoubleShot,
    #[serde(rename = "core_explode")]
    Explosive,
    #[serde(rename = "core_shield")]
    ShieldRegen,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoreDef {
    pub id: CoreUpgradeId,
    pub name: &'static str,
    pub description: &'static str,
    /// Price in core shards
    pub cost: u64,
    pub requires: Option<CoreUpgradeId>,
    pub effect: Effect,
}

static CORE_TREE: [CoreDef; 5] = [
    CoreDef {
        id: CoreUpgradeId::PierceI,
        name: "Pierce I",
        description: "Shots pass through one extra target",
        cost: 2,
        requires: None,
        effect: Effect::Pierce(1),
    },
    CoreDef {
        id: CoreUpgradeId::PierceII,
        name: "Pierce II",
        description: "Shots pass through two extra targets",
        cost: 4,
        requires: Some(CoreUpgradeId::PierceI),
        effect: Effect::Pierce(2),
    },
    CoreDef {
        id: CoreUpgradeId::DoubleShot,
        name: "Double Shot",
        description: "Fire two shots in a narrow spread",
        cost: 5,
        requires: Some(CoreUpgradeId::PierceI),
        effect: Effect::Unlock(Ability::DoubleShot),
    },
    CoreDef {
        id: CoreUpgradeId::Explosive,
        name: "Explosive Rounds",
        description: "Hits splash nearby hostiles",
        cost: 6,
        requires: Some(CoreUpgradeId::DoubleShot),
        effect: Effect::Unlock(Ability::Explosive),
    },
    CoreDef {
        id: CoreUpgradeId::ShieldRegen,
        name: "Shield Regen",
        description: "Shield recharges over time",
        cost: 6,
        requires: Some(CoreUpgradeId::DoubleShot),
        effect: Effect::Add(Stat::ShieldRegen, 2.0),
    },
];

impl CoreUpgradeId {
    pub const ALL: [CoreUpgradeId; 5] = [
        CoreUpgradeId::PierceI,
        CoreUpgradeId::PierceII,
        CoreUpgradeId::DoubleShot,
        CoreUpgradeId::Explosive,
        CoreUpgradeId::ShieldRegen,
    ];

    pub fn def(self) -> &'static CoreDef {
        &CORE_TREE[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.def().name
    }

    /// Save-file key
    pub fn key(self) -> &'static str {
        match self {
            CoreUpgradeId::PierceI => "core_pierce1",
            CoreUpgradeId::PierceII => "core_pierce2",
            CoreUpgradeId::DoubleShot => "core_double",
            CoreUpgradeId::Explosive => "core_explode",
            CoreUpgradeId::ShieldRegen => "core_shield",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.key() == key)
    }
}

/// Buy a core tree node with the player's shards. Returns the price paid.
pub fn purchase_core(player: &mut Player, id: CoreUpgradeId) -> Result<u64, ProgressionError> {
    let def = id.def();
    if player.core.contains(&id) {
        return Err(ProgressionError::AlreadyOwned(def.name));
    }
    if let Some(req) = def.requires
        && !player.core.contains(&req)
    {
        return Err(ProgressionError::Locked {
            item: def.name,
            requires: req.name(),
        });
    }
    pay(&mut player.core_shards, def.cost, def.name, Currency::CoreShards)?;
    player.core.insert(id);
    log::info!("Core upgrade {} bought for {} shards", def.name, def.cost);
    Ok(def.cost)
}

/// Skill tree nodes, leveled with skill points earned this run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SkillId {
    Evasion,
    Critical,
    Regeneration,
    QuickShield,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkillDef {
    pub id: SkillId,
    pub name: &'static str,
    pub description: &'static str,
    pub max_level: u32,
    /// Needs at least one level of this skill first
    pub requires: Option<SkillId>,
    pub effect: Effect,
}

static SKILL_TREE: [SkillDef; 4] = [
    SkillDef {
        id: SkillId::Evasion,
        name: "Evasion",
        description: "+6% chance to avoid contact damage per level",
        max_level: 3,
        requires: None,
        effect: Effect::Add(Stat::Evasion, 0.06),
    },
    SkillDef {
        id: SkillId::Critical,
        name: "Critical",
        description: "+5% critical hit chance per level",
        max_level: 3,
        requires: Some(SkillId::Evasion),
        effect: Effect::Add(Stat::CritChance, 0.05),
    },
    SkillDef {
        id: SkillId::Regeneration,
        name: "Regeneration",
        description: "+0.5 health per second per level",
        max_level: 2,
        requires: Some(SkillId::Critical),
        effect: Effect::Add(Stat::Regen, 0.5),
    },
    SkillDef {
        id: SkillId::QuickShield,
        name: "Quick Shield",
        description: "Shield recharges 50% faster",
        max_level: 1,
        requires: Some(SkillId::Regeneration),
        effect: Effect::Multiply(Stat::ShieldRegen, 1.5),
    },
];

impl SkillId {
    pub const ALL: [SkillId; 4] = [
        SkillId::Evasion,
        SkillId::Critical,
        SkillId::Regeneration,
        SkillId::QuickShield,
    ];

    pub fn def(self) -> &'static SkillDef {
        &SKILL_TREE[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.def().name
    }

    pub fn cap(self, level: u32) -> u32 {
        level.min(self.def().max_level)
    }
}

/// Spend one skill point on the next level of a skill. Returns the new level.
pub fn purchase_skill(player: &mut Player, id: SkillId) -> Result<u32, ProgressionError> {
    let def = id.def();
    let level = player.skills.get(&id).copied().unwrap_or(0);
    if level >= def.max_level {
        return Err(ProgressionError::MaxLevel(def.name));
    }
    if let Some(req) = def.requires
        && player.skills.get(&req).copied().unwrap_or(0) == 0
    {
        return Err(ProgressionError::Locked {
            item: def.name,
            requires: req.name(),
        });
    }
    pay(&mut player.skill_points, 1, def.name, Currency::SkillPoints)?;
    player.skills.insert(id, level + 1);
    log::debug!("Skill {} raised to {}", def.name, level + 1);
    Ok(level + 1)
}

/// Prestige shop perks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PerkId {
    #[serde(rename = "ps_dmg5")]
    Damage,
    #[serde(rename = "ps_money10")]
    Money,
    #[serde(rename = "ps_fire5")]
    FireRate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerkDef {
    pub id: PerkId,
    pub name: &'static str,
    /// Price in prestige points
    pub cost: u32,
    pub effect: Effect,
}

static PRESTIGE_SHOP: [PerkDef; 3] = [
    PerkDef {
        id: PerkId::Damage,
        name: "+5% Damage",
        cost: 1,
        effect: Effect::Multiply(Stat::Damage, 1.05),
    },
    PerkDef {
        id: PerkId::Money,
        name: "+10% Money",
        cost: 2,
        effect: Effect::Multiply(Stat::CurrencyGain, 1.10),
    },
    PerkDef {
        id: PerkId::FireRate,
        name: "+5% Fire Rate",
        cost: 2,
        effect: Effect::Multiply(Stat::FireRate, 1.05),
    },
];

impl PerkId {
    pub const ALL: [PerkId; 3] = [PerkId::Damage, PerkId::Money, PerkId::FireRate];

    pub fn def(self) -> &'static PerkDef {
        &PRESTIGE_SHOP[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.def().name
    }

    /// Save-file key
    pub fn key(self) -> &'static str {
        match self {
            PerkId::Damage => "ps_dmg5",
            PerkId::Money => "ps_money10",
            PerkId::FireRate => "ps_fire5",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.key() == key)
    }
}

/// Buy a perk with prestige points. Returns the price paid.
pub fn purchase_perk(player: &mut Player, points: &mut u32, id: PerkId) -> Result<u32, ProgressionError> {
    let def = id.def();
    if player.perks.contains(&id) {
        return Err(ProgressionError::AlreadyOwned(def.name));
    }
    pay(points, def.cost, def.name, Currency::PrestigePoints)?;
    player.perks.insert(id);
    log::info!("Prestige perk {} bought", def.name);
    Ok(def.cost)
}
