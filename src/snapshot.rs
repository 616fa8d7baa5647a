//! Display-facing snapshots
//!
//! The simulation never draws. After each frame the host receives a flat,
//! ordered sprite list and a HUD summary and hands them to whatever sink it
//! uses.

use glam::Vec2;

use crate::progression::{self, UpgradeId};
use crate::sim::{Arena, BossKind, EnemyKind, GamePhase, GameState, ProjectileOwner};

/// What a sprite depicts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteKind {
    Player,
    PlayerShot,
    HostileShot,
    Enemy(EnemyKind),
    Boss(BossKind),
    Pickup(UpgradeId),
}

impl SpriteKind {
    /// Fill color hint as 0xRRGGBB
    pub fn color(self) -> u32 {
        match self {
            SpriteKind::Player => 0xB4DCFF,
            SpriteKind::PlayerShot => 0xFFE678,
            SpriteKind::HostileShot => 0xFF7878,
            SpriteKind::Enemy(kind) => match kind {
                EnemyKind::Chaser => 0xDC6464,
                EnemyKind::Shooter => 0xDC8C64,
                EnemyKind::Dasher => 0xDC5096,
                EnemyKind::Tank => 0x7850C8,
                EnemyKind::Orbiter => 0x78C8DC,
                EnemyKind::Splitter => 0xDCC850,
            },
            SpriteKind::Boss(kind) => match kind {
                BossKind::Juggernaut => 0xC8503C,
                BossKind::Sentinel => 0x78A0DC,
                BossKind::HiveQueen => 0xC88CDC,
            },
            SpriteKind::Pickup(_) => 0x78C8FF,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub kind: SpriteKind,
    pub pos: Vec2,
    pub radius: f32,
    pub color: u32,
    /// Present for damageable entities
    pub health_ratio: Option<f32>,
}

impl Sprite {
    fn new(kind: SpriteKind, pos: Vec2, radius: f32, health_ratio: Option<f32>) -> Self {
        Self {
            kind,
            pos,
            radius,
            color: kind.color(),
            health_ratio,
        }
    }
}

/// Everything a renderer needs for one frame, in draw order:
/// player, projectiles, enemies, bosses, pickups
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSnapshot {
    pub arena: Arena,
    pub sprites: Vec<Sprite>,
}

impl RenderSnapshot {
    pub fn capture(state: &GameState) -> Self {
        let mut sprites = Vec::with_capacity(
            1 + state.projectiles.len() + state.enemies.len() + state.bosses.len() + state.pickups.len(),
        );

        let player = &state.player;
        let ratio = player.health / player.max_health();
        sprites.push(Sprite::new(SpriteKind::Player, player.pos, player.radius, Some(ratio)));

        for shot in state.projectiles.iter().filter(|p| !p.is_expired()) {
            let kind = match shot.owner {
                ProjectileOwner::Player => SpriteKind::PlayerShot,
                ProjectileOwner::Enemy | ProjectileOwner::Boss => SpriteKind::HostileShot,
            };
            sprites.push(Sprite::new(kind, shot.pos, shot.radius, None));
        }
        for enemy in state.enemies.iter().filter(|e| !e.is_expired()) {
            sprites.push(Sprite::new(
                SpriteKind::Enemy(enemy.kind()),
                enemy.pos,
                enemy.radius,
                Some(enemy.health_ratio()),
            ));
        }
        for boss in state.bosses.iter().filter(|b| !b.is_expired()) {
            sprites.push(Sprite::new(
                SpriteKind::Boss(boss.kind),
                boss.pos,
                boss.radius,
                Some(boss.health_ratio()),
            ));
        }
        for pickup in state.pickups.iter().filter(|p| !p.is_expired()) {
            sprites.push(Sprite::new(SpriteKind::Pickup(pickup.upgrade), pickup.pos, pickup.radius, None));
        }

        Self {
            arena: state.arena,
            sprites,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BossBar {
    pub kind: BossKind,
    pub name: &'static str,
    pub health: f32,
    pub max_health: f32,
}

/// Numbers for the heads-up display
#[derive(Debug, Clone, PartialEq)]
pub struct HudSnapshot {
    pub health: f32,
    pub max_health: f32,
    pub shield: f32,
    pub xp: u32,
    pub xp_to_next: u32,
    pub level: u32,
    pub currency: u64,
    pub core_shards: u64,
    pub skill_points: u32,
    pub score: u64,
    pub boss: Option<BossBar>,
    /// Everything owned as display names, e.g. "Engine x2"
    pub upgrades: Vec<String>,
    pub prestige_count: u32,
    pub prestige_points: u32,
    pub phase: GamePhase,
}

impl HudSnapshot {
    pub fn capture(state: &GameState) -> Self {
        let player = &state.player;
        let leveled = |name: &str, level: u32| {
            if level > 1 {
                format!("{} x{}", name, level)
            } else {
                name.to_string()
            }
        };
        let mut upgrades: Vec<String> = player
            .upgrades
            .iter()
            .filter(|(_, level)| **level > 0)
            .map(|(id, level)| leveled(id.name(), *level))
            .collect();
        upgrades.extend(player.core.iter().map(|id| id.name().to_string()));
        upgrades.extend(
            player
                .skills
                .iter()
                .filter(|(_, level)| **level > 0)
                .map(|(id, level)| leveled(id.name(), *level)),
        );
        upgrades.extend(player.perks.iter().map(|id| id.name().to_string()));

        Self {
            health: player.health,
            max_health: player.max_health(),
            shield: player.shield,
            xp: player.xp,
            xp_to_next: progression::xp_to_next(player, &state.tuning.progression),
            level: player.level,
            currency: player.currency,
            core_shards: player.core_shards,
            skill_points: player.skill_points,
            score: player.score,
            boss: state.active_boss().map(|b| BossBar {
                kind: b.kind,
                name: b.kind.name(),
                health: b.health,
                max_health: b.max_health,
            }),
            upgrades,
            prestige_count: state.prestige.count,
            prestige_points: state.prestige.points,
            phase: state.phase,
        }
    }
}
