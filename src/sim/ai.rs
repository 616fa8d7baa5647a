//! Per-type enemy and boss behaviour
//!
//! Each policy only moves the entity it drives. Effects on other entities
//! come back as an [`AiCommand`] for the tick loop to apply.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::entity::{AdvanceContext, Boss, BossKind, DashState, Enemy, EnemyBehavior, ProjectileOwner};
use super::geometry::{direction_to, from_angle};

/// Cross-entity effect requested by an AI step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AiCommand {
    None,
    /// One aimed hostile projectile
    Fire {
        origin: Vec2,
        dir: Vec2,
        speed: f32,
        dps: f32,
        owner: ProjectileOwner,
    },
    /// Evenly spaced ring of boss projectiles
    Volley { origin: Vec2, count: u32, speed: f32, dps: f32 },
    /// Spawn chasers through the spawn director
    Reinforce { origin: Vec2, count: u32 },
}

/// Advance one enemy: update behaviour state, move, clamp to the arena
pub fn drive_enemy(enemy: &mut Enemy, dt: f32, ctx: &AdvanceContext, rng: &mut Pcg32) -> AiCommand {
    let tuning = &ctx.tuning.enemies;
    let to_player = direction_to(enemy.pos, ctx.player_pos);
    let mut command = AiCommand::None;

    match &mut enemy.behavior {
        EnemyBehavior::Chaser | EnemyBehavior::Tank => {
            enemy.vel = to_player * enemy.speed;
        }
        EnemyBehavior::Shooter { cooldown } => {
            enemy.vel = Vec2::ZERO;
            *cooldown -= dt;
            if *cooldown <= 0.0 {
                *cooldown = tuning.shooter_fire_interval;
                if to_player != Vec2::ZERO {
                    command = AiCommand::Fire {
                        origin: enemy.pos,
                        dir: to_player,
                        speed: tuning.shooter_projectile_speed,
                        dps: tuning.shooter_projectile_dps,
                        owner: ProjectileOwner::Enemy,
                    };
                }
            }
        }
        EnemyBehavior::Dasher(dash) => match *dash {
            DashState::Idle => {
                enemy.vel = to_player * enemy.speed * tuning.dasher_idle_speed;
                let chance = (tuning.dasher_dash_chance * dt).clamp(0.0, 1.0);
                if to_player != Vec2::ZERO && rng.random_bool(f64::from(chance)) {
                    *dash = DashState::Dashing {
                        remaining: tuning.dasher_dash_duration,
                        dir: to_player,
                    };
                }
            }
            DashState::Dashing { remaining, dir } => {
                enemy.vel = dir * enemy.speed * tuning.dasher_dash_speed;
                let remaining = remaining - dt;
                *dash = if remaining <= 0.0 {
                    DashState::Idle
                } else {
                    DashState::Dashing { remaining, dir }
                };
            }
        },
        EnemyBehavior::Orbiter { anchor, angle, radius } => {
            *angle += tuning.orbiter_angular_rate * dt;
            let target = *anchor + from_angle(*angle) * *radius;
            enemy.vel = if dt > 0.0 { (target - enemy.pos) / dt } else { Vec2::ZERO };
        }
        EnemyBehavior::Splitter { heading } => {
            *heading += rng.random_range(-1.0f32..=1.0) * tuning.splitter_jitter * dt;
            let ahead = enemy.pos + from_angle(*heading) * enemy.speed * dt;
            // Turn back toward the middle instead of grinding along a wall
            if !ctx.arena.contains(ahead, -enemy.radius) {
                let back = ctx.arena.center() - enemy.pos;
                *heading = back.y.atan2(back.x);
            }
            enemy.vel = from_angle(*heading) * enemy.speed;
        }
    }

    enemy.pos += enemy.vel * dt;
    enemy.pos = ctx.arena.clamp_circle(enemy.pos, enemy.radius);
    command
}

/// Advance one boss: approach to stand-off range, then attack on cooldown
pub fn drive_boss(boss: &mut Boss, dt: f32, ctx: &AdvanceContext) -> AiCommand {
    let stats = ctx.tuning.bosses.stats(boss.kind);
    let dir = direction_to(boss.pos, ctx.player_pos);
    let gap = boss.pos.distance(ctx.player_pos) - stats.stand_off;

    if gap > 0.0 {
        boss.pos += dir * (boss.speed * dt).min(gap);
    }
    boss.pos = ctx.arena.clamp_circle(boss.pos, boss.radius);

    boss.attack_cooldown -= dt;
    if boss.attack_cooldown > 0.0 {
        return AiCommand::None;
    }
    boss.attack_cooldown = stats.attack_interval;

    match boss.kind {
        BossKind::Juggernaut => AiCommand::Volley {
            origin: boss.pos,
            count: stats.attack_count,
            speed: stats.projectile_speed,
            dps: stats.projectile_dps,
        },
        BossKind::Sentinel if dir != Vec2::ZERO => AiCommand::Fire {
            origin: boss.pos,
            dir,
            speed: stats.projectile_speed,
            dps: stats.projectile_dps,
            owner: ProjectileOwner::Boss,
        },
        BossKind::Sentinel => AiCommand::None,
        BossKind::HiveQueen => AiCommand::Reinforce {
            origin: boss.pos,
            count: stats.attack_count,
        },
    }
}
