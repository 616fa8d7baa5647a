//! Collision resolution
//!
//! All pairs are evaluated before anything is removed. A projectile whose
//! lifetime ran out this step still lands its hits, and an enemy killed by
//! several shots in one step is rewarded exactly once.

use glam::Vec2;
use rand::Rng;

use super::entity::{Enemy, EntityId, Projectile};
use super::geometry::circles_overlap;
use super::spawn;
use super::state::{GameEvent, GameState};
use crate::progression::{self, PickupOutcome};
use crate::sim::entity::EnemyKind;

/// Run every collision pass for one step, in order
pub fn resolve(state: &mut GameState, dt: f32) {
    player_shots(state);
    hostile_contact(state, dt);
    collect_pickups(state);
    resolve_deaths(state);
}

/// Record a hit: piercing shots continue, pierce charges are spent one per
/// target, anything else is consumed
fn land_hit(shot: &mut Projectile, target: EntityId) {
    if shot.piercing {
        shot.hits.push(target);
    } else if shot.pierce > 0 {
        shot.pierce -= 1;
        shot.hits.push(target);
    } else {
        shot.spent = true;
    }
}

/// Splash damage around an explosive hit, sparing the target struck directly
fn explode(enemies: &mut [Enemy], center: Vec2, radius: f32, damage: f32, struck: Option<EntityId>) {
    for enemy in enemies.iter_mut() {
        if Some(enemy.id) == struck || enemy.is_expired() || enemy.pos.distance(center) > radius + enemy.radius {
            continue;
        }
        enemy.take_damage(damage);
    }
}

/// Player projectiles against enemies, then bosses
fn player_shots(state: &mut GameState) {
    let GameState {
        projectiles,
        enemies,
        bosses,
        rng,
        player,
        tuning,
        ..
    } = state;
    let crit_chance = player.stats.crit_chance;
    let splash_radius = tuning.player.explosion_radius;
    let splash_ratio = tuning.player.explosion_damage_ratio;
    let mut roll_damage = |base: f32| {
        if crit_chance > 0.0 && rng.random::<f32>() < crit_chance {
            base * tuning.player.crit_multiplier
        } else {
            base
        }
    };

    for shot in projectiles.iter_mut().filter(|p| !p.is_hostile()) {
        for i in 0..enemies.len() {
            if shot.spent {
                break;
            }
            let enemy = &mut enemies[i];
            if shot.has_hit(enemy.id) || !circles_overlap(shot.pos, shot.radius, enemy.pos, enemy.radius) {
                continue;
            }
            let (id, pos) = (enemy.id, enemy.pos);
            enemy.take_damage(roll_damage(shot.damage));
            land_hit(shot, id);
            if shot.explosive {
                explode(enemies, pos, splash_radius, shot.damage * splash_ratio, Some(id));
            }
        }
        for boss in bosses.iter_mut() {
            if shot.spent {
                break;
            }
            if shot.has_hit(boss.id) || !circles_overlap(shot.pos, shot.radius, boss.pos, boss.radius) {
                continue;
            }
            boss.take_damage(roll_damage(shot.damage));
            land_hit(shot, boss.id);
            if shot.explosive {
                explode(enemies, boss.pos, splash_radius, shot.damage * splash_ratio, None);
            }
        }
    }
}

/// Continuous damage from hostile projectiles and bodies touching the player
fn hostile_contact(state: &mut GameState, dt: f32) {
    let (pos, radius) = (state.player.pos, state.player.radius);
    let touching = |p: Vec2, r: f32| circles_overlap(pos, radius, p, r);

    let shots: f32 = state
        .projectiles
        .iter()
        .filter(|p| p.is_hostile() && touching(p.pos, p.radius))
        .map(|p| p.damage)
        .sum();
    let bodies: f32 = state
        .enemies
        .iter()
        .filter(|e| !e.is_expired() && touching(e.pos, e.radius))
        .map(|e| e.contact_dps)
        .sum();
    let bosses: f32 = state
        .bosses
        .iter()
        .filter(|b| !b.is_expired() && touching(b.pos, b.radius))
        .map(|b| b.contact_dps)
        .sum();

    let dps = shots + bodies + bosses;
    if dps <= 0.0 {
        return;
    }
    // Evasion is rolled once per step against all incoming damage
    let evasion = state.player.stats.evasion;
    if evasion > 0.0 && state.rng.random::<f32>() < evasion {
        return;
    }
    state.player.take_damage(dps * dt);
}

fn collect_pickups(state: &mut GameState) {
    let mut stacked = false;
    for pickup in state.pickups.iter_mut().filter(|p| !p.collected) {
        if !circles_overlap(state.player.pos, state.player.radius, pickup.pos, pickup.radius) {
            continue;
        }
        pickup.collected = true;
        match progression::apply_pickup(&mut state.player, pickup.upgrade) {
            PickupOutcome::Stacked(level) => {
                log::debug!("Picked up {} (level {})", pickup.upgrade.name(), level);
                stacked = true;
            }
            PickupOutcome::AlreadyOwned | PickupOutcome::Maxed => {}
        }
        state.events.push(GameEvent::PickupCollected {
            upgrade: pickup.upgrade,
        });
    }
    if stacked {
        state.refresh_player();
    }
}

/// Award and clean up after everything that died this step
fn resolve_deaths(state: &mut GameState) {
    let dead: Vec<_> = state
        .enemies
        .iter()
        .filter(|e| e.is_expired())
        .map(|e| (e.id, e.kind(), e.pos, e.xp, e.currency))
        .collect();
    for (id, kind, pos, xp, currency) in dead {
        let credited = progression::award(&mut state.player, xp, currency);
        state.kills += 1;
        state.events.push(GameEvent::EnemyKilled {
            id,
            kind,
            currency: credited,
        });
        if kind == EnemyKind::Splitter {
            spawn::split(state, pos);
        }
        spawn::roll_drop(state, pos);
    }

    let dead: Vec<_> = state
        .bosses
        .iter()
        .filter(|b| b.is_expired())
        .map(|b| (b.id, b.kind, b.xp, b.currency, b.shards))
        .collect();
    for (id, kind, xp, currency, shards) in dead {
        let credited = progression::award(&mut state.player, xp, currency);
        let period = state.tuning.bosses.shard_bonus_period;
        let shards = progression::award_shards(&mut state.player, shards, state.elapsed, period);
        state.director.on_boss_defeated(&state.tuning.spawn);
        log::info!(
            "Boss {} defeated (+{} currency, +{} shards)",
            kind.name(),
            credited,
            shards
        );
        state.events.push(GameEvent::BossDefeated {
            id,
            kind,
            currency: credited,
            shards,
        });
    }
}
