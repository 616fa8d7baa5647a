//! Simulation step
//!
//! One call advances the world by a clamped dt in a fixed phase order:
//! player, projectiles and pickups, collisions, AI, spawning, progression,
//! compaction.

use glam::Vec2;

use super::ai::AiCommand;
use super::collision;
use super::entity::{AdvanceContext, Projectile, ProjectileOwner};
use super::geometry::{direction_to, from_angle};
use super::spawn;
use super::state::{GameEvent, GamePhase, GameState};
use crate::consts::{DEFAULT_MAX_STEP, HOSTILE_PROJECTILE_LIFETIME, HOSTILE_PROJECTILE_RADIUS};
use crate::progression;

/// Directional keys held this tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveIntent {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl MoveIntent {
    /// Unit movement direction (screen coordinates, +y is down)
    pub fn direction(&self) -> Vec2 {
        let x = f32::from(u8::from(self.right)) - f32::from(u8::from(self.left));
        let y = f32::from(u8::from(self.down)) - f32::from(u8::from(self.up));
        Vec2::new(x, y).normalize_or_zero()
    }

    /// Nearest 8-way intent for a desired direction
    pub fn toward(dir: Vec2) -> Self {
        const DEAD_ZONE: f32 = 0.35;
        Self {
            up: dir.y < -DEAD_ZONE,
            down: dir.y > DEAD_ZONE,
            left: dir.x < -DEAD_ZONE,
            right: dir.x > DEAD_ZONE,
        }
    }
}

/// Input snapshot for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub movement: MoveIntent,
    /// Aim target in arena coordinates
    pub aim: Vec2,
    pub fire: bool,
    /// Pause toggle
    pub pause: bool,
}

/// Advance the game state by one step
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    // Handle pause toggle
    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                return;
            }
            GamePhase::Paused => state.phase = GamePhase::Playing,
            GamePhase::Defeated => {}
        }
    }

    // Don't tick if paused or defeated
    if state.phase != GamePhase::Playing {
        return;
    }

    let max_step = if state.max_step > 0.0 && state.max_step.is_finite() {
        state.max_step
    } else {
        DEFAULT_MAX_STEP
    };
    let dt = if dt.is_finite() { dt.clamp(0.0, max_step) } else { 0.0 };
    state.time_ticks += 1;
    state.elapsed += dt;

    // Player
    state.player.advance(dt, &input.movement, &state.arena);
    if input.fire {
        fire_player_shot(state, input.aim);
    }

    // Projectiles and pickups
    let hostiles = state.hostile_positions();
    {
        let ctx = AdvanceContext {
            player_pos: state.player.pos,
            player_radius: state.player.radius,
            elapsed: state.elapsed,
            arena: state.arena,
            hostiles: &hostiles,
            tuning: &state.tuning,
        };
        for projectile in state.projectiles.iter_mut() {
            projectile.advance(dt, &ctx);
        }
        for pickup in state.pickups.iter_mut() {
            pickup.advance(dt, &ctx);
        }
    }

    collision::resolve(state, dt);

    // AI
    let mut commands = Vec::new();
    {
        let ctx = AdvanceContext {
            player_pos: state.player.pos,
            player_radius: state.player.radius,
            elapsed: state.elapsed,
            arena: state.arena,
            hostiles: &[],
            tuning: &state.tuning,
        };
        for enemy in state.enemies.iter_mut().filter(|e| !e.is_expired()) {
            commands.push(enemy.advance(dt, &ctx, &mut state.rng));
        }
        for boss in state.bosses.iter_mut().filter(|b| !b.is_expired()) {
            commands.push(boss.advance(dt, &ctx));
        }
    }
    for command in commands {
        apply_command(state, command);
    }

    spawn::update(state, dt);

    update_progression(state, dt);

    state.compact();
}

fn fire_player_shot(state: &mut GameState, aim: Vec2) {
    let Some(dir) = state.player.try_fire(aim) else {
        return;
    };
    let headings = if state.player.abilities.double_shot {
        let spread = state.tuning.player.double_shot_spread;
        vec![Vec2::from_angle(-spread).rotate(dir), Vec2::from_angle(spread).rotate(dir)]
    } else {
        vec![dir]
    };
    for heading in headings {
        let id = state.next_entity_id();
        let player = &state.player;
        let base = &state.tuning.player;
        let mut shot = Projectile::new(
            id,
            player.pos,
            heading * player.stats.projectile_speed,
            base.projectile_radius,
            player.stats.damage,
            base.projectile_lifetime,
            ProjectileOwner::Player,
        );
        shot.piercing = player.abilities.piercing;
        shot.pierce = player.stats.pierce;
        shot.explosive = player.abilities.explosive;
        shot.homing = player.abilities.homing;
        state.projectiles.push(shot);
    }
}

fn spawn_hostile_shot(state: &mut GameState, origin: Vec2, vel: Vec2, dps: f32, owner: ProjectileOwner) {
    let id = state.next_entity_id();
    state.projectiles.push(Projectile::new(
        id,
        origin,
        vel,
        HOSTILE_PROJECTILE_RADIUS,
        dps,
        HOSTILE_PROJECTILE_LIFETIME,
        owner,
    ));
}

fn apply_command(state: &mut GameState, command: AiCommand) {
    match command {
        AiCommand::None => {}
        AiCommand::Fire {
            origin,
            dir,
            speed,
            dps,
            owner,
        } => spawn_hostile_shot(state, origin, dir * speed, dps, owner),
        AiCommand::Volley {
            origin,
            count,
            speed,
            dps,
        } => {
            for i in 0..count {
                let angle = std::f32::consts::TAU * i as f32 / count as f32;
                spawn_hostile_shot(state, origin, from_angle(angle) * speed, dps, ProjectileOwner::Boss);
            }
        }
        AiCommand::Reinforce { origin, count } => spawn::reinforce(state, origin, count),
    }
}

fn update_progression(state: &mut GameState, dt: f32) {
    if progression::level_up(&mut state.player, &state.tuning.progression) {
        log::info!("Level up: {}", state.player.level);
        state.events.push(GameEvent::LevelUp {
            level: state.player.level,
        });
    }

    if !state.player.is_defeated() {
        let player = &mut state.player;
        if player.stats.regen > 0.0 {
            player.heal(player.stats.regen * dt);
        }
        player.recharge_shield(dt, state.tuning.player.shield_capacity);
    }

    state.refresh_player();

    if state.player.is_defeated() {
        state.phase = GamePhase::Defeated;
        log::info!(
            "Player defeated after {:.1}s with score {}",
            state.elapsed,
            state.player.score
        );
        state.events.push(GameEvent::PlayerDefeated);
    }
}

/// Demo-mode input: kite the nearest threat, grab pickups when safe, shoot
/// at whatever is closest
pub fn autopilot(state: &GameState) -> TickInput {
    let pos = state.player.pos;
    let nearest = state
        .hostile_positions()
        .into_iter()
        .min_by(|a, b| a.distance_squared(pos).total_cmp(&b.distance_squared(pos)));

    let danger = nearest.filter(|t| t.distance(pos) < 220.0);
    let pickup = state
        .pickups
        .iter()
        .filter(|p| !p.is_expired())
        .min_by(|a, b| a.pos.distance_squared(pos).total_cmp(&b.pos.distance_squared(pos)))
        .map(|p| p.pos);

    let desired = if let Some(threat) = danger {
        // Back away with a sideways drift so we don't pin ourselves to a wall
        let away = direction_to(threat, pos);
        let time_factor = state.time_ticks as f32 * 0.01;
        let side = Vec2::new(-away.y, away.x) * time_factor.sin();
        let center_pull = direction_to(pos, state.arena.center()) * 0.5;
        away + side + center_pull
    } else if let Some(target) = pickup {
        direction_to(pos, target)
    } else {
        direction_to(pos, state.arena.center()) * 0.5
    };

    TickInput {
        movement: MoveIntent::toward(desired.normalize_or_zero()),
        aim: nearest.unwrap_or(pos),
        fire: nearest.is_some(),
        pause: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::{Enemy, EnemyBehavior};
    use crate::sim::geometry::Arena;
    use crate::tuning::{EnemyStats, SpawnTuning, Tuning};
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 30.0;

    fn quiet_tuning() -> Tuning {
        Tuning {
            spawn: SpawnTuning {
                enabled: false,
                drop_chance: 0.0,
                ..SpawnTuning::default()
            },
            ..Tuning::default()
        }
    }

    #[test]
    fn test_chaser_scenario_end_to_end() {
        let mut tuning = quiet_tuning();
        tuning.player.damage = 20.0;
        let mut state = GameState::new(12345, Arena::default(), tuning);
        state.player.pos = Vec2::new(400.0, 300.0);
        assert_eq!(state.player.health, 100.0);

        let stats = EnemyStats {
            health: 20.0,
            speed: 2.0,
            ..state.tuning.enemies.chaser.clone()
        };
        let id = state.next_entity_id();
        state.enemies.push(Enemy::new(id, EnemyBehavior::Chaser, Vec2::new(0.0, 300.0), &stats, 1.0));

        // Approach is monotonic until contact
        let reach = state.player.radius + stats.radius;
        let idle = TickInput::default();
        let mut last = f32::MAX;
        let mut steps = 0;
        while state.enemies[0].pos.distance(state.player.pos) >= reach {
            tick(&mut state, &idle, DT);
            let dist = state.enemies[0].pos.distance(state.player.pos);
            assert!(dist < last);
            last = dist;
            steps += 1;
            assert!(steps < 20_000, "chaser never arrived");
        }

        // Contact damage is continuous, not a lump sum
        for _ in 0..3 {
            let before = state.player.health;
            tick(&mut state, &idle, DT);
            let expected = stats.contact_dps * DT;
            assert!((before - state.player.health - expected).abs() < 1e-3);
        }

        // One shot kills it and pays out once
        let fire = TickInput {
            aim: state.enemies[0].pos,
            fire: true,
            ..Default::default()
        };
        tick(&mut state, &fire, DT);
        for _ in 0..10 {
            if state.enemies.is_empty() {
                break;
            }
            tick(&mut state, &idle, DT);
        }
        assert!(state.enemies.is_empty());
        assert_eq!(state.kills, 1);
        assert_eq!(state.player.xp, stats.xp);
        assert!(state.projectiles.is_empty());
    }

    #[test]
    fn test_tick_pause() {
        let mut state = GameState::new(12345, Arena::default(), quiet_tuning());

        let input = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut state, &input, DT);
        assert_eq!(state.phase, GamePhase::Paused);

        // Paused steps do nothing
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.time_ticks, 0);

        // Unpause
        tick(&mut state, &input, DT);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.time_ticks, 1);
    }

    #[test]
    fn test_dt_is_clamped() {
        let mut state = GameState::new(1, Arena::default(), quiet_tuning());
        tick(&mut state, &TickInput::default(), 5.0);
        assert!((state.elapsed - state.max_step).abs() < 1e-6);
        tick(&mut state, &TickInput::default(), -1.0);
        assert!((state.elapsed - state.max_step).abs() < 1e-6);
        tick(&mut state, &TickInput::default(), f32::NAN);
        assert!(state.elapsed.is_finite());
    }

    #[test]
    fn test_unusable_max_step_falls_back() {
        for bad in [-1.0, 0.0, f32::NAN, f32::INFINITY] {
            let mut state = GameState::new(1, Arena::default(), quiet_tuning());
            state.max_step = bad;
            tick(&mut state, &TickInput::default(), 1.0 / 60.0);
            assert!((state.elapsed - 1.0 / 60.0).abs() < 1e-6);
            tick(&mut state, &TickInput::default(), 1.0);
            assert!((state.elapsed - (1.0 / 60.0 + DEFAULT_MAX_STEP)).abs() < 1e-6);
        }
    }

    #[test]
    fn test_defeat_happens_once() {
        let mut state = GameState::new(1, Arena::default(), quiet_tuning());
        state.player.health = 0.1;
        let id = state.next_entity_id();
        let pos = state.player.pos;
        let stats = state.tuning.enemies.tank.clone();
        state.enemies.push(Enemy::new(id, EnemyBehavior::Tank, pos, &stats, 1.0));

        for _ in 0..5 {
            tick(&mut state, &TickInput::default(), DT);
        }
        assert_eq!(state.phase, GamePhase::Defeated);
        assert_eq!(state.player.health, 0.0);
        let defeats = state
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::PlayerDefeated))
            .count();
        assert_eq!(defeats, 1);

        // Pause cannot revive a defeated run
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut state, &pause, DT);
        assert_eq!(state.phase, GamePhase::Defeated);
    }

    #[test]
    fn test_regeneration_heals() {
        let mut state = GameState::new(1, Arena::default(), quiet_tuning());
        state
            .player
            .upgrades
            .insert(crate::progression::UpgradeId::Regeneration, 1);
        state.refresh_player();
        state.player.health = 50.0;
        for _ in 0..30 {
            tick(&mut state, &TickInput::default(), DT);
        }
        assert!(state.player.health > 50.0);
    }

    #[test]
    fn test_double_shot_fires_spread_pair() {
        let mut state = GameState::new(1, Arena::default(), quiet_tuning());
        state.player.core.extend([
            crate::progression::CoreUpgradeId::PierceI,
            crate::progression::CoreUpgradeId::DoubleShot,
            crate::progression::CoreUpgradeId::Explosive,
        ]);
        state.refresh_player();
        let input = TickInput {
            fire: true,
            aim: state.player.pos + Vec2::new(300.0, 0.0),
            ..Default::default()
        };
        tick(&mut state, &input, DT);

        assert_eq!(state.projectiles.len(), 2);
        let spread = state.tuning.player.double_shot_spread;
        for shot in &state.projectiles {
            assert_eq!(shot.pierce, 1);
            assert!(shot.explosive);
            assert!((shot.vel.y.atan2(shot.vel.x).abs() - spread).abs() < 1e-4);
        }
        assert!(state.projectiles[0].vel.y * state.projectiles[1].vel.y < 0.0);
    }

    #[test]
    fn test_core_shield_recharges_in_tick() {
        let mut state = GameState::new(1, Arena::default(), quiet_tuning());
        state.player.core.insert(crate::progression::CoreUpgradeId::ShieldRegen);
        state.refresh_player();
        for _ in 0..30 {
            tick(&mut state, &TickInput::default(), DT);
        }
        assert!((state.player.shield - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_level_up_event() {
        let mut state = GameState::new(1, Arena::default(), quiet_tuning());
        state.player.xp = 100;
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.player.level, 2);
        assert_eq!(state.player.xp, 0);
        assert!(state.events.contains(&GameEvent::LevelUp { level: 2 }));
    }

    #[test]
    fn test_determinism() {
        // Two states with same seed should produce identical results
        let mut state1 = GameState::new(99999, Arena::default(), Tuning::default());
        let mut state2 = GameState::new(99999, Arena::default(), Tuning::default());

        for _ in 0..600 {
            let input1 = autopilot(&state1);
            let input2 = autopilot(&state2);
            tick(&mut state1, &input1, 1.0 / 60.0);
            tick(&mut state2, &input2, 1.0 / 60.0);
        }

        assert_eq!(state1.time_ticks, state2.time_ticks);
        assert_eq!(state1.enemies.len(), state2.enemies.len());
        assert_eq!(state1.player.pos, state2.player.pos);
        assert_eq!(state1.player.score, state2.player.score);
    }

    #[test]
    fn test_autopilot_shoots_nearest() {
        let mut state = GameState::new(1, Arena::default(), quiet_tuning());
        let id = state.next_entity_id();
        let target = Vec2::new(100.0, 100.0);
        let stats = state.tuning.enemies.chaser.clone();
        state.enemies.push(Enemy::new(id, EnemyBehavior::Chaser, target, &stats, 1.0));
        let input = autopilot(&state);
        assert!(input.fire);
        assert_eq!(input.aim, target);
    }

    #[test]
    fn test_move_intent_direction() {
        let intent = MoveIntent {
            up: true,
            right: true,
            ..Default::default()
        };
        let dir = intent.direction();
        assert!((dir.length() - 1.0).abs() < 1e-6);
        assert!(dir.x > 0.0 && dir.y < 0.0);
        let cancelled = MoveIntent {
            left: true,
            right: true,
            ..Default::default()
        };
        assert_eq!(cancelled.direction(), Vec2::ZERO);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_entities_stay_in_bounds(seed in any::<u64>(), moves in prop::collection::vec(0u8..16, 1..200)) {
            let mut state = GameState::new(seed, Arena::default(), Tuning::default());
            for bits in moves {
                let input = TickInput {
                    movement: MoveIntent {
                        up: bits & 1 != 0,
                        down: bits & 2 != 0,
                        left: bits & 4 != 0,
                        right: bits & 8 != 0,
                    },
                    aim: state.arena.center(),
                    fire: true,
                    pause: false,
                };
                tick(&mut state, &input, 1.0 / 60.0);

                let arena = state.arena;
                let p = &state.player;
                prop_assert!(p.pos.x >= p.radius && p.pos.x <= arena.width - p.radius);
                prop_assert!(p.pos.y >= p.radius && p.pos.y <= arena.height - p.radius);
                prop_assert!(p.health >= 0.0 && p.health <= p.max_health());
                for e in &state.enemies {
                    prop_assert!(arena.contains(e.pos, 0.0));
                    prop_assert!(e.health >= 0.0);
                }
                prop_assert!(state.live_enemies() <= state.tuning.spawn.max_enemies);
            }
        }
    }
}
