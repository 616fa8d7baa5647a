//! Spawn director: population control, boss milestones, and drops
//!
//! Every step the director tops the enemy count up to the floor, then runs
//! a periodic timer. Neither path ever pushes the live count past the
//! ceiling. Spawn points are sampled on the arena boundary away from the
//! player.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::entity::{Boss, BossKind, Enemy, EnemyBehavior, EnemyKind, EntityId, Pickup};
use super::geometry::{Arena, from_angle};
use super::state::{GameEvent, GameState};
use crate::progression::UpgradeId;
use crate::tuning::SpawnTuning;

/// Boundary samples tried before falling back to the farthest corner
const SPAWN_ATTEMPTS: usize = 16;

/// How far from a Hive Queen its reinforcements appear
const REINFORCE_SCATTER: f32 = 40.0;

/// Timers and difficulty carried across steps
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnDirector {
    /// Seconds until the next periodic spawn
    pub timer: f32,
    /// Seconds accumulated toward the next boss milestone
    pub boss_timer: f32,
    /// Enemy health multiplier from bosses defeated
    pub difficulty: f32,
    pub bosses_defeated: u32,
}

impl SpawnDirector {
    pub fn new(tuning: &SpawnTuning) -> Self {
        Self {
            timer: tuning.base_interval,
            boss_timer: 0.0,
            difficulty: 1.0,
            bosses_defeated: 0,
        }
    }

    /// Current periodic spawn interval
    pub fn interval(elapsed: f32, tuning: &SpawnTuning) -> f32 {
        (tuning.base_interval - elapsed * tuning.interval_decay).max(tuning.min_interval)
    }

    /// Health multiplier for enemies spawned now
    pub fn health_scale(&self, elapsed: f32, tuning: &SpawnTuning) -> f32 {
        let growth = if tuning.health_growth_period > 0.0 {
            elapsed / tuning.health_growth_period
        } else {
            0.0
        };
        self.difficulty * (1.0 + growth)
    }

    pub fn on_boss_defeated(&mut self, tuning: &SpawnTuning) {
        self.bosses_defeated += 1;
        self.difficulty *= tuning.post_boss_scaling;
    }
}

/// Run the director for one step
pub fn update(state: &mut GameState, dt: f32) {
    if !state.tuning.spawn.enabled {
        return;
    }
    let floor = state.tuning.spawn.min_enemies.min(state.tuning.spawn.max_enemies);
    let ceiling = state.tuning.spawn.max_enemies;

    let missing = floor.saturating_sub(state.live_enemies());
    for _ in 0..missing {
        if spawn_random_enemy(state).is_none() {
            break;
        }
    }

    state.director.timer -= dt;
    if state.director.timer <= 0.0 && state.live_enemies() < ceiling {
        state.director.timer = SpawnDirector::interval(state.elapsed, &state.tuning.spawn);
        spawn_random_enemy(state);
    }

    // The milestone only counts while a boss slot is free, and holds once reached
    let boss_interval = state.tuning.spawn.boss_interval;
    let slot_free = state.live_bosses() < state.tuning.spawn.max_bosses;
    if slot_free {
        state.director.boss_timer = (state.director.boss_timer + dt).min(boss_interval);
    }
    if slot_free
        && state.director.boss_timer >= boss_interval
        && let Some(kind) = pick_boss_kind(state)
        && spawn_boss(state, kind).is_some()
    {
        state.director.boss_timer = 0.0;
    }
}

/// Uniform point on the arena boundary at least `exclusion` from `avoid`
///
/// Falls back to the corner farthest from `avoid` after a bounded number of
/// rejected samples. `None` when even that corner is too close.
pub fn spawn_point(rng: &mut Pcg32, arena: &Arena, avoid: Vec2, exclusion: f32) -> Option<Vec2> {
    for _ in 0..SPAWN_ATTEMPTS {
        let t = rng.random::<f32>() * arena.perimeter();
        let point = arena.boundary_point(t);
        if point.distance(avoid) >= exclusion {
            return Some(point);
        }
    }
    Some(arena.farthest_corner(avoid)).filter(|corner| corner.distance(avoid) >= exclusion)
}

/// Relative spawn weights at `elapsed` seconds; tougher types ramp up
pub fn kind_weights(elapsed: f32) -> [(EnemyKind, f32); 6] {
    [
        (EnemyKind::Chaser, 0.45),
        (EnemyKind::Shooter, 0.20 + (elapsed / 600.0).min(0.25)),
        (EnemyKind::Dasher, 0.12 + (elapsed / 500.0).min(0.18)),
        (EnemyKind::Tank, 0.08 + (elapsed / 700.0).min(0.12)),
        (EnemyKind::Orbiter, 0.10),
        (EnemyKind::Splitter, 0.05),
    ]
}

pub fn pick_kind(rng: &mut Pcg32, elapsed: f32) -> EnemyKind {
    let weights = kind_weights(elapsed);
    let total: f32 = weights.iter().map(|(_, w)| w).sum();
    let mut roll = rng.random::<f32>() * total;
    for (kind, weight) in weights {
        if roll < weight {
            return kind;
        }
        roll -= weight;
    }
    EnemyKind::Splitter
}

fn spawn_random_enemy(state: &mut GameState) -> Option<EntityId> {
    let kind = pick_kind(&mut state.rng, state.elapsed);
    let pos = spawn_point(
        &mut state.rng,
        &state.arena,
        state.player.pos,
        state.tuning.spawn.exclusion_radius,
    )?;
    Some(spawn_enemy(state, kind, pos))
}

/// Create an enemy of `kind` at `pos` with the current health scaling
pub fn spawn_enemy(state: &mut GameState, kind: EnemyKind, pos: Vec2) -> EntityId {
    let id = state.next_entity_id();
    let behavior = EnemyBehavior::initial(kind, pos, &state.tuning.enemies, &mut state.rng);
    let scale = state.director.health_scale(state.elapsed, &state.tuning.spawn);
    let enemy = Enemy::new(id, behavior, pos, state.tuning.enemies.stats(kind), scale);
    state.enemies.push(enemy);
    id
}

/// Fragments left by a dead splitter, up to the ceiling
pub fn split(state: &mut GameState, pos: Vec2) {
    let count = state.tuning.enemies.split_count as usize;
    let room = state.tuning.spawn.max_enemies.saturating_sub(state.live_enemies());
    let scale = state.director.health_scale(state.elapsed, &state.tuning.spawn);
    for _ in 0..count.min(room) {
        let id = state.next_entity_id();
        let child = Enemy::new(id, EnemyBehavior::Chaser, pos, &state.tuning.enemies.splitter_child, scale);
        state.enemies.push(child);
    }
}

/// Chasers summoned by a boss, up to the ceiling and outside the exclusion radius
pub fn reinforce(state: &mut GameState, origin: Vec2, count: u32) {
    let room = state.tuning.spawn.max_enemies.saturating_sub(state.live_enemies());
    let exclusion = state.tuning.spawn.exclusion_radius;
    for _ in 0..(count as usize).min(room) {
        let angle = state.rng.random_range(0.0..std::f32::consts::TAU);
        let scattered = state.arena.clamp_circle(origin + from_angle(angle) * REINFORCE_SCATTER, 0.0);
        let pos = if scattered.distance(state.player.pos) >= exclusion {
            Some(scattered)
        } else {
            spawn_point(&mut state.rng, &state.arena, state.player.pos, exclusion)
        };
        if let Some(pos) = pos {
            spawn_enemy(state, EnemyKind::Chaser, pos);
        }
    }
}

fn pick_boss_kind(state: &mut GameState) -> Option<BossKind> {
    let free: Vec<BossKind> = BossKind::ALL
        .into_iter()
        .filter(|kind| !state.bosses.iter().any(|b| !b.is_expired() && b.kind == *kind))
        .collect();
    if free.is_empty() {
        return None;
    }
    Some(free[state.rng.random_range(0..free.len())])
}

fn spawn_boss(state: &mut GameState, kind: BossKind) -> Option<EntityId> {
    let pos = spawn_point(
        &mut state.rng,
        &state.arena,
        state.player.pos,
        state.tuning.spawn.exclusion_radius,
    )?;
    let id = state.next_entity_id();
    let stats = state.tuning.bosses.stats(kind);
    let health = (stats.health + state.elapsed * state.tuning.bosses.health_per_second) * state.director.difficulty;
    let boss = Boss::new(id, kind, pos, stats, health);
    log::info!("Boss {} spawned with {:.0} health", kind.name(), health);
    state.bosses.push(boss);
    state.events.push(GameEvent::BossSpawned { id, kind });
    Some(id)
}

/// Roll for an upgrade drop at `pos`
pub fn roll_drop(state: &mut GameState, pos: Vec2) {
    let chance = state.tuning.spawn.drop_chance.clamp(0.0, 1.0);
    if !state.rng.random_bool(f64::from(chance)) {
        return;
    }
    let upgrade = UpgradeId::ALL[state.rng.random_range(0..UpgradeId::ALL.len())];
    let id = state.next_entity_id();
    let spawn = &state.tuning.spawn;
    state
        .pickups
        .push(Pickup::new(id, pos, upgrade, spawn.pickup_radius, spawn.pickup_lifetime));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn state_with(spawn: SpawnTuning) -> GameState {
        let tuning = Tuning {
            spawn,
            ..Tuning::default()
        };
        GameState::new(42, Arena::default(), tuning)
    }

    #[test]
    fn test_floor_tops_up_immediately() {
        let mut state = state_with(SpawnTuning::default());
        assert!(state.enemies.is_empty());
        update(&mut state, 0.0);
        assert_eq!(state.enemies.len(), state.tuning.spawn.min_enemies);
    }

    #[test]
    fn test_ceiling_never_exceeded() {
        let mut state = state_with(SpawnTuning {
            min_enemies: 2,
            max_enemies: 5,
            base_interval: 0.1,
            min_interval: 0.1,
            ..SpawnTuning::default()
        });
        for _ in 0..600 {
            state.elapsed += 1.0 / 60.0;
            update(&mut state, 1.0 / 60.0);
            assert!(state.live_enemies() <= 5);
        }
        assert_eq!(state.live_enemies(), 5);
    }

    #[test]
    fn test_interval_shrinks_to_minimum() {
        let tuning = SpawnTuning::default();
        assert_eq!(SpawnDirector::interval(0.0, &tuning), tuning.base_interval);
        assert!(SpawnDirector::interval(60.0, &tuning) < tuning.base_interval);
        assert_eq!(SpawnDirector::interval(10_000.0, &tuning), tuning.min_interval);
    }

    #[test]
    fn test_spawn_point_fallback_respects_exclusion() {
        let mut rng = Pcg32::seed_from_u64(5);
        let arena = Arena::new(100.0, 100.0);
        let avoid = Vec2::new(10.0, 10.0);
        // Only a sliver near the far corner is far enough away
        let p = spawn_point(&mut rng, &arena, avoid, 120.0).unwrap();
        assert!(p.distance(avoid) >= 120.0);
    }

    #[test]
    fn test_spawn_point_none_when_boundary_too_close() {
        let mut rng = Pcg32::seed_from_u64(5);
        let arena = Arena::new(100.0, 100.0);
        assert_eq!(spawn_point(&mut rng, &arena, Vec2::new(10.0, 10.0), 1000.0), None);
    }

    #[test]
    fn test_small_arena_skips_spawns_near_player() {
        // Every boundary point is within the exclusion radius of the center
        let mut state = GameState::new(42, Arena::new(200.0, 200.0), Tuning::default());
        for _ in 0..120 {
            state.elapsed += 1.0 / 60.0;
            update(&mut state, 1.0 / 60.0);
        }
        let player = state.player.pos;
        reinforce(&mut state, player, 3);
        assert!(state.enemies.is_empty());
        assert!(state.bosses.is_empty());
    }

    #[test]
    fn test_boss_milestone_single_boss() {
        let mut state = state_with(SpawnTuning {
            min_enemies: 0,
            boss_interval: 1.0,
            ..SpawnTuning::default()
        });
        for _ in 0..300 {
            state.elapsed += 0.05;
            update(&mut state, 0.05);
        }
        assert_eq!(state.bosses.len(), 1);
        assert!(
            state
                .events
                .iter()
                .any(|e| matches!(e, GameEvent::BossSpawned { .. }))
        );
        // Nothing accrues while the slot is taken
        assert_eq!(state.director.boss_timer, 0.0);
    }

    #[test]
    fn test_next_boss_waits_a_full_interval() {
        let mut state = state_with(SpawnTuning {
            min_enemies: 0,
            max_enemies: 0,
            boss_interval: 1.0,
            ..SpawnTuning::default()
        });
        for _ in 0..100 {
            update(&mut state, 0.05);
        }
        assert_eq!(state.live_bosses(), 1);

        state.bosses[0].health = 0.0;
        for _ in 0..10 {
            update(&mut state, 0.05);
        }
        assert_eq!(state.live_bosses(), 0);

        for _ in 0..15 {
            update(&mut state, 0.05);
        }
        assert_eq!(state.live_bosses(), 1);
    }

    #[test]
    fn test_reinforcements_stay_out_of_exclusion() {
        let mut state = state_with(SpawnTuning {
            min_enemies: 0,
            ..SpawnTuning::default()
        });
        let player = state.player.pos;
        let exclusion = state.tuning.spawn.exclusion_radius;
        reinforce(&mut state, player, 4);
        assert_eq!(state.enemies.len(), 4);
        assert!(state.enemies.iter().all(|e| e.pos.distance(player) >= exclusion));
    }

    #[test]
    fn test_reinforcements_respect_ceiling() {
        let mut state = state_with(SpawnTuning {
            min_enemies: 0,
            max_enemies: 2,
            ..SpawnTuning::default()
        });
        let origin = Vec2::new(100.0, 100.0);
        reinforce(&mut state, origin, 5);
        assert_eq!(state.enemies.len(), 2);
        assert!(state.enemies.iter().all(|e| e.kind() == EnemyKind::Chaser));
    }

    #[test]
    fn test_split_spawns_weaker_chasers() {
        let mut state = state_with(SpawnTuning::default());
        split(&mut state, Vec2::new(300.0, 300.0));
        assert_eq!(state.enemies.len(), 2);
        for child in &state.enemies {
            assert_eq!(child.kind(), EnemyKind::Chaser);
            assert_eq!(child.pos, Vec2::new(300.0, 300.0));
            assert!(child.max_health < state.tuning.enemies.splitter.health);
        }
    }

    #[test]
    fn test_weights_shift_toward_tougher_types() {
        let early = kind_weights(0.0);
        let late = kind_weights(600.0);
        assert!(late[1].1 > early[1].1);
        assert!(late[3].1 > early[3].1);
        assert_eq!(late[0].1, early[0].1);
    }

    #[test]
    fn test_boss_defeat_scales_enemy_health() {
        let tuning = SpawnTuning::default();
        let mut director = SpawnDirector::new(&tuning);
        let before = director.health_scale(0.0, &tuning);
        director.on_boss_defeated(&tuning);
        assert!((director.health_scale(0.0, &tuning) - before * tuning.post_boss_scaling).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn prop_spawn_point_respects_exclusion(seed in any::<u64>(), x in 0f32..1200.0, y in 0f32..760.0) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let arena = Arena::default();
            let player = Vec2::new(x, y);
            let p = spawn_point(&mut rng, &arena, player, 160.0);
            prop_assert!(p.is_some_and(|p| p.distance(player) >= 160.0));
        }
    }
}
