//! Host-facing game session
//!
//! Owns the running `GameState`, the durable `SaveState`, and the autosaver.
//! A host calls [`Session::frame`] once per display frame with the wall-clock
//! time since the last frame and the current input, then draws the returned
//! snapshots.

use crate::persistence::{AutoSaver, BoxedStore, SaveState};
use crate::platform;
use crate::progression::{self, CoreUpgradeId, PerkId, ProgressionError, SkillId, UpgradeId};
use crate::settings::Settings;
use crate::sim::{GameEvent, GamePhase, GameState, TickInput, tick};
use crate::snapshot::{HudSnapshot, RenderSnapshot};

/// Result of a finished run
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub score: u64,
    pub best_score: u64,
    pub new_best: bool,
    pub level: u32,
    pub kills: u32,
    /// Seconds survived
    pub elapsed: f32,
    /// Currency banked for the upgrade shop
    pub currency: u64,
    pub prestige_count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameStatus {
    Running,
    Ended(SessionSummary),
}

/// Output of one frame
#[derive(Debug, Clone)]
pub struct Frame {
    pub render: RenderSnapshot,
    pub hud: HudSnapshot,
    pub events: Vec<GameEvent>,
    pub status: FrameStatus,
}

pub struct Session {
    settings: Settings,
    state: GameState,
    save: SaveState,
    saver: AutoSaver,
    autosave_timer: f32,
    /// Best score before this run began
    best_at_start: u64,
    summary: Option<SessionSummary>,
}

impl Session {
    /// Load progress once and begin a run
    pub fn start(settings: Settings, store: BoxedStore) -> Self {
        let settings = settings.sanitized();
        let save = match store.load() {
            Ok(Some(save)) => {
                log::info!(
                    "Loaded save: best score {}, prestige {}",
                    save.best_score,
                    save.prestige_count
                );
                save
            }
            Ok(None) => {
                log::info!("No save found, starting fresh");
                SaveState::default()
            }
            Err(e) => {
                log::warn!("Could not read save, starting fresh: {}", e);
                SaveState::default()
            }
        };
        let state = Self::new_run(&settings, &save);
        Self {
            best_at_start: save.best_score,
            settings,
            state,
            save,
            saver: AutoSaver::spawn(store),
            autosave_timer: 0.0,
            summary: None,
        }
    }

    fn new_run(settings: &Settings, save: &SaveState) -> GameState {
        let seed = platform::run_seed(settings);
        let mut state = GameState::new(seed, settings.arena(), settings.tuning.clone());
        state.max_step = settings.max_step;
        state.apply_progress(save);
        log::info!("Run started with seed: {}", seed);
        state
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Direct access for scripted scenarios
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn save_state(&self) -> &SaveState {
        &self.save
    }

    pub fn is_ended(&self) -> bool {
        self.summary.is_some()
    }

    /// Advance by `elapsed` wall-clock seconds (clamped) and snapshot
    pub fn frame(&mut self, elapsed: f32, input: &TickInput) -> Frame {
        if self.summary.is_none() {
            let dt = if elapsed.is_finite() {
                elapsed.clamp(0.0, self.settings.max_step)
            } else {
                0.0
            };
            tick(&mut self.state, input, dt);

            if self.state.phase == GamePhase::Playing {
                self.autosave_timer += dt;
                if self.autosave_timer >= self.settings.autosave_interval {
                    self.autosave_timer = 0.0;
                    self.persist();
                }
            }
            if self.state.phase == GamePhase::Defeated {
                self.finish();
            }
        }

        let status = match &self.summary {
            Some(summary) => FrameStatus::Ended(summary.clone()),
            None => FrameStatus::Running,
        };
        Frame {
            render: RenderSnapshot::capture(&self.state),
            hud: HudSnapshot::capture(&self.state),
            events: self.state.drain_events(),
            status,
        }
    }

    /// Buy the next permanent level of an upgrade
    pub fn purchase(&mut self, id: UpgradeId) -> Result<u64, ProgressionError> {
        let cost = progression::purchase(&mut self.state.player, &mut self.save.upgrades, id)?;
        self.state.refresh_player();
        self.persist();
        Ok(cost)
    }

    /// Buy a core tree node with boss shards
    pub fn purchase_core(&mut self, id: CoreUpgradeId) -> Result<u64, ProgressionError> {
        let cost = progression::purchase_core(&mut self.state.player, id)?;
        self.state.refresh_player();
        self.persist();
        Ok(cost)
    }

    /// Buy a prestige shop perk with prestige points
    pub fn purchase_perk(&mut self, id: PerkId) -> Result<u32, ProgressionError> {
        let state = &mut self.state;
        let cost = progression::purchase_perk(&mut state.player, &mut state.prestige.points, id)?;
        state.refresh_player();
        self.persist();
        Ok(cost)
    }

    /// Spend a skill point. Skills last until the run ends or prestiges.
    pub fn purchase_skill(&mut self, id: SkillId) -> Result<u32, ProgressionError> {
        let level = progression::purchase_skill(&mut self.state.player, id)?;
        self.state.refresh_player();
        Ok(level)
    }

    /// Trade the current run's score for a permanent multiplier
    pub fn prestige(&mut self) -> Result<u32, ProgressionError> {
        let score = self.state.player.score;
        let count = progression::prestige(
            &mut self.state.player,
            &mut self.state.prestige,
            &self.state.tuning.player,
            &self.state.tuning.progression,
        )?;
        self.save.record_score(score);
        self.persist();
        Ok(count)
    }

    /// End the run on request
    pub fn stop(&mut self) -> SessionSummary {
        self.finish()
    }

    /// Begin a fresh run with the current permanent progress
    pub fn restart(&mut self) {
        self.sync_save();
        self.state = Self::new_run(&self.settings, &self.save);
        self.best_at_start = self.save.best_score;
        self.autosave_timer = 0.0;
        self.summary = None;
    }

    fn sync_save(&mut self) {
        let player = &self.state.player;
        self.save.total_currency = player.currency;
        self.save.core_shards = player.core_shards;
        self.save.core_upgrades.clone_from(&player.core);
        self.save.prestige_shop.clone_from(&player.perks);
        self.save.prestige_count = self.state.prestige.count;
        self.save.prestige_points = self.state.prestige.points;
        self.save.record_score(self.state.player.score);
    }

    fn persist(&mut self) {
        self.sync_save();
        self.saver.submit(self.save.clone());
    }

    fn finish(&mut self) -> SessionSummary {
        if let Some(summary) = &self.summary {
            return summary.clone();
        }
        self.persist();
        let player = &self.state.player;
        let summary = SessionSummary {
            score: player.score,
            best_score: self.save.best_score,
            new_best: player.score > self.best_at_start,
            level: player.level,
            kills: self.state.kills,
            elapsed: self.state.elapsed,
            currency: player.currency,
            prestige_count: self.state.prestige.count,
        };
        log::info!(
            "Run ended: score {} (best {}), level {}, {} kills in {:.1}s",
            summary.score,
            summary.best_score,
            summary.level,
            summary.kills,
            summary.elapsed
        );
        self.summary = Some(summary.clone());
        summary
    }
}
