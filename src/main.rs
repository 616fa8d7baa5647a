//! Astro Rogue headless runner
//!
//! Plays one run with the autopilot at a fixed 60 Hz frame step, logs the
//! HUD along the way, then spends what it banked: credits in the upgrade
//! shop, shards in the core tree, prestige points in the prestige shop.

#[cfg(not(target_arch = "wasm32"))]
const SETTINGS_PATH: &str = "astro_rogue_settings.json";

/// Simulated seconds before the runner stops the run itself
#[cfg(not(target_arch = "wasm32"))]
const RUN_LIMIT_SECS: f32 = 900.0;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use astro_rogue::consts::SIM_DT;
    use astro_rogue::progression::{self, CoreUpgradeId, PerkId, SkillId, UpgradeId};
    use astro_rogue::sim::{GameEvent, autopilot};
    use astro_rogue::{FrameStatus, Session, Settings, platform};

    platform::init_logging();
    log::info!("Astro Rogue (headless) starting...");

    let settings = Settings::load(SETTINGS_PATH);
    let store = platform::default_store(&settings);
    let mut session = Session::start(settings, store);

    let mut next_report = 10.0;
    let summary = loop {
        let input = autopilot(session.state());
        let frame = session.frame(SIM_DT, &input);

        for event in &frame.events {
            match event {
                GameEvent::PickupCollected { upgrade } => log::info!("Collected {}", upgrade.name()),
                GameEvent::BossDefeated { kind, shards, .. } => {
                    log::info!("{} down, {} core shards", kind.name(), shards)
                }
                GameEvent::LevelUp { .. } => {
                    // Spend skill points on the first skill that will take one
                    for id in SkillId::ALL {
                        if let Ok(level) = session.purchase_skill(id) {
                            log::info!("Skill {} now level {}", id.name(), level);
                            break;
                        }
                    }
                }
                _ => {}
            }
        }

        if let FrameStatus::Ended(summary) = frame.status {
            break summary;
        }

        let elapsed = session.state().elapsed;
        if elapsed >= next_report {
            next_report += 10.0;
            let hud = &frame.hud;
            log::info!(
                "t={:.0}s hp {:.0}/{:.0} shield {:.0} lvl {} xp {}/{} score {} currency {}{}",
                elapsed,
                hud.health,
                hud.max_health,
                hud.shield,
                hud.level,
                hud.xp,
                hud.xp_to_next,
                hud.score,
                hud.currency,
                hud.boss
                    .as_ref()
                    .map(|b| format!(" | {} {:.0}/{:.0}", b.name, b.health, b.max_health))
                    .unwrap_or_default()
            );
        }
        if elapsed >= RUN_LIMIT_SECS {
            break session.stop();
        }
    };

    log::info!(
        "Final score {} (best {}{}), {} kills",
        summary.score,
        summary.best_score,
        if summary.new_best { ", new best!" } else { "" },
        summary.kills
    );

    if let Ok(count) = session.prestige() {
        log::info!("Prestiged to {}", count);
    }

    // Trees and perks are bought in catalog order while the wallets allow
    for id in CoreUpgradeId::ALL {
        match session.purchase_core(id) {
            Ok(cost) => log::info!("Core: {} for {} shards", id.name(), cost),
            Err(e) => log::debug!("Core: {}", e),
        }
    }
    for id in PerkId::ALL {
        match session.purchase_perk(id) {
            Ok(cost) => log::info!("Perk: {} for {} points", id.name(), cost),
            Err(e) => log::debug!("Perk: {}", e),
        }
    }

    // Shop: keep buying the cheapest affordable upgrade
    loop {
        let owned = |id: UpgradeId| session.save_state().upgrades.get(&id).copied().unwrap_or(0);
        let cheapest = UpgradeId::ALL
            .into_iter()
            .filter(|id| id.cap(owned(*id) + 1) > owned(*id))
            .min_by_key(|id| progression::upgrade_cost(*id, owned(*id)));
        let Some(id) = cheapest else {
            break;
        };
        match session.purchase(id) {
            Ok(cost) => log::info!("Bought {} for {}", id.name(), cost),
            Err(e) => {
                log::info!("Shop closed: {}", e);
                break;
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // On the web the page script drives `Session::frame`; this only sets up logging
    astro_rogue::platform::init_logging();
}
