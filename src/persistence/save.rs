//! Save schema
//!
//! ```json
//! { "best_score": 0, "total_currency": 0, "prestige_count": 0,
//!   "prestige_points": 0, "core_shards": 0,
//!   "upgrades": { "engine": 2, "homing": 1 },
//!   "core_upgrades": ["core_pierce1"], "prestige_shop": ["ps_dmg5"] }
//! ```
//!
//! Owned sets also load from an object of flags, e.g.
//! `{ "core_double": true, "core_explode": false }`.
//!
//! Loading never fails: each field is read on its own, and anything missing
//! or of the wrong type falls back to its default.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::progression::{CoreUpgradeId, PerkId, UpgradeId};

/// Progress that survives between sessions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveState {
    pub best_score: u64,
    /// Unspent currency carried between runs
    pub total_currency: u64,
    pub prestige_count: u32,
    /// Unspent prestige shop currency
    pub prestige_points: u32,
    /// Boss currency for the core tree
    pub core_shards: u64,
    /// Permanently purchased upgrade levels
    pub upgrades: BTreeMap<UpgradeId, u32>,
    pub core_upgrades: BTreeSet<CoreUpgradeId>,
    pub prestige_shop: BTreeSet<PerkId>,
}

fn as_count(value: Option<&Value>) -> Option<u64> {
    let value = value?;
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64))
}

fn as_small_count(value: Option<&Value>) -> Option<u32> {
    as_count(value).and_then(|n| u32::try_from(n).ok())
}

/// Owned keys from either `["a", "b"]` or `{ "a": true, "b": false }`
fn key_set<T: Ord>(value: Option<&Value>, parse: impl Fn(&str) -> Option<T>) -> BTreeSet<T> {
    let keys: Vec<&str> = match value {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        Some(Value::Object(flags)) => flags
            .iter()
            .filter(|(_, owned)| owned.as_bool().unwrap_or(false) || as_count(Some(*owned)).is_some_and(|n| n > 0))
            .map(|(key, _)| key.as_str())
            .collect(),
        _ => Vec::new(),
    };
    keys.into_iter()
        .filter_map(|key| {
            let id = parse(key);
            if id.is_none() {
                log::debug!("Ignoring unknown entry '{}' in save", key);
            }
            id
        })
        .collect()
}

impl SaveState {
    /// Parse a save blob, substituting defaults field by field
    pub fn from_json(json: &str) -> Self {
        let root: Value = match serde_json::from_str(json) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Save data unreadable, starting fresh: {}", e);
                return Self::default();
            }
        };
        let Some(fields) = root.as_object() else {
            log::warn!("Save data is not an object, starting fresh");
            return Self::default();
        };

        let mut upgrades = BTreeMap::new();
        if let Some(entries) = fields.get("upgrades").and_then(Value::as_object) {
            for (key, level) in entries {
                let Some(id) = UpgradeId::from_key(key) else {
                    log::debug!("Ignoring unknown upgrade '{}' in save", key);
                    continue;
                };
                if let Some(level) = as_count(Some(level)) {
                    let level = u32::try_from(level).unwrap_or(u32::MAX);
                    upgrades.insert(id, id.cap(level));
                }
            }
        }

        Self {
            best_score: as_count(fields.get("best_score")).unwrap_or(0),
            total_currency: as_count(fields.get("total_currency")).unwrap_or(0),
            prestige_count: as_small_count(fields.get("prestige_count")).unwrap_or(0),
            prestige_points: as_small_count(fields.get("prestige_points")).unwrap_or(0),
            core_shards: as_count(fields.get("core_shards")).unwrap_or(0),
            upgrades,
            core_upgrades: key_set(fields.get("core_upgrades"), CoreUpgradeId::from_key),
            prestige_shop: key_set(fields.get("prestige_shop"), PerkId::from_key),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Record a run's score. Returns true on a new best.
    pub fn record_score(&mut self, score: u64) -> bool {
        if score > self.best_score {
            self.best_score = score;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SaveState {
        let mut upgrades = BTreeMap::new();
        upgrades.insert(UpgradeId::Engine, 2);
        upgrades.insert(UpgradeId::Homing, 1);
        SaveState {
            best_score: 5400,
            total_currency: 820,
            prestige_count: 1,
            prestige_points: 2,
            core_shards: 7,
            upgrades,
            core_upgrades: BTreeSet::from([CoreUpgradeId::PierceI, CoreUpgradeId::DoubleShot]),
            prestige_shop: BTreeSet::from([PerkId::Money]),
        }
    }

    #[test]
    fn test_save_round_trip() {
        let save = sample();
        let json = save.to_json().unwrap();
        assert!(json.contains("\"engine\""));
        assert!(json.contains("\"core_double\""));
        assert!(json.contains("\"ps_money10\""));
        assert_eq!(SaveState::from_json(&json), save);
    }

    #[test]
    fn test_missing_fields_default() {
        let save = SaveState::from_json(r#"{ "best_score": 120 }"#);
        assert_eq!(save.best_score, 120);
        assert_eq!(save.total_currency, 0);
        assert_eq!(save.prestige_count, 0);
        assert_eq!(save.prestige_points, 0);
        assert_eq!(save.core_shards, 0);
        assert!(save.upgrades.is_empty());
        assert!(save.core_upgrades.is_empty());
        assert!(save.prestige_shop.is_empty());
    }

    #[test]
    fn test_owned_sets_from_flag_objects() {
        let save = SaveState::from_json(
            r#"{ "core_shards": 9, "prestige_points": 3,
                 "core_upgrades": { "core_pierce1": true, "core_double": true, "core_explode": false, "core_warp": true },
                 "prestige_shop": { "ps_dmg5": 1, "ps_fire5": 0 } }"#,
        );
        assert_eq!(save.core_shards, 9);
        assert_eq!(save.prestige_points, 3);
        assert_eq!(
            save.core_upgrades,
            BTreeSet::from([CoreUpgradeId::PierceI, CoreUpgradeId::DoubleShot])
        );
        assert_eq!(save.prestige_shop, BTreeSet::from([PerkId::Damage]));
    }

    #[test]
    fn test_owned_sets_wrong_type_default() {
        let save = SaveState::from_json(r#"{ "core_upgrades": "all", "prestige_shop": [1, "ps_fire5"], "core_shards": -4 }"#);
        assert!(save.core_upgrades.is_empty());
        assert_eq!(save.prestige_shop, BTreeSet::from([PerkId::FireRate]));
        assert_eq!(save.core_shards, 0);
    }

    #[test]
    fn test_wrong_types_default_per_field() {
        let save = SaveState::from_json(
            r#"{ "best_score": "lots", "total_currency": 300, "prestige_count": -2,
                 "upgrades": { "engine": "max", "rounds": 3 } }"#,
        );
        assert_eq!(save.best_score, 0);
        assert_eq!(save.total_currency, 300);
        assert_eq!(save.prestige_count, 0);
        assert_eq!(save.upgrades.get(&UpgradeId::Engine), None);
        assert_eq!(save.upgrades[&UpgradeId::Rounds], 3);
    }

    #[test]
    fn test_unknown_upgrades_ignored() {
        let save = SaveState::from_json(r#"{ "upgrades": { "warp_drive": 4, "piercing": 1 } }"#);
        assert_eq!(save.upgrades.len(), 1);
        assert_eq!(save.upgrades[&UpgradeId::Piercing], 1);
    }

    #[test]
    fn test_levels_capped_on_load() {
        let save = SaveState::from_json(r#"{ "upgrades": { "homing": 9 } }"#);
        assert_eq!(save.upgrades[&UpgradeId::Homing], 1);
    }

    #[test]
    fn test_garbage_yields_default() {
        assert_eq!(SaveState::from_json("not json at all"), SaveState::default());
        assert_eq!(SaveState::from_json("[1, 2, 3]"), SaveState::default());
        assert_eq!(SaveState::from_json(""), SaveState::default());
    }

    #[test]
    fn test_record_score() {
        let mut save = SaveState::default();
        assert!(save.record_score(100));
        assert!(!save.record_score(50));
        assert_eq!(save.best_score, 100);
    }
}
