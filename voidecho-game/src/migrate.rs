//! Save-blob migration: deep-merge onto current defaults, then sanitize.
//!
//! There is no backward-compatibility contract. A save from any schema
//! version is merged key-wise onto a fresh default structure so new fields
//! acquire defaults, then every roster unit is forced back into its
//! invariants. A blob that fails to parse at all falls back to a fresh
//! state — never a fatal error.
use serde_json::Value;

use crate::constants::DEBUG_ENV_VAR;
use crate::data::Catalog;
use crate::state::GameState;

#[cfg(debug_assertions)]
fn debug_log_enabled() -> bool {
    matches!(std::env::var(DEBUG_ENV_VAR), Ok(val) if val != "0")
}

#[cfg(not(debug_assertions))]
const fn debug_log_enabled() -> bool {
    false
}

/// Recursive structural merge of `saved` onto `defaults`: arrays replace,
/// objects merge key-wise, scalars (including null) replace. Pure.
#[must_use]
pub fn deep_merge(defaults: Value, saved: &Value) -> Value {
    match (defaults, saved) {
        (Value::Object(mut base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                let merged = match base.remove(key) {
                    Some(existing) if value.is_object() => deep_merge(existing, value),
                    _ => value.clone(),
                };
                base.insert(key.clone(), merged);
            }
            Value::Object(base)
        }
        (_, other) => other.clone(),
    }
}

/// Rebuilds a ready-to-use [`GameState`] from a raw persisted blob.
///
/// `None` (no save) and unparseable blobs both yield a fresh state. A parsed
/// blob is deep-merged onto defaults, deserialized, sanitized, and given one
/// energy catch-up tick against `now_ms` before it is considered ready.
#[must_use]
pub fn migrate_save(raw: Option<&str>, catalog: &Catalog, now_ms: u64) -> GameState {
    let defaults = GameState::fresh(catalog, now_ms);
    let mut state = match raw {
        None => defaults,
        Some(blob) => match serde_json::from_str::<Value>(blob) {
            Err(err) => {
                if debug_log_enabled() {
                    println!("Save load failed, starting fresh: {err}");
                }
                defaults
            }
            Ok(saved) => {
                let default_value = serde_json::to_value(&defaults)
                    .unwrap_or(Value::Null);
                let merged = deep_merge(default_value, &saved);
                serde_json::from_value(merged).unwrap_or(defaults)
            }
        },
    };
    state.sanitize();
    state.regenerate_energy_tick(now_ms);
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{ENERGY_REGEN_INTERVAL_MS, MAX_ENERGY, SAVE_VERSION};
    use serde_json::json;

    const NOW: u64 = 10_000_000;

    #[test]
    fn merge_replaces_arrays_and_scalars_merges_objects() {
        let defaults = json!({
            "a": 1,
            "b": [1, 2, 3],
            "c": { "x": "keep", "y": "default" },
        });
        let saved = json!({
            "a": 2,
            "b": [9],
            "c": { "y": "saved" },
            "extra": true,
        });
        let merged = deep_merge(defaults, &saved);
        assert_eq!(merged["a"], 2);
        assert_eq!(merged["b"], json!([9]));
        assert_eq!(merged["c"]["x"], "keep");
        assert_eq!(merged["c"]["y"], "saved");
        assert_eq!(merged["extra"], true);
    }

    #[test]
    fn missing_save_starts_fresh() {
        let state = migrate_save(None, Catalog::builtin(), NOW);
        assert_eq!(state.shards, 1000);
        assert_eq!(state.energy, MAX_ENERGY);
        assert_eq!(state.last_energy_replenish_ms, NOW);
    }

    #[test]
    fn corrupt_blob_falls_back_to_fresh() {
        let state = migrate_save(Some("{not json"), Catalog::builtin(), NOW);
        assert_eq!(state.shards, 1000);
        assert_eq!(state.all_heroes.len(), 3);
    }

    #[test]
    fn legacy_blob_acquires_new_fields_and_keeps_its_values() {
        // A pre-energy-era save: knows nothing about energy or settings.
        let legacy = json!({
            "shards": 4321,
            "hero_tickets": 7,
            "unlocked_stages": [1, 2, 3],
        })
        .to_string();
        let state = migrate_save(Some(&legacy), Catalog::builtin(), NOW);
        assert_eq!(state.shards, 4321);
        assert_eq!(state.hero_tickets, 7);
        assert!(state.stage_unlocked(3));
        assert_eq!(state.save_version, SAVE_VERSION, "version stamped");
        assert_eq!(state.energy, MAX_ENERGY, "new field got its default");
        assert!(state.settings.music_enabled);
    }

    #[test]
    fn load_runs_one_energy_catch_up_pass() {
        let mut old = GameState::fresh(Catalog::builtin(), 0);
        old.energy = 2;
        old.last_energy_replenish_ms = 0;
        let blob = serde_json::to_string(&old).expect("state serializes");
        let now = ENERGY_REGEN_INTERVAL_MS * 3 + 30_000;
        let state = migrate_save(Some(&blob), Catalog::builtin(), now);
        assert_eq!(state.energy, 5, "three offline ticks granted");
        assert_eq!(state.last_energy_replenish_ms, ENERGY_REGEN_INTERVAL_MS * 3);
    }

    #[test]
    fn saved_roster_replaces_the_default_roster() {
        let mut old = GameState::fresh(Catalog::builtin(), 0);
        old.all_heroes.truncate(1);
        old.party = old.all_heroes.iter().map(|h| h.id.clone()).collect();
        old.all_heroes[0].hp = -5; // hand-edited save
        let blob = serde_json::to_string(&old).expect("state serializes");
        let state = migrate_save(Some(&blob), Catalog::builtin(), NOW);
        assert_eq!(state.all_heroes.len(), 1, "arrays replace, not union");
        assert_eq!(state.all_heroes[0].hp, 0, "hp sanitized back into range");
        assert_eq!(state.party.len(), 1);
    }
}
