//! Voidecho Game Engine
//!
//! Platform-agnostic core game logic for the Voidecho turn-based gacha RPG.
//! This crate provides all game mechanics without UI or platform-specific
//! dependencies: the battle state machine, the gacha roll engine, the
//! minigame resolver, and the persistent progression store.

pub mod audio;
pub mod battle;
pub mod constants;
pub mod data;
pub mod dialogue;
pub mod gacha;
pub mod migrate;
pub mod minigame;
pub mod state;
pub mod unit;

// Re-export commonly used types
pub use audio::{AudioSink, NullAudio, SoundCue};
pub use battle::{
    ActionGate, BattleEngine, BattleError, BattleEvent, BattleOutcome, BattlePhase,
    ResonanceOutcome, compute_damage,
};
pub use constants::{ENERGY_REGEN_INTERVAL_MS, MAX_ENERGY, SAVE_KEY_PREFIX, SAVE_VERSION};
pub use data::{Catalog, Stage};
pub use dialogue::{
    DialogueError, DialogueLine, DialogueService, StaticDialogue, fallback_lines,
    parse_dialogue_lines,
};
pub use gacha::{GachaDraw, GachaPool, rarity_for_roll, roll_many, roll_one};
pub use migrate::{deep_merge, migrate_save};
pub use minigame::{MinigameInput, MinigameKind, MinigameSession};
pub use state::{DailyReward, GameSettings, GameState, RewardSummary, StoreError};
pub use unit::{
    Allegiance, BonusStat, EquipSlot, Equipment, Rarity, Skill, SkillKind, StatusEffect,
    StatusKind, Trait, Unit, UnitEquipment,
};

/// Trait for abstracting save persistence.
/// Platform-specific implementations should provide this.
pub trait SaveStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist a serialized save blob under the named slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob cannot be written.
    fn save_blob(&self, slot: &str, blob: &str) -> Result<(), Self::Error>;

    /// Load the raw blob for the named slot, or `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn load_blob(&self, slot: &str) -> Result<Option<String>, Self::Error>;

    /// Delete the named slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    fn delete_save(&self, slot: &str) -> Result<(), Self::Error>;
}

/// Main game engine binding the content catalog to a storage backend.
pub struct GameEngine<S>
where
    S: SaveStorage,
{
    storage: S,
    catalog: &'static Catalog,
}

impl<S> GameEngine<S>
where
    S: SaveStorage,
{
    /// Create a new game engine over the built-in content catalog.
    #[must_use]
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            catalog: Catalog::builtin(),
        }
    }

    #[must_use]
    pub const fn catalog(&self) -> &'static Catalog {
        self.catalog
    }

    /// Load the named slot, migrating whatever is found onto the current
    /// schema, or start a fresh state when the slot is empty. The returned
    /// state has already received its offline energy catch-up tick.
    ///
    /// # Errors
    ///
    /// Returns an error only when the backing store cannot be read; a
    /// malformed blob degrades to a fresh state instead.
    pub fn load_or_new(&self, slot: &str, now_ms: u64) -> Result<GameState, S::Error> {
        let raw = self.storage.load_blob(slot)?;
        Ok(migrate::migrate_save(raw.as_deref(), self.catalog, now_ms))
    }

    /// Serialize and persist the state, stamping the save timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the backing store fails.
    pub fn save_game(
        &self,
        slot: &str,
        state: &mut GameState,
        now_ms: u64,
    ) -> anyhow::Result<()> {
        state.last_saved_ms = Some(now_ms);
        let blob = serde_json::to_string(state)?;
        self.storage
            .save_blob(slot, &blob)
            .map_err(anyhow::Error::from)
    }

    /// Delete the named slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    pub fn delete_save(&self, slot: &str) -> Result<(), S::Error> {
        self.storage.delete_save(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::convert::Infallible;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct MemoryStorage {
        saves: Rc<RefCell<HashMap<String, String>>>,
    }

    impl SaveStorage for MemoryStorage {
        type Error = Infallible;

        fn save_blob(&self, slot: &str, blob: &str) -> Result<(), Self::Error> {
            self.saves
                .borrow_mut()
                .insert(format!("{SAVE_KEY_PREFIX}{slot}"), blob.to_string());
            Ok(())
        }

        fn load_blob(&self, slot: &str) -> Result<Option<String>, Self::Error> {
            Ok(self
                .saves
                .borrow()
                .get(&format!("{SAVE_KEY_PREFIX}{slot}"))
                .cloned())
        }

        fn delete_save(&self, slot: &str) -> Result<(), Self::Error> {
            self.saves
                .borrow_mut()
                .remove(&format!("{SAVE_KEY_PREFIX}{slot}"));
            Ok(())
        }
    }

    #[test]
    fn engine_creates_and_roundtrips_state() {
        let engine = GameEngine::new(MemoryStorage::default());
        let mut state = engine.load_or_new("slot-one", 1_000).expect("fresh state");
        state.shards = 4242;
        state.energy = 3;
        engine
            .save_game("slot-one", &mut state, 2_000)
            .expect("save succeeds");
        assert_eq!(state.last_saved_ms, Some(2_000));

        let loaded = engine.load_or_new("slot-one", 2_500).expect("load succeeds");
        assert_eq!(loaded.shards, 4242);
        assert_eq!(loaded.energy, 3);
    }

    #[test]
    fn missing_slot_starts_a_new_game() {
        let engine = GameEngine::new(MemoryStorage::default());
        let state = engine.load_or_new("missing", 0).expect("fresh state");
        assert_eq!(state.shards, 1000);
        assert_eq!(state.all_heroes.len(), 3);
    }

    #[test]
    fn delete_clears_the_slot() {
        let engine = GameEngine::new(MemoryStorage::default());
        let mut state = engine.load_or_new("slot", 0).expect("fresh state");
        state.shards = 9;
        engine.save_game("slot", &mut state, 1).expect("save succeeds");
        engine.delete_save("slot").expect("delete succeeds");
        let reloaded = engine.load_or_new("slot", 2).expect("fresh again");
        assert_eq!(reloaded.shards, 1000);
    }
}
