//! Centralized balance and tuning constants for Voidecho game logic.
//!
//! These values define the deterministic math for battle, gacha, and
//! progression. Keeping them together ensures that gameplay can only be
//! adjusted via code changes reviewed in version control, rather than
//! through external assets.

// Logging keys -------------------------------------------------------------
pub(crate) const DEBUG_ENV_VAR: &str = "VOIDECHO_DEBUG_LOGS";
pub(crate) const LOG_BATTLE_START: &str = "log.battle.start";
pub(crate) const LOG_WAVE_SPAWN_PREFIX: &str = "log.wave.spawn.";
pub(crate) const LOG_ACTION_ATTACK: &str = "log.action.attack";
pub(crate) const LOG_ACTION_HEAL: &str = "log.action.heal";
pub(crate) const LOG_MINIGAME_SUCCESS: &str = "log.minigame.success";
pub(crate) const LOG_MINIGAME_FAILURE: &str = "log.minigame.failure";
pub(crate) const LOG_RESONANCE_USED: &str = "log.resonance.used";
pub(crate) const LOG_RESONANCE_BUFF: &str = "log.resonance.buff";
pub(crate) const LOG_ENEMY_TURN: &str = "log.enemy.turn";
pub(crate) const LOG_VICTORY: &str = "log.victory";
pub(crate) const LOG_DEFEAT: &str = "log.defeat";
pub(crate) const LOG_RETREAT: &str = "log.retreat";

// Battle tuning ------------------------------------------------------------
pub(crate) const SKILL_POWER_DIVISOR: f32 = 10.0;
pub(crate) const MINIGAME_CHANCE: f64 = 0.25;
pub(crate) const MINIGAME_SUCCESS_MULT: f32 = 3.0;
pub(crate) const MINIGAME_FAILURE_MULT: f32 = 0.75;
pub(crate) const MINIGAME_BONUS_FRACTION: f32 = 0.2;
pub(crate) const MINIGAME_PENALTY_FRACTION: f32 = 0.2;
pub(crate) const STRENGTH_BUFF_MULT: f32 = 3.0;
pub(crate) const CRIT_MULT_THRESHOLD: f32 = 1.2;
pub(crate) const CRIT_ROLL_CHANCE: f64 = 0.1;
pub(crate) const MAX_PARTY_SIZE: usize = 4;

// Resonance tuning ---------------------------------------------------------
pub(crate) const RESONANCE_COOLDOWN_TURNS: u32 = 12;
pub(crate) const RESONANCE_HEAL_PER_TAP: i32 = 30;
pub(crate) const RESONANCE_HEAL_BASE: i32 = 200;
pub(crate) const RESONANCE_BUFF_TAP_THRESHOLD: u32 = 8;
pub(crate) const RESONANCE_BUFF_DURATION: u32 = 3;

// Minigame countdowns (seconds) --------------------------------------------
pub(crate) const MINIGAME_BUDGET_DODGE: f32 = 14.0;
pub(crate) const MINIGAME_BUDGET_DEFAULT: f32 = 12.0;

// Leveling -----------------------------------------------------------------
pub(crate) const EXP_GROWTH_FACTOR: f32 = 1.3;
pub(crate) const LEVEL_HP_GAIN: i32 = 5;
pub(crate) const LEVEL_ATTACK_GAIN: f32 = 0.8;
pub(crate) const LEVEL_DEFENSE_GAIN: f32 = 0.4;

// Gacha rarity table (cumulative percentage bounds) ------------------------
pub(crate) const GACHA_BOUND_INSANE: f64 = 0.5;
pub(crate) const GACHA_BOUND_UBER: f64 = 2.5;
pub(crate) const GACHA_BOUND_LEGENDARY: f64 = 10.0;
pub(crate) const GACHA_BOUND_EPIC: f64 = 30.0;
pub(crate) const TICKET_CONVERSION_COST: u64 = 100;

// Energy tuning ------------------------------------------------------------
pub const MAX_ENERGY: u32 = 10;
pub const ENERGY_REGEN_INTERVAL_MS: u64 = 60_000;
pub(crate) const ENERGY_REFILL_COST: u64 = 250;

// Progression --------------------------------------------------------------
pub(crate) const REPEAT_CLEAR_FACTOR: f32 = 0.1;
pub(crate) const BOSS_CLEAR_HERO_TICKETS: u32 = 1;
pub(crate) const BOSS_CLEAR_ITEM_TICKETS: u32 = 2;
pub(crate) const DAILY_REWARD_SHARDS: u64 = 500;
pub(crate) const DAILY_REWARD_KINDS: u32 = 3;

// Save schema --------------------------------------------------------------
pub const SAVE_VERSION: u32 = 11;
pub const SAVE_KEY_PREFIX: &str = "voidecho.save.";

// Content generation -------------------------------------------------------
pub(crate) const CATALOG_SEED: u64 = 0x5644_4543_484f_0001;
pub(crate) const HEROES_PER_RARITY: usize = 55;
pub(crate) const ITEMS_PER_RARITY: usize = 20;
pub(crate) const STAGE_COUNT: u32 = 10;

#[cfg(test)]
pub(crate) const FLOAT_EPSILON: f32 = 1e-4;
