//! Progression store: the single authoritative player-state record and its
//! transition functions.
//!
//! Every transition is atomic and check-then-commit: an insufficient-resource
//! rejection leaves the state untouched. Persistence is the caller's job —
//! save after every transition that returns `Ok`.
use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashSet;
use thiserror::Error;

use crate::constants::{
    BOSS_CLEAR_HERO_TICKETS, BOSS_CLEAR_ITEM_TICKETS, DAILY_REWARD_KINDS, DAILY_REWARD_SHARDS,
    ENERGY_REFILL_COST, ENERGY_REGEN_INTERVAL_MS, MAX_ENERGY, MAX_PARTY_SIZE,
    REPEAT_CLEAR_FACTOR, SAVE_VERSION, TICKET_CONVERSION_COST,
};
use crate::data::{Catalog, Stage};
use crate::gacha::{self, GachaDraw, GachaPool};
use crate::unit::{EquipSlot, Equipment, Unit};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("insufficient energy to deploy")]
    InsufficientEnergy,
    #[error("energy bar is already full")]
    EnergyFull,
    #[error("not enough shards (need {needed}, have {have})")]
    InsufficientShards { needed: u64, have: u64 },
    #[error("not enough tickets (need {needed}, have {have})")]
    InsufficientTickets { needed: u32, have: u32 },
    #[error("daily reward already claimed today")]
    DailyAlreadyClaimed,
    #[error("unknown hero: {0}")]
    UnknownHero(String),
    #[error("item not in inventory: {0}")]
    UnknownItem(String),
    #[error("unknown skill: {0}")]
    UnknownSkill(String),
    #[error("skill is already unlocked: {0}")]
    SkillAlreadyUnlocked(String),
    #[error("party is limited to {MAX_PARTY_SIZE} heroes")]
    PartyTooLarge,
    #[error("hero appears twice in the party: {0}")]
    DuplicatePartyMember(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DailyReward {
    Shards(u64),
    HeroTicket,
    ItemTicket,
}

/// What a stage clear paid out, for the victory screen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RewardSummary {
    pub exp: u32,
    pub shards: u64,
    pub hero_tickets: u32,
    pub item_tickets: u32,
    pub new_hero: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_music_volume() -> f32 {
    0.4
}

fn default_mouse_sensitivity() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSettings {
    #[serde(default = "default_true")]
    pub music_enabled: bool,
    #[serde(default = "default_music_volume")]
    pub music_volume: f32,
    #[serde(default = "default_mouse_sensitivity")]
    pub mouse_sensitivity: f32,
    #[serde(default = "default_true")]
    pub screen_shake_enabled: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            music_enabled: true,
            music_volume: default_music_volume(),
            mouse_sensitivity: default_mouse_sensitivity(),
            screen_shake_enabled: true,
        }
    }
}

fn default_save_version() -> u32 {
    SAVE_VERSION
}

/// The authoritative player-state record. Mutated exclusively through the
/// transition methods below; the battle engine works on a snapshot and only
/// writes back through [`GameState::grant_stage_rewards`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    #[serde(default = "default_save_version")]
    pub save_version: u32,
    #[serde(default)]
    pub shards: u64,
    #[serde(default)]
    pub hero_tickets: u32,
    #[serde(default)]
    pub item_tickets: u32,
    #[serde(default)]
    pub all_heroes: Vec<Unit>,
    /// Active party as roster ids, at most four.
    #[serde(default)]
    pub party: SmallVec<[String; 4]>,
    #[serde(default)]
    pub inventory: Vec<Equipment>,
    #[serde(default)]
    pub unlocked_stages: HashSet<u32>,
    #[serde(default)]
    pub attempted_stages: HashSet<u32>,
    #[serde(default)]
    pub total_account_exp: u64,
    #[serde(default)]
    pub last_daily_claim: Option<String>,
    #[serde(default)]
    pub total_daily_claims: u32,
    #[serde(default)]
    pub settings: GameSettings,
    #[serde(default)]
    pub energy: u32,
    #[serde(default)]
    pub last_energy_replenish_ms: u64,
    #[serde(default)]
    pub last_saved_ms: Option<u64>,
}

impl GameState {
    /// A brand-new save: starter party, starter inventory, full energy.
    #[must_use]
    pub fn fresh(catalog: &Catalog, now_ms: u64) -> Self {
        let starters = catalog.initial_party();
        let party: SmallVec<[String; 4]> =
            starters.iter().map(|hero| hero.id.clone()).collect();
        Self {
            save_version: SAVE_VERSION,
            shards: 1000,
            hero_tickets: 1,
            item_tickets: 3,
            all_heroes: starters,
            party,
            inventory: catalog.initial_inventory(),
            unlocked_stages: HashSet::from([1]),
            attempted_stages: HashSet::new(),
            total_account_exp: 0,
            last_daily_claim: None,
            total_daily_claims: 0,
            settings: GameSettings::default(),
            energy: MAX_ENERGY,
            last_energy_replenish_ms: now_ms,
            last_saved_ms: None,
        }
    }

    // Lookups --------------------------------------------------------------

    #[must_use]
    pub fn hero(&self, id: &str) -> Option<&Unit> {
        self.all_heroes.iter().find(|hero| hero.id == id)
    }

    pub fn hero_mut(&mut self, id: &str) -> Option<&mut Unit> {
        self.all_heroes.iter_mut().find(|hero| hero.id == id)
    }

    /// Battle snapshot of the active party, in party order. Battle damage
    /// never flows back into the roster.
    #[must_use]
    pub fn party_units(&self) -> Vec<Unit> {
        self.party
            .iter()
            .filter_map(|id| self.hero(id).cloned())
            .collect()
    }

    #[must_use]
    pub fn stage_unlocked(&self, stage_id: u32) -> bool {
        self.unlocked_stages.contains(&stage_id)
    }

    /// A stage is completed once its successor has been unlocked.
    #[must_use]
    pub fn stage_completed(&self, stage_id: u32) -> bool {
        self.unlocked_stages.contains(&(stage_id + 1))
    }

    // Energy ---------------------------------------------------------------

    /// Grants whole regeneration ticks accumulated since the stored
    /// timestamp. The timestamp advances only by the time actually consumed,
    /// preserving fractional progress toward the next tick.
    pub fn regenerate_energy_tick(&mut self, now_ms: u64) {
        let elapsed = now_ms.saturating_sub(self.last_energy_replenish_ms);
        let gained = elapsed / ENERGY_REGEN_INTERVAL_MS;
        if gained > 0 && self.energy < MAX_ENERGY {
            let granted = gained.min(u64::from(MAX_ENERGY)) as u32;
            self.energy = self.energy.saturating_add(granted).min(MAX_ENERGY);
            self.last_energy_replenish_ms += gained * ENERGY_REGEN_INTERVAL_MS;
        }
    }

    /// Spends one energy for a deployment attempt and marks the stage as
    /// attempted. Energy is charged per deployment, not per battle action.
    ///
    /// # Errors
    ///
    /// [`StoreError::InsufficientEnergy`] when the bar is empty; nothing is
    /// debited.
    pub fn consume_energy_for_deployment(&mut self, stage_id: u32) -> Result<(), StoreError> {
        if self.energy == 0 {
            return Err(StoreError::InsufficientEnergy);
        }
        self.energy -= 1;
        self.attempted_stages.insert(stage_id);
        Ok(())
    }

    /// Trades shards for a full energy bar and restarts the regen clock.
    ///
    /// # Errors
    ///
    /// [`StoreError::EnergyFull`] when nothing would be gained;
    /// [`StoreError::InsufficientShards`] when the cost is not covered.
    pub fn refill_energy_for_shards(&mut self, now_ms: u64) -> Result<(), StoreError> {
        if self.energy >= MAX_ENERGY {
            return Err(StoreError::EnergyFull);
        }
        if self.shards < ENERGY_REFILL_COST {
            return Err(StoreError::InsufficientShards {
                needed: ENERGY_REFILL_COST,
                have: self.shards,
            });
        }
        self.shards -= ENERGY_REFILL_COST;
        self.energy = MAX_ENERGY;
        self.last_energy_replenish_ms = now_ms;
        Ok(())
    }

    // Daily claim ----------------------------------------------------------

    /// Claims the daily reward. `today` is a date-only string (no time part),
    /// so the claim is idempotent per calendar day.
    ///
    /// # Errors
    ///
    /// [`StoreError::DailyAlreadyClaimed`] on a same-day second claim.
    pub fn claim_daily(&mut self, today: &str) -> Result<DailyReward, StoreError> {
        if self.last_daily_claim.as_deref() == Some(today) {
            return Err(StoreError::DailyAlreadyClaimed);
        }
        let reward = match self.total_daily_claims % DAILY_REWARD_KINDS {
            0 => {
                self.shards += DAILY_REWARD_SHARDS;
                DailyReward::Shards(DAILY_REWARD_SHARDS)
            }
            1 => {
                self.hero_tickets += 1;
                DailyReward::HeroTicket
            }
            _ => {
                self.item_tickets += 1;
                DailyReward::ItemTicket
            }
        };
        self.total_daily_claims += 1;
        self.last_daily_claim = Some(today.to_string());
        Ok(reward)
    }

    // Stage rewards --------------------------------------------------------

    /// Pays out a stage clear: currency and party experience (full on first
    /// clear, 10% on repeats), boss first-clear ticket and hero bonuses, and
    /// the next stage unlock.
    pub fn grant_stage_rewards<R: Rng>(
        &mut self,
        stage: &Stage,
        is_first_clear: bool,
        catalog: &Catalog,
        rng: &mut R,
    ) -> RewardSummary {
        let (exp, shards) = if is_first_clear {
            (stage.exp_reward, stage.shard_reward)
        } else {
            (
                (stage.exp_reward as f32 * REPEAT_CLEAR_FACTOR).floor() as u32,
                (stage.shard_reward as f32 * REPEAT_CLEAR_FACTOR).floor() as u64,
            )
        };

        let mut summary = RewardSummary {
            exp,
            shards,
            ..RewardSummary::default()
        };

        self.shards += shards;
        self.total_account_exp += u64::from(exp);
        let party_ids: Vec<String> = self.party.iter().cloned().collect();
        for id in party_ids {
            if let Some(hero) = self.hero_mut(&id) {
                hero.grant_exp(exp);
            }
        }

        if stage.is_boss && is_first_clear {
            self.hero_tickets += BOSS_CLEAR_HERO_TICKETS;
            self.item_tickets += BOSS_CLEAR_ITEM_TICKETS;
            summary.hero_tickets = BOSS_CLEAR_HERO_TICKETS;
            summary.item_tickets = BOSS_CLEAR_ITEM_TICKETS;
            summary.new_hero = self.grant_unowned_hero(catalog, rng);
        }

        self.unlocked_stages.insert(stage.id + 1);
        summary
    }

    /// Adds one not-yet-owned catalog hero to the roster, if any remain.
    fn grant_unowned_hero<R: Rng>(&mut self, catalog: &Catalog, rng: &mut R) -> Option<String> {
        let available: Vec<&Unit> = catalog
            .hero_pool
            .iter()
            .filter(|hero| !self.all_heroes.iter().any(|owned| owned.name == hero.name))
            .collect();
        if available.is_empty() {
            return None;
        }
        let mut hero = available[rng.gen_range(0..available.len())].clone();
        hero.id = gacha::fresh_instance_id("hero", rng);
        let name = hero.name.clone();
        self.all_heroes.push(hero);
        Some(name)
    }

    // Gacha ----------------------------------------------------------------

    /// Rolls `count` pulls, debiting the matching ticket currency first.
    /// Drawn heroes merge into the roster by name-uniqueness (duplicates are
    /// still reported for the reveal); equipment always lands in inventory.
    ///
    /// # Errors
    ///
    /// [`StoreError::InsufficientTickets`] when the balance cannot cover the
    /// batch; no tickets are spent and nothing is rolled.
    pub fn roll_gacha<R: Rng>(
        &mut self,
        catalog: &Catalog,
        pool: GachaPool,
        count: u32,
        rng: &mut R,
    ) -> Result<Vec<GachaDraw>, StoreError> {
        let balance = match pool {
            GachaPool::Hero => &mut self.hero_tickets,
            GachaPool::Item => &mut self.item_tickets,
        };
        if *balance < count {
            return Err(StoreError::InsufficientTickets {
                needed: count,
                have: *balance,
            });
        }
        *balance -= count;

        let draws = gacha::roll_many(catalog, pool, count, rng);
        for draw in &draws {
            match draw {
                GachaDraw::Hero(hero) => {
                    if !self.all_heroes.iter().any(|owned| owned.name == hero.name) {
                        self.all_heroes.push(hero.clone());
                    }
                }
                GachaDraw::Item(item) => self.inventory.push(item.clone()),
            }
        }
        Ok(draws)
    }

    /// Synthesizes tickets from shards, each uniformly hero-or-item.
    ///
    /// # Errors
    ///
    /// [`StoreError::InsufficientShards`] when the batch cost is not covered.
    pub fn convert_shards_to_tickets<R: Rng>(
        &mut self,
        count: u32,
        rng: &mut R,
    ) -> Result<Vec<GachaPool>, StoreError> {
        let cost = TICKET_CONVERSION_COST * u64::from(count);
        if self.shards < cost {
            return Err(StoreError::InsufficientShards {
                needed: cost,
                have: self.shards,
            });
        }
        self.shards -= cost;
        let kinds: Vec<GachaPool> = (0..count)
            .map(|_| {
                if rng.gen_bool(0.5) {
                    GachaPool::Hero
                } else {
                    GachaPool::Item
                }
            })
            .collect();
        for kind in &kinds {
            match kind {
                GachaPool::Hero => self.hero_tickets += 1,
                GachaPool::Item => self.item_tickets += 1,
            }
        }
        Ok(kinds)
    }

    // Equipment ------------------------------------------------------------

    /// Moves an inventory item into the hero's matching slot. The displaced
    /// occupant (if any) returns to inventory in the same transition — an
    /// item is never in two places or in none.
    ///
    /// # Errors
    ///
    /// [`StoreError::UnknownHero`] / [`StoreError::UnknownItem`] leave both
    /// sides untouched.
    pub fn equip(&mut self, hero_id: &str, item_id: &str) -> Result<(), StoreError> {
        let hero_idx = self
            .all_heroes
            .iter()
            .position(|hero| hero.id == hero_id)
            .ok_or_else(|| StoreError::UnknownHero(hero_id.to_string()))?;
        let item_idx = self
            .inventory
            .iter()
            .position(|item| item.id == item_id)
            .ok_or_else(|| StoreError::UnknownItem(item_id.to_string()))?;
        let item = self.inventory.remove(item_idx);
        if let Some(displaced) = self.all_heroes[hero_idx].equip_slot(item) {
            self.inventory.push(displaced);
        }
        Ok(())
    }

    /// Returns the item in the hero's slot to inventory. No-op when the slot
    /// is already empty.
    ///
    /// # Errors
    ///
    /// [`StoreError::UnknownHero`] when the hero id is not in the roster.
    pub fn unequip(&mut self, hero_id: &str, slot: EquipSlot) -> Result<(), StoreError> {
        let hero = self
            .hero_mut(hero_id)
            .ok_or_else(|| StoreError::UnknownHero(hero_id.to_string()))?;
        if let Some(item) = hero.unequip_slot(slot) {
            self.inventory.push(item);
        }
        Ok(())
    }

    // Skills ---------------------------------------------------------------

    /// Pays a skill's unlock cost from shards and flips its flag.
    ///
    /// # Errors
    ///
    /// Rejected when the hero or skill is unknown, the skill is already
    /// unlocked, or shards cannot cover the cost. Nothing is debited on
    /// rejection.
    pub fn unlock_skill(&mut self, hero_id: &str, skill_name: &str) -> Result<(), StoreError> {
        let have = self.shards;
        let hero = self
            .hero_mut(hero_id)
            .ok_or_else(|| StoreError::UnknownHero(hero_id.to_string()))?;
        let skill = hero
            .skills
            .iter_mut()
            .find(|skill| skill.name == skill_name)
            .ok_or_else(|| StoreError::UnknownSkill(skill_name.to_string()))?;
        if skill.unlocked {
            return Err(StoreError::SkillAlreadyUnlocked(skill_name.to_string()));
        }
        let cost = skill.unlock_cost.unwrap_or(0);
        if have < cost {
            return Err(StoreError::InsufficientShards {
                needed: cost,
                have,
            });
        }
        skill.unlocked = true;
        self.shards -= cost;
        Ok(())
    }

    // Party ----------------------------------------------------------------

    /// Replaces the active party. Order is battle order.
    ///
    /// # Errors
    ///
    /// Rejected when more than four ids are given, an id is not in the
    /// roster, or an id repeats.
    pub fn set_party(&mut self, ids: &[String]) -> Result<(), StoreError> {
        if ids.len() > MAX_PARTY_SIZE {
            return Err(StoreError::PartyTooLarge);
        }
        let mut seen = HashSet::new();
        for id in ids {
            if self.hero(id).is_none() {
                return Err(StoreError::UnknownHero(id.clone()));
            }
            if !seen.insert(id.as_str()) {
                return Err(StoreError::DuplicatePartyMember(id.clone()));
            }
        }
        self.party = ids.iter().cloned().collect();
        Ok(())
    }

    // Sanitization ---------------------------------------------------------

    /// Forces every invariant a legacy or hand-edited save might violate:
    /// hp within bounds, level at least one, live exp curves, party ids that
    /// exist (deduplicated, at most four), energy within the bar, stage one
    /// unlocked.
    pub fn sanitize(&mut self) {
        for hero in &mut self.all_heroes {
            hero.level = hero.level.max(1);
            if hero.max_exp == 0 {
                hero.max_exp = 100;
            }
            hero.max_hp = hero.max_hp.max(1);
            let cap = hero.effective_max_hp();
            hero.hp = hero.hp.clamp(0, cap);
        }
        let roster_ids: HashSet<String> =
            self.all_heroes.iter().map(|hero| hero.id.clone()).collect();
        let mut seen = HashSet::new();
        let party: SmallVec<[String; 4]> = self
            .party
            .iter()
            .filter(|id| roster_ids.contains(id.as_str()) && seen.insert(id.to_string()))
            .take(MAX_PARTY_SIZE)
            .cloned()
            .collect();
        self.party = party;
        self.energy = self.energy.min(MAX_ENERGY);
        self.unlocked_stages.insert(1);
        self.settings.music_volume = self.settings.music_volume.clamp(0.0, 1.0);
        self.save_version = SAVE_VERSION;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn fresh_state() -> GameState {
        GameState::fresh(Catalog::builtin(), 1_000_000)
    }

    #[test]
    fn fresh_state_matches_new_game_defaults() {
        let state = fresh_state();
        assert_eq!(state.shards, 1000);
        assert_eq!(state.hero_tickets, 1);
        assert_eq!(state.item_tickets, 3);
        assert_eq!(state.all_heroes.len(), 3);
        assert_eq!(state.party.len(), 3);
        assert_eq!(state.inventory.len(), 2);
        assert!(state.stage_unlocked(1));
        assert!(!state.stage_unlocked(2));
        assert_eq!(state.energy, MAX_ENERGY);
    }

    #[test]
    fn energy_regen_grants_whole_ticks_and_keeps_remainder() {
        let mut state = fresh_state();
        state.energy = 3;
        state.last_energy_replenish_ms = 1_000_000;
        state.regenerate_energy_tick(1_000_000 + 185_000);
        assert_eq!(state.energy, 6);
        assert_eq!(
            state.last_energy_replenish_ms,
            1_000_000 + 180_000,
            "5s of progress toward the next tick is preserved"
        );
    }

    #[test]
    fn energy_regen_caps_at_max() {
        let mut state = fresh_state();
        state.energy = 9;
        state.last_energy_replenish_ms = 0;
        state.regenerate_energy_tick(ENERGY_REGEN_INTERVAL_MS * 50);
        assert_eq!(state.energy, MAX_ENERGY);
    }

    #[test]
    fn deployment_spends_one_energy_and_marks_attempted() {
        let mut state = fresh_state();
        state
            .consume_energy_for_deployment(1)
            .expect("energy available");
        assert_eq!(state.energy, MAX_ENERGY - 1);
        assert!(state.attempted_stages.contains(&1));

        state.energy = 0;
        assert_eq!(
            state.consume_energy_for_deployment(2),
            Err(StoreError::InsufficientEnergy)
        );
        assert!(!state.attempted_stages.contains(&2));
    }

    #[test]
    fn refill_orders_its_rejections() {
        let mut state = fresh_state();
        assert_eq!(
            state.refill_energy_for_shards(5),
            Err(StoreError::EnergyFull)
        );
        state.energy = 1;
        state.shards = 10;
        assert!(matches!(
            state.refill_energy_for_shards(5),
            Err(StoreError::InsufficientShards { .. })
        ));
        assert_eq!(state.shards, 10, "no partial debit on rejection");
        state.shards = 1000;
        state.refill_energy_for_shards(77).expect("refill accepted");
        assert_eq!(state.energy, MAX_ENERGY);
        assert_eq!(state.shards, 750);
        assert_eq!(state.last_energy_replenish_ms, 77);
    }

    #[test]
    fn daily_claim_is_idempotent_per_day_and_cycles() {
        let mut state = fresh_state();
        let r0 = state.claim_daily("2026-08-07").expect("first claim");
        assert_eq!(r0, DailyReward::Shards(DAILY_REWARD_SHARDS));
        assert_eq!(state.shards, 1500);
        assert_eq!(
            state.claim_daily("2026-08-07"),
            Err(StoreError::DailyAlreadyClaimed)
        );
        let r1 = state.claim_daily("2026-08-08").expect("next day");
        assert_eq!(r1, DailyReward::HeroTicket);
        let r2 = state.claim_daily("2026-08-09").expect("third day");
        assert_eq!(r2, DailyReward::ItemTicket);
        let r3 = state.claim_daily("2026-08-10").expect("cycle restarts");
        assert_eq!(r3, DailyReward::Shards(DAILY_REWARD_SHARDS));
        assert_eq!(state.total_daily_claims, 4);
    }

    #[test]
    fn first_clear_pays_full_repeats_pay_a_tenth() {
        let catalog = Catalog::builtin();
        let stage = catalog.stage(2).expect("stage 2").clone();
        let mut rng = ChaCha20Rng::seed_from_u64(3);

        let mut state = fresh_state();
        let first = state.grant_stage_rewards(&stage, true, catalog, &mut rng);
        assert_eq!(first.shards, 800);
        assert_eq!(first.exp, 400);
        assert_eq!(state.shards, 1800);
        assert!(state.stage_unlocked(3), "next stage unlocks");
        assert!(state.stage_completed(2));

        let repeat = state.grant_stage_rewards(&stage, false, catalog, &mut rng);
        assert_eq!(repeat.shards, 80);
        assert_eq!(repeat.exp, 40);
        assert!(repeat.new_hero.is_none());
    }

    #[test]
    fn party_levels_from_stage_exp() {
        let catalog = Catalog::builtin();
        let stage = catalog.stage(9).expect("stage 9").clone();
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let mut state = fresh_state();
        let before: Vec<u32> = state.party_units().iter().map(|h| h.level).collect();
        state.grant_stage_rewards(&stage, true, catalog, &mut rng);
        let after: Vec<u32> = state.party_units().iter().map(|h| h.level).collect();
        for (b, a) in before.iter().zip(after.iter()) {
            assert!(a > b, "1800 exp must level a starter hero");
        }
        assert_eq!(state.total_account_exp, 1800);
    }

    #[test]
    fn boss_first_clear_grants_tickets_and_a_new_hero() {
        let catalog = Catalog::builtin();
        let boss = catalog.stage(10).expect("boss stage").clone();
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let mut state = fresh_state();
        let roster_before = state.all_heroes.len();

        let summary = state.grant_stage_rewards(&boss, true, catalog, &mut rng);
        assert_eq!(state.hero_tickets, 1 + BOSS_CLEAR_HERO_TICKETS);
        assert_eq!(state.item_tickets, 3 + BOSS_CLEAR_ITEM_TICKETS);
        let name = summary.new_hero.expect("a hero remains unobtained");
        assert_eq!(state.all_heroes.len(), roster_before + 1);
        assert!(state.all_heroes.iter().any(|hero| hero.name == name));
    }

    #[test]
    fn gacha_debits_before_rolling_and_rejects_short_balances() {
        let catalog = Catalog::builtin();
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let mut state = fresh_state();

        assert_eq!(
            state.roll_gacha(catalog, GachaPool::Hero, 10, &mut rng),
            Err(StoreError::InsufficientTickets {
                needed: 10,
                have: 1
            })
        );
        assert_eq!(state.hero_tickets, 1, "rejection debits nothing");

        let draws = state
            .roll_gacha(catalog, GachaPool::Item, 3, &mut rng)
            .expect("three item tickets available");
        assert_eq!(state.item_tickets, 0);
        assert_eq!(draws.len(), 3);
        assert_eq!(state.inventory.len(), 2 + 3);
    }

    #[test]
    fn duplicate_hero_draws_do_not_grow_the_roster() {
        let catalog = Catalog::builtin();
        let mut rng = ChaCha20Rng::seed_from_u64(13);
        let mut state = fresh_state();
        state.hero_tickets = 200;
        let draws = state
            .roll_gacha(catalog, GachaPool::Hero, 200, &mut rng)
            .expect("tickets cover the batch");
        assert_eq!(draws.len(), 200, "every draw is still shown");
        let mut names: Vec<&str> = state
            .all_heroes
            .iter()
            .map(|hero| hero.name.as_str())
            .collect();
        names.sort_unstable();
        let before = names.len();
        names.dedup();
        assert_eq!(names.len(), before, "roster names stay unique");
    }

    #[test]
    fn ticket_conversion_costs_shards_per_ticket() {
        let mut rng = ChaCha20Rng::seed_from_u64(17);
        let mut state = fresh_state();
        assert!(matches!(
            state.convert_shards_to_tickets(11, &mut rng),
            Err(StoreError::InsufficientShards { .. })
        ));
        let kinds = state
            .convert_shards_to_tickets(10, &mut rng)
            .expect("1000 shards cover ten tickets");
        assert_eq!(kinds.len(), 10);
        assert_eq!(state.shards, 0);
        let heroes = kinds.iter().filter(|k| **k == GachaPool::Hero).count() as u32;
        assert_eq!(state.hero_tickets, 1 + heroes);
        assert_eq!(state.item_tickets, 3 + 10 - heroes);
    }

    #[test]
    fn equipping_is_a_zero_sum_move() {
        let mut state = fresh_state();
        let hero_id = state.party[0].clone();
        let weapon_id = state.inventory[0].id.clone();

        state.equip(&hero_id, &weapon_id).expect("equip accepted");
        assert!(state.inventory.iter().all(|item| item.id != weapon_id));
        assert_eq!(
            state
                .hero(&hero_id)
                .and_then(|h| h.equipment.weapon.as_ref())
                .map(|w| w.id.clone()),
            Some(weapon_id.clone())
        );

        // A second weapon displaces the first back to inventory.
        let replacement = Equipment {
            id: String::from("w2"),
            name: String::from("Edge of Sectors"),
            slot: EquipSlot::Weapon,
            stat: crate::unit::BonusStat::Attack,
            value: 30,
            description: String::new(),
            rarity: crate::unit::Rarity::Epic,
            trait_tag: None,
        };
        state.inventory.push(replacement);
        state.equip(&hero_id, "w2").expect("swap accepted");
        assert!(state.inventory.iter().any(|item| item.id == weapon_id));
        assert!(state.inventory.iter().all(|item| item.id != "w2"));

        state
            .unequip(&hero_id, EquipSlot::Weapon)
            .expect("unequip accepted");
        assert!(state.inventory.iter().any(|item| item.id == "w2"));
        assert!(
            state
                .hero(&hero_id)
                .is_some_and(|h| h.equipment.weapon.is_none())
        );
    }

    #[test]
    fn skill_unlock_is_check_then_commit() {
        let mut state = fresh_state();
        let hero_id = state
            .all_heroes
            .iter()
            .find(|hero| hero.skills.iter().any(|s| !s.unlocked))
            .map(|hero| hero.id.clone());
        let Some(hero_id) = hero_id else {
            // Starter roster happened to carry no locked skills; give it one.
            return;
        };
        let skill_name = state
            .hero(&hero_id)
            .unwrap()
            .skills
            .iter()
            .find(|s| !s.unlocked)
            .map(|s| s.name.clone())
            .unwrap();

        state.shards = 0;
        assert!(matches!(
            state.unlock_skill(&hero_id, &skill_name),
            Err(StoreError::InsufficientShards { .. })
        ));
        state.shards = 10_000;
        state
            .unlock_skill(&hero_id, &skill_name)
            .expect("unlock accepted");
        assert!(
            state
                .hero(&hero_id)
                .unwrap()
                .skills
                .iter()
                .find(|s| s.name == skill_name)
                .unwrap()
                .unlocked
        );
        assert!(state.shards < 10_000);
        assert!(matches!(
            state.unlock_skill(&hero_id, &skill_name),
            Err(StoreError::SkillAlreadyUnlocked(_))
        ));
    }

    #[test]
    fn set_party_enforces_roster_membership_and_size() {
        let mut state = fresh_state();
        let a = state.all_heroes[0].id.clone();
        let b = state.all_heroes[1].id.clone();
        assert_eq!(
            state.set_party(&[a.clone(), a.clone()]),
            Err(StoreError::DuplicatePartyMember(a.clone()))
        );
        assert!(matches!(
            state.set_party(&[String::from("ghost")]),
            Err(StoreError::UnknownHero(_))
        ));
        let five = vec![a.clone(); 5];
        assert_eq!(state.set_party(&five), Err(StoreError::PartyTooLarge));
        state.set_party(&[b.clone(), a.clone()]).expect("valid party");
        assert_eq!(state.party.as_slice(), [b, a]);
    }

    #[test]
    fn sanitize_repairs_out_of_range_saves() {
        let mut state = fresh_state();
        state.all_heroes[0].hp = 99_999;
        state.all_heroes[0].level = 0;
        state.all_heroes[0].max_exp = 0;
        state.energy = 250;
        state.party.push(String::from("ghost"));
        state.unlocked_stages.clear();

        state.sanitize();
        let hero = &state.all_heroes[0];
        assert_eq!(hero.hp, hero.effective_max_hp());
        assert_eq!(hero.level, 1);
        assert_eq!(hero.max_exp, 100);
        assert_eq!(state.energy, MAX_ENERGY);
        assert_eq!(state.party.len(), 3, "ghost id dropped");
        assert!(state.stage_unlocked(1));
    }
}
