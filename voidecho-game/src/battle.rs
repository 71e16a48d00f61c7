//! Turn-based battle engine: wave sequencing, turn ownership, action
//! resolution, minigame gating, and end-state detection.
//!
//! The engine operates on a battle-local snapshot of the deployed party.
//! Roster state is never mutated here; rewards and roster writes happen in
//! the progression store after a victory.
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::audio::SoundCue;
use crate::constants::{
    CRIT_MULT_THRESHOLD, CRIT_ROLL_CHANCE, DEBUG_ENV_VAR, LOG_ACTION_ATTACK, LOG_ACTION_HEAL,
    LOG_BATTLE_START, LOG_DEFEAT, LOG_ENEMY_TURN, LOG_MINIGAME_FAILURE, LOG_MINIGAME_SUCCESS,
    LOG_RESONANCE_BUFF, LOG_RESONANCE_USED, LOG_RETREAT, LOG_VICTORY, LOG_WAVE_SPAWN_PREFIX,
    MINIGAME_BONUS_FRACTION, MINIGAME_CHANCE, MINIGAME_FAILURE_MULT, MINIGAME_PENALTY_FRACTION,
    MINIGAME_SUCCESS_MULT, RESONANCE_BUFF_DURATION, RESONANCE_BUFF_TAP_THRESHOLD,
    RESONANCE_COOLDOWN_TURNS, RESONANCE_HEAL_BASE, RESONANCE_HEAL_PER_TAP, SKILL_POWER_DIVISOR,
    STRENGTH_BUFF_MULT,
};
use crate::data::Stage;
use crate::minigame::{MinigameInput, MinigameKind, MinigameSession};
use crate::unit::{SkillKind, Unit};

#[cfg(debug_assertions)]
fn debug_log_enabled() -> bool {
    matches!(std::env::var(DEBUG_ENV_VAR), Ok(val) if val != "0")
}

#[cfg(not(debug_assertions))]
const fn debug_log_enabled() -> bool {
    false
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BattlePhase {
    /// Waiting for the active hero to choose an action.
    PlayerTurnSelect,
    /// A pending action is gated on a minigame outcome.
    AwaitingMinigame,
    /// Enemies are acting. Resolved synchronously within a transition.
    EnemyTurn,
    /// The next wave is being spawned. Resolved synchronously.
    WaveTransition,
    Victory,
    Defeat,
    Retreated,
}

impl BattlePhase {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Victory | Self::Defeat | Self::Retreated)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BattleOutcome {
    Victory,
    Defeat,
    Retreated,
}

/// Observable effect emitted during resolution, drained by the shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BattleEvent {
    WaveSpawned {
        wave: usize,
        enemy_count: usize,
    },
    MinigameStarted {
        actor: String,
        minigame: MinigameKind,
    },
    MinigameResolved {
        actor: String,
        success: bool,
    },
    DamageDealt {
        source: String,
        target: String,
        amount: i32,
        crit: bool,
    },
    SelfDamage {
        actor: String,
        amount: i32,
    },
    Healed {
        source: String,
        target: String,
        amount: i32,
    },
    ResonanceHeal {
        taps: u32,
        amount: i32,
    },
    StrengthBuffGained {
        actions: u32,
    },
    Sound {
        cue: SoundCue,
    },
    BattleEnded {
        outcome: BattleOutcome,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BattleError {
    #[error("an action is still resolving")]
    Busy,
    #[error("not waiting for a player action")]
    NotPlayerTurn,
    #[error("no action is pending a minigame outcome")]
    NoPendingAction,
    #[error("no hero is able to act")]
    NoActiveHero,
    #[error("skill index {0} is missing or locked")]
    InvalidSkill(usize),
    #[error("invalid or downed target")]
    InvalidTarget,
    #[error("resonance is recharging for {0} more turns")]
    ResonanceCharging(u32),
    #[error("the battle is already over")]
    Finished,
}

/// What `submit_action` did with the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionGate {
    /// The action resolved immediately.
    Resolved,
    /// A minigame now gates the action; feed the outcome to
    /// [`BattleEngine::resolve_minigame`].
    MinigameStarted(MinigameKind),
}

#[derive(Debug, Clone)]
struct PendingAction {
    actor_id: String,
    skill_index: usize,
    target_id: String,
    session: MinigameSession,
}

/// Summary of a resonance surge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResonanceOutcome {
    pub heal_amount: i32,
    pub buff_granted: bool,
}

pub struct BattleEngine {
    heroes: Vec<Unit>,
    waves: Vec<Vec<Unit>>,
    enemies: Vec<Unit>,
    wave_index: usize,
    acted: HashSet<String>,
    phase: BattlePhase,
    busy: bool,
    pending: Option<PendingAction>,
    resonance_cooldown: u32,
    strength_buff_actions: u32,
    minigame_chance: f64,
    rng: ChaCha20Rng,
    log: Vec<String>,
    events: Vec<BattleEvent>,
}

impl BattleEngine {
    /// Starts a battle from a snapshot of the deployed party and a stage
    /// definition. Transient combat state on the snapshot is cleared.
    #[must_use]
    pub fn new(party: &[Unit], stage: &Stage, seed: u64) -> Self {
        let mut heroes: Vec<Unit> = party.to_vec();
        for hero in &mut heroes {
            hero.clear_battle_state();
        }
        let mut engine = Self {
            heroes,
            waves: stage.waves.clone(),
            enemies: Vec::new(),
            wave_index: 0,
            acted: HashSet::new(),
            phase: BattlePhase::PlayerTurnSelect,
            busy: false,
            pending: None,
            resonance_cooldown: 0,
            strength_buff_actions: 0,
            minigame_chance: MINIGAME_CHANCE,
            rng: ChaCha20Rng::seed_from_u64(seed),
            log: vec![String::from(LOG_BATTLE_START)],
            events: Vec::new(),
        };
        engine.spawn_wave(0);
        engine.begin_player_round();
        engine
    }

    /// Overrides the minigame interposition probability. Shells use this for
    /// accessibility settings; tests pin it to 0.0 or 1.0.
    pub fn set_minigame_chance(&mut self, chance: f64) {
        self.minigame_chance = chance.clamp(0.0, 1.0);
    }

    #[must_use]
    pub const fn phase(&self) -> BattlePhase {
        self.phase
    }

    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.busy
    }

    #[must_use]
    pub fn heroes(&self) -> &[Unit] {
        &self.heroes
    }

    #[must_use]
    pub fn enemies(&self) -> &[Unit] {
        &self.enemies
    }

    #[must_use]
    pub const fn wave_index(&self) -> usize {
        self.wave_index
    }

    #[must_use]
    pub const fn wave_count(&self) -> usize {
        self.waves.len()
    }

    #[must_use]
    pub const fn resonance_cooldown(&self) -> u32 {
        self.resonance_cooldown
    }

    #[must_use]
    pub const fn strength_buff_actions(&self) -> u32 {
        self.strength_buff_actions
    }

    #[must_use]
    pub fn log(&self) -> &[String] {
        &self.log
    }

    /// Drains the pending event queue.
    pub fn take_events(&mut self) -> Vec<BattleEvent> {
        std::mem::take(&mut self.events)
    }

    #[must_use]
    pub const fn outcome(&self) -> Option<BattleOutcome> {
        match self.phase {
            BattlePhase::Victory => Some(BattleOutcome::Victory),
            BattlePhase::Defeat => Some(BattleOutcome::Defeat),
            BattlePhase::Retreated => Some(BattleOutcome::Retreated),
            _ => None,
        }
    }

    /// The one hero currently allowed to act: first living hero that has not
    /// acted this round, in stable roster order.
    #[must_use]
    pub fn active_hero(&self) -> Option<&Unit> {
        self.heroes
            .iter()
            .find(|hero| hero.is_alive() && !self.acted.contains(&hero.id))
    }

    /// The active hero's currently selectable skills (unlocked only), with
    /// their indices into the unit's skill list.
    #[must_use]
    pub fn selectable_skills(&self) -> Vec<(usize, &crate::unit::Skill)> {
        self.active_hero().map_or_else(Vec::new, |hero| {
            hero.skills
                .iter()
                .enumerate()
                .filter(|(_, skill)| skill.unlocked)
                .collect()
        })
    }

    /// Submits the active hero's action. With the configured probability a
    /// minigame is interposed and the action parks until
    /// [`Self::resolve_minigame`] supplies the outcome.
    ///
    /// # Errors
    ///
    /// Rejected when the battle is over, an action is in flight, it is not
    /// the player's turn, the skill is locked/missing, or the target is
    /// invalid for the skill kind.
    pub fn submit_action(
        &mut self,
        skill_index: usize,
        target_id: &str,
    ) -> Result<ActionGate, BattleError> {
        self.guard_player_input()?;
        let actor = self.active_hero().ok_or(BattleError::NoActiveHero)?;
        let actor_id = actor.id.clone();
        let skill = actor
            .skills
            .get(skill_index)
            .filter(|skill| skill.unlocked)
            .ok_or(BattleError::InvalidSkill(skill_index))?;
        match skill.kind {
            SkillKind::Heal => {
                if !self.is_living_hero(target_id) {
                    return Err(BattleError::InvalidTarget);
                }
            }
            SkillKind::Attack => {
                if !self.is_living_enemy(target_id) {
                    return Err(BattleError::InvalidTarget);
                }
            }
        }

        if self.rng.gen_bool(self.minigame_chance) {
            let kind = MinigameKind::random(&mut self.rng);
            self.pending = Some(PendingAction {
                actor_id: actor_id.clone(),
                skill_index,
                target_id: target_id.to_string(),
                session: MinigameSession::start(kind),
            });
            self.phase = BattlePhase::AwaitingMinigame;
            self.busy = true;
            self.events.push(BattleEvent::MinigameStarted {
                actor: actor_id,
                minigame: kind,
            });
            if debug_log_enabled() {
                println!("Battle | minigame {kind} interposed");
            }
            return Ok(ActionGate::MinigameStarted(kind));
        }

        self.resolve_action(&actor_id, skill_index, target_id, 1.0);
        Ok(ActionGate::Resolved)
    }

    /// Feeds the minigame outcome back into the parked action.
    ///
    /// Success lands bonus damage on the target before the boosted action;
    /// failure costs the actor a fraction of their own max hp before the
    /// penalized action resolves. Returns the resolved success flag.
    ///
    /// # Errors
    ///
    /// Rejected when no action is pending or the battle is over.
    pub fn resolve_minigame(&mut self, input: MinigameInput) -> Result<bool, BattleError> {
        if self.phase.is_terminal() {
            return Err(BattleError::Finished);
        }
        let pending = self.pending.take().ok_or(BattleError::NoPendingAction)?;
        let success = pending.session.resolve(input);
        self.busy = false;
        self.phase = BattlePhase::PlayerTurnSelect;
        self.events.push(BattleEvent::MinigameResolved {
            actor: pending.actor_id.clone(),
            success,
        });

        if success {
            self.log.push(String::from(LOG_MINIGAME_SUCCESS));
            if let Some(target) = self.enemies.iter_mut().find(|e| e.id == pending.target_id) {
                let bonus = (target.effective_max_hp() as f32 * MINIGAME_BONUS_FRACTION).floor()
                    as i32;
                target.apply_damage(bonus);
                let target_id = target.id.clone();
                self.events.push(BattleEvent::DamageDealt {
                    source: pending.actor_id.clone(),
                    target: target_id,
                    amount: bonus,
                    crit: true,
                });
            }
            self.resolve_action(
                &pending.actor_id,
                pending.skill_index,
                &pending.target_id,
                MINIGAME_SUCCESS_MULT,
            );
        } else {
            self.log.push(String::from(LOG_MINIGAME_FAILURE));
            if let Some(actor) = self.heroes.iter_mut().find(|h| h.id == pending.actor_id) {
                let penalty = (actor.effective_max_hp() as f32 * MINIGAME_PENALTY_FRACTION)
                    .floor() as i32;
                actor.apply_damage(penalty);
                self.events.push(BattleEvent::SelfDamage {
                    actor: pending.actor_id.clone(),
                    amount: penalty,
                });
                self.events.push(BattleEvent::Sound { cue: SoundCue::Defeat });
            }
            // The penalized action still resolves; the end-state check after
            // it sees both the self-damage and the action's damage, and the
            // enemy side is evaluated first (victory wins a simultaneous
            // elimination).
            self.resolve_action(
                &pending.actor_id,
                pending.skill_index,
                &pending.target_id,
                MINIGAME_FAILURE_MULT,
            );
        }
        Ok(success)
    }

    /// Party-wide heal-over-taps ultimate, gated by a turn cooldown.
    ///
    /// # Errors
    ///
    /// Rejected while recharging, while an action is resolving, or once the
    /// battle is over.
    pub fn use_resonance(&mut self, taps: u32) -> Result<ResonanceOutcome, BattleError> {
        self.guard_player_input()?;
        if self.resonance_cooldown > 0 {
            return Err(BattleError::ResonanceCharging(self.resonance_cooldown));
        }
        let heal = (taps as i32) * RESONANCE_HEAL_PER_TAP + RESONANCE_HEAL_BASE;
        for hero in self.heroes.iter_mut().filter(|h| h.is_alive()) {
            hero.apply_heal(heal);
        }
        self.resonance_cooldown = RESONANCE_COOLDOWN_TURNS;
        self.log.push(String::from(LOG_RESONANCE_USED));
        self.events.push(BattleEvent::ResonanceHeal { taps, amount: heal });
        self.events.push(BattleEvent::Sound { cue: SoundCue::Magic });
        let buff_granted = taps >= RESONANCE_BUFF_TAP_THRESHOLD;
        if buff_granted {
            self.strength_buff_actions = RESONANCE_BUFF_DURATION;
            self.log.push(String::from(LOG_RESONANCE_BUFF));
            self.events.push(BattleEvent::StrengthBuffGained {
                actions: RESONANCE_BUFF_DURATION,
            });
        }
        Ok(ResonanceOutcome {
            heal_amount: heal,
            buff_granted,
        })
    }

    /// Full abort of the encounter. No rewards, no roster write-back.
    ///
    /// # Errors
    ///
    /// Rejected while an action (including its minigame gate) is resolving
    /// or once the battle is over.
    pub fn retreat(&mut self) -> Result<(), BattleError> {
        if self.phase.is_terminal() {
            return Err(BattleError::Finished);
        }
        if self.busy || self.pending.is_some() {
            return Err(BattleError::Busy);
        }
        self.phase = BattlePhase::Retreated;
        self.log.push(String::from(LOG_RETREAT));
        self.events.push(BattleEvent::BattleEnded {
            outcome: BattleOutcome::Retreated,
        });
        Ok(())
    }

    // Internals ------------------------------------------------------------

    fn guard_player_input(&self) -> Result<(), BattleError> {
        if self.phase.is_terminal() {
            return Err(BattleError::Finished);
        }
        if self.busy || self.pending.is_some() {
            return Err(BattleError::Busy);
        }
        if self.phase != BattlePhase::PlayerTurnSelect {
            return Err(BattleError::NotPlayerTurn);
        }
        Ok(())
    }

    fn is_living_hero(&self, id: &str) -> bool {
        self.heroes.iter().any(|h| h.id == id && h.is_alive())
    }

    fn is_living_enemy(&self, id: &str) -> bool {
        self.enemies.iter().any(|e| e.id == id && e.is_alive())
    }

    fn spawn_wave(&mut self, index: usize) {
        self.wave_index = index;
        self.enemies = self
            .waves
            .get(index)
            .cloned()
            .unwrap_or_default();
        for enemy in &mut self.enemies {
            enemy.clear_battle_state();
            enemy.hp = enemy.effective_max_hp();
        }
        self.log
            .push(format!("{LOG_WAVE_SPAWN_PREFIX}{}", index + 1));
        self.events.push(BattleEvent::WaveSpawned {
            wave: index,
            enemy_count: self.enemies.len(),
        });
        if debug_log_enabled() {
            println!(
                "Battle | wave {} spawned with {} enemies",
                index + 1,
                self.enemies.len()
            );
        }
    }

    /// Ticks the resonance cooldown on every entry into the player turn.
    fn begin_player_round(&mut self) {
        self.resonance_cooldown = self.resonance_cooldown.saturating_sub(1);
    }

    fn power_multiplier(&self, skill_power: f32, external_mult: f32) -> f32 {
        let mut mult = (skill_power / SKILL_POWER_DIVISOR) * external_mult;
        if self.strength_buff_actions > 0 {
            mult *= STRENGTH_BUFF_MULT;
        }
        mult
    }

    /// Applies the action, marks the actor as acted, and advances the round.
    /// The caller has already validated actor, skill, and target.
    fn resolve_action(
        &mut self,
        actor_id: &str,
        skill_index: usize,
        target_id: &str,
        external_mult: f32,
    ) {
        let Some(actor) = self.heroes.iter().find(|h| h.id == actor_id) else {
            return;
        };
        let Some(skill) = actor.skills.get(skill_index).cloned() else {
            return;
        };
        let attack = actor.effective_attack();
        let actor_name = actor.name.clone();
        let power_mult = self.power_multiplier(skill.power, external_mult);

        match skill.kind {
            SkillKind::Heal => {
                let amount = (attack * power_mult).floor() as i32;
                if let Some(target) = self.heroes.iter_mut().find(|h| h.id == target_id) {
                    let restored = target.apply_heal(amount);
                    let target_id = target.id.clone();
                    self.events.push(BattleEvent::Healed {
                        source: actor_id.to_string(),
                        target: target_id,
                        amount: restored,
                    });
                    self.events.push(BattleEvent::Sound { cue: SoundCue::Heal });
                }
                self.log.push(String::from(LOG_ACTION_HEAL));
            }
            SkillKind::Attack => {
                let crit = external_mult > CRIT_MULT_THRESHOLD
                    || self.rng.gen_bool(CRIT_ROLL_CHANCE);
                if let Some(target) = self.enemies.iter_mut().find(|e| e.id == target_id) {
                    let damage = compute_damage(attack, power_mult, target.effective_defense());
                    target.apply_damage(damage);
                    let target_id = target.id.clone();
                    self.events.push(BattleEvent::DamageDealt {
                        source: actor_id.to_string(),
                        target: target_id,
                        amount: damage,
                        crit,
                    });
                    self.events.push(BattleEvent::Sound { cue: SoundCue::Slash });
                }
                self.log.push(String::from(LOG_ACTION_ATTACK));
                if debug_log_enabled() {
                    println!("Battle | {actor_name} uses {} (x{power_mult:.2})", skill.name);
                }
            }
        }

        self.acted.insert(actor_id.to_string());
        if self.strength_buff_actions > 0 {
            self.strength_buff_actions -= 1;
        }

        if self.check_end_state() {
            return;
        }
        if self.all_living_heroes_acted() {
            self.enemy_turn();
        }
    }

    fn all_living_heroes_acted(&self) -> bool {
        self.heroes
            .iter()
            .filter(|h| h.is_alive())
            .all(|h| self.acted.contains(&h.id))
    }

    /// Every living enemy acts in roster order against a uniformly random
    /// living hero. No minigames, no buffs on this side.
    fn enemy_turn(&mut self) {
        self.phase = BattlePhase::EnemyTurn;
        self.log.push(String::from(LOG_ENEMY_TURN));

        for idx in 0..self.enemies.len() {
            if !self.enemies[idx].is_alive() {
                continue;
            }
            let living: Vec<usize> = self
                .heroes
                .iter()
                .enumerate()
                .filter(|(_, h)| h.is_alive())
                .map(|(i, _)| i)
                .collect();
            let Some(&target_idx) = living.get(self.rng.gen_range(0..living.len().max(1))) else {
                break;
            };
            let enemy = &self.enemies[idx];
            let enemy_id = enemy.id.clone();
            let attack = enemy.effective_attack();
            let power = enemy
                .skills
                .first()
                .map_or(10.0, |skill| skill.power);
            let power_mult = power / SKILL_POWER_DIVISOR;

            let target = &mut self.heroes[target_idx];
            let damage = compute_damage(attack, power_mult, target.effective_defense());
            target.apply_damage(damage);
            let target_id = target.id.clone();
            self.events.push(BattleEvent::DamageDealt {
                source: enemy_id,
                target: target_id,
                amount: damage,
                crit: false,
            });
            self.events.push(BattleEvent::Sound { cue: SoundCue::Slash });

            if self.check_end_state() {
                return;
            }
        }

        self.acted.clear();
        self.begin_player_round();
        self.phase = BattlePhase::PlayerTurnSelect;
    }

    /// Evaluates end conditions immediately after a mutation. The enemy side
    /// is checked first: a simultaneous elimination resolves as victory.
    fn check_end_state(&mut self) -> bool {
        if self.enemies.iter().all(Unit::is_downed) {
            if self.wave_index + 1 < self.waves.len() {
                self.phase = BattlePhase::WaveTransition;
                let next = self.wave_index + 1;
                self.spawn_wave(next);
                self.acted.clear();
                self.begin_player_round();
                self.phase = BattlePhase::PlayerTurnSelect;
                return false;
            }
            self.phase = BattlePhase::Victory;
            self.log.push(String::from(LOG_VICTORY));
            self.events.push(BattleEvent::Sound { cue: SoundCue::Victory });
            self.events.push(BattleEvent::BattleEnded {
                outcome: BattleOutcome::Victory,
            });
            return true;
        }
        if self.heroes.iter().all(Unit::is_downed) {
            self.phase = BattlePhase::Defeat;
            self.log.push(String::from(LOG_DEFEAT));
            self.events.push(BattleEvent::Sound { cue: SoundCue::Defeat });
            self.events.push(BattleEvent::BattleEnded {
                outcome: BattleOutcome::Defeat,
            });
            return true;
        }
        false
    }
}

/// `max(1, floor(attack * power_mult) - defense)`. Damage never drops below
/// one regardless of defense magnitude.
#[must_use]
pub fn compute_damage(attack: f32, power_mult: f32, defense: f32) -> i32 {
    (((attack * power_mult).floor() - defense.floor()) as i32).max(1)
}
