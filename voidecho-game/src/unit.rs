//! Combatant model: heroes, enemies, skills, equipment, and derived stats.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{
    EXP_GROWTH_FACTOR, LEVEL_ATTACK_GAIN, LEVEL_DEFENSE_GAIN, LEVEL_HP_GAIN,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Allegiance {
    #[default]
    Hero,
    Enemy,
}

/// Cosmetic classification tag. Not consulted by any damage formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trait {
    #[default]
    Void,
    Crimson,
    Aether,
    Steel,
    Nebula,
    Behemoth,
    Hero,
    Solar,
    Lunar,
    Storm,
    Venom,
    Frost,
    Chaos,
    Phantom,
    Glitch,
    Prime,
}

impl Trait {
    pub const ALL: [Self; 16] = [
        Self::Void,
        Self::Crimson,
        Self::Aether,
        Self::Steel,
        Self::Nebula,
        Self::Behemoth,
        Self::Hero,
        Self::Solar,
        Self::Lunar,
        Self::Storm,
        Self::Venom,
        Self::Frost,
        Self::Chaos,
        Self::Phantom,
        Self::Glitch,
        Self::Prime,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Void => "VOID",
            Self::Crimson => "CRIMSON",
            Self::Aether => "AETHER",
            Self::Steel => "STEEL",
            Self::Nebula => "NEBULA",
            Self::Behemoth => "BEHEMOTH",
            Self::Hero => "HERO",
            Self::Solar => "SOLAR",
            Self::Lunar => "LUNAR",
            Self::Storm => "STORM",
            Self::Venom => "VENOM",
            Self::Frost => "FROST",
            Self::Chaos => "CHAOS",
            Self::Phantom => "PHANTOM",
            Self::Glitch => "GLITCH",
            Self::Prime => "PRIME",
        }
    }
}

impl fmt::Display for Trait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quality tier driving gacha odds and catalog stat multipliers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rarity {
    #[default]
    Common,
    Rare,
    Epic,
    Legendary,
    UberSuperRare,
    Insane,
}

impl Rarity {
    /// Tiers present in the gacha pools, lowest first.
    pub const POOL_TIERS: [Self; 5] = [
        Self::Rare,
        Self::Epic,
        Self::Legendary,
        Self::UberSuperRare,
        Self::Insane,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Common => "COMMON",
            Self::Rare => "RARE",
            Self::Epic => "EPIC",
            Self::Legendary => "LEGENDARY",
            Self::UberSuperRare => "UBER_SUPER_RARE",
            Self::Insane => "INSANE",
        }
    }

    /// Catalog stat multiplier for pool tiers (1 for Rare up to 5 for Insane).
    #[must_use]
    pub fn pool_multiplier(self) -> u32 {
        Self::POOL_TIERS
            .iter()
            .position(|tier| *tier == self)
            .map_or(1, |idx| idx as u32 + 1)
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rarity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COMMON" => Ok(Self::Common),
            "RARE" => Ok(Self::Rare),
            "EPIC" => Ok(Self::Epic),
            "LEGENDARY" => Ok(Self::Legendary),
            "UBER_SUPER_RARE" => Ok(Self::UberSuperRare),
            "INSANE" => Ok(Self::Insane),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkillKind {
    Attack,
    Heal,
}

/// An action a unit can perform. Locked skills are never selectable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub description: String,
    pub power: f32,
    pub kind: SkillKind,
    pub unlocked: bool,
    #[serde(default)]
    pub unlock_cost: Option<u64>,
}

impl Skill {
    #[must_use]
    pub fn attack(name: &str, description: &str, power: f32) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            power,
            kind: SkillKind::Attack,
            unlocked: true,
            unlock_cost: None,
        }
    }

    #[must_use]
    pub fn heal(name: &str, description: &str, power: f32) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            power,
            kind: SkillKind::Heal,
            unlocked: true,
            unlock_cost: None,
        }
    }

    #[must_use]
    pub fn locked(mut self, cost: u64) -> Self {
        self.unlocked = false;
        self.unlock_cost = Some(cost);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EquipSlot {
    Weapon,
    Armor,
}

/// The single stat a piece of equipment bonuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BonusStat {
    Attack,
    Defense,
    MaxHp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub id: String,
    pub name: String,
    pub slot: EquipSlot,
    pub stat: BonusStat,
    pub value: i32,
    pub description: String,
    #[serde(default)]
    pub rarity: Rarity,
    #[serde(default, rename = "trait")]
    pub trait_tag: Option<Trait>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusKind {
    Weaken,
    Stun,
    Corruption,
    Burn,
}

/// Battle-transient condition. Cleared whenever a battle starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub kind: StatusKind,
    pub duration: u32,
}

/// Weapon and armor slots. At most one item each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UnitEquipment {
    #[serde(default)]
    pub weapon: Option<Equipment>,
    #[serde(default)]
    pub armor: Option<Equipment>,
}

impl UnitEquipment {
    #[must_use]
    pub const fn slot(&self, slot: EquipSlot) -> &Option<Equipment> {
        match slot {
            EquipSlot::Weapon => &self.weapon,
            EquipSlot::Armor => &self.armor,
        }
    }

    pub const fn slot_mut(&mut self, slot: EquipSlot) -> &mut Option<Equipment> {
        match slot {
            EquipSlot::Weapon => &mut self.weapon,
            EquipSlot::Armor => &mut self.armor,
        }
    }

    fn bonus(&self, stat: BonusStat) -> i32 {
        let weapon = self.weapon.as_ref().filter(|item| item.stat == stat);
        let armor = self.armor.as_ref().filter(|item| item.stat == stat);
        weapon.map_or(0, |item| item.value) + armor.map_or(0, |item| item.value)
    }
}

/// A combatant. Heroes persist in the roster; enemy instances are ephemeral,
/// constructed fresh per wave and discarded after the encounter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: String,
    pub name: String,
    pub allegiance: Allegiance,
    pub level: u32,
    pub exp: u32,
    pub max_exp: u32,
    pub max_hp: i32,
    pub hp: i32,
    pub attack: f32,
    pub defense: f32,
    pub speed: i32,
    #[serde(rename = "trait")]
    pub trait_tag: Trait,
    #[serde(default)]
    pub rarity: Rarity,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub status_effects: Vec<StatusEffect>,
    #[serde(default)]
    pub equipment: UnitEquipment,
}

impl Unit {
    /// Base stat plus matching equipment bonuses. Pure.
    #[must_use]
    pub fn effective_attack(&self) -> f32 {
        self.attack + self.equipment.bonus(BonusStat::Attack) as f32
    }

    #[must_use]
    pub fn effective_defense(&self) -> f32 {
        self.defense + self.equipment.bonus(BonusStat::Defense) as f32
    }

    #[must_use]
    pub fn effective_max_hp(&self) -> i32 {
        self.max_hp + self.equipment.bonus(BonusStat::MaxHp)
    }

    /// A downed unit stays in the roster but cannot act or be auto-targeted.
    #[must_use]
    pub const fn is_downed(&self) -> bool {
        self.hp <= 0
    }

    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn apply_damage(&mut self, amount: i32) {
        self.hp = (self.hp - amount.max(0)).max(0);
    }

    /// Heals up to the effective max, returning the amount actually restored.
    pub fn apply_heal(&mut self, amount: i32) -> i32 {
        let cap = self.effective_max_hp();
        let before = self.hp;
        self.hp = (self.hp + amount.max(0)).min(cap);
        self.hp - before
    }

    /// Grants experience, rolling over as many levels as the amount covers.
    /// Each level grows the exp requirement and stats, and fully heals.
    /// Returns the number of levels gained.
    pub fn grant_exp(&mut self, amount: u32) -> u32 {
        self.exp = self.exp.saturating_add(amount);
        let mut levels = 0;
        while self.max_exp > 0 && self.exp >= self.max_exp {
            self.exp -= self.max_exp;
            self.level += 1;
            self.max_exp = (self.max_exp as f32 * EXP_GROWTH_FACTOR).floor() as u32;
            self.max_hp += LEVEL_HP_GAIN;
            self.attack += LEVEL_ATTACK_GAIN;
            self.defense += LEVEL_DEFENSE_GAIN;
            self.hp = self.effective_max_hp();
            levels += 1;
        }
        levels
    }

    /// Puts `item` into its slot, returning the displaced occupant (if any).
    /// The inventory side of the swap lives in the progression store.
    pub fn equip_slot(&mut self, item: Equipment) -> Option<Equipment> {
        self.equipment.slot_mut(item.slot).replace(item)
    }

    pub fn unequip_slot(&mut self, slot: EquipSlot) -> Option<Equipment> {
        self.equipment.slot_mut(slot).take()
    }

    /// Battle-transient state never survives between encounters.
    pub fn clear_battle_state(&mut self) {
        self.status_effects.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FLOAT_EPSILON;

    fn sample_hero() -> Unit {
        Unit {
            id: String::from("hero-test-1"),
            name: String::from("Kaelen"),
            allegiance: Allegiance::Hero,
            level: 1,
            exp: 0,
            max_exp: 100,
            max_hp: 80,
            hp: 80,
            attack: 10.0,
            defense: 5.0,
            speed: 12,
            trait_tag: Trait::Void,
            rarity: Rarity::Rare,
            skills: vec![Skill::attack("Void Slash", "A quick strike.", 12.0)],
            status_effects: Vec::new(),
            equipment: UnitEquipment::default(),
        }
    }

    fn sample_weapon(value: i32) -> Equipment {
        Equipment {
            id: String::from("w-test"),
            name: String::from("Rusted Edge"),
            slot: EquipSlot::Weapon,
            stat: BonusStat::Attack,
            value,
            description: String::from("Dull but reliable."),
            rarity: Rarity::Common,
            trait_tag: None,
        }
    }

    #[test]
    fn effective_stats_add_matching_equipment_only() {
        let mut hero = sample_hero();
        hero.equip_slot(sample_weapon(8));
        assert!((hero.effective_attack() - 18.0).abs() < FLOAT_EPSILON);
        assert!((hero.effective_defense() - 5.0).abs() < FLOAT_EPSILON);
        assert_eq!(hero.effective_max_hp(), 80);
    }

    #[test]
    fn equip_slot_displaces_previous_occupant() {
        let mut hero = sample_hero();
        assert!(hero.equip_slot(sample_weapon(8)).is_none());
        let displaced = hero.equip_slot(sample_weapon(12)).expect("old weapon");
        assert_eq!(displaced.value, 8);
        assert_eq!(hero.equipment.weapon.as_ref().map(|w| w.value), Some(12));
    }

    #[test]
    fn damage_and_heal_stay_clamped() {
        let mut hero = sample_hero();
        hero.apply_damage(500);
        assert_eq!(hero.hp, 0);
        assert!(hero.is_downed());
        let restored = hero.apply_heal(10_000);
        assert_eq!(restored, 80);
        assert_eq!(hero.hp, hero.effective_max_hp());
    }

    #[test]
    fn grant_exp_rolls_over_multiple_levels() {
        let mut hero = sample_hero();
        let levels = hero.grant_exp(350);
        // 350 - 100 = 250 (max 130), 250 - 130 = 120 (max 169), 120 < 169.
        assert_eq!(levels, 2);
        assert_eq!(hero.level, 3);
        assert_eq!(hero.exp, 120);
        assert_eq!(hero.max_exp, 169);
        assert_eq!(hero.max_hp, 90);
        assert!((hero.attack - 11.6).abs() < FLOAT_EPSILON);
        assert!((hero.defense - 5.8).abs() < FLOAT_EPSILON);
        assert_eq!(hero.hp, hero.effective_max_hp());
    }

    #[test]
    fn grant_exp_exhausts_large_single_grant() {
        let mut hero = sample_hero();
        // 100 + 130 + 169 = 399 consumed across three level-ups.
        let levels = hero.grant_exp(400);
        assert_eq!(levels, 3);
        assert_eq!(hero.level, 4);
        assert_eq!(hero.exp, 1);
        assert_eq!(hero.max_exp, 219);
    }

    #[test]
    fn locked_skill_builder_sets_cost() {
        let skill = Skill::attack("Singularity Gaze", "Crushing damage.", 45.0).locked(6000);
        assert!(!skill.unlocked);
        assert_eq!(skill.unlock_cost, Some(6000));
    }
}
