//! Content catalog: hero and equipment pools, stage table.
//!
//! The original game generated its pools procedurally at startup. Here the
//! catalog is generated once from a fixed seed so every process sees the same
//! pool, which roster merge-by-name and save reconciliation rely on.
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::constants::{CATALOG_SEED, HEROES_PER_RARITY, ITEMS_PER_RARITY, STAGE_COUNT};
use crate::unit::{
    Allegiance, BonusStat, EquipSlot, Equipment, Rarity, Skill, Trait, Unit, UnitEquipment,
};

const NAMES: [&str; 60] = [
    "Kaelen", "Lyra", "Jax", "Seren", "Brutus", "Vex", "Celia", "Orym", "Malphas", "Elias",
    "Soren", "Frey", "Gunnar", "Mina", "Alaric", "Bryn", "Caelum", "Dara", "Elowen", "Fenris",
    "Gala", "Hesper", "Idris", "Juno", "Kael", "Lior", "Mira", "Nyx", "Orion", "Pax", "Quinn",
    "Rune", "Selene", "Thane", "Ursa", "Vora", "Wren", "Xenon", "Yara", "Zephyr", "Astra",
    "Boreas", "Cyra", "Drakon", "Eos", "Fauna", "Gorgon", "Helios", "Iris", "Jace", "Kira",
    "Luna", "Midas", "Nova", "Oberon", "Petra", "Rhea", "Silas", "Titus", "Vesta",
];

/// An encounter definition: one or more waves of enemy templates plus the
/// rewards granted on clear. Unlocked/completed are derived from player
/// progression, not stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub id: u32,
    pub chapter_id: u32,
    pub name: String,
    pub description: String,
    pub lore_note: String,
    pub waves: Vec<Vec<Unit>>,
    #[serde(default)]
    pub is_boss: bool,
    pub exp_reward: u32,
    pub shard_reward: u64,
}

/// The fixed content pools every process shares.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub hero_pool: Vec<Unit>,
    pub gacha_equipment: Vec<Equipment>,
    pub stages: Vec<Stage>,
}

impl Catalog {
    /// The process-wide catalog, generated once from the fixed seed.
    #[must_use]
    pub fn builtin() -> &'static Self {
        static CATALOG: OnceLock<Catalog> = OnceLock::new();
        CATALOG.get_or_init(|| Self::generate(CATALOG_SEED))
    }

    /// Generates a full catalog from a seed. Exposed so tests can build
    /// smaller variants deterministically.
    #[must_use]
    pub fn generate(seed: u64) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        Self {
            hero_pool: generate_hero_pool(&mut rng),
            gacha_equipment: generate_equipment_pool(&mut rng),
            stages: generate_stages(),
        }
    }

    #[must_use]
    pub fn stage(&self, id: u32) -> Option<&Stage> {
        self.stages.iter().find(|stage| stage.id == id)
    }

    /// Starting roster: the first hero of each of the three lowest pool tiers.
    #[must_use]
    pub fn initial_party(&self) -> Vec<Unit> {
        [0, HEROES_PER_RARITY, HEROES_PER_RARITY * 2]
            .iter()
            .filter_map(|&idx| self.hero_pool.get(idx).cloned())
            .collect()
    }

    /// Starting inventory: one common weapon and one common armor piece.
    #[must_use]
    pub fn initial_inventory(&self) -> Vec<Equipment> {
        vec![
            Equipment {
                id: String::from("w1"),
                name: String::from("Rusted Edge"),
                slot: EquipSlot::Weapon,
                stat: BonusStat::Attack,
                value: 8,
                description: String::from("Dull but reliable."),
                rarity: Rarity::Common,
                trait_tag: None,
            },
            Equipment {
                id: String::from("a1"),
                name: String::from("Scavenger Vest"),
                slot: EquipSlot::Armor,
                stat: BonusStat::Defense,
                value: 6,
                description: String::from("Stitched together."),
                rarity: Rarity::Common,
                trait_tag: None,
            },
        ]
    }
}

// Skill base definitions ---------------------------------------------------

fn basic_slash() -> Skill {
    Skill::attack("Void Slash", "A quick dimensional strike.", 12.0)
}

fn arcane_bolt() -> Skill {
    Skill::attack("Spirit Surge", "A blast of pure essence.", 15.0)
}

fn chaos_pulse() -> Skill {
    Skill::attack("Chaos Pulse", "Unpredictable energy.", 25.0)
}

fn solar_flare() -> Skill {
    Skill::attack("Solar Flare", "Blinding light strike.", 30.0)
}

fn frost_nova() -> Skill {
    Skill::attack("Frost Nova", "Slows the enemy's heart.", 18.0)
}

fn oblivion_gaze() -> Skill {
    Skill::attack("Singularity Gaze", "Crushing damage.", 45.0).locked(6000)
}

fn apocalypse() -> Skill {
    Skill::attack("Apocalypse", "Deletes the enemy's timeline.", 999.0)
}

/// The optional high-cost party heal carried by some heroes.
fn celestial_dawn() -> Skill {
    Skill::heal("Celestial Dawn", "Full party restoration.", 180.0).locked(4000)
}

fn mend() -> Skill {
    Skill::heal("Resonance", "Harmonizes and heals an ally.", 65.0)
}

fn standard_skill_set() -> [Skill; 5] {
    [
        basic_slash(),
        arcane_bolt(),
        chaos_pulse(),
        solar_flare(),
        frost_nova(),
    ]
}

// Pool generation ----------------------------------------------------------

fn generate_hero_pool(rng: &mut ChaCha20Rng) -> Vec<Unit> {
    let mut pool = Vec::with_capacity(Rarity::POOL_TIERS.len() * HEROES_PER_RARITY);
    for rarity in Rarity::POOL_TIERS {
        let mult = rarity.pool_multiplier() as i32;
        for i in 0..HEROES_PER_RARITY {
            let trait_tag = Trait::ALL[rng.gen_range(0..Trait::ALL.len())];
            let name = format!("{} {}", NAMES[rng.gen_range(0..NAMES.len())], i + 1);
            let max_hp = 80 * mult + rng.gen_range(0..50);
            let skill_count = 2 + rng.gen_range(0..3);
            let mut skills: Vec<Skill> =
                standard_skill_set().into_iter().take(skill_count).collect();
            if matches!(rarity, Rarity::Insane | Rarity::UberSuperRare) {
                skills.push(apocalypse());
                skills.push(oblivion_gaze());
            } else if skill_count == 2 && rng.gen_bool(0.25) {
                skills.push(mend());
            }
            if rng.gen_bool(0.1) {
                skills.push(celestial_dawn());
            }
            pool.push(Unit {
                id: format!("hero-{}-{i}", rarity.as_str()),
                name,
                allegiance: Allegiance::Hero,
                level: 1,
                exp: 0,
                max_exp: 100 * mult as u32,
                max_hp,
                hp: max_hp,
                attack: (10 * mult + rng.gen_range(0..10)) as f32,
                defense: (5 * mult + rng.gen_range(0..5)) as f32,
                speed: 10 + rng.gen_range(0..10),
                trait_tag,
                rarity,
                skills,
                status_effects: Vec::new(),
                equipment: UnitEquipment::default(),
            });
        }
    }
    pool
}

fn generate_equipment_pool(rng: &mut ChaCha20Rng) -> Vec<Equipment> {
    let mut pool = Vec::with_capacity(Rarity::POOL_TIERS.len() * ITEMS_PER_RARITY);
    for rarity in Rarity::POOL_TIERS {
        let mult = rarity.pool_multiplier() as i32;
        for i in 0..ITEMS_PER_RARITY {
            let slot = if rng.gen_bool(0.5) {
                EquipSlot::Weapon
            } else {
                EquipSlot::Armor
            };
            let stat = match slot {
                EquipSlot::Weapon => BonusStat::Attack,
                EquipSlot::Armor => {
                    if rng.gen_bool(0.5) {
                        BonusStat::Defense
                    } else {
                        BonusStat::MaxHp
                    }
                }
            };
            pool.push(Equipment {
                id: format!("eq-{}-{i}", rarity.as_str()),
                name: format!("{} Relic {}", rarity.as_str(), i + 1),
                slot,
                stat,
                value: 20 * mult + rng.gen_range(0..20),
                description: format!("A signature {} artifact from Sector {i}.", rarity.as_str()),
                rarity,
                trait_tag: Some(Trait::ALL[rng.gen_range(0..Trait::ALL.len())]),
            });
        }
    }
    pool
}

// Stage table --------------------------------------------------------------

fn create_enemy(id: &str, name: &str, hp: i32, atk: f32, def: f32, trait_tag: Trait) -> Unit {
    Unit {
        id: id.to_string(),
        name: name.to_string(),
        allegiance: Allegiance::Enemy,
        level: 1,
        exp: 0,
        max_exp: 0,
        max_hp: hp,
        hp,
        attack: atk,
        defense: def,
        speed: 10,
        trait_tag,
        rarity: Rarity::Common,
        skills: vec![Skill::attack("Strike", "Simple hit.", 10.0)],
        status_effects: Vec::new(),
        equipment: UnitEquipment::default(),
    }
}

fn create_boss(id: &str, name: &str, hp: i32, atk: f32, def: f32, trait_tag: Trait) -> Unit {
    let mut boss = create_enemy(id, name, hp, atk, def, trait_tag);
    boss.skills = vec![Skill::attack("Cataclysm", "A world-ending blow.", 25.0)];
    boss
}

fn generate_stages() -> Vec<Stage> {
    let chapter = 1;
    (1..=STAGE_COUNT)
        .map(|s| {
            let is_boss = s == STAGE_COUNT;
            if is_boss {
                Stage {
                    id: s,
                    chapter_id: chapter,
                    name: String::from("The Singularity Omega"),
                    description: String::from("The final point of collapse."),
                    lore_note: String::from(
                        "Boss signature detected. Damage protocol recalibrated.",
                    ),
                    waves: vec![
                        vec![create_enemy(
                            &format!("e{s}-minion1"),
                            "Void Vanguard",
                            400,
                            32.0,
                            20.0,
                            Trait::Steel,
                        )],
                        vec![create_boss(
                            &format!("e{s}"),
                            "VOID OMEGA",
                            2500,
                            125.0,
                            40.0,
                            Trait::Void,
                        )],
                    ],
                    is_boss,
                    exp_reward: 15_000,
                    shard_reward: 10_000,
                }
            } else {
                let hp = 25 + (s as i32) * 40;
                let atk = (2.5 + (s as f32) * 5.0).floor();
                let def = (1 + s * 2) as f32;
                Stage {
                    id: s,
                    chapter_id: chapter,
                    name: format!("Sector {s}"),
                    description: format!("A dangerous zone in Chapter {chapter}."),
                    lore_note: format!(
                        "Neural signatures detect moderate void activity in Sector {s}."
                    ),
                    waves: vec![vec![create_enemy(
                        &format!("e{s}"),
                        &format!("Void Echo {s}"),
                        hp,
                        atk,
                        def,
                        Trait::Void,
                    )]],
                    is_boss,
                    exp_reward: 200 * s,
                    shard_reward: 400 * u64::from(s),
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_generation_is_deterministic() {
        let a = Catalog::generate(42);
        let b = Catalog::generate(42);
        assert_eq!(a.hero_pool, b.hero_pool);
        assert_eq!(a.gacha_equipment, b.gacha_equipment);
    }

    #[test]
    fn hero_pool_covers_every_gacha_tier() {
        let catalog = Catalog::builtin();
        for rarity in Rarity::POOL_TIERS {
            let count = catalog
                .hero_pool
                .iter()
                .filter(|hero| hero.rarity == rarity)
                .count();
            assert_eq!(count, HEROES_PER_RARITY, "tier {rarity} underpopulated");
        }
    }

    #[test]
    fn top_tier_heroes_carry_signature_skills() {
        let catalog = Catalog::builtin();
        for hero in catalog
            .hero_pool
            .iter()
            .filter(|hero| matches!(hero.rarity, Rarity::Insane | Rarity::UberSuperRare))
        {
            assert!(hero.skills.iter().any(|s| s.name == "Apocalypse"));
            let gaze = hero
                .skills
                .iter()
                .find(|s| s.name == "Singularity Gaze")
                .expect("signature skill present");
            assert!(!gaze.unlocked);
        }
    }

    #[test]
    fn stage_table_shape_matches_campaign() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.stages.len(), STAGE_COUNT as usize);
        let boss = catalog.stage(STAGE_COUNT).expect("boss stage");
        assert!(boss.is_boss);
        assert_eq!(boss.waves.len(), 2);
        assert_eq!(boss.waves[1][0].hp, 2500);
        let first = catalog.stage(1).expect("first stage");
        assert_eq!(first.waves.len(), 1);
        assert_eq!(first.waves[0][0].hp, 65);
        assert_eq!(first.exp_reward, 200);
        assert_eq!(first.shard_reward, 400);
    }

    #[test]
    fn initial_party_spans_three_tiers() {
        let catalog = Catalog::builtin();
        let party = catalog.initial_party();
        assert_eq!(party.len(), 3);
        assert_eq!(party[0].rarity, Rarity::Rare);
        assert_eq!(party[1].rarity, Rarity::Epic);
        assert_eq!(party[2].rarity, Rarity::Legendary);
    }
}
