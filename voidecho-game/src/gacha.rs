//! Gacha roll engine: weighted-rarity sampling and pool selection.
use rand::{Rng, RngCore};

use crate::constants::{
    GACHA_BOUND_EPIC, GACHA_BOUND_INSANE, GACHA_BOUND_LEGENDARY, GACHA_BOUND_UBER,
};
use crate::data::Catalog;
use crate::unit::{Equipment, Rarity, Unit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GachaPool {
    Hero,
    Item,
}

/// One drawn entry, already stamped with a fresh instance id.
#[derive(Debug, Clone, PartialEq)]
pub enum GachaDraw {
    Hero(Unit),
    Item(Equipment),
}

impl GachaDraw {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Hero(unit) => &unit.name,
            Self::Item(item) => &item.name,
        }
    }

    #[must_use]
    pub const fn rarity(&self) -> Rarity {
        match self {
            Self::Hero(unit) => unit.rarity,
            Self::Item(item) => item.rarity,
        }
    }
}

/// Maps a uniform roll in [0, 100) onto the cumulative rarity table.
/// There is deliberately no pity mechanic; the table is the whole contract.
#[must_use]
pub fn rarity_for_roll(roll: f64) -> Rarity {
    if roll < GACHA_BOUND_INSANE {
        Rarity::Insane
    } else if roll < GACHA_BOUND_UBER {
        Rarity::UberSuperRare
    } else if roll < GACHA_BOUND_LEGENDARY {
        Rarity::Legendary
    } else if roll < GACHA_BOUND_EPIC {
        Rarity::Epic
    } else {
        Rarity::Rare
    }
}

/// Draws a single entry from the requested pool.
///
/// The selected tier's subset is sampled uniformly; an empty subset falls
/// back to the base (Rare) tier. The returned copy carries a freshly
/// generated instance id — roster de-duplication happens by name, not id.
pub fn roll_one<R: Rng>(catalog: &Catalog, pool: GachaPool, rng: &mut R) -> GachaDraw {
    let roll = rng.gen_range(0.0..100.0);
    let rarity = rarity_for_roll(roll);
    match pool {
        GachaPool::Hero => GachaDraw::Hero(sample_hero(catalog, rarity, rng)),
        GachaPool::Item => GachaDraw::Item(sample_item(catalog, rarity, rng)),
    }
}

/// `count` independent draws. Batching adds no guarantee beyond the table.
pub fn roll_many<R: Rng>(
    catalog: &Catalog,
    pool: GachaPool,
    count: u32,
    rng: &mut R,
) -> Vec<GachaDraw> {
    (0..count).map(|_| roll_one(catalog, pool, rng)).collect()
}

pub(crate) fn fresh_instance_id(prefix: &str, rng: &mut impl RngCore) -> String {
    format!("{prefix}-{:016x}", rng.next_u64())
}

fn sample_hero<R: Rng>(catalog: &Catalog, rarity: Rarity, rng: &mut R) -> Unit {
    let subset: Vec<&Unit> = catalog
        .hero_pool
        .iter()
        .filter(|hero| hero.rarity == rarity)
        .collect();
    let subset = if subset.is_empty() {
        catalog
            .hero_pool
            .iter()
            .filter(|hero| hero.rarity == Rarity::Rare)
            .collect()
    } else {
        subset
    };
    let mut hero = subset[rng.gen_range(0..subset.len())].clone();
    hero.id = fresh_instance_id("hero", rng);
    hero
}

fn sample_item<R: Rng>(catalog: &Catalog, rarity: Rarity, rng: &mut R) -> Equipment {
    let subset: Vec<&Equipment> = catalog
        .gacha_equipment
        .iter()
        .filter(|item| item.rarity == rarity)
        .collect();
    let subset = if subset.is_empty() {
        catalog
            .gacha_equipment
            .iter()
            .filter(|item| item.rarity == Rarity::Rare)
            .collect()
    } else {
        subset
    };
    let mut item = subset[rng.gen_range(0..subset.len())].clone();
    item.id = fresh_instance_id("eq", rng);
    item
}
