//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::big::Big;
use crate::catalog::{BuildingDef, ByproductTable, Catalog, CatalogBuilder, ContainerDef, Recipe};
use crate::config::SimConfig;
use crate::engine::Engine;
use crate::id::ItemId;
use std::sync::Arc;

// ===========================================================================
// Number helpers
// ===========================================================================

pub fn big(n: i64) -> Big {
    Big::from(n)
}

/// Parse a decimal literal such as `"0.25"`. Panics on bad input.
pub fn dec(s: &str) -> Big {
    s.parse().expect("valid decimal literal")
}

// ===========================================================================
// Smelting catalog
// ===========================================================================

/// A small catalog covering every scheduler feature:
///
/// - `ore`, `coal`, `booster`: raw, unbounded
/// - `plate`: 1 ore -> 1 plate in 1 s, made in a `furnace`, stored in `chest`
/// - `gear`: 2 plate -> 1 gear in 2 s, made in a coal-powered `assembler`,
///   disabled by default
/// - `slag`: 1 ore in 1 s, yields `gravel` or `sand` at 1:3 via a `crusher`
pub struct Smelting {
    pub catalog: Arc<Catalog>,
    pub ore: ItemId,
    pub coal: ItemId,
    pub booster: ItemId,
    pub plate: ItemId,
    pub gear: ItemId,
    pub slag: ItemId,
    pub gravel: ItemId,
    pub sand: ItemId,
    pub furnace: ItemId,
    pub assembler: ItemId,
    pub crusher: ItemId,
    pub chest: ItemId,
}

impl Smelting {
    pub fn build() -> Self {
        let mut b = CatalogBuilder::new();
        let ore = b.register_item("ore");
        let coal = b.register_item("coal");
        let booster = b.register_item("booster");
        let plate = b.register_item("plate");
        let gear = b.register_item("gear");
        let slag = b.register_item("slag");
        let gravel = b.register_item("gravel");
        let sand = b.register_item("sand");
        let furnace = b.register_item("furnace");
        let assembler = b.register_item("assembler");
        let crusher = b.register_item("crusher");
        let chest = b.register_item("chest");

        b.set_recipe(plate, vec![(ore, big(1))], big(1));
        b.set_recipe(gear, vec![(plate, big(2))], big(2));
        b.set_recipe(slag, vec![(ore, big(1))], big(1));

        b.item_mut(furnace).unwrap().building = Some(BuildingDef {
            boost_item: Some(booster),
            ..BuildingDef::default()
        });
        b.item_mut(assembler).unwrap().building = Some(BuildingDef {
            power: Recipe::from([(coal, big(1))]),
            ..BuildingDef::default()
        });
        b.item_mut(crusher).unwrap().building = Some(BuildingDef::default());
        b.item_mut(chest).unwrap().container = Some(ContainerDef { capacity: big(50) });

        let def = b.item_mut(plate).unwrap();
        def.producers = vec![furnace];
        def.storage = Some(vec![chest]);

        let def = b.item_mut(gear).unwrap();
        def.producers = vec![assembler];
        def.storage = Some(vec![chest]);
        def.disabled_by_default = true;

        let def = b.item_mut(slag).unwrap();
        def.producers = vec![crusher];
        def.byproducts = vec![ByproductTable::new(vec![(gravel, 1), (sand, 3)])];

        Self {
            catalog: Arc::new(b.build().expect("smelting catalog is valid")),
            ore,
            coal,
            booster,
            plate,
            gear,
            slag,
            gravel,
            sand,
            furnace,
            assembler,
            crusher,
            chest,
        }
    }
}

/// A fresh engine over the smelting catalog with default config.
pub fn smelting_engine() -> (Engine, Smelting) {
    smelting_engine_with(SimConfig::default())
}

pub fn smelting_engine_with(config: SimConfig) -> (Engine, Smelting) {
    let smelting = Smelting::build();
    let engine = Engine::new(Arc::clone(&smelting.catalog), config);
    (engine, smelting)
}

// ===========================================================================
// Chain catalog
// ===========================================================================

/// A linear production chain `t0 -> t1 -> ... -> t{n}`. Each tier turns two
/// of the previous tier into one in one second, in a shared `mill`. `t0` is
/// raw; every tier is unbounded.
pub struct Chain {
    pub catalog: Arc<Catalog>,
    pub tiers: Vec<ItemId>,
    pub mill: ItemId,
}

impl Chain {
    pub fn build(len: usize) -> Self {
        let mut b = CatalogBuilder::new();
        let mill = b.register_item("mill");
        b.item_mut(mill).unwrap().building = Some(BuildingDef::default());
        let tiers: Vec<ItemId> = (0..=len).map(|i| b.register_item(&format!("t{i}"))).collect();
        for pair in tiers.windows(2) {
            b.set_recipe(pair[1], vec![(pair[0], big(2))], big(1));
            b.item_mut(pair[1]).unwrap().producers = vec![mill];
        }
        Self {
            catalog: Arc::new(b.build().expect("chain catalog is valid")),
            tiers,
            mill,
        }
    }
}

/// An engine over a `len`-tier chain with `mills` mills on every tier and
/// `raw` units of `t0`.
pub fn chain_engine(len: usize, mills: i64, raw: &Big) -> (Engine, Chain) {
    let chain = Chain::build(len);
    let mut engine = Engine::new(Arc::clone(&chain.catalog), SimConfig::default());
    engine.grant(chain.tiers[0], raw);
    for tier in &chain.tiers[1..] {
        engine
            .assign_building(*tier, chain.mill, &big(mills))
            .expect("mill produces every tier");
    }
    (engine, chain)
}

/// Run `n` ticks of `dt` seconds.
pub fn run_ticks(engine: &mut Engine, n: usize, dt: f64) {
    for _ in 0..n {
        engine.tick(dt);
    }
}
