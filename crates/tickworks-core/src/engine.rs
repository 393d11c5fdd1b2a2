//! The simulation engine: owns the session state and drives the production
//! scheduler.
//!
//! # Architecture
//!
//! The `Engine` owns:
//! - A shared, immutable [`Catalog`]
//! - A [`SimConfig`]
//! - A [`SimulationState`]: ledger, assembler and container populations,
//!   per-pair production and power records, recipe flags, clock and RNG
//!
//! There is no global state. Every caller operation goes through `&mut
//! Engine`, so ticks, manual crafts and assignments are serialized by
//! construction.
//!
//! # Tick
//!
//! Each `tick(dt)` clamps `dt`, then steps every (item, building) pair with
//! a non-zero population in canonical `PairKey` order, then advances the
//! clock.

use crate::big::Big;
use crate::byproduct::{self, CreditOutcome};
use crate::catalog::Catalog;
use crate::config::SimConfig;
use crate::id::{ItemId, PairKey};
use crate::ledger::Ledger;
use crate::power::PowerRecord;
use crate::production::{self, PairStep, ProductionRecord};
use crate::rng::SimRng;
use crate::sim::{SimClock, StateHash};
use crate::storage::{Populations, StorageCalculator};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// Everything that changes during a session. Exclusively owned by the
/// [`Engine`]; persisted as a whole by snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    pub ledger: Ledger,
    pub assemblers: Populations,
    pub containers: Populations,
    pub production: BTreeMap<PairKey, ProductionRecord>,
    pub power: BTreeMap<PairKey, PowerRecord>,
    /// Per-item overrides of the catalog's `disabled_by_default`.
    pub recipe_flags: BTreeMap<ItemId, bool>,
    pub clock: SimClock,
    pub rng: SimRng,
}

impl SimulationState {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            ledger: Ledger::new(),
            assemblers: Populations::new(),
            containers: Populations::new(),
            production: BTreeMap::new(),
            power: BTreeMap::new(),
            recipe_flags: BTreeMap::new(),
            clock: SimClock::new(config.ticks_per_second),
            rng: SimRng::new(config.seed),
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Result of one [`Engine::tick`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickResult {
    /// Production events credited across all pairs.
    pub units_produced: Big,
    pub state_changes: u32,
}

/// Result of [`Engine::craft_by_hand`]. Only `Crafted` changes the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CraftOutcome {
    Crafted(Big),
    /// Called again within the manual-craft cooldown.
    RateLimited,
    /// The item has no usable recipe.
    NoRecipe,
    MissingInputs,
    OutputBlocked,
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("unknown item: {0:?}")]
    UnknownItem(ItemId),
    #[error("{building:?} cannot produce {item:?}")]
    NotAProducer { item: ItemId, building: ItemId },
    #[error("{container:?} cannot store {item:?}")]
    NotAStorage { item: ItemId, container: ItemId },
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Engine {
    pub(crate) catalog: Arc<Catalog>,
    pub(crate) config: SimConfig,
    pub(crate) state: SimulationState,
    pub(crate) last_manual_craft: Option<Instant>,
}

impl Engine {
    /// Start a fresh session.
    pub fn new(catalog: Arc<Catalog>, config: SimConfig) -> Self {
        let state = SimulationState::new(&config);
        Self {
            catalog,
            config,
            state,
            last_manual_craft: None,
        }
    }

    /// Discard the session and start over with the same catalog and config.
    pub fn reset(&mut self) {
        self.state = SimulationState::new(&self.config);
        self.last_manual_craft = None;
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn ledger(&self) -> &Ledger {
        &self.state.ledger
    }

    pub fn assemblers(&self) -> &Populations {
        &self.state.assemblers
    }

    pub fn containers(&self) -> &Populations {
        &self.state.containers
    }

    pub fn production_record(&self, key: PairKey) -> Option<&ProductionRecord> {
        self.state.production.get(&key)
    }

    pub fn power_record(&self, key: PairKey) -> Option<&PowerRecord> {
        self.state.power.get(&key)
    }

    pub fn play_time(&self) -> f64 {
        self.state.clock.play_time
    }

    pub fn tick_count(&self) -> u64 {
        self.state.clock.tick
    }

    pub fn is_recipe_enabled(&self, item: ItemId) -> bool {
        recipe_enabled(&self.catalog, &self.state.recipe_flags, item)
    }

    /// Maximum holdable amount of `item` right now.
    pub fn capacity(&self, item: ItemId) -> Big {
        self.storage().capacity(item)
    }

    pub fn remaining_capacity(&self, item: ItemId) -> Big {
        self.storage().remaining(item, &self.state.ledger)
    }

    fn storage(&self) -> StorageCalculator<'_> {
        StorageCalculator {
            catalog: &self.catalog,
            assemblers: &self.state.assemblers,
            containers: &self.state.containers,
            base: self.config.base_storage(),
        }
    }

    /// Deterministic hash of the session state.
    pub fn state_hash(&self) -> u64 {
        let mut h = StateHash::new();
        h.write_u64(self.state.clock.tick);
        for (item, entry) in self.state.ledger.iter() {
            h.write_u32(item.0);
            h.write_big(&entry.on_hand);
        }
        for (key, count) in self.state.assemblers.iter().chain(self.state.containers.iter()) {
            h.write_u32(key.item.0);
            h.write_u32(key.kind.0);
            h.write_big(count);
        }
        for (key, record) in &self.state.production {
            h.write_u32(key.item.0);
            h.write_u32(key.kind.0);
            h.write_big(&record.progress);
            h.write_u32(record.state as u32);
        }
        for (key, record) in &self.state.power {
            h.write_u32(key.item.0);
            h.write_u32(key.kind.0);
            h.write_u32(record.progress);
            h.write_u32(record.state as u32);
        }
        h.write_u64(self.state.rng.state());
        h.finish()
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance the simulation by `dt` seconds, clamped to `[0, max_dt]`.
    pub fn tick(&mut self, dt: f64) -> TickResult {
        let dt = self.config.clamp_dt(dt);
        let dt_big = Big::from_f64(dt);
        let base = self.config.base_storage();
        let catalog = &*self.catalog;
        let config = &self.config;
        let SimulationState {
            ledger,
            assemblers,
            containers,
            production,
            power,
            recipe_flags,
            clock,
            rng,
        } = &mut self.state;

        let mut result = TickResult::default();
        for key in assemblers.keys() {
            if !recipe_enabled(catalog, recipe_flags, key.item) {
                continue;
            }
            let Some(def) = catalog.item(key.item) else {
                continue;
            };
            let Some(recipe) = def.recipe.as_ref() else {
                continue;
            };
            if !recipe.craft_time.is_positive() {
                continue;
            }
            let Some(building) = catalog.building(key.kind) else {
                continue;
            };

            let count = assemblers.count(key).clone();
            let boost = building
                .boost_item
                .map(|boost| production::boost_exponent(ledger.amount_of(boost), config.max_boost_exponent))
                .unwrap_or(0);
            let apt = production::amount_per_tick(building, &count, &dt_big, &recipe.craft_time, boost);
            let pair = PairStep {
                item: key.item,
                def,
                recipe,
                building,
                count: &count,
                amount_per_tick: &apt,
                previous_fps: clock.previous_fps,
                power_cycle_ticks: config.power_cycle_ticks(),
            };
            let storage = StorageCalculator {
                catalog,
                assemblers,
                containers,
                base: base.clone(),
            };
            let record = production.entry(key).or_default();
            let power_record = power.entry(key).or_default();
            let step = record.step(&pair, power_record, ledger, &storage, rng);
            result.units_produced = &result.units_produced + &step.units;
            if step.state_changed {
                result.state_changes += 1;
            }
        }
        clock.advance(dt);
        result
    }

    // -----------------------------------------------------------------------
    // Manual crafting
    // -----------------------------------------------------------------------

    /// Produce up to `count` units of `item` by hand, at most once per
    /// cooldown. Uses the same consume / credit path as buildings:
    /// the storage-limited amount is consumed all-or-nothing, then credited.
    pub fn craft_by_hand(&mut self, item: ItemId, count: &Big, now: Instant) -> CraftOutcome {
        if let Some(last) = self.last_manual_craft
            && now.saturating_duration_since(last) < self.config.manual_craft_cooldown()
        {
            return CraftOutcome::RateLimited;
        }
        self.last_manual_craft = Some(now);

        let catalog = &*self.catalog;
        let Some(def) = catalog.item(item) else {
            return CraftOutcome::NoRecipe;
        };
        let Some(recipe) = def.recipe.as_ref() else {
            return CraftOutcome::NoRecipe;
        };

        let base = self.config.base_storage();
        let SimulationState {
            ledger,
            assemblers,
            containers,
            rng,
            ..
        } = &mut self.state;
        let storage = StorageCalculator {
            catalog,
            assemblers,
            containers,
            base,
        };

        let outputs = byproduct::resolve_outputs(item, Some(def), rng);
        let units = byproduct::fit(&outputs, count, &storage, ledger);
        if units < Big::one() {
            return CraftOutcome::OutputBlocked;
        }
        if !ledger.try_consume(&recipe.ingredients, &units) {
            return CraftOutcome::MissingInputs;
        }
        match byproduct::credit(&outputs, &units, &storage, ledger) {
            CreditOutcome::Credited(credited) => {
                debug!(item = item.0, units = %credited, "crafted by hand");
                CraftOutcome::Crafted(credited)
            }
            CreditOutcome::Blocked => CraftOutcome::OutputBlocked,
        }
    }

    // -----------------------------------------------------------------------
    // Ledger access
    // -----------------------------------------------------------------------

    /// Add up to `amount` of `item`, capped by remaining storage. Returns the
    /// amount actually added.
    pub fn grant(&mut self, item: ItemId, amount: &Big) -> Big {
        if !amount.is_positive() {
            return Big::zero();
        }
        let added = std::cmp::min(amount.clone(), self.remaining_capacity(item));
        self.state.ledger.add(item, &added);
        added
    }

    /// Best-effort withdrawal. Returns the amount removed.
    pub fn withdraw(&mut self, item: ItemId, amount: &Big) -> Big {
        self.state.ledger.remove(item, amount)
    }

    // -----------------------------------------------------------------------
    // Assignments
    // -----------------------------------------------------------------------

    /// Change the number of `building` instances producing `item`. Returns
    /// the new count. A reduction clamps `item` to its new capacity.
    pub fn assign_building(&mut self, item: ItemId, building: ItemId, delta: &Big) -> Result<Big, EngineError> {
        self.require_item(item)?;
        self.require_item(building)?;
        if !self.catalog.is_producer(item, building) {
            return Err(EngineError::NotAProducer { item, building });
        }
        let count = self.state.assemblers.adjust(PairKey::new(item, building), delta);
        debug!(item = item.0, building = building.0, count = %count, "assigned buildings");
        if delta.is_negative() {
            self.clamp_to_capacity(item);
        }
        Ok(count)
    }

    /// Change the number of `container` instances holding `item`. Returns
    /// the new count. A reduction clamps `item` to its new capacity.
    pub fn assign_container(&mut self, item: ItemId, container: ItemId, delta: &Big) -> Result<Big, EngineError> {
        self.require_item(item)?;
        self.require_item(container)?;
        if !self.catalog.can_store(item, container) || self.catalog.container(container).is_none() {
            return Err(EngineError::NotAStorage { item, container });
        }
        let count = self.state.containers.adjust(PairKey::new(item, container), delta);
        debug!(item = item.0, container = container.0, count = %count, "assigned containers");
        if delta.is_negative() {
            self.clamp_to_capacity(item);
        }
        Ok(count)
    }

    pub fn set_recipe_enabled(&mut self, item: ItemId, enabled: bool) -> Result<(), EngineError> {
        self.require_item(item)?;
        self.state.recipe_flags.insert(item, enabled);
        debug!(item = item.0, enabled, "recipe toggled");
        Ok(())
    }

    fn require_item(&self, item: ItemId) -> Result<(), EngineError> {
        match self.catalog.item(item) {
            Some(_) => Ok(()),
            None => Err(EngineError::UnknownItem(item)),
        }
    }

    fn clamp_to_capacity(&mut self, item: ItemId) {
        let cap = self.capacity(item);
        if self.state.ledger.clamp_to(item, &cap) {
            debug!(item = item.0, cap = %cap, "clamped to shrunken storage");
        }
    }
}

fn recipe_enabled(catalog: &Catalog, flags: &BTreeMap<ItemId, bool>, item: ItemId) -> bool {
    match flags.get(&item) {
        Some(enabled) => *enabled,
        None => catalog.item(item).is_some_and(|def| !def.disabled_by_default),
    }
}

// ===========================================================================
// Tests
// ===========================================================================
