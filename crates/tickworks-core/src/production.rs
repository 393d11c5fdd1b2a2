//! Per-(item, building) crafting state machine.
//!
//! States are evaluated in order within one tick: a pair leaving
//! `OutputBlocked` is immediately re-evaluated as `NoInput`, and a pair that
//! starts running in `NoInput` accumulates progress in the same tick.

use crate::big::Big;
use crate::byproduct::{self, CreditOutcome};
use crate::catalog::{BuildingDef, ItemDef, RecipeDef};
use crate::id::ItemId;
use crate::ledger::Ledger;
use crate::power::PowerRecord;
use crate::rng::SimRng;
use crate::storage::StorageCalculator;
use serde::{Deserialize, Serialize};
use tracing::debug;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProductionState {
    #[default]
    NoInput,
    Running,
    OutputBlocked,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductionRecord {
    /// Fractional units accumulated toward the next output. Negative right
    /// after entering `Running`.
    pub progress: Big,
    pub state: ProductionState,
}

/// What one step of a pair did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepResult {
    /// Whole production events credited this tick.
    pub units: Big,
    pub state_changed: bool,
}

/// Read-only inputs for stepping one pair.
pub struct PairStep<'a> {
    pub item: ItemId,
    pub def: &'a ItemDef,
    pub recipe: &'a RecipeDef,
    pub building: &'a BuildingDef,
    /// Building instances assigned to the pair.
    pub count: &'a Big,
    pub amount_per_tick: &'a Big,
    pub previous_fps: u32,
    pub power_cycle_ticks: u32,
}

/// `speed × count × dt / craft_time × 2^boost`. A zero craft time is the
/// caller's responsibility to skip.
pub fn amount_per_tick(building: &BuildingDef, count: &Big, dt: &Big, craft_time: &Big, boost_exponent: u32) -> Big {
    let base = &(&building.speed * count) * dt / craft_time;
    if boost_exponent == 0 {
        return base;
    }
    let boost = Big::from(2).pow(i32::try_from(boost_exponent).unwrap_or(i32::MAX));
    base * boost
}

/// Boost exponent from the amount of the boost item on hand, capped.
pub fn boost_exponent(on_hand: &Big, cap: u32) -> u32 {
    on_hand.floor().to_u32_saturating().min(cap)
}

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

impl ProductionRecord {
    pub fn step(
        &mut self,
        pair: &PairStep<'_>,
        power: &mut PowerRecord,
        ledger: &mut Ledger,
        storage: &StorageCalculator<'_>,
        rng: &mut SimRng,
    ) -> StepResult {
        let mut result = StepResult::default();

        if self.state == ProductionState::OutputBlocked {
            let outputs = byproduct::resolve_outputs(pair.item, Some(pair.def), rng);
            match byproduct::credit(&outputs, &Big::one(), storage, ledger) {
                CreditOutcome::Credited(units) => {
                    result.units = units;
                    self.progress = Big::zero();
                    self.transition(pair.item, ProductionState::NoInput, &mut result);
                }
                CreditOutcome::Blocked => return result,
            }
        }

        if self.state == ProductionState::NoInput {
            if !power.is_powered(&pair.building.power, pair.count, ledger)
                || !ledger.try_consume(&pair.recipe.ingredients, &Big::one())
            {
                return result;
            }
            self.progress = -(Big::from(pair.previous_fps) * pair.amount_per_tick);
            self.transition(pair.item, ProductionState::Running, &mut result);
        }

        // Running.
        if !power.is_powered(&pair.building.power, pair.count, ledger) {
            return result;
        }
        power.settle(&pair.building.power, pair.count, pair.power_cycle_ticks, ledger);
        self.progress = &self.progress + pair.amount_per_tick;
        if self.progress < Big::one() {
            return result;
        }

        let requested = self.progress.floor();
        let outputs = byproduct::resolve_outputs(pair.item, Some(pair.def), rng);
        match byproduct::credit(&outputs, &requested, storage, ledger) {
            CreditOutcome::Credited(units) => {
                self.progress = &self.progress - &units;
                let refilled = ledger.try_consume(&pair.recipe.ingredients, &units);
                result.units = &result.units + &units;
                if !refilled {
                    self.transition(pair.item, ProductionState::NoInput, &mut result);
                }
            }
            CreditOutcome::Blocked => {
                self.transition(pair.item, ProductionState::OutputBlocked, &mut result);
            }
        }
        result
    }

    fn transition(&mut self, item: ItemId, next: ProductionState, result: &mut StepResult) {
        if self.state != next {
            debug!(item = item.0, from = ?self.state, to = ?next, "production state change");
            self.state = next;
            result.state_changed = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, CatalogBuilder, Recipe};
    use crate::power::PowerState;
    use crate::storage::Populations;

    const ORE: ItemId = ItemId(0);
    const PLATE: ItemId = ItemId(1);
    const COAL: ItemId = ItemId(2);

    fn catalog() -> Catalog {
        let mut b = CatalogBuilder::new();
        b.register_item("ore");
        b.register_item("plate");
        b.register_item("coal");
        b.item_mut(PLATE).unwrap().storage = Some(vec![]);
        b.build().unwrap()
    }

    fn plate_recipe() -> RecipeDef {
        RecipeDef {
            ingredients: Recipe::from([(ORE, Big::one())]),
            craft_time: Big::one(),
        }
    }

    struct World {
        catalog: Catalog,
        assemblers: Populations,
        containers: Populations,
        base: Big,
        ledger: Ledger,
        rng: SimRng,
        power: PowerRecord,
    }

    impl World {
        fn new() -> Self {
            Self {
                catalog: catalog(),
                assemblers: Populations::new(),
                containers: Populations::new(),
                base: Big::from(10),
                ledger: Ledger::new(),
                rng: SimRng::new(0),
                power: PowerRecord::default(),
            }
        }

        fn step(&mut self, record: &mut ProductionRecord, building: &BuildingDef, apt: &Big) -> StepResult {
            let def = ItemDef::default();
            let recipe = plate_recipe();
            let count = Big::one();
            let pair = PairStep {
                item: PLATE,
                def: &def,
                recipe: &recipe,
                building,
                count: &count,
                amount_per_tick: apt,
                previous_fps: 2,
                power_cycle_ticks: 2,
            };
            let storage = StorageCalculator {
                catalog: &self.catalog,
                assemblers: &self.assemblers,
                containers: &self.containers,
                base: self.base.clone(),
            };
            record.step(&pair, &mut self.power, &mut self.ledger, &storage, &mut self.rng)
        }
    }

    #[test]
    fn amount_per_tick_with_boost() {
        let building = BuildingDef {
            speed: Big::from(2),
            ..BuildingDef::default()
        };
        let apt = amount_per_tick(&building, &Big::from(3), &Big::new(5, -1), &Big::from(2), 0);
        assert_eq!(apt, Big::new(15, -1));
        let boosted = amount_per_tick(&building, &Big::from(3), &Big::new(5, -1), &Big::from(2), 3);
        assert_eq!(boosted, Big::from(12));
    }

    #[test]
    fn boost_exponent_floors_and_caps() {
        assert_eq!(boost_exponent(&Big::new(27, -1), 64), 2);
        assert_eq!(boost_exponent(&Big::from(1000), 64), 64);
        assert_eq!(boost_exponent(&Big::zero(), 64), 0);
    }

    #[test]
    fn missing_input_stays_no_input() {
        let mut world = World::new();
        let mut record = ProductionRecord::default();
        let result = world.step(&mut record, &BuildingDef::default(), &Big::new(5, -1));
        assert_eq!(record.state, ProductionState::NoInput);
        assert!(!result.state_changed);
    }

    #[test]
    fn start_takes_head_start_debt_then_produces() {
        let mut world = World::new();
        world.ledger.add(ORE, &Big::from(5));
        let mut record = ProductionRecord::default();
        let apt = Big::new(5, -1);
        let building = BuildingDef::default();

        // Starts with debt -(2 × 0.5) = -1, then accumulates 0.5.
        world.step(&mut record, &building, &apt);
        assert_eq!(record.state, ProductionState::Running);
        assert_eq!(record.progress, Big::new(-5, -1));
        assert_eq!(world.ledger.amount_of(ORE), &Big::from(4));

        world.step(&mut record, &building, &apt);
        assert!(record.progress.is_zero());
        let result = world.step(&mut record, &building, &apt);
        assert!(result.units.is_zero());
        let result = world.step(&mut record, &building, &apt);
        assert_eq!(result.units, Big::one());
        assert_eq!(world.ledger.amount_of(PLATE), &Big::one());
        assert_eq!(world.ledger.amount_of(ORE), &Big::from(3));
        assert!(record.progress.is_zero());
    }

    #[test]
    fn failed_refill_drops_to_no_input() {
        let mut world = World::new();
        world.ledger.add(ORE, &Big::one());
        let mut record = ProductionRecord {
            progress: Big::zero(),
            state: ProductionState::Running,
        };
        let result = world.step(&mut record, &BuildingDef::default(), &Big::one());
        assert_eq!(result.units, Big::one());
        assert_eq!(record.state, ProductionState::Running);
        let result = world.step(&mut record, &BuildingDef::default(), &Big::one());
        assert_eq!(result.units, Big::one());
        assert_eq!(record.state, ProductionState::NoInput);
        assert_eq!(world.ledger.amount_of(PLATE), &Big::from(2));
    }

    #[test]
    fn full_storage_blocks_then_recovers() {
        let mut world = World::new();
        world.ledger.add(ORE, &Big::from(10));
        world.ledger.add(PLATE, &Big::from(10));
        let mut record = ProductionRecord {
            progress: Big::new(9, -1),
            state: ProductionState::Running,
        };
        let building = BuildingDef::default();
        world.step(&mut record, &building, &Big::new(5, -1));
        assert_eq!(record.state, ProductionState::OutputBlocked);
        assert_eq!(record.progress, Big::new(14, -1));

        // Still full: nothing changes.
        world.step(&mut record, &building, &Big::new(5, -1));
        assert_eq!(record.state, ProductionState::OutputBlocked);

        world.ledger.remove(PLATE, &Big::from(10));
        let result = world.step(&mut record, &building, &Big::zero());
        assert_eq!(result.units, Big::one());
        // Re-evaluated as NoInput in the same tick and restarted.
        assert_eq!(record.state, ProductionState::Running);
        assert_eq!(world.ledger.amount_of(PLATE), &Big::one());
    }

    #[test]
    fn blocked_pair_with_no_inputs_lands_in_no_input_with_zero_progress() {
        let mut world = World::new();
        let mut record = ProductionRecord {
            progress: Big::new(17, -1),
            state: ProductionState::OutputBlocked,
        };
        world.step(&mut record, &BuildingDef::default(), &Big::new(5, -1));
        assert_eq!(record.state, ProductionState::NoInput);
        assert!(record.progress.is_zero());
    }

    #[test]
    fn unpowered_running_pair_is_frozen() {
        let mut world = World::new();
        world.ledger.add(ORE, &Big::from(10));
        let building = BuildingDef {
            power: Recipe::from([(COAL, Big::one())]),
            ..BuildingDef::default()
        };
        let mut record = ProductionRecord {
            progress: Big::new(5, -1),
            state: ProductionState::Running,
        };
        for _ in 0..5 {
            world.step(&mut record, &building, &Big::new(5, -1));
        }
        assert_eq!(record.progress, Big::new(5, -1));
        assert_eq!(world.power.state, PowerState::NoPower);
        assert!(world.ledger.amount_of(PLATE).is_zero());
    }

    #[test]
    fn powered_pair_burns_fuel_per_cycle() {
        let mut world = World::new();
        world.ledger.add(ORE, &Big::from(10));
        world.ledger.add(COAL, &Big::from(3));
        let building = BuildingDef {
            power: Recipe::from([(COAL, Big::one())]),
            ..BuildingDef::default()
        };
        let mut record = ProductionRecord::default();
        for _ in 0..4 {
            world.step(&mut record, &building, &Big::new(1, -1));
        }
        // Cycle of 2 ticks: two deductions in four ticks.
        assert_eq!(world.ledger.amount_of(COAL), &Big::one());
    }
}
