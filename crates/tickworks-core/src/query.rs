//! Read-only query API for inspecting simulation state.
//!
//! Aggregates engine state into owned views for UI consumers. Nothing here
//! mutates the engine.

use crate::big::Big;
use crate::engine::Engine;
use crate::id::{ItemId, PairKey};
use crate::power::PowerState;
use crate::production::{self, ProductionState};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Rates
// ---------------------------------------------------------------------------

/// Per-second production and consumption of one item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemRates {
    pub produced: Big,
    pub consumed: Big,
}

impl ItemRates {
    pub fn net(&self) -> Big {
        &self.produced - &self.consumed
    }
}

// ---------------------------------------------------------------------------
// Pair view
// ---------------------------------------------------------------------------

/// A read-only view of one (item, building) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PairView {
    pub key: PairKey,
    pub count: Big,
    pub state: ProductionState,
    pub progress: Big,
    pub power: PowerState,
    pub enabled: bool,
}

impl Engine {
    /// Current rates for each requested item. Counts only running pairs of
    /// enabled recipes; byproducts are weighted by their expected share and
    /// power draw is counted for pairs that currently hold power.
    pub fn query_rates(&self, items: &[ItemId]) -> BTreeMap<ItemId, ItemRates> {
        let mut rates: BTreeMap<ItemId, ItemRates> =
            items.iter().map(|item| (*item, ItemRates::default())).collect();
        let mut bump = |item: ItemId, amount: Big, produced: bool| {
            if let Some(entry) = rates.get_mut(&item) {
                let slot = if produced { &mut entry.produced } else { &mut entry.consumed };
                *slot = &*slot + &amount;
            }
        };

        let catalog = self.catalog();
        for (key, count) in self.assemblers().iter() {
            if !self.is_recipe_enabled(key.item) {
                continue;
            }
            let (Some(def), Some(building)) = (catalog.item(key.item), catalog.building(key.kind)) else {
                continue;
            };
            let Some(recipe) = def.recipe.as_ref().filter(|r| r.craft_time.is_positive()) else {
                continue;
            };

            let powered = self
                .power_record(key)
                .is_some_and(|record| record.state == PowerState::HasPower);
            if powered {
                for (fuel, per_building) in &building.power {
                    bump(*fuel, per_building * count, false);
                }
            }

            let running = self
                .production_record(key)
                .is_some_and(|record| record.state == ProductionState::Running);
            if !running {
                continue;
            }

            let boost = building
                .boost_item
                .map(|boost| production::boost_exponent(self.ledger().amount_of(boost), self.config().max_boost_exponent))
                .unwrap_or(0);
            let per_second = production::amount_per_tick(building, count, &Big::one(), &recipe.craft_time, boost);

            for (ingredient, per_unit) in &recipe.ingredients {
                bump(*ingredient, per_unit * &per_second, false);
            }

            let tables: Vec<_> = def.byproducts.iter().filter(|t| t.total_weight() > 0).collect();
            if tables.is_empty() {
                bump(key.item, per_second.clone(), true);
            }
            for table in tables {
                let total = Big::from(table.total_weight());
                for (output, weight) in &table.entries {
                    bump(*output, &per_second * Big::from(*weight) / &total, true);
                }
            }
        }
        rates
    }

    /// Every assigned pair in canonical order.
    pub fn pair_views(&self) -> Vec<PairView> {
        self.assemblers()
            .iter()
            .map(|(key, count)| {
                let production = self.production_record(key).cloned().unwrap_or_default();
                PairView {
                    key,
                    count: count.clone(),
                    state: production.state,
                    progress: production.progress,
                    power: self.power_record(key).map(|r| r.state).unwrap_or_default(),
                    enabled: self.is_recipe_enabled(key.item),
                }
            })
            .collect()
    }
}
