//! Output resolution: which items one production event yields, how many
//! units fit into storage, and crediting them to the ledger.

use crate::big::Big;
use crate::catalog::{ByproductTable, ItemDef};
use crate::id::ItemId;
use crate::ledger::Ledger;
use crate::rng::SimRng;
use crate::storage::StorageCalculator;
use std::collections::BTreeMap;

/// Per-unit outputs of one production event.
pub type Outputs = BTreeMap<ItemId, Big>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreditOutcome {
    /// Whole units credited, at least one.
    Credited(Big),
    /// Less than one unit fits. Nothing was credited.
    Blocked,
}

/// Resolve the per-unit outputs of `item`. Without byproduct tables the item
/// yields itself; otherwise each table contributes one drawn entry.
pub fn resolve_outputs(item: ItemId, def: Option<&ItemDef>, rng: &mut SimRng) -> Outputs {
    let tables = def.map(|d| d.byproducts.as_slice()).unwrap_or_default();
    let mut outputs = Outputs::new();
    let mut drew_any = false;
    for table in tables {
        if let Some(chosen) = draw(table, rng) {
            drew_any = true;
            let total = outputs.remove(&chosen).unwrap_or_default() + Big::one();
            outputs.insert(chosen, total);
        }
    }
    if !drew_any {
        outputs.insert(item, Big::one());
    }
    outputs
}

/// One weighted draw. `None` when the table has no positive weight.
pub fn draw(table: &ByproductTable, rng: &mut SimRng) -> Option<ItemId> {
    let total = table.total_weight();
    if total == 0 {
        return None;
    }
    let sample = rng.next_f64();
    let mut cumulative = 0u64;
    for &(item, weight) in &table.entries {
        cumulative += u64::from(weight);
        if cumulative as f64 / total as f64 > sample {
            return Some(item);
        }
    }
    table.entries.last().map(|(item, _)| *item)
}

/// Whole units of `outputs` that can be credited: `floor(requested)` capped
/// by the remaining storage of every output.
pub fn fit(outputs: &Outputs, requested: &Big, storage: &StorageCalculator<'_>, ledger: &Ledger) -> Big {
    let mut units = requested.floor();
    for (item, per_unit) in outputs {
        if !per_unit.is_positive() {
            continue;
        }
        let room = (storage.remaining(*item, ledger) / per_unit).floor();
        if room < units {
            units = room;
        }
    }
    if units.is_negative() { Big::zero() } else { units }
}

/// Credit as many whole units as fit, or nothing if less than one does.
pub fn credit(
    outputs: &Outputs,
    requested: &Big,
    storage: &StorageCalculator<'_>,
    ledger: &mut Ledger,
) -> CreditOutcome {
    let units = fit(outputs, requested, storage, ledger);
    if units < Big::one() {
        return CreditOutcome::Blocked;
    }
    for (item, per_unit) in outputs {
        ledger.add(*item, &(per_unit * &units));
    }
    CreditOutcome::Credited(units)
}
