//! Per-pair power state machine with batched fuel deduction.
//!
//! A pair becomes powered when its fuel for one cycle is affordable (checked,
//! not consumed). The fuel is deducted once per full cycle of
//! `ticks_per_second` running ticks.

use crate::big::Big;
use crate::catalog::Recipe;
use crate::ledger::Ledger;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PowerState {
    #[default]
    NoPower,
    HasPower,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PowerRecord {
    /// Running ticks into the current cycle.
    pub progress: u32,
    pub state: PowerState,
}

impl PowerRecord {
    /// Whether the pair can run this tick. May move `NoPower -> HasPower`.
    pub fn is_powered(&mut self, power: &Recipe, count: &Big, ledger: &Ledger) -> bool {
        if power.is_empty() {
            return true;
        }
        if self.state == PowerState::NoPower && ledger.can_afford(power, count) {
            self.state = PowerState::HasPower;
            self.progress = 0;
        }
        self.state == PowerState::HasPower
    }

    /// Account for one running tick. When the cycle completes, deduct
    /// `power × count` best-effort and drop back to `NoPower`. Returns
    /// whether fuel was deducted.
    pub fn settle(&mut self, power: &Recipe, count: &Big, cycle_ticks: u32, ledger: &mut Ledger) -> bool {
        if power.is_empty() || self.state != PowerState::HasPower {
            return false;
        }
        self.progress += 1;
        if self.progress < cycle_ticks {
            return false;
        }
        for (fuel, per_building) in power {
            ledger.remove(*fuel, &(per_building * count));
        }
        self.progress = 0;
        self.state = PowerState::NoPower;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::ItemId;

    const COAL: ItemId = ItemId(0);

    fn coal(n: i64) -> Recipe {
        Recipe::from([(COAL, Big::from(n))])
    }

    #[test]
    fn no_power_recipe_is_always_powered() {
        let mut record = PowerRecord::default();
        assert!(record.is_powered(&Recipe::new(), &Big::from(3), &Ledger::new()));
        assert_eq!(record.state, PowerState::NoPower);
    }

    #[test]
    fn affordable_fuel_powers_without_consuming() {
        let mut ledger = Ledger::new();
        ledger.add(COAL, &Big::from(4));
        let mut record = PowerRecord::default();
        assert!(record.is_powered(&coal(2), &Big::from(2), &ledger));
        assert_eq!(record.state, PowerState::HasPower);
        assert_eq!(ledger.amount_of(COAL), &Big::from(4));
    }

    #[test]
    fn unaffordable_fuel_stays_unpowered() {
        let mut ledger = Ledger::new();
        ledger.add(COAL, &Big::from(3));
        let mut record = PowerRecord::default();
        assert!(!record.is_powered(&coal(2), &Big::from(2), &ledger));
        assert_eq!(record.state, PowerState::NoPower);
    }

    #[test]
    fn deducts_once_per_cycle() {
        let mut ledger = Ledger::new();
        ledger.add(COAL, &Big::from(10));
        let mut record = PowerRecord::default();
        let power = coal(1);
        let count = Big::from(2);
        for tick in 1..=4 {
            assert!(record.is_powered(&power, &count, &ledger));
            let deducted = record.settle(&power, &count, 4, &mut ledger);
            assert_eq!(deducted, tick == 4);
        }
        assert_eq!(ledger.amount_of(COAL), &Big::from(8));
        assert_eq!(record, PowerRecord::default());
    }

    #[test]
    fn deduction_is_best_effort() {
        let mut ledger = Ledger::new();
        ledger.add(COAL, &Big::from(2));
        let mut record = PowerRecord::default();
        let power = coal(2);
        assert!(record.is_powered(&power, &Big::one(), &ledger));
        ledger.remove(COAL, &Big::one());
        assert!(record.settle(&power, &Big::one(), 1, &mut ledger));
        assert!(ledger.amount_of(COAL).is_zero());
    }
}
