//! Resource ledger: item -> amount on hand, plus a lifetime "ever created"
//! counter. All consumption and production in the engine passes through it.
//!
//! Amounts are never negative. Consumption of a recipe is all-or-nothing.

use crate::big::{Big, consts};
use crate::catalog::Recipe;
use crate::id::ItemId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub on_hand: Big,
    /// Monotonically non-decreasing; statistics only.
    pub ever_created: Big,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    entries: BTreeMap<ItemId, LedgerEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn amount_of(&self, item: ItemId) -> &Big {
        self.entries
            .get(&item)
            .map(|entry| &entry.on_hand)
            .unwrap_or(&consts::ZERO)
    }

    pub fn ever_created(&self, item: ItemId) -> &Big {
        self.entries
            .get(&item)
            .map(|entry| &entry.ever_created)
            .unwrap_or(&consts::ZERO)
    }

    /// Apply a signed delta. The result is clamped at zero and only the
    /// positive part of `delta` counts toward `ever_created`.
    pub fn add(&mut self, item: ItemId, delta: &Big) {
        if delta.is_zero() {
            return;
        }
        let entry = self.entries.entry(item).or_default();
        let next = &entry.on_hand + delta;
        entry.on_hand = if next.is_negative() { Big::zero() } else { next };
        if delta.is_positive() {
            entry.ever_created = &entry.ever_created + delta;
        }
    }

    /// Best-effort removal. Takes at most what is on hand and returns the
    /// amount actually removed.
    pub fn remove(&mut self, item: ItemId, amount: &Big) -> Big {
        if !amount.is_positive() {
            return Big::zero();
        }
        let Some(entry) = self.entries.get_mut(&item) else {
            return Big::zero();
        };
        let taken = std::cmp::min(amount, &entry.on_hand).clone();
        entry.on_hand = &entry.on_hand - &taken;
        taken
    }

    /// Whether every ingredient of `recipe × multiplier` is on hand.
    pub fn can_afford(&self, recipe: &Recipe, multiplier: &Big) -> bool {
        recipe
            .iter()
            .all(|(item, count)| self.amount_of(*item) >= &(count * multiplier))
    }

    /// Deduct `recipe × multiplier` if every ingredient is affordable.
    /// On failure nothing is mutated.
    pub fn try_consume(&mut self, recipe: &Recipe, multiplier: &Big) -> bool {
        if !self.can_afford(recipe, multiplier) {
            return false;
        }
        for (item, count) in recipe {
            let required = count * multiplier;
            self.remove(*item, &required);
        }
        true
    }

    /// Lower the amount on hand to `cap` if it exceeds it. Returns whether
    /// anything was discarded.
    pub fn clamp_to(&mut self, item: ItemId, cap: &Big) -> bool {
        let Some(entry) = self.entries.get_mut(&item) else {
            return false;
        };
        if &entry.on_hand <= cap {
            return false;
        }
        entry.on_hand = std::cmp::max(cap, &consts::ZERO).clone();
        true
    }

    /// Items the ledger has ever touched, in id order.
    pub fn iter(&self) -> impl Iterator<Item = (ItemId, &LedgerEntry)> {
        self.entries.iter().map(|(id, entry)| (*id, entry))
    }
}
