//! Assembler populations, container assignments and storage capacity.

use crate::big::{Big, consts};
use crate::catalog::Catalog;
use crate::id::{ItemId, PairKey};
use crate::ledger::Ledger;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Capacity reported for items with no storage restriction. Finite so that
/// `capacity - on_hand` stays an ordinary number.
pub static UNBOUNDED_STORAGE: LazyLock<Big> = LazyLock::new(|| Big::new(1, 100).freeze());

// ---------------------------------------------------------------------------
// Populations
// ---------------------------------------------------------------------------

/// `(item, kind) -> count`. Used for both assembler populations and
/// container assignments. Counts are never negative; zero entries are
/// dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Populations {
    counts: BTreeMap<PairKey, Big>,
}

impl Populations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, key: PairKey) -> &Big {
        self.counts.get(&key).unwrap_or(&consts::ZERO)
    }

    /// Apply a signed delta, clamping at zero. Returns the new count.
    pub fn adjust(&mut self, key: PairKey, delta: &Big) -> Big {
        let next = self.count(key) + delta;
        if next.is_positive() {
            self.counts.insert(key, next.clone());
            next
        } else {
            self.counts.remove(&key);
            Big::zero()
        }
    }

    /// Every `(kind, count)` assigned to `item`, in kind order.
    pub fn for_item(&self, item: ItemId) -> impl Iterator<Item = (ItemId, &Big)> {
        let start = PairKey::new(item, ItemId(0));
        let end = PairKey::new(item, ItemId(u32::MAX));
        self.counts
            .range(start..=end)
            .map(|(key, count)| (key.kind, count))
    }

    /// All pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (PairKey, &Big)> {
        self.counts.iter().map(|(key, count)| (*key, count))
    }

    pub fn keys(&self) -> Vec<PairKey> {
        self.counts.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Storage calculator
// ---------------------------------------------------------------------------

/// Computes the maximum holdable quantity of an item from the catalog and
/// the current building / container populations.
pub struct StorageCalculator<'a> {
    pub catalog: &'a Catalog,
    pub assemblers: &'a Populations,
    pub containers: &'a Populations,
    pub base: Big,
}

impl StorageCalculator<'_> {
    pub fn capacity(&self, item: ItemId) -> Big {
        let Some(permitted) = self.catalog.item(item).and_then(|def| def.storage.as_ref()) else {
            return UNBOUNDED_STORAGE.clone();
        };

        let mut from_containers = Big::zero();
        for (container, count) in self.containers.for_item(item) {
            if !permitted.contains(&container) {
                continue;
            }
            if let Some(def) = self.catalog.container(container) {
                from_containers = clamp_zero(&from_containers + &(count * &def.capacity));
            }
        }

        let mut from_buildings = Big::zero();
        for (building, count) in self.assemblers.for_item(item) {
            if let Some(def) = self.catalog.building(building) {
                from_buildings = clamp_zero(&from_buildings + &(count * &def.self_storage));
            }
        }

        clamp_zero(&self.base + &from_containers + from_buildings)
    }

    /// `max(0, capacity - on_hand)`.
    pub fn remaining(&self, item: ItemId, ledger: &Ledger) -> Big {
        clamp_zero(self.capacity(item) - ledger.amount_of(item))
    }
}

fn clamp_zero(value: Big) -> Big {
    if value.is_negative() { Big::zero() } else { value }
}
