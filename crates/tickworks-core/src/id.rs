use serde::{Deserialize, Serialize};

/// Identifies an item in the catalog. Buildings and storage containers are
/// items too, so the same id type names every kind of thing the simulation
/// counts. Cheap to copy and compare; ordering is the canonical iteration
/// order of the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u32);

/// An (item, building-or-container kind) pair. Keys assembler populations,
/// storage assignments, and the per-pair production and power records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PairKey {
    pub item: ItemId,
    pub kind: ItemId,
}

impl PairKey {
    pub fn new(item: ItemId, kind: ItemId) -> Self {
        Self { item, kind }
    }
}
