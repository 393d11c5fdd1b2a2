//! Session snapshots for persistence.
//!
//! A snapshot is the whole [`SimulationState`] behind a versioned header,
//! encoded with `bitcode`. Quantities round-trip exactly: every `Big` is
//! stored as its arbitrary-precision mantissa and integer exponent.
//! Decoding rejects quantities outside the range of `Big`, so a damaged
//! snapshot never reaches the tick loop.

use crate::engine::{Engine, SimulationState};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a tickworks session snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0x71C4_5E55;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during serialization.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

/// Errors that can occur during deserialization.
#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Snapshot header
// ---------------------------------------------------------------------------

/// Header carried by every snapshot. Checked before the state is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
    /// Tick count at the time the snapshot was taken.
    pub tick: u64,
}

impl SnapshotHeader {
    pub fn new(tick: u64) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            tick,
        }
    }

    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Session snapshot
// ---------------------------------------------------------------------------

/// A self-contained copy of a session: ledger, populations, per-pair
/// records, recipe flags, play time and RNG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub header: SnapshotHeader,
    pub state: SimulationState,
}

impl SessionSnapshot {
    pub fn encode(&self) -> Result<Vec<u8>, SerializeError> {
        bitcode::serialize(self).map_err(|e| SerializeError::Encode(e.to_string()))
    }

    /// Decode and validate the header.
    pub fn decode(data: &[u8]) -> Result<Self, DeserializeError> {
        let snapshot: SessionSnapshot =
            bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
        snapshot.header.validate()?;
        Ok(snapshot)
    }
}

// ---------------------------------------------------------------------------
// Engine serialization methods
// ---------------------------------------------------------------------------

impl Engine {
    /// Copy the current session.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            header: SnapshotHeader::new(self.state.clock.tick),
            state: self.state.clone(),
        }
    }

    pub fn snapshot_bytes(&self) -> Result<Vec<u8>, SerializeError> {
        self.snapshot().encode()
    }

    /// Replace the session with `snapshot`. The manual-craft cooldown is
    /// cleared.
    pub fn restore(&mut self, snapshot: SessionSnapshot) -> Result<(), DeserializeError> {
        snapshot.header.validate()?;
        info!(tick = snapshot.header.tick, "restored session");
        self.state = snapshot.state;
        self.last_manual_craft = None;
        Ok(())
    }

    pub fn restore_bytes(&mut self, data: &[u8]) -> Result<(), DeserializeError> {
        let snapshot = SessionSnapshot::decode(data)?;
        self.restore(snapshot)
    }

    /// Restore from bytes, or start a fresh session if they cannot be read.
    /// Returns whether the saved session was restored.
    pub fn restore_bytes_or_default(&mut self, data: &[u8]) -> bool {
        match self.restore_bytes(data) {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "unreadable snapshot, starting a fresh session");
                self.reset();
                false
            }
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::big::Big;
    use crate::id::PairKey;
    use crate::production::{ProductionRecord, ProductionState};
    use crate::test_utils::{big, dec, run_ticks, smelting_engine};

    fn busy_engine() -> (Engine, crate::test_utils::Smelting) {
        let (mut engine, ids) = smelting_engine();
        engine.grant(ids.ore, &dec("1234.5"));
        engine.grant(ids.booster, &big(1));
        engine.assign_building(ids.plate, ids.furnace, &big(2)).unwrap();
        engine.assign_building(ids.slag, ids.crusher, &big(1)).unwrap();
        engine.assign_container(ids.plate, ids.chest, &big(3)).unwrap();
        engine.set_recipe_enabled(ids.slag, false).unwrap();
        run_ticks(&mut engine, 37, 0.05);
        (engine, ids)
    }

    #[test]
    fn round_trip_preserves_state_hash() {
        let (engine, _) = busy_engine();
        let data = engine.snapshot_bytes().expect("serialize should succeed");

        let (mut restored, _) = smelting_engine();
        restored.restore_bytes(&data).expect("deserialize should succeed");

        assert_eq!(restored.state_hash(), engine.state_hash());
        assert_eq!(restored.state(), engine.state());
        assert_eq!(restored.play_time(), engine.play_time());
    }

    #[test]
    fn restored_session_continues_identically() {
        let (mut engine, ids) = busy_engine();
        let data = engine.snapshot_bytes().unwrap();
        let (mut restored, _) = smelting_engine();
        restored.restore_bytes(&data).unwrap();

        run_ticks(&mut engine, 50, 0.05);
        run_ticks(&mut restored, 50, 0.05);
        assert_eq!(restored.state_hash(), engine.state_hash());
        assert_eq!(
            restored.ledger().amount_of(ids.plate),
            engine.ledger().amount_of(ids.plate)
        );
    }

    #[test]
    fn quantities_round_trip_exactly() {
        let (mut engine, ids) = smelting_engine();
        engine.grant(ids.ore, &dec("0.000000000000000000000000000001"));
        let data = engine.snapshot_bytes().unwrap();
        let decoded = SessionSnapshot::decode(&data).unwrap();
        assert_eq!(
            decoded.state.ledger.amount_of(ids.ore),
            &dec("1e-30")
        );
    }

    #[test]
    fn garbage_is_rejected() {
        let cases: [&[u8]; 3] = [&[], &[0u8; 10], b"not a snapshot"];
        for garbage in cases {
            match SessionSnapshot::decode(garbage) {
                Err(DeserializeError::Decode(_) | DeserializeError::InvalidMagic(_)) => {}
                Err(other) => panic!("expected Decode error, got: {other}"),
                Ok(_) => panic!("expected error, got Ok"),
            }
        }
    }

    #[test]
    fn header_mismatches_are_rejected() {
        let (engine, _) = smelting_engine();
        let mut snapshot = engine.snapshot();
        snapshot.header.magic = 0xDEAD_BEEF;
        let data = snapshot.encode().unwrap();
        assert!(matches!(
            SessionSnapshot::decode(&data),
            Err(DeserializeError::InvalidMagic(0xDEAD_BEEF))
        ));

        let mut snapshot = engine.snapshot();
        snapshot.header.version = FORMAT_VERSION + 1;
        assert!(matches!(
            snapshot.header.validate(),
            Err(DeserializeError::FutureVersion(_))
        ));

        snapshot.header.version = 0;
        assert!(matches!(
            snapshot.header.validate(),
            Err(DeserializeError::UnsupportedVersion(0))
        ));
    }

    #[test]
    fn unreadable_bytes_fall_back_to_fresh_session() {
        let (mut engine, ids) = busy_engine();
        assert!(!engine.restore_bytes_or_default(b"not a snapshot"));
        assert_eq!(engine.tick_count(), 0);
        assert!(engine.ledger().amount_of(ids.ore).is_zero());
        assert!(engine.production_record(PairKey::new(ids.plate, ids.furnace)).is_none());
    }

    #[test]
    fn out_of_range_quantities_fall_back_to_fresh_session() {
        let (mut engine, ids) = busy_engine();
        let key = PairKey::new(ids.plate, ids.furnace);
        let mut snapshot = engine.snapshot();
        snapshot.state.production.insert(
            key,
            ProductionRecord {
                progress: Big::unchecked(1, i64::MAX),
                state: ProductionState::Running,
            },
        );
        let data = snapshot.encode().unwrap();
        assert!(matches!(
            SessionSnapshot::decode(&data),
            Err(DeserializeError::Decode(_))
        ));

        assert!(!engine.restore_bytes_or_default(&data));
        assert_eq!(engine.tick_count(), 0);
        assert!(engine.production_record(key).is_none());
        engine.tick(0.05);
        assert_eq!(engine.tick_count(), 1);
    }

    #[test]
    fn readable_bytes_restore() {
        let (engine, _) = busy_engine();
        let data = engine.snapshot_bytes().unwrap();
        let (mut fresh, _) = smelting_engine();
        assert!(fresh.restore_bytes_or_default(&data));
        assert_eq!(fresh.tick_count(), 37);
    }
}
