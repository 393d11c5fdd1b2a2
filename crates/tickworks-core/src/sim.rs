//! Simulation clock and state hashing.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Tick counter, accumulated play time, and the measured tick rate of the
/// last full simulated second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimClock {
    pub tick: u64,
    /// Simulated seconds, the sum of every clamped `dt`.
    pub play_time: f64,
    /// Ticks counted during the previous simulated second. Starts at the
    /// nominal tick rate.
    pub previous_fps: u32,
    pub ticks_this_second: u32,
    pub second_accumulator: f64,
}

impl SimClock {
    pub fn new(ticks_per_second: u32) -> Self {
        Self {
            tick: 0,
            play_time: 0.0,
            previous_fps: ticks_per_second,
            ticks_this_second: 0,
            second_accumulator: 0.0,
        }
    }

    /// Record one tick of `dt` seconds.
    pub fn advance(&mut self, dt: f64) {
        self.tick += 1;
        self.play_time += dt;
        self.ticks_this_second += 1;
        self.second_accumulator += dt;
        if self.second_accumulator >= 1.0 {
            self.previous_fps = self.ticks_this_second;
            self.ticks_this_second = 0;
            self.second_accumulator = (self.second_accumulator - 1.0).min(1.0);
        }
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(20)
    }
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// A simple deterministic hash of simulation state for replay checks.
///
/// Uses FNV-1a (64-bit) for speed and simplicity. Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    /// Feed a normalized `Big` (mantissa bytes, exponent, infinity flag).
    pub fn write_big(&mut self, v: &crate::big::Big) {
        self.write(v.mantissa().to_signed_bytes_le().as_slice());
        self.write(&v.exponent().to_le_bytes());
        self.write(&[v.is_infinite() as u8]);
    }

    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}
