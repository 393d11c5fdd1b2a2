//! Engine tuning knobs. Every field has a default, so partial config files
//! deserialize cleanly.

use crate::big::Big;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Nominal tick rate. Also the power cycle length in ticks and the
    /// initial `previous_fps` estimate.
    pub ticks_per_second: u32,
    /// Upper bound on a single tick's elapsed time, in seconds.
    pub max_dt: f64,
    /// Guaranteed storage floor for every bounded item.
    pub base_storage: u32,
    pub manual_craft_cooldown_ms: u64,
    /// Cap on the boost exponent so `2^n` stays reasonable.
    pub max_boost_exponent: u32,
    /// Seed for the byproduct RNG of a fresh session.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: 20,
            max_dt: 1.0,
            base_storage: 10,
            manual_craft_cooldown_ms: 200,
            max_boost_exponent: 64,
            seed: 0,
        }
    }
}

impl SimConfig {
    pub fn manual_craft_cooldown(&self) -> Duration {
        Duration::from_millis(self.manual_craft_cooldown_ms)
    }

    pub fn base_storage(&self) -> Big {
        Big::from(self.base_storage)
    }

    /// Clamp a caller-supplied delta into `[0, max_dt]`. NaN becomes 0.
    pub fn clamp_dt(&self, dt: f64) -> f64 {
        if dt.is_nan() || dt <= 0.0 {
            0.0
        } else {
            dt.min(self.max_dt.max(0.0))
        }
    }

    /// Power cycle length; never zero.
    pub fn power_cycle_ticks(&self) -> u32 {
        self.ticks_per_second.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SimConfig::default();
        assert_eq!(config.ticks_per_second, 20);
        assert_eq!(config.max_dt, 1.0);
        assert_eq!(config.base_storage(), Big::from(10));
        assert_eq!(config.manual_craft_cooldown(), Duration::from_millis(200));
    }

    #[test]
    fn clamp_dt_bounds() {
        let config = SimConfig::default();
        assert_eq!(config.clamp_dt(0.05), 0.05);
        assert_eq!(config.clamp_dt(5.0), 1.0);
        assert_eq!(config.clamp_dt(-1.0), 0.0);
        assert_eq!(config.clamp_dt(f64::NAN), 0.0);
        assert_eq!(config.clamp_dt(f64::INFINITY), 1.0);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: SimConfig = serde_json::from_str(r#"{ "seed": 7 }"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.ticks_per_second, 20);
    }

    #[test]
    fn zero_tick_rate_has_nonzero_cycle() {
        let config = SimConfig {
            ticks_per_second: 0,
            ..SimConfig::default()
        };
        assert_eq!(config.power_cycle_ticks(), 1);
    }
}
