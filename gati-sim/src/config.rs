//! Configuration loading for gati-sim
//!
//! The file carries the engine sections of [`GatiConfig`] at top level plus
//! a `[sim]` section for the simulated robot.

use std::path::Path;

use gati::{GatiConfig, PointXYZ};
use serde::Deserialize;

use crate::error::{Result, SimError};

/// Full simulator configuration
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SimFileConfig {
    #[serde(flatten)]
    pub gati: GatiConfig,
    #[serde(default)]
    pub sim: SimConfig,
}

/// Simulated robot parameters
#[derive(Clone, Debug, Deserialize)]
pub struct SimConfig {
    /// Distance per tick at full speed (default: 0.5)
    #[serde(default = "default_units_per_tick")]
    pub units_per_tick: f64,

    /// Rotation per tick at full turn output in degrees (default: 10.0)
    #[serde(default = "default_degrees_per_tick")]
    pub degrees_per_tick: f64,

    /// Odometry position noise standard deviation (default: 0.0)
    #[serde(default)]
    pub position_noise_stddev: f64,

    /// Odometry heading noise standard deviation in degrees (default: 0.0)
    #[serde(default)]
    pub heading_noise_stddev: f64,

    /// Noise seed, 0 for entropy (default: 42)
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Simulated time per tick in milliseconds (default: 10)
    #[serde(default = "default_tick_period")]
    pub tick_period_ms: u64,

    /// Starting pose: x (default: 0.0)
    #[serde(default)]
    pub start_x: f64,

    /// Starting pose: y (default: 0.0)
    #[serde(default)]
    pub start_y: f64,

    /// Starting heading in degrees (default: 0.0)
    #[serde(default)]
    pub start_heading_deg: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            units_per_tick: default_units_per_tick(),
            degrees_per_tick: default_degrees_per_tick(),
            position_noise_stddev: 0.0,
            heading_noise_stddev: 0.0,
            seed: default_seed(),
            tick_period_ms: default_tick_period(),
            start_x: 0.0,
            start_y: 0.0,
            start_heading_deg: 0.0,
        }
    }
}

// Default value functions
fn default_units_per_tick() -> f64 {
    gati::sim::DEFAULT_UNITS_PER_TICK
}
fn default_degrees_per_tick() -> f64 {
    gati::sim::DEFAULT_DEGREES_PER_TICK
}
fn default_seed() -> u64 {
    42
}
fn default_tick_period() -> u64 {
    10
}

impl SimConfig {
    pub fn start(&self) -> PointXYZ {
        PointXYZ::new(self.start_x, self.start_y, self.start_heading_deg)
    }

    fn validate(&self) -> Result<()> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.units_per_tick) || !positive(self.degrees_per_tick) {
            return Err(SimError::Config(
                "units_per_tick and degrees_per_tick must be positive".to_string(),
            ));
        }
        if self.position_noise_stddev < 0.0 || self.heading_noise_stddev < 0.0 {
            return Err(SimError::Config("noise stddev must be >= 0".to_string()));
        }
        if self.tick_period_ms == 0 {
            return Err(SimError::Config("tick_period_ms must be > 0".to_string()));
        }
        Ok(())
    }
}

impl SimFileConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SimError::Config(format!("Failed to read config file: {}", e)))?;
        let config: SimFileConfig = toml::from_str(&content)?;
        config.gati.validate()?;
        config.sim.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shipped_config_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("configs/sim.toml");
        let config = SimFileConfig::load(&path).unwrap();
        assert!(config.sim.tick_period_ms > 0);
        assert!(config.gati.zones.swept_detection);
    }

    #[test]
    fn test_sections_are_optional() {
        let config: SimFileConfig = toml::from_str("[sim]\nseed = 7\n").unwrap();
        assert_eq!(config.sim.seed, 7);
        assert_eq!(config.sim.units_per_tick, 0.5);
        assert_eq!(config.gati.motion.default_speed, 0.5);
    }

    #[test]
    fn test_rejects_bad_sim_values() {
        let config: SimFileConfig = toml::from_str("[sim]\ntick_period_ms = 0\n").unwrap();
        assert!(config.sim.validate().is_err());
    }
}
