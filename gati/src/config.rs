//! Configuration loading for Gati

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::control::TurnControllerConfig;
use crate::error::{ConfigError, Result};
use crate::geometry::PointXYZ;
use crate::trajectory::{PointTrajectory, PointTrajectoryBuilder, SplineBuilder};

/// Main configuration structure
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GatiConfig {
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub follower: FollowerConfig,
    #[serde(default)]
    pub zones: ZoneConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Defaults applied to trajectories built through the engine
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MotionConfig {
    /// Speed in [0, 1] (default: 0.5)
    #[serde(default = "default_speed")]
    pub default_speed: f64,

    /// Position tolerance in field units (default: 1.0)
    #[serde(default = "default_tolerance")]
    pub default_tolerance: f64,

    /// Heading tolerance in degrees (default: 5.0)
    #[serde(default = "default_angle_tolerance")]
    pub default_angle_tolerance_deg: f64,

    /// Spline parameter step per marker (default: 0.1)
    #[serde(default = "default_spline_step")]
    pub spline_step: f64,
}

/// Follower tuning
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FollowerConfig {
    #[serde(default)]
    pub turn: TurnControllerConfig,
}

/// Zone processing
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Detect zones jumped over between two ticks (default: true)
    #[serde(default = "default_true")]
    pub swept_detection: bool,
}

/// Tick loop options
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Record pose and command samples (default: false)
    #[serde(default)]
    pub record_movement: bool,

    /// Track velocity and acceleration (default: false)
    #[serde(default)]
    pub profile_motion: bool,

    /// Minimum time between recorded samples in ms (default: 50)
    #[serde(default = "default_record_interval")]
    pub record_interval_ms: u64,

    /// Send a zero translation when a follower finishes (default: true)
    #[serde(default = "default_true")]
    pub stop_on_finish: bool,

    /// Minimum wall time per tick in the blocking tick helpers, 0 to run
    /// flat out (default: 0)
    #[serde(default)]
    pub tick_interval_ms: u64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            default_speed: default_speed(),
            default_tolerance: default_tolerance(),
            default_angle_tolerance_deg: default_angle_tolerance(),
            spline_step: default_spline_step(),
        }
    }
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            swept_detection: default_true(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            record_movement: false,
            profile_motion: false,
            record_interval_ms: default_record_interval(),
            stop_on_finish: default_true(),
            tick_interval_ms: 0,
        }
    }
}

// Default value functions
fn default_speed() -> f64 {
    0.5
}
fn default_tolerance() -> f64 {
    1.0
}
fn default_angle_tolerance() -> f64 {
    5.0
}
fn default_spline_step() -> f64 {
    0.1
}
fn default_record_interval() -> u64 {
    50
}
fn default_true() -> bool {
    true
}

impl GatiConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: GatiConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no trajectory or controller could be built from.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let m = &self.motion;
        crate::trajectory::validate_speed(m.default_speed)?;
        crate::trajectory::validate_tolerance(m.default_tolerance)?;
        crate::trajectory::validate_tolerance(m.default_angle_tolerance_deg)?;
        if !m.spline_step.is_finite() || m.spline_step == 0.0 {
            return Err(ConfigError::InvalidStep(m.spline_step));
        }

        self.follower.turn.build()?;
        Ok(())
    }

    /// Point trajectory builder seeded with the motion defaults.
    pub fn point_builder(&self, target: PointXYZ) -> PointTrajectoryBuilder {
        PointTrajectory::builder(target)
            .speed(self.motion.default_speed)
            .tolerance(self.motion.default_tolerance)
            .angle_tolerance_deg(self.motion.default_angle_tolerance_deg)
    }

    /// Spline builder seeded with the motion defaults.
    pub fn spline_builder(&self) -> SplineBuilder {
        SplineBuilder::new()
            .step(self.motion.spline_step)
            .tolerance(self.motion.default_tolerance)
            .angle_tolerance_deg(self.motion.default_angle_tolerance_deg)
    }
}
