//! Simulated drivetrain and odometry.
//!
//! A [`SimulatedRobot`] hands out a linked [`SimulatedDrive`] and
//! [`SimulatedOdometry`]. Every `set_translation` integrates one fixed
//! kinematic step:
//!
//! ```text
//! field (vx, vy) = translation rotated from robot frame by raw heading
//! x       += vx * units_per_tick
//! y       += vy * units_per_tick
//! heading += vz * degrees_per_tick
//! ```
//!
//! There is no noise and no collision handling, so runs are deterministic.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::geometry::{Angle, PointXYZ, Translation};
use crate::robot::{Drive, Odometry};

/// Distance covered per tick at full speed (default)
pub const DEFAULT_UNITS_PER_TICK: f64 = 0.5;

/// Rotation per tick at full turn output (default)
pub const DEFAULT_DEGREES_PER_TICK: f64 = 10.0;

#[derive(Debug)]
struct SimState {
    raw: PointXYZ,
    offset: PointXYZ,
    last: Translation,
    steps: u64,
}

/// Shared simulated robot. Clones refer to the same robot.
#[derive(Clone, Debug)]
pub struct SimulatedRobot {
    state: Arc<Mutex<SimState>>,
    units_per_tick: f64,
    degrees_per_tick: f64,
}

impl Default for SimulatedRobot {
    fn default() -> Self {
        Self::new(PointXYZ::ZERO)
    }
}

impl SimulatedRobot {
    /// Robot at `start` with the default kinematic step.
    pub fn new(start: PointXYZ) -> Self {
        Self::with_step(start, DEFAULT_UNITS_PER_TICK, DEFAULT_DEGREES_PER_TICK)
    }

    pub fn with_step(start: PointXYZ, units_per_tick: f64, degrees_per_tick: f64) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                raw: start,
                offset: PointXYZ::ZERO,
                last: Translation::ZERO,
                steps: 0,
            })),
            units_per_tick,
            degrees_per_tick,
        }
    }

    /// Drive half of the pair.
    pub fn drive(&self) -> SimulatedDrive {
        SimulatedDrive {
            robot: self.clone(),
        }
    }

    /// Odometry half of the pair.
    pub fn odometry(&self) -> SimulatedOdometry {
        SimulatedOdometry {
            robot: self.clone(),
        }
    }

    /// True pose (raw, without odometry offset).
    pub fn pose(&self) -> PointXYZ {
        self.state.lock().raw
    }

    /// Teleport the robot. Leaves the odometry offset untouched.
    pub fn set_pose(&self, pose: PointXYZ) {
        self.state.lock().raw = pose;
    }

    /// Last translation received.
    pub fn last_translation(&self) -> Translation {
        self.state.lock().last
    }

    /// Number of translations integrated so far.
    pub fn steps(&self) -> u64 {
        self.state.lock().steps
    }

    fn apply(&self, translation: Translation) {
        let mut state = self.state.lock();
        let field = translation.to_absolute(state.raw.z);
        let raw = state.raw;
        state.raw = PointXYZ {
            x: raw.x + field.vx * self.units_per_tick,
            y: raw.y + field.vy * self.units_per_tick,
            z: Angle::from_deg(raw.z.deg() + translation.vz * self.degrees_per_tick),
        };
        state.last = translation;
        state.steps += 1;
    }
}

/// [`Drive`] half of a [`SimulatedRobot`].
#[derive(Clone, Debug)]
pub struct SimulatedDrive {
    robot: SimulatedRobot,
}

impl Drive for SimulatedDrive {
    fn set_translation(&mut self, translation: Translation) {
        self.robot.apply(translation);
    }

    fn translation(&self) -> Translation {
        self.robot.last_translation()
    }
}

/// [`Odometry`] half of a [`SimulatedRobot`].
#[derive(Clone, Debug)]
pub struct SimulatedOdometry {
    robot: SimulatedRobot,
}

impl Odometry for SimulatedOdometry {
    fn raw_position(&mut self) -> PointXYZ {
        self.robot.pose()
    }

    fn offset(&self) -> PointXYZ {
        self.robot.state.lock().offset
    }

    fn set_offset(&mut self, offset: PointXYZ) {
        self.robot.state.lock().offset = offset;
    }
}
