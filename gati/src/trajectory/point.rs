//! Single fixed target.

use super::{DoneLatch, Trajectory, validate_speed, validate_tolerance};
use crate::error::ConfigError;
use crate::geometry::PointXYZ;

/// Drive straight at one target pose.
///
/// Done once the robot is within `tolerance` of the target position AND
/// within `angle_tolerance_deg` of its heading.
#[derive(Clone, Debug)]
pub struct PointTrajectory {
    target: PointXYZ,
    speed: f64,
    tolerance: f64,
    angle_tolerance_deg: f64,
    done: DoneLatch,
}

impl PointTrajectory {
    /// Create a point trajectory, validating every parameter.
    pub fn new(
        target: PointXYZ,
        speed: f64,
        tolerance: f64,
        angle_tolerance_deg: f64,
    ) -> Result<Self, ConfigError> {
        if !target.is_finite() {
            return Err(ConfigError::NonFinite("target"));
        }
        Ok(Self {
            target,
            speed: validate_speed(speed)?,
            tolerance: validate_tolerance(tolerance)?,
            angle_tolerance_deg: validate_tolerance(angle_tolerance_deg)?,
            done: DoneLatch::new(),
        })
    }

    /// Start a builder for `target`.
    pub fn builder(target: PointXYZ) -> PointTrajectoryBuilder {
        PointTrajectoryBuilder::new(target)
    }

    /// Target pose.
    pub fn target(&self) -> PointXYZ {
        self.target
    }

    /// Position tolerance.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Heading tolerance in degrees.
    pub fn angle_tolerance_deg(&self) -> f64 {
        self.angle_tolerance_deg
    }
}

impl Trajectory for PointTrajectory {
    fn next_marker(&mut self, _current: PointXYZ) -> PointXYZ {
        self.target
    }

    fn is_done(&mut self, current: PointXYZ) -> bool {
        let (target, tol, angle_tol) = (self.target, self.tolerance, self.angle_tolerance_deg);
        self.done.check(|| current.is_close(target, tol, angle_tol))
    }

    fn speed(&mut self, _current: PointXYZ) -> f64 {
        self.speed
    }

    fn describe(&self) -> String {
        format!("point -> {}", self.target)
    }
}

/// Builder for [`PointTrajectory`]. The angle tolerance has no default and
/// must be set.
#[derive(Clone, Debug)]
pub struct PointTrajectoryBuilder {
    target: PointXYZ,
    speed: Option<f64>,
    tolerance: Option<f64>,
    angle_tolerance_deg: Option<f64>,
}

impl PointTrajectoryBuilder {
    /// New builder for `target`.
    pub fn new(target: PointXYZ) -> Self {
        Self {
            target,
            speed: None,
            tolerance: None,
            angle_tolerance_deg: None,
        }
    }

    /// Speed in [0, 1].
    pub fn speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    /// Position tolerance (> 0).
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// Heading tolerance in degrees (> 0).
    pub fn angle_tolerance_deg(mut self, degrees: f64) -> Self {
        self.angle_tolerance_deg = Some(degrees);
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<PointTrajectory, ConfigError> {
        let speed = self.speed.ok_or(ConfigError::MissingField("speed"))?;
        let tolerance = self.tolerance.ok_or(ConfigError::MissingField("tolerance"))?;
        let angle_tolerance = self
            .angle_tolerance_deg
            .ok_or(ConfigError::MissingAngleTolerance)?;
        PointTrajectory::new(self.target, speed, tolerance, angle_tolerance)
    }
}
