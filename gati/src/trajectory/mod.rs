//! Path descriptors consumed by followers.
//!
//! A [`Trajectory`] answers three questions about the robot's current pose
//! every tick:
//!
//! - where to pursue next ([`next_marker`](Trajectory::next_marker)), which
//!   may be an interior point of the path rather than its end,
//! - whether it is finished ([`is_done`](Trajectory::is_done)), latched so
//!   that once true it stays true,
//! - how fast to go ([`speed`](Trajectory::speed)), in [0, 1].
//!
//! Variants:
//!
//! - [`PointTrajectory`]: one fixed target with position and heading
//!   tolerances.
//! - [`SplineTrajectory`]: a monotone cubic path with companion heading and
//!   speed profiles.
//! - [`MultiSegmentTrajectory`]: children run back to back.
//! - [`TaskTrajectory`]: non-motion work in the motion queue.

mod interpolation;
mod multi;
mod point;
mod spline;
mod task;

pub use interpolation::MonotoneCubicSpline;
pub use multi::MultiSegmentTrajectory;
pub use point::{PointTrajectory, PointTrajectoryBuilder};
pub use spline::{DUPLICATE_NUDGE, SplineAxis, SplineBuilder, SplineTrajectory};
pub use task::{TaskTrajectory, TaskTrajectoryBuilder};

use crate::error::ConfigError;
use crate::geometry::PointXYZ;

/// A path the robot can follow.
pub trait Trajectory {
    /// The immediate pursuit target for the robot at `current`.
    fn next_marker(&mut self, current: PointXYZ) -> PointXYZ;

    /// Whether the trajectory is complete. Must be monotonic: once this
    /// returns true it returns true for every later pose.
    fn is_done(&mut self, current: PointXYZ) -> bool;

    /// Speed in [0, 1] at `current`.
    fn speed(&mut self, current: PointXYZ) -> f64;

    /// Short human-readable description for logs.
    fn describe(&self) -> String {
        "trajectory".to_string()
    }
}

impl<T: Trajectory + ?Sized> Trajectory for Box<T> {
    fn next_marker(&mut self, current: PointXYZ) -> PointXYZ {
        (**self).next_marker(current)
    }

    fn is_done(&mut self, current: PointXYZ) -> bool {
        (**self).is_done(current)
    }

    fn speed(&mut self, current: PointXYZ) -> f64 {
        (**self).speed(current)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// One-way completion flag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DoneLatch {
    done: bool,
}

impl DoneLatch {
    /// A fresh, unset latch.
    pub const fn new() -> Self {
        Self { done: false }
    }

    /// Whether the latch has been set.
    #[inline]
    pub fn is_set(self) -> bool {
        self.done
    }

    /// Evaluate `check` unless already set; latch a true result.
    #[inline]
    pub fn check(&mut self, check: impl FnOnce() -> bool) -> bool {
        if !self.done && check() {
            self.done = true;
        }
        self.done
    }

    /// Set the latch unconditionally.
    #[inline]
    pub fn set(&mut self) {
        self.done = true;
    }
}

pub(crate) fn validate_speed(speed: f64) -> Result<f64, ConfigError> {
    if speed.is_finite() && (0.0..=1.0).contains(&speed) {
        Ok(speed)
    } else {
        Err(ConfigError::InvalidSpeed(speed))
    }
}

pub(crate) fn validate_tolerance(tolerance: f64) -> Result<f64, ConfigError> {
    if tolerance.is_finite() && tolerance > 0.0 {
        Ok(tolerance)
    } else {
        Err(ConfigError::NonPositiveTolerance(tolerance))
    }
}
