//! Per-tick binding of one trajectory to motion commands.
//!
//! Each tick the follower asks its trajectory for a marker, drives toward
//! it at the trajectory's speed, and turns toward the marker's heading
//! through a [`TurnController`]. The command is computed field-relative and
//! converted to robot-relative before it leaves the follower.

use crate::control::{ProportionalController, TurnController};
use crate::geometry::{PointXYZ, Translation};
use crate::trajectory::Trajectory;

/// Distance below which the robot is considered to sit on the marker.
pub const MARKER_EPSILON: f64 = 1e-9;

/// Result of one follower tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FollowerOutput {
    /// Still following; apply this robot-relative translation.
    Running(Translation),
    /// The trajectory reported done this tick.
    Finished,
}

impl FollowerOutput {
    pub fn is_finished(self) -> bool {
        matches!(self, FollowerOutput::Finished)
    }

    /// The emitted translation, if still running.
    pub fn translation(self) -> Option<Translation> {
        match self {
            FollowerOutput::Running(t) => Some(t),
            FollowerOutput::Finished => None,
        }
    }
}

/// Something the executor can advance one tick at a time.
pub trait Follower {
    /// Called once when the follower becomes active.
    fn start(&mut self) {}

    /// Advance one tick from the robot's current pose.
    fn tick(&mut self, current: PointXYZ) -> FollowerOutput;

    /// Short human-readable description for logs.
    fn describe(&self) -> String {
        "follower".to_string()
    }
}

/// The standard follower: straight-line pursuit of the marker with a
/// pluggable turn controller.
pub struct GenericFollower {
    trajectory: Box<dyn Trajectory>,
    turn: Box<dyn TurnController>,
}

impl GenericFollower {
    pub fn new(trajectory: Box<dyn Trajectory>, turn: Box<dyn TurnController>) -> Self {
        Self { trajectory, turn }
    }

    /// Follow `trajectory` with the default proportional turn controller.
    pub fn with_default_turn(trajectory: Box<dyn Trajectory>) -> Self {
        Self::new(trajectory, Box::new(ProportionalController::default()))
    }

    /// Field-relative command toward `marker` at `speed`, from `current`.
    pub fn absolute_translation(
        &mut self,
        current: PointXYZ,
        marker: PointXYZ,
        speed: f64,
    ) -> Translation {
        let vz = self.turn.calculate(current.z.delta_to(marker.z));
        if current.distance(marker) < MARKER_EPSILON {
            return Translation::turn(vz);
        }
        let (sin, cos) = current.angle_to(marker).sin_cos();
        Translation::new(speed * cos, speed * sin, vz)
    }
}

impl Follower for GenericFollower {
    fn start(&mut self) {
        self.turn.reset();
    }

    fn tick(&mut self, current: PointXYZ) -> FollowerOutput {
        if self.trajectory.is_done(current) {
            return FollowerOutput::Finished;
        }

        let marker = self.trajectory.next_marker(current);
        let speed = self.trajectory.speed(current).clamp(0.0, 1.0);
        let absolute = self.absolute_translation(current, marker, speed);

        tracing::debug!(
            "follower: pose={}, marker={}, speed={:.2}, cmd={}",
            current,
            marker,
            speed,
            absolute
        );

        FollowerOutput::Running(absolute.to_relative(current.z))
    }

    fn describe(&self) -> String {
        self.trajectory.describe()
    }
}
