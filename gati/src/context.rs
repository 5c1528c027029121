//! Per-tick context handed to callbacks and plugins.

use crate::geometry::PointXYZ;
use crate::robot::Odometry;

/// Snapshot of engine state at one tick, passed to zone callbacks, listener
/// conditions, scheduled tasks and per-tick callbacks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickContext {
    /// Corrected robot pose read at the start of the tick.
    pub pose: PointXYZ,
    /// Clock time of the tick in milliseconds.
    pub now_ms: u64,
    /// Tick counter, starting at 1 for the first tick.
    pub tick: u64,
    /// Whether the executor had a current or queued follower at the start
    /// of the tick.
    pub active: bool,
}

impl TickContext {
    /// Context outside of a tick (used by tests and for load hooks).
    pub fn at(pose: PointXYZ, now_ms: u64) -> Self {
        Self {
            pose,
            now_ms,
            tick: 0,
            active: false,
        }
    }
}

/// Mutable context handed to plugin hooks.
///
/// Exposes odometry so drift-correction plugins can re-anchor the pose.
pub struct PluginContext<'a> {
    pub pose: PointXYZ,
    pub now_ms: u64,
    pub tick: u64,
    pub odometry: &'a mut dyn Odometry,
}

impl<'a> PluginContext<'a> {
    pub fn new(odometry: &'a mut dyn Odometry, now_ms: u64, tick: u64) -> Self {
        let pose = odometry.position();
        Self {
            pose,
            now_ms,
            tick,
            odometry,
        }
    }

    /// Re-read the pose from odometry, e.g. after an offset change.
    pub fn refresh_pose(&mut self) -> PointXYZ {
        self.pose = self.odometry.position();
        self.pose
    }

    /// Immutable view for callbacks.
    pub fn tick_context(&self, active: bool) -> TickContext {
        TickContext {
            pose: self.pose,
            now_ms: self.now_ms,
            tick: self.tick,
            active,
        }
    }
}
