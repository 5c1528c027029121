//! Back-to-back composition of trajectories.

use tracing::debug;

use super::{DoneLatch, Trajectory};
use crate::error::ConfigError;
use crate::geometry::PointXYZ;

/// Runs child trajectories one after another inside a single follower.
///
/// The active child advances as soon as it reports done, so the robot
/// pursues the next segment without an intermediate stop.
pub struct MultiSegmentTrajectory {
    segments: Vec<Box<dyn Trajectory>>,
    index: usize,
    done: DoneLatch,
}

impl MultiSegmentTrajectory {
    /// Compose `segments`. At least one segment is required.
    pub fn new(segments: Vec<Box<dyn Trajectory>>) -> Result<Self, ConfigError> {
        if segments.is_empty() {
            return Err(ConfigError::MissingField("segments"));
        }
        Ok(Self {
            segments,
            index: 0,
            done: DoneLatch::new(),
        })
    }

    /// Number of segments.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Index of the segment currently pursued.
    pub fn current_segment(&self) -> usize {
        self.index
    }

    fn advance(&mut self, current: PointXYZ) {
        let last = self.segments.len() - 1;
        while self.index < last && self.segments[self.index].is_done(current) {
            self.index += 1;
            debug!("advancing to segment {}/{}", self.index + 1, last + 1);
        }
    }
}

impl Trajectory for MultiSegmentTrajectory {
    fn next_marker(&mut self, current: PointXYZ) -> PointXYZ {
        self.advance(current);
        self.segments[self.index].next_marker(current)
    }

    fn is_done(&mut self, current: PointXYZ) -> bool {
        if self.done.is_set() {
            return true;
        }
        self.advance(current);
        let last = self.segments.len() - 1;
        let finished = self.index == last && self.segments[last].is_done(current);
        self.done.check(|| finished)
    }

    fn speed(&mut self, current: PointXYZ) -> f64 {
        self.segments[self.index].speed(current)
    }

    fn describe(&self) -> String {
        format!("multi[{} segments]", self.segments.len())
    }
}
