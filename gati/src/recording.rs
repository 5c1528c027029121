//! Movement recording and motion profiling.
//!
//! Both run in the on-tick phase when enabled in `[engine]`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geometry::{PointXYZ, Translation, shortest_delta_deg};

/// One recorded tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MovementSample {
    /// Clock time in milliseconds
    pub t_ms: u64,
    pub pose: PointXYZ,
    /// Robot-relative command sent this tick
    pub translation: Translation,
}

/// A recorded run, serializable to TOML.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MovementRecording {
    #[serde(default)]
    pub samples: Vec<MovementSample>,
}

impl MovementRecording {
    /// Load a recording from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse a recording from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Time between the first and last sample.
    pub fn duration_ms(&self) -> u64 {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => last.t_ms.saturating_sub(first.t_ms),
            _ => 0,
        }
    }

    /// Total planar path length.
    pub fn distance(&self) -> f64 {
        self.samples
            .windows(2)
            .map(|w| w[0].pose.distance(w[1].pose))
            .sum()
    }
}

/// Samples the pose and command at a minimum interval.
#[derive(Clone, Debug)]
pub struct MovementRecorder {
    interval_ms: u64,
    last_sample: Option<u64>,
    recording: MovementRecording,
}

impl MovementRecorder {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_sample: None,
            recording: MovementRecording::default(),
        }
    }

    /// Record a sample if the interval has elapsed. Returns whether a
    /// sample was taken.
    pub fn record(&mut self, now_ms: u64, pose: PointXYZ, translation: Translation) -> bool {
        if self
            .last_sample
            .is_some_and(|last| now_ms.saturating_sub(last) < self.interval_ms)
        {
            return false;
        }
        self.last_sample = Some(now_ms);
        self.recording.samples.push(MovementSample {
            t_ms: now_ms,
            pose,
            translation,
        });
        true
    }

    pub fn recording(&self) -> &MovementRecording {
        &self.recording
    }

    /// Take the recording so far, leaving the recorder empty.
    pub fn take(&mut self) -> MovementRecording {
        self.last_sample = None;
        std::mem::take(&mut self.recording)
    }
}

/// Peak and cumulative motion figures derived from consecutive poses.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MotionProfile {
    pub samples: u64,
    /// Distance travelled (units)
    pub distance: f64,
    /// Last linear speed (units/s)
    pub speed: f64,
    pub max_speed: f64,
    /// Last angular speed (deg/s, signed)
    pub angular_speed: f64,
    pub max_angular_speed: f64,
    /// Largest change in linear speed (units/s²)
    pub max_acceleration: f64,
}

/// Derives velocity and acceleration from the pose stream.
#[derive(Clone, Debug, Default)]
pub struct MotionProfiler {
    previous: Option<(u64, PointXYZ)>,
    previous_speed: Option<f64>,
    profile: MotionProfile,
}

impl MotionProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one pose. Samples without elapsed time are ignored.
    pub fn update(&mut self, now_ms: u64, pose: PointXYZ) {
        let Some((t0, p0)) = self.previous else {
            self.previous = Some((now_ms, pose));
            return;
        };
        if now_ms <= t0 {
            return;
        }
        let dt = (now_ms - t0) as f64 / 1000.0;
        let step = p0.distance(pose);
        let speed = step / dt;
        let angular = shortest_delta_deg(p0.z.deg(), pose.z.deg()) / dt;

        let p = &mut self.profile;
        p.samples += 1;
        p.distance += step;
        p.speed = speed;
        p.max_speed = p.max_speed.max(speed);
        p.angular_speed = angular;
        p.max_angular_speed = p.max_angular_speed.max(angular.abs());
        if let Some(prev) = self.previous_speed {
            p.max_acceleration = p.max_acceleration.max(((speed - prev) / dt).abs());
        }

        self.previous_speed = Some(speed);
        self.previous = Some((now_ms, pose));
    }

    pub fn profile(&self) -> MotionProfile {
        self.profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_recorder_respects_interval() {
        let mut recorder = MovementRecorder::new(50);
        let mut taken = 0;
        for t in (0..=200).step_by(10) {
            if recorder.record(t, PointXYZ::new(t as f64, 0.0, 0.0), Translation::ZERO) {
                taken += 1;
            }
        }
        assert_eq!(taken, 5);
        assert_eq!(recorder.recording().duration_ms(), 200);
        assert_abs_diff_eq!(recorder.recording().distance(), 200.0, epsilon = 1e-9);

        let taken = recorder.take();
        assert_eq!(taken.len(), 5);
        assert!(recorder.recording().is_empty());
    }

    #[test]
    fn test_recording_file_round_trip() {
        let mut recorder = MovementRecorder::new(0);
        recorder.record(0, PointXYZ::new(1.0, 2.0, 90.0), Translation::new(0.5, 0.0, 0.1));
        recorder.record(20, PointXYZ::new(1.5, 2.0, 95.0), Translation::new(0.5, 0.0, 0.0));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        recorder.recording().save(&path).unwrap();
        let loaded = MovementRecording::load(&path).unwrap();
        assert_eq!(&loaded, recorder.recording());
    }

    #[test]
    fn test_profiler() {
        let mut profiler = MotionProfiler::new();
        profiler.update(0, PointXYZ::new(0.0, 0.0, 0.0));
        profiler.update(100, PointXYZ::new(1.0, 0.0, 10.0));
        profiler.update(200, PointXYZ::new(3.0, 0.0, 350.0));

        let p = profiler.profile();
        assert_eq!(p.samples, 2);
        assert_abs_diff_eq!(p.distance, 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(p.speed, 20.0, epsilon = 1e-9);
        assert_abs_diff_eq!(p.max_speed, 20.0, epsilon = 1e-9);
        assert_abs_diff_eq!(p.angular_speed, -200.0, epsilon = 1e-9);
        assert_abs_diff_eq!(p.max_angular_speed, 200.0, epsilon = 1e-9);
        assert_abs_diff_eq!(p.max_acceleration, 100.0, epsilon = 1e-9);
    }
}
