//! Odometry noise for simulation
//!
//! Gaussian noise with deterministic seeding, layered over any odometry.

use gati::{Angle, Odometry, PointXYZ};
use rand::prelude::*;
use rand::rngs::SmallRng;
use rand_distr::StandardNormal;

/// Noise generator with configurable seed for reproducibility
#[derive(Clone)]
pub struct NoiseGenerator {
    rng: SmallRng,
}

impl NoiseGenerator {
    /// If seed is 0, uses random entropy. Otherwise results are
    /// reproducible.
    pub fn new(seed: u64) -> Self {
        let rng = if seed == 0 {
            SmallRng::from_entropy()
        } else {
            SmallRng::seed_from_u64(seed)
        };
        Self { rng }
    }

    /// Gaussian noise with given standard deviation
    #[inline]
    pub fn gaussian(&mut self, stddev: f64) -> f64 {
        if stddev == 0.0 {
            return 0.0;
        }
        let n: f64 = self.rng.sample(StandardNormal);
        n * stddev
    }
}

/// Adds independent Gaussian noise to every raw pose read.
pub struct NoisyOdometry<O> {
    inner: O,
    noise: NoiseGenerator,
    position_stddev: f64,
    heading_stddev: f64,
}

impl<O: Odometry> NoisyOdometry<O> {
    pub fn new(inner: O, seed: u64, position_stddev: f64, heading_stddev: f64) -> Self {
        Self {
            inner,
            noise: NoiseGenerator::new(seed),
            position_stddev,
            heading_stddev,
        }
    }
}

impl<O: Odometry> Odometry for NoisyOdometry<O> {
    fn raw_position(&mut self) -> PointXYZ {
        let raw = self.inner.raw_position();
        PointXYZ {
            x: raw.x + self.noise.gaussian(self.position_stddev),
            y: raw.y + self.noise.gaussian(self.position_stddev),
            z: Angle::from_deg(raw.z.deg() + self.noise.gaussian(self.heading_stddev)),
        }
    }

    fn offset(&self) -> PointXYZ {
        self.inner.offset()
    }

    fn set_offset(&mut self, offset: PointXYZ) {
        self.inner.set_offset(offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gati::sim::SimulatedRobot;

    #[test]
    fn test_deterministic_seed() {
        let mut a = NoiseGenerator::new(42);
        let mut b = NoiseGenerator::new(42);
        for _ in 0..100 {
            assert_eq!(a.gaussian(1.0), b.gaussian(1.0));
        }
    }

    #[test]
    fn test_zero_stddev_is_transparent() {
        let robot = SimulatedRobot::new(PointXYZ::new(1.0, 2.0, 30.0));
        let mut odom = NoisyOdometry::new(robot.odometry(), 42, 0.0, 0.0);
        assert_eq!(odom.raw_position(), robot.pose());
    }

    #[test]
    fn test_noise_is_bounded_on_average() {
        let robot = SimulatedRobot::new(PointXYZ::ZERO);
        let mut odom = NoisyOdometry::new(robot.odometry(), 7, 0.1, 0.0);
        let n = 2000;
        let mean_x: f64 = (0..n).map(|_| odom.raw_position().x).sum::<f64>() / n as f64;
        assert!(mean_x.abs() < 0.02);
    }
}
