//! Motion-intent vectors.
//!
//! A [`Translation`] carries no position. It is either *absolute*
//! (field-relative: +X is the field's +X) or *relative* (robot-relative:
//! +X is wherever the robot faces). The same type is used for both; the
//! conversion functions rotate by the robot's heading.

use std::fmt;
use std::ops::{Add, Mul, Neg};

use serde::{Deserialize, Serialize};

use super::angle::Angle;
use crate::error::{ConfigError, ensure_finite};

/// Lower bound of a feasible drivetrain component.
pub const COMPONENT_MIN: f64 = -1.0;
/// Upper bound of a feasible drivetrain component.
pub const COMPONENT_MAX: f64 = 1.0;

/// A velocity-intent vector (vx, vy, vz).
///
/// `vx`/`vy` are planar components, `vz` is rotation (counter-clockwise
/// positive). Components are conventionally within [-1, 1].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    /// X component
    pub vx: f64,
    /// Y component
    pub vy: f64,
    /// Rotational component
    pub vz: f64,
}

impl Translation {
    /// No motion.
    pub const ZERO: Translation = Translation {
        vx: 0.0,
        vy: 0.0,
        vz: 0.0,
    };

    /// Create a new translation.
    #[inline]
    pub const fn new(vx: f64, vy: f64, vz: f64) -> Self {
        Self { vx, vy, vz }
    }

    /// Create a translation, rejecting NaN and infinite components.
    pub fn try_new(vx: f64, vy: f64, vz: f64) -> Result<Self, ConfigError> {
        Ok(Self::new(
            ensure_finite(vx, "vx")?,
            ensure_finite(vy, "vy")?,
            ensure_finite(vz, "vz")?,
        ))
    }

    /// Pure rotation.
    #[inline]
    pub const fn turn(vz: f64) -> Self {
        Self::new(0.0, 0.0, vz)
    }

    /// Whether every component is finite.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.vx.is_finite() && self.vy.is_finite() && self.vz.is_finite()
    }

    /// Whether every component is exactly zero.
    #[inline]
    pub fn is_zero(self) -> bool {
        self.vx == 0.0 && self.vy == 0.0 && self.vz == 0.0
    }

    /// Magnitude of the planar part.
    #[inline]
    pub fn magnitude(self) -> f64 {
        self.vx.hypot(self.vy)
    }

    /// Rotate the planar part by `angle`.
    #[inline]
    pub fn rotate(self, angle: Angle) -> Translation {
        let (sin, cos) = angle.sin_cos();
        Translation::new(
            self.vx * cos - self.vy * sin,
            self.vx * sin + self.vy * cos,
            self.vz,
        )
    }

    /// Convert a field-relative translation to robot-relative by rotating
    /// by the negative of the robot's heading.
    #[inline]
    pub fn to_relative(self, heading: Angle) -> Translation {
        self.rotate(-heading)
    }

    /// Convert a robot-relative translation back to field-relative.
    #[inline]
    pub fn to_absolute(self, heading: Angle) -> Translation {
        self.rotate(heading)
    }

    /// Clamp each component into the feasible drivetrain range.
    ///
    /// Non-finite components become zero.
    pub fn clamped(self) -> Translation {
        fn clamp(v: f64) -> f64 {
            if v.is_finite() {
                v.clamp(COMPONENT_MIN, COMPONENT_MAX)
            } else {
                0.0
            }
        }
        Translation::new(clamp(self.vx), clamp(self.vy), clamp(self.vz))
    }

    /// Scale the planar part so its magnitude does not exceed `max`,
    /// preserving direction.
    pub fn limit_magnitude(self, max: f64) -> Translation {
        let m = self.magnitude();
        if m > max && m > 0.0 {
            let k = max / m;
            Translation::new(self.vx * k, self.vy * k, self.vz)
        } else {
            self
        }
    }
}

impl Add for Translation {
    type Output = Translation;

    #[inline]
    fn add(self, rhs: Translation) -> Translation {
        Translation::new(self.vx + rhs.vx, self.vy + rhs.vy, self.vz + rhs.vz)
    }
}

impl Mul<f64> for Translation {
    type Output = Translation;

    #[inline]
    fn mul(self, k: f64) -> Translation {
        Translation::new(self.vx * k, self.vy * k, self.vz * k)
    }
}

impl Neg for Translation {
    type Output = Translation;

    #[inline]
    fn neg(self) -> Translation {
        Translation::new(-self.vx, -self.vy, -self.vz)
    }
}

impl fmt::Display for Translation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.3}, {:.3}, {:.3}]", self.vx, self.vy, self.vz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_relative_absolute_round_trip() {
        let original = Translation::new(0.3, -0.7, 0.25);
        for deg in [0.0, 17.0, 90.0, 135.5, 180.0, 271.0, 359.9] {
            let heading = Angle::from_deg(deg);
            let back = original.to_relative(heading).to_absolute(heading);
            assert_abs_diff_eq!(back.vx, original.vx, epsilon = 1e-6);
            assert_abs_diff_eq!(back.vy, original.vy, epsilon = 1e-6);
            assert_abs_diff_eq!(back.vz, original.vz, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_to_relative_when_facing_left() {
        // Field +Y while facing +Y is straight ahead for the robot
        let rel = Translation::new(0.0, 1.0, 0.0).to_relative(Angle::from_deg(90.0));
        assert_abs_diff_eq!(rel.vx, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rel.vy, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_clamped() {
        let t = Translation::new(2.0, -3.0, f64::NAN).clamped();
        assert_eq!(t, Translation::new(1.0, -1.0, 0.0));
    }

    #[test]
    fn test_limit_magnitude() {
        let t = Translation::new(3.0, 4.0, 0.5).limit_magnitude(1.0);
        assert_abs_diff_eq!(t.magnitude(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(t.vx, 0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(t.vz, 0.5);
    }

    #[test]
    fn test_try_new() {
        assert!(Translation::try_new(0.0, f64::NAN, 0.0).is_err());
        assert_eq!(Translation::try_new(0.1, 0.2, 0.3), Ok(Translation::new(0.1, 0.2, 0.3)));
    }
}
