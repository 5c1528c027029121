//! Heading angle normalized to [0°, 360°).

use std::fmt;
use std::ops::{Add, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ensure_finite};

/// Degrees in a full turn.
pub const FULL_TURN_DEG: f64 = 360.0;

/// Normalize an angle in degrees to [0, 360).
#[inline]
pub fn normalize_deg(deg: f64) -> f64 {
    let a = deg.rem_euclid(FULL_TURN_DEG);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if a >= FULL_TURN_DEG { 0.0 } else { a }
}

/// Signed shortest rotation from `from` to `to` in degrees.
///
/// The result lies in (-180, 180]. Positive means counter-clockwise.
#[inline]
pub fn shortest_delta_deg(from: f64, to: f64) -> f64 {
    let d = normalize_deg(to - from);
    if d > 180.0 { d - FULL_TURN_DEG } else { d }
}

/// A heading, stored in degrees and always normalized to [0, 360).
///
/// Counter-clockwise positive, 0° along +X.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Angle {
    deg: f64,
}

impl Angle {
    /// Zero heading.
    pub const ZERO: Angle = Angle { deg: 0.0 };

    /// Create an angle from degrees.
    #[inline]
    pub fn from_deg(deg: f64) -> Self {
        Self {
            deg: normalize_deg(deg),
        }
    }

    /// Create an angle from radians.
    #[inline]
    pub fn from_rad(rad: f64) -> Self {
        Self::from_deg(rad.to_degrees())
    }

    /// Create an angle from degrees, rejecting NaN and infinities.
    pub fn try_from_deg(deg: f64) -> Result<Self, ConfigError> {
        Ok(Self::from_deg(ensure_finite(deg, "angle")?))
    }

    /// Value in degrees, [0, 360).
    #[inline]
    pub fn deg(self) -> f64 {
        self.deg
    }

    /// Value in radians, [0, 2π).
    #[inline]
    pub fn rad(self) -> f64 {
        self.deg.to_radians()
    }

    /// Sine and cosine of the angle.
    #[inline]
    pub fn sin_cos(self) -> (f64, f64) {
        self.rad().sin_cos()
    }

    /// Signed shortest delta from `self` to `other` in degrees, (-180, 180].
    #[inline]
    pub fn delta_to(self, other: Angle) -> f64 {
        shortest_delta_deg(self.deg, other.deg)
    }

    /// Signed shortest delta between two angles in degrees.
    #[inline]
    pub fn minimum_delta(from: Angle, to: Angle) -> f64 {
        from.delta_to(to)
    }

    /// Whether two angles are within `tolerance_deg` of each other.
    #[inline]
    pub fn is_close(self, other: Angle, tolerance_deg: f64) -> bool {
        self.delta_to(other).abs() <= tolerance_deg
    }
}

impl From<f64> for Angle {
    fn from(deg: f64) -> Self {
        Angle::from_deg(deg)
    }
}

impl From<Angle> for f64 {
    fn from(angle: Angle) -> Self {
        angle.deg
    }
}

impl Add for Angle {
    type Output = Angle;

    #[inline]
    fn add(self, rhs: Angle) -> Angle {
        Angle::from_deg(self.deg + rhs.deg)
    }
}

impl Sub for Angle {
    type Output = Angle;

    #[inline]
    fn sub(self, rhs: Angle) -> Angle {
        Angle::from_deg(self.deg - rhs.deg)
    }
}

impl Neg for Angle {
    type Output = Angle;

    #[inline]
    fn neg(self) -> Angle {
        Angle::from_deg(-self.deg)
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}°", self.deg)
    }
}
