//! 2D points and robot poses.
//!
//! Units are arbitrary but must be consistent across a routine (inches,
//! centimeters, tiles). Headings follow the [`Angle`] convention:
//! 0° along +X, counter-clockwise positive.

use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

use super::angle::Angle;
use crate::error::{ConfigError, ensure_finite};

/// A point in the plane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PointXY {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl PointXY {
    /// The origin.
    pub const ZERO: PointXY = PointXY { x: 0.0, y: 0.0 };

    /// Create a new point.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Create a point, rejecting NaN and infinite coordinates.
    pub fn try_new(x: f64, y: f64) -> Result<Self, ConfigError> {
        Ok(Self::new(ensure_finite(x, "x")?, ensure_finite(y, "y")?))
    }

    /// Whether both coordinates are finite.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(self, other: PointXY) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Squared distance, for comparisons.
    #[inline]
    pub fn distance_squared(self, other: PointXY) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    /// Bearing from this point toward `other`.
    ///
    /// Returns [`Angle::ZERO`] when the points coincide.
    #[inline]
    pub fn angle_to(self, other: PointXY) -> Angle {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        if dx == 0.0 && dy == 0.0 {
            Angle::ZERO
        } else {
            Angle::from_rad(dy.atan2(dx))
        }
    }

    /// The point `distance` units away along heading `angle`.
    #[inline]
    pub fn in_direction(self, distance: f64, angle: Angle) -> PointXY {
        let (sin, cos) = angle.sin_cos();
        PointXY::new(self.x + distance * cos, self.y + distance * sin)
    }

    /// Rotate this point about `center` by `angle`.
    pub fn rotate_around(self, center: PointXY, angle: Angle) -> PointXY {
        let (sin, cos) = angle.sin_cos();
        let dx = self.x - center.x;
        let dy = self.y - center.y;
        PointXY::new(center.x + dx * cos - dy * sin, center.y + dx * sin + dy * cos)
    }

    /// Midpoint between two points.
    #[inline]
    pub fn midpoint(self, other: PointXY) -> PointXY {
        PointXY::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Whether `other` is within `tolerance` of this point.
    #[inline]
    pub fn is_near(self, other: PointXY, tolerance: f64) -> bool {
        self.distance(other) <= tolerance
    }

    /// Attach a heading to make a pose.
    #[inline]
    pub fn with_heading(self, heading: Angle) -> PointXYZ {
        PointXYZ {
            x: self.x,
            y: self.y,
            z: heading,
        }
    }
}

impl Add for PointXY {
    type Output = PointXY;

    #[inline]
    fn add(self, rhs: PointXY) -> PointXY {
        PointXY::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for PointXY {
    type Output = PointXY;

    #[inline]
    fn sub(self, rhs: PointXY) -> PointXY {
        PointXY::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl fmt::Display for PointXY {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

/// A robot pose: position plus heading.
///
/// Immutable value type; every operation returns a new pose.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PointXYZ {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Heading
    pub z: Angle,
}

impl PointXYZ {
    /// The origin facing +X.
    pub const ZERO: PointXYZ = PointXYZ {
        x: 0.0,
        y: 0.0,
        z: Angle::ZERO,
    };

    /// Create a pose from coordinates and a heading in degrees.
    #[inline]
    pub fn new(x: f64, y: f64, heading_deg: f64) -> Self {
        Self {
            x,
            y,
            z: Angle::from_deg(heading_deg),
        }
    }

    /// Create a pose, rejecting NaN and infinite components.
    pub fn try_new(x: f64, y: f64, heading_deg: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            x: ensure_finite(x, "x")?,
            y: ensure_finite(y, "y")?,
            z: Angle::try_from_deg(heading_deg)?,
        })
    }

    /// Create a pose from a point and a heading.
    #[inline]
    pub fn from_point(point: PointXY, heading: Angle) -> Self {
        point.with_heading(heading)
    }

    /// Whether every component is finite.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.deg().is_finite()
    }

    /// Position part of the pose.
    #[inline]
    pub fn xy(self) -> PointXY {
        PointXY::new(self.x, self.y)
    }

    /// Heading of the pose.
    #[inline]
    pub fn heading(self) -> Angle {
        self.z
    }

    /// Same position, different heading.
    #[inline]
    pub fn with_heading(self, heading: Angle) -> PointXYZ {
        PointXYZ { z: heading, ..self }
    }

    /// Distance between the positions of two poses.
    #[inline]
    pub fn distance(self, other: PointXYZ) -> f64 {
        self.xy().distance(other.xy())
    }

    /// Bearing from this pose's position toward another pose's position.
    #[inline]
    pub fn angle_to(self, other: PointXYZ) -> Angle {
        self.xy().angle_to(other.xy())
    }

    /// Move `distance` units along `angle`, keeping the current heading.
    #[inline]
    pub fn in_direction(self, distance: f64, angle: Angle) -> PointXYZ {
        self.xy().in_direction(distance, angle).with_heading(self.z)
    }

    /// Move `distance` units along the pose's own heading.
    #[inline]
    pub fn forward(self, distance: f64) -> PointXYZ {
        self.in_direction(distance, self.z)
    }

    /// Signed heading delta from this pose to another, in degrees.
    #[inline]
    pub fn heading_delta(self, other: PointXYZ) -> f64 {
        self.z.delta_to(other.z)
    }

    /// Whether another pose is within both a position and a heading tolerance.
    #[inline]
    pub fn is_close(self, other: PointXYZ, tolerance: f64, angle_tolerance_deg: f64) -> bool {
        self.distance(other) <= tolerance && self.z.is_close(other.z, angle_tolerance_deg)
    }
}

impl Add for PointXYZ {
    type Output = PointXYZ;

    /// Component-wise sum; headings add modulo a full turn.
    #[inline]
    fn add(self, rhs: PointXYZ) -> PointXYZ {
        PointXYZ {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl Sub for PointXYZ {
    type Output = PointXYZ;

    #[inline]
    fn sub(self, rhs: PointXYZ) -> PointXYZ {
        PointXYZ {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

impl From<PointXYZ> for PointXY {
    fn from(pose: PointXYZ) -> Self {
        pose.xy()
    }
}

impl fmt::Display for PointXYZ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {})", self.x, self.y, self.z)
    }
}
