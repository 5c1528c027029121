//! Coordinate algebra: angles, points, poses and translations.
//!
//! All types here are plain `Copy` values with no side effects.

mod angle;
mod point;
mod translation;

pub use angle::{Angle, FULL_TURN_DEG, normalize_deg, shortest_delta_deg};
pub use point::{PointXY, PointXYZ};
pub use translation::{COMPONENT_MAX, COMPONENT_MIN, Translation};
