//! Zone shapes.
//!
//! Shapes are closed planar regions. Boundaries count as inside.

use std::fmt;

use crate::error::ConfigError;
use crate::geometry::PointXY;

/// Segments used to approximate a circle's outline.
const CIRCLE_OUTLINE_SEGMENTS: usize = 32;

/// A closed planar region used as a zone trigger.
pub trait Shape: fmt::Debug {
    /// Whether `point` lies inside or on the boundary.
    fn contains(&self, point: PointXY) -> bool;

    /// The point of the region closest to `point`; `point` itself if inside.
    fn closest_point(&self, point: PointXY) -> PointXY;

    /// A representative interior point.
    fn center(&self) -> PointXY;

    /// Boundary as a closed polyline (last vertex connects to the first).
    fn outline(&self) -> Vec<PointXY>;

    /// Whether the segment `a -> b` touches the region.
    fn intersects_segment(&self, a: PointXY, b: PointXY) -> bool {
        if self.contains(a) || self.contains(b) {
            return true;
        }
        let outline = self.outline();
        edges(&outline).any(|(c, d)| segments_intersect(a, b, c, d))
    }

    /// Whether two regions overlap.
    fn does_collide_with(&self, other: &dyn Shape) -> bool {
        let outline = self.outline();
        if outline.first().is_some_and(|&p| other.contains(p)) {
            return true;
        }
        if other.outline().first().is_some_and(|&p| self.contains(p)) {
            return true;
        }
        edges(&outline).any(|(a, b)| other.intersects_segment(a, b))
    }

    /// A copy inflated by `radius` (deflated when negative).
    fn grow_by(&self, radius: f64) -> Box<dyn Shape>;
}

fn edges(points: &[PointXY]) -> impl Iterator<Item = (PointXY, PointXY)> + '_ {
    let n = points.len();
    (0..n).map(move |i| (points[i], points[(i + 1) % n]))
}

#[inline]
fn cross(o: PointXY, a: PointXY, b: PointXY) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Closest point to `p` on the segment `a -> b`.
pub fn closest_on_segment(p: PointXY, a: PointXY, b: PointXY) -> PointXY {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 {
        return a;
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
    PointXY::new(a.x + t * dx, a.y + t * dy)
}

fn on_segment(p: PointXY, a: PointXY, b: PointXY) -> bool {
    p.x >= a.x.min(b.x) - 1e-9
        && p.x <= a.x.max(b.x) + 1e-9
        && p.y >= a.y.min(b.y) - 1e-9
        && p.y <= a.y.max(b.y) + 1e-9
}

/// Whether segments `a1 -> a2` and `b1 -> b2` share a point.
pub fn segments_intersect(a1: PointXY, a2: PointXY, b1: PointXY, b2: PointXY) -> bool {
    let d1 = cross(b1, b2, a1);
    let d2 = cross(b1, b2, a2);
    let d3 = cross(a1, a2, b1);
    let d4 = cross(a1, a2, b2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    // Collinear touching
    let epsilon = 1e-9;
    (d1.abs() < epsilon && on_segment(a1, b1, b2))
        || (d2.abs() < epsilon && on_segment(a2, b1, b2))
        || (d3.abs() < epsilon && on_segment(b1, a1, a2))
        || (d4.abs() < epsilon && on_segment(b2, a1, a2))
}

/// Disc of a given radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    pub center: PointXY,
    pub radius: f64,
}

impl Circle {
    pub fn new(center: PointXY, radius: f64) -> Result<Self, ConfigError> {
        if !center.is_finite() || !radius.is_finite() {
            return Err(ConfigError::NonFinite("circle"));
        }
        if radius <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "radius",
                reason: format!("must be positive, got {}", radius),
            });
        }
        Ok(Self { center, radius })
    }
}

impl Shape for Circle {
    fn contains(&self, point: PointXY) -> bool {
        self.center.distance_squared(point) <= self.radius * self.radius
    }

    fn closest_point(&self, point: PointXY) -> PointXY {
        let d = self.center.distance(point);
        if d <= self.radius {
            point
        } else {
            self.center
                .in_direction(self.radius, self.center.angle_to(point))
        }
    }

    fn center(&self) -> PointXY {
        self.center
    }

    fn outline(&self) -> Vec<PointXY> {
        (0..CIRCLE_OUTLINE_SEGMENTS)
            .map(|i| {
                let theta = std::f64::consts::TAU * i as f64 / CIRCLE_OUTLINE_SEGMENTS as f64;
                PointXY::new(
                    self.center.x + self.radius * theta.cos(),
                    self.center.y + self.radius * theta.sin(),
                )
            })
            .collect()
    }

    fn intersects_segment(&self, a: PointXY, b: PointXY) -> bool {
        self.contains(closest_on_segment(self.center, a, b))
    }

    fn does_collide_with(&self, other: &dyn Shape) -> bool {
        self.contains(other.closest_point(self.center))
    }

    fn grow_by(&self, radius: f64) -> Box<dyn Shape> {
        Box::new(Circle {
            center: self.center,
            radius: (self.radius + radius).max(0.0),
        })
    }
}

/// Axis-aligned rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rectangle {
    pub min: PointXY,
    pub max: PointXY,
}

impl Rectangle {
    /// Rectangle spanning two opposite corners, in any order.
    pub fn new(a: PointXY, b: PointXY) -> Result<Self, ConfigError> {
        if !a.is_finite() || !b.is_finite() {
            return Err(ConfigError::NonFinite("rectangle"));
        }
        Ok(Self {
            min: PointXY::new(a.x.min(b.x), a.y.min(b.y)),
            max: PointXY::new(a.x.max(b.x), a.y.max(b.y)),
        })
    }

    /// Rectangle of the given size centered on `center`.
    pub fn centered(center: PointXY, width: f64, height: f64) -> Result<Self, ConfigError> {
        Self::new(
            PointXY::new(center.x - width / 2.0, center.y - height / 2.0),
            PointXY::new(center.x + width / 2.0, center.y + height / 2.0),
        )
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

impl Shape for Rectangle {
    fn contains(&self, point: PointXY) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    fn closest_point(&self, point: PointXY) -> PointXY {
        PointXY::new(
            point.x.clamp(self.min.x, self.max.x),
            point.y.clamp(self.min.y, self.max.y),
        )
    }

    fn center(&self) -> PointXY {
        self.min.midpoint(self.max)
    }

    fn outline(&self) -> Vec<PointXY> {
        vec![
            self.min,
            PointXY::new(self.max.x, self.min.y),
            self.max,
            PointXY::new(self.min.x, self.max.y),
        ]
    }

    fn grow_by(&self, radius: f64) -> Box<dyn Shape> {
        let c = self.center();
        let half_w = (self.width() / 2.0 + radius).max(0.0);
        let half_h = (self.height() / 2.0 + radius).max(0.0);
        Box::new(Rectangle {
            min: PointXY::new(c.x - half_w, c.y - half_h),
            max: PointXY::new(c.x + half_w, c.y + half_h),
        })
    }
}

/// Simple polygon (non-self-intersecting), vertices in either winding.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    vertices: Vec<PointXY>,
}

impl Polygon {
    pub fn new(vertices: Vec<PointXY>) -> Result<Self, ConfigError> {
        if vertices.len() < 3 {
            return Err(ConfigError::TooFewControlPoints {
                required: 3,
                count: vertices.len(),
            });
        }
        if vertices.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::NonFinite("polygon vertex"));
        }
        let polygon = Self { vertices };
        if polygon.signed_area() == 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "vertices",
                reason: "polygon has zero area".to_string(),
            });
        }
        Ok(polygon)
    }

    pub fn vertices(&self) -> &[PointXY] {
        &self.vertices
    }

    /// Shoelace area; positive for counter-clockwise winding.
    pub fn signed_area(&self) -> f64 {
        edges(&self.vertices)
            .map(|(a, b)| a.x * b.y - b.x * a.y)
            .sum::<f64>()
            / 2.0
    }
}

impl Shape for Polygon {
    fn contains(&self, point: PointXY) -> bool {
        // Boundary counts as inside
        if edges(&self.vertices)
            .any(|(a, b)| closest_on_segment(point, a, b).distance_squared(point) < 1e-18)
        {
            return true;
        }
        let mut inside = false;
        for (a, b) in edges(&self.vertices) {
            if (a.y > point.y) != (b.y > point.y) {
                let x = a.x + (point.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if point.x < x {
                    inside = !inside;
                }
            }
        }
        inside
    }

    fn closest_point(&self, point: PointXY) -> PointXY {
        if self.contains(point) {
            return point;
        }
        edges(&self.vertices)
            .map(|(a, b)| closest_on_segment(point, a, b))
            .min_by(|p, q| {
                p.distance_squared(point)
                    .total_cmp(&q.distance_squared(point))
            })
            .unwrap_or(point)
    }

    fn center(&self) -> PointXY {
        let n = self.vertices.len() as f64;
        let sum = self
            .vertices
            .iter()
            .fold(PointXY::ZERO, |acc, &v| acc + v);
        PointXY::new(sum.x / n, sum.y / n)
    }

    fn outline(&self) -> Vec<PointXY> {
        self.vertices.clone()
    }

    /// Mitred offset of every edge along its outward normal.
    fn grow_by(&self, radius: f64) -> Box<dyn Shape> {
        let n = self.vertices.len();
        let orientation = self.signed_area().signum();
        let normal = |a: PointXY, b: PointXY| {
            let (dx, dy) = (b.x - a.x, b.y - a.y);
            let len = (dx * dx + dy * dy).sqrt().max(f64::MIN_POSITIVE);
            // Outward for counter-clockwise winding
            PointXY::new(orientation * dy / len, -orientation * dx / len)
        };

        let vertices = (0..n)
            .map(|i| {
                let prev = self.vertices[(i + n - 1) % n];
                let here = self.vertices[i];
                let next = self.vertices[(i + 1) % n];
                let n1 = normal(prev, here);
                let n2 = normal(here, next);
                let denom = 1.0 + n1.x * n2.x + n1.y * n2.y;
                if denom.abs() < 1e-9 {
                    // Hairpin; push straight out along the first normal
                    PointXY::new(here.x + n1.x * radius, here.y + n1.y * radius)
                } else {
                    let k = radius / denom;
                    PointXY::new(here.x + (n1.x + n2.x) * k, here.y + (n1.y + n2.y) * k)
                }
            })
            .collect();
        Box::new(Polygon { vertices })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn square() -> Polygon {
        Polygon::new(vec![
            PointXY::new(0.0, 0.0),
            PointXY::new(4.0, 0.0),
            PointXY::new(4.0, 4.0),
            PointXY::new(0.0, 4.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_circle_contains_boundary() {
        let c = Circle::new(PointXY::ZERO, 5.0).unwrap();
        assert!(c.contains(PointXY::new(5.0, 0.0)));
        assert!(c.contains(PointXY::new(3.0, 4.0)));
        assert!(!c.contains(PointXY::new(5.01, 0.0)));
    }

    #[test]
    fn test_circle_closest_point() {
        let c = Circle::new(PointXY::ZERO, 5.0).unwrap();
        let p = c.closest_point(PointXY::new(10.0, 0.0));
        assert_abs_diff_eq!(p.x, 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(p.y, 0.0, epsilon = 1e-9);
        assert_eq!(c.closest_point(PointXY::new(1.0, 1.0)), PointXY::new(1.0, 1.0));
    }

    #[test]
    fn test_segment_through_circle() {
        let c = Circle::new(PointXY::ZERO, 1.0).unwrap();
        assert!(c.intersects_segment(PointXY::new(-10.0, 0.0), PointXY::new(10.0, 0.0)));
        assert!(!c.intersects_segment(PointXY::new(-10.0, 2.0), PointXY::new(10.0, 2.0)));
    }

    #[test]
    fn test_rectangle() {
        let r = Rectangle::new(PointXY::new(4.0, 2.0), PointXY::new(0.0, 0.0)).unwrap();
        assert!(r.contains(PointXY::new(2.0, 1.0)));
        assert!(r.contains(PointXY::new(4.0, 2.0)));
        assert!(!r.contains(PointXY::new(4.5, 1.0)));
        assert_eq!(r.closest_point(PointXY::new(10.0, -3.0)), PointXY::new(4.0, 0.0));
        assert!(r.intersects_segment(PointXY::new(2.0, -5.0), PointXY::new(2.0, 5.0)));
        assert!(!r.intersects_segment(PointXY::new(5.0, -5.0), PointXY::new(5.0, 5.0)));

        let grown = r.grow_by(1.0);
        assert!(grown.contains(PointXY::new(4.9, 2.9)));
        assert!(!grown.contains(PointXY::new(5.1, 1.0)));
    }

    #[test]
    fn test_polygon_contains() {
        let tri = Polygon::new(vec![
            PointXY::new(0.0, 0.0),
            PointXY::new(10.0, 0.0),
            PointXY::new(0.0, 10.0),
        ])
        .unwrap();
        assert!(tri.contains(PointXY::new(1.0, 1.0)));
        assert!(tri.contains(PointXY::new(5.0, 5.0)));
        assert!(!tri.contains(PointXY::new(6.0, 6.0)));
    }

    #[test]
    fn test_polygon_grow_either_winding() {
        let ccw = square();
        let mut cw_vertices = ccw.vertices().to_vec();
        cw_vertices.reverse();
        let cw = Polygon::new(cw_vertices).unwrap();

        for shape in [&ccw, &cw] {
            let grown = shape.grow_by(1.0);
            assert!(grown.contains(PointXY::new(-0.9, 2.0)));
            assert!(grown.contains(PointXY::new(4.9, 4.9)));
            assert!(!grown.contains(PointXY::new(5.1, 2.0)));
            let shrunk = shape.grow_by(-1.0);
            assert!(!shrunk.contains(PointXY::new(0.5, 2.0)));
            assert!(shrunk.contains(PointXY::new(2.0, 2.0)));
        }
    }

    #[test]
    fn test_collisions() {
        let s = square();
        let near = Circle::new(PointXY::new(5.0, 2.0), 1.5).unwrap();
        let far = Circle::new(PointXY::new(8.0, 2.0), 1.5).unwrap();
        assert!(s.does_collide_with(&near));
        assert!(near.does_collide_with(&s));
        assert!(!s.does_collide_with(&far));
        assert!(!far.does_collide_with(&s));

        let inner = Rectangle::new(PointXY::new(1.0, 1.0), PointXY::new(2.0, 2.0)).unwrap();
        assert!(s.does_collide_with(&inner));
        assert!(inner.does_collide_with(&s));
    }

    #[test]
    fn test_invalid_shapes() {
        assert!(Circle::new(PointXY::ZERO, 0.0).is_err());
        assert!(Circle::new(PointXY::new(f64::NAN, 0.0), 1.0).is_err());
        assert!(Polygon::new(vec![PointXY::ZERO, PointXY::new(1.0, 0.0)]).is_err());
        assert!(
            Polygon::new(vec![
                PointXY::ZERO,
                PointXY::new(1.0, 0.0),
                PointXY::new(2.0, 0.0)
            ])
            .is_err()
        );
    }
}
