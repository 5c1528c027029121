//! Piecewise cubic interpolation.
//!
//! Uses the Fritsch–Carlson monotone cubic Hermite construction: the
//! interpolant never overshoots between control points, so a speed profile
//! with values in [0, 1] stays in [0, 1] and heading profiles do not wobble.

use crate::error::ConfigError;

/// Monotone piecewise cubic interpolant over strictly increasing knots.
#[derive(Clone, Debug)]
pub struct MonotoneCubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    tangents: Vec<f64>,
}

impl MonotoneCubicSpline {
    /// Build an interpolant through `(xs[i], ys[i])`.
    ///
    /// `xs` must be strictly increasing and both slices must have the same
    /// length of at least two.
    pub fn new(xs: &[f64], ys: &[f64]) -> Result<Self, ConfigError> {
        if xs.len() != ys.len() {
            return Err(ConfigError::InvalidValue {
                field: "ys",
                reason: format!("{} knots but {} values", xs.len(), ys.len()),
            });
        }
        if xs.len() < 2 {
            return Err(ConfigError::TooFewControlPoints {
                required: 2,
                count: xs.len(),
            });
        }
        if xs.iter().chain(ys).any(|v| !v.is_finite()) {
            return Err(ConfigError::NonFinite("control point"));
        }
        for i in 1..xs.len() {
            if xs[i] == xs[i - 1] {
                return Err(ConfigError::DuplicateControlPoint { index: i });
            }
            if xs[i] < xs[i - 1] {
                return Err(ConfigError::NonMonotonic { index: i });
            }
        }

        let n = xs.len();
        let secants: Vec<f64> = (0..n - 1)
            .map(|k| (ys[k + 1] - ys[k]) / (xs[k + 1] - xs[k]))
            .collect();

        let mut tangents = vec![0.0; n];
        tangents[0] = secants[0];
        tangents[n - 1] = secants[n - 2];
        for k in 1..n - 1 {
            let (a, b) = (secants[k - 1], secants[k]);
            tangents[k] = if a * b <= 0.0 { 0.0 } else { (a + b) / 2.0 };
        }

        for k in 0..n - 1 {
            let d = secants[k];
            if d == 0.0 {
                tangents[k] = 0.0;
                tangents[k + 1] = 0.0;
                continue;
            }
            let alpha = tangents[k] / d;
            let beta = tangents[k + 1] / d;
            let s = alpha * alpha + beta * beta;
            if s > 9.0 {
                let tau = 3.0 / s.sqrt();
                tangents[k] = tau * alpha * d;
                tangents[k + 1] = tau * beta * d;
            }
        }

        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            tangents,
        })
    }

    /// Smallest knot.
    #[inline]
    pub fn min_x(&self) -> f64 {
        self.xs[0]
    }

    /// Largest knot.
    #[inline]
    pub fn max_x(&self) -> f64 {
        self.xs[self.xs.len() - 1]
    }

    /// Number of knots.
    #[inline]
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    /// Always false; construction requires two knots.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Evaluate at `x`, clamped to the knot range.
    pub fn value_at(&self, x: f64) -> f64 {
        let x = x.clamp(self.min_x(), self.max_x());
        // Index of the first knot strictly greater than x, minus one
        let k = self
            .xs
            .partition_point(|&knot| knot <= x)
            .saturating_sub(1)
            .min(self.xs.len() - 2);

        let h = self.xs[k + 1] - self.xs[k];
        let t = (x - self.xs[k]) / h;
        let t2 = t * t;
        let t3 = t2 * t;

        let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
        let h10 = t3 - 2.0 * t2 + t;
        let h01 = -2.0 * t3 + 3.0 * t2;
        let h11 = t3 - t2;

        h00 * self.ys[k]
            + h10 * h * self.tangents[k]
            + h01 * self.ys[k + 1]
            + h11 * h * self.tangents[k + 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_passes_through_knots() {
        let xs = [0.0, 1.0, 2.5, 4.0];
        let ys = [0.0, 2.0, 1.0, 3.0];
        let spline = MonotoneCubicSpline::new(&xs, &ys).unwrap();
        for (x, y) in xs.iter().zip(ys.iter()) {
            assert_abs_diff_eq!(spline.value_at(*x), *y, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_two_points_is_linear() {
        let spline = MonotoneCubicSpline::new(&[0.0, 10.0], &[0.0, 5.0]).unwrap();
        assert_abs_diff_eq!(spline.value_at(5.0), 2.5, epsilon = 1e-9);
        assert_abs_diff_eq!(spline.value_at(2.0), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_no_overshoot_on_monotone_data() {
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
        let ys = [0.0, 0.1, 0.9, 1.0, 1.0];
        let spline = MonotoneCubicSpline::new(&xs, &ys).unwrap();
        let mut prev = spline.value_at(0.0);
        for i in 1..=400 {
            let v = spline.value_at(i as f64 * 0.01);
            assert!(v >= prev - 1e-12, "not monotone at {}", i);
            assert!((0.0..=1.0 + 1e-12).contains(&v));
            prev = v;
        }
    }

    #[test]
    fn test_clamps_outside_range() {
        let spline = MonotoneCubicSpline::new(&[1.0, 2.0, 3.0], &[5.0, 6.0, 8.0]).unwrap();
        assert_abs_diff_eq!(spline.value_at(-10.0), 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(spline.value_at(10.0), 8.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rejects_bad_knots() {
        assert_eq!(
            MonotoneCubicSpline::new(&[0.0], &[1.0]).unwrap_err(),
            ConfigError::TooFewControlPoints {
                required: 2,
                count: 1
            }
        );
        assert_eq!(
            MonotoneCubicSpline::new(&[0.0, 1.0, 1.0], &[0.0, 1.0, 2.0]).unwrap_err(),
            ConfigError::DuplicateControlPoint { index: 2 }
        );
        assert_eq!(
            MonotoneCubicSpline::new(&[0.0, 2.0, 1.0], &[0.0, 1.0, 2.0]).unwrap_err(),
            ConfigError::NonMonotonic { index: 2 }
        );
        assert!(MonotoneCubicSpline::new(&[0.0, f64::NAN], &[0.0, 1.0]).is_err());
    }
}
