//! Spline-interpolated path with decoupled heading and speed profiles.
//!
//! The path is parametrized along one monotonic axis (X when the control
//! points allow it, Y otherwise). Three independent interpolants share that
//! parameter:
//!
//! - the other coordinate (the geometric path),
//! - the heading, unwrapped so it turns the short way between points,
//! - the speed.
//!
//! The pursuit marker sits `step` units ahead of the robot's projection on
//! the parameter axis, so the robot chases a point that slides along the
//! path instead of stopping at every control point.

use tracing::debug;

use super::interpolation::MonotoneCubicSpline;
use super::multi::MultiSegmentTrajectory;
use super::{DoneLatch, Trajectory, validate_speed, validate_tolerance};
use crate::error::ConfigError;
use crate::geometry::{PointXYZ, shortest_delta_deg};

/// Offset along the parameter axis applied to a control point that shares
/// its predecessor's parameter value.
pub const DUPLICATE_NUDGE: f64 = 1e-4;

/// Default marker step.
pub const DEFAULT_STEP: f64 = 0.1;

/// Axis the spline is parametrized along.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplineAxis {
    /// y, heading and speed are functions of x
    X,
    /// x, heading and speed are functions of y
    Y,
}

impl SplineAxis {
    #[inline]
    fn param(self, pose: PointXYZ) -> f64 {
        match self {
            SplineAxis::X => pose.x,
            SplineAxis::Y => pose.y,
        }
    }

    #[inline]
    fn other(self, pose: PointXYZ) -> f64 {
        match self {
            SplineAxis::X => pose.y,
            SplineAxis::Y => pose.x,
        }
    }

    #[inline]
    fn compose(self, param: f64, other: f64, heading_deg: f64) -> PointXYZ {
        match self {
            SplineAxis::X => PointXYZ::new(param, other, heading_deg),
            SplineAxis::Y => PointXYZ::new(other, param, heading_deg),
        }
    }

    fn nudge(self, pose: &mut PointXYZ, amount: f64) {
        match self {
            SplineAxis::X => pose.x += amount,
            SplineAxis::Y => pose.y += amount,
        }
    }
}

/// Smooth path through control points.
#[derive(Clone, Debug)]
pub struct SplineTrajectory {
    axis: SplineAxis,
    path: MonotoneCubicSpline,
    heading: MonotoneCubicSpline,
    speed: MonotoneCubicSpline,
    step: f64,
    end: PointXYZ,
    tolerance: f64,
    angle_tolerance_deg: f64,
    done: DoneLatch,
}

impl SplineTrajectory {
    /// Start a builder.
    pub fn builder() -> SplineBuilder {
        SplineBuilder::new()
    }

    /// Parametrization axis.
    pub fn axis(&self) -> SplineAxis {
        self.axis
    }

    /// Signed marker step; its sign always matches the path direction.
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Final pose.
    pub fn end(&self) -> PointXYZ {
        self.end
    }

    /// Sample the path at a parameter value (clamped to the path).
    pub fn sample(&self, param: f64) -> PointXYZ {
        let p = self.clamp_param(param);
        self.axis
            .compose(p, self.path.value_at(p), self.heading.value_at(p))
    }

    #[inline]
    fn clamp_param(&self, param: f64) -> f64 {
        param.clamp(self.path.min_x(), self.path.max_x())
    }
}

impl Trajectory for SplineTrajectory {
    fn next_marker(&mut self, current: PointXYZ) -> PointXYZ {
        let projected = self.clamp_param(self.axis.param(current));
        let marker = self.sample(projected + self.step);
        debug!("spline marker {} for {}", marker, current);
        marker
    }

    fn is_done(&mut self, current: PointXYZ) -> bool {
        let (end, tol, angle_tol) = (self.end, self.tolerance, self.angle_tolerance_deg);
        self.done.check(|| current.is_close(end, tol, angle_tol))
    }

    fn speed(&mut self, current: PointXYZ) -> f64 {
        let p = self.clamp_param(self.axis.param(current));
        self.speed.value_at(p).clamp(0.0, 1.0)
    }

    fn describe(&self) -> String {
        format!("spline({:?}) -> {}", self.axis, self.end)
    }
}

/// Builder for [`SplineTrajectory`].
#[derive(Clone, Debug)]
pub struct SplineBuilder {
    points: Vec<(PointXYZ, f64)>,
    step: f64,
    tolerance: Option<f64>,
    angle_tolerance_deg: Option<f64>,
}

impl Default for SplineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SplineBuilder {
    /// Empty builder with the default step.
    pub fn new() -> Self {
        Self {
            points: Vec::new(),
            step: DEFAULT_STEP,
            tolerance: None,
            angle_tolerance_deg: None,
        }
    }

    /// Append a control point with the speed to use near it.
    pub fn add_point(mut self, point: PointXYZ, speed: f64) -> Self {
        self.points.push((point, speed));
        self
    }

    /// Marker step. The sign is corrected to match the path direction.
    pub fn step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    /// Position tolerance at the final point.
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// Heading tolerance at the final point, in degrees.
    pub fn angle_tolerance_deg(mut self, degrees: f64) -> Self {
        self.angle_tolerance_deg = Some(degrees);
        self
    }

    /// Build a single spline. Fails with [`ConfigError::NonMonotonic`] if
    /// the control points cannot be parametrized along X or Y.
    pub fn build(self) -> Result<SplineTrajectory, ConfigError> {
        let (tolerance, angle_tolerance) = self.validate()?;
        let points = &self.points;
        let (axis, direction) = choose_axis(points)?;
        build_spline(points, axis, direction, self.step, tolerance, angle_tolerance)
    }

    /// Build a path of any shape by splitting the control points into
    /// consecutive runs that are each monotonic along some axis.
    pub fn build_segmented(self) -> Result<MultiSegmentTrajectory, ConfigError> {
        let (tolerance, angle_tolerance) = self.validate()?;
        let points = &self.points;

        let mut segments: Vec<Box<dyn Trajectory>> = Vec::new();
        let mut start = 0;
        while start < points.len() - 1 {
            let mut end = start + 1;
            while end + 1 < points.len() && choose_axis(&points[start..=end + 1]).is_ok() {
                end += 1;
            }
            let run = &points[start..=end];
            let (axis, direction) = choose_axis(run)?;
            segments.push(Box::new(build_spline(
                run,
                axis,
                direction,
                self.step,
                tolerance,
                angle_tolerance,
            )?));
            start = end;
        }

        debug!("segmented spline into {} runs", segments.len());
        MultiSegmentTrajectory::new(segments)
    }

    fn validate(&self) -> Result<(f64, f64), ConfigError> {
        if self.points.len() < 2 {
            return Err(ConfigError::TooFewControlPoints {
                required: 2,
                count: self.points.len(),
            });
        }
        for (point, speed) in &self.points {
            if !point.is_finite() {
                return Err(ConfigError::NonFinite("control point"));
            }
            validate_speed(*speed)?;
        }
        if !self.step.is_finite() || self.step == 0.0 {
            return Err(ConfigError::InvalidStep(self.step));
        }
        let tolerance = validate_tolerance(
            self.tolerance
                .ok_or(ConfigError::MissingField("tolerance"))?,
        )?;
        let angle_tolerance = validate_tolerance(
            self.angle_tolerance_deg
                .ok_or(ConfigError::MissingAngleTolerance)?,
        )?;
        Ok((tolerance, angle_tolerance))
    }
}

/// Find an axis along which the points are monotonic.
///
/// Returns the axis and the direction of travel along it (+1 or -1). Equal
/// neighbouring parameter values are allowed here; they are nudged apart
/// when the spline is built.
fn choose_axis(points: &[(PointXYZ, f64)]) -> Result<(SplineAxis, f64), ConfigError> {
    let mut first_reversal = None;
    for axis in [SplineAxis::X, SplineAxis::Y] {
        match monotonic_direction(points, axis) {
            Ok(direction) => return Ok((axis, direction)),
            Err(index) => {
                first_reversal.get_or_insert(index);
            }
        }
    }
    Err(ConfigError::NonMonotonic {
        index: first_reversal.unwrap_or(0),
    })
}

fn monotonic_direction(points: &[(PointXYZ, f64)], axis: SplineAxis) -> Result<f64, usize> {
    let first = axis.param(points[0].0);
    let last = axis.param(points[points.len() - 1].0);
    let direction = (last - first).signum();
    if last == first {
        return Err(points.len() - 1);
    }
    for i in 1..points.len() {
        let delta = axis.param(points[i].0) - axis.param(points[i - 1].0);
        if delta * direction < 0.0 {
            return Err(i);
        }
    }
    Ok(direction)
}

fn build_spline(
    points: &[(PointXYZ, f64)],
    axis: SplineAxis,
    direction: f64,
    step: f64,
    tolerance: f64,
    angle_tolerance_deg: f64,
) -> Result<SplineTrajectory, ConfigError> {
    let mut points = points.to_vec();

    // Separate equal parameter values along the chosen axis
    for i in 1..points.len() {
        let prev = axis.param(points[i - 1].0);
        if (axis.param(points[i].0) - prev) * direction <= 0.0 {
            let current = axis.param(points[i].0);
            axis.nudge(&mut points[i].0, prev - current + direction * DUPLICATE_NUDGE);
        }
    }

    let mut params = Vec::with_capacity(points.len());
    let mut others = Vec::with_capacity(points.len());
    let mut headings = Vec::with_capacity(points.len());
    let mut speeds = Vec::with_capacity(points.len());

    let mut unwrapped = points[0].0.z.deg();
    for (i, (point, speed)) in points.iter().enumerate() {
        if i > 0 {
            unwrapped += shortest_delta_deg(points[i - 1].0.z.deg(), point.z.deg());
        }
        params.push(axis.param(*point));
        others.push(axis.other(*point));
        headings.push(unwrapped);
        speeds.push(*speed);
    }

    if direction < 0.0 {
        params.reverse();
        others.reverse();
        headings.reverse();
        speeds.reverse();
    }

    let path = MonotoneCubicSpline::new(&params, &others)?;
    let heading = MonotoneCubicSpline::new(&params, &headings)?;
    let speed = MonotoneCubicSpline::new(&params, &speeds)?;

    let step = if step.signum() == direction {
        step
    } else {
        debug!("inverting spline step {} to match path direction", step);
        -step
    };

    let last = points[points.len() - 1].0;
    Ok(SplineTrajectory {
        axis,
        path,
        heading,
        speed,
        step,
        end: last,
        tolerance,
        angle_tolerance_deg,
        done: DoneLatch::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Angle;
    use approx::assert_abs_diff_eq;

    fn builder() -> SplineBuilder {
        SplineTrajectory::builder()
            .tolerance(0.5)
            .angle_tolerance_deg(5.0)
            .step(0.5)
    }

    #[test]
    fn test_marker_leads_robot_along_path() {
        let mut spline = builder()
            .add_point(PointXYZ::new(0.0, 0.0, 0.0), 0.5)
            .add_point(PointXYZ::new(5.0, 2.0, 0.0), 0.8)
            .add_point(PointXYZ::new(10.0, 0.0, 0.0), 0.3)
            .build()
            .unwrap();
        assert_eq!(spline.axis(), SplineAxis::X);

        let marker = spline.next_marker(PointXYZ::new(1.0, 0.0, 0.0));
        assert_abs_diff_eq!(marker.x, 1.5, epsilon = 1e-9);
        assert!(marker.y > 0.0);

        // Near the end the marker is the end point
        let marker = spline.next_marker(PointXYZ::new(9.9, 0.0, 0.0));
        assert_abs_diff_eq!(marker.x, 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(marker.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_step_sign_is_corrected() {
        let mut spline = builder()
            .step(0.5)
            .add_point(PointXYZ::new(10.0, 0.0, 180.0), 0.5)
            .add_point(PointXYZ::new(0.0, 0.0, 180.0), 0.5)
            .build()
            .unwrap();
        assert_abs_diff_eq!(spline.step(), -0.5);
        let marker = spline.next_marker(PointXYZ::new(8.0, 0.0, 180.0));
        assert_abs_diff_eq!(marker.x, 7.5, epsilon = 1e-9);
    }

    #[test]
    fn test_vertical_path_uses_y_axis() {
        let spline = builder()
            .add_point(PointXYZ::new(0.0, 0.0, 90.0), 0.5)
            .add_point(PointXYZ::new(0.0, 10.0, 90.0), 0.5)
            .build()
            .unwrap();
        assert_eq!(spline.axis(), SplineAxis::Y);
        let mid = spline.sample(5.0);
        assert_abs_diff_eq!(mid.x, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(mid.y, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_speed_profile_is_independent() {
        let mut spline = builder()
            .add_point(PointXYZ::new(0.0, 0.0, 0.0), 0.2)
            .add_point(PointXYZ::new(5.0, 0.0, 0.0), 1.0)
            .add_point(PointXYZ::new(10.0, 0.0, 0.0), 0.2)
            .build()
            .unwrap();
        let start = spline.speed(PointXYZ::new(0.0, 0.0, 0.0));
        let middle = spline.speed(PointXYZ::new(5.0, 3.0, 0.0));
        let end = spline.speed(PointXYZ::new(10.0, 0.0, 0.0));
        assert_abs_diff_eq!(start, 0.2, epsilon = 1e-9);
        assert_abs_diff_eq!(middle, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(end, 0.2, epsilon = 1e-9);
    }

    #[test]
    fn test_heading_turns_short_way() {
        let spline = builder()
            .add_point(PointXYZ::new(0.0, 0.0, 350.0), 0.5)
            .add_point(PointXYZ::new(10.0, 0.0, 10.0), 0.5)
            .build()
            .unwrap();
        let mid = spline.sample(5.0);
        assert!(mid.z.is_close(Angle::ZERO, 1e-6), "heading {}", mid.z);
    }

    #[test]
    fn test_non_monotonic_rejected() {
        let err = builder()
            .add_point(PointXYZ::new(0.0, 0.0, 0.0), 0.5)
            .add_point(PointXYZ::new(10.0, 10.0, 0.0), 0.5)
            .add_point(PointXYZ::new(0.0, 20.0, 0.0), 0.5)
            .add_point(PointXYZ::new(5.0, 0.0, 0.0), 0.5)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::NonMonotonic { .. }));
    }

    #[test]
    fn test_non_monotonic_segmented() {
        let mut multi = builder()
            .add_point(PointXYZ::new(0.0, 0.0, 0.0), 0.5)
            .add_point(PointXYZ::new(10.0, 10.0, 0.0), 0.5)
            .add_point(PointXYZ::new(0.0, 20.0, 0.0), 0.5)
            .add_point(PointXYZ::new(5.0, 0.0, 0.0), 0.5)
            .build_segmented()
            .unwrap();
        assert!(multi.segment_count() >= 2);
        assert!(!multi.is_done(PointXYZ::new(0.0, 0.0, 0.0)));
    }

    #[test]
    fn test_duplicate_points_nudged() {
        let spline = builder()
            .add_point(PointXYZ::new(0.0, 0.0, 0.0), 0.5)
            .add_point(PointXYZ::new(0.0, 0.0, 0.0), 0.5)
            .add_point(PointXYZ::new(10.0, 0.0, 0.0), 0.5)
            .build();
        assert!(spline.is_ok());
    }

    fn with_points(points: &[(f64, f64, f64)]) -> SplineBuilder {
        points.iter().fold(builder(), |b, &(x, y, z)| {
            b.add_point(PointXYZ::new(x, y, z), 0.5)
        })
    }

    #[test]
    fn test_duplicate_points_on_negative_x_path() {
        let points = [
            (10.0, 0.0, 180.0),
            (5.0, 0.0, 180.0),
            (5.0, 0.0, 180.0),
            (0.0, 0.0, 180.0),
        ];
        let mut spline = with_points(&points).build().unwrap();
        assert_eq!(spline.axis(), SplineAxis::X);
        assert_abs_diff_eq!(spline.end().x, 0.0, epsilon = 1e-9);
        let marker = spline.next_marker(PointXYZ::new(8.0, 0.0, 180.0));
        assert_abs_diff_eq!(marker.x, 7.5, epsilon = 1e-9);

        let multi = with_points(&points).build_segmented().unwrap();
        assert_eq!(multi.segment_count(), 1);
    }

    #[test]
    fn test_duplicate_points_on_y_path() {
        // X reverses, so the path is parametrized along Y
        let points = [
            (0.0, 0.0, 90.0),
            (2.0, 5.0, 90.0),
            (2.0, 5.0, 90.0),
            (1.0, 10.0, 90.0),
        ];
        let spline = with_points(&points).build().unwrap();
        assert_eq!(spline.axis(), SplineAxis::Y);
        assert_abs_diff_eq!(spline.end().y, 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(spline.sample(5.0).x, 2.0, epsilon = 1e-3);

        let multi = with_points(&points).build_segmented().unwrap();
        assert_eq!(multi.segment_count(), 1);

        let descending: Vec<_> = points.iter().rev().copied().collect();
        let spline = with_points(&descending).build().unwrap();
        assert_eq!(spline.axis(), SplineAxis::Y);
        assert_abs_diff_eq!(spline.end().y, 0.0, epsilon = 1e-9);
        assert!(with_points(&descending).build_segmented().is_ok());
    }

    #[test]
    fn test_invalid_configuration() {
        let one_point = builder()
            .add_point(PointXYZ::ZERO, 0.5)
            .build()
            .unwrap_err();
        assert!(matches!(one_point, ConfigError::TooFewControlPoints { .. }));

        let bad_speed = builder()
            .add_point(PointXYZ::ZERO, 0.5)
            .add_point(PointXYZ::new(1.0, 0.0, 0.0), 2.0)
            .build()
            .unwrap_err();
        assert_eq!(bad_speed, ConfigError::InvalidSpeed(2.0));

        let no_angle = SplineTrajectory::builder()
            .tolerance(1.0)
            .add_point(PointXYZ::ZERO, 0.5)
            .add_point(PointXYZ::new(1.0, 0.0, 0.0), 0.5)
            .build()
            .unwrap_err();
        assert_eq!(no_angle, ConfigError::MissingAngleTolerance);

        let zero_step = builder()
            .step(0.0)
            .add_point(PointXYZ::ZERO, 0.5)
            .add_point(PointXYZ::new(1.0, 0.0, 0.0), 0.5)
            .build()
            .unwrap_err();
        assert_eq!(zero_step, ConfigError::InvalidStep(0.0));
    }

    #[test]
    fn test_completion_latches() {
        let mut spline = builder()
            .add_point(PointXYZ::new(0.0, 0.0, 0.0), 0.5)
            .add_point(PointXYZ::new(10.0, 0.0, 0.0), 0.5)
            .build()
            .unwrap();
        assert!(!spline.is_done(PointXYZ::new(5.0, 0.0, 0.0)));
        assert!(spline.is_done(PointXYZ::new(10.0, 0.2, 1.0)));
        assert!(spline.is_done(PointXYZ::new(-100.0, 50.0, 200.0)));
    }
}
