use serde::{Deserialize, Serialize};

use super::core::{Point3, Tolerance, Vec3};

/// Step used by the default numeric derivative, as a fraction of the domain span.
const DERIVATIVE_STEP: f64 = 1e-6;

pub trait Curve3 {
    fn point_at(&self, t: f64) -> Point3;

    #[must_use]
    fn domain(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    #[must_use]
    fn is_closed(&self) -> bool {
        false
    }

    #[must_use]
    fn derivative_at(&self, t: f64) -> Vec3 {
        let (a, b) = self.domain();
        let span = b - a;
        if !span.is_finite() || span == 0.0 {
            return Vec3::ZERO;
        }

        let h = DERIVATIVE_STEP * span.abs();
        let t0 = (t - h).max(a);
        let t1 = (t + h).min(b);
        if t1 == t0 {
            return Vec3::ZERO;
        }

        let p0 = self.point_at(t0);
        let p1 = self.point_at(t1);
        p1.sub_point(p0).mul_scalar(1.0 / (t1 - t0))
    }

    /// Returns the unit tangent vector at parameter `t`.
    /// Returns `None` if the derivative is zero or degenerate.
    #[must_use]
    fn tangent_at(&self, t: f64) -> Option<Vec3> {
        self.derivative_at(t).normalized()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line3 {
    pub start: Point3,
    pub end: Point3,
}

impl Line3 {
    #[must_use]
    pub const fn new(start: Point3, end: Point3) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn direction(self) -> Vec3 {
        self.end.sub_point(self.start)
    }

    #[must_use]
    pub fn length(self) -> f64 {
        self.direction().length()
    }
}

impl Curve3 for Line3 {
    fn point_at(&self, t: f64) -> Point3 {
        self.start.add_vec(self.direction().mul_scalar(t))
    }

    fn derivative_at(&self, _t: f64) -> Vec3 {
        self.direction()
    }
}

/// Polyline parameterized by normalized arc length over `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PolylineData", into = "PolylineData")]
pub struct Polyline3 {
    points: Vec<Point3>,
    cumulative_lengths: Vec<f64>,
    total_length: f64,
    closed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PolylineData {
    points: Vec<Point3>,
    #[serde(default)]
    closed: bool,
}

impl TryFrom<PolylineData> for Polyline3 {
    type Error = String;

    fn try_from(data: PolylineData) -> Result<Self, Self::Error> {
        Self::new(data.points, data.closed)
    }
}

impl From<Polyline3> for PolylineData {
    fn from(polyline: Polyline3) -> Self {
        Self {
            points: polyline.points,
            closed: polyline.closed,
        }
    }
}

impl Polyline3 {
    pub fn new(mut points: Vec<Point3>, closed: bool) -> Result<Self, String> {
        if points.len() < 2 {
            return Err("polyline requires at least 2 points".to_string());
        }
        if closed && points.len() > 2 && points.first() == points.last() {
            points.pop();
        }

        let mut cumulative_lengths = Vec::with_capacity(points.len());
        cumulative_lengths.push(0.0);
        let mut total = 0.0;
        for window in points.windows(2) {
            total += window[1].sub_point(window[0]).length();
            cumulative_lengths.push(total);
        }

        if closed {
            total += points
                .first()
                .copied()
                .zip(points.last().copied())
                .map_or(0.0, |(first, last)| first.sub_point(last).length());
        }

        Ok(Self {
            points,
            cumulative_lengths,
            total_length: total,
            closed,
        })
    }

    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        self.total_length
    }

    /// Straight segments in vertex order, including the closing one for closed polylines.
    #[must_use]
    pub fn segments(&self) -> Vec<Line3> {
        let mut segments: Vec<Line3> = self
            .points
            .windows(2)
            .map(|w| Line3::new(w[0], w[1]))
            .collect();
        if self.closed {
            if let (Some(&first), Some(&last)) = (self.points.first(), self.points.last()) {
                segments.push(Line3::new(last, first));
            }
        }
        segments
    }
}

impl Curve3 for Polyline3 {
    fn point_at(&self, t: f64) -> Point3 {
        if self.points.len() == 1 || self.total_length <= 0.0 || !self.total_length.is_finite() {
            return self.points[0];
        }

        let mut target = t.clamp(0.0, 1.0) * self.total_length;

        let last_index = self.points.len() - 1;
        if target >= self.cumulative_lengths[last_index] {
            if !self.closed {
                return self.points[last_index];
            }

            let last = self.points[last_index];
            let first = self.points[0];
            let segment_length = first.sub_point(last).length();
            if segment_length == 0.0 {
                return last;
            }
            let ratio = ((target - self.cumulative_lengths[last_index]) / segment_length).clamp(0.0, 1.0);
            return last.lerp(first, ratio);
        }

        let idx = match self
            .cumulative_lengths
            .binary_search_by(|value| value.total_cmp(&target))
        {
            Ok(i) => i.min(last_index - 1),
            Err(i) => i.max(1) - 1,
        };

        let seg_start = self.points[idx];
        let seg_end = self.points[idx + 1];
        let seg_len = seg_end.sub_point(seg_start).length();
        if seg_len == 0.0 {
            return seg_start;
        }
        target -= self.cumulative_lengths[idx];
        seg_start.lerp(seg_end, (target / seg_len).clamp(0.0, 1.0))
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle3 {
    pub center: Point3,
    pub x_axis: Vec3,
    pub y_axis: Vec3,
    pub radius: f64,
}

impl Circle3 {
    #[must_use]
    pub fn new(center: Point3, normal: Vec3, radius: f64) -> Self {
        let (x_axis, y_axis) = frame_axes_from_normal(normal);
        Self {
            center,
            x_axis,
            y_axis,
            radius,
        }
    }

    #[must_use]
    pub fn normal(&self) -> Vec3 {
        self.x_axis.cross(self.y_axis)
    }

    /// Regular polygon inscribed in the circle, `segments` vertices without a
    /// repeated closing point.
    #[must_use]
    pub fn to_polygon(&self, segments: usize) -> Vec<Point3> {
        let segments = segments.max(3);
        (0..segments)
            .map(|i| self.point_at(i as f64 / segments as f64))
            .collect()
    }
}

impl Curve3 for Circle3 {
    fn point_at(&self, t: f64) -> Point3 {
        let (t0, t1) = self.domain();
        if t == t1 {
            return self.point_at(t0);
        }
        let u = ((t - t0) / (t1 - t0)).clamp(0.0, 1.0);
        let angle = std::f64::consts::TAU * u;
        self.center
            .add_vec(self.x_axis.mul_scalar(self.radius * angle.cos()))
            .add_vec(self.y_axis.mul_scalar(self.radius * angle.sin()))
    }

    fn is_closed(&self) -> bool {
        true
    }

    fn derivative_at(&self, t: f64) -> Vec3 {
        let u = t.clamp(0.0, 1.0);
        let angle = std::f64::consts::TAU * u;
        let dx = self.x_axis.mul_scalar(-self.radius * angle.sin());
        let dy = self.y_axis.mul_scalar(self.radius * angle.cos());
        dx.add(dy).mul_scalar(std::f64::consts::TAU)
    }
}

/// Circular arc; angles are in radians, measured from `x_axis` towards `y_axis`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arc3 {
    pub center: Point3,
    pub x_axis: Vec3,
    pub y_axis: Vec3,
    pub radius: f64,
    pub start_angle: f64,
    pub sweep_angle: f64,
}

impl Arc3 {
    #[must_use]
    pub fn new(center: Point3, normal: Vec3, radius: f64, start_angle: f64, sweep_angle: f64) -> Self {
        let (x_axis, y_axis) = frame_axes_from_normal(normal);
        Self {
            center,
            x_axis,
            y_axis,
            radius,
            start_angle,
            sweep_angle,
        }
    }

    #[must_use]
    pub fn start(&self) -> Point3 {
        self.point_at(0.0)
    }

    #[must_use]
    pub fn end(&self) -> Point3 {
        self.point_at(1.0)
    }
}

impl Curve3 for Arc3 {
    fn point_at(&self, t: f64) -> Point3 {
        let u = t.clamp(0.0, 1.0);
        let angle = self.start_angle + self.sweep_angle * u;
        self.center
            .add_vec(self.x_axis.mul_scalar(self.radius * angle.cos()))
            .add_vec(self.y_axis.mul_scalar(self.radius * angle.sin()))
    }

    fn derivative_at(&self, t: f64) -> Vec3 {
        let u = t.clamp(0.0, 1.0);
        let angle = self.start_angle + self.sweep_angle * u;
        let dx = self.x_axis.mul_scalar(-self.radius * angle.sin());
        let dy = self.y_axis.mul_scalar(self.radius * angle.cos());
        dx.add(dy).mul_scalar(self.sweep_angle)
    }

    fn is_closed(&self) -> bool {
        const FULL_CIRCLE_TOLERANCE: f64 = 1e-9;
        (self.sweep_angle.abs() - std::f64::consts::TAU).abs() < FULL_CIRCLE_TOLERANCE
    }
}

/// Bezier curve of arbitrary degree (`control_points.len() - 1`).
///
/// Deserialized values are not re-validated; consumers that need at least two
/// control points must check [`Bezier3::control_points`] themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bezier3 {
    control_points: Vec<Point3>,
}

impl Bezier3 {
    pub fn new(control_points: Vec<Point3>) -> Result<Self, String> {
        if control_points.len() < 2 {
            return Err("bezier requires at least 2 control points".to_string());
        }
        Ok(Self { control_points })
    }

    #[must_use]
    pub fn control_points(&self) -> &[Point3] {
        &self.control_points
    }
}

impl Curve3 for Bezier3 {
    /// De Casteljau evaluation; `t` is clamped to `[0, 1]`.
    fn point_at(&self, t: f64) -> Point3 {
        let t = t.clamp(0.0, 1.0);
        let mut scratch = self.control_points.clone();
        let Some(count) = scratch.len().checked_sub(1) else {
            return Point3::ORIGIN;
        };
        for level in 0..count {
            for i in 0..(count - level) {
                scratch[i] = scratch[i].lerp(scratch[i + 1], t);
            }
        }
        scratch[0]
    }
}

/// Samples `steps` uniform parameter intervals. Open curves include both
/// endpoints (`steps + 1` points); closed curves omit the repeated seam point.
#[must_use]
pub fn tessellate_curve_uniform(curve: &impl Curve3, steps: usize) -> Vec<Point3> {
    let steps = steps.max(1);
    let (t0, t1) = curve.domain();
    let count = if curve.is_closed() { steps } else { steps + 1 };
    (0..count)
        .map(|i| curve.point_at(t0 + (t1 - t0) * i as f64 / steps as f64))
        .collect()
}

/// Forward-difference direction `point_at(t + step) - point_at(t)`.
///
/// Curves clamp their parameter, so near the end of the domain the forward
/// sample collapses onto `t`; the backward difference is used instead.
#[must_use]
pub fn forward_direction(curve: &impl Curve3, t: f64, step: f64, tol: Tolerance) -> Option<Vec3> {
    let here = curve.point_at(t);
    let forward = curve.point_at(t + step).sub_point(here);
    if !tol.is_zero_vec3(forward) {
        return forward.normalized();
    }
    here.sub_point(curve.point_at(t - step)).normalized()
}

fn frame_axes_from_normal(normal: Vec3) -> (Vec3, Vec3) {
    let z = normal.normalized().unwrap_or(Vec3::Z);
    if (z.sub(Vec3::Z)).length_squared() < 1e-24 {
        return (Vec3::X, Vec3::Y);
    }
    let x = orthogonal_unit_vector(z);
    let y = z.cross(x).normalized().unwrap_or(Vec3::Y);
    (x, y)
}

fn orthogonal_unit_vector(reference: Vec3) -> Vec3 {
    let candidate = if reference.x.abs() < reference.y.abs() {
        Vec3::new(0.0, -reference.z, reference.y)
    } else {
        Vec3::new(-reference.z, 0.0, reference.x)
    };

    candidate.normalized().unwrap_or(Vec3::X)
}
