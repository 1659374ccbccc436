//! Orthonormal frames along rails.
//!
//! Profiles are placed in the frame's (normal, binormal) plane; the tangent
//! points along the rail. Consecutive frames are propagated by parallel
//! transport so the profile does not twist between rings.

use super::{Point3, Tolerance, Transform, Vec3};

/// A dot product below this value (~75° turn) counts as a sharp tangent change.
const CUSP_DOT_THRESHOLD: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrenetFrame {
    /// Unit vector pointing along the rail.
    pub tangent: Vec3,
    /// Unit vector perpendicular to the tangent; maps the profile's local X.
    pub normal: Vec3,
    /// `tangent × normal`; maps the profile's local Y.
    pub binormal: Vec3,
}

impl FrenetFrame {
    /// Frame from a tangent alone, with an arbitrary but deterministic normal.
    ///
    /// Returns `None` if the tangent cannot be normalized.
    pub fn from_tangent(tangent: Vec3) -> Option<Self> {
        let tangent = tangent.normalized()?;

        let reference = if tangent.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };

        let normal = tangent.cross(reference).normalized()?;
        let binormal = tangent.cross(normal);

        Some(Self {
            tangent,
            normal,
            binormal,
        })
    }

    /// Transform mapping local (x, y, z) to `origin + x·normal + y·binormal + z·tangent`.
    #[must_use]
    pub fn to_transform(&self, origin: Point3) -> Transform {
        Transform::from_axes(origin, self.normal, self.binormal, self.tangent)
    }
}

/// Frames for every rail point plus human-readable warnings.
///
/// Interior tangents average the incoming and outgoing segment; on a closed
/// rail the first and last points wrap around to each other.
pub(crate) fn compute_rail_frames(
    rail: &[Point3],
    closed: bool,
    initial_tangent: Option<Vec3>,
    tol: Tolerance,
) -> (Vec<FrenetFrame>, Vec<String>) {
    let mut warnings = Vec::new();
    let n = rail.len();
    let fallback = FrenetFrame {
        tangent: Vec3::Z,
        normal: Vec3::X,
        binormal: Vec3::Y,
    };

    if n < 2 {
        warnings.push("rail too short; using default frame".to_string());
        return (vec![fallback; n.max(1)], warnings);
    }

    let tangent_at = |i: usize| -> Vec3 {
        let incoming = if i > 0 {
            Some(rail[i].sub_point(rail[i - 1]))
        } else if closed {
            Some(rail[0].sub_point(rail[n - 1]))
        } else {
            None
        };
        let outgoing = if i + 1 < n {
            Some(rail[i + 1].sub_point(rail[i]))
        } else if closed {
            Some(rail[0].sub_point(rail[n - 1]))
        } else {
            None
        };
        let incoming = incoming.and_then(Vec3::normalized);
        let outgoing = outgoing.and_then(Vec3::normalized);
        match (incoming, outgoing) {
            (Some(a), Some(b)) => a.add(b),
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (None, None) => Vec3::ZERO,
        }
    };

    let start_tangent = initial_tangent
        .filter(|t| !tol.is_zero_vec3(*t))
        .unwrap_or_else(|| tangent_at(0));
    let first = match FrenetFrame::from_tangent(start_tangent) {
        Some(frame) => frame,
        None => {
            warnings.push("rail has degenerate initial tangent; using default frame".to_string());
            fallback
        }
    };

    let mut frames = Vec::with_capacity(n);
    frames.push(first);
    let mut cusp_like = 0usize;

    for i in 1..n {
        let prev = frames[i - 1];
        let tangent = match tangent_at(i).normalized() {
            Some(t) => t,
            None => {
                warnings.push("rail has degenerate segment; reusing previous tangent".to_string());
                prev.tangent
            }
        };

        if prev.tangent.dot(tangent) < CUSP_DOT_THRESHOLD {
            cusp_like += 1;
        }

        frames.push(parallel_transport_frame(&prev, tangent, tol));
    }

    if cusp_like > 0 {
        warnings.push(format!(
            "rail continuity warning: {cusp_like} sharp tangent changes"
        ));
    }

    (frames, warnings)
}

pub(crate) fn parallel_transport_frame(
    prev_frame: &FrenetFrame,
    new_tangent: Vec3,
    tol: Tolerance,
) -> FrenetFrame {
    let old_tangent = prev_frame.tangent;
    let cross = old_tangent.cross(new_tangent);

    if cross.length_squared() < tol.eps_squared() {
        let sign = if old_tangent.dot(new_tangent) < 0.0 { -1.0 } else { 1.0 };
        return FrenetFrame {
            tangent: new_tangent,
            normal: prev_frame.normal.mul_scalar(sign),
            binormal: prev_frame.binormal.mul_scalar(sign),
        };
    }

    let rotation_axis = cross.normalized().unwrap_or(Vec3::Z);
    let angle = old_tangent.dot(new_tangent).clamp(-1.0, 1.0).acos();

    let normal = rotate_vector(prev_frame.normal, rotation_axis, angle)
        .normalized()
        .unwrap_or(prev_frame.normal);
    let binormal = new_tangent
        .cross(normal)
        .normalized()
        .unwrap_or(prev_frame.binormal);

    FrenetFrame {
        tangent: new_tangent,
        normal,
        binormal,
    }
}

/// Rodrigues rotation of `v` around the unit `axis`.
fn rotate_vector(v: Vec3, axis: Vec3, angle: f64) -> Vec3 {
    let (sin_angle, cos_angle) = angle.sin_cos();
    v.mul_scalar(cos_angle)
        .add(axis.cross(v).mul_scalar(sin_angle))
        .add(axis.mul_scalar(axis.dot(v) * (1.0 - cos_angle)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_from_tangent_is_orthonormal() {
        let frame = FrenetFrame::from_tangent(Vec3::new(0.0, 0.0, 3.0)).unwrap();
        assert!((frame.tangent.length() - 1.0).abs() < 1e-12);
        assert!(frame.tangent.dot(frame.normal).abs() < 1e-12);
        assert!(frame.tangent.dot(frame.binormal).abs() < 1e-12);
        assert!(frame.normal.dot(frame.binormal).abs() < 1e-12);
    }

    #[test]
    fn straight_rail_keeps_the_first_normal() {
        let rail = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let (frames, warnings) = compute_rail_frames(&rail, false, None, Tolerance::default());
        assert!(warnings.is_empty());
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].normal, frames[2].normal);
    }

    #[test]
    fn right_angle_rail_reports_sharp_turn() {
        let rail = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let (frames, warnings) = compute_rail_frames(&rail, false, None, Tolerance::default());
        assert_eq!(frames.len(), 4);
        for frame in &frames {
            assert!(frame.tangent.dot(frame.normal).abs() < 1e-9);
        }
        assert!(warnings.iter().any(|w| w.contains("sharp tangent changes")));
    }
}
