//! Sweeping a planar profile along a rail polyline.
//!
//! The profile is given in local frame coordinates: `x` maps to the frame
//! normal, `y` to the binormal and `z` to the tangent. Tube representations
//! pass a regular polygon centered at the origin.

use super::diagnostics::GeomMeshDiagnostics;
use super::frame::{FrenetFrame, compute_rail_frames};
use super::mesh::{GeomMesh, finalize_mesh};
use super::{Point3, Tolerance, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepCaps {
    pub start: bool,
    pub end: bool,
}

impl SweepCaps {
    pub const NONE: Self = Self { start: false, end: false };
    pub const BOTH: Self = Self { start: true, end: true };
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SweepOptions {
    /// Treat the rail as a loop; the last ring connects back to the first.
    pub closed_rail: bool,
    /// Direction used to orient the first ring instead of the first rail segment.
    pub initial_tangent: Option<Vec3>,
}

#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    #[error("rail curve requires at least 2 points")]
    RailTooShort,
    #[error("rail curve must have finite points")]
    NonFiniteRail,
    #[error("profile points must be finite")]
    NonFiniteProfile,
    #[error("profile requires at least {min} unique points")]
    NotEnoughProfilePoints { min: usize },
    #[error("cannot cap a closed rail sweep")]
    CapsNotAllowedForClosedRail,
    #[error("rail curve is degenerate")]
    InvalidRail,
}

#[must_use = "the swept mesh is the only output"]
pub fn sweep_profile(
    profile: &[Point3],
    rail: &[Point3],
    caps: SweepCaps,
    options: SweepOptions,
) -> Result<(GeomMesh, GeomMeshDiagnostics), SweepError> {
    sweep_profile_with_tolerance(profile, rail, caps, options, Tolerance::default_geom())
}

/// Sweeps a closed local profile along `rail`.
///
/// One ring of profile vertices is emitted per cleaned rail point. Caps are
/// triangle fans around the profile centroid.
///
/// Caps on a rail marked `closed_rail` are an error. A rail that was not
/// marked closed but whose ends coincide is swept as a loop and its caps are
/// dropped with a warning.
pub fn sweep_profile_with_tolerance(
    profile: &[Point3],
    rail: &[Point3],
    caps: SweepCaps,
    options: SweepOptions,
    tol: Tolerance,
) -> Result<(GeomMesh, GeomMeshDiagnostics), SweepError> {
    let local_profile = clean_profile(profile, tol)?;
    let cleaned_rail = clean_rail(rail, options.closed_rail, tol)?;

    let mut caps = caps;
    let mut cap_warning = None;
    if (caps.start || caps.end) && cleaned_rail.closed {
        if options.closed_rail {
            return Err(SweepError::CapsNotAllowedForClosedRail);
        }
        // Open rail whose ends meet: sweep it as a loop.
        caps = SweepCaps::NONE;
        cap_warning = Some("rail ends meet; swept as a closed loop without caps".to_string());
    }

    let (frames, rail_warnings) = compute_rail_frames(
        &cleaned_rail.points,
        cleaned_rail.closed,
        options.initial_tangent,
        tol,
    );

    let profile_len = local_profile.len();
    let ring_count = cleaned_rail.points.len();

    let mut vertices: Vec<Point3> = Vec::with_capacity(ring_count * profile_len + 2);
    for (rail_point, frame) in cleaned_rail.points.iter().zip(frames.iter()) {
        vertices.extend(local_profile.iter().map(|&p| place_in_frame(*rail_point, frame, p)));
    }

    let rail_edge_count = if cleaned_rail.closed { ring_count } else { ring_count - 1 };
    let mut indices: Vec<u32> = Vec::with_capacity(rail_edge_count * profile_len * 6);

    for r in 0..rail_edge_count {
        let r_next = (r + 1) % ring_count;

        for i in 0..profile_len {
            let i_next = (i + 1) % profile_len;

            let i0 = (r * profile_len + i) as u32;
            let i1 = (r * profile_len + i_next) as u32;
            let i2 = (r_next * profile_len + i_next) as u32;
            let i3 = (r_next * profile_len + i) as u32;

            indices.extend_from_slice(&[i0, i1, i2]);
            indices.extend_from_slice(&[i0, i2, i3]);
        }
    }

    let centroid = profile_centroid(&local_profile);
    if caps.start {
        let center = place_in_frame(cleaned_rail.points[0], &frames[0], centroid);
        add_cap_fan(&mut vertices, &mut indices, center, 0, profile_len, true);
    }
    if caps.end {
        let last = ring_count - 1;
        let center = place_in_frame(cleaned_rail.points[last], &frames[last], centroid);
        add_cap_fan(&mut vertices, &mut indices, center, last * profile_len, profile_len, false);
    }

    let (mesh, mut diagnostics) = finalize_mesh(vertices, indices, tol);
    diagnostics.warnings.extend(rail_warnings);
    diagnostics.warnings.extend(cap_warning);
    Ok((mesh, diagnostics))
}

fn place_in_frame(origin: Point3, frame: &FrenetFrame, local: Point3) -> Point3 {
    origin
        .add_vec(frame.normal.mul_scalar(local.x))
        .add_vec(frame.binormal.mul_scalar(local.y))
        .add_vec(frame.tangent.mul_scalar(local.z))
}

fn profile_centroid(points: &[Point3]) -> Point3 {
    let sum = points.iter().fold(Vec3::ZERO, |acc, p| acc.add(p.to_vec3()));
    let c = sum.mul_scalar(1.0 / points.len().max(1) as f64);
    Point3::new(c.x, c.y, c.z)
}

/// Fan over an existing ring; the center vertex is appended.
fn add_cap_fan(
    vertices: &mut Vec<Point3>,
    indices: &mut Vec<u32>,
    center: Point3,
    ring_start: usize,
    ring_len: usize,
    is_start: bool,
) {
    let center_index = vertices.len() as u32;
    vertices.push(center);

    for seg in 0..ring_len {
        let a = (ring_start + seg) as u32;
        let b = (ring_start + (seg + 1) % ring_len) as u32;
        if is_start {
            indices.extend_from_slice(&[center_index, b, a]);
        } else {
            indices.extend_from_slice(&[center_index, a, b]);
        }
    }
}

struct CleanRail {
    points: Vec<Point3>,
    closed: bool,
}

fn clean_profile(points: &[Point3], tol: Tolerance) -> Result<Vec<Point3>, SweepError> {
    if points.iter().any(|p| !p.is_finite()) {
        return Err(SweepError::NonFiniteProfile);
    }

    let mut cleaned = dedup_consecutive(points, tol);
    if cleaned.len() > 2
        && cleaned
            .first()
            .copied()
            .zip(cleaned.last().copied())
            .is_some_and(|(a, b)| tol.approx_eq_point3(a, b))
    {
        cleaned.pop();
    }

    if cleaned.len() < 3 {
        return Err(SweepError::NotEnoughProfilePoints { min: 3 });
    }
    Ok(cleaned)
}

fn clean_rail(points: &[Point3], closed_hint: bool, tol: Tolerance) -> Result<CleanRail, SweepError> {
    if points.len() < 2 {
        return Err(SweepError::RailTooShort);
    }
    if points.iter().any(|p| !p.is_finite()) {
        return Err(SweepError::NonFiniteRail);
    }

    let mut cleaned = dedup_consecutive(points, tol);
    let ends_meet = cleaned
        .first()
        .copied()
        .zip(cleaned.last().copied())
        .is_some_and(|(a, b)| tol.approx_eq_point3(a, b));

    if ends_meet && cleaned.len() > 2 {
        cleaned.pop();
    }

    let closed = (closed_hint || ends_meet) && cleaned.len() > 2;
    if cleaned.len() < 2 {
        return Err(SweepError::InvalidRail);
    }

    Ok(CleanRail { points: cleaned, closed })
}

fn dedup_consecutive(points: &[Point3], tol: Tolerance) -> Vec<Point3> {
    let mut cleaned: Vec<Point3> = Vec::with_capacity(points.len());
    for p in points.iter().copied() {
        if cleaned
            .last()
            .copied()
            .is_some_and(|prev| tol.approx_eq_point3(prev, p))
        {
            continue;
        }
        cleaned.push(p);
    }
    cleaned
}
