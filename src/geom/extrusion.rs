use super::diagnostics::GeomMeshDiagnostics;
use super::mesh::{GeomMesh, finalize_mesh};
use super::{Point3, Tolerance, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtrusionCaps {
    pub start: bool,
    pub end: bool,
}

impl ExtrusionCaps {
    pub const NONE: Self = Self { start: false, end: false };
    pub const BOTH: Self = Self { start: true, end: true };
}

#[derive(Debug, thiserror::Error)]
pub enum ExtrusionError {
    #[error("extrusion direction must be finite and non-zero")]
    InvalidDirection,
    #[error("profile points must be finite")]
    NonFinitePoint,
    #[error("profile requires at least {min} unique points")]
    NotEnoughPoints { min: usize },
    #[error("caps require a closed profile")]
    CapsRequireClosedProfile,
}

#[must_use = "the extruded mesh is the only output"]
pub fn extrude_polyline(
    profile: &[Point3],
    direction: Vec3,
    caps: ExtrusionCaps,
) -> Result<(GeomMesh, GeomMeshDiagnostics), ExtrusionError> {
    extrude_polyline_with_tolerance(profile, direction, caps, Tolerance::default_geom())
}

/// Translates `profile` by `direction` and stitches the two copies together.
///
/// The profile counts as closed when its first and last points coincide, or
/// when it has three or more points and caps are requested. Caps are fans
/// around the profile centroid, so convex profiles are assumed.
pub fn extrude_polyline_with_tolerance(
    profile: &[Point3],
    direction: Vec3,
    caps: ExtrusionCaps,
    tol: Tolerance,
) -> Result<(GeomMesh, GeomMeshDiagnostics), ExtrusionError> {
    let direction = validate_direction(direction, tol)?;
    let cleaned = clean_polyline(profile, caps.start || caps.end, tol)?;

    let profile_points = cleaned.points;
    let n = profile_points.len();
    let mut vertices: Vec<Point3> = Vec::with_capacity(n.saturating_mul(2) + 2);
    vertices.extend_from_slice(&profile_points);
    vertices.extend(profile_points.iter().map(|p| p.add_vec(direction)));

    let edge_count = if cleaned.closed { n } else { n.saturating_sub(1) };
    let mut indices: Vec<u32> = Vec::with_capacity(edge_count.saturating_mul(6) + n * 6);

    for i in 0..edge_count {
        let i0 = i as u32;
        let i1 = ((i + 1) % n) as u32;
        let j0 = (n + i) as u32;
        let j1 = (n + ((i + 1) % n)) as u32;

        indices.extend_from_slice(&[i0, i1, j1]);
        indices.extend_from_slice(&[i0, j1, j0]);
    }

    let centroid = centroid(&profile_points);
    if caps.start {
        let center = vertices.len() as u32;
        vertices.push(centroid);
        for i in 0..n {
            indices.extend_from_slice(&[center, ((i + 1) % n) as u32, i as u32]);
        }
    }
    if caps.end {
        let center = vertices.len() as u32;
        vertices.push(centroid.add_vec(direction));
        for i in 0..n {
            indices.extend_from_slice(&[center, (n + i) as u32, (n + (i + 1) % n) as u32]);
        }
    }

    Ok(finalize_mesh(vertices, indices, tol))
}

struct CleanPolyline {
    points: Vec<Point3>,
    closed: bool,
}

fn validate_direction(direction: Vec3, tol: Tolerance) -> Result<Vec3, ExtrusionError> {
    if !direction.is_finite() || tol.is_zero_vec3(direction) {
        return Err(ExtrusionError::InvalidDirection);
    }
    Ok(direction)
}

fn clean_polyline(points: &[Point3], want_closed: bool, tol: Tolerance) -> Result<CleanPolyline, ExtrusionError> {
    if points.iter().any(|p| !p.is_finite()) {
        return Err(ExtrusionError::NonFinitePoint);
    }

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

    let mut closed = cleaned.len() > 2
        && cleaned
            .first()
            .copied()
            .zip(cleaned.last().copied())
            .is_some_and(|(a, b)| tol.approx_eq_point3(a, b));
    if closed {
        cleaned.pop();
    }

    if cleaned.len() < 2 {
        return Err(ExtrusionError::NotEnoughPoints { min: 2 });
    }

    if want_closed {
        if cleaned.len() < 3 {
            return Err(ExtrusionError::CapsRequireClosedProfile);
        }
        closed = true;
    }

    Ok(CleanPolyline { points: cleaned, closed })
}

fn centroid(points: &[Point3]) -> Point3 {
    let sum = points.iter().fold(Vec3::ZERO, |acc, p| acc.add(p.to_vec3()));
    let c = sum.mul_scalar(1.0 / points.len().max(1) as f64);
    Point3::new(c.x, c.y, c.z)
}
