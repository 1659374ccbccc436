//! Tube and marker meshes for curve entities.
//!
//! Every representation is a circular tube following the curve plus one UV
//! sphere per notable point. Circles, arcs, beziers and polylines are swept;
//! lines are extruded. All spheres of one representation share the same
//! resolution.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::geom::{
    Circle3, Curve3, ExtrusionCaps, ExtrusionError, FrenetFrame, GeomMesh, GeomMeshDiagnostics,
    Line3, Point3, SphereError, SweepCaps, SweepError, SweepOptions, Tolerance, Vec3,
    extrude_polyline_with_tolerance, forward_direction, merge_meshes, sphere_mesh_with_tolerance,
    sweep_profile_with_tolerance, tessellate_curve_uniform,
};
use crate::work::{CurveKind, CurveValue};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisOptions {
    /// Radius of the tube cross-section.
    pub profile_radius: f64,
    /// Marker radius for the first and last notable point.
    pub endpoint_marker_radius: f64,
    /// Marker radius for every other notable point.
    pub interior_marker_radius: f64,
    /// Sides of the tube's profile polygon.
    pub profile_segments: usize,
    /// Divisions of every marker sphere.
    pub marker_segments: usize,
    /// Rail samples for curved paths. Polylines use their own vertices.
    pub rail_segments: usize,
    /// Parameter step for forward-difference directions.
    pub tangent_step: f64,
    pub tolerance: Tolerance,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            profile_radius: 0.1,
            endpoint_marker_radius: 0.2,
            interior_marker_radius: 0.05,
            profile_segments: 10,
            marker_segments: 10,
            rail_segments: 64,
            tangent_step: 0.01,
            tolerance: Tolerance::default_geom(),
        }
    }
}

impl SynthesisOptions {
    #[must_use]
    pub fn marker_radii(&self) -> MarkerRadii {
        MarkerRadii {
            endpoint: self.endpoint_marker_radius,
            interior: self.interior_marker_radius,
        }
    }
}

/// Chooses a marker radius from a notable point's position in the sequence.
pub trait MarkerRadiusPolicy {
    fn radius(&self, index: usize, count: usize) -> f64;
}

impl<F> MarkerRadiusPolicy for F
where
    F: Fn(usize, usize) -> f64,
{
    fn radius(&self, index: usize, count: usize) -> f64 {
        self(index, count)
    }
}

/// Larger markers at both ends, smaller ones in between.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerRadii {
    pub endpoint: f64,
    pub interior: f64,
}

impl MarkerRadiusPolicy for MarkerRadii {
    fn radius(&self, index: usize, count: usize) -> f64 {
        match MarkerRole::of(index, count) {
            MarkerRole::Endpoint => self.endpoint,
            MarkerRole::Interior => self.interior,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerRole {
    Endpoint,
    Interior,
}

impl MarkerRole {
    #[must_use]
    pub fn of(index: usize, count: usize) -> Self {
        if index == 0 || index + 1 == count {
            MarkerRole::Endpoint
        } else {
            MarkerRole::Interior
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub center: Point3,
    pub radius: f64,
    pub role: MarkerRole,
}

/// Synthesized solid for one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Representation {
    /// Tube followed by every marker sphere, in notable-point order.
    pub mesh: GeomMesh,
    /// Number of leading triangles in `mesh` that belong to the tube.
    pub tube_triangle_count: usize,
    pub markers: Vec<Marker>,
    pub diagnostics: GeomMeshDiagnostics,
    /// Options the representation was built with.
    pub options: SynthesisOptions,
}

impl Representation {
    #[must_use]
    pub fn marker_triangle_count(&self) -> usize {
        self.mesh.triangle_count() - self.tube_triangle_count
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("{kind} has {found} notable points; at least 2 are required")]
    InsufficientGeometry { kind: CurveKind, found: usize },
    #[error("radius must be finite and > 0 (got {radius})")]
    InvalidRadius { radius: f64 },
    #[error(transparent)]
    Sweep(#[from] SweepError),
    #[error(transparent)]
    Extrusion(#[from] ExtrusionError),
    #[error(transparent)]
    Sphere(#[from] SphereError),
}

/// Tube of `profile_radius` with markers sized by `policy`; everything else
/// uses [`SynthesisOptions::default`].
pub fn synthesize(
    curve: &CurveValue,
    profile_radius: f64,
    policy: &impl MarkerRadiusPolicy,
) -> Result<Representation, SynthesisError> {
    let options = SynthesisOptions {
        profile_radius,
        ..SynthesisOptions::default()
    };
    synthesize_with_policy(curve, &options, policy)
}

/// Tube and markers sized entirely from `options`.
pub fn synthesize_with_options(
    curve: &CurveValue,
    options: &SynthesisOptions,
) -> Result<Representation, SynthesisError> {
    synthesize_with_policy(curve, options, &options.marker_radii())
}

pub fn synthesize_with_policy(
    curve: &CurveValue,
    options: &SynthesisOptions,
    policy: &impl MarkerRadiusPolicy,
) -> Result<Representation, SynthesisError> {
    let notable = curve.notable_points();
    if notable.len() < 2 {
        return Err(SynthesisError::InsufficientGeometry {
            kind: curve.kind(),
            found: notable.len(),
        });
    }
    ensure_radius(options.profile_radius)?;

    let profile = Circle3::new(Point3::ORIGIN, Vec3::Z, options.profile_radius)
        .to_polygon(options.profile_segments);

    let (tube, mut diagnostics) = match curve {
        CurveValue::Line(line) => extrude_line(*line, &profile, options)?,
        CurveValue::Polyline(polyline) => {
            sweep_rail(curve, polyline.points(), &profile, options)?
        }
        CurveValue::Circle(_) | CurveValue::Arc(_) | CurveValue::Bezier(_) => {
            let rail = tessellate_curve_uniform(curve, options.rail_segments);
            sweep_rail(curve, &rail, &profile, options)?
        }
    };

    if !diagnostics.is_valid_solid() {
        warn!("{} tube is not a closed solid: {diagnostics}", curve.kind());
    } else if !diagnostics.warnings.is_empty() {
        debug!("{} tube: {diagnostics}", curve.kind());
    }

    let tube_triangle_count = tube.triangle_count();
    let mut spheres = Vec::with_capacity(notable.len());
    let mut markers = Vec::with_capacity(notable.len());

    for (index, &center) in notable.iter().enumerate() {
        let radius = policy.radius(index, notable.len());
        ensure_radius(radius)?;

        let (sphere, sphere_diagnostics) = sphere_mesh_with_tolerance(
            Point3::ORIGIN,
            radius,
            options.marker_segments,
            options.tolerance,
        )?;
        spheres.push(sphere.translated(center.to_vec3()));
        diagnostics.merge(&sphere_diagnostics);

        markers.push(Marker {
            center,
            radius,
            role: MarkerRole::of(index, notable.len()),
        });
    }

    let mesh = merge_meshes(std::iter::once(&tube).chain(&spheres));

    Ok(Representation {
        mesh,
        tube_triangle_count,
        markers,
        diagnostics,
        options: *options,
    })
}

fn ensure_radius(radius: f64) -> Result<(), SynthesisError> {
    if radius.is_finite() && radius > 0.0 {
        Ok(())
    } else {
        Err(SynthesisError::InvalidRadius { radius })
    }
}

/// Places the profile perpendicular to the line at its start and extrudes it
/// by the line's direction vector.
fn extrude_line(
    line: Line3,
    profile: &[Point3],
    options: &SynthesisOptions,
) -> Result<(GeomMesh, GeomMeshDiagnostics), SynthesisError> {
    let direction = line.direction();
    let frame = FrenetFrame::from_tangent(direction).ok_or(ExtrusionError::InvalidDirection)?;
    let plane = frame.to_transform(line.start);
    let oriented: Vec<Point3> = profile.iter().map(|&p| plane.apply_point(p)).collect();

    Ok(extrude_polyline_with_tolerance(
        &oriented,
        direction,
        ExtrusionCaps::BOTH,
        options.tolerance,
    )?)
}

fn sweep_rail(
    curve: &CurveValue,
    rail: &[Point3],
    profile: &[Point3],
    options: &SynthesisOptions,
) -> Result<(GeomMesh, GeomMeshDiagnostics), SynthesisError> {
    let closed = curve.is_closed();
    let sweep_options = SweepOptions {
        closed_rail: closed,
        initial_tangent: forward_direction(curve, 0.0, options.tangent_step, options.tolerance),
    };
    let caps = if closed { SweepCaps::NONE } else { SweepCaps::BOTH };

    Ok(sweep_profile_with_tolerance(
        profile,
        rail,
        caps,
        sweep_options,
        options.tolerance,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Bezier3, Polyline3};
    use crate::work::{
        ArcSeed, ArcWork, BezierSeed, BezierWork, PolylineSeed, PolylineWork, WorkKind,
    };

    #[test]
    fn endpoint_policy_distinguishes_first_and_last() {
        let radii = MarkerRadii {
            endpoint: 0.2,
            interior: 0.05,
        };
        let picked: Vec<f64> = (0..4).map(|i| radii.radius(i, 4)).collect();
        assert_eq!(picked, vec![0.2, 0.05, 0.05, 0.2]);
    }

    #[test]
    fn closure_policy_is_accepted() {
        let line = CurveValue::Line(Line3::new(Point3::ORIGIN, Point3::new(1.0, 0.0, 0.0)));
        let rep = synthesize(&line, 0.1, &|_index: usize, _count: usize| 0.3).unwrap();
        assert!(rep.markers.iter().all(|m| m.radius == 0.3));
    }

    #[test]
    fn single_point_bezier_is_insufficient() {
        let bezier: Bezier3 =
            serde_json::from_str(r#"{"control_points":[{"x":0.0,"y":0.0,"z":0.0}]}"#).unwrap();
        let err = synthesize_with_options(&CurveValue::Bezier(bezier), &SynthesisOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            SynthesisError::InsufficientGeometry {
                kind: CurveKind::Bezier,
                found: 1
            }
        ));
    }

    #[test]
    fn markers_are_merged_after_the_tube() {
        let line = CurveValue::Line(Line3::new(Point3::ORIGIN, Point3::new(1.0, 0.0, 0.0)));
        let options = SynthesisOptions::default();
        let rep = synthesize_with_options(&line, &options).unwrap();

        let (sphere, _) = crate::geom::sphere_mesh(Point3::ORIGIN, 0.2, options.marker_segments).unwrap();
        assert_eq!(rep.marker_triangle_count(), 2 * sphere.triangle_count());
        assert_eq!(rep.mesh.vertex_count(), rep.diagnostics.vertex_count);
    }

    #[test]
    fn non_positive_profile_radius_is_rejected() {
        let line = CurveValue::Line(Line3::new(Point3::ORIGIN, Point3::new(1.0, 0.0, 0.0)));
        let err = synthesize(&line, 0.0, &SynthesisOptions::default().marker_radii()).unwrap_err();
        assert!(matches!(err, SynthesisError::InvalidRadius { .. }));
    }

    #[test]
    fn polyline_tube_follows_vertices() {
        let polyline = Polyline3::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(2.0, 2.0, 0.0),
            ],
            false,
        )
        .unwrap();
        let rep = synthesize_with_options(&CurveValue::Polyline(polyline), &SynthesisOptions::default())
            .unwrap();

        // 3 rings of 10 sides, 2 spans, 2 capped ends.
        assert_eq!(rep.tube_triangle_count, 2 * 10 * 2 + 2 * 10);
        assert_eq!(rep.markers.len(), 3);
        assert_eq!(rep.markers[1].role, MarkerRole::Interior);
    }

    #[test]
    fn open_polyline_back_at_its_start_is_swept_as_loop() {
        let curve = PolylineWork::build_curve(&PolylineSeed::open(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
        ]))
        .unwrap();
        let rep = synthesize_with_options(&curve, &SynthesisOptions::default()).unwrap();

        // 4 rings of 10 sides joined in a loop, no caps.
        assert_eq!(rep.tube_triangle_count, 4 * 10 * 2);
        assert_eq!(rep.markers.len(), 5);
    }

    #[test]
    fn bezier_with_matching_end_points_is_synthesized() {
        let curve = BezierWork::build_curve(&BezierSeed::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 2.0, 0.0),
            Point3::new(-2.0, 2.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
        ]))
        .unwrap();
        let rep = synthesize_with_options(&curve, &SynthesisOptions::default()).unwrap();
        assert!(rep.tube_triangle_count > 0);
        assert_eq!(rep.markers.len(), 4);
    }

    #[test]
    fn double_turn_arc_is_synthesized() {
        let curve = ArcWork::build_curve(&ArcSeed::new(Point3::ORIGIN, 2.0, 0.0, 720.0)).unwrap();
        let rep = synthesize_with_options(&curve, &SynthesisOptions::default()).unwrap();
        assert!(rep.tube_triangle_count > 0);
        assert_eq!(rep.markers.len(), 2);
    }
}
