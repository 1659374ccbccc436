//! Demonstration run: one example curve of every kind, reconciled against the
//! persisted state, synthesized, and annotated with oriented cube masses.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::batch::{SynthesisReport, WorkState, reconcile_all, synthesize_all};
use crate::geom::{
    Curve3, ExtrusionCaps, ExtrusionError, FrenetFrame, GeomMesh, Point3, Tolerance, Vec3,
    extrude_polyline_with_tolerance, forward_direction,
};
use crate::overrides::{Addition, CurveOverrides};
use crate::reconcile::{ReconcileError, ReconcileOptions};
use crate::synth::SynthesisOptions;
use crate::work::{
    ArcSeed, BezierSeed, CircleSeed, Color, CurveValue, LineSeed, Material, PolylineSeed,
};

const MASS_SIZE: f64 = 1.0;
const SEGMENT_MASS_SIZE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleInputs {
    /// Normalized curve parameter where masses are placed.
    pub parameter: f64,
    pub overrides: CurveOverrides,
    pub reconcile: ReconcileOptions,
    pub synthesis: SynthesisOptions,
}

impl Default for SampleInputs {
    fn default() -> Self {
        Self {
            parameter: 0.5,
            overrides: CurveOverrides::default(),
            reconcile: ReconcileOptions::default(),
            synthesis: SynthesisOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MassRole {
    /// Main mass at the input parameter; uses the plain grey mass material.
    Parameter,
    Mid,
    Segment,
    SegmentMid,
}

impl MassRole {
    #[must_use]
    pub fn material(self) -> Material {
        match self {
            MassRole::Parameter => Material::new("mass", Color::new(0.5, 0.5, 0.5, 0.3)),
            MassRole::Mid => Material::new("Mid Material", Color::new(0.0, 0.5, 0.0, 0.5)),
            MassRole::Segment => Material::new("Segment Material", Color::new(0.5, 0.0, 0.0, 0.5)),
            MassRole::SegmentMid => {
                Material::new("Segment Mid Material", Color::new(0.0, 0.0, 0.5, 0.5))
            }
        }
    }
}

/// A cube centred on `center` whose local Z axis follows `direction`.
#[derive(Debug, Clone, PartialEq)]
pub struct Mass {
    pub center: Point3,
    pub direction: Vec3,
    pub size: f64,
    pub role: MassRole,
    pub material: Material,
    pub mesh: GeomMesh,
}

#[derive(Debug)]
pub struct SampleOutput {
    /// Reconciled entities, to be handed back on the next run.
    pub state: WorkState,
    pub synthesis: SynthesisReport,
    pub masses: Vec<Mass>,
}

#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    #[error("cannot build mass at ({}, {}, {}): {source}", .center.x, .center.y, .center.z)]
    Mass {
        center: Point3,
        #[source]
        source: ExtrusionError,
    },
}

/// Example additions injected on every run.
#[must_use]
pub fn example_overrides() -> CurveOverrides {
    let mut overrides = CurveOverrides::default();
    append_examples(&mut overrides);
    overrides
}

fn append_examples(overrides: &mut CurveOverrides) {
    overrides.circles.additions.push(Addition::named(
        "Circle Example",
        CircleSeed::new(Point3::new(5.0, 5.0, 0.0), 4.0),
    ));
    overrides.arcs.additions.push(Addition::named(
        "Arc Example",
        ArcSeed::new(Point3::new(15.0, 5.0, 0.0), 4.0, 0.0, 270.0),
    ));
    overrides.beziers.additions.push(Addition::named(
        "Bezier Example",
        BezierSeed::new(vec![
            Point3::new(31.0, 5.0, 0.0),
            Point3::new(35.0, 20.0, 0.0),
            Point3::new(35.0, -10.0, 0.0),
            Point3::new(39.0, 5.01, 0.0),
        ]),
    ));
    overrides.lines.additions.push(Addition::named(
        "Line Example",
        LineSeed::new(Point3::new(45.0, 1.0, 0.0), Point3::new(45.0, 9.0, 0.0)),
    ));
    overrides.polylines.additions.push(Addition::named(
        "Polyline Example",
        PolylineSeed::open(vec![
            Point3::new(56.5, 9.0, 0.0),
            Point3::new(54.0, 6.5, 0.0),
            Point3::new(55.0, 6.5, 0.0),
            Point3::new(52.0, 4.0, 0.0),
            Point3::new(53.0, 4.0, 0.0),
            Point3::new(51.0, 1.0, 0.0),
            Point3::new(55.5, 4.5, 0.0),
            Point3::new(54.5, 4.5, 0.0),
            Point3::new(57.5, 7.0, 0.0),
            Point3::new(56.5, 7.0, 0.0),
            Point3::new(59.0, 9.0, 0.0),
        ]),
    ));
}

/// Runs the sample against the previously persisted `state`.
///
/// Host additions come before the examples, so a host may claim an example
/// identity. With the default duplicate policy an example never replaces a
/// persisted entity.
pub fn execute(inputs: &SampleInputs, state: &WorkState) -> Result<SampleOutput, SampleError> {
    let mut overrides = inputs.overrides.clone();
    append_examples(&mut overrides);

    let mut state = reconcile_all(state, &overrides, inputs.reconcile)?;
    let synthesis = synthesize_all(&mut state, &inputs.synthesis);

    let tol = inputs.synthesis.tolerance;
    let step = inputs.synthesis.tangent_step;
    let mut masses = Vec::new();
    for entity in state.entities() {
        masses.extend(masses_for_curve(entity.curve(), inputs.parameter, step, tol)?);
    }

    info!(
        "sample run: {} entities, {} representations built, {} masses",
        state.len(),
        synthesis.built,
        masses.len()
    );
    Ok(SampleOutput {
        state,
        synthesis,
        masses,
    })
}

/// Masses annotating one curve at `parameter`.
pub fn masses_for_curve(
    curve: &CurveValue,
    parameter: f64,
    step: f64,
    tol: Tolerance,
) -> Result<Vec<Mass>, SampleError> {
    let mut masses = Vec::new();

    match curve {
        CurveValue::Line(line) => {
            masses.push(mass_at_point_and_orientation(
                MASS_SIZE,
                line.point_at(parameter),
                line.direction(),
                MassRole::Parameter,
            )?);
        }
        CurveValue::Polyline(polyline) => {
            masses.push(mass_at_point_and_orientation(
                MASS_SIZE,
                curve.point_at(parameter),
                backward_direction(curve, parameter, step, tol),
                MassRole::Parameter,
            )?);
            masses.push(mass_at_point_and_orientation(
                MASS_SIZE,
                curve.point_at(0.5),
                backward_direction(curve, 0.5, step, tol),
                MassRole::Mid,
            )?);

            let segments = polyline.segments();
            if segments.len() > 1 {
                for segment in segments {
                    let direction = segment.direction();
                    masses.push(mass_at_point_and_orientation(
                        SEGMENT_MASS_SIZE,
                        segment.point_at(parameter),
                        direction,
                        MassRole::Segment,
                    )?);
                    masses.push(mass_at_point_and_orientation(
                        SEGMENT_MASS_SIZE,
                        segment.point_at(0.5),
                        direction,
                        MassRole::SegmentMid,
                    )?);
                }
            }
        }
        CurveValue::Circle(_) | CurveValue::Arc(_) | CurveValue::Bezier(_) => {
            masses.push(mass_at_point_and_orientation(
                MASS_SIZE,
                curve.point_at(parameter),
                backward_direction(curve, parameter, step, tol),
                MassRole::Parameter,
            )?);
        }
    }

    Ok(masses)
}

/// `point_at(t) - point_at(t + step)`, normalized.
fn backward_direction(curve: &CurveValue, t: f64, step: f64, tol: Tolerance) -> Vec3 {
    forward_direction(curve, t, step, tol).map_or(Vec3::ZERO, |d| -d)
}

/// Cube of edge `size` centred on `point`, its local Z axis along `direction`.
///
/// A zero direction leaves the cube axis-aligned.
pub fn mass_at_point_and_orientation(
    size: f64,
    point: Point3,
    direction: Vec3,
    role: MassRole,
) -> Result<Mass, SampleError> {
    let half = size / 2.0;
    let base = [
        Point3::new(-half, -half, -half),
        Point3::new(half, -half, -half),
        Point3::new(half, half, -half),
        Point3::new(-half, half, -half),
    ];
    let (cube, _) = extrude_polyline_with_tolerance(
        &base,
        Vec3::new(0.0, 0.0, size),
        ExtrusionCaps::BOTH,
        Tolerance::default_geom(),
    )
    .map_err(|source| SampleError::Mass { center: point, source })?;

    let frame = FrenetFrame::from_tangent(direction).unwrap_or_else(|| {
        debug!("mass at {point:?} has no direction; keeping world axes");
        FrenetFrame {
            tangent: Vec3::Z,
            normal: Vec3::X,
            binormal: Vec3::Y,
        }
    });

    Ok(Mass {
        center: point,
        direction: frame.tangent,
        size,
        role,
        material: role.material(),
        mesh: cube.transformed(frame.to_transform(point)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Polyline3;

    #[test]
    fn mass_is_centred_on_point() {
        let center = Point3::new(3.0, 4.0, 5.0);
        let mass = mass_at_point_and_orientation(1.0, center, Vec3::Z, MassRole::Parameter).unwrap();
        let bounds = mass.mesh.bounds().unwrap();
        assert!(Tolerance::LOOSE.approx_eq_point3(bounds.center(), center));
        assert_eq!(mass.material.name, "mass");
        assert_eq!(mass.material.color, Color::new(0.5, 0.5, 0.5, 0.3));
    }

    #[test]
    fn mass_follows_direction() {
        let mass =
            mass_at_point_and_orientation(1.0, Point3::ORIGIN, Vec3::new(0.0, 3.0, 0.0), MassRole::Mid)
                .unwrap();
        assert!((mass.direction.dot(Vec3::Y) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn two_segment_polyline_gets_segment_masses() {
        let polyline = Polyline3::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
            ],
            false,
        )
        .unwrap();
        let masses = masses_for_curve(
            &CurveValue::Polyline(polyline),
            0.25,
            0.01,
            Tolerance::default_geom(),
        )
        .unwrap();

        // parameter + mid + 2 × (segment + segment mid)
        assert_eq!(masses.len(), 6);
        assert_eq!(masses[0].material.name, "mass");
        assert_eq!(masses[1].role, MassRole::Mid);
        assert_eq!(masses[1].material.name, "Mid Material");
        assert!(masses[2..].iter().all(|m| m.size == 0.5));
    }

    #[test]
    fn example_overrides_cover_every_kind() {
        let overrides = example_overrides();
        assert_eq!(overrides.circles.additions.len(), 1);
        assert_eq!(overrides.arcs.additions.len(), 1);
        assert_eq!(overrides.beziers.additions.len(), 1);
        assert_eq!(overrides.lines.additions.len(), 1);
        assert_eq!(overrides.polylines.additions[0].value.vertices.len(), 11);
    }
}
