//! Curve-backed entities that survive across executions.
//!
//! A [`CurveWork`] pairs an externally assigned [`Identity`] with a curve value
//! and a display material. Each curve kind has a zero-sized capability type
//! ([`CircleWork`], [`ArcWork`], ...) implementing [`WorkKind`], which tells the
//! reconciler how to build, identify and edit entities of that kind.

mod arc;
mod bezier;
mod circle;
mod collection;
mod line;
mod polyline;

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::geom::{Arc3, Bezier3, Circle3, Curve3, Line3, Point3, Polyline3, Tolerance, Vec3};
use crate::overrides::{Addition, Edit};
use crate::synth::{Representation, SynthesisError, SynthesisOptions, synthesize_with_options};

pub use arc::{ArcSeed, ArcWork};
pub use bezier::{BezierSeed, BezierWork};
pub use circle::{CircleSeed, CircleWork};
pub use collection::{CollectionError, WorkCollection};
pub use line::{LineSeed, LineWork};
pub use polyline::{PolylineSeed, PolylineWork};

/// Stable, externally assigned token naming one logical curve.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Identity {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// RGBA color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    #[must_use]
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// `#F15C6B`, fully opaque.
    pub const CURVE: Self = Self::new(0.952941176, 0.360784314, 0.419607843, 1.0);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub color: Color,
    #[serde(default)]
    pub unlit: bool,
}

impl Material {
    pub fn new(name: impl Into<String>, color: Color) -> Self {
        Self {
            name: name.into(),
            color,
            unlit: false,
        }
    }

    /// Unlit `#F15C6B` material named `<identity>_MAT`.
    #[must_use]
    pub fn for_curve(identity: &Identity) -> Self {
        Self {
            name: format!("{identity}_MAT"),
            color: Color::CURVE,
            unlit: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveKind {
    Circle,
    Arc,
    Bezier,
    Line,
    Polyline,
}

impl CurveKind {
    pub const ALL: [CurveKind; 5] = [
        CurveKind::Circle,
        CurveKind::Arc,
        CurveKind::Bezier,
        CurveKind::Line,
        CurveKind::Polyline,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            CurveKind::Circle => "circle",
            CurveKind::Arc => "arc",
            CurveKind::Bezier => "bezier",
            CurveKind::Line => "line",
            CurveKind::Polyline => "polyline",
        }
    }
}

impl fmt::Display for CurveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Curve geometry owned by a [`CurveWork`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CurveValue {
    Circle(Circle3),
    Arc(Arc3),
    Bezier(Bezier3),
    Line(Line3),
    Polyline(Polyline3),
}

impl CurveValue {
    #[must_use]
    pub fn kind(&self) -> CurveKind {
        match self {
            CurveValue::Circle(_) => CurveKind::Circle,
            CurveValue::Arc(_) => CurveKind::Arc,
            CurveValue::Bezier(_) => CurveKind::Bezier,
            CurveValue::Line(_) => CurveKind::Line,
            CurveValue::Polyline(_) => CurveKind::Polyline,
        }
    }

    /// Marker locations: endpoints for circles, arcs and lines, control points
    /// for beziers, vertices for polylines.
    #[must_use]
    pub fn notable_points(&self) -> Vec<Point3> {
        match self {
            CurveValue::Circle(circle) => vec![circle.point_at(0.0), circle.point_at(1.0)],
            CurveValue::Arc(arc) => vec![arc.start(), arc.end()],
            CurveValue::Bezier(bezier) => bezier.control_points().to_vec(),
            CurveValue::Line(line) => vec![line.start, line.end],
            CurveValue::Polyline(polyline) => polyline.points().to_vec(),
        }
    }
}

impl Curve3 for CurveValue {
    fn point_at(&self, t: f64) -> Point3 {
        match self {
            CurveValue::Circle(c) => c.point_at(t),
            CurveValue::Arc(c) => c.point_at(t),
            CurveValue::Bezier(c) => c.point_at(t),
            CurveValue::Line(c) => c.point_at(t),
            CurveValue::Polyline(c) => c.point_at(t),
        }
    }

    fn is_closed(&self) -> bool {
        match self {
            CurveValue::Circle(c) => c.is_closed(),
            CurveValue::Arc(c) => c.is_closed(),
            CurveValue::Bezier(c) => c.is_closed(),
            CurveValue::Line(c) => c.is_closed(),
            CurveValue::Polyline(c) => c.is_closed(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConstructionError {
    #[error("line start and end coincide")]
    DegenerateLine,
    #[error("polyline vertices all coincide")]
    DegeneratePolyline,
    #[error("{kind} normal must be non-zero")]
    ZeroNormal { kind: CurveKind },
    #[error("{kind} requires at least {min} points (got {found})")]
    NotEnoughPoints {
        kind: CurveKind,
        min: usize,
        found: usize,
    },
    #[error("radius must be finite and > 0 (got {radius})")]
    InvalidRadius { radius: f64 },
    #[error("arc sweep angle must be non-zero")]
    ZeroSweep,
    #[error("{kind} seed contains non-finite values")]
    NonFinite { kind: CurveKind },
}

/// A curve entity with a stable identity and a lazily built representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveWork {
    id: Identity,
    #[serde(rename = "Add Id")]
    source_id: Identity,
    curve: CurveValue,
    material: Material,
    #[serde(skip)]
    representation: Option<Representation>,
}

impl CurveWork {
    /// New entity with the default curve material.
    pub fn new(id: Identity, source_id: Identity, curve: CurveValue) -> Self {
        let material = Material::for_curve(&id);
        Self {
            id,
            source_id,
            curve,
            material,
            representation: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> &Identity {
        &self.id
    }

    /// The addition id this entity was created from.
    #[must_use]
    pub fn source_id(&self) -> &Identity {
        &self.source_id
    }

    #[must_use]
    pub fn kind(&self) -> CurveKind {
        self.curve.kind()
    }

    #[must_use]
    pub fn curve(&self) -> &CurveValue {
        &self.curve
    }

    #[must_use]
    pub fn material(&self) -> &Material {
        &self.material
    }

    /// Replaces the curve and drops the cached representation.
    pub fn set_curve(&mut self, curve: CurveValue) {
        self.curve = curve;
        self.representation = None;
    }

    /// Cached representation, if one was built for the current curve.
    #[must_use]
    pub fn representation(&self) -> Option<&Representation> {
        self.representation.as_ref()
    }

    #[must_use]
    pub fn needs_representation(&self, options: &SynthesisOptions) -> bool {
        self.representation
            .as_ref()
            .is_none_or(|rep| rep.options != *options)
    }

    /// Builds the representation unless one built with `options` is already cached.
    pub fn update_representation(
        &mut self,
        options: &SynthesisOptions,
    ) -> Result<&Representation, SynthesisError> {
        let rep = match self.representation.take() {
            Some(rep) if rep.options == *options => rep,
            _ => synthesize_with_options(&self.curve, options)?,
        };
        Ok(self.representation.insert(rep))
    }
}

/// Per-kind capability used by the reconciler.
///
/// Implementors only provide [`WorkKind::build_curve`]; construction, identity
/// lookup and edits are shared.
pub trait WorkKind {
    const KIND: CurveKind;

    type Seed: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync;

    fn build_curve(seed: &Self::Seed) -> Result<CurveValue, ConstructionError>;

    fn construct(addition: &Addition<Self::Seed>) -> Result<CurveWork, ConstructionError> {
        let curve = Self::build_curve(&addition.value)?;
        Ok(CurveWork::new(
            addition.identity.clone(),
            addition.id.clone(),
            curve,
        ))
    }

    fn identity_of(entity: &CurveWork) -> &Identity {
        entity.id()
    }

    fn apply_edit(mut entity: CurveWork, edit: &Edit<Self::Seed>) -> Result<CurveWork, ConstructionError> {
        let curve = Self::build_curve(&edit.value)?;
        entity.set_curve(curve);
        Ok(entity)
    }
}

pub(crate) fn ensure_normal(kind: CurveKind, normal: Vec3) -> Result<(), ConstructionError> {
    if !normal.is_finite() {
        return Err(ConstructionError::NonFinite { kind });
    }
    if Tolerance::default_geom().is_zero_vec3(normal) {
        return Err(ConstructionError::ZeroNormal { kind });
    }
    Ok(())
}

pub(crate) fn ensure_finite(kind: CurveKind, points: &[Point3]) -> Result<(), ConstructionError> {
    if points.iter().all(|p| p.is_finite()) {
        Ok(())
    } else {
        Err(ConstructionError::NonFinite { kind })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_work() -> CurveWork {
        CurveWork::new(
            Identity::from("L1"),
            Identity::from("L1"),
            CurveValue::Line(Line3::new(Point3::ORIGIN, Point3::new(1.0, 0.0, 0.0))),
        )
    }

    #[test]
    fn default_material_is_named_after_identity() {
        let work = line_work();
        assert_eq!(work.material().name, "L1_MAT");
        assert_eq!(work.material().color, Color::CURVE);
        assert!(work.material().unlit);
    }

    #[test]
    fn set_curve_invalidates_representation() {
        let mut work = line_work();
        let options = SynthesisOptions::default();
        work.update_representation(&options).unwrap();
        assert!(work.representation().is_some());

        work.set_curve(CurveValue::Line(Line3::new(
            Point3::ORIGIN,
            Point3::new(2.0, 0.0, 0.0),
        )));
        assert!(work.representation().is_none());
        assert!(work.needs_representation(&options));
    }

    #[test]
    fn changed_options_trigger_rebuild() {
        let mut work = line_work();
        let options = SynthesisOptions::default();
        work.update_representation(&options).unwrap();
        assert!(!work.needs_representation(&options));

        let thicker = SynthesisOptions {
            profile_radius: 0.3,
            ..SynthesisOptions::default()
        };
        assert!(work.needs_representation(&thicker));
    }

    #[test]
    fn circle_notable_points_are_its_seam() {
        let circle = CurveValue::Circle(Circle3::new(Point3::new(5.0, 5.0, 0.0), Vec3::Z, 4.0));
        let points = circle.notable_points();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0], points[1]);
    }

    #[test]
    fn persisted_entity_omits_representation() {
        let mut work = line_work();
        work.update_representation(&SynthesisOptions::default()).unwrap();

        let json = serde_json::to_value(&work).unwrap();
        assert_eq!(json["Add Id"], "L1");
        assert_eq!(json["curve"]["kind"], "line");
        assert!(json.get("representation").is_none());

        let restored: CurveWork = serde_json::from_value(json).unwrap();
        assert_eq!(restored.curve(), work.curve());
        assert!(restored.representation().is_none());
    }
}
