use serde::{Deserialize, Serialize};

use super::{ConstructionError, CurveKind, CurveValue, WorkKind, ensure_finite};
use crate::geom::{Line3, Point3, Tolerance};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSeed {
    pub start: Point3,
    pub end: Point3,
}

impl LineSeed {
    #[must_use]
    pub const fn new(start: Point3, end: Point3) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LineWork;

impl WorkKind for LineWork {
    const KIND: CurveKind = CurveKind::Line;
    type Seed = LineSeed;

    fn build_curve(seed: &LineSeed) -> Result<CurveValue, ConstructionError> {
        ensure_finite(Self::KIND, &[seed.start, seed.end])?;
        if Tolerance::default_geom().approx_eq_point3(seed.start, seed.end) {
            return Err(ConstructionError::DegenerateLine);
        }
        Ok(CurveValue::Line(Line3::new(seed.start, seed.end)))
    }
}
