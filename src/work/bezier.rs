use serde::{Deserialize, Serialize};

use super::{ConstructionError, CurveKind, CurveValue, WorkKind, ensure_finite};
use crate::geom::{Bezier3, Point3};

/// Control polygon of a bezier curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BezierSeed {
    pub control_points: Vec<Point3>,
}

impl BezierSeed {
    #[must_use]
    pub fn new(control_points: Vec<Point3>) -> Self {
        Self { control_points }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BezierWork;

impl WorkKind for BezierWork {
    const KIND: CurveKind = CurveKind::Bezier;
    type Seed = BezierSeed;

    fn build_curve(seed: &BezierSeed) -> Result<CurveValue, ConstructionError> {
        ensure_finite(Self::KIND, &seed.control_points)?;
        let bezier = Bezier3::new(seed.control_points.clone()).map_err(|_| {
            ConstructionError::NotEnoughPoints {
                kind: Self::KIND,
                min: 2,
                found: seed.control_points.len(),
            }
        })?;
        Ok(CurveValue::Bezier(bezier))
    }
}
