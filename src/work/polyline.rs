use serde::{Deserialize, Serialize};

use super::{ConstructionError, CurveKind, CurveValue, WorkKind, ensure_finite};
use crate::geom::{Point3, Polyline3, Tolerance};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolylineSeed {
    pub vertices: Vec<Point3>,
    #[serde(default)]
    pub closed: bool,
}

impl PolylineSeed {
    #[must_use]
    pub fn open(vertices: Vec<Point3>) -> Self {
        Self {
            vertices,
            closed: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PolylineWork;

impl WorkKind for PolylineWork {
    const KIND: CurveKind = CurveKind::Polyline;
    type Seed = PolylineSeed;

    fn build_curve(seed: &PolylineSeed) -> Result<CurveValue, ConstructionError> {
        ensure_finite(Self::KIND, &seed.vertices)?;
        let polyline = Polyline3::new(seed.vertices.clone(), seed.closed).map_err(|_| {
            ConstructionError::NotEnoughPoints {
                kind: Self::KIND,
                min: 2,
                found: seed.vertices.len(),
            }
        })?;
        if polyline.length() <= Tolerance::default_geom().eps {
            return Err(ConstructionError::DegeneratePolyline);
        }
        Ok(CurveValue::Polyline(polyline))
    }
}
