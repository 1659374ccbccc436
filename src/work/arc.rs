use serde::{Deserialize, Serialize};

use super::circle::world_up;
use super::{ConstructionError, CurveKind, CurveValue, WorkKind, ensure_finite, ensure_normal};
use crate::geom::{Arc3, Point3, Vec3};

/// Arc seed; angles are in degrees, counter-clockwise about `normal`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcSeed {
    pub center: Point3,
    pub radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    #[serde(default = "world_up")]
    pub normal: Vec3,
}

impl ArcSeed {
    #[must_use]
    pub const fn new(center: Point3, radius: f64, start_angle: f64, end_angle: f64) -> Self {
        Self {
            center,
            radius,
            start_angle,
            end_angle,
            normal: Vec3::Z,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ArcWork;

impl WorkKind for ArcWork {
    const KIND: CurveKind = CurveKind::Arc;
    type Seed = ArcSeed;

    fn build_curve(seed: &ArcSeed) -> Result<CurveValue, ConstructionError> {
        ensure_finite(Self::KIND, &[seed.center])?;
        ensure_normal(Self::KIND, seed.normal)?;
        if !seed.start_angle.is_finite() || !seed.end_angle.is_finite() {
            return Err(ConstructionError::NonFinite { kind: Self::KIND });
        }
        if !seed.radius.is_finite() || seed.radius <= 0.0 {
            return Err(ConstructionError::InvalidRadius { radius: seed.radius });
        }

        let sweep = (seed.end_angle - seed.start_angle).to_radians();
        if sweep == 0.0 {
            return Err(ConstructionError::ZeroSweep);
        }

        Ok(CurveValue::Arc(Arc3::new(
            seed.center,
            seed.normal,
            seed.radius,
            seed.start_angle.to_radians(),
            sweep,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Tolerance;

    #[test]
    fn three_quarter_arc_ends_below_center() {
        let curve = ArcWork::build_curve(&ArcSeed::new(Point3::new(15.0, 5.0, 0.0), 4.0, 0.0, 270.0)).unwrap();
        let CurveValue::Arc(arc) = curve else {
            panic!("expected an arc");
        };
        assert!(Tolerance::LOOSE.approx_eq_point3(arc.start(), Point3::new(19.0, 5.0, 0.0)));
        assert!(Tolerance::LOOSE.approx_eq_point3(arc.end(), Point3::new(15.0, 1.0, 0.0)));
    }

    #[test]
    fn equal_angles_are_rejected() {
        let err = ArcWork::build_curve(&ArcSeed::new(Point3::ORIGIN, 1.0, 90.0, 90.0)).unwrap_err();
        assert!(matches!(err, ConstructionError::ZeroSweep));
    }

    #[test]
    fn zero_normal_is_rejected() {
        let seed = ArcSeed {
            normal: Vec3::ZERO,
            ..ArcSeed::new(Point3::ORIGIN, 1.0, 0.0, 90.0)
        };
        let err = ArcWork::build_curve(&seed).unwrap_err();
        assert!(matches!(err, ConstructionError::ZeroNormal { kind: CurveKind::Arc }));
    }
}
