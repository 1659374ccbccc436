use serde::{Deserialize, Serialize};

use super::{ConstructionError, CurveKind, CurveValue, WorkKind, ensure_finite, ensure_normal};
use crate::geom::{Circle3, Point3, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircleSeed {
    pub center: Point3,
    pub radius: f64,
    #[serde(default = "world_up")]
    pub normal: Vec3,
}

impl CircleSeed {
    /// Circle in the world XY plane.
    #[must_use]
    pub const fn new(center: Point3, radius: f64) -> Self {
        Self {
            center,
            radius,
            normal: Vec3::Z,
        }
    }
}

pub(super) fn world_up() -> Vec3 {
    Vec3::Z
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CircleWork;

impl WorkKind for CircleWork {
    const KIND: CurveKind = CurveKind::Circle;
    type Seed = CircleSeed;

    fn build_curve(seed: &CircleSeed) -> Result<CurveValue, ConstructionError> {
        ensure_finite(Self::KIND, &[seed.center])?;
        ensure_normal(Self::KIND, seed.normal)?;
        if !seed.radius.is_finite() || seed.radius <= 0.0 {
            return Err(ConstructionError::InvalidRadius { radius: seed.radius });
        }
        Ok(CurveValue::Circle(Circle3::new(seed.center, seed.normal, seed.radius)))
    }
}
