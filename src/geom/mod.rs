mod core;
mod curve;
mod diagnostics;
mod extrusion;
mod frame;
mod mesh;
mod sphere;
mod sweep;

pub use core::{BBox, Point3, Tolerance, Transform, Vec3};
pub use curve::{
    Arc3, Bezier3, Circle3, Curve3, Line3, Polyline3, forward_direction, tessellate_curve_uniform,
};
pub use diagnostics::GeomMeshDiagnostics;
pub use extrusion::{
    ExtrusionCaps, ExtrusionError, extrude_polyline, extrude_polyline_with_tolerance,
};
pub use frame::FrenetFrame;
pub use mesh::{GeomMesh, merge_meshes};
pub use sphere::{SphereError, sphere_mesh, sphere_mesh_with_tolerance};
pub use sweep::{
    SweepCaps, SweepError, SweepOptions, sweep_profile, sweep_profile_with_tolerance,
};

#[cfg(test)]
mod tests;
