use std::f64::consts::{PI, TAU};

use super::diagnostics::GeomMeshDiagnostics;
use super::mesh::{GeomMesh, finalize_mesh};
use super::{Point3, Tolerance};

#[derive(Debug, thiserror::Error)]
pub enum SphereError {
    #[error("sphere center must be finite")]
    NonFiniteCenter,
    #[error("sphere radius must be finite and > 0 (got {radius})")]
    InvalidRadius { radius: f64 },
    #[error("sphere requires at least {min} divisions (got {found})")]
    NotEnoughDivisions { min: usize, found: usize },
}

pub fn sphere_mesh(
    center: Point3,
    radius: f64,
    divisions: usize,
) -> Result<(GeomMesh, GeomMeshDiagnostics), SphereError> {
    sphere_mesh_with_tolerance(center, radius, divisions, Tolerance::default_geom())
}

/// UV sphere with `divisions` segments around and `divisions` bands from pole
/// to pole.
pub fn sphere_mesh_with_tolerance(
    center: Point3,
    radius: f64,
    divisions: usize,
    tol: Tolerance,
) -> Result<(GeomMesh, GeomMeshDiagnostics), SphereError> {
    if !center.is_finite() {
        return Err(SphereError::NonFiniteCenter);
    }
    if !radius.is_finite() || radius <= 0.0 {
        return Err(SphereError::InvalidRadius { radius });
    }
    if divisions < 3 {
        return Err(SphereError::NotEnoughDivisions {
            min: 3,
            found: divisions,
        });
    }

    let u_count = divisions;
    let v_count = divisions;

    let mut vertices: Vec<Point3> = Vec::with_capacity((v_count - 1) * u_count + 2);
    vertices.push(Point3::new(center.x, center.y, center.z + radius));

    for i in 1..v_count {
        let phi = PI * i as f64 / v_count as f64;
        let z = radius * phi.cos();
        let ring_radius = radius * phi.sin();

        for j in 0..u_count {
            let theta = TAU * j as f64 / u_count as f64;
            vertices.push(Point3::new(
                center.x + ring_radius * theta.cos(),
                center.y + ring_radius * theta.sin(),
                center.z + z,
            ));
        }
    }

    vertices.push(Point3::new(center.x, center.y, center.z - radius));
    let bottom_pole = (vertices.len() - 1) as u32;

    let mut indices: Vec<u32> = Vec::with_capacity(u_count * (v_count - 1) * 6);

    for j in 0..u_count {
        let a = (j + 1) as u32;
        let b = ((j + 1) % u_count + 1) as u32;
        indices.extend_from_slice(&[0, a, b]);
    }

    for i in 0..(v_count - 2) {
        let ring = i * u_count + 1;
        let next_ring = (i + 1) * u_count + 1;
        for j in 0..u_count {
            let j_next = (j + 1) % u_count;
            let i0 = (ring + j) as u32;
            let i1 = (ring + j_next) as u32;
            let i2 = (next_ring + j_next) as u32;
            let i3 = (next_ring + j) as u32;
            indices.extend_from_slice(&[i0, i3, i2]);
            indices.extend_from_slice(&[i0, i2, i1]);
        }
    }

    let last_ring = (v_count - 2) * u_count + 1;
    for j in 0..u_count {
        let a = (last_ring + j) as u32;
        let b = (last_ring + (j + 1) % u_count) as u32;
        indices.extend_from_slice(&[bottom_pole, b, a]);
    }

    Ok(finalize_mesh(vertices, indices, tol))
}
