use std::collections::HashMap;

use super::diagnostics::GeomMeshDiagnostics;
use super::{BBox, Point3, Tolerance, Transform, Vec3};

/// Indexed triangle mesh.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeomMesh {
    pub positions: Vec<[f64; 3]>,
    pub indices: Vec<u32>,
    pub normals: Option<Vec<[f64; 3]>>,
}

impl GeomMesh {
    /// Create a new mesh with positions and indices only.
    #[must_use]
    pub fn new(positions: Vec<[f64; 3]>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            indices,
            normals: None,
        }
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Returns true if any vertex position contains NaN or Inf values.
    #[must_use]
    pub fn has_invalid_vertices(&self) -> bool {
        self.positions
            .iter()
            .any(|p| !p[0].is_finite() || !p[1].is_finite() || !p[2].is_finite())
    }

    #[must_use]
    pub fn has_valid_indices(&self) -> bool {
        let n = self.positions.len() as u32;
        self.indices.iter().all(|&i| i < n)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.indices.len() % 3 != 0 {
            return Err("mesh indices are not a triangle list (len % 3 != 0)".to_string());
        }
        if self.has_invalid_vertices() {
            return Err("mesh has invalid vertex coordinates (NaN/Inf)".to_string());
        }
        if !self.has_valid_indices() {
            return Err("mesh has out-of-bounds vertex indices".to_string());
        }
        if self
            .normals
            .as_ref()
            .is_some_and(|normals| normals.len() != self.positions.len())
        {
            return Err("mesh normal buffer does not match vertex count".to_string());
        }
        Ok(())
    }

    #[must_use]
    pub fn bounds(&self) -> Option<BBox> {
        BBox::from_points(self.positions.iter().copied().map(Point3::from_array))
    }

    /// Triangles as explicit corner positions, in index order.
    pub fn triangles(&self) -> impl Iterator<Item = [Point3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                Point3::from_array(self.positions[tri[0] as usize]),
                Point3::from_array(self.positions[tri[1] as usize]),
                Point3::from_array(self.positions[tri[2] as usize]),
            ]
        })
    }

    /// Copy with every vertex moved by `offset`.
    #[must_use]
    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            positions: self
                .positions
                .iter()
                .map(|p| [p[0] + offset.x, p[1] + offset.y, p[2] + offset.z])
                .collect(),
            indices: self.indices.clone(),
            normals: self.normals.clone(),
        }
    }

    /// Copy with positions and normals mapped through a rigid `transform`.
    #[must_use]
    pub fn transformed(&self, transform: Transform) -> Self {
        Self {
            positions: self
                .positions
                .iter()
                .map(|&p| transform.apply_point(Point3::from_array(p)).to_array())
                .collect(),
            indices: self.indices.clone(),
            normals: self.normals.as_ref().map(|normals| {
                normals
                    .iter()
                    .map(|n| {
                        let v = transform.apply_vec(Vec3::new(n[0], n[1], n[2]));
                        [v.x, v.y, v.z]
                    })
                    .collect()
            }),
        }
    }

    /// Appends `other`'s vertices and faces without welding.
    ///
    /// Normals survive only when both sides carry them.
    pub fn append(&mut self, other: &GeomMesh) {
        let offset = self.positions.len() as u32;
        let had_geometry = !self.positions.is_empty();

        self.normals = match (self.normals.take(), other.normals.as_ref()) {
            (Some(mut mine), Some(theirs)) => {
                mine.extend_from_slice(theirs);
                Some(mine)
            }
            (None, Some(theirs)) if !had_geometry => Some(theirs.clone()),
            _ => None,
        };

        self.positions.extend_from_slice(&other.positions);
        self.indices.extend(other.indices.iter().map(|&i| i + offset));
    }
}

/// Concatenates meshes into one face list; vertices are not shared between parts.
#[must_use]
pub fn merge_meshes<'a>(parts: impl IntoIterator<Item = &'a GeomMesh>) -> GeomMesh {
    let mut merged = GeomMesh::default();
    for part in parts {
        merged.append(part);
    }
    merged
}

/// Welds, removes degenerate faces, makes winding consistent, orients closed
/// meshes outward and computes smooth normals.
pub(crate) fn finalize_mesh(
    points: Vec<Point3>,
    indices: Vec<u32>,
    tol: Tolerance,
) -> (GeomMesh, GeomMeshDiagnostics) {
    let (points, indices, welded_vertex_count) = weld_mesh_vertices(points, indices, tol);
    let (mut indices, degenerate_triangle_count) = cull_degenerate_triangles(&points, &indices, tol);

    let flipped_triangle_count = fix_triangle_winding_consistency(&mut indices);
    let (open_edge_count, non_manifold_edge_count) = count_edge_topology(&indices);

    let mut warnings = Vec::new();
    if open_edge_count == 0 && non_manifold_edge_count == 0 {
        let volume = signed_volume(&points, &indices);
        if volume.is_finite() && volume < 0.0 {
            flip_all_triangles(&mut indices);
            warnings.push("mesh orientation flipped (outward)".to_string());
        }
    }
    if open_edge_count > 0 {
        warnings.push("mesh has open edges".to_string());
    }
    if non_manifold_edge_count > 0 {
        warnings.push("mesh has non-manifold edges".to_string());
    }

    let normals = compute_smooth_normals(&points, &indices);
    let mesh = GeomMesh {
        positions: points.into_iter().map(Point3::to_array).collect(),
        indices,
        normals: Some(normals),
    };

    let diagnostics = GeomMeshDiagnostics {
        vertex_count: mesh.vertex_count(),
        triangle_count: mesh.triangle_count(),
        welded_vertex_count,
        flipped_triangle_count,
        degenerate_triangle_count,
        open_edge_count,
        non_manifold_edge_count,
        warnings,
    };

    (mesh, diagnostics)
}

/// Merges vertices closer than `tol` using a hashed grid of cell size `tol.eps`.
fn weld_mesh_vertices(
    points: Vec<Point3>,
    indices: Vec<u32>,
    tol: Tolerance,
) -> (Vec<Point3>, Vec<u32>, usize) {
    if !tol.eps.is_finite() || tol.eps <= 0.0 {
        return (points, indices, 0);
    }

    let inv = 1.0 / tol.eps;
    let quantize = |value: f64| -> Option<i64> {
        value
            .is_finite()
            .then(|| (value * inv).floor().clamp(i64::MIN as f64, i64::MAX as f64) as i64)
    };

    let mut buckets: HashMap<(i64, i64, i64), Vec<u32>> = HashMap::new();
    let mut remap: Vec<u32> = Vec::with_capacity(points.len());
    let mut out_points: Vec<Point3> = Vec::with_capacity(points.len());

    for p in points.iter().copied() {
        let key = match (quantize(p.x), quantize(p.y), quantize(p.z)) {
            (Some(kx), Some(ky), Some(kz)) => Some((kx, ky, kz)),
            _ => None,
        };

        let found = key.and_then(|key| {
            neighbour_cells(key)
                .filter_map(|cell| buckets.get(&cell))
                .flatten()
                .copied()
                .find(|&cand| tol.approx_eq_point3(out_points[cand as usize], p))
        });

        let out_idx = match found {
            Some(existing) => existing,
            None => {
                let new_idx = out_points.len() as u32;
                out_points.push(p);
                if let Some(key) = key {
                    buckets.entry(key).or_default().push(new_idx);
                }
                new_idx
            }
        };
        remap.push(out_idx);
    }

    let out_indices = indices
        .into_iter()
        .map(|idx| remap.get(idx as usize).copied().unwrap_or(idx))
        .collect();

    let welded = points.len().saturating_sub(out_points.len());
    (out_points, out_indices, welded)
}

fn neighbour_cells(key: (i64, i64, i64)) -> impl Iterator<Item = (i64, i64, i64)> {
    (-1i64..=1).flat_map(move |dx| {
        (-1i64..=1).flat_map(move |dy| (-1i64..=1).map(move |dz| (key.0 + dx, key.1 + dy, key.2 + dz)))
    })
}

fn cull_degenerate_triangles(points: &[Point3], indices: &[u32], tol: Tolerance) -> (Vec<u32>, usize) {
    let mut out = Vec::with_capacity(indices.len());
    let mut removed = 0usize;

    for tri in indices.chunks_exact(3) {
        let (i0, i1, i2) = (tri[0], tri[1], tri[2]);
        if i0 == i1 || i1 == i2 || i0 == i2 {
            removed += 1;
            continue;
        }

        let (Some(&a), Some(&b), Some(&c)) = (
            points.get(i0 as usize),
            points.get(i1 as usize),
            points.get(i2 as usize),
        ) else {
            removed += 1;
            continue;
        };

        let area2 = b.sub_point(a).cross(c.sub_point(a)).length_squared();
        if !area2.is_finite() || area2 <= tol.eps_squared() * tol.eps_squared() {
            removed += 1;
            continue;
        }

        out.extend_from_slice(&[i0, i1, i2]);
    }

    (out, removed)
}

/// Flood-fills across manifold edges so neighbouring triangles traverse their
/// shared edge in opposite directions. Returns the number of flipped triangles.
fn fix_triangle_winding_consistency(indices: &mut [u32]) -> usize {
    let tri_count = indices.len() / 3;
    if tri_count == 0 {
        return 0;
    }

    let mut edges: HashMap<(u32, u32), Vec<(usize, bool)>> = HashMap::with_capacity(tri_count * 3);
    for t in 0..tri_count {
        for (a, b) in triangle_edges(indices, t) {
            let (lo, hi, dir) = if a <= b { (a, b, true) } else { (b, a, false) };
            edges.entry((lo, hi)).or_default().push((t, dir));
        }
    }

    let mut visited = vec![false; tri_count];
    let mut flipped = vec![false; tri_count];

    for seed in 0..tri_count {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;
        let mut stack = vec![seed];

        while let Some(t) = stack.pop() {
            for (a, b) in triangle_edges(indices, t) {
                let (lo, hi, dir_t) = if a <= b { (a, b, true) } else { (b, a, false) };
                let Some(adj) = edges.get(&(lo, hi)) else {
                    continue;
                };
                if adj.len() != 2 {
                    continue;
                }

                let (other, dir_other) = if adj[0].0 == t { adj[1] } else { adj[0] };
                if !visited[other] {
                    visited[other] = true;
                    flipped[other] = flipped[t] ^ dir_t ^ dir_other ^ true;
                    stack.push(other);
                }
            }
        }
    }

    let mut flipped_count = 0usize;
    for (t, flip) in flipped.into_iter().enumerate() {
        if flip {
            indices.swap(t * 3 + 1, t * 3 + 2);
            flipped_count += 1;
        }
    }
    flipped_count
}

fn triangle_edges(indices: &[u32], t: usize) -> [(u32, u32); 3] {
    let (i0, i1, i2) = (indices[t * 3], indices[t * 3 + 1], indices[t * 3 + 2]);
    [(i0, i1), (i1, i2), (i2, i0)]
}

/// Returns `(open_edge_count, non_manifold_edge_count)`.
fn count_edge_topology(indices: &[u32]) -> (usize, usize) {
    let mut edge_counts: HashMap<(u32, u32), u32> = HashMap::new();
    for t in 0..indices.len() / 3 {
        for (a, b) in triangle_edges(indices, t) {
            let key = if a <= b { (a, b) } else { (b, a) };
            *edge_counts.entry(key).or_insert(0) += 1;
        }
    }

    let open = edge_counts.values().filter(|&&count| count == 1).count();
    let non_manifold = edge_counts.values().filter(|&&count| count > 2).count();
    (open, non_manifold)
}

fn flip_all_triangles(indices: &mut [u32]) {
    for tri in indices.chunks_exact_mut(3) {
        tri.swap(1, 2);
    }
}

fn signed_volume(points: &[Point3], indices: &[u32]) -> f64 {
    let mut volume = 0.0;
    for tri in indices.chunks_exact(3) {
        let (Some(a), Some(b), Some(c)) = (
            points.get(tri[0] as usize),
            points.get(tri[1] as usize),
            points.get(tri[2] as usize),
        ) else {
            continue;
        };
        volume += a.to_vec3().dot(b.to_vec3().cross(c.to_vec3()));
    }
    volume / 6.0
}

fn compute_smooth_normals(points: &[Point3], indices: &[u32]) -> Vec<[f64; 3]> {
    let mut accum = vec![Vec3::ZERO; points.len()];

    for tri in indices.chunks_exact(3) {
        let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let (Some(&a), Some(&b), Some(&c)) = (points.get(i0), points.get(i1), points.get(i2)) else {
            continue;
        };
        let n = b.sub_point(a).cross(c.sub_point(a));
        accum[i0] = accum[i0].add(n);
        accum[i1] = accum[i1].add(n);
        accum[i2] = accum[i2].add(n);
    }

    accum
        .into_iter()
        .map(|n| n.normalized().unwrap_or(Vec3::Z))
        .map(|n| [n.x, n.y, n.z])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_tetrahedron() -> (Vec<Point3>, Vec<u32>) {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        // Deliberately inward-facing.
        let indices = vec![0, 1, 2, 0, 3, 1, 0, 2, 3, 1, 3, 2];
        (points, indices)
    }

    #[test]
    fn finalize_orients_closed_mesh_outward() {
        let (points, indices) = unit_tetrahedron();
        let (mesh, diag) = finalize_mesh(points.clone(), indices, Tolerance::default_geom());

        assert_eq!(diag.triangle_count, 4);
        assert!(diag.is_valid_solid());
        let positions: Vec<Point3> = mesh.positions.iter().copied().map(Point3::from_array).collect();
        assert!(signed_volume(&positions, &mesh.indices) > 0.0);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn finalize_welds_duplicate_vertices() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let indices = vec![0, 1, 2, 3, 4, 5];
        let (mesh, diag) = finalize_mesh(points, indices, Tolerance::default_geom());

        assert_eq!(diag.welded_vertex_count, 2);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(diag.open_edge_count, 4);
    }

    #[test]
    fn finalize_drops_degenerate_triangles() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let (mesh, diag) = finalize_mesh(points, vec![0, 1, 2], Tolerance::default_geom());
        assert_eq!(diag.degenerate_triangle_count, 1);
        assert!(mesh.is_empty());
    }

    #[test]
    fn append_offsets_indices() {
        let a = GeomMesh::new(vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], vec![0, 1, 2]);
        let b = a.translated(Vec3::new(0.0, 0.0, 5.0));

        let merged = merge_meshes([&a, &b]);
        assert_eq!(merged.vertex_count(), 6);
        assert_eq!(merged.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(merged.positions[3], [0.0, 0.0, 5.0]);
        assert!(merged.normals.is_none());
    }
}
