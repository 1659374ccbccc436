use crate::geom::{GeomMesh, Point3, Vec3, merge_meshes, sphere_mesh};

#[test]
fn sphere_has_finite_vertices_and_outward_normals() {
    let center = Point3::new(0.0, 0.0, 0.0);
    let (mesh, diag) = sphere_mesh(center, 0.2, 10).expect("sphere");

    mesh.validate().expect("mesh validate");
    assert_eq!(diag.vertex_count, mesh.positions.len());
    assert_eq!(diag.triangle_count, mesh.indices.len() / 3);
    assert_eq!(diag.welded_vertex_count, 0);
    assert_eq!(diag.open_edge_count, 0);
    assert_eq!(diag.non_manifold_edge_count, 0);

    let normals = mesh.normals.as_ref().unwrap();
    for (p, n) in mesh.positions.iter().zip(normals) {
        let radial = Vec3::new(p[0], p[1], p[2]);
        let normal = Vec3::new(n[0], n[1], n[2]);
        assert!(radial.dot(normal) > 0.0, "normal should point away from the center");
    }
}

#[test]
fn geom_mesh_validate_rejects_bad_buffers() {
    let mesh = GeomMesh::new(vec![[0.0, 0.0, 0.0]], vec![0]);
    assert!(mesh.validate().is_err());

    let mesh = GeomMesh::new(vec![[0.0, 0.0, 0.0]], vec![0, 1, 0]);
    assert!(mesh.validate().is_err());

    let mesh = GeomMesh::new(vec![[f64::NAN, 0.0, 0.0]], vec![]);
    assert!(mesh.validate().is_err());
}

#[test]
fn merged_spheres_keep_their_face_counts() {
    let (a, _) = sphere_mesh(Point3::new(0.0, 0.0, 0.0), 0.2, 10).unwrap();
    let (b, _) = sphere_mesh(Point3::new(1.0, 0.0, 0.0), 0.05, 10).unwrap();

    let merged = merge_meshes([&a, &b]);
    assert_eq!(merged.triangle_count(), a.triangle_count() + b.triangle_count());
    assert_eq!(merged.vertex_count(), a.vertex_count() + b.vertex_count());
    assert!(merged.validate().is_ok());
    assert!(merged.normals.is_some());
}
