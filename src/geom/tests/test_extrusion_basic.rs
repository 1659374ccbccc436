use crate::geom::{
    Circle3, ExtrusionCaps, Point3, Tolerance, Vec3, extrude_polyline,
    extrude_polyline_with_tolerance,
};

#[test]
fn extrude_square_with_caps_is_a_closed_box() {
    let profile = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, 0.0, 0.0),
    ];

    let (mesh, diag) = extrude_polyline(&profile, Vec3::new(0.0, 0.0, 2.0), ExtrusionCaps::BOTH)
        .expect("extrusion should succeed");

    // 4 side quads + 2 fans of 4 triangles.
    assert_eq!(mesh.triangle_count(), 16);
    assert!(diag.is_valid_solid());

    let bounds = mesh.bounds().unwrap();
    assert_eq!(bounds.min, Point3::new(0.0, 0.0, 0.0));
    assert_eq!(bounds.max, Point3::new(1.0, 1.0, 2.0));
}

#[test]
fn extrude_circle_profile_along_its_normal() {
    let circle = Circle3::new(Point3::new(45.0, 1.0, 0.0), Vec3::Y, 0.1);
    let profile = circle.to_polygon(10);
    let direction = Vec3::new(0.0, 8.0, 0.0);

    let (mesh, diag) = extrude_polyline_with_tolerance(
        &profile,
        direction,
        ExtrusionCaps::BOTH,
        Tolerance::default_geom(),
    )
    .expect("extrusion should succeed");

    assert!(diag.is_valid_solid());
    assert_eq!(mesh.vertex_count(), 10 * 2 + 2);
    let size = mesh.bounds().unwrap().size();
    assert!((size.y - 8.0).abs() < 1e-9);
}

#[test]
fn open_extrusion_has_open_edges() {
    let profile = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
    let (mesh, diag) = extrude_polyline(&profile, Vec3::Z, ExtrusionCaps::NONE).unwrap();
    assert_eq!(mesh.triangle_count(), 2);
    assert_eq!(diag.open_edge_count, 4);
}
