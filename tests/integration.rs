use curvework::geom::{BBox, Point3, Tolerance};
use curvework::sample::{self, SampleInputs};
use curvework::synth::MarkerRole;
use curvework::work::{CircleSeed, LineSeed, LineWork, PolylineSeed, PolylineWork};
use curvework::{
    Addition, CurveKind, CurveOverrides, CurveValue, Edit, Identity, OverrideBatch, Removal,
    ReconcileOptions, SynthesisOptions, WorkCollection, WorkState, reconcile, reconcile_all,
    synthesize_all,
};

fn line(x: f64) -> LineSeed {
    LineSeed::new(Point3::ORIGIN, Point3::new(x, 0.0, 0.0))
}

fn empty_lines() -> WorkCollection {
    WorkCollection::new(CurveKind::Line)
}

fn line_end_x(collection: &WorkCollection, id: &str) -> f64 {
    match collection.get(&Identity::from(id)).map(|e| e.curve()) {
        Some(CurveValue::Line(line)) => line.end.x,
        other => panic!("expected line `{id}`, got {other:?}"),
    }
}

fn tube_bounds(state: &WorkState, kind: CurveKind, id: &str) -> BBox {
    let entity = state
        .collection(kind)
        .get(&Identity::from(id))
        .expect("entity present");
    let rep = entity.representation().expect("representation built");
    BBox::from_points(
        rep.mesh
            .triangles()
            .take(rep.tube_triangle_count)
            .flat_map(|tri| tri.into_iter()),
    )
    .expect("tube has triangles")
}

#[test]
fn unit_line_gets_tube_and_two_endpoint_markers() {
    let overrides = CurveOverrides {
        lines: OverrideBatch::default().with_addition(Addition::named("L1", line(1.0))),
        ..CurveOverrides::default()
    };
    let mut state = reconcile_all(&WorkState::new(), &overrides, ReconcileOptions::default())
        .expect("reconcile");
    let report = synthesize_all(&mut state, &SynthesisOptions::default());
    assert!(report.is_success());
    assert_eq!(report.built, 1);

    let bounds = tube_bounds(&state, CurveKind::Line, "L1");
    let tol = Tolerance::LOOSE;
    assert!(tol.approx_eq_f64(bounds.min.x, 0.0));
    assert!(tol.approx_eq_f64(bounds.max.x, 1.0));
    assert!(bounds.max.y <= 0.1 + 1e-9 && bounds.min.y >= -0.1 - 1e-9);

    let rep = state.lines.get(&Identity::from("L1")).unwrap().representation().unwrap();
    assert_eq!(rep.markers.len(), 2);
    assert!(tol.approx_eq_point3(rep.markers[0].center, Point3::ORIGIN));
    assert!(tol.approx_eq_point3(rep.markers[1].center, Point3::new(1.0, 0.0, 0.0)));
    assert!(rep.markers.iter().all(|m| m.role == MarkerRole::Endpoint));
    assert!(rep.marker_triangle_count() > 0);
}

#[test]
fn edit_rebuilds_representation_with_new_length() {
    let add = CurveOverrides {
        lines: OverrideBatch::default().with_addition(Addition::named("L1", line(1.0))),
        ..CurveOverrides::default()
    };
    let options = SynthesisOptions::default();
    let mut state = reconcile_all(&WorkState::new(), &add, ReconcileOptions::default()).unwrap();
    synthesize_all(&mut state, &options);

    let edit = CurveOverrides {
        lines: OverrideBatch::default().with_edit(Edit::new("L1", line(2.0))),
        ..CurveOverrides::default()
    };
    let mut state = reconcile_all(&state, &edit, ReconcileOptions::default()).unwrap();
    assert!(state.lines.get(&Identity::from("L1")).unwrap().representation().is_none());

    let report = synthesize_all(&mut state, &options);
    assert_eq!(report.built, 1);
    let bounds = tube_bounds(&state, CurveKind::Line, "L1");
    assert!(Tolerance::LOOSE.approx_eq_f64(bounds.max.x, 2.0));
}

#[test]
fn empty_batch_is_idempotent() {
    let batch = OverrideBatch::default()
        .with_addition(Addition::named("a", line(1.0)))
        .with_addition(Addition::named("b", line(2.0)));
    let first = reconcile::<LineWork>(&empty_lines(), &batch).unwrap();
    let again = reconcile::<LineWork>(&first, &OverrideBatch::default()).unwrap();
    assert_eq!(first, again);
}

#[test]
fn repeated_addition_does_not_duplicate() {
    let batch = OverrideBatch::default().with_addition(Addition::named("a", line(1.0)));
    let first = reconcile::<LineWork>(&empty_lines(), &batch).unwrap();
    let second = reconcile::<LineWork>(&first, &batch).unwrap();
    assert_eq!(second.len(), 1);
}

#[test]
fn removal_wins_over_edit() {
    let seeded = reconcile::<LineWork>(
        &empty_lines(),
        &OverrideBatch::default().with_addition(Addition::named("a", line(1.0))),
    )
    .unwrap();
    let batch = OverrideBatch::default()
        .with_edit(Edit::new("a", line(3.0)))
        .with_removal(Removal::new("a"));
    let out = reconcile::<LineWork>(&seeded, &batch).unwrap();
    assert!(out.is_empty());
}

#[test]
fn removal_with_addition_yields_fresh_entity() {
    let seeded = reconcile::<LineWork>(
        &empty_lines(),
        &OverrideBatch::default().with_addition(Addition::named("X", line(1.0))),
    )
    .unwrap();
    let edited =
        reconcile::<LineWork>(&seeded, &OverrideBatch::default().with_edit(Edit::new("X", line(2.0))))
            .unwrap();

    let batch = OverrideBatch::default()
        .with_removal(Removal::new("X"))
        .with_addition(Addition::named("X", line(7.0)));
    let out = reconcile::<LineWork>(&edited, &batch).unwrap();

    assert_eq!(out.len(), 1);
    assert_eq!(line_end_x(&out, "X"), 7.0);
}

#[test]
fn same_identity_added_twice_in_one_batch_is_one_entity() {
    let batch = OverrideBatch::default()
        .with_addition(Addition::named("a", line(1.0)))
        .with_addition(Addition::named("a", line(3.0)));
    let out = reconcile::<LineWork>(&empty_lines(), &batch).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(line_end_x(&out, "a"), 1.0);
}

#[test]
fn last_edit_wins_and_untouched_entities_persist() {
    let seeded = reconcile::<LineWork>(
        &empty_lines(),
        &OverrideBatch::default()
            .with_addition(Addition::named("a", line(1.0)))
            .with_addition(Addition::named("b", line(5.0))),
    )
    .unwrap();
    let batch = OverrideBatch::default()
        .with_edit(Edit::new("a", line(2.0)))
        .with_edit(Edit::new("a", line(4.0)));
    let out = reconcile::<LineWork>(&seeded, &batch).unwrap();

    assert_eq!(line_end_x(&out, "a"), 4.0);
    assert_eq!(out.get(&Identity::from("b")), seeded.get(&Identity::from("b")));
}

#[test]
fn polyline_gets_one_marker_per_vertex() {
    let vertices = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(2.0, 1.0, 0.0),
        Point3::new(2.0, 2.0, 0.0),
    ];
    let polylines = reconcile::<PolylineWork>(
        &WorkCollection::new(CurveKind::Polyline),
        &OverrideBatch::default().with_addition(Addition::named("P", PolylineSeed::open(vertices.clone()))),
    )
    .unwrap();
    let mut state = WorkState {
        polylines,
        ..WorkState::new()
    };
    assert!(synthesize_all(&mut state, &SynthesisOptions::default()).is_success());

    let rep = state.polylines.get(&Identity::from("P")).unwrap().representation().unwrap();
    let roles: Vec<MarkerRole> = rep.markers.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![
            MarkerRole::Endpoint,
            MarkerRole::Interior,
            MarkerRole::Interior,
            MarkerRole::Interior,
            MarkerRole::Endpoint,
        ]
    );
    for (marker, vertex) in rep.markers.iter().zip(&vertices) {
        assert!(Tolerance::LOOSE.approx_eq_point3(marker.center, *vertex));
    }
    assert_eq!(rep.markers[0].radius, 0.2);
    assert_eq!(rep.markers[2].radius, 0.05);
}

#[test]
fn sample_state_survives_persistence() {
    let inputs = SampleInputs::default();
    let first = sample::execute(&inputs, &WorkState::new()).expect("first run");
    assert!(first.synthesis.is_success());
    assert_eq!(first.state.len(), 5);
    assert!(!first.masses.is_empty());

    let json = serde_json::to_string(&first.state).expect("serialize state");
    let restored: WorkState = serde_json::from_str(&json).expect("deserialize state");
    assert!(restored.entities().all(|e| e.representation().is_none()));

    // Re-running with an edit: examples are ignored, the edit persists.
    let inputs = SampleInputs {
        overrides: CurveOverrides {
            circles: OverrideBatch::default()
                .with_edit(Edit::new("Circle Example", CircleSeed::new(Point3::ORIGIN, 2.0))),
            ..CurveOverrides::default()
        },
        ..SampleInputs::default()
    };
    let second = sample::execute(&inputs, &restored).expect("second run");
    assert_eq!(second.state.len(), 5);

    let circle = second
        .state
        .circles
        .get(&Identity::from("Circle Example"))
        .expect("circle kept");
    match circle.curve() {
        CurveValue::Circle(c) => assert_eq!(c.radius, 2.0),
        other => panic!("expected circle, got {other:?}"),
    }
    assert_eq!(circle.material().name, "Circle Example_MAT");
    assert!(circle.representation().is_some());
}
