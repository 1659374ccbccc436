//! Reconciling and synthesizing all five curve kinds together.
//!
//! Kinds are independent, so with the `parallel` feature each kind is
//! reconciled on its own rayon task and entities are synthesized in parallel.
//! Results are identical either way.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::overrides::CurveOverrides;
use crate::reconcile::{ReconcileError, ReconcileOptions, reconcile_with_options};
use crate::synth::{SynthesisError, SynthesisOptions};
use crate::work::{
    ArcWork, BezierWork, CircleWork, CurveKind, CurveWork, Identity, LineWork, PolylineWork,
    WorkCollection,
};

/// Persisted entities of every kind; representations are never serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkState {
    pub circles: WorkCollection,
    pub arcs: WorkCollection,
    pub beziers: WorkCollection,
    pub lines: WorkCollection,
    pub polylines: WorkCollection,
}

impl Default for WorkState {
    fn default() -> Self {
        Self {
            circles: WorkCollection::new(CurveKind::Circle),
            arcs: WorkCollection::new(CurveKind::Arc),
            beziers: WorkCollection::new(CurveKind::Bezier),
            lines: WorkCollection::new(CurveKind::Line),
            polylines: WorkCollection::new(CurveKind::Polyline),
        }
    }
}

impl WorkState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn collection(&self, kind: CurveKind) -> &WorkCollection {
        match kind {
            CurveKind::Circle => &self.circles,
            CurveKind::Arc => &self.arcs,
            CurveKind::Bezier => &self.beziers,
            CurveKind::Line => &self.lines,
            CurveKind::Polyline => &self.polylines,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.collections().map(WorkCollection::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Collections in [`CurveKind::ALL`] order.
    pub fn collections(&self) -> impl Iterator<Item = &WorkCollection> {
        CurveKind::ALL.into_iter().map(|kind| self.collection(kind))
    }

    fn collections_mut(&mut self) -> [&mut WorkCollection; 5] {
        [
            &mut self.circles,
            &mut self.arcs,
            &mut self.beziers,
            &mut self.lines,
            &mut self.polylines,
        ]
    }

    /// Every entity, grouped by kind.
    pub fn entities(&self) -> impl Iterator<Item = &CurveWork> {
        self.collections().flat_map(WorkCollection::iter)
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "parallel")] {
        fn join<A, B, RA, RB>(a: A, b: B) -> (RA, RB)
        where
            A: FnOnce() -> RA + Send,
            B: FnOnce() -> RB + Send,
            RA: Send,
            RB: Send,
        {
            rayon::join(a, b)
        }
    } else {
        fn join<A, B, RA, RB>(a: A, b: B) -> (RA, RB)
        where
            A: FnOnce() -> RA,
            B: FnOnce() -> RB,
        {
            (a(), b())
        }
    }
}

/// Reconciles every kind against its batch.
///
/// All-or-nothing across kinds: if any kind fails, the first error in
/// [`CurveKind::ALL`] order is returned and no state is produced.
pub fn reconcile_all(
    state: &WorkState,
    overrides: &CurveOverrides,
    options: ReconcileOptions,
) -> Result<WorkState, ReconcileError> {
    let ((circles, arcs), (beziers, (lines, polylines))) = join(
        || {
            join(
                || reconcile_with_options::<CircleWork>(&state.circles, &overrides.circles, options),
                || reconcile_with_options::<ArcWork>(&state.arcs, &overrides.arcs, options),
            )
        },
        || {
            join(
                || reconcile_with_options::<BezierWork>(&state.beziers, &overrides.beziers, options),
                || {
                    join(
                        || reconcile_with_options::<LineWork>(&state.lines, &overrides.lines, options),
                        || {
                            reconcile_with_options::<PolylineWork>(
                                &state.polylines,
                                &overrides.polylines,
                                options,
                            )
                        },
                    )
                },
            )
        },
    );

    Ok(WorkState {
        circles: circles?,
        arcs: arcs?,
        beziers: beziers?,
        lines: lines?,
        polylines: polylines?,
    })
}

/// One entity whose representation could not be built.
#[derive(Debug)]
pub struct SynthesisFailure {
    pub kind: CurveKind,
    pub identity: Identity,
    pub error: SynthesisError,
}

#[derive(Debug, Default)]
pub struct SynthesisReport {
    /// Representations built in this pass.
    pub built: usize,
    /// Cached representations that were still valid.
    pub reused: usize,
    pub failures: Vec<SynthesisFailure>,
}

impl SynthesisReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

enum Outcome {
    Built,
    Reused,
    Failed(SynthesisFailure),
}

/// Brings every entity's representation up to date with `options`.
///
/// A failing entity is reported and left without a representation; the
/// others are still synthesized.
pub fn synthesize_all(state: &mut WorkState, options: &SynthesisOptions) -> SynthesisReport {
    let mut report = SynthesisReport::default();

    for collection in state.collections_mut() {
        for outcome in update_entities(collection.entities_mut(), options) {
            match outcome {
                Outcome::Built => report.built += 1,
                Outcome::Reused => report.reused += 1,
                Outcome::Failed(failure) => report.failures.push(failure),
            }
        }
    }

    debug!(
        "synthesized {} representations ({} reused, {} failed)",
        report.built,
        report.reused,
        report.failures.len()
    );
    report
}

#[cfg(feature = "parallel")]
fn update_entities(entities: &mut [CurveWork], options: &SynthesisOptions) -> Vec<Outcome> {
    entities
        .par_iter_mut()
        .map(|entity| update_entity(entity, options))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn update_entities(entities: &mut [CurveWork], options: &SynthesisOptions) -> Vec<Outcome> {
    entities
        .iter_mut()
        .map(|entity| update_entity(entity, options))
        .collect()
}

fn update_entity(entity: &mut CurveWork, options: &SynthesisOptions) -> Outcome {
    let stale = entity.needs_representation(options);
    match entity.update_representation(options) {
        Ok(_) if stale => Outcome::Built,
        Ok(_) => Outcome::Reused,
        Err(error) => {
            warn!("cannot synthesize {} `{}`: {error}", entity.kind(), entity.id());
            Outcome::Failed(SynthesisFailure {
                kind: entity.kind(),
                identity: entity.id().clone(),
                error,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Point3;
    use crate::overrides::{Addition, Edit, OverrideBatch};
    use crate::work::{CircleSeed, LineSeed};

    fn overrides() -> CurveOverrides {
        CurveOverrides {
            circles: OverrideBatch::default()
                .with_addition(Addition::named("c", CircleSeed::new(Point3::ORIGIN, 1.0))),
            lines: OverrideBatch::default().with_addition(Addition::named(
                "l",
                LineSeed::new(Point3::ORIGIN, Point3::new(1.0, 0.0, 0.0)),
            )),
            ..CurveOverrides::default()
        }
    }

    #[test]
    fn reconcile_all_fills_each_kind() {
        let state = reconcile_all(&WorkState::new(), &overrides(), ReconcileOptions::default()).unwrap();
        assert_eq!(state.circles.len(), 1);
        assert_eq!(state.lines.len(), 1);
        assert!(state.arcs.is_empty());
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn reconcile_all_fails_if_any_kind_fails() {
        let mut bad = overrides();
        bad.lines = bad
            .lines
            .with_addition(Addition::named("broken", LineSeed::new(Point3::ORIGIN, Point3::ORIGIN)));
        assert!(reconcile_all(&WorkState::new(), &bad, ReconcileOptions::default()).is_err());
    }

    #[test]
    fn second_pass_reuses_representations() {
        let mut state = reconcile_all(&WorkState::new(), &overrides(), ReconcileOptions::default()).unwrap();
        let options = SynthesisOptions::default();

        let first = synthesize_all(&mut state, &options);
        assert_eq!(first.built, 2);
        assert!(first.is_success());

        let second = synthesize_all(&mut state, &options);
        assert_eq!(second.built, 0);
        assert_eq!(second.reused, 2);
    }

    #[test]
    fn edited_entity_is_rebuilt() {
        let mut state = reconcile_all(&WorkState::new(), &overrides(), ReconcileOptions::default()).unwrap();
        let options = SynthesisOptions::default();
        synthesize_all(&mut state, &options);

        let edit = CurveOverrides {
            lines: OverrideBatch::default()
                .with_edit(Edit::new("l", LineSeed::new(Point3::ORIGIN, Point3::new(2.0, 0.0, 0.0)))),
            ..CurveOverrides::default()
        };
        let mut state = reconcile_all(&state, &edit, ReconcileOptions::default()).unwrap();
        let report = synthesize_all(&mut state, &options);
        assert_eq!(report.built, 1);
        assert_eq!(report.reused, 1);
    }
}
