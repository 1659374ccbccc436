#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Override reconciliation and tube/marker synthesis for user-editable curve
//! collections.
//!
//! A host hands in the entities it persisted last time plus batches of
//! additions, edits and removals per curve kind; [`reconcile`] merges them by
//! stable identity and [`synth`] builds a tube-and-markers mesh for each
//! resulting entity.

pub mod batch;
pub mod geom;
pub mod overrides;
pub mod reconcile;
pub mod sample;
pub mod synth;
pub mod work;

pub use batch::{SynthesisReport, WorkState, reconcile_all, synthesize_all};
pub use overrides::{Addition, CurveOverrides, Edit, OverrideBatch, Removal};
pub use reconcile::{
    DuplicateAdditionPolicy, ReconcileError, ReconcileOptions, reconcile, reconcile_with_options,
};
pub use synth::{
    MarkerRadii, MarkerRadiusPolicy, Representation, SynthesisError, SynthesisOptions, synthesize,
    synthesize_with_options,
};
pub use work::{CurveKind, CurveValue, CurveWork, Identity, WorkCollection, WorkKind};
