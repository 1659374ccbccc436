//! Merging persisted entities with a batch of overrides.
//!
//! Operations apply in a fixed order: removals, then edits, then additions.
//! The input collection is never modified; a new one is returned, or nothing
//! at all if any operation in the batch fails.

use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::overrides::OverrideBatch;
use crate::work::{CollectionError, ConstructionError, CurveKind, CurveWork, Identity, WorkCollection, WorkKind};

/// What to do with an addition whose identity is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateAdditionPolicy {
    /// Keep the existing entity and drop the addition.
    #[default]
    Ignore,
    /// Fail the whole batch.
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileOptions {
    pub duplicate_additions: DuplicateAdditionPolicy,
}

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("cannot construct {kind} `{identity}`: {source}")]
    Construction {
        kind: CurveKind,
        identity: Identity,
        #[source]
        source: ConstructionError,
    },
    #[error("addition for {kind} `{identity}` collides with an existing entity")]
    DuplicateAddition { kind: CurveKind, identity: Identity },
    #[error("reconciled {kind} collection holds `{identity}` more than once")]
    IdentityConflict { kind: CurveKind, identity: Identity },
    #[error("expected a {expected} collection, got {found}")]
    KindMismatch { expected: CurveKind, found: CurveKind },
}

/// Identity test shared by the edit and removal paths.
#[must_use]
pub fn matches<K: WorkKind>(entity: &CurveWork, identity: &Identity) -> bool {
    K::identity_of(entity) == identity
}

pub fn reconcile<K: WorkKind>(
    existing: &WorkCollection,
    batch: &OverrideBatch<K::Seed>,
) -> Result<WorkCollection, ReconcileError> {
    reconcile_with_options::<K>(existing, batch, ReconcileOptions::default())
}

/// Applies `batch` to `existing` and returns the resulting collection.
///
/// When several edits match one entity, the last one in the batch wins.
/// A removal and an addition for the same identity yield a freshly
/// constructed entity.
pub fn reconcile_with_options<K: WorkKind>(
    existing: &WorkCollection,
    batch: &OverrideBatch<K::Seed>,
    options: ReconcileOptions,
) -> Result<WorkCollection, ReconcileError> {
    if existing.kind() != K::KIND {
        return Err(ReconcileError::KindMismatch {
            expected: K::KIND,
            found: existing.kind(),
        });
    }

    let mut out = WorkCollection::new(K::KIND);
    let (mut removed, mut edited, mut added, mut ignored) = (0usize, 0usize, 0usize, 0usize);

    for entity in existing {
        if batch
            .removals
            .iter()
            .any(|removal| matches::<K>(entity, &removal.identity))
        {
            debug!("{} `{}` removed", K::KIND, entity.id());
            removed += 1;
            continue;
        }

        let entity = match batch
            .edits
            .iter()
            .rev()
            .find(|edit| matches::<K>(entity, &edit.identity))
        {
            Some(edit) => {
                edited += 1;
                K::apply_edit(entity.clone(), edit).map_err(|source| ReconcileError::Construction {
                    kind: K::KIND,
                    identity: edit.identity.clone(),
                    source,
                })?
            }
            None => entity.clone(),
        };

        insert_checked::<K>(&mut out, entity)?;
    }

    for addition in &batch.additions {
        if out.contains(&addition.identity) {
            match options.duplicate_additions {
                DuplicateAdditionPolicy::Ignore => {
                    debug!("{} `{}` already exists; addition ignored", K::KIND, addition.identity);
                    ignored += 1;
                    continue;
                }
                DuplicateAdditionPolicy::Reject => {
                    return Err(ReconcileError::DuplicateAddition {
                        kind: K::KIND,
                        identity: addition.identity.clone(),
                    });
                }
            }
        }

        let entity = K::construct(addition).map_err(|source| ReconcileError::Construction {
            kind: K::KIND,
            identity: addition.identity.clone(),
            source,
        })?;
        insert_checked::<K>(&mut out, entity)?;
        added += 1;
    }

    let unmatched_removals = batch.removals.len().saturating_sub(removed);
    let unmatched_edits = batch
        .edits
        .iter()
        .filter(|edit| !existing.iter().any(|entity| matches::<K>(entity, &edit.identity)))
        .count();
    if unmatched_removals > 0 || unmatched_edits > 0 {
        debug!(
            "{}: {unmatched_removals} removals and {unmatched_edits} edits matched nothing",
            K::KIND
        );
    }

    debug!(
        "reconciled {}: {} entities ({removed} removed, {edited} edited, {added} added, {ignored} ignored)",
        K::KIND,
        out.len()
    );
    Ok(out)
}

fn insert_checked<K: WorkKind>(out: &mut WorkCollection, entity: CurveWork) -> Result<(), ReconcileError> {
    match out.insert(entity) {
        Ok(_) => Ok(()),
        Err(CollectionError::DuplicateIdentity { identity }) => {
            error!("{} `{identity}` produced twice during reconciliation", K::KIND);
            Err(ReconcileError::IdentityConflict {
                kind: K::KIND,
                identity,
            })
        }
        Err(CollectionError::KindMismatch { expected, found }) => {
            error!("{} capability built a {found} curve", K::KIND);
            Err(ReconcileError::KindMismatch { expected, found })
        }
    }
}
