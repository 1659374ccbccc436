//! Host-supplied override batches.
//!
//! Each curve kind receives its own [`OverrideBatch`] of additions, edits and
//! removals. Batches deserialize from partial JSON; missing lists are empty.

use serde::{Deserialize, Serialize};

use crate::work::{ArcSeed, BezierSeed, CircleSeed, Identity, LineSeed, PolylineSeed};

/// Request to create an entity for `identity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Addition<S> {
    /// Host-side id of the addition; kept on the entity as its source id.
    pub id: Identity,
    pub identity: Identity,
    pub value: S,
}

impl<S> Addition<S> {
    pub fn new(id: impl Into<Identity>, identity: impl Into<Identity>, value: S) -> Self {
        Self {
            id: id.into(),
            identity: identity.into(),
            value,
        }
    }

    /// Addition whose id and identity are the same token.
    pub fn named(name: impl Into<Identity>, value: S) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            identity: name,
            value,
        }
    }
}

/// Request to replace the curve of the entity matching `identity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edit<S> {
    pub identity: Identity,
    pub value: S,
}

impl<S> Edit<S> {
    pub fn new(identity: impl Into<Identity>, value: S) -> Self {
        Self {
            identity: identity.into(),
            value,
        }
    }
}

/// Request to delete the entity matching `identity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Removal {
    pub identity: Identity,
}

impl Removal {
    pub fn new(identity: impl Into<Identity>) -> Self {
        Self {
            identity: identity.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, bound(deserialize = "S: Deserialize<'de>"))]
pub struct OverrideBatch<S> {
    pub additions: Vec<Addition<S>>,
    pub removals: Vec<Removal>,
    pub edits: Vec<Edit<S>>,
}

impl<S> Default for OverrideBatch<S> {
    fn default() -> Self {
        Self {
            additions: Vec::new(),
            removals: Vec::new(),
            edits: Vec::new(),
        }
    }
}

impl<S> OverrideBatch<S> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty() && self.edits.is_empty()
    }

    #[must_use]
    pub fn with_addition(mut self, addition: Addition<S>) -> Self {
        self.additions.push(addition);
        self
    }

    #[must_use]
    pub fn with_edit(mut self, edit: Edit<S>) -> Self {
        self.edits.push(edit);
        self
    }

    #[must_use]
    pub fn with_removal(mut self, removal: Removal) -> Self {
        self.removals.push(removal);
        self
    }
}

/// One batch per curve kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveOverrides {
    pub circles: OverrideBatch<CircleSeed>,
    pub arcs: OverrideBatch<ArcSeed>,
    pub beziers: OverrideBatch<BezierSeed>,
    pub lines: OverrideBatch<LineSeed>,
    pub polylines: OverrideBatch<PolylineSeed>,
}

impl CurveOverrides {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.circles.is_empty()
            && self.arcs.is_empty()
            && self.beziers.is_empty()
            && self.lines.is_empty()
            && self.polylines.is_empty()
    }
}
