use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{CurveKind, CurveWork, Identity};

#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    #[error("identity `{identity}` is already present")]
    DuplicateIdentity { identity: Identity },
    #[error("{found} entity cannot be stored in a {expected} collection")]
    KindMismatch { expected: CurveKind, found: CurveKind },
}

/// Entities of one curve kind, stored in slots with an identity index.
///
/// Slots are assigned in insertion order and never reused, so an index
/// returned by [`WorkCollection::insert`] stays valid for the collection's
/// lifetime. At most one entity exists per identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CollectionData", into = "CollectionData")]
pub struct WorkCollection {
    kind: CurveKind,
    entities: Vec<CurveWork>,
    index: HashMap<Identity, usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CollectionData {
    kind: CurveKind,
    #[serde(default)]
    entities: Vec<CurveWork>,
}

impl TryFrom<CollectionData> for WorkCollection {
    type Error = CollectionError;

    fn try_from(data: CollectionData) -> Result<Self, Self::Error> {
        let mut collection = WorkCollection::new(data.kind);
        for entity in data.entities {
            collection.insert(entity)?;
        }
        Ok(collection)
    }
}

impl From<WorkCollection> for CollectionData {
    fn from(collection: WorkCollection) -> Self {
        Self {
            kind: collection.kind,
            entities: collection.entities,
        }
    }
}

impl WorkCollection {
    #[must_use]
    pub fn new(kind: CurveKind) -> Self {
        Self {
            kind,
            entities: Vec::new(),
            index: HashMap::new(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> CurveKind {
        self.kind
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    #[must_use]
    pub fn contains(&self, identity: &Identity) -> bool {
        self.index.contains_key(identity)
    }

    #[must_use]
    pub fn slot_of(&self, identity: &Identity) -> Option<usize> {
        self.index.get(identity).copied()
    }

    #[must_use]
    pub fn get(&self, identity: &Identity) -> Option<&CurveWork> {
        self.slot_of(identity).map(|slot| &self.entities[slot])
    }

    pub fn get_mut(&mut self, identity: &Identity) -> Option<&mut CurveWork> {
        let slot = self.slot_of(identity)?;
        self.entities.get_mut(slot)
    }

    /// Stores `entity` in a new slot and returns the slot index.
    pub fn insert(&mut self, entity: CurveWork) -> Result<usize, CollectionError> {
        if entity.kind() != self.kind {
            return Err(CollectionError::KindMismatch {
                expected: self.kind,
                found: entity.kind(),
            });
        }
        if self.index.contains_key(entity.id()) {
            return Err(CollectionError::DuplicateIdentity {
                identity: entity.id().clone(),
            });
        }

        let slot = self.entities.len();
        self.index.insert(entity.id().clone(), slot);
        self.entities.push(entity);
        Ok(slot)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CurveWork> {
        self.entities.iter()
    }

    /// Mutable access for representation updates. Identities cannot be changed
    /// through [`CurveWork`], so the index stays consistent.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, CurveWork> {
        self.entities.iter_mut()
    }

    pub(crate) fn entities_mut(&mut self) -> &mut [CurveWork] {
        &mut self.entities
    }

    pub fn identities(&self) -> impl Iterator<Item = &Identity> {
        self.entities.iter().map(CurveWork::id)
    }
}

impl<'a> IntoIterator for &'a WorkCollection {
    type Item = &'a CurveWork;
    type IntoIter = std::slice::Iter<'a, CurveWork>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter()
    }
}

impl IntoIterator for WorkCollection {
    type Item = CurveWork;
    type IntoIter = std::vec::IntoIter<CurveWork>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.into_iter()
    }
}
