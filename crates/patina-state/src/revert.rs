//! Revertable Material Set
//!
//! Owns an immutable original and a mutable working snapshot per tracked
//! material. All mutation goes through [`RevertableMaterialSet::apply_edit`]
//! and [`RevertableMaterialSet::reset`], which is what keeps the revert
//! invariant intact: no other component holds a mutable handle to either
//! copy.
//!
//! The set does no locking of its own. A multi-threaded host must
//! synchronize access per material id externally.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::family::StateError;
use crate::snapshot::MaterialSnapshot;

/// Opaque id for one tracked material, assigned by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaterialId(pub u64);

impl std::fmt::Display for MaterialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Tracking errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackError {
    #[error("material {0} is already tracked")]
    AlreadyTracked(MaterialId),

    #[error("material {0} is not tracked")]
    NotTracked(MaterialId),
}

/// Errors from [`RevertableMaterialSet::apply_edit`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditError {
    #[error(transparent)]
    Track(#[from] TrackError),

    #[error(transparent)]
    State(#[from] StateError),
}

struct Tracked {
    original: MaterialSnapshot,
    working: MaterialSnapshot,
    dirty: bool,
}

/// Original/working snapshot pairs for a set of materials under edit
#[derive(Default)]
pub struct RevertableMaterialSet {
    materials: AHashMap<MaterialId, Tracked>,
}

impl RevertableMaterialSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a material.
    ///
    /// The snapshot becomes the immutable original; a cloned working copy
    /// receives all subsequent edits.
    pub fn track(&mut self, id: MaterialId, snapshot: MaterialSnapshot) -> Result<(), TrackError> {
        if self.materials.contains_key(&id) {
            return Err(TrackError::AlreadyTracked(id));
        }
        self.materials.insert(
            id,
            Tracked {
                working: snapshot.clone(),
                original: snapshot,
                dirty: false,
            },
        );
        Ok(())
    }

    /// Stop tracking a material, releasing both copies
    pub fn untrack(&mut self, id: MaterialId) -> Result<(), TrackError> {
        self.materials
            .remove(&id)
            .map(|_| ())
            .ok_or(TrackError::NotTracked(id))
    }

    /// Apply an edit to the working snapshot.
    ///
    /// The mutator runs on a scratch clone and is committed only when it
    /// succeeds, so a failed mode transition cannot leave the working
    /// snapshot half-mutated. Returns the new working snapshot.
    pub fn apply_edit<F>(&mut self, id: MaterialId, mutate: F) -> Result<&MaterialSnapshot, EditError>
    where
        F: FnOnce(&mut MaterialSnapshot) -> Result<(), StateError>,
    {
        let tracked = self
            .materials
            .get_mut(&id)
            .ok_or(TrackError::NotTracked(id))?;

        let mut scratch = tracked.working.clone();
        mutate(&mut scratch)?;
        tracked.working = scratch;
        tracked.dirty = true;
        Ok(&tracked.working)
    }

    /// Replace the working snapshot with a deep copy of the original
    pub fn reset(&mut self, id: MaterialId) -> Result<&MaterialSnapshot, TrackError> {
        let tracked = self
            .materials
            .get_mut(&id)
            .ok_or(TrackError::NotTracked(id))?;
        tracked.working = tracked.original.clone();
        tracked.dirty = false;
        Ok(&tracked.working)
    }

    /// Current working snapshot
    pub fn working(&self, id: MaterialId) -> Result<&MaterialSnapshot, TrackError> {
        self.materials
            .get(&id)
            .map(|t| &t.working)
            .ok_or(TrackError::NotTracked(id))
    }

    /// Originally tracked snapshot
    pub fn original(&self, id: MaterialId) -> Result<&MaterialSnapshot, TrackError> {
        self.materials
            .get(&id)
            .map(|t| &t.original)
            .ok_or(TrackError::NotTracked(id))
    }

    /// Whether the material has been edited since tracking or last reset
    pub fn is_dirty(&self, id: MaterialId) -> Result<bool, TrackError> {
        self.materials
            .get(&id)
            .map(|t| t.dirty)
            .ok_or(TrackError::NotTracked(id))
    }

    /// Ids of all tracked materials
    pub fn ids(&self) -> impl Iterator<Item = MaterialId> + '_ {
        self.materials.keys().copied()
    }

    /// Number of tracked materials
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Whether no materials are tracked
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}
