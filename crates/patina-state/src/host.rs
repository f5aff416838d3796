//! Host Collaborator Interface
//!
//! The editor/engine layer owns the live materials; this crate only sees
//! snapshots. [`MaterialHost`] is the seam: the host enumerates a live
//! material's state into a [`MaterialSnapshot`], writes an edited snapshot
//! back through its own material API, and answers whether a shader name
//! resolves to something it can load.
//!
//! [`MemoryHost`] is an in-memory implementation used by tests and the
//! command-line tool.

use ahash::AHashMap;
use thiserror::Error;

use crate::revert::MaterialId;
use crate::snapshot::MaterialSnapshot;

/// What the excluded UI/engine layer must supply to the core
pub trait MaterialHost {
    type Error: std::error::Error;

    /// Capture a live material's current state as a snapshot
    fn capture(&self, id: MaterialId) -> Result<MaterialSnapshot, Self::Error>;

    /// Write a snapshot back onto a live material
    fn apply(&mut self, id: MaterialId, snapshot: &MaterialSnapshot) -> Result<(), Self::Error>;

    /// Whether the host can resolve this shader identity
    fn resolve_shader(&self, shader: &str) -> bool;
}

/// Errors from the in-memory host
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryHostError {
    #[error("no material stored under id {0}")]
    UnknownMaterial(MaterialId),

    #[error("shader '{snapshot}' does not match stored material shader '{stored}'")]
    ShaderMismatch { snapshot: String, stored: String },
}

/// Snapshot-backed host for tests and offline tooling
#[derive(Default)]
pub struct MemoryHost {
    materials: AHashMap<MaterialId, MaterialSnapshot>,
    shaders: Vec<String>,
}

impl MemoryHost {
    /// Create an empty host
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a material under an id
    pub fn insert(&mut self, id: MaterialId, snapshot: MaterialSnapshot) {
        if !self.shaders.contains(&snapshot.shader) {
            self.shaders.push(snapshot.shader.clone());
        }
        self.materials.insert(id, snapshot);
    }

    /// Register a resolvable shader name without storing a material
    pub fn register_shader(&mut self, shader: impl Into<String>) {
        let shader = shader.into();
        if !self.shaders.contains(&shader) {
            self.shaders.push(shader);
        }
    }
}

impl MaterialHost for MemoryHost {
    type Error = MemoryHostError;

    fn capture(&self, id: MaterialId) -> Result<MaterialSnapshot, Self::Error> {
        self.materials
            .get(&id)
            .cloned()
            .ok_or(MemoryHostError::UnknownMaterial(id))
    }

    fn apply(&mut self, id: MaterialId, snapshot: &MaterialSnapshot) -> Result<(), Self::Error> {
        let stored = self
            .materials
            .get_mut(&id)
            .ok_or(MemoryHostError::UnknownMaterial(id))?;
        if stored.shader != snapshot.shader {
            return Err(MemoryHostError::ShaderMismatch {
                snapshot: snapshot.shader.clone(),
                stored: stored.shader.clone(),
            });
        }
        *stored = snapshot.clone();
        Ok(())
    }

    fn resolve_shader(&self, shader: &str) -> bool {
        self.shaders.iter().any(|s| s == shader)
    }
}
