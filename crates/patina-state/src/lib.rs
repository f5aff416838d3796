//! # Patina State
//!
//! Material property state model for the Patina toolkit.
//!
//! This crate provides the value types and rules for editing shader
//! materials without touching a rendering API:
//! - **Properties**: tagged property records (numbers, colors, vectors,
//!   matrices, texture references, keyword flags)
//! - **Snapshots**: the complete externally-observable configuration of
//!   one material, as a plain value type
//! - **Shader families**: per-family mode rules that cascade a logical
//!   edit (surface type, blend mode, alpha clipping, ...) into a
//!   consistent set of keywords, tags, queue, and blend state
//! - **Revertable editing**: original/working snapshot pairs with
//!   apply-edit and reset-to-original semantics
//!
//! Everything here is synchronous and free of I/O. A host (engine,
//! editor UI) captures live materials into snapshots and applies edited
//! snapshots back through the [`MaterialHost`] trait.

pub mod family;
pub mod host;
pub mod property;
pub mod revert;
pub mod snapshot;

pub use family::{
    BlendMode, EmissionGiMode, FamilyKind, ModeChange, RenderFace, ShaderFamilyRegistry,
    StateError, StateResult, SurfaceType, TextureSlot, WorkflowMode, apply_mode,
};
pub use host::{MaterialHost, MemoryHost};
pub use property::{PropertyKind, PropertyRecord, PropertyValue};
pub use revert::{EditError, MaterialId, RevertableMaterialSet, TrackError};
pub use snapshot::{GiFlags, MaterialSnapshot};
