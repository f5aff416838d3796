//! Material Snapshots
//!
//! A snapshot is the complete externally-observable configuration of one
//! material: its shader identity, property records, enabled keyword set,
//! override tags, per-pass enable flags, render queue, global-illumination
//! flags, and main-texture UV transform.
//!
//! Snapshots are plain values. Capturing a live material and applying a
//! snapshot back are host responsibilities (see [`crate::host`]).

use bitflags::bitflags;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::property::{PropertyKind, PropertyRecord, PropertyValue};

bitflags! {
    /// Global-illumination flag word for emissive materials.
    ///
    /// The integer values are configuration constants for the target host's
    /// GI flag enum, kept in one place so a host with a different mapping
    /// can be accommodated without touching the emission rules.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct GiFlags: u32 {
        /// Emission contributes to realtime GI
        const REALTIME_EMISSIVE = 1;
        /// Emission contributes to baked GI
        const BAKED_EMISSIVE = 2;
        /// Emission is treated as black by the GI system
        const EMISSIVE_IS_BLACK = 4;
    }
}

impl GiFlags {
    /// Flag word for a material with emission disabled entirely
    pub const EMISSION_DISABLED: GiFlags = GiFlags::EMISSIVE_IS_BLACK;

    /// Flag word for baked emission (baked contribution, black at runtime)
    pub const BAKED: GiFlags = GiFlags::BAKED_EMISSIVE.union(GiFlags::EMISSIVE_IS_BLACK);
}

impl Default for GiFlags {
    fn default() -> Self {
        GiFlags::EMISSION_DISABLED
    }
}

/// Complete serializable state of one material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSnapshot {
    /// Shader family identity; changed only by an explicit shader switch
    pub shader: String,
    /// Property records in shader declaration order
    pub properties: Vec<PropertyRecord>,
    /// Full enabled-keyword set, used for shader variant selection
    pub keywords: BTreeSet<String>,
    /// Override tags (RenderType, LightMode, Queue)
    pub tags: BTreeMap<String, String>,
    /// Per-render-pass enable flags
    pub passes: BTreeMap<String, bool>,
    /// Render queue
    pub render_queue: i32,
    /// Global-illumination flags
    pub gi_flags: GiFlags,
    /// Whether GI treats the material as double sided
    pub double_sided_gi: bool,
    /// Main texture UV tiling
    pub uv_tiling: Vec2,
    /// Main texture UV offset
    pub uv_offset: Vec2,
}

impl MaterialSnapshot {
    /// Create an empty snapshot for the given shader identity
    pub fn new(shader: impl Into<String>) -> Self {
        Self {
            shader: shader.into(),
            properties: Vec::new(),
            keywords: BTreeSet::new(),
            tags: BTreeMap::new(),
            passes: BTreeMap::new(),
            render_queue: 2000,
            gi_flags: GiFlags::EMISSION_DISABLED,
            double_sided_gi: false,
            uv_tiling: Vec2::ONE,
            uv_offset: Vec2::ZERO,
        }
    }

    /// Set a property, upserting on the `(name, kind)` pair.
    ///
    /// An existing record with the same name and kind is overwritten in
    /// place, preserving its position in the sequence; otherwise the record
    /// is appended. This maintains the at-most-one-per-`(name, kind)`
    /// invariant.
    pub fn set_property(&mut self, name: impl Into<String>, value: PropertyValue) {
        let name = name.into();
        let kind = value.kind();
        if let Some(rec) = self
            .properties
            .iter_mut()
            .find(|r| r.name == name && r.kind() == kind)
        {
            rec.value = value;
        } else {
            self.properties.push(PropertyRecord::new(name, value));
        }
    }

    /// Get a property value by name and kind
    pub fn property(&self, name: &str, kind: PropertyKind) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|r| r.name == name && r.kind() == kind)
            .map(|r| &r.value)
    }

    /// Get a scalar property
    pub fn number(&self, name: &str) -> Option<f32> {
        match self.property(name, PropertyKind::Number) {
            Some(PropertyValue::Number(v)) => Some(*v),
            _ => None,
        }
    }

    /// Set a scalar property
    pub fn set_number(&mut self, name: impl Into<String>, value: f32) {
        self.set_property(name, PropertyValue::Number(value));
    }

    /// Get a scalar property truncated to an integer (0 when absent)
    pub fn int(&self, name: &str) -> i32 {
        self.number(name).map(|v| v as i32).unwrap_or(0)
    }

    /// Set a scalar property from an integer
    pub fn set_int(&mut self, name: impl Into<String>, value: i32) {
        self.set_number(name, value as f32);
    }

    /// Test whether a keyword is enabled
    pub fn has_keyword(&self, keyword: &str) -> bool {
        self.keywords.contains(keyword)
    }

    /// Enable a keyword
    pub fn enable_keyword(&mut self, keyword: impl Into<String>) {
        self.keywords.insert(keyword.into());
    }

    /// Disable a keyword
    pub fn disable_keyword(&mut self, keyword: &str) {
        self.keywords.remove(keyword);
    }

    /// Enable or disable a keyword
    pub fn set_keyword(&mut self, keyword: &str, enabled: bool) {
        if enabled {
            self.enable_keyword(keyword);
        } else {
            self.disable_keyword(keyword);
        }
    }

    /// Get an override tag value
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(String::as_str)
    }

    /// Set an override tag
    pub fn set_tag(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(name.into(), value.into());
    }

    /// Remove an override tag
    pub fn clear_tag(&mut self, name: &str) {
        self.tags.remove(name);
    }

    /// Enable or disable a render pass
    pub fn set_pass_enabled(&mut self, pass: impl Into<String>, enabled: bool) {
        self.passes.insert(pass.into(), enabled);
    }

    /// Whether a render pass is enabled (true when never set)
    pub fn pass_enabled(&self, pass: &str) -> bool {
        self.passes.get(pass).copied().unwrap_or(true)
    }

    /// Order-insensitive equality on properties, exact on everything else.
    ///
    /// Property sequence order matters for serialization byte layout but
    /// not for whether two snapshots describe the same logical material.
    pub fn semantic_eq(&self, other: &Self) -> bool {
        if self.shader != other.shader
            || self.keywords != other.keywords
            || self.tags != other.tags
            || self.passes != other.passes
            || self.render_queue != other.render_queue
            || self.gi_flags != other.gi_flags
            || self.double_sided_gi != other.double_sided_gi
            || self.uv_tiling != other.uv_tiling
            || self.uv_offset != other.uv_offset
            || self.properties.len() != other.properties.len()
        {
            return false;
        }
        self.properties.iter().all(|rec| {
            other.property(&rec.name, rec.kind()) == Some(&rec.value)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn test_set_property_upserts_on_name_and_kind() {
        let mut snap = MaterialSnapshot::new("Universal Render Pipeline/Lit");
        snap.set_number("_Cutoff", 0.5);
        snap.set_number("_Surface", 0.0);
        snap.set_number("_Cutoff", 0.75);

        assert_eq!(snap.properties.len(), 2);
        assert_eq!(snap.properties[0].name, "_Cutoff");
        assert_eq!(snap.number("_Cutoff"), Some(0.75));
    }

    #[test]
    fn test_same_name_different_kind_coexist() {
        let mut snap = MaterialSnapshot::new("Universal Render Pipeline/Lit");
        snap.set_number("_BaseColor", 1.0);
        snap.set_property("_BaseColor", PropertyValue::Color(Vec4::ONE));

        assert_eq!(snap.properties.len(), 2);
        assert_eq!(snap.number("_BaseColor"), Some(1.0));
        assert_eq!(
            snap.property("_BaseColor", PropertyKind::Color),
            Some(&PropertyValue::Color(Vec4::ONE))
        );
    }

    #[test]
    fn test_keyword_set_semantics() {
        let mut snap = MaterialSnapshot::new("Universal Render Pipeline/Lit");
        snap.enable_keyword("_EMISSION");
        snap.enable_keyword("_EMISSION");
        assert!(snap.has_keyword("_EMISSION"));
        assert_eq!(snap.keywords.len(), 1);

        snap.disable_keyword("_EMISSION");
        assert!(!snap.has_keyword("_EMISSION"));
    }

    #[test]
    fn test_semantic_eq_ignores_property_order() {
        let mut a = MaterialSnapshot::new("Universal Render Pipeline/Lit");
        a.set_number("_Surface", 1.0);
        a.set_property("_BaseColor", PropertyValue::Color(Vec4::ONE));

        let mut b = MaterialSnapshot::new("Universal Render Pipeline/Lit");
        b.set_property("_BaseColor", PropertyValue::Color(Vec4::ONE));
        b.set_number("_Surface", 1.0);

        assert_ne!(a, b);
        assert!(a.semantic_eq(&b));
    }

    #[test]
    fn test_semantic_eq_detects_value_difference() {
        let mut a = MaterialSnapshot::new("Universal Render Pipeline/Lit");
        a.set_number("_Cutoff", 0.5);
        let mut b = a.clone();
        b.set_number("_Cutoff", 0.6);
        assert!(!a.semantic_eq(&b));

        let mut c = a.clone();
        c.render_queue = 2450;
        assert!(!a.semantic_eq(&c));
    }

    #[test]
    fn test_gi_flag_constants() {
        assert_eq!(GiFlags::EMISSION_DISABLED.bits(), 4);
        assert_eq!(GiFlags::BAKED.bits(), 6);
        assert_eq!(GiFlags::REALTIME_EMISSIVE.bits(), 1);
        assert_eq!(GiFlags::empty().bits(), 0);
    }

    #[test]
    fn test_json_round_trip() {
        let mut snap = MaterialSnapshot::new("Universal Render Pipeline/Lit");
        snap.set_number("_Surface", 1.0);
        snap.set_property("_BaseColor", PropertyValue::Color(Vec4::new(1.0, 0.5, 0.0, 1.0)));
        snap.enable_keyword("_EMISSION");
        snap.set_tag("RenderType", "Transparent");
        snap.gi_flags = GiFlags::REALTIME_EMISSIVE;

        let json = serde_json::to_string(&snap).unwrap();
        let back: MaterialSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }

    #[test]
    fn test_pass_enabled_defaults_true() {
        let mut snap = MaterialSnapshot::new("Universal Render Pipeline/Lit");
        assert!(snap.pass_enabled("DepthOnly"));
        snap.set_pass_enabled("DepthOnly", false);
        assert!(!snap.pass_enabled("DepthOnly"));
    }
}
