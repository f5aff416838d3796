//! Shader Families
//!
//! Mode-dependency rules for the known shader families. A logical mode
//! edit (surface type, blend mode, alpha clipping, ...) cascades into a
//! consistent set of keyword, tag, render-queue, blend-factor, and pass
//! mutations on a [`MaterialSnapshot`].
//!
//! [`apply_mode`] is a pure transition function: it carries no state of
//! its own, applies atomically (a failed transition leaves the snapshot
//! untouched), and is idempotent (re-applying the current mode changes
//! nothing further).

use ahash::AHashMap;
use glam::Vec4;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::property::PropertyValue;
use crate::snapshot::{GiFlags, MaterialSnapshot};

/// State machine errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// The shader name is not registered with any family
    #[error("unsupported shader family: {0}")]
    UnsupportedShaderFamily(String),

    /// The family does not define rules for this mode
    #[error("mode '{mode}' is not supported by the {family} family")]
    UnsupportedMode {
        family: &'static str,
        mode: &'static str,
    },
}

/// Result type for state machine operations
pub type StateResult<T> = Result<T, StateError>;

/// Known shader families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FamilyKind {
    /// Universal pipeline Lit: full workflow/surface/emission rule set
    Lit,
    /// Universal pipeline Unlit: surface/blend/face/clip only
    Unlit,
    /// High-definition pipeline Lit: distinct queue, stencil, and fog rules
    HdrpLit,
}

impl FamilyKind {
    /// Family name for diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Self::Lit => "Lit",
            Self::Unlit => "Unlit",
            Self::HdrpLit => "HdrpLit",
        }
    }
}

/// Workflow mode for lit materials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowMode {
    Specular,
    Metallic,
}

/// Surface type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceType {
    Opaque,
    Transparent,
}

/// Blend mode for transparent surfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlendMode {
    Alpha,
    Premultiply,
    Additive,
    Multiply,
}

impl BlendMode {
    fn index(self) -> i32 {
        match self {
            Self::Alpha => 0,
            Self::Premultiply => 1,
            Self::Additive => 2,
            Self::Multiply => 3,
        }
    }

    fn from_index(index: i32) -> Option<Self> {
        match index {
            0 => Some(Self::Alpha),
            1 => Some(Self::Premultiply),
            2 => Some(Self::Additive),
            3 => Some(Self::Multiply),
            _ => None,
        }
    }

    // The HDRP shader uses its own index space for `_BlendMode`.
    fn hdrp_index(self) -> i32 {
        match self {
            Self::Alpha => 0,
            Self::Premultiply => 1,
            Self::Additive => 4,
            Self::Multiply => -1,
        }
    }

    fn from_hdrp_index(index: i32) -> Option<Self> {
        match index {
            0 => Some(Self::Alpha),
            1 => Some(Self::Premultiply),
            4 => Some(Self::Additive),
            _ => None,
        }
    }
}

/// Which faces get rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderFace {
    Both,
    Back,
    Front,
}

impl RenderFace {
    fn cull_index(self) -> i32 {
        match self {
            Self::Both => 0,
            Self::Back => 1,
            Self::Front => 2,
        }
    }
}

/// Emission contribution to global illumination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmissionGiMode {
    /// Emission is rendered but contributes nothing to GI
    None,
    /// Emission feeds realtime GI
    Realtime,
    /// Emission is baked into lightmaps
    Baked,
}

impl EmissionGiMode {
    /// Derive the logical mode from a raw GI flag word
    pub fn from_flags(flags: GiFlags) -> Self {
        if flags.contains(GiFlags::REALTIME_EMISSIVE) {
            Self::Realtime
        } else if flags.contains(GiFlags::BAKED_EMISSIVE) {
            Self::Baked
        } else {
            Self::None
        }
    }
}

/// Named texture slots with their dependent keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextureSlot {
    Base,
    Metallic,
    Normal,
    Occlusion,
    Emission,
    DetailMask,
}

/// One logical mode edit to apply to a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModeChange {
    Workflow(WorkflowMode),
    Surface(SurfaceType),
    Blend(BlendMode),
    Face(RenderFace),
    AlphaClip(bool),
    AlphaCutoff(f32),
    ReceiveShadows(bool),
    Emission(bool),
    EmissionGi(EmissionGiMode),
    TextureMap(TextureSlot, Option<String>),
    BaseColor(Vec4),
}

impl ModeChange {
    /// Mode name for diagnostics and CLI parsing
    pub fn name(&self) -> &'static str {
        match self {
            Self::Workflow(_) => "workflow",
            Self::Surface(_) => "surface",
            Self::Blend(_) => "blend",
            Self::Face(_) => "face",
            Self::AlphaClip(_) => "alpha-clip",
            Self::AlphaCutoff(_) => "alpha-cutoff",
            Self::ReceiveShadows(_) => "receive-shadows",
            Self::Emission(_) => "emission",
            Self::EmissionGi(_) => "emission-gi",
            Self::TextureMap(..) => "texture-map",
            Self::BaseColor(_) => "base-color",
        }
    }
}

/// Maps shader names to their family rules
#[derive(Debug, Clone)]
pub struct ShaderFamilyRegistry {
    families: AHashMap<String, FamilyKind>,
}

impl ShaderFamilyRegistry {
    /// Create a registry with the stock shader names registered
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry
    pub fn empty() -> Self {
        Self {
            families: AHashMap::new(),
        }
    }

    /// Register a shader name under a family
    pub fn register(&mut self, shader: impl Into<String>, family: FamilyKind) {
        self.families.insert(shader.into(), family);
    }

    /// Whether a shader name resolves to a family
    pub fn is_registered(&self, shader: &str) -> bool {
        self.families.contains_key(shader)
    }

    /// Resolve a shader name to its family
    pub fn resolve(&self, shader: &str) -> StateResult<FamilyKind> {
        self.families
            .get(shader)
            .copied()
            .ok_or_else(|| StateError::UnsupportedShaderFamily(shader.to_string()))
    }

    /// Resolve the snapshot's shader and apply a mode change
    pub fn apply(&self, snapshot: &mut MaterialSnapshot, change: ModeChange) -> StateResult<()> {
        let family = self.resolve(&snapshot.shader)?;
        apply_mode(snapshot, family, change)
    }
}

impl Default for ShaderFamilyRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("Universal Render Pipeline/Lit", FamilyKind::Lit);
        registry.register("Universal Render Pipeline/Unlit", FamilyKind::Unlit);
        registry.register("HDRP/Lit", FamilyKind::HdrpLit);
        registry
    }
}

const KW_SURFACE_TRANSPARENT: &str = "_SURFACE_TYPE_TRANSPARENT";
const KW_ALPHA_PREMULTIPLY: &str = "_ALPHAPREMULTIPLY_ON";
const KW_ALPHA_MODULATE: &str = "_ALPHAMODULATE_ON";
const KW_ALPHA_TEST: &str = "_ALPHATEST_ON";
const KW_RECEIVE_SHADOWS_OFF: &str = "_RECEIVE_SHADOWS_OFF";
const KW_SPECULAR_SETUP: &str = "_SPECULAR_SETUP";
const KW_METALLIC_SPECGLOSS_MAP: &str = "_METALLICSPECGLOSSMAP";
const KW_OCCLUSION_MAP: &str = "_OCCLUSIONMAP";
const KW_EMISSION: &str = "_EMISSION";
const KW_FOG_ON_TRANSPARENT: &str = "_ENABLE_FOG_ON_TRANSPARENT";

/// Apply one mode change to a snapshot under a family's rules.
///
/// The transition runs on a scratch copy and commits only on success, so
/// an unsupported mode cannot leave the snapshot half-mutated.
pub fn apply_mode(
    snapshot: &mut MaterialSnapshot,
    family: FamilyKind,
    change: ModeChange,
) -> StateResult<()> {
    let mut scratch = snapshot.clone();
    match family {
        FamilyKind::Lit => apply_lit(&mut scratch, change)?,
        FamilyKind::Unlit => apply_unlit(&mut scratch, change)?,
        FamilyKind::HdrpLit => apply_hdrp_lit(&mut scratch, change)?,
    }
    *snapshot = scratch;
    Ok(())
}

fn unsupported(family: FamilyKind, change: &ModeChange) -> StateError {
    StateError::UnsupportedMode {
        family: family.name(),
        mode: change.name(),
    }
}

fn apply_lit(s: &mut MaterialSnapshot, change: ModeChange) -> StateResult<()> {
    match change {
        ModeChange::Workflow(mode) => lit_set_workflow(s, mode),
        ModeChange::Surface(mode) => lit_set_surface(s, mode),
        ModeChange::Blend(mode) => lit_set_blend(s, mode),
        ModeChange::Face(mode) => lit_set_face(s, mode),
        ModeChange::AlphaClip(on) => lit_set_alpha_clip(s, on),
        ModeChange::AlphaCutoff(threshold) => s.set_number("_Cutoff", threshold),
        ModeChange::ReceiveShadows(on) => set_receive_shadows(s, on),
        ModeChange::Emission(on) => set_emission(s, on),
        ModeChange::EmissionGi(mode) => set_emission_gi(s, mode),
        ModeChange::TextureMap(slot, handle) => set_texture_map(s, slot, handle),
        ModeChange::BaseColor(color) => {
            s.set_property("_BaseColor", PropertyValue::Color(color));
            s.set_property("_Color", PropertyValue::Color(color));
        }
    }
    Ok(())
}

fn apply_unlit(s: &mut MaterialSnapshot, change: ModeChange) -> StateResult<()> {
    match change {
        ModeChange::Surface(mode) => lit_set_surface(s, mode),
        ModeChange::Blend(mode) => lit_set_blend(s, mode),
        ModeChange::Face(mode) => lit_set_face(s, mode),
        ModeChange::AlphaClip(on) => lit_set_alpha_clip(s, on),
        ModeChange::AlphaCutoff(threshold) => s.set_number("_Cutoff", threshold),
        ModeChange::TextureMap(TextureSlot::Base, handle) => {
            set_texture_map(s, TextureSlot::Base, handle)
        }
        ModeChange::BaseColor(color) => {
            s.set_property("_BaseColor", PropertyValue::Color(color));
            s.set_property("_Color", PropertyValue::Color(color));
        }
        other => return Err(unsupported(FamilyKind::Unlit, &other)),
    }
    Ok(())
}

fn apply_hdrp_lit(s: &mut MaterialSnapshot, change: ModeChange) -> StateResult<()> {
    match change {
        ModeChange::Surface(mode) => hdrp_set_surface(s, mode),
        ModeChange::Blend(mode) => hdrp_set_blend(s, mode)?,
        ModeChange::Face(mode) => hdrp_set_face(s, mode)?,
        ModeChange::AlphaClip(on) => hdrp_set_alpha_clip(s, on),
        ModeChange::AlphaCutoff(threshold) => s.set_number("_Cutoff", threshold),
        ModeChange::ReceiveShadows(on) => set_receive_shadows(s, on),
        ModeChange::Emission(on) => set_emission(s, on),
        ModeChange::EmissionGi(mode) => set_emission_gi(s, mode),
        ModeChange::TextureMap(slot, handle) => set_texture_map(s, slot, handle),
        ModeChange::BaseColor(color) => {
            s.set_property("_BaseColor", PropertyValue::Color(color));
        }
        other => return Err(unsupported(FamilyKind::HdrpLit, &other)),
    }
    Ok(())
}

fn lit_set_workflow(s: &mut MaterialSnapshot, mode: WorkflowMode) {
    match mode {
        WorkflowMode::Specular => {
            s.set_int("_WorkflowMode", 0);
            s.enable_keyword(KW_SPECULAR_SETUP);
            s.enable_keyword(KW_METALLIC_SPECGLOSS_MAP);
        }
        WorkflowMode::Metallic => {
            s.set_int("_WorkflowMode", 1);
            s.disable_keyword(KW_SPECULAR_SETUP);
            s.disable_keyword(KW_METALLIC_SPECGLOSS_MAP);
        }
    }
}

fn lit_set_surface(s: &mut MaterialSnapshot, mode: SurfaceType) {
    match mode {
        SurfaceType::Opaque => {
            s.set_int("_Surface", 0);
            s.set_tag("RenderType", "Opaque");
            s.disable_keyword(KW_SURFACE_TRANSPARENT);
            s.disable_keyword(KW_ALPHA_PREMULTIPLY);
            s.disable_keyword(KW_ALPHA_MODULATE);
            s.render_queue = 2000;

            s.set_int("_ZWrite", 1);
            s.set_int("_DstBlend", 0);
            s.set_int("_DstBlendAlpha", 0);
            s.set_int("_SrcBlend", 1);
            s.set_int("_SrcBlendAlpha", 1);

            s.set_pass_enabled("DepthOnly", true);
            s.set_pass_enabled("SHADOWCASTER", true);
        }
        SurfaceType::Transparent => {
            s.set_int("_Surface", 1);
            s.set_tag("RenderType", "Transparent");
            s.enable_keyword(KW_SURFACE_TRANSPARENT);
            s.render_queue = 3000;

            s.set_int("_ZWrite", 0);

            s.set_pass_enabled("DepthOnly", false);
            s.set_pass_enabled("SHADOWCASTER", false);

            // Blend factors depend on the surface type, so switching to
            // transparent must re-derive them from the stored blend mode.
            let blend = BlendMode::from_index(s.int("_Blend")).unwrap_or(BlendMode::Alpha);
            lit_set_blend(s, blend);
        }
    }

    // Alpha clipping chooses its tag and queue based on the surface type.
    lit_set_alpha_clip(s, s.int("_AlphaClip") == 1);
}

fn lit_set_blend(s: &mut MaterialSnapshot, mode: BlendMode) {
    s.set_int("_Blend", mode.index());

    match mode {
        BlendMode::Alpha => {
            s.enable_keyword(KW_ALPHA_PREMULTIPLY);
            s.disable_keyword(KW_ALPHA_MODULATE);
            s.set_int("_DstBlend", 10);
            s.set_int("_DstBlendAlpha", 10);
            s.set_int("_SrcBlend", 1);
            s.set_int("_SrcBlendAlpha", 1);
        }
        BlendMode::Premultiply => {
            s.disable_keyword(KW_ALPHA_PREMULTIPLY);
            s.disable_keyword(KW_ALPHA_MODULATE);
            s.set_int("_DstBlend", 10);
            s.set_int("_DstBlendAlpha", 10);
            s.set_int("_SrcBlend", 1);
            s.set_int("_SrcBlendAlpha", 1);
        }
        BlendMode::Additive => {
            s.enable_keyword(KW_ALPHA_PREMULTIPLY);
            s.disable_keyword(KW_ALPHA_MODULATE);
            s.set_int("_DstBlend", 1);
            s.set_int("_DstBlendAlpha", 1);
            s.set_int("_SrcBlend", 1);
            s.set_int("_SrcBlendAlpha", 1);
        }
        BlendMode::Multiply => {
            s.disable_keyword(KW_ALPHA_PREMULTIPLY);
            s.enable_keyword(KW_ALPHA_MODULATE);
            s.set_int("_DstBlend", 0);
            s.set_int("_DstBlendAlpha", 1);
            s.set_int("_SrcBlend", 2);
            s.set_int("_SrcBlendAlpha", 0);
        }
    }
}

fn lit_set_face(s: &mut MaterialSnapshot, mode: RenderFace) {
    s.set_int("_Cull", mode.cull_index());
    s.double_sided_gi = matches!(mode, RenderFace::Both | RenderFace::Back);
}

fn lit_set_alpha_clip(s: &mut MaterialSnapshot, on: bool) {
    let opaque = s.int("_Surface") == 0;
    if on {
        if opaque {
            s.set_tag("RenderType", "TransparentCutout");
            s.set_int("_AlphaToMask", 1);
            s.render_queue = 2450;
        }
        s.enable_keyword(KW_ALPHA_TEST);
        s.set_int("_AlphaClip", 1);
    } else {
        if opaque {
            s.set_tag("RenderType", "Opaque");
            s.render_queue = 2000;
        }
        s.disable_keyword(KW_ALPHA_TEST);
        s.set_int("_AlphaClip", 0);
        s.set_int("_AlphaToMask", 0);
    }
}

fn hdrp_set_surface(s: &mut MaterialSnapshot, mode: SurfaceType) {
    match mode {
        SurfaceType::Opaque => {
            s.set_int("_Surface", 0);
            s.clear_tag("RenderType");
            s.disable_keyword(KW_FOG_ON_TRANSPARENT);
            s.disable_keyword(KW_SURFACE_TRANSPARENT);
            s.render_queue = 2225;

            s.set_int("_AlphaDstBlend", 0);
            s.set_int("_DstBlend", 0);
            s.set_int("_DstBlend2", 0);
            s.set_int("_StencilRefDepth", 8);
            s.set_int("_StencilRefGBuffer", 10);
            s.set_int("_StencilRefMV", 40);
            s.set_int("_ZTestDepthEqualForOpaque", 3);
            s.set_int("_ZWrite", 1);
        }
        SurfaceType::Transparent => {
            s.set_int("_Surface", 1);
            s.set_tag("RenderType", "Transparent");
            s.enable_keyword(KW_FOG_ON_TRANSPARENT);
            s.enable_keyword(KW_SURFACE_TRANSPARENT);
            s.render_queue = 3000;

            s.set_int("_DstBlend2", 10);
            s.set_int("_StencilRefDepth", 0);
            s.set_int("_StencilRefGBuffer", 2);
            s.set_int("_StencilRefMV", 32);
            s.set_int("_ZTestDepthEqualForOpaque", 4);
            s.set_int("_ZWrite", 0);

            let blend =
                BlendMode::from_hdrp_index(s.int("_BlendMode")).unwrap_or(BlendMode::Alpha);
            hdrp_apply_blend(s, blend);
        }
    }
}

fn hdrp_set_blend(s: &mut MaterialSnapshot, mode: BlendMode) -> StateResult<()> {
    if mode == BlendMode::Multiply {
        return Err(StateError::UnsupportedMode {
            family: FamilyKind::HdrpLit.name(),
            mode: "blend=multiply",
        });
    }
    hdrp_apply_blend(s, mode);
    Ok(())
}

// Only called with modes that exist in the HDRP index space.
fn hdrp_apply_blend(s: &mut MaterialSnapshot, mode: BlendMode) {
    s.set_int("_BlendMode", mode.hdrp_index());

    match mode {
        BlendMode::Alpha | BlendMode::Additive => {
            s.set_int("_AlphaDstBlend", 10);
            s.set_int("_DstBlend", 10);
        }
        BlendMode::Premultiply | BlendMode::Multiply => {
            s.set_int("_AlphaDstBlend", 1);
            s.set_int("_DstBlend", 1);
        }
    }
}

fn hdrp_set_face(s: &mut MaterialSnapshot, mode: RenderFace) -> StateResult<()> {
    let cull = match mode {
        RenderFace::Front => 1,
        RenderFace::Back => 2,
        RenderFace::Both => {
            return Err(StateError::UnsupportedMode {
                family: FamilyKind::HdrpLit.name(),
                mode: "face=both",
            });
        }
    };
    s.set_int("_CullMode", cull);
    s.set_int("_CullModeForward", cull);
    s.set_int("_OpaqueCullMode", cull);
    s.set_int("_TransparentCullMode", cull);
    Ok(())
}

fn hdrp_set_alpha_clip(s: &mut MaterialSnapshot, on: bool) {
    let opaque = s.int("_Surface") == 0;
    if on {
        if opaque {
            s.set_tag("RenderType", "TransparentCutout");
            s.set_int("_AlphaToMask", 1);
        }
        s.enable_keyword(KW_ALPHA_TEST);
        s.render_queue = 2450;
        s.set_int("_AlphaClip", 1);
    } else {
        if opaque {
            s.set_tag("RenderType", "Opaque");
            s.set_int("_AlphaToMask", 0);
        }
        s.disable_keyword(KW_ALPHA_TEST);
        s.render_queue = 2000;
        s.set_int("_AlphaClip", 0);
    }
}

fn set_receive_shadows(s: &mut MaterialSnapshot, on: bool) {
    s.set_int("_ReceiveShadows", if on { 1 } else { 0 });
    s.set_keyword(KW_RECEIVE_SHADOWS_OFF, !on);
}

fn set_emission(s: &mut MaterialSnapshot, on: bool) {
    if on {
        let mode = EmissionGiMode::from_flags(s.gi_flags);
        set_emission_gi(s, mode);
    } else {
        s.disable_keyword(KW_EMISSION);
        s.gi_flags = GiFlags::EMISSION_DISABLED;
    }
}

fn set_emission_gi(s: &mut MaterialSnapshot, mode: EmissionGiMode) {
    match mode {
        EmissionGiMode::Realtime => {
            s.enable_keyword(KW_EMISSION);
            s.gi_flags = GiFlags::REALTIME_EMISSIVE;
        }
        EmissionGiMode::Baked => {
            s.disable_keyword(KW_EMISSION);
            s.gi_flags = GiFlags::BAKED;
        }
        EmissionGiMode::None => {
            s.enable_keyword(KW_EMISSION);
            s.gi_flags = GiFlags::empty();
        }
    }
}

fn set_texture_map(s: &mut MaterialSnapshot, slot: TextureSlot, handle: Option<String>) {
    let bound = handle.is_some();
    match slot {
        TextureSlot::Base => {
            s.set_property("_BaseMap", PropertyValue::Texture(handle.clone()));
            s.set_property("_MainTex", PropertyValue::Texture(handle));
        }
        TextureSlot::Metallic => {
            s.set_property("_MetallicGlossMap", PropertyValue::Texture(handle));
            s.set_keyword(KW_METALLIC_SPECGLOSS_MAP, bound);
        }
        TextureSlot::Normal => {
            s.set_property("_BumpMap", PropertyValue::Texture(handle));
        }
        TextureSlot::Occlusion => {
            s.set_property("_OcclusionMap", PropertyValue::Texture(handle));
            s.set_keyword(KW_OCCLUSION_MAP, bound);
        }
        TextureSlot::Emission => {
            s.set_property("_EmissionMap", PropertyValue::Texture(handle));
        }
        TextureSlot::DetailMask => {
            s.set_property("_DetailMask", PropertyValue::Texture(handle));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit_snapshot() -> MaterialSnapshot {
        MaterialSnapshot::new("Universal Render Pipeline/Lit")
    }

    #[test]
    fn test_opaque_surface_rules() {
        let mut s = lit_snapshot();
        apply_mode(&mut s, FamilyKind::Lit, ModeChange::Surface(SurfaceType::Opaque)).unwrap();

        assert_eq!(s.tag("RenderType"), Some("Opaque"));
        assert_eq!(s.render_queue, 2000);
        assert_eq!(s.int("_ZWrite"), 1);
        assert_eq!(s.int("_DstBlend"), 0);
        assert_eq!(s.int("_SrcBlend"), 1);
        assert!(!s.has_keyword("_SURFACE_TYPE_TRANSPARENT"));
        assert!(s.pass_enabled("DepthOnly"));
        assert!(s.pass_enabled("SHADOWCASTER"));
    }

    #[test]
    fn test_transparent_surface_rules() {
        let mut s = lit_snapshot();
        apply_mode(&mut s, FamilyKind::Lit, ModeChange::Surface(SurfaceType::Transparent))
            .unwrap();

        assert_eq!(s.tag("RenderType"), Some("Transparent"));
        assert_eq!(s.render_queue, 3000);
        assert_eq!(s.int("_ZWrite"), 0);
        assert!(s.has_keyword("_SURFACE_TYPE_TRANSPARENT"));
        assert!(!s.pass_enabled("DepthOnly"));
        assert!(!s.pass_enabled("SHADOWCASTER"));
        // No stored _Blend defaults to Alpha's factors.
        assert_eq!(s.int("_DstBlend"), 10);
        assert_eq!(s.int("_SrcBlend"), 1);
    }

    #[test]
    fn test_surface_transition_is_idempotent() {
        let mut s = lit_snapshot();
        apply_mode(&mut s, FamilyKind::Lit, ModeChange::Surface(SurfaceType::Opaque)).unwrap();
        let once = s.clone();
        apply_mode(&mut s, FamilyKind::Lit, ModeChange::Surface(SurfaceType::Opaque)).unwrap();
        assert_eq!(s, once);
    }

    #[test]
    fn test_transparent_rederives_blend_from_stored_mode() {
        let mut s = lit_snapshot();
        apply_mode(&mut s, FamilyKind::Lit, ModeChange::Surface(SurfaceType::Opaque)).unwrap();
        // Pre-set multiply while still opaque; factors stay opaque until the
        // surface switches.
        s.set_int("_Blend", BlendMode::Multiply.index());

        apply_mode(&mut s, FamilyKind::Lit, ModeChange::Surface(SurfaceType::Transparent))
            .unwrap();

        assert_eq!(s.int("_DstBlend"), 0);
        assert_eq!(s.int("_SrcBlend"), 2);
        assert_eq!(s.int("_DstBlendAlpha"), 1);
        assert_eq!(s.int("_SrcBlendAlpha"), 0);
        assert!(s.has_keyword("_ALPHAMODULATE_ON"));
        assert!(!s.has_keyword("_ALPHAPREMULTIPLY_ON"));
    }

    #[test]
    fn test_blend_mode_tables() {
        let mut s = lit_snapshot();

        apply_mode(&mut s, FamilyKind::Lit, ModeChange::Blend(BlendMode::Alpha)).unwrap();
        assert!(s.has_keyword("_ALPHAPREMULTIPLY_ON"));
        assert_eq!((s.int("_SrcBlend"), s.int("_DstBlend")), (1, 10));

        apply_mode(&mut s, FamilyKind::Lit, ModeChange::Blend(BlendMode::Premultiply)).unwrap();
        assert!(!s.has_keyword("_ALPHAPREMULTIPLY_ON"));
        assert_eq!((s.int("_SrcBlend"), s.int("_DstBlend")), (1, 10));

        apply_mode(&mut s, FamilyKind::Lit, ModeChange::Blend(BlendMode::Additive)).unwrap();
        assert!(s.has_keyword("_ALPHAPREMULTIPLY_ON"));
        assert_eq!((s.int("_SrcBlend"), s.int("_DstBlend")), (1, 1));

        apply_mode(&mut s, FamilyKind::Lit, ModeChange::Blend(BlendMode::Multiply)).unwrap();
        assert!(s.has_keyword("_ALPHAMODULATE_ON"));
        assert_eq!((s.int("_SrcBlend"), s.int("_DstBlend")), (2, 0));
    }

    #[test]
    fn test_alpha_clip_queue_interaction() {
        let mut s = lit_snapshot();
        apply_mode(&mut s, FamilyKind::Lit, ModeChange::Surface(SurfaceType::Opaque)).unwrap();
        assert_eq!(s.render_queue, 2000);

        apply_mode(&mut s, FamilyKind::Lit, ModeChange::AlphaClip(true)).unwrap();
        assert_eq!(s.render_queue, 2450);
        assert_eq!(s.tag("RenderType"), Some("TransparentCutout"));
        assert_eq!(s.int("_AlphaToMask"), 1);
        assert!(s.has_keyword("_ALPHATEST_ON"));

        apply_mode(&mut s, FamilyKind::Lit, ModeChange::AlphaClip(false)).unwrap();
        assert_eq!(s.render_queue, 2000);
        assert_eq!(s.tag("RenderType"), Some("Opaque"));
        assert_eq!(s.int("_AlphaToMask"), 0);
        assert!(!s.has_keyword("_ALPHATEST_ON"));
    }

    #[test]
    fn test_alpha_clip_preserved_across_surface_change() {
        let mut s = lit_snapshot();
        apply_mode(&mut s, FamilyKind::Lit, ModeChange::Surface(SurfaceType::Opaque)).unwrap();
        apply_mode(&mut s, FamilyKind::Lit, ModeChange::AlphaClip(true)).unwrap();

        apply_mode(&mut s, FamilyKind::Lit, ModeChange::Surface(SurfaceType::Transparent))
            .unwrap();
        assert!(s.has_keyword("_ALPHATEST_ON"));
        // Transparent surface keeps the transparent queue; the cutout queue
        // only applies while opaque.
        assert_eq!(s.render_queue, 3000);

        apply_mode(&mut s, FamilyKind::Lit, ModeChange::Surface(SurfaceType::Opaque)).unwrap();
        assert_eq!(s.render_queue, 2450);
        assert_eq!(s.tag("RenderType"), Some("TransparentCutout"));
    }

    #[test]
    fn test_render_face_double_sided_gi() {
        let mut s = lit_snapshot();
        apply_mode(&mut s, FamilyKind::Lit, ModeChange::Face(RenderFace::Both)).unwrap();
        assert!(s.double_sided_gi);
        assert_eq!(s.int("_Cull"), 0);

        apply_mode(&mut s, FamilyKind::Lit, ModeChange::Face(RenderFace::Front)).unwrap();
        assert!(!s.double_sided_gi);
        assert_eq!(s.int("_Cull"), 2);

        apply_mode(&mut s, FamilyKind::Lit, ModeChange::Face(RenderFace::Back)).unwrap();
        assert!(s.double_sided_gi);
    }

    #[test]
    fn test_workflow_keywords() {
        let mut s = lit_snapshot();
        apply_mode(&mut s, FamilyKind::Lit, ModeChange::Workflow(WorkflowMode::Specular))
            .unwrap();
        assert!(s.has_keyword("_SPECULAR_SETUP"));
        assert!(s.has_keyword("_METALLICSPECGLOSSMAP"));

        apply_mode(&mut s, FamilyKind::Lit, ModeChange::Workflow(WorkflowMode::Metallic))
            .unwrap();
        assert!(!s.has_keyword("_SPECULAR_SETUP"));
        assert!(!s.has_keyword("_METALLICSPECGLOSSMAP"));
    }

    #[test]
    fn test_emission_mode_table() {
        let mut s = lit_snapshot();
        apply_mode(&mut s, FamilyKind::Lit, ModeChange::EmissionGi(EmissionGiMode::Realtime))
            .unwrap();
        assert!(s.has_keyword("_EMISSION"));
        assert_eq!(s.gi_flags.bits(), 1);

        apply_mode(&mut s, FamilyKind::Lit, ModeChange::EmissionGi(EmissionGiMode::Baked))
            .unwrap();
        assert!(!s.has_keyword("_EMISSION"));
        assert_eq!(s.gi_flags.bits(), 6);

        apply_mode(&mut s, FamilyKind::Lit, ModeChange::EmissionGi(EmissionGiMode::None))
            .unwrap();
        assert!(s.has_keyword("_EMISSION"));
        assert_eq!(s.gi_flags.bits(), 0);
    }

    #[test]
    fn test_emission_toggle_derives_mode_from_flags() {
        let mut s = lit_snapshot();
        s.gi_flags = GiFlags::REALTIME_EMISSIVE;
        apply_mode(&mut s, FamilyKind::Lit, ModeChange::Emission(true)).unwrap();
        assert!(s.has_keyword("_EMISSION"));
        assert_eq!(s.gi_flags.bits(), 1);

        apply_mode(&mut s, FamilyKind::Lit, ModeChange::Emission(false)).unwrap();
        assert!(!s.has_keyword("_EMISSION"));
        assert_eq!(s.gi_flags, GiFlags::EMISSION_DISABLED);
    }

    #[test]
    fn test_texture_map_dependent_keywords() {
        let mut s = lit_snapshot();
        apply_mode(
            &mut s,
            FamilyKind::Lit,
            ModeChange::TextureMap(TextureSlot::Metallic, Some("tex://metal".into())),
        )
        .unwrap();
        assert!(s.has_keyword("_METALLICSPECGLOSSMAP"));

        apply_mode(
            &mut s,
            FamilyKind::Lit,
            ModeChange::TextureMap(TextureSlot::Metallic, None),
        )
        .unwrap();
        assert!(!s.has_keyword("_METALLICSPECGLOSSMAP"));
    }

    #[test]
    fn test_unlit_rejects_lit_only_modes() {
        let mut s = MaterialSnapshot::new("Universal Render Pipeline/Unlit");
        let err = apply_mode(
            &mut s,
            FamilyKind::Unlit,
            ModeChange::Workflow(WorkflowMode::Specular),
        )
        .unwrap_err();
        assert!(matches!(err, StateError::UnsupportedMode { family: "Unlit", .. }));

        assert!(
            apply_mode(&mut s, FamilyKind::Unlit, ModeChange::Emission(true)).is_err()
        );
        assert!(
            apply_mode(&mut s, FamilyKind::Unlit, ModeChange::Surface(SurfaceType::Opaque))
                .is_ok()
        );
    }

    #[test]
    fn test_hdrp_surface_rules() {
        let mut s = MaterialSnapshot::new("HDRP/Lit");
        apply_mode(&mut s, FamilyKind::HdrpLit, ModeChange::Surface(SurfaceType::Opaque))
            .unwrap();
        assert_eq!(s.render_queue, 2225);
        assert_eq!(s.tag("RenderType"), None);
        assert_eq!(s.int("_StencilRefGBuffer"), 10);
        assert_eq!(s.int("_ZWrite"), 1);

        apply_mode(&mut s, FamilyKind::HdrpLit, ModeChange::Surface(SurfaceType::Transparent))
            .unwrap();
        assert_eq!(s.render_queue, 3000);
        assert!(s.has_keyword("_ENABLE_FOG_ON_TRANSPARENT"));
        assert_eq!(s.int("_StencilRefMV"), 32);
        // Blend re-derived in the HDRP index space (defaults to Alpha).
        assert_eq!(s.int("_DstBlend"), 10);
    }

    #[test]
    fn test_hdrp_unsupported_modes_leave_snapshot_unchanged() {
        let mut s = MaterialSnapshot::new("HDRP/Lit");
        apply_mode(&mut s, FamilyKind::HdrpLit, ModeChange::Surface(SurfaceType::Opaque))
            .unwrap();
        let before = s.clone();

        assert!(
            apply_mode(&mut s, FamilyKind::HdrpLit, ModeChange::Blend(BlendMode::Multiply))
                .is_err()
        );
        assert!(
            apply_mode(&mut s, FamilyKind::HdrpLit, ModeChange::Face(RenderFace::Both)).is_err()
        );
        assert_eq!(s, before);
    }

    #[test]
    fn test_registry_resolves_stock_shaders() {
        let registry = ShaderFamilyRegistry::new();
        assert_eq!(
            registry.resolve("Universal Render Pipeline/Lit").unwrap(),
            FamilyKind::Lit
        );
        assert_eq!(registry.resolve("HDRP/Lit").unwrap(), FamilyKind::HdrpLit);
    }

    #[test]
    fn test_unknown_family_fails_explicitly() {
        let registry = ShaderFamilyRegistry::new();
        let mut s = MaterialSnapshot::new("ToonFamily");
        let err = registry
            .apply(&mut s, ModeChange::Surface(SurfaceType::Opaque))
            .unwrap_err();
        assert_eq!(err, StateError::UnsupportedShaderFamily("ToonFamily".into()));
    }

    #[test]
    fn test_registry_custom_registration() {
        let mut registry = ShaderFamilyRegistry::new();
        registry.register("My/ToonLit", FamilyKind::Lit);
        assert!(registry.is_registered("My/ToonLit"));

        let mut s = MaterialSnapshot::new("My/ToonLit");
        registry
            .apply(&mut s, ModeChange::Surface(SurfaceType::Opaque))
            .unwrap();
        assert_eq!(s.tag("RenderType"), Some("Opaque"));
    }
}
