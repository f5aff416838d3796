//! Property Records
//!
//! A single named shader parameter plus its typed value. These are pure
//! data: the host performs shader reflection and presents the results as
//! property records, so this crate never inspects a live shader itself.

use glam::{Mat4, Vec4};
use serde::{Deserialize, Serialize};

/// Discriminant for the supported property payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyKind {
    /// Scalar float (also covers ranges and integer-valued shader params)
    Number,
    /// RGBA color, stored as linear float components
    Color,
    /// Generic 4-component vector
    Vector,
    /// 4x4 matrix
    Matrix,
    /// Texture reference (opaque handle, possibly unbound)
    Texture,
    /// Named boolean shader-variant switch stored as a property
    Keyword,
}

/// Typed value of a shader parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Number(f32),
    Color(Vec4),
    Vector(Vec4),
    Matrix(Mat4),
    Texture(Option<String>),
    Keyword(bool),
}

impl PropertyValue {
    /// Get the kind discriminant for this value
    pub fn kind(&self) -> PropertyKind {
        match self {
            Self::Number(_) => PropertyKind::Number,
            Self::Color(_) => PropertyKind::Color,
            Self::Vector(_) => PropertyKind::Vector,
            Self::Matrix(_) => PropertyKind::Matrix,
            Self::Texture(_) => PropertyKind::Texture,
            Self::Keyword(_) => PropertyKind::Keyword,
        }
    }
}

/// A named shader parameter with its value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    /// Shader parameter name (host-defined; unique per material per kind)
    pub name: String,
    /// Typed payload
    pub value: PropertyValue,
}

impl PropertyRecord {
    /// Create a new property record
    pub fn new(name: impl Into<String>, value: PropertyValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Kind discriminant of the payload
    pub fn kind(&self) -> PropertyKind {
        self.value.kind()
    }
}
