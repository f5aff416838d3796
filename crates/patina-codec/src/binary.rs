//! Binary Snapshot Format
//!
//! Compact little-endian layout. Strings are u32 byte-length prefixed
//! UTF-8; sequences are u32 count prefixed. Field order:
//!
//! shader, properties (name, kind tag byte, fixed payload per kind),
//! keywords, tags (name/value pairs), passes (name/bool pairs),
//! render queue (i32), GI flags (u32), double-sided GI (u8),
//! tiling (2xf32), offset (2xf32).
//!
//! This layout is the exact round-trip contract: decoding an encoded
//! snapshot reconstructs it field for field.

use glam::{Mat4, Vec2, Vec4};

use patina_state::{GiFlags, MaterialSnapshot, PropertyValue};

use crate::{CodecError, CodecResult};

const TAG_NUMBER: u8 = 0;
const TAG_COLOR: u8 = 1;
const TAG_VECTOR: u8 = 2;
const TAG_MATRIX: u8 = 3;
const TAG_TEXTURE: u8 = 4;
const TAG_KEYWORD: u8 = 5;

/// Encode a snapshot into the compact binary layout
pub fn encode_binary(snapshot: &MaterialSnapshot) -> Vec<u8> {
    let mut w = Writer::default();
    w.string(&snapshot.shader);

    w.u32(snapshot.properties.len() as u32);
    for record in &snapshot.properties {
        w.string(&record.name);
        match &record.value {
            PropertyValue::Number(v) => {
                w.u8(TAG_NUMBER);
                w.f32(*v);
            }
            PropertyValue::Color(c) => {
                w.u8(TAG_COLOR);
                for v in c.to_array() {
                    w.f32(v);
                }
            }
            PropertyValue::Vector(v) => {
                w.u8(TAG_VECTOR);
                for v in v.to_array() {
                    w.f32(v);
                }
            }
            PropertyValue::Matrix(m) => {
                w.u8(TAG_MATRIX);
                for v in m.to_cols_array() {
                    w.f32(v);
                }
            }
            PropertyValue::Texture(handle) => {
                w.u8(TAG_TEXTURE);
                match handle {
                    Some(handle) => {
                        w.u8(1);
                        w.string(handle);
                    }
                    None => w.u8(0),
                }
            }
            PropertyValue::Keyword(on) => {
                w.u8(TAG_KEYWORD);
                w.u8(*on as u8);
            }
        }
    }

    w.u32(snapshot.keywords.len() as u32);
    for keyword in &snapshot.keywords {
        w.string(keyword);
    }

    w.u32(snapshot.tags.len() as u32);
    for (name, value) in &snapshot.tags {
        w.string(name);
        w.string(value);
    }

    w.u32(snapshot.passes.len() as u32);
    for (name, enabled) in &snapshot.passes {
        w.string(name);
        w.u8(*enabled as u8);
    }

    w.i32(snapshot.render_queue);
    w.u32(snapshot.gi_flags.bits());
    w.u8(snapshot.double_sided_gi as u8);
    w.f32(snapshot.uv_tiling.x);
    w.f32(snapshot.uv_tiling.y);
    w.f32(snapshot.uv_offset.x);
    w.f32(snapshot.uv_offset.y);
    w.into_bytes()
}

/// Decode a snapshot from the compact binary layout
pub fn decode_binary(bytes: &[u8]) -> CodecResult<MaterialSnapshot> {
    let mut r = Reader::new(bytes);
    let mut snapshot = MaterialSnapshot::new(r.string()?);

    let prop_count = r.u32()?;
    for _ in 0..prop_count {
        let name = r.string()?;
        let value = match r.u8()? {
            TAG_NUMBER => PropertyValue::Number(r.f32()?),
            TAG_COLOR => PropertyValue::Color(Vec4::from_array(r.f32_array()?)),
            TAG_VECTOR => PropertyValue::Vector(Vec4::from_array(r.f32_array()?)),
            TAG_MATRIX => PropertyValue::Matrix(Mat4::from_cols_array(&r.f32_array()?)),
            TAG_TEXTURE => {
                let bound = r.u8()? != 0;
                PropertyValue::Texture(if bound { Some(r.string()?) } else { None })
            }
            TAG_KEYWORD => PropertyValue::Keyword(r.u8()? != 0),
            tag => return Err(CodecError::UnsupportedKindTag(tag)),
        };
        snapshot.set_property(name, value);
    }

    let keyword_count = r.u32()?;
    for _ in 0..keyword_count {
        snapshot.enable_keyword(r.string()?);
    }

    let tag_count = r.u32()?;
    for _ in 0..tag_count {
        let name = r.string()?;
        let value = r.string()?;
        snapshot.set_tag(name, value);
    }

    let pass_count = r.u32()?;
    for _ in 0..pass_count {
        let name = r.string()?;
        let enabled = r.u8()? != 0;
        snapshot.set_pass_enabled(name, enabled);
    }

    snapshot.render_queue = r.i32()?;
    snapshot.gi_flags = GiFlags::from_bits_retain(r.u32()?);
    snapshot.double_sided_gi = r.u8()? != 0;
    snapshot.uv_tiling = Vec2::new(r.f32()?, r.f32()?);
    snapshot.uv_offset = Vec2::new(r.f32()?, r.f32()?);
    Ok(snapshot)
}

#[derive(Default)]
struct Writer {
    bytes: Vec<u8>,
}

impl Writer {
    fn u8(&mut self, v: u8) {
        self.bytes.push(v);
    }

    fn u32(&mut self, v: u32) {
        self.bytes.extend_from_slice(&v.to_le_bytes());
    }

    fn i32(&mut self, v: i32) {
        self.bytes.extend_from_slice(&v.to_le_bytes());
    }

    fn f32(&mut self, v: f32) {
        self.bytes.extend_from_slice(&v.to_le_bytes());
    }

    fn string(&mut self, s: &str) {
        self.u32(s.len() as u32);
        self.bytes.extend_from_slice(s.as_bytes());
    }

    fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    at: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, at: 0 }
    }

    fn take(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        let remaining = self.bytes.len() - self.at;
        if len > remaining {
            return Err(CodecError::TruncatedData {
                needed: len - remaining,
                remaining,
            });
        }
        let slice = &self.bytes[self.at..self.at + len];
        self.at += len;
        Ok(slice)
    }

    fn u8(&mut self) -> CodecResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> CodecResult<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn i32(&mut self) -> CodecResult<i32> {
        let bytes = self.take(4)?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn f32(&mut self) -> CodecResult<f32> {
        let bytes = self.take(4)?;
        Ok(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn f32_array<const N: usize>(&mut self) -> CodecResult<[f32; N]> {
        let mut out = [0.0; N];
        for slot in &mut out {
            *slot = self.f32()?;
        }
        Ok(out)
    }

    fn string(&mut self) -> CodecResult<String> {
        let len = self.u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidString)
    }
}
