//! Text Snapshot Format
//!
//! Line-oriented tagged records, one field per line:
//!
//! ```text
//! SHADER Universal Render Pipeline/Lit
//! PROP _Surface NUMBER 1
//! PROP _BaseColor COLOR 1 0.5 0 1
//! PROP _BaseMap TEXTURE tex://bricks/albedo
//! KEYWORD _EMISSION
//! TAG RenderType Transparent
//! PASS DepthOnly 0
//! QUEUE 3000
//! GIFLAG 1
//! DOUBLESIDED 0
//! TILING 1 1
//! OFFSET 0 0
//! ```
//!
//! The `SHADER` header must come first. Blank lines and `#` comments are
//! ignored. An unbound texture is written as `-`. Output is deterministic:
//! properties in sequence order, keywords/tags/passes in sorted order.

use glam::{Mat4, Vec2, Vec4};
use std::fmt::Write as _;

use patina_state::{GiFlags, MaterialSnapshot, PropertyValue, ShaderFamilyRegistry};

use crate::{CodecError, CodecResult};

/// Encode a snapshot as tagged text
pub fn encode_text(snapshot: &MaterialSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "SHADER {}", snapshot.shader);

    for record in &snapshot.properties {
        let _ = write!(out, "PROP {} ", record.name);
        match &record.value {
            PropertyValue::Number(v) => {
                let _ = writeln!(out, "NUMBER {v}");
            }
            PropertyValue::Color(c) => {
                let _ = writeln!(out, "COLOR {} {} {} {}", c.x, c.y, c.z, c.w);
            }
            PropertyValue::Vector(v) => {
                let _ = writeln!(out, "VECTOR {} {} {} {}", v.x, v.y, v.z, v.w);
            }
            PropertyValue::Matrix(m) => {
                let _ = write!(out, "MATRIX");
                for v in m.to_cols_array() {
                    let _ = write!(out, " {v}");
                }
                let _ = writeln!(out);
            }
            PropertyValue::Texture(handle) => {
                let _ = writeln!(out, "TEXTURE {}", handle.as_deref().unwrap_or("-"));
            }
            PropertyValue::Keyword(on) => {
                let _ = writeln!(out, "FLAG {}", *on as u8);
            }
        }
    }

    for keyword in &snapshot.keywords {
        let _ = writeln!(out, "KEYWORD {keyword}");
    }
    for (name, value) in &snapshot.tags {
        let _ = writeln!(out, "TAG {name} {value}");
    }
    for (name, enabled) in &snapshot.passes {
        let _ = writeln!(out, "PASS {name} {}", *enabled as u8);
    }

    let _ = writeln!(out, "QUEUE {}", snapshot.render_queue);
    let _ = writeln!(out, "GIFLAG {}", snapshot.gi_flags.bits());
    let _ = writeln!(out, "DOUBLESIDED {}", snapshot.double_sided_gi as u8);
    let _ = writeln!(out, "TILING {} {}", snapshot.uv_tiling.x, snapshot.uv_tiling.y);
    let _ = writeln!(out, "OFFSET {} {}", snapshot.uv_offset.x, snapshot.uv_offset.y);
    out
}

/// Decode tagged text into a snapshot
pub fn decode_text(text: &str) -> CodecResult<MaterialSnapshot> {
    let mut snapshot: Option<MaterialSnapshot> = None;

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (tag, rest) = split_word(line);

        let Some(snap) = snapshot.as_mut() else {
            if tag != "SHADER" {
                return Err(malformed(line_no, "expected SHADER header"));
            }
            if rest.is_empty() {
                return Err(malformed(line_no, "SHADER requires a name"));
            }
            snapshot = Some(MaterialSnapshot::new(rest));
            continue;
        };

        match tag {
            "SHADER" => return Err(malformed(line_no, "duplicate SHADER header")),
            "PROP" => decode_prop(snap, rest, line_no)?,
            "KEYWORD" => {
                if rest.is_empty() {
                    return Err(malformed(line_no, "KEYWORD requires a name"));
                }
                snap.enable_keyword(rest);
            }
            "TAG" => {
                let (name, value) = split_word(rest);
                if name.is_empty() || value.is_empty() {
                    return Err(malformed(line_no, "TAG requires a name and a value"));
                }
                snap.set_tag(name, value);
            }
            "PASS" => {
                let (name, value) = split_word(rest);
                if name.is_empty() {
                    return Err(malformed(line_no, "PASS requires a name"));
                }
                snap.set_pass_enabled(name, parse_bool(value, line_no)?);
            }
            "QUEUE" => {
                snap.render_queue = rest
                    .parse()
                    .map_err(|_| malformed(line_no, "QUEUE requires an integer"))?;
            }
            "GIFLAG" => {
                let bits: u32 = rest
                    .parse()
                    .map_err(|_| malformed(line_no, "GIFLAG requires an unsigned integer"))?;
                snap.gi_flags = GiFlags::from_bits_retain(bits);
            }
            "DOUBLESIDED" => {
                snap.double_sided_gi = parse_bool(rest, line_no)?;
            }
            "TILING" => {
                snap.uv_tiling = parse_vec2(rest, line_no)?;
            }
            "OFFSET" => {
                snap.uv_offset = parse_vec2(rest, line_no)?;
            }
            other => {
                return Err(malformed(line_no, &format!("unknown record tag '{other}'")));
            }
        }
    }

    snapshot.ok_or_else(|| malformed(1, "missing SHADER header"))
}

/// Decode tagged text and require the shader to be registered.
///
/// Fails with [`CodecError::UnknownShader`] when the header shader is not
/// in the registry. Callers that want to proceed with raw property
/// application use [`decode_text`] instead.
pub fn decode_text_resolved(
    text: &str,
    registry: &ShaderFamilyRegistry,
) -> CodecResult<MaterialSnapshot> {
    let snapshot = decode_text(text)?;
    if !registry.is_registered(&snapshot.shader) {
        return Err(CodecError::UnknownShader(snapshot.shader));
    }
    Ok(snapshot)
}

fn decode_prop(snap: &mut MaterialSnapshot, rest: &str, line_no: usize) -> CodecResult<()> {
    let (name, rest) = split_word(rest);
    let (kind, values) = split_word(rest);
    if name.is_empty() || kind.is_empty() {
        return Err(malformed(line_no, "PROP requires a name and a kind"));
    }

    let value = match kind {
        "NUMBER" => PropertyValue::Number(parse_f32(values, line_no)?),
        "COLOR" => {
            let f = parse_floats::<4>(values, line_no)?;
            PropertyValue::Color(Vec4::from_array(f))
        }
        "VECTOR" => {
            let f = parse_floats::<4>(values, line_no)?;
            PropertyValue::Vector(Vec4::from_array(f))
        }
        "MATRIX" => {
            let f = parse_floats::<16>(values, line_no)?;
            PropertyValue::Matrix(Mat4::from_cols_array(&f))
        }
        "TEXTURE" => {
            if values.is_empty() {
                return Err(malformed(line_no, "TEXTURE requires a handle or '-'"));
            }
            PropertyValue::Texture((values != "-").then(|| values.to_string()))
        }
        "FLAG" => PropertyValue::Keyword(parse_bool(values, line_no)?),
        other => {
            return Err(malformed(line_no, &format!("unknown property kind '{other}'")));
        }
    };
    snap.set_property(name, value);
    Ok(())
}

/// Split off the first whitespace-delimited word; the remainder is trimmed
fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(at) => (&s[..at], s[at..].trim_start()),
        None => (s, ""),
    }
}

fn malformed(line: usize, reason: &str) -> CodecError {
    CodecError::MalformedRecord {
        line,
        reason: reason.to_string(),
    }
}

fn parse_f32(token: &str, line_no: usize) -> CodecResult<f32> {
    token
        .parse()
        .map_err(|_| malformed(line_no, &format!("invalid number '{token}'")))
}

fn parse_floats<const N: usize>(values: &str, line_no: usize) -> CodecResult<[f32; N]> {
    let mut out = [0.0; N];
    let mut tokens = values.split_whitespace();
    for slot in &mut out {
        let token = tokens
            .next()
            .ok_or_else(|| malformed(line_no, &format!("expected {N} components")))?;
        *slot = parse_f32(token, line_no)?;
    }
    if tokens.next().is_some() {
        return Err(malformed(line_no, &format!("expected exactly {N} components")));
    }
    Ok(out)
}

fn parse_vec2(values: &str, line_no: usize) -> CodecResult<Vec2> {
    let f = parse_floats::<2>(values, line_no)?;
    Ok(Vec2::from_array(f))
}

fn parse_bool(token: &str, line_no: usize) -> CodecResult<bool> {
    match token {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(malformed(line_no, &format!("expected 0 or 1, got '{token}'"))),
    }
}
