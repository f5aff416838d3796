//! # Patina Codec
//!
//! Serialization for material snapshots in two wire formats:
//! - **Text**: line-oriented tagged records, stable and diffable
//!   ([`encode_text`]/[`decode_text`])
//! - **Binary**: compact little-endian layout with length-prefixed
//!   sequences ([`encode_binary`]/[`decode_binary`])
//!
//! Both formats round-trip every supported property kind. Binary is the
//! exact contract: `decode_binary(encode_binary(s)) == s` field for field.
//! Text may normalize number formatting but preserves value and type;
//! floats use Rust's shortest round-trip representation, which is
//! locale-independent by construction.
//!
//! Codec errors are always returned to the caller, never logged and
//! swallowed: this crate has no logging facility by design.

use thiserror::Error;

pub mod binary;
pub mod text;

pub use binary::{decode_binary, encode_binary};
pub use text::{decode_text, decode_text_resolved, encode_text};

/// Codec errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A text line could not be parsed
    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    /// A binary read ran past the end of the buffer
    #[error("truncated data: needed {needed} more bytes, {remaining} remaining")]
    TruncatedData { needed: usize, remaining: usize },

    /// Unrecognized property kind tag byte
    #[error("unsupported property kind tag {0:#04x}")]
    UnsupportedKindTag(u8),

    /// A binary string field was not valid UTF-8
    #[error("invalid utf-8 in string field")]
    InvalidString,

    /// The shader identity is not registered with the caller's registry.
    ///
    /// Recoverable: callers that want to proceed with raw property
    /// application can decode without a registry instead.
    #[error("unknown shader: {0}")]
    UnknownShader(String),
}

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;
