//! Nested type-length-value (TLV) codec
//!
//! Records are laid out as `TYPE LENGTH VALUE`, where both `TYPE` and
//! `LENGTH` use the variable-width number encoding of the named-data
//! networking packet format:
//!
//! ```text
//! first byte < 253  -> the byte itself
//! first byte = 253  -> next 2 bytes, big-endian
//! first byte = 254  -> next 4 bytes, big-endian
//! first byte = 255  -> next 8 bytes, big-endian
//! ```
//!
//! A nested record's `VALUE` is itself a sequence of records. The
//! [`Decoder`] streams over a buffer without building a tree; the
//! [`Encoder`] is its inverse.

mod decoder;
mod encoder;

pub use decoder::Decoder;
pub use encoder::{var_number_len, Encoder};

use crate::keystore::UnwrapError;

/// Marker bytes for the multi-byte var-number forms
pub(crate) const VAR_NUMBER_U16: u8 = 253;
pub(crate) const VAR_NUMBER_U32: u8 = 254;
pub(crate) const VAR_NUMBER_U64: u8 = 255;

/// Errors that can occur while decoding a TLV buffer
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The outermost record is not the record we were asked to parse.
    #[error("schema mismatch: expected top-level type {expected}, found {actual}")]
    SchemaMismatch { expected: u64, actual: u64 },
    /// A declared length runs past the enclosing boundary or the end of the buffer.
    #[error("truncated record at offset {offset}: {declared} bytes declared, {available} available")]
    Truncated {
        offset: usize,
        declared: u64,
        available: usize,
    },
    #[error("unexpected record type: expected {expected}, found {actual}")]
    UnexpectedType { expected: u64, actual: u64 },
    /// A record type with no meaning inside its container.
    #[error("unrecognized record type {actual} at offset {offset}")]
    UnrecognizedType { actual: u64, offset: usize },
    /// A nested record did not end exactly where its header said it would.
    #[error("nested record ends at {boundary}, cursor is at {offset}")]
    BoundaryMismatch { offset: usize, boundary: usize },
    #[error("missing required record of type {0}")]
    MissingField(u64),
    #[error("record of type {0} is not valid UTF-8")]
    InvalidUtf8(u64),
    /// A fixed-size field has the wrong length.
    #[error("record of type {typ} is {actual} bytes, expected {expected}")]
    InvalidLength {
        typ: u64,
        expected: usize,
        actual: usize,
    },
    #[error("key unwrap failed: {0}")]
    KeyUnwrapFailed(#[from] UnwrapError),
}
