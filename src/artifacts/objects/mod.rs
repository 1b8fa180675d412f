//! Object types stored in the lode database
//!
//! Every piece of repository data is an object identified by the SHA-1 of its
//! serialized form. There are four kinds:
//!
//! - **Blob**: raw file content
//! - **Manifest**: flat listing of the committed files (mode, blob id, path)
//! - **Meta**: an encoded metadata mapping (e.g. root directory metadata)
//! - **Commit**: a fixed-arity binary tuple describing one history step
//!
//! All objects serialize as `<type> <size>\0<payload>`.

use thiserror::Error;

pub mod blob;
pub mod commit;
pub mod manifest;
pub mod meta;
pub mod metadata;
pub mod object;
pub mod object_id;
pub mod object_type;

/// Length of a SHA-1 hash in hexadecimal format
pub const OBJECT_ID_LENGTH: usize = 40;

/// Failure to decode a commit record or metadata mapping from its wire form.
///
/// Each variant names the exact mismatch so a corrupt record can be
/// diagnosed; decoding never substitutes defaults for bad fields.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The encoding ended before the named field was complete.
    #[error("record truncated while reading {field}")]
    Truncated { field: &'static str },

    /// A string field held bytes that are not valid UTF-8.
    #[error("field {field} is not valid UTF-8")]
    InvalidUtf8 { field: &'static str },

    /// A metadata value carried a tag this decoder does not know.
    #[error("unknown metadata value tag {tag}")]
    UnknownValueTag { tag: u8 },

    /// A boolean metadata value held something other than 0 or 1.
    #[error("metadata flag byte {value} is neither 0 nor 1")]
    InvalidFlag { value: u8 },

    /// The timestamp cannot denote a calendar date.
    #[error("timestamp {0} is out of calendar range")]
    TimestampOutOfRange(u64),

    /// Bytes remained after the final tuple field (wrong arity).
    #[error("{extra} trailing bytes after the final field")]
    TrailingBytes { extra: usize },
}
