//! Commit metadata mapping
//!
//! Free-form annotations attached to a commit record: an ordered mapping from
//! string keys to typed values. The order in which entries were inserted is
//! the order in which they are encoded and printed.
//!
//! The printed form (`{'key': 'value', 'serial': 42}`) is diagnostic output
//! only; it is never parsed back.
//!
//! ## Wire format
//!
//! Big-endian, length-prefixed:
//!
//! ```text
//! u32 entry count
//! per entry:
//!   u32 key length, key bytes (UTF-8)
//!   u8 value tag
//!   tagged payload
//! ```
//!
//! Value tags: `0` string, `1` u64, `2` bool (one byte, 0 or 1),
//! `3` byte array (u32 length + bytes).

use crate::artifacts::objects::DecodeError;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Write};

const TAG_TEXT: u8 = 0;
const TAG_UINT: u8 = 1;
const TAG_FLAG: u8 = 2;
const TAG_BYTES: u8 = 3;

/// A typed metadata value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaValue {
    Text(String),
    Uint(u64),
    Flag(bool),
    Bytes(Vec<u8>),
}

impl MetaValue {
    /// Parse a command-line literal into a typed value.
    ///
    /// `true`/`false` become flags, decimal digits become unsigned integers,
    /// anything else stays a string.
    pub fn parse_literal(raw: &str) -> MetaValue {
        match raw {
            "true" => MetaValue::Flag(true),
            "false" => MetaValue::Flag(false),
            _ => match raw.parse::<u64>() {
                Ok(n) => MetaValue::Uint(n),
                Err(_) => MetaValue::Text(raw.to_string()),
            },
        }
    }
}

impl std::fmt::Display for MetaValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetaValue::Text(s) => write!(f, "'{}'", s.replace('\'', "\\'")),
            MetaValue::Uint(n) => write!(f, "{n}"),
            MetaValue::Flag(b) => write!(f, "{b}"),
            MetaValue::Bytes(bytes) => {
                write!(f, "0x")?;
                for byte in bytes {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
        }
    }
}

/// Ordered mapping of string keys to typed values
///
/// Inserting an existing key replaces its value in place, preserving the
/// key's original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata(Vec<(String, MetaValue)>);

impl Metadata {
    pub fn new() -> Self {
        Metadata(Vec::new())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: MetaValue) {
        let key = key.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, MetaValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn write_to(&self, writer: &mut impl Write) -> std::io::Result<()> {
        writer.write_u32::<BigEndian>(self.0.len() as u32)?;
        for (key, value) in &self.0 {
            write_string(writer, key)?;
            match value {
                MetaValue::Text(s) => {
                    writer.write_u8(TAG_TEXT)?;
                    write_string(writer, s)?;
                }
                MetaValue::Uint(n) => {
                    writer.write_u8(TAG_UINT)?;
                    writer.write_u64::<BigEndian>(*n)?;
                }
                MetaValue::Flag(b) => {
                    writer.write_u8(TAG_FLAG)?;
                    writer.write_u8(u8::from(*b))?;
                }
                MetaValue::Bytes(bytes) => {
                    writer.write_u8(TAG_BYTES)?;
                    writer.write_u32::<BigEndian>(bytes.len() as u32)?;
                    writer.write_all(bytes)?;
                }
            }
        }
        Ok(())
    }

    pub fn read_from(reader: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        const FIELD: &str = "metadata";

        let count = reader
            .read_u32::<BigEndian>()
            .map_err(|_| DecodeError::Truncated { field: FIELD })?;

        let mut entries = Metadata::new();
        for _ in 0..count {
            let key = read_string(reader, FIELD)?;
            let tag = reader
                .read_u8()
                .map_err(|_| DecodeError::Truncated { field: FIELD })?;
            let value = match tag {
                TAG_TEXT => MetaValue::Text(read_string(reader, FIELD)?),
                TAG_UINT => MetaValue::Uint(
                    reader
                        .read_u64::<BigEndian>()
                        .map_err(|_| DecodeError::Truncated { field: FIELD })?,
                ),
                TAG_FLAG => {
                    let byte = reader
                        .read_u8()
                        .map_err(|_| DecodeError::Truncated { field: FIELD })?;
                    match byte {
                        0 => MetaValue::Flag(false),
                        1 => MetaValue::Flag(true),
                        value => return Err(DecodeError::InvalidFlag { value }),
                    }
                }
                TAG_BYTES => MetaValue::Bytes(read_bytes(reader, FIELD)?),
                tag => return Err(DecodeError::UnknownValueTag { tag }),
            };
            entries.insert(key, value);
        }

        Ok(entries)
    }
}

impl std::fmt::Display for Metadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "'{key}': {value}")?;
        }
        write!(f, "}}")
    }
}

pub(crate) fn write_string(writer: &mut impl Write, value: &str) -> std::io::Result<()> {
    writer.write_u32::<BigEndian>(value.len() as u32)?;
    writer.write_all(value.as_bytes())
}

pub(crate) fn read_string(
    reader: &mut Cursor<&[u8]>,
    field: &'static str,
) -> Result<String, DecodeError> {
    let bytes = read_bytes(reader, field)?;
    String::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8 { field })
}

pub(crate) fn read_bytes(
    reader: &mut Cursor<&[u8]>,
    field: &'static str,
) -> Result<Vec<u8>, DecodeError> {
    let len = reader
        .read_u32::<BigEndian>()
        .map_err(|_| DecodeError::Truncated { field })? as usize;

    // a declared length past the end of the buffer is truncation, not an
    // allocation request
    let available = reader.get_ref().len() - reader.position() as usize;
    if len > available {
        return Err(DecodeError::Truncated { field });
    }

    let start = reader.position() as usize;
    let bytes = reader.get_ref()[start..start + len].to_vec();
    reader.set_position((start + len) as u64);
    Ok(bytes)
}
