//! Commit record and its wire codec
//!
//! A commit describes one repository state transition: a reference to the
//! committed content, a reference to the previous commit, and the message
//! explaining the step. On the wire it is a fixed-arity tuple whose fields
//! are typed by position; none are optional and none may be reordered.
//!
//! ## Format
//!
//! Payload of a `commit` object, big-endian, strings length-prefixed (u32):
//!
//! ```text
//! u32   format_version
//! map   metadata            (see `metadata` module)
//! str   parent_id           ("" marks the root commit)
//! str   subject
//! str   body
//! u64   timestamp           (seconds since epoch, UTC)
//! str   content_ref
//! str   root_metadata_ref
//! ```
//!
//! Decoding is pure and owns its result: the returned record holds
//! independent copies of every field and keeps no reference to the input
//! buffer.

use crate::artifacts::objects::DecodeError;
use crate::artifacts::objects::metadata::{Metadata, read_string, write_string};
use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use bytes::Bytes;
use std::io::{BufRead, Cursor, Write};

/// Schema version written into every new commit
pub const FORMAT_VERSION: u32 = 1;

/// Sentinel parent value marking a commit as the root of its history
pub const ROOT_PARENT: &str = "";

/// Decoded commit record, immutable once produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    format_version: u32,
    metadata: Metadata,
    parent_id: String,
    subject: String,
    body: String,
    timestamp: u64,
    content_ref: String,
    root_metadata_ref: String,
}

impl CommitRecord {
    /// Create a new record at the current schema version
    ///
    /// # Arguments
    ///
    /// * `metadata` - free-form annotations carried by the commit
    /// * `parent` - previous commit, or None for the root commit
    /// * `subject` - one-line summary
    /// * `body` - free-form message, may span multiple lines
    /// * `timestamp` - seconds since epoch, UTC
    /// * `content_ref` - manifest object holding the committed content
    /// * `root_metadata_ref` - metadata object for the content root
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        metadata: Metadata,
        parent: Option<&ObjectId>,
        subject: impl Into<String>,
        body: impl Into<String>,
        timestamp: u64,
        content_ref: &ObjectId,
        root_metadata_ref: &ObjectId,
    ) -> Self {
        CommitRecord {
            format_version: FORMAT_VERSION,
            metadata,
            parent_id: parent.map(|p| p.as_ref().to_string()).unwrap_or_default(),
            subject: subject.into(),
            body: body.into(),
            timestamp,
            content_ref: content_ref.as_ref().to_string(),
            root_metadata_ref: root_metadata_ref.as_ref().to_string(),
        }
    }

    pub fn format_version(&self) -> u32 {
        self.format_version
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Identifier of the previous commit; empty for the root commit
    pub fn parent_id(&self) -> &str {
        &self.parent_id
    }

    /// Whether this commit terminates the parent chain
    pub fn is_root(&self) -> bool {
        self.parent_id == ROOT_PARENT
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn content_ref(&self) -> &str {
        &self.content_ref
    }

    pub fn root_metadata_ref(&self) -> &str {
        &self.root_metadata_ref
    }

    /// Format the timestamp as a human-readable UTC calendar string
    ///
    /// # Returns
    ///
    /// String like "Mon Jan 01 12:34:56 2024 +0000"
    pub fn readable_timestamp(&self) -> String {
        timestamp_to_utc(self.timestamp)
            .map(|dt| dt.format("%a %b %d %H:%M:%S %Y %z").to_string())
            .unwrap_or_default()
    }

    /// Decode a record from the payload bytes of a `commit` object
    ///
    /// The encoding is consumed exactly: missing bytes, malformed fields and
    /// leftover bytes are all distinct errors. See [`DecodeError`].
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = Cursor::new(bytes);

        let format_version = reader
            .read_u32::<BigEndian>()
            .map_err(|_| DecodeError::Truncated {
                field: "format_version",
            })?;
        let metadata = Metadata::read_from(&mut reader)?;
        let parent_id = read_string(&mut reader, "parent_id")?;
        let subject = read_string(&mut reader, "subject")?;
        let body = read_string(&mut reader, "body")?;
        let timestamp = reader
            .read_u64::<BigEndian>()
            .map_err(|_| DecodeError::Truncated { field: "timestamp" })?;
        let content_ref = read_string(&mut reader, "content_ref")?;
        let root_metadata_ref = read_string(&mut reader, "root_metadata_ref")?;

        if timestamp_to_utc(timestamp).is_none() {
            return Err(DecodeError::TimestampOutOfRange(timestamp));
        }

        let extra = bytes.len() - reader.position() as usize;
        if extra != 0 {
            return Err(DecodeError::TrailingBytes { extra });
        }

        Ok(CommitRecord {
            format_version,
            metadata,
            parent_id,
            subject,
            body,
            timestamp,
            content_ref,
            root_metadata_ref,
        })
    }

    /// Encode the record into its tuple payload
    pub fn encode(&self) -> anyhow::Result<Bytes> {
        let mut payload = Vec::new();

        payload.write_u32::<BigEndian>(self.format_version)?;
        self.metadata.write_to(&mut payload)?;
        write_string(&mut payload, &self.parent_id)?;
        write_string(&mut payload, &self.subject)?;
        write_string(&mut payload, &self.body)?;
        payload.write_u64::<BigEndian>(self.timestamp)?;
        write_string(&mut payload, &self.content_ref)?;
        write_string(&mut payload, &self.root_metadata_ref)?;

        Ok(Bytes::from(payload))
    }
}

fn timestamp_to_utc(timestamp: u64) -> Option<chrono::DateTime<chrono::Utc>> {
    let seconds = i64::try_from(timestamp).ok()?;
    chrono::DateTime::from_timestamp(seconds, 0)
}

impl Packable for CommitRecord {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let payload = self.encode()?;

        let mut commit_bytes = Vec::new();
        let header = format!("{} {}\0", self.object_type().as_str(), payload.len());
        commit_bytes.write_all(header.as_bytes())?;
        commit_bytes.write_all(&payload)?;

        Ok(Bytes::from(commit_bytes))
    }
}

impl Unpackable for CommitRecord {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        // the header has already been read
        let payload = reader
            .bytes()
            .collect::<Result<Vec<u8>, std::io::Error>>()?;

        Ok(Self::decode(&payload)?)
    }
}

impl Object for CommitRecord {
    fn object_type(&self) -> ObjectType {
        ObjectType::Commit
    }

    fn display(&self) -> String {
        let mut lines = vec![];

        lines.push(format!("version {}", self.format_version));
        if !self.is_root() {
            lines.push(format!("parent {}", self.parent_id));
        }
        lines.push(format!("content {}", self.content_ref));
        lines.push(format!("root-metadata {}", self.root_metadata_ref));
        lines.push(format!("date {}", self.readable_timestamp()));
        lines.push(format!("metadata {}", self.metadata));
        lines.push(String::new());
        lines.push(self.subject.clone());
        if !self.body.is_empty() {
            lines.push(String::new());
            lines.push(self.body.clone());
        }

        lines.join("\n")
    }
}
