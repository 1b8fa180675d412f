//! Manifest object
//!
//! A manifest is the flat listing of every file captured by a commit: one
//! line per file with its mode, blob id and path. Commit records point at a
//! manifest through their `content_ref` field; the history core treats that
//! reference as opaque and never descends into it.
//!
//! ## Format
//!
//! On disk: `manifest <size>\0` followed by sorted lines of
//! `<mode> <blob-id>\t<path>`

use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;
use bytes::Bytes;
use derive_new::new;
use std::io::{BufRead, Write};
use std::path::PathBuf;

/// Mode of a manifest entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryMode {
    #[default]
    Regular,
    Executable,
}

impl EntryMode {
    pub fn as_str(&self) -> &str {
        match self {
            EntryMode::Regular => "100644",
            EntryMode::Executable => "100755",
        }
    }
}

impl TryFrom<&str> for EntryMode {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> anyhow::Result<Self> {
        match value {
            "100644" => Ok(EntryMode::Regular),
            "100755" => Ok(EntryMode::Executable),
            _ => Err(anyhow::anyhow!("Invalid entry mode: {value}")),
        }
    }
}

/// One file captured by a manifest
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct ManifestEntry {
    path: PathBuf,
    mode: EntryMode,
    blob_id: ObjectId,
}

impl ManifestEntry {
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn mode(&self) -> EntryMode {
        self.mode
    }

    pub fn blob_id(&self) -> &ObjectId {
        &self.blob_id
    }

    fn as_line(&self) -> String {
        format!(
            "{} {}\t{}",
            self.mode.as_str(),
            self.blob_id.as_ref(),
            self.path.display()
        )
    }
}

/// Flat content listing referenced by a commit's `content_ref`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Build a manifest, sorting entries by path for a stable object id
    pub fn new(mut entries: Vec<ManifestEntry>) -> Self {
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Manifest { entries }
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }
}

impl Packable for Manifest {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let content = self
            .entries
            .iter()
            .map(ManifestEntry::as_line)
            .collect::<Vec<_>>()
            .join("\n");

        let mut manifest_bytes = Vec::new();
        let header = format!("{} {}\0", self.object_type().as_str(), content.len());
        manifest_bytes.write_all(header.as_bytes())?;
        manifest_bytes.write_all(content.as_bytes())?;

        Ok(Bytes::from(manifest_bytes))
    }
}

impl Unpackable for Manifest {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let content = reader
            .bytes()
            .collect::<Result<Vec<u8>, std::io::Error>>()?;
        let content = String::from_utf8(content)?;

        let mut entries = Vec::new();
        for line in content.lines() {
            let (mode_and_id, path) = line
                .split_once('\t')
                .context("Invalid manifest entry: missing path")?;
            let (mode, blob_id) = mode_and_id
                .split_once(' ')
                .context("Invalid manifest entry: missing blob id")?;

            entries.push(ManifestEntry::new(
                PathBuf::from(path),
                EntryMode::try_from(mode)?,
                ObjectId::try_parse(blob_id.to_string())?,
            ));
        }

        Ok(Manifest::new(entries))
    }
}

impl Object for Manifest {
    fn object_type(&self) -> ObjectType {
        ObjectType::Manifest
    }

    fn display(&self) -> String {
        self.entries
            .iter()
            .map(ManifestEntry::as_line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
