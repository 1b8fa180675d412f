//! Meta object
//!
//! A stored metadata mapping. Commits reference one through
//! `root_metadata_ref` to describe the content root; the history core never
//! interprets it.
//!
//! On disk: `meta <size>\0<encoded mapping>`

use crate::artifacts::objects::metadata::Metadata;
use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_type::ObjectType;
use bytes::Bytes;
use derive_new::new;
use std::io::{BufRead, Cursor, Write};

/// A metadata mapping stored as an object in its own right
#[derive(Debug, Clone, PartialEq, Eq, Default, new)]
pub struct Meta {
    metadata: Metadata,
}

impl Meta {
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}

impl Packable for Meta {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut payload = Vec::new();
        self.metadata.write_to(&mut payload)?;

        let mut meta_bytes = Vec::new();
        let header = format!("{} {}\0", self.object_type().as_str(), payload.len());
        meta_bytes.write_all(header.as_bytes())?;
        meta_bytes.write_all(&payload)?;

        Ok(Bytes::from(meta_bytes))
    }
}

impl Unpackable for Meta {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let payload = reader
            .bytes()
            .collect::<Result<Vec<u8>, std::io::Error>>()?;

        let metadata = Metadata::read_from(&mut Cursor::new(payload.as_slice()))?;
        Ok(Self::new(metadata))
    }
}

impl Object for Meta {
    fn object_type(&self) -> ObjectType {
        ObjectType::Meta
    }

    fn display(&self) -> String {
        self.metadata.to_string()
    }
}
