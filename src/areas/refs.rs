//! References (HEAD and branches)
//!
//! References are human-readable names pointing to commits. They can be:
//! - Direct: containing a commit id
//! - Symbolic: pointing to another reference (e.g. HEAD -> refs/heads/main)
//!
//! ## File Format
//!
//! References are stored as text files containing either:
//! - A 40-character hex identifier (direct reference)
//! - `ref: <path>` for symbolic references
//!
//! An empty or missing branch file means the repository has no commits yet;
//! `read_head` reports that as absence, not as an error.

use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use derive_new::new;
use file_guard::Lock;
use std::io::Write;
use std::ops::DerefMut;
use std::path::Path;

/// Regex pattern for parsing symbolic references
const SYMREF_REGEX: &str = r"^ref: (.+)$";

/// Reference manager rooted at the `.lode` directory
///
/// Updates take an exclusive file lock so two processes committing at once
/// cannot interleave a head update.
#[derive(Debug, new)]
pub struct Refs {
    path: Box<Path>,
}

/// Internal representation of a reference value
#[derive(Debug, Clone)]
enum SymRefOrOid {
    /// Symbolic reference pointing to another ref (path relative to `.lode`)
    SymRef { target: String },
    /// Direct object ID
    Oid(ObjectId),
}

impl SymRefOrOid {
    fn read_symref_or_oid(path: &Path) -> anyhow::Result<Option<SymRefOrOid>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)?;
        let content = content.trim();

        if content.is_empty() {
            return Ok(None);
        }

        let symref_match = regex::Regex::new(SYMREF_REGEX)?.captures(content);
        if let Some(symref_match) = symref_match {
            Ok(Some(SymRefOrOid::SymRef {
                target: symref_match[1].to_string(),
            }))
        } else {
            Ok(Some(SymRefOrOid::Oid(ObjectId::try_parse(
                content.to_string(),
            )?)))
        }
    }
}

impl Refs {
    /// Read the commit id HEAD points to, following symbolic references
    ///
    /// # Returns
    ///
    /// Some(ObjectId) once a commit exists, None for a fresh repository
    pub fn read_head(&self) -> anyhow::Result<Option<ObjectId>> {
        self.read_symref(&self.head_path())
    }

    /// Advance HEAD (or the branch it points at) to a new commit
    pub fn update_head(&self, oid: ObjectId) -> anyhow::Result<()> {
        self.update_symref(self.head_path().as_ref(), oid)
    }

    /// Point HEAD at a branch, creating the branch file if needed
    pub fn set_head(&self, branch: &str) -> anyhow::Result<()> {
        self.update_ref_file(self.head_path(), format!("ref: refs/heads/{branch}"))?;

        let branch_path = self.heads_path().join(branch);
        if !branch_path.exists() {
            std::fs::write(&branch_path, b"").with_context(|| {
                format!("failed to create branch file at {:?}", branch_path)
            })?;
        }

        Ok(())
    }

    fn read_symref(&self, path: &Path) -> anyhow::Result<Option<ObjectId>> {
        let ref_content = SymRefOrOid::read_symref_or_oid(path)?;

        match ref_content {
            Some(SymRefOrOid::SymRef { target }) => {
                self.read_symref(self.path.join(target).as_path())
            }
            Some(SymRefOrOid::Oid(oid)) => Ok(Some(oid)),
            None => Ok(None),
        }
    }

    /// Update a reference to point to a new commit, following the symbolic
    /// chain and updating the final target.
    ///
    /// # Locking
    ///
    /// Acquires an exclusive lock on the reference file during the update.
    fn update_symref(&self, path: &Path, oid: ObjectId) -> anyhow::Result<()> {
        let mut ref_file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .with_context(|| format!("failed to open ref file at {:?}", path))?;
        let mut lock = file_guard::lock(&mut ref_file, Lock::Exclusive, 0, 1)?;

        let ref_content = SymRefOrOid::read_symref_or_oid(path)?;

        match ref_content {
            Some(SymRefOrOid::SymRef { target }) => {
                let target_path = self.path.join(target);
                self.update_symref(target_path.as_path(), oid)
            }
            Some(SymRefOrOid::Oid(_)) | None => {
                lock.deref_mut().write_all(oid.as_ref().as_bytes())?;
                Ok(())
            }
        }
    }

    fn update_ref_file(&self, path: Box<Path>, raw_ref: String) -> anyhow::Result<()> {
        std::fs::create_dir_all(path.parent().with_context(|| {
            format!(
                "failed to create parent directories for ref file at {:?}",
                path
            )
        })?)?;

        let mut ref_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path.clone())
            .with_context(|| format!("failed to open ref file at {:?}", path))?;
        let mut lock = file_guard::lock(&mut ref_file, Lock::Exclusive, 0, 1)?;
        lock.deref_mut().write_all(raw_ref.as_bytes())?;

        Ok(())
    }

    pub fn head_path(&self) -> Box<Path> {
        self.path.join("HEAD").into_boxed_path()
    }

    pub fn refs_path(&self) -> Box<Path> {
        self.path.join("refs").into_boxed_path()
    }

    pub fn heads_path(&self) -> Box<Path> {
        self.refs_path().join("heads").into_boxed_path()
    }
}
