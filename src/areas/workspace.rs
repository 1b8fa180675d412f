use crate::areas::repository::REPO_DIR;
use crate::artifacts::objects::manifest::EntryMode;
use anyhow::Context;
use bytes::Bytes;
use is_executable::IsExecutable;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const IGNORED_PATHS: [&str; 3] = [REPO_DIR, ".", ".."];

#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// List every tracked file as a path relative to the workspace root,
    /// sorted so snapshots are deterministic.
    pub fn list_files(&self) -> anyhow::Result<Vec<PathBuf>> {
        let mut files = WalkDir::new(self.path.as_ref())
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| self.check_if_not_ignored_file_path(entry.path()))
            .collect::<Vec<_>>();
        files.sort();

        Ok(files)
    }

    pub fn read_file(&self, relative_path: &Path) -> anyhow::Result<Bytes> {
        let file_path = self.path.join(relative_path);
        let content = std::fs::read(&file_path)
            .context(format!("Unable to read file {}", file_path.display()))?;

        Ok(Bytes::from(content))
    }

    pub fn entry_mode(&self, relative_path: &Path) -> EntryMode {
        if self.path.join(relative_path).is_executable() {
            EntryMode::Executable
        } else {
            EntryMode::Regular
        }
    }

    fn is_ignored(path: &Path) -> bool {
        // Check if any component of the path is in IGNORED_PATHS
        path.components().any(|component| {
            if let std::path::Component::Normal(name) = component {
                let name_str = name.to_string_lossy();
                IGNORED_PATHS.contains(&name_str.as_ref())
            } else {
                false
            }
        })
    }

    fn check_if_not_ignored_file_path(&self, path: &Path) -> Option<PathBuf> {
        if path.is_file() && !Self::is_ignored(path) {
            Some(path.strip_prefix(self.path.as_ref()).ok()?.to_path_buf())
        } else {
            None
        }
    }
}
