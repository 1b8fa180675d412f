use crate::areas::repository::Repository;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::CommitRecord;
use crate::artifacts::objects::manifest::{Manifest, ManifestEntry};
use crate::artifacts::objects::meta::Meta;
use crate::artifacts::objects::metadata::Metadata;
use crate::artifacts::objects::object::Object;
use std::io::Write;

impl Repository {
    pub fn commit(&self, subject: &str, body: &str, metadata: Metadata) -> anyhow::Result<()> {
        self.check()?;

        // snapshot the workspace: one blob per file, one manifest over them
        let mut entries = Vec::new();
        for relative_path in self.workspace().list_files()? {
            let blob = Blob::new(self.workspace().read_file(&relative_path)?);
            self.database().store(&blob)?;

            entries.push(ManifestEntry::new(
                relative_path.clone(),
                self.workspace().entry_mode(&relative_path),
                blob.object_id()?,
            ));
        }

        let manifest = Manifest::new(entries);
        self.database().store(&manifest)?;

        let root_meta = Meta::default();
        self.database().store(&root_meta)?;

        let parent = self.refs().read_head()?;
        let timestamp = u64::try_from(chrono::Utc::now().timestamp())?;

        let record = CommitRecord::new(
            metadata,
            parent.as_ref(),
            subject.trim(),
            body,
            timestamp,
            &manifest.object_id()?,
            &root_meta.object_id()?,
        );
        self.database().store(&record)?;

        let commit_id = record.object_id()?;
        self.refs().update_head(commit_id.clone())?;

        let root_marker = if record.is_root() { "(root-commit) " } else { "" };
        writeln!(
            self.writer(),
            "[{}{}] {}",
            root_marker,
            commit_id.to_short_oid(),
            record.subject()
        )?;

        Ok(())
    }
}
