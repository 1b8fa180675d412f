use crate::areas::repository::Repository;
use anyhow::Context;
use std::fs;
use std::io::Write;

const DEFAULT_BRANCH: &str = "main";

impl Repository {
    pub fn init(&self) -> anyhow::Result<()> {
        fs::create_dir_all(self.database().objects_path())
            .context("Failed to create .lode/objects directory")?;

        fs::create_dir_all(self.refs().heads_path())
            .context("Failed to create .lode/refs/heads directory")?;

        self.refs()
            .set_head(DEFAULT_BRANCH)
            .context("Failed to create initial HEAD reference")?;

        writeln!(
            self.writer(),
            "Initialized empty lode repository in {}",
            self.path().display()
        )?;

        Ok(())
    }
}
