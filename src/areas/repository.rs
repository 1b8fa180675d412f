use crate::areas::database::Database;
use crate::areas::refs::Refs;
use crate::areas::workspace::Workspace;
use crate::artifacts::log::walker::HistoryStore;
use crate::artifacts::objects::object_id::ObjectId;
use bytes::Bytes;
use std::cell::{RefCell, RefMut};
use std::path::Path;

/// Name of the repository directory at the workspace root
pub const REPO_DIR: &str = ".lode";

pub struct Repository {
    path: Box<Path>,
    writer: RefCell<Box<dyn std::io::Write>>,
    database: Database,
    workspace: Workspace,
    refs: Refs,
}

impl Repository {
    pub fn new(path: &str, writer: Box<dyn std::io::Write>) -> anyhow::Result<Self> {
        let path = Path::new(path);
        if !path.exists() {
            std::fs::create_dir_all(path)?;
        }
        let path = path.canonicalize()?;

        let database = Database::new(path.join(REPO_DIR).join("objects").into_boxed_path());
        let workspace = Workspace::new(path.clone().into_boxed_path());
        let refs = Refs::new(path.join(REPO_DIR).into_boxed_path());

        Ok(Repository {
            path: path.into_boxed_path(),
            writer: RefCell::new(writer),
            database,
            workspace,
            refs,
        })
    }

    /// Validate that a repository actually exists at this path
    pub fn check(&self) -> anyhow::Result<()> {
        if !self.database.objects_path().exists() || !self.refs.head_path().exists() {
            anyhow::bail!("Not a lode repository: {}", self.path.display());
        }

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn writer(&'_ self) -> RefMut<'_, Box<dyn std::io::Write>> {
        self.writer.borrow_mut()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }
}

impl HistoryStore for Repository {
    fn resolve_head(&self) -> anyhow::Result<Option<ObjectId>> {
        self.refs.read_head()
    }

    fn fetch(&self, id: &ObjectId) -> anyhow::Result<Bytes> {
        self.database.load_commit_payload(id)
    }
}
