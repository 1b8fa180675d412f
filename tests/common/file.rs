use derive_new::new;
use std::path::PathBuf;

#[derive(Debug, Clone, new)]
pub struct FileSpec {
    pub path: PathBuf,
    pub content: String,
}

pub fn write_file(file: FileSpec) {
    if let Some(parent) = file.path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent directories");
    }
    std::fs::write(&file.path, file.content).expect("Failed to write file");
}
