use assert_cmd::Command;
use assert_fs::TempDir;
use rstest::fixture;
use std::path::Path;

#[fixture]
pub fn repository_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

#[fixture]
pub fn init_repository_dir(repository_dir: TempDir) -> TempDir {
    run_lode_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    repository_dir
}

pub fn run_lode_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("lode").expect("Failed to find lode binary");
    cmd.current_dir(dir);
    for arg in args {
        cmd.arg(arg);
    }
    cmd
}

pub fn lode_commit(dir: &Path, subject: &str) -> Command {
    run_lode_command(dir, &["commit", "--subject", subject])
}

/// Resolve the commit id HEAD currently points to, following one level of
/// symbolic indirection the way the binary writes it at init.
pub fn get_head_commit_sha(dir: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let lode_dir = dir.join(".lode");
    let head = std::fs::read_to_string(lode_dir.join("HEAD"))?;
    let head = head.trim();

    if let Some(target) = head.strip_prefix("ref: ") {
        Ok(std::fs::read_to_string(lode_dir.join(target))?
            .trim()
            .to_string())
    } else {
        Ok(head.to_string())
    }
}
