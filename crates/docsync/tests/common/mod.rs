//! Common test utilities.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// The fixture repository shared with docsync-core's tests.
pub fn fixture_repo() -> PathBuf {
    PathBuf::from(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../docsync-core/tests/fixtures/repo"
    ))
}

pub fn docsync_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_docsync"))
}

/// Run a subcommand against `repo`, writing reports to `output`.
pub fn run_docsync(repo: &Path, output: &Path, args: &[&str]) -> Output {
    let mut command = docsync_bin();
    command.arg("--repo").arg(repo);
    command.args(args);
    command.arg("--output").arg(output);
    command
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run docsync")
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

pub fn read(path: impl AsRef<Path>) -> String {
    let path = path.as_ref();
    std::fs::read_to_string(path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
}

/// Copy a directory tree, for tests that need to edit the fixture.
pub fn copy_tree(from: &Path, to: &Path) {
    std::fs::create_dir_all(to).expect("Failed to create dir");
    for entry in std::fs::read_dir(from).expect("Failed to list dir") {
        let entry = entry.expect("Failed to read entry");
        let target = to.join(entry.file_name());
        if entry.file_type().expect("file type").is_dir() {
            copy_tree(&entry.path(), &target);
        } else {
            std::fs::copy(entry.path(), &target).expect("Failed to copy file");
        }
    }
}
