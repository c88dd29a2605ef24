//! Shared helpers for txdir integration tests.

use assert_cmd::cargo::cargo_bin_cmd;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use txdir::fs::{LOCK_FILE_NAME, LockFile};

/// Creates a directory with a small tree of files:
///
/// ```text
/// readme.txt
/// lib/a.txt
/// lib/sub/b.txt
/// ```
#[allow(unused)]
pub fn create_test_dir() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("readme.txt"), "readme").unwrap();
    fs::create_dir_all(temp.path().join("lib/sub")).unwrap();
    fs::write(temp.path().join("lib/a.txt"), "a").unwrap();
    fs::write(temp.path().join("lib/sub/b.txt"), "b").unwrap();
    temp
}

/// Writes a lock file describing this process, adjusted by `edit`.
#[allow(unused)]
pub fn write_lock_file(dir: &Path, edit: impl FnOnce(&mut LockFile)) {
    let mut lock = LockFile::current();
    edit(&mut lock);
    fs::write(dir.join(LOCK_FILE_NAME), lock.to_content()).unwrap();
}

/// Writes a lock file of another user on another machine.
#[allow(unused)]
pub fn write_foreign_lock(dir: &Path) {
    write_lock_file(dir, |lock| {
        lock.full_name = "Someone Else".to_string();
        lock.username = "someone-else".to_string();
        lock.hostname = "elsewhere".to_string();
    });
}

/// Pid of a process that has already exited.
#[allow(unused)]
#[cfg(unix)]
pub fn exited_pid() -> u32 {
    let mut child = std::process::Command::new("true").spawn().unwrap();
    let pid = child.id();
    child.wait().unwrap();
    pid
}

/// Lists all files below `dir` with their content, sorted by path.
///
/// Paths are relative and `/`-separated.
#[allow(unused)]
pub fn read_tree(dir: &Path) -> Vec<(String, Vec<u8>)> {
    fn walk(root: &Path, dir: &Path, out: &mut Vec<(String, Vec<u8>)>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path: PathBuf = entry.unwrap().path();
            if path.is_dir() {
                walk(root, &path, out);
            } else {
                let relative = path.strip_prefix(root).unwrap();
                let relative = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/");
                out.push((relative, fs::read(&path).unwrap()));
            }
        }
    }

    let mut out = Vec::new();
    walk(dir, dir, &mut out);
    out.sort();
    out
}

/// Runs the txdir binary with colors disabled.
#[allow(unused)]
pub fn run_txdir(args: &[&str]) -> assert_cmd::assert::Assert {
    let mut cmd = cargo_bin_cmd!("txdir");
    cmd.args(args).env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd.assert()
}
