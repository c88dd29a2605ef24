//! Scoped handles onto a shared [`TransactionalFileSystem`].

use crate::error::{Error, Result};
use crate::fs::transactional::TransactionalFileSystem;
use crate::fs::util::{clean_path, join_path};
use std::path::PathBuf;
use std::sync::Arc;

/// A subdirectory of a [`TransactionalFileSystem`].
///
/// Every path passed to a method is relative to this directory. Any number
/// of handles may share one file system.
#[derive(Debug, Clone)]
pub struct TransactionalDirectory {
    fs: Arc<TransactionalFileSystem>,
    path: String,
}

impl TransactionalDirectory {
    pub fn new(fs: Arc<TransactionalFileSystem>, path: &str) -> Self {
        Self {
            fs,
            path: clean_path(path),
        }
    }

    /// Handle for the root of `fs`.
    pub fn root(fs: Arc<TransactionalFileSystem>) -> Self {
        Self::new(fs, "")
    }

    /// Handle for a subdirectory of this directory.
    pub fn child(&self, path: &str) -> Self {
        Self::new(Arc::clone(&self.fs), &join_path(&self.path, path))
    }

    pub fn file_system(&self) -> &Arc<TransactionalFileSystem> {
        &self.fs
    }

    /// Path of this directory relative to the file system root.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_writable(&self) -> bool {
        self.fs.is_writable()
    }

    pub fn abs_path(&self, path: &str) -> PathBuf {
        self.fs.abs_path(&self.resolve(path))
    }

    pub fn dirs(&self, path: &str) -> Result<Vec<String>> {
        self.fs.dirs(&self.resolve(path))
    }

    pub fn files(&self, path: &str) -> Result<Vec<String>> {
        self.fs.files(&self.resolve(path))
    }

    pub fn file_exists(&self, path: &str) -> bool {
        self.fs.file_exists(&self.resolve(path))
    }

    pub fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.fs.read(&self.resolve(path))
    }

    pub fn read_if_exists(&self, path: &str) -> Result<Option<Vec<u8>>> {
        self.fs.read_if_exists(&self.resolve(path))
    }

    pub fn write(&self, path: &str, content: &[u8]) -> Result<()> {
        self.fs.write(&self.resolve(path), content)
    }

    pub fn rename_file(&self, src: &str, dst: &str) -> Result<()> {
        self.fs.rename_file(&self.resolve(src), &self.resolve(dst))
    }

    pub fn remove_file(&self, path: &str) -> Result<()> {
        self.fs.remove_file(&self.resolve(path))
    }

    pub fn remove_dir_recursively(&self, path: &str) -> Result<()> {
        self.fs.remove_dir_recursively(&self.resolve(path))
    }

    /// Replaces the content of `dst` with the content of this directory.
    ///
    /// `dst` may live on another file system. Overlapping directories of
    /// the same file system are rejected.
    pub fn copy_to(&self, dst: &TransactionalDirectory) -> Result<()> {
        if Arc::ptr_eq(&self.fs, &dst.fs) && overlaps(&self.path, &dst.path) {
            return Err(Error::Other(anyhow::anyhow!(
                "Cannot copy '{}' into overlapping directory '{}'",
                self.path,
                dst.path
            )));
        }

        let mut files = Vec::new();
        self.collect_files("", &mut files)?;

        dst.remove_dir_recursively("")?;
        for path in &files {
            dst.write(path, &self.read(path)?)?;
        }

        log::debug!(
            "Copied {} files from '{}' to '{}'",
            files.len(),
            self.abs_path("").display(),
            dst.abs_path("").display()
        );
        Ok(())
    }

    /// Copies this directory to `dst` and continues as a handle for `dst`.
    pub fn save_to(&mut self, dst: &TransactionalDirectory) -> Result<()> {
        self.copy_to(dst)?;
        self.retarget(dst);
        Ok(())
    }

    /// Copies this directory to `dst`, removes it, and continues as a
    /// handle for `dst`.
    pub fn move_to(&mut self, dst: &TransactionalDirectory) -> Result<()> {
        self.copy_to(dst)?;
        self.remove_dir_recursively("")?;
        self.retarget(dst);
        Ok(())
    }

    fn retarget(&mut self, dst: &TransactionalDirectory) {
        self.fs = Arc::clone(&dst.fs);
        self.path = dst.path.clone();
    }

    fn resolve(&self, path: &str) -> String {
        join_path(&self.path, path)
    }

    /// Relative paths of all files below `dir`, skipping dot-directories.
    fn collect_files(&self, dir: &str, files: &mut Vec<String>) -> Result<()> {
        for name in self.dirs(dir)? {
            if !name.starts_with('.') {
                self.collect_files(&join_path(dir, &name), files)?;
            }
        }
        for name in self.files(dir)? {
            files.push(join_path(dir, &name));
        }
        Ok(())
    }
}

fn overlaps(a: &str, b: &str) -> bool {
    a.is_empty()
        || b.is_empty()
        || a == b
        || b.starts_with(&format!("{}/", a))
        || a.starts_with(&format!("{}/", b))
}
