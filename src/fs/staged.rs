//! In-memory overlay of staged file changes.
//!
//! Paths are cleaned relative paths (see [`clean_path`]). Removed
//! directories are stored as keys with a trailing `/`, the root as the
//! empty key, so that a directory key is a plain string prefix of every
//! path below it.
//!
//! A path is never both modified and removed, and a removed directory
//! shadows everything nested beneath it.
//!
//! [`clean_path`]: crate::fs::util::clean_path

use std::collections::{BTreeMap, BTreeSet};

/// Resolution of one path against the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staged<'a> {
    /// Not touched by the overlay; the file on disk (if any) is visible.
    Unchanged,
    /// Staged content replacing whatever is on disk.
    Modified(&'a [u8]),
    /// Removed directly or through a removed parent directory.
    Removed,
}

/// Turns a cleaned directory path into its key: `"a/b"` becomes `"a/b/"`,
/// the root stays `""`.
pub fn dir_key(dir: &str) -> String {
    if dir.is_empty() {
        String::new()
    } else {
        format!("{}/", dir)
    }
}

/// Staged writes and removals on top of a base directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedChanges {
    modified: BTreeMap<String, Vec<u8>>,
    removed_files: BTreeSet<String>,
    removed_dirs: BTreeSet<String>,
}

impl StagedChanges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds an overlay from its parts, e.g. after loading a snapshot.
    ///
    /// Removed directories are given as keys (see [`dir_key`]).
    pub fn from_parts(
        modified: BTreeMap<String, Vec<u8>>,
        removed_files: BTreeSet<String>,
        removed_dirs: BTreeSet<String>,
    ) -> Self {
        Self {
            modified,
            removed_files,
            removed_dirs,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.modified.is_empty() && self.removed_files.is_empty() && self.removed_dirs.is_empty()
    }

    pub fn modified(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.modified
    }

    pub fn removed_files(&self) -> &BTreeSet<String> {
        &self.removed_files
    }

    /// Keys of removed directories.
    pub fn removed_dirs(&self) -> &BTreeSet<String> {
        &self.removed_dirs
    }

    pub fn resolve(&self, path: &str) -> Staged<'_> {
        if self.covering_dir(path).is_some() || self.removed_files.contains(path) {
            Staged::Removed
        } else if let Some(content) = self.modified.get(path) {
            Staged::Modified(content)
        } else {
            Staged::Unchanged
        }
    }

    /// Whether a file path is hidden by a file or directory removal.
    pub fn is_removed(&self, path: &str) -> bool {
        matches!(self.resolve(path), Staged::Removed)
    }

    /// Whether the directory itself or one of its parents was removed.
    pub fn is_dir_removed(&self, dir: &str) -> bool {
        self.covering_dir(&dir_key(dir)).is_some()
    }

    /// Returns the outermost removed directory key that shadows `path`.
    ///
    /// `path` may be a file path or a directory key.
    pub fn covering_dir(&self, path: &str) -> Option<&str> {
        if self.removed_dirs.contains("") {
            return Some("");
        }
        let mut end = 0;
        while let Some(offset) = path[end..].find('/') {
            end += offset + 1;
            if let Some(key) = self.removed_dirs.get(&path[..end]) {
                return Some(key.as_str());
            }
        }
        None
    }

    /// Stages new content for a file and clears a removal marker at that path.
    ///
    /// Callers must first lift any directory removal shadowing `path`.
    pub fn write(&mut self, path: &str, content: Vec<u8>) {
        self.removed_files.remove(path);
        self.modified.insert(path.to_string(), content);
    }

    pub fn remove_file(&mut self, path: &str) {
        self.modified.remove(path);
        self.removed_files.insert(path.to_string());
    }

    /// Marks a directory as removed and forgets everything staged below it.
    pub fn remove_dir(&mut self, dir: &str) {
        let key = dir_key(dir);
        self.modified.retain(|path, _| !path.starts_with(&key));
        self.removed_files.retain(|path| !path.starts_with(&key));
        self.removed_dirs.retain(|other| !other.starts_with(&key));
        self.removed_dirs.insert(key);
    }

    /// Drops a directory removal marker, given as key.
    pub fn unmark_dir(&mut self, key: &str) {
        self.removed_dirs.remove(key);
    }

    /// Marks a directory removed without touching staged content below it.
    pub fn mark_dir(&mut self, key: String) {
        self.removed_dirs.insert(key);
    }

    /// Marks a file removed without touching a staged modification.
    pub fn mark_file(&mut self, path: String) {
        self.removed_files.insert(path);
    }

    /// Paths of staged files located below the directory key `key`.
    pub fn modified_below<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.modified
            .keys()
            .filter(move |path| path.starts_with(key))
            .map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.modified.clear();
        self.removed_files.clear();
        self.removed_dirs.clear();
    }
}
