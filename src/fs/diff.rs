//! On-disk snapshots of staged changes.
//!
//! Two kinds exist. The autosave is written on request and offered for
//! restore on the next writable open. The backup is a journal written at the
//! start of a save and removed at its end; finding one means a save was
//! interrupted.
//!
//! # Layout
//!
//! ```text
//! <root>/.autosave/autosave.json             index
//! <root>/.autosave/<timestamp>/<path>        content of modified files
//! ```
//!
//! The index is written last, through a temporary file and a rename, and
//! removed first. A snapshot without index is incomplete and ignored.

use crate::error::{Error, Result};
use crate::fs::staged::StagedChanges;
use crate::fs::util::{self, clean_path};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Kind of snapshot, each stored in its own reserved directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffKind {
    Autosave,
    Backup,
}

impl DiffKind {
    fn name(self) -> &'static str {
        match self {
            DiffKind::Autosave => "autosave",
            DiffKind::Backup => "backup",
        }
    }

    /// Name of the reserved directory holding this snapshot kind.
    pub fn dir_name(self) -> &'static str {
        match self {
            DiffKind::Autosave => ".autosave",
            DiffKind::Backup => ".backup",
        }
    }

    pub fn dir(self, root: &Path) -> PathBuf {
        root.join(self.dir_name())
    }

    pub fn index_path(self, root: &Path) -> PathBuf {
        self.dir(root).join(format!("{}.json", self.name()))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct DiffIndex {
    created: DateTime<Utc>,
    content_dir: String,
    modified_files: Vec<String>,
    removed_files: Vec<String>,
    removed_dirs: Vec<String>,
}

/// Whether a complete snapshot of `kind` exists below `root`.
pub fn exists(root: &Path, kind: DiffKind) -> bool {
    kind.index_path(root).is_file()
}

/// Writes `changes` as a snapshot of `kind`, replacing any previous one.
pub fn save(root: &Path, kind: DiffKind, changes: &StagedChanges) -> Result<()> {
    let created = Utc::now();
    let dir = kind.dir(root);
    let content_dir = unused_content_dir(&dir, &created);
    let files_dir = dir.join(&content_dir);

    log::debug!(
        "Writing {} of '{}' ({} modified files)",
        kind.name(),
        root.display(),
        changes.modified().len()
    );

    let result = write_snapshot(root, kind, changes, created, &content_dir);
    if let Err(e) = result {
        // The previous index and its content stay untouched.
        if let Err(remove_err) = util::remove_dir_if_exists(&files_dir) {
            log::warn!("Failed to remove incomplete {}: {}", kind.name(), remove_err);
        }
        return Err(e);
    }

    remove_outdated_content(&dir, &content_dir);
    Ok(())
}

fn write_snapshot(
    root: &Path,
    kind: DiffKind,
    changes: &StagedChanges,
    created: DateTime<Utc>,
    content_dir: &str,
) -> Result<()> {
    let files_dir = kind.dir(root).join(content_dir);
    fs::create_dir_all(&files_dir).map_err(|e| Error::io(&files_dir, e))?;
    for (path, content) in changes.modified() {
        util::write_atomic(&files_dir.join(path), content)?;
    }

    let index = DiffIndex {
        created,
        content_dir: content_dir.to_string(),
        modified_files: changes.modified().keys().cloned().collect(),
        removed_files: changes.removed_files().iter().cloned().collect(),
        removed_dirs: changes.removed_dirs().iter().cloned().collect(),
    };
    let json = serde_json::to_vec_pretty(&index).map_err(|e| {
        Error::Other(anyhow::anyhow!("Failed to serialize {}: {}", kind.name(), e))
    })?;

    // Writing the index marks the snapshot as complete.
    util::write_atomic(&kind.index_path(root), &json)
}

/// Timestamped content directory name not yet present in `dir`.
///
/// Never returns the directory of the current snapshot, even when two
/// snapshots are written within the same millisecond.
fn unused_content_dir(dir: &Path, created: &DateTime<Utc>) -> String {
    let base = created.format("%Y-%m-%d_%H-%M-%S-%3f").to_string();
    let mut name = base.clone();
    let mut counter = 1;
    while dir.join(&name).exists() {
        name = format!("{}_{}", base, counter);
        counter += 1;
    }
    name
}

/// Reads the snapshot of `kind` back into an overlay.
pub fn load(root: &Path, kind: DiffKind) -> Result<StagedChanges> {
    let index_path = kind.index_path(root);
    let bytes = fs::read(&index_path).map_err(|e| Error::io(&index_path, e))?;
    let index: DiffIndex = serde_json::from_slice(&bytes)
        .map_err(|e| Error::format(&index_path, e.to_string()))?;

    let content_dir_valid = !index.content_dir.is_empty()
        && !index.content_dir.contains(['/', '\\'])
        && !index.content_dir.starts_with('.');
    if !content_dir_valid {
        return Err(Error::format(
            &index_path,
            format!("invalid content directory '{}'", index.content_dir),
        ));
    }
    let files_dir = kind.dir(root).join(&index.content_dir);

    let mut modified = BTreeMap::new();
    for path in index.modified_files {
        check_entry(&index_path, &path)?;
        let file = files_dir.join(&path);
        let content = fs::read(&file).map_err(|e| Error::io(&file, e))?;
        modified.insert(path, content);
    }

    let mut removed_files = BTreeSet::new();
    for path in index.removed_files {
        check_entry(&index_path, &path)?;
        removed_files.insert(path);
    }

    let mut removed_dirs = BTreeSet::new();
    for key in index.removed_dirs {
        if !key.is_empty() {
            let dir = key.strip_suffix('/').unwrap_or(&key);
            check_entry(&index_path, dir)?;
            if !key.ends_with('/') {
                return Err(Error::format(&index_path, format!("invalid directory '{}'", key)));
            }
        }
        removed_dirs.insert(key);
    }

    log::info!(
        "Loaded {} of '{}' created {}",
        kind.name(),
        root.display(),
        index.created
    );
    Ok(StagedChanges::from_parts(modified, removed_files, removed_dirs))
}

/// Deletes the snapshot of `kind`: the index first, then the directory.
pub fn remove(root: &Path, kind: DiffKind) -> Result<()> {
    util::remove_file_if_exists(&kind.index_path(root))?;
    util::remove_dir_if_exists(&kind.dir(root))
}

fn check_entry(index_path: &Path, path: &str) -> Result<()> {
    let valid = !path.is_empty()
        && clean_path(path) == path
        && !path.split('/').any(|segment| segment == "." || segment == "..");
    if valid {
        Ok(())
    } else {
        Err(Error::format(index_path, format!("invalid path '{}'", path)))
    }
}

fn remove_outdated_content(dir: &Path, current: &str) {
    let Ok((dirs, _)) = util::list_dir(dir) else {
        return;
    };
    for name in dirs.iter().filter(|name| name.as_str() != current) {
        if let Err(e) = util::remove_dir_if_exists(&dir.join(name)) {
            log::warn!("Failed to remove outdated snapshot content: {}", e);
        }
    }
}
