//! Path normalization and small disk helpers shared by the fs modules.

use crate::error::{Error, Result};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

/// Normalizes a relative path: trims it, converts `\` to `/` and drops
/// empty segments. The empty string denotes the root.
pub fn clean_path(path: &str) -> String {
    path.trim()
        .replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
        .trim()
        .to_string()
}

/// Joins two relative paths and cleans the result.
pub fn join_path(base: &str, path: &str) -> String {
    clean_path(&format!("{}/{}", base, path))
}

/// Prefix of the temporary files created by [`write_atomic`].
pub const TEMP_FILE_PREFIX: &str = ".txdir-";

const TEMP_FILE_SUFFIX: &str = ".tmp";

/// Whether `name` is a temporary file of [`write_atomic`], possibly left
/// behind by a crash.
pub fn is_temp_file(name: &str) -> bool {
    name.starts_with(TEMP_FILE_PREFIX) && name.ends_with(TEMP_FILE_SUFFIX)
}

/// Writes `content` to `path` through a uniquely named temporary sibling and
/// a rename, so readers never observe a half-written file and no other file
/// is touched. Parent directories are created.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;

    let mut builder = tempfile::Builder::new();
    builder.prefix(TEMP_FILE_PREFIX).suffix(TEMP_FILE_SUFFIX);
    // Same mode as `File::create`; tempfile defaults to owner-only.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    let mut temp = builder.tempfile_in(parent).map_err(|e| Error::io(parent, e))?;
    temp.write_all(content).map_err(|e| Error::io(temp.path(), e))?;
    temp.as_file().sync_all().map_err(|e| Error::io(temp.path(), e))?;

    // On failure the temporary file is deleted when the error is dropped.
    temp.persist(path).map_err(|e| Error::io(path, e.error))?;
    Ok(())
}

/// Removes a file; a file that is already gone is not an error.
pub fn remove_file_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Removes a directory tree; a directory that is already gone is not an error.
pub fn remove_dir_if_exists(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Lists the names of the immediate children of `dir`, split into
/// directories and files. A missing directory yields two empty lists.
///
/// Leftover temporary files of [`write_atomic`] are not listed.
pub fn list_dir(dir: &Path) -> Result<(Vec<String>, Vec<String>)> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
            return Ok((dirs, files));
        }
        Err(e) => return Err(Error::io(dir, e)),
    };

    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        // Follow symlinks so a linked directory lists as a directory.
        let path = entry.path();
        if is_temp_file(&name) {
            continue;
        }
        if path.is_dir() {
            dirs.push(name);
        } else if path.is_file() {
            files.push(name);
        }
    }

    Ok((dirs, files))
}
