//! Staged, crash-recoverable view of a directory tree.
//!
//! A [`TransactionalFileSystem`] reads through an in-memory overlay onto a
//! base directory. Writes and removals only touch the overlay until
//! [`save`](TransactionalFileSystem::save) applies them to disk.
//!
//! ## Lifecycle
//!
//! 1. **Open**: a writable open locks the directory and offers a pending
//!    autosave for restore; a read-only open never writes anything
//! 2. **Stage**: `write()`, `rename_file()`, `remove_file()` and
//!    `remove_dir_recursively()` record changes in memory
//! 3. **Autosave** (optional, repeatable): persist the overlay for crash recovery
//! 4. **Save** or **discard**: apply the overlay to disk, or drop it
//!
//! ## Save Journal
//!
//! `save()` first writes the overlay to a backup snapshot, then applies it,
//! then deletes the backup. If the process dies in between, the next open
//! loads the backup so the save can be repeated. Files written before the
//! crash are not rolled back.
//!
//! ## Reserved Entries
//!
//! The root entries `.lock`, `.autosave` and `.backup` belong to this layer.
//! They are not listed, not exported, cannot be written through the
//! overlay and survive removal of the root directory.
//!
//! ## Example
//!
//! ```no_run
//! # use txdir::fs::TransactionalFileSystem;
//! # fn example() -> txdir::Result<()> {
//! let fs = TransactionalFileSystem::open_writable("project")?;
//!
//! fs.write("settings/app.json", b"{}")?;
//! fs.remove_file("obsolete.txt")?;
//! fs.autosave()?; // survives a crash
//!
//! fs.save()?; // applies both changes to disk
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use crate::fs::archive::{self, ArchiveWriter};
use crate::fs::diff::{self, DiffKind};
use crate::fs::lock::{DirectoryLock, LOCK_FILE_NAME, LockHandler};
use crate::fs::staged::{Staged, StagedChanges, dir_key};
use crate::fs::util::{self, clean_path, join_path};
use crate::outcome::{Outcome, Response};
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fs;
use std::io::{BufReader, BufWriter, Cursor, Seek, Write};
use std::path::{Component, Path, PathBuf};

/// Root entries owned by the file system itself.
pub const RESERVED_NAMES: [&str; 3] = [LOCK_FILE_NAME, ".autosave", ".backup"];

/// Callback deciding what to do with a pending autosave.
///
/// [`Response::Accept`] restores it, [`Response::Decline`] deletes it and
/// [`Response::Cancel`] aborts the open.
pub type RestoreHandler<'a> = dyn FnMut(&Path) -> Result<Response> + 'a;

/// Predicate selecting which files to export, given their relative path.
pub type ExportFilter<'a> = dyn Fn(&str) -> bool + 'a;

#[derive(Debug)]
struct State {
    changes: StagedChanges,
    lock: Option<DirectoryLock>,
    restored_from_autosave: bool,
}

/// In-memory overlay over one directory, committed with [`save`](Self::save).
///
/// All methods take `&self` and serialize on an internal recursive mutex, so
/// an instance can be shared between threads (see
/// [`TransactionalDirectory`](crate::fs::TransactionalDirectory)). Separate
/// instances on the same directory are kept apart by the directory lock.
#[derive(Debug)]
pub struct TransactionalFileSystem {
    root: PathBuf,
    writable: bool,
    state: ReentrantMutex<RefCell<State>>,
}

impl TransactionalFileSystem {
    /// Opens the directory at `path`.
    ///
    /// A writable open creates the directory if needed and locks it,
    /// consulting `lock_handler` if it is locked already. A pending autosave
    /// is then passed to `restore_handler`; without a handler it is left
    /// untouched. Either callback answering [`Response::Cancel`] yields
    /// [`Outcome::Canceled`] with no lock held and no snapshot consumed.
    ///
    /// A read-only open neither locks nor looks at the autosave.
    pub fn open(
        path: impl AsRef<Path>,
        writable: bool,
        restore_handler: Option<&mut RestoreHandler<'_>>,
        lock_handler: Option<&mut LockHandler<'_>>,
    ) -> Result<Outcome<Self>> {
        let root = path.as_ref().to_path_buf();

        let mut lock = None;
        if writable {
            fs::create_dir_all(&root).map_err(|e| Error::io(&root, e))?;
            let mut dir_lock = DirectoryLock::with_dir(&root);
            match dir_lock.try_lock(lock_handler)? {
                Outcome::Completed(_) => lock = Some(dir_lock),
                Outcome::Canceled => return Ok(Outcome::Canceled),
            }
        }

        let mut changes = StagedChanges::new();
        if diff::exists(&root, DiffKind::Backup) {
            log::warn!(
                "Found journal of an interrupted save in '{}', loading it",
                root.display()
            );
            changes = diff::load(&root, DiffKind::Backup)?;
        }

        let mut restored_from_autosave = false;
        if writable && diff::exists(&root, DiffKind::Autosave) {
            match restore_handler {
                Some(handler) => match handler(&root)? {
                    Response::Accept => {
                        log::info!("Restoring autosave of '{}'", root.display());
                        changes = diff::load(&root, DiffKind::Autosave)?;
                        restored_from_autosave = true;
                    }
                    Response::Decline => {
                        log::info!("Discarding autosave of '{}'", root.display());
                        diff::remove(&root, DiffKind::Autosave)?;
                    }
                    Response::Cancel => {
                        log::debug!("Opening '{}' canceled", root.display());
                        return Ok(Outcome::Canceled);
                    }
                },
                None => log::debug!("Leaving autosave of '{}' untouched", root.display()),
            }
        }

        log::debug!(
            "Opened '{}' ({})",
            root.display(),
            if writable { "read-write" } else { "read-only" }
        );

        Ok(Outcome::Completed(Self {
            root,
            writable,
            state: ReentrantMutex::new(RefCell::new(State {
                changes,
                lock,
                restored_from_autosave,
            })),
        }))
    }

    /// Opens read-only. Never modifies anything on disk.
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(path, false, None, None)?
            .completed()
            .ok_or_else(|| Error::Other(anyhow::anyhow!("Opening was canceled")))
    }

    /// Opens writable, failing if the directory is locked.
    pub fn open_writable(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(path, true, None, None)?
            .completed()
            .ok_or_else(|| Error::Other(anyhow::anyhow!("Opening was canceled")))
    }

    /// Whether `path` holds a restorable autosave. Never modifies anything.
    pub fn has_autosave(path: impl AsRef<Path>) -> bool {
        diff::exists(path.as_ref(), DiffKind::Autosave)
    }

    /// Whether `path` holds the journal of an interrupted save.
    pub fn has_interrupted_save(path: impl AsRef<Path>) -> bool {
        diff::exists(path.as_ref(), DiffKind::Backup)
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// Whether the overlay was loaded from an autosave that is not saved yet.
    pub fn is_restored_from_autosave(&self) -> bool {
        self.state.lock().borrow().restored_from_autosave
    }

    /// Absolute path of `path` inside the base directory.
    pub fn abs_path(&self, path: &str) -> PathBuf {
        let path = clean_path(path);
        if path.is_empty() {
            self.root.clone()
        } else {
            self.root.join(path)
        }
    }

    /// Names of the subdirectories of `dir`, sorted.
    pub fn dirs(&self, dir: &str) -> Result<Vec<String>> {
        let guard = self.state.lock();
        let state = guard.borrow();
        let changes = &state.changes;
        let dir = clean_path(dir);
        let key = dir_key(&dir);
        let mut names = BTreeSet::new();

        if !changes.is_dir_removed(&dir) {
            let (disk_dirs, _) = util::list_dir(&self.abs_path(&dir))?;
            for name in disk_dirs {
                if key.is_empty() && is_reserved(&name) {
                    continue;
                }
                if !changes.is_dir_removed(&format!("{}{}", key, name)) {
                    names.insert(name);
                }
            }
        }

        for path in changes.modified_below(&key) {
            if let Some((name, _)) = path[key.len()..].split_once('/') {
                if !changes.is_removed(path) {
                    names.insert(name.to_string());
                }
            }
        }

        Ok(names.into_iter().collect())
    }

    /// Names of the files in `dir`, sorted.
    pub fn files(&self, dir: &str) -> Result<Vec<String>> {
        let guard = self.state.lock();
        let state = guard.borrow();
        let changes = &state.changes;
        let dir = clean_path(dir);
        let key = dir_key(&dir);
        let mut names = BTreeSet::new();

        if !changes.is_dir_removed(&dir) {
            let (_, disk_files) = util::list_dir(&self.abs_path(&dir))?;
            for name in disk_files {
                if key.is_empty() && is_reserved(&name) {
                    continue;
                }
                if !changes.is_removed(&format!("{}{}", key, name)) {
                    names.insert(name);
                }
            }
        }

        for path in changes.modified_below(&key) {
            let name = &path[key.len()..];
            if !name.contains('/') && !changes.is_removed(path) {
                names.insert(name.to_string());
            }
        }

        Ok(names.into_iter().collect())
    }

    pub fn file_exists(&self, path: &str) -> bool {
        let guard = self.state.lock();
        let state = guard.borrow();
        let path = clean_path(path);
        if is_reserved(&path) {
            return false;
        }
        match state.changes.resolve(&path) {
            Staged::Modified(_) => true,
            Staged::Removed => false,
            Staged::Unchanged => !path.is_empty() && self.abs_path(&path).is_file(),
        }
    }

    /// Content of a file, fails with [`Error::NotFound`] if it does not exist.
    pub fn read(&self, path: &str) -> Result<Vec<u8>> {
        let guard = self.state.lock();
        let state = guard.borrow();
        let path = clean_path(path);
        let abs = self.abs_path(&path);
        if is_reserved(&path) {
            return Err(Error::NotFound(abs));
        }

        match state.changes.resolve(&path) {
            Staged::Modified(content) => Ok(content.to_vec()),
            Staged::Removed => Err(Error::NotFound(abs)),
            Staged::Unchanged if path.is_empty() => Err(Error::NotFound(abs)),
            Staged::Unchanged => fs::read(&abs).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::NotFound(abs.clone())
                } else {
                    Error::io(&abs, e)
                }
            }),
        }
    }

    /// Like [`read`](Self::read), but a missing file yields `None`.
    pub fn read_if_exists(&self, path: &str) -> Result<Option<Vec<u8>>> {
        match self.read(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Stages new content for a file.
    ///
    /// Writing below a removed directory keeps the rest of that directory
    /// removed but makes this file visible again.
    pub fn write(&self, path: &str, content: &[u8]) -> Result<()> {
        self.check_writable()?;
        let path = clean_path(path);
        check_file_path(&path)?;

        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        self.lift_dir_removal(&mut state.changes, &path)?;
        state.changes.write(&path, content.to_vec());

        log::debug!("Staged write of '{}' ({} bytes)", path, content.len());
        Ok(())
    }

    /// Moves a file within the overlay: writes `dst`, then removes `src`.
    pub fn rename_file(&self, src: &str, dst: &str) -> Result<()> {
        self.check_writable()?;
        let src = clean_path(src);
        let dst = clean_path(dst);
        check_file_path(&src)?;
        check_file_path(&dst)?;

        let _guard = self.state.lock();
        let content = self.read(&src)?;
        if src == dst {
            return Ok(());
        }
        self.write(&dst, &content)?;
        self.remove_file(&src)?;

        log::debug!("Staged rename '{}' → '{}'", src, dst);
        Ok(())
    }

    /// Stages removal of a file. Removing a file that does not exist is a no-op.
    pub fn remove_file(&self, path: &str) -> Result<()> {
        self.check_writable()?;
        let path = clean_path(path);
        check_file_path(&path)?;

        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        let exists = match state.changes.resolve(&path) {
            Staged::Modified(_) => true,
            Staged::Removed => false,
            Staged::Unchanged => self.abs_path(&path).is_file(),
        };
        if exists {
            state.changes.remove_file(&path);
            log::debug!("Staged removal of '{}'", path);
        }
        Ok(())
    }

    /// Stages removal of a directory and everything below it.
    ///
    /// The empty path removes all content of the root directory.
    pub fn remove_dir_recursively(&self, dir: &str) -> Result<()> {
        self.check_writable()?;
        let dir = clean_path(dir);
        if is_reserved(&dir) {
            return Err(reserved_path(&dir));
        }

        let guard = self.state.lock();
        guard.borrow_mut().changes.remove_dir(&dir);

        log::debug!("Staged removal of directory '{}'", dir);
        Ok(())
    }

    /// Persists the overlay so it can be restored after a crash.
    pub fn autosave(&self) -> Result<()> {
        self.check_writable()?;

        let guard = self.state.lock();
        let state = guard.borrow();
        diff::save(&self.root, DiffKind::Autosave, &state.changes)?;

        log::info!("Autosaved '{}'", self.root.display());
        Ok(())
    }

    /// Drops all staged changes together with the autosave.
    ///
    /// On a read-only instance only the overlay is cleared.
    pub fn discard_changes(&self) -> Result<()> {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        state.changes.clear();
        state.restored_from_autosave = false;

        if self.writable {
            diff::remove(&self.root, DiffKind::Autosave)?;
            diff::remove(&self.root, DiffKind::Backup)?;
        }

        log::info!("Discarded changes of '{}'", self.root.display());
        Ok(())
    }

    /// Lists the paths a [`save`](Self::save) would change on disk, sorted.
    ///
    /// Removed directories and files are listed if they exist on disk,
    /// staged files if they are new or differ from disk.
    pub fn check_for_modifications(&self) -> Result<Vec<String>> {
        let guard = self.state.lock();
        let state = guard.borrow();
        let changes = &state.changes;
        let mut modifications = BTreeSet::new();

        for key in changes.removed_dirs() {
            let dir = key.trim_end_matches('/');
            if dir.is_empty() {
                let (dirs, files) = util::list_dir(&self.root)?;
                modifications.extend(dirs.into_iter().chain(files).filter(|n| !is_reserved(n)));
            } else if self.abs_path(dir).is_dir() {
                modifications.insert(dir.to_string());
            }
        }

        for path in changes.removed_files() {
            if changes.covering_dir(path).is_none() && self.abs_path(path).is_file() {
                modifications.insert(path.clone());
            }
        }

        for (path, content) in changes.modified() {
            let abs = self.abs_path(path);
            if !abs.is_file() {
                modifications.insert(path.clone());
                continue;
            }
            let on_disk = fs::read(&abs).map_err(|e| Error::io(&abs, e))?;
            if on_disk != *content {
                modifications.insert(path.clone());
            }
        }

        Ok(modifications.into_iter().collect())
    }

    /// Applies all staged changes to disk and clears the overlay.
    ///
    /// On failure the error names the first path that could not be written.
    /// The save journal then stays on disk and the overlay is kept, so the
    /// save can be retried, also after a restart.
    pub fn save(&self) -> Result<()> {
        self.check_writable()?;

        let guard = self.state.lock();
        let mut state = guard.borrow_mut();

        if state.changes.is_empty() {
            diff::remove(&self.root, DiffKind::Autosave)?;
            state.restored_from_autosave = false;
            log::debug!("Nothing to save in '{}'", self.root.display());
            return Ok(());
        }

        diff::save(&self.root, DiffKind::Backup, &state.changes)?;

        // The journal now holds everything an outdated autosave could offer.
        state.restored_from_autosave = false;
        diff::remove(&self.root, DiffKind::Autosave)?;

        let changes = &state.changes;
        for key in changes.removed_dirs() {
            let dir = key.trim_end_matches('/');
            if dir.is_empty() {
                self.clear_root()?;
            } else {
                let abs = self.abs_path(dir);
                if abs.is_dir() {
                    fs::remove_dir_all(&abs).map_err(|e| Error::io(&abs, e))?;
                    log::debug!("Removed directory '{}'", abs.display());
                }
            }
        }

        for path in changes.removed_files() {
            let abs = self.abs_path(path);
            if abs.is_file() {
                util::remove_file_if_exists(&abs)?;
                log::debug!("Removed '{}'", abs.display());
            }
        }

        for (path, content) in changes.modified() {
            let abs = self.abs_path(path);
            util::write_atomic(&abs, content)?;
            log::debug!("Wrote '{}'", abs.display());
        }

        diff::remove(&self.root, DiffKind::Backup)?;

        let count = changes.modified().len()
            + changes.removed_files().len()
            + changes.removed_dirs().len();
        state.changes.clear();

        log::info!("Saved {} changes to '{}'", count, self.root.display());
        Ok(())
    }

    /// Releases the directory lock early, keeping the staged changes.
    ///
    /// Returns whether a lock was released.
    pub fn release_lock(&self) -> Result<bool> {
        let guard = self.state.lock();
        let lock = guard.borrow_mut().lock.take();
        match lock {
            Some(mut lock) => lock.unlock_if_locked(),
            None => Ok(false),
        }
    }

    /// Replaces the overlay with the files of a ZIP archive.
    ///
    /// The base directory is not touched.
    pub fn load_from_zip(&self, content: &[u8]) -> Result<()> {
        self.check_writable()?;
        let entries = archive::read_entries(Cursor::new(content))?;
        self.load_entries(entries)
    }

    /// Replaces the overlay with the files of the ZIP archive at `path`.
    pub fn load_from_zip_file(&self, path: &Path) -> Result<()> {
        self.check_writable()?;
        let file = fs::File::open(path).map_err(|e| Error::io(path, e))?;
        let entries = archive::read_entries(BufReader::new(file))?;
        self.load_entries(entries)
    }

    /// Packs the logical tree into a ZIP archive in memory.
    ///
    /// Dot-directories and lock files are skipped; `filter` may exclude more.
    pub fn export_to_zip(&self, filter: Option<&ExportFilter<'_>>) -> Result<Vec<u8>> {
        let _guard = self.state.lock();
        let mut writer = ArchiveWriter::new(Cursor::new(Vec::new()));
        self.export_dir(&mut writer, "", None, filter)?;
        Ok(writer.finish()?.into_inner())
    }

    /// Packs the logical tree into a ZIP file at `path`.
    ///
    /// If `path` lies inside the base directory it is not packed into
    /// itself. A partially written file is deleted on failure.
    pub fn export_to_zip_file(&self, path: &Path, filter: Option<&ExportFilter<'_>>) -> Result<()> {
        let _guard = self.state.lock();
        let skip = self.relative_path_of(path);

        let file = fs::File::create(path).map_err(|e| Error::io(path, e))?;
        let result = (|| -> Result<()> {
            let mut writer = ArchiveWriter::new(BufWriter::new(file));
            self.export_dir(&mut writer, "", skip.as_deref(), filter)?;
            let mut buffered = writer.finish()?;
            buffered.flush().map_err(|e| Error::io(path, e))?;
            let file = buffered
                .into_inner()
                .map_err(|e| Error::io(path, e.into_error()))?;
            file.sync_all().map_err(|e| Error::io(path, e))
        })();

        if let Err(e) = result {
            if let Err(remove_err) = fs::remove_file(path) {
                log::warn!(
                    "Failed to remove incomplete archive '{}': {}",
                    path.display(),
                    remove_err
                );
            }
            return Err(e);
        }

        log::info!("Exported '{}' to '{}'", self.root.display(), path.display());
        Ok(())
    }

    fn check_writable(&self) -> Result<()> {
        if self.writable {
            Ok(())
        } else {
            Err(Error::ReadOnly(self.root.clone()))
        }
    }

    fn load_entries(&self, entries: Vec<(String, Vec<u8>)>) -> Result<()> {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        state.changes.clear();

        let mut loaded = 0;
        for (path, content) in entries {
            if is_reserved(&path) {
                log::warn!("Skipping reserved path '{}' in archive", path);
                continue;
            }
            self.lift_dir_removal(&mut state.changes, &path)?;
            state.changes.write(&path, content);
            loaded += 1;
        }

        log::info!("Loaded {} files from archive into '{}'", loaded, self.root.display());
        Ok(())
    }

    /// Narrows a directory removal shadowing `path` so that `path` itself
    /// can be written.
    ///
    /// Every disk entry of the removed directory that is not on the way to
    /// `path` is marked removed individually.
    fn lift_dir_removal(&self, changes: &mut StagedChanges, path: &str) -> Result<()> {
        while let Some(key) = changes.covering_dir(path).map(str::to_string) {
            changes.unmark_dir(&key);

            let segments: Vec<&str> = path[key.len()..].split('/').collect();
            let mut level = key;
            for (index, segment) in segments.iter().enumerate() {
                let is_last = index + 1 == segments.len();
                let (disk_dirs, disk_files) = util::list_dir(&self.abs_path(&level))?;

                for name in disk_dirs {
                    if level.is_empty() && is_reserved(&name) {
                        continue;
                    }
                    if is_last || name != *segment {
                        changes.mark_dir(format!("{}{}/", level, name));
                    }
                }
                for name in disk_files {
                    if level.is_empty() && is_reserved(&name) {
                        continue;
                    }
                    if !(is_last && name == *segment) {
                        changes.mark_file(format!("{}{}", level, name));
                    }
                }

                level = format!("{}{}/", level, segment);
            }
        }
        Ok(())
    }

    /// Removes everything in the base directory except reserved entries.
    fn clear_root(&self) -> Result<()> {
        let (dirs, files) = util::list_dir(&self.root)?;
        for name in dirs.iter().filter(|n| !is_reserved(n)) {
            util::remove_dir_if_exists(&self.root.join(name))?;
        }
        for name in files.iter().filter(|n| !is_reserved(n)) {
            util::remove_file_if_exists(&self.root.join(name))?;
        }
        log::debug!("Cleared '{}'", self.root.display());
        Ok(())
    }

    fn export_dir<W: Write + Seek>(
        &self,
        writer: &mut ArchiveWriter<W>,
        dir: &str,
        skip: Option<&str>,
        filter: Option<&ExportFilter<'_>>,
    ) -> Result<()> {
        for name in self.dirs(dir)? {
            // e.g. ".git", ".autosave"
            if name.starts_with('.') {
                continue;
            }
            self.export_dir(writer, &join_path(dir, &name), skip, filter)?;
        }

        for name in self.files(dir)? {
            let path = join_path(dir, &name);
            if name == LOCK_FILE_NAME || skip == Some(path.as_str()) {
                continue;
            }
            if let Some(filter) = filter {
                if !filter(&path) {
                    continue;
                }
            }
            let content = self.read(&path)?;
            writer.add(&path, &content)?;
        }

        Ok(())
    }

    /// Path of `file` relative to the base directory, if it lies inside.
    fn relative_path_of(&self, file: &Path) -> Option<String> {
        let file = std::path::absolute(file).ok()?;
        let root = std::path::absolute(&self.root).ok()?;
        let relative = pathdiff::diff_paths(file, root)?;
        if relative.components().next() == Some(Component::ParentDir) {
            return None;
        }
        Some(clean_path(relative.to_str()?))
    }
}

/// Whether a cleaned path lies in a reserved root entry or names a
/// temporary file of an atomic write.
fn is_reserved(path: &str) -> bool {
    let first = path.split('/').next().unwrap_or_default();
    RESERVED_NAMES.contains(&first) || path.split('/').any(util::is_temp_file)
}

fn reserved_path(path: &str) -> Error {
    Error::Other(anyhow::anyhow!("Path '{}' is reserved", path))
}

fn check_file_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(Error::Other(anyhow::anyhow!("Empty file path")));
    }
    if path.split('/').any(|segment| segment == "." || segment == "..") {
        return Err(Error::Other(anyhow::anyhow!(
            "Path '{}' must not contain relative segments",
            path
        )));
    }
    if is_reserved(path) {
        return Err(reserved_path(path));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::lock::LockStatus;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn restore(response: Response) -> impl FnMut(&Path) -> Result<Response> {
        move |_| Ok(response)
    }

    fn accept_lock() -> impl FnMut(&Path, LockStatus, &str) -> Result<Response> {
        |_, _, _| Ok(Response::Accept)
    }

    fn setup() -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "a").unwrap();
        fs::create_dir_all(temp.path().join("dir/sub")).unwrap();
        fs::write(temp.path().join("dir/x.txt"), "x").unwrap();
        fs::write(temp.path().join("dir/sub/y.txt"), "y").unwrap();
        temp
    }

    fn snapshot(dir: &Path) -> Vec<(PathBuf, Vec<u8>)> {
        let mut entries = Vec::new();
        let mut stack = vec![dir.to_path_buf()];
        while let Some(current) = stack.pop() {
            for entry in fs::read_dir(&current).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    entries.push((path.clone(), Vec::new()));
                    stack.push(path);
                } else {
                    entries.push((path.clone(), fs::read(&path).unwrap()));
                }
            }
        }
        entries.sort();
        entries
    }

    #[test]
    fn test_reads_fall_through_to_disk() {
        let temp = setup();
        let tfs = TransactionalFileSystem::open_writable(temp.path()).unwrap();

        assert_eq!(tfs.read("a.txt").unwrap(), b"a");
        assert_eq!(tfs.read("dir\\x.txt").unwrap(), b"x");
        assert!(tfs.file_exists("/dir/sub/y.txt"));
        assert!(!tfs.file_exists("dir"));
        assert_eq!(tfs.dirs("").unwrap(), vec!["dir"]);
        assert_eq!(tfs.files("").unwrap(), vec!["a.txt"]);
        assert_eq!(tfs.abs_path("dir/x.txt"), temp.path().join("dir/x.txt"));
        assert_eq!(tfs.abs_path(""), temp.path());
    }

    #[test]
    fn test_read_missing() {
        let temp = setup();
        let tfs = TransactionalFileSystem::open_read_only(temp.path()).unwrap();

        assert!(matches!(tfs.read("missing.txt"), Err(Error::NotFound(_))));
        assert!(tfs.read("").unwrap_err().is_not_found());
        assert_eq!(tfs.read_if_exists("missing.txt").unwrap(), None);
        assert_eq!(tfs.read_if_exists("a.txt").unwrap(), Some(b"a".to_vec()));
    }

    #[test]
    fn test_write_is_staged() {
        let temp = setup();
        let tfs = TransactionalFileSystem::open_writable(temp.path()).unwrap();

        tfs.write("a.txt", b"changed").unwrap();
        tfs.write("new/deep/file.txt", b"new").unwrap();

        assert_eq!(tfs.read("a.txt").unwrap(), b"changed");
        assert_eq!(tfs.read("new/deep/file.txt").unwrap(), b"new");
        assert_eq!(tfs.dirs("").unwrap(), vec!["dir", "new"]);
        assert_eq!(tfs.dirs("new").unwrap(), vec!["deep"]);
        assert_eq!(tfs.files("new/deep").unwrap(), vec!["file.txt"]);
        assert_eq!(fs::read_to_string(temp.path().join("a.txt")).unwrap(), "a");
        assert!(!temp.path().join("new").exists());
    }

    #[test]
    fn test_remove_file_is_staged() {
        let temp = setup();
        let tfs = TransactionalFileSystem::open_writable(temp.path()).unwrap();

        tfs.remove_file("dir/x.txt").unwrap();
        tfs.remove_file("never-existed.txt").unwrap();

        assert!(!tfs.file_exists("dir/x.txt"));
        assert!(tfs.read("dir/x.txt").unwrap_err().is_not_found());
        assert!(tfs.files("dir").unwrap().is_empty());
        assert!(temp.path().join("dir/x.txt").exists());
        assert_eq!(tfs.check_for_modifications().unwrap(), vec!["dir/x.txt"]);
    }

    #[test]
    fn test_removed_dir_shadows_disk_content() {
        let temp = setup();
        let tfs = TransactionalFileSystem::open_writable(temp.path()).unwrap();

        tfs.write("dir/staged.txt", b"s").unwrap();
        tfs.remove_dir_recursively("dir").unwrap();

        assert!(!tfs.file_exists("dir/x.txt"));
        assert!(!tfs.file_exists("dir/sub/y.txt"));
        assert!(!tfs.file_exists("dir/staged.txt"));
        assert!(tfs.dirs("").unwrap().is_empty());
        assert!(tfs.files("dir").unwrap().is_empty());
        assert!(tfs.dirs("dir").unwrap().is_empty());
    }

    #[test]
    fn test_write_into_removed_dir() {
        let temp = setup();
        let tfs = TransactionalFileSystem::open_writable(temp.path()).unwrap();

        tfs.remove_dir_recursively("dir").unwrap();
        tfs.write("dir/sub/fresh.txt", b"f").unwrap();

        assert_eq!(tfs.dirs("").unwrap(), vec!["dir"]);
        assert_eq!(tfs.dirs("dir").unwrap(), vec!["sub"]);
        assert!(tfs.files("dir").unwrap().is_empty());
        assert_eq!(tfs.files("dir/sub").unwrap(), vec!["fresh.txt"]);
        assert!(!tfs.file_exists("dir/x.txt"));
        assert!(!tfs.file_exists("dir/sub/y.txt"));

        tfs.save().unwrap();

        assert!(!temp.path().join("dir/x.txt").exists());
        assert!(!temp.path().join("dir/sub/y.txt").exists());
        assert_eq!(
            fs::read_to_string(temp.path().join("dir/sub/fresh.txt")).unwrap(),
            "f"
        );
    }

    #[test]
    fn test_rename_file() {
        let temp = setup();
        let tfs = TransactionalFileSystem::open_writable(temp.path()).unwrap();

        tfs.rename_file("a.txt", "moved/b.txt").unwrap();
        assert!(!tfs.file_exists("a.txt"));
        assert_eq!(tfs.read("moved/b.txt").unwrap(), b"a");

        tfs.rename_file("moved/b.txt", "moved/b.txt").unwrap();
        assert_eq!(tfs.read("moved/b.txt").unwrap(), b"a");

        assert!(tfs.rename_file("missing", "other").unwrap_err().is_not_found());
    }

    #[test]
    fn test_reserved_paths() {
        let temp = setup();
        let tfs = TransactionalFileSystem::open_writable(temp.path()).unwrap();

        assert!(tfs.write(".lock", b"x").is_err());
        assert!(tfs.write(".autosave/autosave.json", b"x").is_err());
        assert!(tfs.remove_dir_recursively(".backup").is_err());
        assert!(tfs.write("", b"x").is_err());
        assert!(tfs.write("dir/../escape.txt", b"x").is_err());
        // Only root entries are reserved.
        tfs.write("dir/.lock", b"x").unwrap();
    }

    #[test]
    fn test_reserved_paths_are_invisible() {
        let temp = setup();
        let tfs = TransactionalFileSystem::open_writable(temp.path()).unwrap();
        tfs.write("a.txt", b"changed").unwrap();
        tfs.autosave().unwrap();
        fs::write(temp.path().join(".txdir-leftover.tmp"), "partial").unwrap();

        assert!(!tfs.file_exists(".lock"));
        assert!(!tfs.file_exists(".autosave/autosave.json"));
        assert!(tfs.read(".lock").unwrap_err().is_not_found());
        assert!(tfs.read(".txdir-leftover.tmp").unwrap_err().is_not_found());
        assert!(tfs.write("dir/.txdir-x.tmp", b"x").is_err());
        assert_eq!(tfs.files("").unwrap(), vec!["a.txt"]);
    }

    #[test]
    fn test_failed_rename_leaves_overlay_untouched() {
        let temp = setup();
        let tfs = TransactionalFileSystem::open_writable(temp.path()).unwrap();

        assert!(tfs.rename_file(".lock", "stolen.txt").is_err());
        assert!(tfs.rename_file("a.txt", ".backup/a.txt").is_err());

        assert!(!tfs.file_exists("stolen.txt"));
        assert!(tfs.file_exists("a.txt"));
        assert!(tfs.check_for_modifications().unwrap().is_empty());
    }

    #[test]
    fn test_save_leaves_unstaged_files_alone() {
        let temp = setup();
        fs::write(temp.path().join("a.txt.tmp"), "user data").unwrap();
        fs::write(temp.path().join("dir/x.txt.tmp"), "more user data").unwrap();
        let tfs = TransactionalFileSystem::open_writable(temp.path()).unwrap();

        tfs.write("a.txt", b"changed").unwrap();
        tfs.write("dir/x.txt", b"changed").unwrap();
        tfs.save().unwrap();

        assert_eq!(
            fs::read_to_string(temp.path().join("a.txt.tmp")).unwrap(),
            "user data"
        );
        assert_eq!(
            fs::read_to_string(temp.path().join("dir/x.txt.tmp")).unwrap(),
            "more user data"
        );
        assert_eq!(tfs.files("").unwrap(), vec!["a.txt", "a.txt.tmp"]);
        assert_eq!(tfs.files("dir").unwrap(), vec!["x.txt", "x.txt.tmp"]);
    }

    #[test]
    fn test_failed_autosave_keeps_previous_snapshot() {
        let temp = TempDir::new().unwrap();
        {
            let tfs = TransactionalFileSystem::open_writable(temp.path()).unwrap();
            tfs.write("x.txt", b"1").unwrap();
            tfs.autosave().unwrap();

            // "a" cannot be a file and a directory at once.
            tfs.write("a", b"file").unwrap();
            tfs.write("a/b", b"nested").unwrap();
            assert!(tfs.autosave().is_err());
        }

        let mut accept = restore(Response::Accept);
        let tfs = TransactionalFileSystem::open(temp.path(), true, Some(&mut accept), None)
            .unwrap()
            .completed()
            .unwrap();

        assert_eq!(tfs.read("x.txt").unwrap(), b"1");
        assert!(!tfs.file_exists("a"));
    }

    #[test]
    fn test_read_only_rejects_writes_without_side_effects() {
        let temp = setup();
        let before = snapshot(temp.path());

        let tfs = TransactionalFileSystem::open_read_only(temp.path()).unwrap();
        assert!(!tfs.is_writable());
        assert!(matches!(tfs.write("b.txt", b"b"), Err(Error::ReadOnly(_))));
        assert!(matches!(tfs.rename_file("a.txt", "b.txt"), Err(Error::ReadOnly(_))));
        assert!(matches!(tfs.remove_file("a.txt"), Err(Error::ReadOnly(_))));
        assert!(matches!(tfs.remove_dir_recursively("dir"), Err(Error::ReadOnly(_))));
        assert!(matches!(tfs.autosave(), Err(Error::ReadOnly(_))));
        assert!(matches!(tfs.save(), Err(Error::ReadOnly(_))));
        assert!(matches!(tfs.load_from_zip(&[]), Err(Error::ReadOnly(_))));
        tfs.discard_changes().unwrap();
        assert!(!tfs.release_lock().unwrap());
        tfs.export_to_zip(None).unwrap();
        tfs.check_for_modifications().unwrap();
        drop(tfs);

        assert_eq!(snapshot(temp.path()), before);
    }

    #[test]
    fn test_read_only_ignores_autosave() {
        let temp = setup();
        {
            let tfs = TransactionalFileSystem::open_writable(temp.path()).unwrap();
            tfs.write("a.txt", b"autosaved").unwrap();
            tfs.autosave().unwrap();
        }
        let before = snapshot(temp.path());

        let mut handler = restore(Response::Accept);
        let tfs = TransactionalFileSystem::open(temp.path(), false, Some(&mut handler), None)
            .unwrap()
            .completed()
            .unwrap();

        assert_eq!(tfs.read("a.txt").unwrap(), b"a");
        assert!(!tfs.is_restored_from_autosave());
        drop(tfs);
        assert_eq!(snapshot(temp.path()), before);
    }

    #[test]
    fn test_writable_open_locks_and_creates_dir() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("new-project");

        let tfs = TransactionalFileSystem::open_writable(&root).unwrap();
        assert!(root.join(LOCK_FILE_NAME).is_file());
        assert!(tfs.files("").unwrap().is_empty());

        drop(tfs);
        assert!(!root.join(LOCK_FILE_NAME).exists());
    }

    #[test]
    fn test_second_writable_open_is_refused() {
        let temp = setup();
        let first = TransactionalFileSystem::open_writable(temp.path()).unwrap();

        let second = TransactionalFileSystem::open_writable(temp.path());
        assert!(matches!(second, Err(Error::AlreadyLocked { .. })));

        let mut handler = accept_lock();
        let second = TransactionalFileSystem::open(temp.path(), true, None, Some(&mut handler))
            .unwrap()
            .completed();
        assert!(second.is_some());
        drop(first);
    }

    #[test]
    fn test_lock_cancel_aborts_open() {
        let temp = setup();
        let _first = TransactionalFileSystem::open_writable(temp.path()).unwrap();

        let mut handler = |_: &Path, _: LockStatus, _: &str| Ok::<_, Error>(Response::Cancel);
        let outcome =
            TransactionalFileSystem::open(temp.path(), true, None, Some(&mut handler)).unwrap();

        assert!(outcome.is_canceled());
    }

    #[test]
    fn test_crash_and_restore() {
        let temp = TempDir::new().unwrap();
        {
            let a = TransactionalFileSystem::open_writable(temp.path()).unwrap();
            a.write("x.txt", b"1").unwrap();
            a.autosave().unwrap();
        }
        assert!(TransactionalFileSystem::has_autosave(temp.path()));

        let mut handler = restore(Response::Accept);
        let b = TransactionalFileSystem::open(temp.path(), true, Some(&mut handler), None)
            .unwrap()
            .completed()
            .unwrap();

        assert_eq!(b.read("x.txt").unwrap(), b"1");
        assert!(b.is_restored_from_autosave());
        assert!(!temp.path().join("x.txt").exists());

        b.save().unwrap();
        assert!(!b.is_restored_from_autosave());
        assert!(!TransactionalFileSystem::has_autosave(temp.path()));
        assert_eq!(fs::read_to_string(temp.path().join("x.txt")).unwrap(), "1");
    }

    #[test]
    fn test_crash_and_decline_restore() {
        let temp = TempDir::new().unwrap();
        {
            let a = TransactionalFileSystem::open_writable(temp.path()).unwrap();
            a.write("x.txt", b"1").unwrap();
            a.autosave().unwrap();
        }

        let mut handler = restore(Response::Decline);
        let b = TransactionalFileSystem::open(temp.path(), true, Some(&mut handler), None)
            .unwrap()
            .completed()
            .unwrap();

        assert!(matches!(b.read("x.txt"), Err(Error::NotFound(_))));
        assert!(!b.is_restored_from_autosave());
        assert!(!TransactionalFileSystem::has_autosave(temp.path()));
        assert!(!temp.path().join(".autosave").exists());
    }

    #[test]
    fn test_restore_cancel_and_missing_handler() {
        let temp = TempDir::new().unwrap();
        {
            let a = TransactionalFileSystem::open_writable(temp.path()).unwrap();
            a.write("x.txt", b"1").unwrap();
            a.autosave().unwrap();
        }

        let mut handler = restore(Response::Cancel);
        let outcome =
            TransactionalFileSystem::open(temp.path(), true, Some(&mut handler), None).unwrap();
        assert!(outcome.is_canceled());
        assert!(!temp.path().join(LOCK_FILE_NAME).exists());
        assert!(TransactionalFileSystem::has_autosave(temp.path()));

        let tfs = TransactionalFileSystem::open_writable(temp.path()).unwrap();
        assert!(!tfs.file_exists("x.txt"));
        assert!(TransactionalFileSystem::has_autosave(temp.path()));
    }

    #[test]
    fn test_restore_handler_error_aborts_open() {
        let temp = TempDir::new().unwrap();
        {
            let a = TransactionalFileSystem::open_writable(temp.path()).unwrap();
            a.autosave().unwrap();
        }

        let mut handler =
            |_: &Path| -> Result<Response> { Err(Error::Other(anyhow::anyhow!("no answer"))) };
        let result = TransactionalFileSystem::open(temp.path(), true, Some(&mut handler), None);

        assert!(matches!(result, Err(Error::Other(_))));
        assert!(!temp.path().join(LOCK_FILE_NAME).exists());
        assert!(TransactionalFileSystem::has_autosave(temp.path()));
    }

    #[test]
    fn test_save_applies_changes() {
        let temp = setup();
        let tfs = TransactionalFileSystem::open_writable(temp.path()).unwrap();

        tfs.write("a.txt", b"changed").unwrap();
        tfs.write("new/file.txt", b"new").unwrap();
        tfs.remove_file("dir/x.txt").unwrap();
        tfs.remove_dir_recursively("dir/sub").unwrap();
        tfs.autosave().unwrap();

        tfs.save().unwrap();

        assert_eq!(fs::read_to_string(temp.path().join("a.txt")).unwrap(), "changed");
        assert_eq!(fs::read_to_string(temp.path().join("new/file.txt")).unwrap(), "new");
        assert!(!temp.path().join("dir/x.txt").exists());
        assert!(!temp.path().join("dir/sub").exists());
        assert!(temp.path().join("dir").is_dir());
        assert!(!temp.path().join(".autosave").exists());
        assert!(!temp.path().join(".backup").exists());
        assert!(tfs.check_for_modifications().unwrap().is_empty());

        let before = snapshot(temp.path());
        tfs.save().unwrap();
        assert_eq!(snapshot(temp.path()), before);
    }

    #[test]
    fn test_save_root_removal_keeps_reserved_entries() {
        let temp = setup();
        let tfs = TransactionalFileSystem::open_writable(temp.path()).unwrap();

        tfs.remove_dir_recursively("").unwrap();
        assert!(tfs.dirs("").unwrap().is_empty());
        assert!(tfs.files("").unwrap().is_empty());
        assert_eq!(tfs.check_for_modifications().unwrap(), vec!["a.txt", "dir"]);

        tfs.write("fresh.txt", b"f").unwrap();
        tfs.save().unwrap();

        let (dirs, files) = util::list_dir(temp.path()).unwrap();
        assert!(dirs.is_empty());
        let mut files = files;
        files.sort();
        assert_eq!(files, vec![LOCK_FILE_NAME, "fresh.txt"]);
    }

    #[test]
    fn test_check_for_modifications() {
        let temp = setup();
        let tfs = TransactionalFileSystem::open_writable(temp.path()).unwrap();

        tfs.write("a.txt", b"a").unwrap();
        tfs.write("b.txt", b"b").unwrap();
        tfs.write("dir/x.txt", b"changed").unwrap();
        tfs.remove_dir_recursively("dir/sub").unwrap();
        tfs.remove_dir_recursively("ghost").unwrap();

        assert_eq!(
            tfs.check_for_modifications().unwrap(),
            vec!["b.txt", "dir/sub", "dir/x.txt"]
        );
    }

    #[test]
    fn test_discard_changes() {
        let temp = setup();
        let tfs = TransactionalFileSystem::open_writable(temp.path()).unwrap();
        let disk_files = tfs.files("").unwrap();

        tfs.write("b.txt", b"b").unwrap();
        tfs.remove_dir_recursively("dir").unwrap();
        tfs.autosave().unwrap();

        tfs.discard_changes().unwrap();

        assert_eq!(tfs.files("").unwrap(), disk_files);
        assert_eq!(tfs.dirs("").unwrap(), vec!["dir"]);
        assert!(tfs.check_for_modifications().unwrap().is_empty());
        assert!(!TransactionalFileSystem::has_autosave(temp.path()));
    }

    #[test]
    fn test_interrupted_save_is_resumed() {
        let temp = setup();
        let mut changes = StagedChanges::new();
        changes.write("a.txt", b"journal".to_vec());
        changes.remove_dir("dir");
        diff::save(temp.path(), DiffKind::Backup, &changes).unwrap();
        assert!(TransactionalFileSystem::has_interrupted_save(temp.path()));

        let ro = TransactionalFileSystem::open_read_only(temp.path()).unwrap();
        assert_eq!(ro.read("a.txt").unwrap(), b"journal");
        assert!(!ro.file_exists("dir/x.txt"));
        drop(ro);
        assert!(TransactionalFileSystem::has_interrupted_save(temp.path()));

        let tfs = TransactionalFileSystem::open_writable(temp.path()).unwrap();
        tfs.save().unwrap();

        assert_eq!(fs::read_to_string(temp.path().join("a.txt")).unwrap(), "journal");
        assert!(!temp.path().join("dir").exists());
        assert!(!TransactionalFileSystem::has_interrupted_save(temp.path()));
    }

    #[test]
    fn test_release_lock_keeps_changes() {
        let temp = setup();
        let tfs = TransactionalFileSystem::open_writable(temp.path()).unwrap();
        tfs.write("b.txt", b"b").unwrap();

        assert!(tfs.release_lock().unwrap());
        assert!(!tfs.release_lock().unwrap());
        assert!(!temp.path().join(LOCK_FILE_NAME).exists());
        assert_eq!(tfs.read("b.txt").unwrap(), b"b");

        let other = TransactionalFileSystem::open_writable(temp.path()).unwrap();
        assert!(!other.file_exists("b.txt"));
    }

    #[test]
    fn test_zip_round_trip() {
        let temp = setup();
        fs::create_dir(temp.path().join(".git")).unwrap();
        fs::write(temp.path().join(".git/HEAD"), "ref").unwrap();
        let tfs = TransactionalFileSystem::open_writable(temp.path()).unwrap();
        tfs.write("a.txt", b"unsaved").unwrap();
        tfs.remove_file("dir/x.txt").unwrap();
        tfs.write("dir/sub/.lock", b"nested lock").unwrap();

        let zip = tfs.export_to_zip(None).unwrap();

        let target = TempDir::new().unwrap();
        let copy = TransactionalFileSystem::open_writable(target.path()).unwrap();
        copy.load_from_zip(&zip).unwrap();

        assert_eq!(copy.dirs("").unwrap(), vec!["dir"]);
        assert_eq!(copy.files("").unwrap(), vec!["a.txt"]);
        assert_eq!(copy.read("a.txt").unwrap(), b"unsaved");
        assert!(copy.files("dir").unwrap().is_empty());
        assert_eq!(copy.files("dir/sub").unwrap(), vec!["y.txt"]);
        assert!(!target.path().join("a.txt").exists());
    }

    #[test]
    fn test_export_filter() {
        let temp = setup();
        let tfs = TransactionalFileSystem::open_read_only(temp.path()).unwrap();

        let only_dir = |path: &str| path.starts_with("dir/");
        let zip = tfs.export_to_zip(Some(&only_dir)).unwrap();

        let entries = archive::read_entries(Cursor::new(zip)).unwrap();
        let paths: Vec<&str> = entries.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(paths, vec!["dir/sub/y.txt", "dir/x.txt"]);
    }

    #[test]
    fn test_export_to_file_inside_root_skips_itself() {
        let temp = setup();
        let tfs = TransactionalFileSystem::open_writable(temp.path()).unwrap();
        let output = temp.path().join("export.zip");

        tfs.export_to_zip_file(&output, None).unwrap();

        let entries = archive::read_entries(fs::File::open(&output).unwrap()).unwrap();
        let paths: Vec<&str> = entries.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(paths, vec!["dir/sub/y.txt", "dir/x.txt", "a.txt"]);
    }

    #[test]
    fn test_load_from_zip_replaces_overlay() {
        let temp = setup();
        let tfs = TransactionalFileSystem::open_writable(temp.path()).unwrap();
        tfs.write("staged.txt", b"s").unwrap();

        let source = TempDir::new().unwrap();
        fs::write(source.path().join("z.txt"), "z").unwrap();
        let zip = TransactionalFileSystem::open_read_only(source.path())
            .unwrap()
            .export_to_zip(None)
            .unwrap();

        tfs.load_from_zip(&zip).unwrap();

        assert!(!tfs.file_exists("staged.txt"));
        assert_eq!(tfs.read("z.txt").unwrap(), b"z");
        assert_eq!(tfs.read("a.txt").unwrap(), b"a");
        assert!(tfs.load_from_zip(b"garbage").is_err());
        assert_eq!(tfs.read("z.txt").unwrap(), b"z");
    }

    #[test]
    fn test_shared_between_threads() {
        let temp = TempDir::new().unwrap();
        let tfs = Arc::new(TransactionalFileSystem::open_writable(temp.path()).unwrap());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let tfs = Arc::clone(&tfs);
                std::thread::spawn(move || {
                    for j in 0..10 {
                        tfs.write(&format!("t{}/f{}.txt", i, j), b"x").unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(tfs.dirs("").unwrap().len(), 4);
        assert_eq!(tfs.check_for_modifications().unwrap().len(), 40);
    }
}
