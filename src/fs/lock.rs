//! Advisory, crash-aware directory locks.
//!
//! A directory is locked by creating a `.lock` file inside it. The file
//! records who created it, so later queries can tell apart:
//!
//! - a lock held by this process (possibly through another [`DirectoryLock`])
//! - a lock held by another instance of this application
//! - a lock held by some other user or machine
//! - a stale lock left behind by a process that no longer runs
//!
//! # Lock File Format
//!
//! UTF-8 text with six lines:
//!
//! ```text
//! <full name>
//! <username>
//! <hostname>
//! <pid>
//! <process name>
//! <UTC timestamp, e.g. 2013-04-13T12:43:52Z>
//! ```

use crate::error::{Error, Result};
use crate::fs::util;
use crate::outcome::{Outcome, Response};
use crate::system;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Name of the lock file created inside a locked directory.
pub const LOCK_FILE_NAME: &str = ".lock";

/// Directories locked by this process, keyed by canonical path.
///
/// Several [`DirectoryLock`] objects in one process must recognize each
/// other's locks, which a lock file alone cannot express.
static LOCKED_DIRS: LazyLock<Mutex<HashSet<PathBuf>>> =
    LazyLock::new(|| Mutex::new(HashSet::new()));

/// Callback deciding whether an existing lock may be overridden.
///
/// Receives the locked directory, its status and the full name of the
/// lock owner.
pub type LockHandler<'a> = dyn FnMut(&Path, LockStatus, &str) -> Result<Response> + 'a;

/// State of a directory lock as seen by the querying process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStatus {
    /// No lock file exists.
    Unlocked,
    /// Lock file of a process that is no longer running.
    StaleLock,
    /// Locked by this process.
    LockedByThisApp,
    /// Locked by another running instance of this application.
    LockedByOtherApp,
    /// Locked by another user or on another machine.
    LockedByOtherUser,
    /// Locked by a running process that is not this application.
    LockedByUnknownApp,
}

impl LockStatus {
    /// True for every status that prevents acquiring the lock without asking.
    pub fn is_locked(self) -> bool {
        !matches!(self, LockStatus::Unlocked | LockStatus::StaleLock)
    }
}

impl fmt::Display for LockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            LockStatus::Unlocked => "unlocked",
            LockStatus::StaleLock => "stale lock",
            LockStatus::LockedByThisApp => "locked by this application",
            LockStatus::LockedByOtherApp => "locked by another application instance",
            LockStatus::LockedByOtherUser => "locked by another user",
            LockStatus::LockedByUnknownApp => "locked by an unknown application",
        };
        f.write_str(text)
    }
}

/// Parsed content of a lock file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockFile {
    pub full_name: String,
    pub username: String,
    pub hostname: String,
    pub pid: u32,
    pub process_name: String,
    pub timestamp: DateTime<Utc>,
}

impl LockFile {
    /// Lock file describing the current process, stamped with the current time.
    pub fn current() -> Self {
        Self {
            full_name: system::full_username().to_string(),
            username: system::username().to_string(),
            hostname: system::hostname().to_string(),
            pid: system::pid(),
            process_name: system::process_name().to_string(),
            timestamp: Utc::now().trunc_subsecs(0),
        }
    }

    /// Parses lock file content; `path` is only used for error messages.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let content = content.strip_suffix('\n').unwrap_or(content);
        let lines: Vec<&str> = content.split('\n').collect();
        if lines.len() < 6 {
            return Err(Error::format(
                path,
                format!("expected 6 lines, found {}", lines.len()),
            ));
        }

        let pid = lines[3]
            .trim()
            .parse::<u32>()
            .map_err(|_| Error::format(path, format!("invalid process id '{}'", lines[3])))?;
        let timestamp = DateTime::parse_from_rfc3339(lines[5].trim())
            .map_err(|e| Error::format(path, format!("invalid timestamp '{}': {}", lines[5], e)))?
            .with_timezone(&Utc);

        Ok(Self {
            full_name: lines[0].to_string(),
            username: lines[1].to_string(),
            hostname: lines[2].to_string(),
            pid,
            process_name: lines[4].to_string(),
            timestamp,
        })
    }

    /// Reads and parses the lock file at `path`; `None` if it does not exist.
    pub fn read(path: &Path) -> Result<Option<Self>> {
        match fs::read(path) {
            Ok(bytes) => {
                let content = String::from_utf8(bytes)
                    .map_err(|_| Error::format(path, "lock file is not valid UTF-8"))?;
                Self::parse(&content, path).map(Some)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io(path, e)),
        }
    }

    pub fn to_content(&self) -> String {
        format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            self.full_name,
            self.username,
            self.hostname,
            self.pid,
            self.process_name,
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        )
    }

    /// Whether the lock was created by the current user on this machine.
    fn is_own_user(&self) -> bool {
        self.username == system::username() && self.hostname == system::hostname()
    }
}

/// Lock on a single directory.
///
/// Releases the lock on drop if this object acquired it.
#[derive(Debug, Default)]
pub struct DirectoryLock {
    dir: Option<PathBuf>,
    /// Registry key, set while this object holds the lock.
    registered: Option<PathBuf>,
}

impl DirectoryLock {
    /// Creates a lock object without a target directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a lock object for `dir`. Nothing is locked yet.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            registered: None,
        }
    }

    /// Sets the directory to lock. Fails while a lock is held.
    pub fn set_dir_to_lock(&mut self, dir: impl Into<PathBuf>) -> Result<()> {
        if self.is_locked_by_this_object() {
            return Err(Error::LockHeld(self.dir.clone().unwrap_or_default()));
        }
        self.dir = Some(dir.into());
        Ok(())
    }

    pub fn dir_to_lock(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn lock_file_path(&self) -> Option<PathBuf> {
        self.dir.as_ref().map(|dir| dir.join(LOCK_FILE_NAME))
    }

    pub fn is_locked_by_this_object(&self) -> bool {
        self.registered.is_some()
    }

    /// Current status of the lock.
    pub fn status(&self) -> Result<LockStatus> {
        self.inspect().map(|(status, _)| status)
    }

    /// Current status of the lock together with the parsed lock file.
    ///
    /// Never modifies anything.
    pub fn inspect(&self) -> Result<(LockStatus, Option<LockFile>)> {
        let dir = self.target()?;
        let lock_path = dir.join(LOCK_FILE_NAME);

        let Some(owner) = LockFile::read(&lock_path)? else {
            return Ok((LockStatus::Unlocked, None));
        };

        // A dead pid is stale even if this process registered the directory.
        let status = if !owner.is_own_user() {
            LockStatus::LockedByOtherUser
        } else if !system::is_process_running(owner.pid)? {
            LockStatus::StaleLock
        } else if owner.pid == system::pid() && LOCKED_DIRS.lock().contains(&canonical(dir)?) {
            LockStatus::LockedByThisApp
        } else {
            match system::process_name_by_pid(owner.pid) {
                Some(name) if name == owner.process_name => LockStatus::LockedByOtherApp,
                _ => LockStatus::LockedByUnknownApp,
            }
        };

        log::debug!("Lock status of '{}': {}", dir.display(), status);
        Ok((status, Some(owner)))
    }

    /// Locks the directory unless someone else holds it.
    ///
    /// Unlocked and stale directories are locked right away; the returned
    /// flag tells whether a stale lock was replaced. For any other status
    /// `handler` decides: [`Response::Accept`] overrides the lock,
    /// [`Response::Decline`] fails with [`Error::AlreadyLocked`] and
    /// [`Response::Cancel`] returns [`Outcome::Canceled`]. Without a handler
    /// the call fails with [`Error::AlreadyLocked`].
    pub fn try_lock(&mut self, handler: Option<&mut LockHandler<'_>>) -> Result<Outcome<bool>> {
        let (status, owner) = self.inspect()?;
        let dir = self.target()?.to_path_buf();

        match status {
            LockStatus::Unlocked => {
                self.lock()?;
                Ok(Outcome::Completed(false))
            }
            LockStatus::StaleLock => {
                log::warn!("Overriding stale lock of '{}'", dir.display());
                self.lock()?;
                Ok(Outcome::Completed(true))
            }
            _ => {
                let user = owner.map(|o| o.full_name).unwrap_or_default();
                let response = match handler {
                    Some(handler) => handler(&dir, status, &user)?,
                    None => Response::Decline,
                };
                match response {
                    Response::Accept => {
                        log::info!("Overriding lock of '{}' ({})", dir.display(), status);
                        self.lock()?;
                        Ok(Outcome::Completed(false))
                    }
                    Response::Decline => Err(Error::AlreadyLocked { dir, status, user }),
                    Response::Cancel => {
                        log::debug!("Locking '{}' canceled", dir.display());
                        Ok(Outcome::Canceled)
                    }
                }
            }
        }
    }

    /// Locks the directory, overwriting any existing lock file.
    pub fn lock(&mut self) -> Result<()> {
        let dir = self.target()?.to_path_buf();
        let key = canonical(&dir)?;

        let content = LockFile::current().to_content();
        util::write_atomic(&dir.join(LOCK_FILE_NAME), content.as_bytes())?;
        LOCKED_DIRS.lock().insert(key.clone());
        self.registered = Some(key);

        log::info!("Locked '{}'", dir.display());
        Ok(())
    }

    /// Removes the lock file, regardless of who created it.
    pub fn unlock(&mut self) -> Result<()> {
        let dir = self
            .dir
            .clone()
            .ok_or_else(|| invalid_target(Path::new(""), "no directory set"))?;

        util::remove_file_if_exists(&dir.join(LOCK_FILE_NAME))?;

        let key = match self.registered.take() {
            Some(key) => Some(key),
            None => canonical(&dir).ok(),
        };
        if let Some(key) = key {
            LOCKED_DIRS.lock().remove(&key);
        }

        log::info!("Unlocked '{}'", dir.display());
        Ok(())
    }

    /// Unlocks if this object holds the lock. Returns whether it did.
    pub fn unlock_if_locked(&mut self) -> Result<bool> {
        if !self.is_locked_by_this_object() {
            return Ok(false);
        }
        self.unlock()?;
        Ok(true)
    }

    fn target(&self) -> Result<&Path> {
        let dir = self
            .dir
            .as_deref()
            .ok_or_else(|| invalid_target(Path::new(""), "no directory set"))?;
        if !dir.exists() {
            return Err(invalid_target(dir, "directory does not exist"));
        }
        if !dir.is_dir() {
            return Err(invalid_target(dir, "not a directory"));
        }
        Ok(dir)
    }
}

impl Drop for DirectoryLock {
    fn drop(&mut self) {
        if let Err(e) = self.unlock_if_locked() {
            log::warn!("Failed to release directory lock: {}", e);
        }
    }
}

fn invalid_target(path: &Path, reason: &str) -> Error {
    Error::InvalidLockTarget {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn canonical(dir: &Path) -> Result<PathBuf> {
    fs::canonicalize(dir).map_err(|e| Error::io(dir, e))
}
