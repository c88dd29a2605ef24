//! Lock-protected, staged access to directory trees.
//!
//! [`DirectoryLock`] keeps writers apart, [`TransactionalFileSystem`]
//! stages changes over one directory and [`TransactionalDirectory`] scopes
//! a shared file system to a subdirectory.

pub mod archive;
pub mod diff;
pub mod directory;
pub mod lock;
pub mod staged;
pub mod transactional;
pub mod util;

pub use directory::TransactionalDirectory;
pub use lock::{DirectoryLock, LOCK_FILE_NAME, LockFile, LockHandler, LockStatus};
pub use staged::{Staged, StagedChanges};
pub use transactional::{ExportFilter, RESERVED_NAMES, RestoreHandler, TransactionalFileSystem};
pub use util::clean_path;
