//! `txdir status`: read-only report on a directory.

use crate::error::Result;
use crate::fs::{DirectoryLock, LockFile, LockStatus, TransactionalFileSystem};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
pub struct StatusArgs {
    /// Directory to inspect
    pub dir: PathBuf,
}

pub fn execute(args: StatusArgs) -> Result<()> {
    let (status, owner) = DirectoryLock::with_dir(&args.dir).inspect()?;

    println!("{} {}", "Directory:".bold(), args.dir.display());
    println!("{} {}", "Lock:".bold(), describe_lock(status, owner.as_ref()));
    println!(
        "{} {}",
        "Autosave:".bold(),
        pending(TransactionalFileSystem::has_autosave(&args.dir))
    );
    println!(
        "{} {}",
        "Interrupted save:".bold(),
        pending(TransactionalFileSystem::has_interrupted_save(&args.dir))
    );

    Ok(())
}

fn describe_lock(status: LockStatus, owner: Option<&LockFile>) -> String {
    let text = match owner {
        Some(owner) => format!(
            "{} by {} ({}@{}, pid {}, {}) since {}",
            status,
            owner.full_name,
            owner.username,
            owner.hostname,
            owner.pid,
            owner.process_name,
            owner.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        None => status.to_string(),
    };
    match status {
        LockStatus::Unlocked => text.green().to_string(),
        LockStatus::StaleLock => text.yellow().to_string(),
        _ => text.red().to_string(),
    }
}

fn pending(present: bool) -> String {
    if present {
        "pending".yellow().to_string()
    } else {
        "none".green().to_string()
    }
}
