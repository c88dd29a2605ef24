//! `txdir unlock`: remove a lock left behind by a crash.

use crate::error::{Error, Result};
use crate::fs::{DirectoryLock, LockStatus};
use crate::prompt;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
pub struct UnlockArgs {
    /// Locked directory
    pub dir: PathBuf,

    /// Also remove locks held by running processes or other users
    #[arg(long, short = 'f')]
    pub force: bool,

    /// Skip interactive confirmation
    #[arg(long = "yes", short = 'y')]
    pub skip_confirmation: bool,
}

pub fn execute(args: UnlockArgs) -> Result<()> {
    let mut lock = DirectoryLock::with_dir(&args.dir);
    let (status, owner) = lock.inspect()?;
    let user = owner.map(|o| o.full_name).unwrap_or_default();

    match status {
        LockStatus::Unlocked => {
            println!("'{}' is not locked.", args.dir.display());
            return Ok(());
        }
        LockStatus::StaleLock => {
            println!(
                "'{}' has a stale lock of {}.",
                args.dir.display(),
                user.cyan()
            );
        }
        _ if !args.force => {
            return Err(Error::AlreadyLocked {
                dir: args.dir,
                status,
                user,
            });
        }
        _ => {
            println!(
                "'{}' is {} ({}).",
                args.dir.display(),
                status,
                user.cyan()
            );
        }
    }

    if !prompt::confirm("Remove the lock?", args.skip_confirmation)? {
        prompt::print_cancelled();
        return Ok(());
    }

    lock.unlock()?;
    println!("{} Removed lock of '{}'", "✓".green(), args.dir.display());
    Ok(())
}
