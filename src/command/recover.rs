//! `txdir recover`: restore the autosave of a crashed session.

use crate::error::Result;
use crate::fs::TransactionalFileSystem;
use crate::outcome::{Outcome, Response};
use crate::prompt;
use clap::Parser;
use colored::Colorize;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug, Clone)]
pub struct RecoverArgs {
    /// Directory holding the autosave
    pub dir: PathBuf,

    /// Delete the autosave instead of restoring it
    #[arg(long)]
    pub discard: bool,

    /// Skip interactive confirmation
    #[arg(long = "yes", short = 'y')]
    pub skip_confirmation: bool,
}

pub fn execute(args: RecoverArgs) -> Result<()> {
    if !TransactionalFileSystem::has_autosave(&args.dir) {
        println!("No autosave found in '{}'.", args.dir.display());
        return Ok(());
    }

    let yes = args.skip_confirmation;
    let discard = args.discard;
    let mut restore = |_: &Path| -> Result<Response> {
        if !discard {
            return Ok(Response::Accept);
        }
        Ok(if prompt::confirm("Discard the autosave?", yes)? {
            Response::Decline
        } else {
            Response::Cancel
        })
    };
    let mut lock = prompt::lock_handler(yes);

    let opened =
        TransactionalFileSystem::open(&args.dir, true, Some(&mut restore), Some(&mut lock))?;
    let fs = match opened {
        Outcome::Completed(fs) => fs,
        Outcome::Canceled => {
            prompt::print_cancelled();
            return Ok(());
        }
    };

    if discard {
        println!("{} Discarded autosave of '{}'", "✓".green(), args.dir.display());
        return Ok(());
    }

    let modifications = fs.check_for_modifications()?;
    if modifications.is_empty() {
        fs.save()?;
        println!("Autosave of '{}' holds no changes.", args.dir.display());
        return Ok(());
    }

    prompt::print_paths("Autosaved changes:", &modifications);
    if !prompt::confirm("Apply these changes?", yes)? {
        // The autosave stays on disk for a later attempt.
        prompt::print_cancelled();
        return Ok(());
    }

    fs.save()?;
    println!(
        "{} Restored {} changes in '{}'",
        "✓".green(),
        modifications.len(),
        args.dir.display()
    );
    Ok(())
}
