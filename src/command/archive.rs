//! `txdir export` and `txdir import`.

use crate::error::{Error, Result};
use crate::fs::{TransactionalFileSystem, clean_path};
use crate::outcome::Outcome;
use crate::prompt;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
pub struct ExportArgs {
    /// Directory to export
    pub dir: PathBuf,

    /// ZIP file to create
    pub zip: PathBuf,

    /// Only export files below this relative path (repeatable)
    #[arg(long, value_name = "PREFIX")]
    pub include: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct ImportArgs {
    /// ZIP file to import
    pub zip: PathBuf,

    /// Target directory; files missing from the archive are kept
    pub dir: PathBuf,

    /// Show what would change without applying any modifications
    #[arg(long, short = 'n')]
    pub dry_run: bool,

    /// Skip interactive confirmation
    #[arg(long = "yes", short = 'y')]
    pub skip_confirmation: bool,
}

pub fn export(args: ExportArgs) -> Result<()> {
    if !args.dir.is_dir() {
        return Err(Error::NotFound(args.dir));
    }

    let fs = TransactionalFileSystem::open_read_only(&args.dir)?;
    let prefixes: Vec<String> = args
        .include
        .iter()
        .map(|p| clean_path(p))
        .filter(|p| !p.is_empty())
        .collect();
    let filter = |path: &str| is_included(path, &prefixes);

    if prefixes.is_empty() {
        fs.export_to_zip_file(&args.zip, None)?;
    } else {
        fs.export_to_zip_file(&args.zip, Some(&filter))?;
    }

    println!(
        "{} Exported '{}' to '{}'",
        "✓".green(),
        args.dir.display(),
        args.zip.display()
    );
    Ok(())
}

pub fn import(args: ImportArgs) -> Result<()> {
    let mut lock = prompt::lock_handler(args.skip_confirmation);
    let fs = match TransactionalFileSystem::open(&args.dir, true, None, Some(&mut lock))? {
        Outcome::Completed(fs) => fs,
        Outcome::Canceled => {
            prompt::print_cancelled();
            return Ok(());
        }
    };

    fs.load_from_zip_file(&args.zip)?;
    let modifications = fs.check_for_modifications()?;
    if modifications.is_empty() {
        println!("'{}' already matches the archive.", args.dir.display());
        return Ok(());
    }

    prompt::print_paths("Files to import:", &modifications);
    if args.dry_run {
        println!("{}", "Dry run: no changes written.".yellow());
        return Ok(());
    }
    if !prompt::confirm("Continue?", args.skip_confirmation)? {
        prompt::print_cancelled();
        return Ok(());
    }

    fs.save()?;
    println!(
        "{} Imported {} files into '{}'",
        "✓".green(),
        modifications.len(),
        args.dir.display()
    );
    Ok(())
}

/// Whether `path` equals one of the prefixes or lies below one.
fn is_included(path: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|prefix| {
        path == prefix
            || path
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    })
}
