//! Interactive prompts for the command-line front end.
//!
//! Prompts are skipped when `--yes` is given. On a non-interactive terminal
//! they answer "no" so scripts never hang waiting for input.

use crate::error::{Error, Result};
use crate::fs::LockStatus;
use crate::outcome::Response;
use colored::Colorize;
use std::io::{self, IsTerminal, Write};
use std::path::Path;

/// Number of paths printed before the list is abbreviated.
const MAX_LISTED: usize = 20;

/// Asks a yes/no question. Returns `Ok(true)` if the user agrees.
///
/// # Errors
///
/// Returns `Err` only on I/O errors reading stdin.
pub fn confirm(question: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }

    if !io::stdin().is_terminal() {
        log::warn!("Non-interactive terminal detected. Use --yes to confirm automatically.");
        return Ok(false);
    }

    print!("{} {} ", question.bold(), "(y/N)".dimmed());
    io::stdout().flush().map_err(|e| Error::io("<stdout>", e))?;

    let mut response = String::new();
    io::stdin()
        .read_line(&mut response)
        .map_err(|e| Error::io("<stdin>", e))?;

    let response = response.trim();
    let confirmed = response.eq_ignore_ascii_case("y") || response.eq_ignore_ascii_case("yes");
    if !confirmed {
        log::info!("Declined: {}", question);
    }
    Ok(confirmed)
}

/// Lock handler asking whether to override an existing lock.
///
/// Declining cancels the operation.
pub fn lock_handler(assume_yes: bool) -> impl FnMut(&Path, LockStatus, &str) -> Result<Response> {
    move |dir, status, user| {
        let owner = if user.is_empty() { "unknown" } else { user };
        println!(
            "{} '{}' is {} ({})",
            "Locked:".bold().yellow(),
            dir.display(),
            status,
            owner.cyan()
        );
        if status == LockStatus::LockedByOtherUser {
            println!(
                "  {} Overriding may corrupt data if the other user is still working on it.",
                "!".red()
            );
        }
        let accepted = confirm("Override the lock?", assume_yes)?;
        Ok(if accepted {
            Response::Accept
        } else {
            Response::Cancel
        })
    }
}

/// Prints a titled list of paths, abbreviated after a few entries.
pub fn print_paths(title: &str, paths: &[String]) {
    println!("\n{}", title.bold().cyan());
    for path in paths.iter().take(MAX_LISTED) {
        println!("  {} {}", "✓".green(), path);
    }
    if paths.len() > MAX_LISTED {
        println!("  • ... and {} more", paths.len() - MAX_LISTED);
    }
    println!();
}

/// Message shown when the user backs out of an operation.
pub fn print_cancelled() {
    println!("{}", "Operation cancelled.".yellow());
}
