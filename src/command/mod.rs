pub mod archive;
pub mod recover;
pub mod status;
pub mod unlock;

use crate::error::Result;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum Command {
    /// Show lock owner and pending autosave of a directory.
    Status(status::StatusArgs),
    /// Remove a stale or foreign lock.
    Unlock(unlock::UnlockArgs),
    /// Restore or discard the autosave of a directory.
    Recover(recover::RecoverArgs),
    /// Pack a directory into a ZIP archive.
    Export(archive::ExportArgs),
    /// Stage the files of a ZIP archive into a directory and commit them.
    Import(archive::ImportArgs),
}

pub fn execute(command: Command) -> Result<()> {
    match command {
        Command::Status(args) => status::execute(args),
        Command::Unlock(args) => unlock::execute(args),
        Command::Recover(args) => recover::execute(args),
        Command::Export(args) => archive::export(args),
        Command::Import(args) => archive::import(args),
    }
}
