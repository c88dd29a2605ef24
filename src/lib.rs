#![doc = include_str!("../README.md")]

pub mod cli;
pub mod command;
pub mod error;
pub mod fs;
pub mod outcome;
pub mod prompt;
pub mod system;

pub use error::*;
pub use fs::{DirectoryLock, LockStatus, TransactionalDirectory, TransactionalFileSystem};
pub use outcome::{Outcome, Response};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn run() -> Result<()> {
    use clap::Parser;

    let cli = cli::Cli::parse();
    init_logging(cli.verbose);
    command::execute(cli.command)
}

/// Logs warnings by default, debug output with `--verbose`. `RUST_LOG`
/// takes precedence over both.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .try_init();
}
