use crate::command::Command;
use clap::Parser;

#[derive(Parser)]
#[command(
    name = "txdir",
    version,
    about = "Inspect and recover lock-protected, transactional directories"
)]
pub struct Cli {
    /// Print debug logs (overridden by RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}
