use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::commands;

#[derive(Parser, Debug)]
#[command(
    name = "wslmv",
    version,
    about = "Relocate the backing storage of a subsystem instance without data loss"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalFlags,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub struct GlobalFlags {
    /// Instance manager binary to invoke
    #[arg(long, global = true, env = "WSLMV_MANAGER")]
    pub manager: Option<PathBuf>,

    /// Print the final report as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Relocate an instance's backing storage to a new location
    Relocate(commands::relocate::RelocateArgs),

    /// Verify preconditions without changing anything
    Check(commands::check::CheckArgs),

    /// Apply a leftover rollback ledger from a crashed run
    Rollback(commands::rollback::RollbackArgs),
}
