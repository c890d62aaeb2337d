use std::path::PathBuf;

use clap::Args;

use wslmv::{CommandManager, RollbackLedger};

#[derive(Args, Debug)]
pub struct RollbackArgs {
    /// Ledger mirror left behind by a crashed run
    #[arg(long)]
    pub ledger: PathBuf,
}

pub fn execute(args: RollbackArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let mut ledger = RollbackLedger::load(&args.ledger)?;

    if ledger.is_empty() {
        println!("Ledger is empty, nothing to roll back");
        return Ok(());
    }

    let manager = match &global.manager {
        Some(bin) => CommandManager::new(bin),
        None => CommandManager::from_env(),
    };

    println!(
        "Applying {} recorded remedies from {}",
        ledger.len(),
        args.ledger.display()
    );
    for remedy in ledger.entries() {
        println!("  {}", remedy.describe());
    }

    ledger.unwind(&manager)?;

    println!("Rollback complete");
    Ok(())
}
