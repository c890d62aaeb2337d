use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Args;

use wslmv::relocate::Outcome;
use wslmv::{
    CommandManager, InterruptFlag, Prompt, RelocationRequest, Relocator, Strategy,
    constants::instance,
};

#[derive(Args, Debug)]
pub struct RelocateArgs {
    /// Logical name of the instance to relocate
    #[arg(long, default_value = instance::DEFAULT_NAME)]
    pub instance: String,

    /// Existing storage root of the instance
    #[arg(long)]
    pub source: PathBuf,

    /// Destination storage root
    #[arg(long)]
    pub target: PathBuf,

    /// Relocation strategy: archive | copy-relink
    #[arg(long, default_value = "archive")]
    pub strategy: Strategy,

    /// Free-space safety margin override, in GiB
    #[arg(long)]
    pub margin_gib: Option<u64>,

    /// Seconds to wait after shutting instances down
    #[arg(long, default_value_t = 8)]
    pub grace_secs: u64,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

pub fn execute(args: RelocateArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let mut request =
        RelocationRequest::new(args.instance, args.source, args.target, args.strategy);
    request.margin_bytes = args.margin_gib.map(|gib| gib * 1024 * 1024 * 1024);

    tracing::debug!(
        instance = %request.instance,
        strategy = %request.strategy,
        "parsed relocation request"
    );

    let interrupts = InterruptFlag::register().context("failed to install signal handlers")?;

    let mut relocator = Relocator::new(request)
        .with_interrupts(interrupts)
        .with_grace(Duration::from_secs(args.grace_secs));
    if let Some(bin) = &global.manager {
        relocator = relocator.with_manager(CommandManager::new(bin));
    }
    if !args.yes {
        relocator = relocator.with_prompt(StdinPrompt);
    }

    let report = relocator.run()?;

    if global.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    match &report.outcome {
        Outcome::Completed => {
            println!(
                "Relocated '{}' to {}",
                report.instance,
                report.target.display()
            );
            if let Some(backup) = &report.backup_path {
                println!("Backup retained at {}", backup.display());
            }
        }
        Outcome::Aborted { reason } => {
            println!("Aborted: {reason}");
        }
    }
    Ok(())
}

/// Interactive confirmation on stderr, mirroring the audit-trail stream.
struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn confirm(&self, message: &str) -> bool {
        eprint!("{message} [y/N]: ");
        let _ = io::stderr().flush();

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line).is_err() {
            return false;
        }
        matches!(line.trim(), "y" | "Y" | "yes" | "Yes" | "YES")
    }
}
