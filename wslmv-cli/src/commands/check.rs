use std::path::PathBuf;

use clap::Args;

use wslmv::relocate::precheck::{self, EuidPrivileges};
use wslmv::storage::SysinfoProbe;
use wslmv::{RelocationRequest, Strategy, constants::instance};

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Logical name of the instance
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
}

pub fn execute(args: CheckArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let mut request =
        RelocationRequest::new(args.instance, args.source, args.target, args.strategy);
    request.margin_bytes = args.margin_gib.map(|gib| gib * 1024 * 1024 * 1024);

    request.sanitize()?;
    let summary = precheck::verify(&request, &SysinfoProbe, &EuidPrivileges)?;

    if global.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!(
        "Preconditions satisfied for '{}' ({} strategy)",
        request.instance, request.strategy
    );
    match summary.source_bytes {
        Some(bytes) => println!("  source size:   {bytes} bytes"),
        None => println!("  source size:   unknown (fixed floor applied)"),
    }
    println!("  margin needed: {} bytes", summary.required_bytes);
    println!("  free at dest:  {} bytes", summary.free_bytes);
    Ok(())
}
