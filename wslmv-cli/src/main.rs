mod cli;
mod commands;

use clap::Parser;

use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();
    match cli.command {
        Commands::Relocate(args) => commands::relocate::execute(args, &cli.global),
        Commands::Check(args) => commands::check::execute(args, &cli.global),
        Commands::Rollback(args) => commands::rollback::execute(args, &cli.global),
    }
}

/// Phase outcomes are part of the operator-facing audit trail, so the
/// default filter keeps them visible; RUST_LOG overrides as usual.
fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("wslmv=info,wslmv_cli=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
