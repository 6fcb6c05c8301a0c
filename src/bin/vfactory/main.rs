//! vfactory CLI - inspect validator factory bootstrap

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use validator_factory::util::diagnostic::emit;
use validator_factory::FactoryError;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    // Parse CLI
    let cli = Cli::parse();
    let color = !cli.no_color;

    if let Err(e) = run(cli) {
        match e.downcast_ref::<FactoryError>() {
            Some(err) => emit(&err.to_diagnostic(), color),
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("validator_factory=debug")
    } else {
        EnvFilter::new("validator_factory=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    match cli.command {
        Commands::Inspect(args) => commands::inspect::execute(args),
        Commands::Constraints(args) => commands::constraints::execute(args),
    }
}
