// src/main.rs

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber for logging
    let default_level = if cli.global.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    // Commands that only inspect a file must work without a usable config
    if !cli.command.uses_config()
        && let Commands::Extract { file } = &cli.command
    {
        return commands::cmd_extract(file);
    }

    let config = commands::resolve_config(&cli.global)?;
    match cli.command {
        Commands::Reconcile { facts, dry_run } => {
            commands::cmd_reconcile(&config, &facts, dry_run)
        }
        Commands::List => commands::cmd_list(&config),
        Commands::Scan => commands::cmd_scan(&config),
        Commands::Extract { file } => commands::cmd_extract(&file),
        Commands::Setup => commands::cmd_setup(&config),
    }
}
