// src/cli.rs
//! CLI definitions for the productid reconciler
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "productid")]
#[command(version)]
#[command(about = "Reconcile installed product certificates with package repositories", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command; they override the configuration file
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Configuration file (default: /etc/rhsm/productid.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the product database
    #[arg(short, long, global = true)]
    pub db_path: Option<PathBuf>,

    /// Writable product certificate directory
    #[arg(long, global = true)]
    pub cert_dir: Option<PathBuf>,

    /// Directory of default product certificates
    #[arg(long, global = true)]
    pub default_cert_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one reconciliation pass after a package transaction
    Reconcile {
        /// JSON file describing enabled repositories and the transaction
        #[arg(short, long)]
        facts: PathBuf,

        /// Show what would change without touching certificates or the database
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the product database
    List,

    /// List product certificates found in the certificate directories
    Scan,

    /// Print the product ID of a (possibly compressed) certificate
    Extract {
        /// Certificate or productid metadata file
        file: PathBuf,
    },

    /// Create the directories a reconciliation pass writes into
    Setup,
}

impl Commands {
    /// Whether the command reads paths from the configuration
    pub fn uses_config(&self) -> bool {
        !matches!(self, Commands::Extract { .. })
    }
}
