// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn build_cli() -> Command {
    Command::new("productid")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Reconcile installed product certificates with package repositories")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .global(true)
                .help("Configuration file (default: /etc/rhsm/productid.toml)"),
        )
        .arg(
            Arg::new("db_path")
                .short('d')
                .long("db-path")
                .value_name("PATH")
                .global(true)
                .help("Path to the product database"),
        )
        .arg(
            Arg::new("cert_dir")
                .long("cert-dir")
                .value_name("DIR")
                .global(true)
                .help("Writable product certificate directory"),
        )
        .arg(
            Arg::new("default_cert_dir")
                .long("default-cert-dir")
                .value_name("DIR")
                .global(true)
                .help("Directory of default product certificates"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Enable debug logging"),
        )
        .subcommand(
            Command::new("reconcile")
                .about("Run one reconciliation pass after a package transaction")
                .arg(
                    Arg::new("facts")
                        .short('f')
                        .long("facts")
                        .required(true)
                        .value_name("FILE")
                        .help("JSON file describing enabled repositories and the transaction"),
                )
                .arg(
                    Arg::new("dry_run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Show what would change without touching certificates or the database"),
                ),
        )
        .subcommand(Command::new("list").about("Show the product database"))
        .subcommand(
            Command::new("scan")
                .about("List product certificates found in the certificate directories"),
        )
        .subcommand(
            Command::new("extract")
                .about("Print the product ID of a (possibly compressed) certificate")
                .arg(Arg::new("file").required(true).help("Certificate or productid metadata file")),
        )
        .subcommand(
            Command::new("setup").about("Create the directories a reconciliation pass writes into"),
        )
}

/// Render `man/productid.1` next to the manifest
fn write_man_page() -> Result<PathBuf, String> {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR")
        .map_err(|e| format!("CARGO_MANIFEST_DIR not set: {}", e))?;
    let man_dir = PathBuf::from(manifest_dir).join("man");
    fs::create_dir_all(&man_dir)
        .map_err(|e| format!("failed to create {}: {}", man_dir.display(), e))?;

    let mut buffer = Vec::new();
    Man::new(build_cli())
        .render(&mut buffer)
        .map_err(|e| format!("failed to render man page: {}", e))?;

    let man_path = man_dir.join("productid.1");
    fs::write(&man_path, buffer)
        .map_err(|e| format!("failed to write {}: {}", man_path.display(), e))?;
    Ok(man_path)
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Best effort: the binary builds without a man page
    if let Err(e) = write_man_page() {
        println!("cargo:warning={}", e);
    }
}
