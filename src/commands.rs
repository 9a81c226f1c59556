// src/commands.rs
//! Command handlers for the productid CLI

use anyhow::{Context, Result};
use productid::certificate::{scan_certificate_dir, CertificateExtractor, X509Extractor};
use productid::config::{load_config, ProductIdConfig};
use productid::filesystem::setup_filesystem;
use productid::reconcile::{load_or_empty, run_pass};
use productid::source::FactsFile;
use std::path::Path;
use tracing::info;

use crate::cli::GlobalArgs;

/// Load the configuration file and apply command-line overrides
pub fn resolve_config(global: &GlobalArgs) -> Result<ProductIdConfig> {
    let mut config = load_config(global.config.as_deref())
        .context("Failed to load configuration")?;

    if let Some(path) = &global.db_path {
        config.database_path = path.clone();
    }
    if let Some(dir) = &global.cert_dir {
        config.product_cert_dir = dir.clone();
    }
    if let Some(dir) = &global.default_cert_dir {
        config.default_product_cert_dir = dir.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Run one reconciliation pass driven by a facts file
pub fn cmd_reconcile(config: &ProductIdConfig, facts_path: &Path, dry_run: bool) -> Result<()> {
    info!("Reconciling product certificates using {}", facts_path.display());

    let facts = FactsFile::load(facts_path)
        .context("Failed to load transaction facts")?
        .with_metadata_type(config.metadata_type.clone());

    let report = run_pass(config, &facts, &X509Extractor::new(), dry_run)?;

    if dry_run {
        println!("[DRY RUN] No changes were written");
    }
    print!("{}", report);

    if let Some(err) = &report.persist_error {
        anyhow::bail!("Product database was not saved: {}", err);
    }
    Ok(())
}

/// Print the product database as it is persisted, then flag missing certificates
pub fn cmd_list(config: &ProductIdConfig) -> Result<()> {
    let db = load_or_empty(config)?;
    println!("{}", db);

    let missing: Vec<_> = db.products().filter(|r| !r.is_installed).collect();
    if !missing.is_empty() {
        println!();
        println!("Tracked without an installed certificate:");
        for record in missing {
            println!(
                "  {:>10}  repos: {}",
                record.product_id,
                record.repo_ids().collect::<Vec<_>>().join(", ")
            );
        }
    }

    println!();
    println!("Total: {} product(s)", db.len());
    Ok(())
}

/// List certificates found in both certificate directories
pub fn cmd_scan(config: &ProductIdConfig) -> Result<()> {
    let mut total = 0;
    for dir in [&config.product_cert_dir, &config.default_product_cert_dir] {
        let certs = scan_certificate_dir(dir, &config.cert_extension)?;
        println!("{} ({} certificate(s))", dir.display(), certs.len());
        for cert in &certs {
            println!("  {:>10}  {}", cert.product_id, cert.path.display());
        }
        total += certs.len();
    }
    println!();
    println!("Total: {} certificate(s)", total);
    Ok(())
}

/// Print the product ID carried by a certificate blob
pub fn cmd_extract(file: &Path) -> Result<()> {
    let extractor = X509Extractor::new();
    let content = extractor
        .decompress(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let product_id = extractor
        .extract_product_id(&content)
        .with_context(|| format!("No product ID in {}", file.display()))?;
    println!("{}", product_id);
    Ok(())
}

/// Create the directories a pass writes into
pub fn cmd_setup(config: &ProductIdConfig) -> Result<()> {
    setup_filesystem(config)?;
    for dir in config.required_dirs() {
        println!("Ready: {}", dir.display());
    }
    Ok(())
}
