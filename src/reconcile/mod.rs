// src/reconcile/mod.rs

//! Reconciliation of product certificates after a package transaction
//!
//! Four sources of truth are merged in one pass: certificates on disk, the
//! persisted product database, the repositories installed packages came
//! from, and the repositories of the current transaction.
//!
//! # Pass
//!
//! ```text
//! A: merge on-disk certificates -> B: ingest delivered certificates
//!    -> C: prune inactive repos -> D: prune orphaned products -> E: save
//! ```
//!
//! Order matters: certificates placed on disk by other tools are absorbed
//! before anything is pruned, and the active repository set is fixed before
//! pruning starts. Only a failure to create the required directories aborts
//! a pass; every other failure skips the affected repository or product.

mod facts;

pub use facts::ReconcileFacts;

use std::fmt;
use std::path::Path;
use tracing::{debug, error, info, warn};

use crate::certificate::{
    delete_certificate, install_certificate, is_product_id, CertificateError,
    CertificateExtractor,
};
use crate::config::ProductIdConfig;
use crate::db::ProductDatabase;
use crate::error::{Error, Result};
use crate::filesystem::{is_under, setup_filesystem};
use crate::source::RepositorySource;

/// A repository whose certificate could not be used this pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRepo {
    pub repo_id: String,
    pub reason: String,
}

/// What a pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Products absorbed from the certificate directories (step A)
    pub discovered: Vec<String>,
    /// Products whose certificate was installed from a repository (step B)
    pub installed: Vec<String>,
    /// New (product, repository) associations (step B)
    pub associated: Vec<(String, String)>,
    /// Repositories whose certificate was skipped (step B)
    pub skipped: Vec<SkippedRepo>,
    /// (product, repository) associations removed as inactive (step C)
    pub pruned: Vec<(String, String)>,
    /// Products removed together with their certificate (step D)
    pub removed: Vec<String>,
    /// Orphaned products kept because their certificate is a default one (step D)
    pub kept_default: Vec<String>,
    /// Orphaned products whose certificate could not be deleted (step D)
    pub failed_removals: Vec<String>,
    /// Products tracked in the database whose certificate is missing
    pub missing_certificates: Vec<String>,
    /// Set when the database could not be written (step E)
    pub persist_error: Option<String>,
}

impl ReconcileReport {
    /// True when the pass changed the product set or any association
    pub fn has_changes(&self) -> bool {
        !(self.discovered.is_empty()
            && self.installed.is_empty()
            && self.associated.is_empty()
            && self.pruned.is_empty()
            && self.removed.is_empty())
    }
}

impl fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Discovered on disk:   {}", self.discovered.len())?;
        writeln!(f, "Installed:            {}", self.installed.len())?;
        writeln!(f, "New associations:     {}", self.associated.len())?;
        writeln!(f, "Pruned associations:  {}", self.pruned.len())?;
        writeln!(f, "Removed products:     {}", self.removed.len())?;
        for product_id in &self.installed {
            writeln!(f, "  + {}", product_id)?;
        }
        for product_id in &self.removed {
            writeln!(f, "  - {}", product_id)?;
        }
        for skipped in &self.skipped {
            writeln!(f, "  skipped {}: {}", skipped.repo_id, skipped.reason)?;
        }
        for product_id in &self.failed_removals {
            writeln!(f, "  failed to remove {}", product_id)?;
        }
        for product_id in &self.missing_certificates {
            writeln!(f, "  certificate missing for {}", product_id)?;
        }
        if let Some(err) = &self.persist_error {
            writeln!(f, "  database not saved: {}", err)?;
        }
        Ok(())
    }
}

/// Drives one reconciliation pass over a product database
pub struct Reconciler<'a> {
    config: &'a ProductIdConfig,
    extractor: &'a dyn CertificateExtractor,
    dry_run: bool,
}

impl<'a> Reconciler<'a> {
    pub fn new(config: &'a ProductIdConfig, extractor: &'a dyn CertificateExtractor) -> Self {
        Self {
            config,
            extractor,
            dry_run: false,
        }
    }

    /// Compute changes without touching certificates or the database file
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run steps A-E
    pub fn run(&self, db: &mut ProductDatabase, facts: &ReconcileFacts) -> ReconcileReport {
        let mut report = self.reconcile(db, facts);
        self.persist(db, &mut report);
        info!(
            "Reconciliation finished: {} installed, {} removed, {} association(s) pruned",
            report.installed.len(),
            report.removed.len(),
            report.pruned.len()
        );
        report
    }

    /// Run steps A-D (in-memory merge and prune plus certificate side effects)
    pub fn reconcile(&self, db: &mut ProductDatabase, facts: &ReconcileFacts) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        self.merge_installed_certificates(db, facts, &mut report);
        self.ingest_transaction_certificates(db, facts, &mut report);
        self.prune_inactive_repos(db, facts, &mut report);
        self.prune_orphaned_products(db, &mut report);
        self.report_missing_certificates(db, &mut report);
        report
    }

    /// Step A: absorb certificates that appeared on disk outside our control
    fn merge_installed_certificates(
        &self,
        db: &mut ProductDatabase,
        facts: &ReconcileFacts,
        report: &mut ReconcileReport,
    ) {
        for cert in &facts.installed_certificates {
            if !is_product_id(&cert.product_id) {
                warn!(
                    "Ignoring certificate {}: {:?} is not a product ID",
                    cert.path.display(),
                    cert.product_id
                );
                continue;
            }
            if db.add_product(&cert.product_id, &cert.path) {
                debug!(
                    "Tracking product {} found at {}",
                    cert.product_id,
                    cert.path.display()
                );
                report.discovered.push(cert.product_id.clone());
            }
        }
    }

    /// Step B: install certificates delivered by repositories of the transaction
    fn ingest_transaction_certificates(
        &self,
        db: &mut ProductDatabase,
        facts: &ReconcileFacts,
        report: &mut ReconcileReport,
    ) {
        for (repo_id, metadata_path) in &facts.transaction_repo_metadata {
            let Some(metadata_path) = metadata_path else {
                debug!("Repository '{}' does not contain productid certificates", repo_id);
                continue;
            };
            debug!(
                "The productid certificate of '{}' repository downloaded to: {}",
                repo_id,
                metadata_path.display()
            );

            let product_id = match self.ingest_one(db, repo_id, metadata_path, report) {
                Ok(product_id) => product_id,
                Err(e) => {
                    warn!("Skipping productid certificate of '{}': {}", repo_id, e);
                    report.skipped.push(SkippedRepo {
                        repo_id: repo_id.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            if let Some(record) = db.get_mut(&product_id)
                && record.add_repo(repo_id)
            {
                debug!("Associated repository '{}' with product {}", repo_id, product_id);
                report
                    .associated
                    .push((product_id.clone(), repo_id.clone()));
            }
        }
    }

    /// Read one delivered certificate and make sure the product is tracked
    /// with an installed certificate; returns the product ID
    fn ingest_one(
        &self,
        db: &mut ProductDatabase,
        repo_id: &str,
        metadata_path: &Path,
        report: &mut ReconcileReport,
    ) -> Result<String> {
        let content = self.extractor.decompress(metadata_path)?;
        if content.iter().all(u8::is_ascii_whitespace) {
            return Err(CertificateError::Empty.into());
        }
        let product_id = self.extractor.extract_product_id(&content)?;
        if !is_product_id(&product_id) {
            return Err(Error::InvalidProductId(product_id));
        }

        let has_certificate = db.get(&product_id).is_some_and(|r| r.is_installed);
        if has_certificate {
            return Ok(product_id);
        }

        let cert_path = if self.dry_run {
            self.config.cert_path_for(&product_id)
        } else {
            install_certificate(
                &self.config.product_cert_dir,
                &product_id,
                &self.config.cert_extension,
                &content,
            )?
        };
        info!(
            "Installed product certificate {} from repository '{}'",
            product_id, repo_id
        );

        match db.get_mut(&product_id) {
            Some(record) => record.set_certificate(&cert_path),
            None => {
                db.add_product(&product_id, &cert_path);
            }
        }
        report.installed.push(product_id.clone());
        Ok(product_id)
    }

    /// Step C: drop associations with repositories that are no longer active
    fn prune_inactive_repos(
        &self,
        db: &mut ProductDatabase,
        facts: &ReconcileFacts,
        report: &mut ReconcileReport,
    ) {
        let active = &facts.active_repo_ids;
        for record in db.products_mut() {
            for repo_id in record.retain_repos(|id| active.contains(id)) {
                debug!(
                    "Repository '{}' is no longer active for product {}",
                    repo_id, record.product_id
                );
                report.pruned.push((record.product_id.clone(), repo_id));
            }
        }
    }

    /// Step D: remove products left without any active repository
    fn prune_orphaned_products(&self, db: &mut ProductDatabase, report: &mut ReconcileReport) {
        let orphans: Vec<String> = db
            .products()
            .filter(|r| r.repo_count() == 0)
            .map(|r| r.product_id.clone())
            .collect();

        for product_id in orphans {
            let Some(record) = db.get(&product_id) else {
                continue;
            };

            if is_under(&record.cert_path, &self.config.default_product_cert_dir) {
                debug!(
                    "Keeping default product certificate {}",
                    record.cert_path.display()
                );
                report.kept_default.push(product_id);
                continue;
            }

            if record.is_installed && !self.dry_run {
                if let Err(e) = delete_certificate(&record.cert_path) {
                    error!("Failed to remove product certificate of {}: {}", product_id, e);
                    report.failed_removals.push(product_id);
                    continue;
                }
                info!(
                    "Removed product certificate {}",
                    record.cert_path.display()
                );
            }

            db.remove_product(&product_id);
            report.removed.push(product_id);
        }
    }

    /// Report tracked products without a certificate; they are not repaired
    fn report_missing_certificates(&self, db: &ProductDatabase, report: &mut ReconcileReport) {
        // Dry-run installs leave records pointing at certificates not yet written
        let pending = &report.installed;
        let missing: Vec<String> = db
            .products()
            .filter(|r| !r.is_installed && !pending.contains(&r.product_id))
            .map(|r| r.product_id.clone())
            .collect();
        for product_id in missing {
            warn!(
                "Product {} is tracked but its certificate is not installed",
                product_id
            );
            report.missing_certificates.push(product_id);
        }
    }

    /// Step E: write the database
    fn persist(&self, db: &ProductDatabase, report: &mut ReconcileReport) {
        if self.dry_run {
            debug!("Dry run, not saving {}", db.path().display());
            return;
        }
        if let Err(e) = db.save() {
            error!("Failed to save product database: {}", e);
            report.persist_error = Some(e.to_string());
        }
    }
}

/// Load the product database, treating a missing file as an empty database
///
/// A malformed file is logged as an error and also replaced by an empty
/// database; its content is lost on the next save.
pub fn load_or_empty(config: &ProductIdConfig) -> Result<ProductDatabase> {
    match ProductDatabase::load(&config.database_path, config) {
        Ok(db) => Ok(db),
        Err(e) if e.is_unreadable() => {
            debug!("No product database yet ({}), starting empty", e);
            Ok(ProductDatabase::new(&config.database_path))
        }
        Err(e @ Error::MalformedDatabase { .. }) => {
            error!("{}; starting with an empty product database", e);
            Ok(ProductDatabase::new(&config.database_path))
        }
        Err(e) => Err(e),
    }
}

/// Run one complete pass: setup, gather, load, reconcile, save
///
/// Fails only before any mutation: invalid configuration, directories that
/// cannot be created, or facts that cannot be gathered.
pub fn run_pass(
    config: &ProductIdConfig,
    source: &dyn RepositorySource,
    extractor: &dyn CertificateExtractor,
    dry_run: bool,
) -> Result<ReconcileReport> {
    config.validate()?;
    if !dry_run {
        setup_filesystem(config)?;
    }

    let facts = ReconcileFacts::gather(config, source)?;
    let mut db = load_or_empty(config)?;

    Ok(Reconciler::new(config, extractor)
        .dry_run(dry_run)
        .run(&mut db, &facts))
}
