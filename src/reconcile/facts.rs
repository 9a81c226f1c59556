// src/reconcile/facts.rs

//! Input facts of a reconciliation pass

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use tracing::debug;

use crate::certificate::{scan_certificate_dir, CertificateFile};
use crate::config::ProductIdConfig;
use crate::error::Result;
use crate::source::RepositorySource;

/// Everything a pass needs to know, gathered before any mutation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileFacts {
    /// Certificates found on disk, writable directory first
    pub installed_certificates: Vec<CertificateFile>,
    /// Repositories touched by the transaction and their productid metadata
    pub transaction_repo_metadata: BTreeMap<String, Option<PathBuf>>,
    /// Repositories that must keep their product associations
    pub active_repo_ids: BTreeSet<String>,
}

impl ReconcileFacts {
    /// Combine the inputs; the active set is the installed origins plus
    /// every repository of the transaction
    pub fn new(
        installed_certificates: Vec<CertificateFile>,
        transaction_repo_metadata: BTreeMap<String, Option<PathBuf>>,
        installed_origin_repos: BTreeSet<String>,
    ) -> Self {
        let mut active_repo_ids = installed_origin_repos;
        active_repo_ids.extend(transaction_repo_metadata.keys().cloned());
        Self {
            installed_certificates,
            transaction_repo_metadata,
            active_repo_ids,
        }
    }

    /// Collect facts from the certificate directories and the package manager
    pub fn gather(config: &ProductIdConfig, source: &dyn RepositorySource) -> Result<Self> {
        let mut installed_certificates =
            scan_certificate_dir(&config.product_cert_dir, &config.cert_extension)?;
        installed_certificates.extend(scan_certificate_dir(
            &config.default_product_cert_dir,
            &config.cert_extension,
        )?);

        let metadata: BTreeMap<String, Option<PathBuf>> = source
            .enabled_repositories()?
            .into_iter()
            .map(|repo| (repo.id, repo.metadata_path))
            .collect();

        let mut transaction_repo_metadata = BTreeMap::new();
        for (repo_id, packages) in source.transaction_package_repos()? {
            debug!(
                "Transaction uses repository '{}' for {} package(s)",
                repo_id,
                packages.len()
            );
            let path = metadata.get(&repo_id).cloned().flatten();
            transaction_repo_metadata.insert(repo_id, path);
        }

        let installed_origin_repos = source.installed_package_repos()?;

        Ok(Self::new(
            installed_certificates,
            transaction_repo_metadata,
            installed_origin_repos,
        ))
    }
}
