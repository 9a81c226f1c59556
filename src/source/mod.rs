// src/source/mod.rs

//! Package manager state consumed by a reconciliation pass
//!
//! The reconciler never talks to the package manager directly. A host
//! integration implements [`RepositorySource`] (or writes a [`FactsFile`])
//! describing the enabled repositories, where each package came from and
//! what the current transaction touched.

mod facts;

pub use facts::{
    EnabledRepoEntry, FactsFile, InstalledPackageEntry, TransactionAction,
    TransactionPackageEntry,
};

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::error::Result;

/// Pseudo-repositories that do not correspond to a configured repository
///
/// `installed` is how some package managers name the installed-package set.
pub const PSEUDO_REPOS: &[&str] = &["@System", "@commandline", "installed"];

/// An enabled repository and its downloaded productid metadata, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnabledRepository {
    pub id: String,
    pub metadata_path: Option<PathBuf>,
}

/// Source of repository and package facts for one transaction
pub trait RepositorySource {
    /// Enabled repositories and the path of their productid metadata
    fn enabled_repositories(&self) -> Result<Vec<EnabledRepository>>;

    /// Repositories that currently installed packages originated from
    fn installed_package_repos(&self) -> Result<BTreeSet<String>>;

    /// Repositories touched by the current transaction, with the packages from each
    fn transaction_package_repos(&self) -> Result<BTreeMap<String, Vec<String>>>;
}

/// True for repository IDs that name a real repository
pub fn is_real_repo(repo_id: &str) -> bool {
    !repo_id.is_empty() && !PSEUDO_REPOS.contains(&repo_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_real_repo() {
        assert!(is_real_repo("rhel-10-for-x86_64-baseos-rpms"));
        assert!(!is_real_repo(""));
        assert!(!is_real_repo("@System"));
        assert!(!is_real_repo("@commandline"));
        assert!(!is_real_repo("installed"));
        assert!(is_real_repo("installed-extras"));
    }
}
