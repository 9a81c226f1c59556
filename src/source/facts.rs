// src/source/facts.rs

//! JSON transaction facts written by a host integration
//!
//! ```json
//! {
//!   "enabled_repos": [
//!     {"id": "repoA", "metadata": {"productid": "/var/cache/dnf/repoA/repodata/abc-productid.gz"}},
//!     {"id": "repoB"}
//!   ],
//!   "installed_packages": [
//!     {"nevra": "awesome-1.0-1.x86_64", "from_repo": "repoA"}
//!   ],
//!   "transaction_packages": [
//!     {"nevra": "awesome-1.0-1.x86_64", "repo": "repoA", "action": "install"}
//!   ]
//! }
//! ```
//!
//! `installed_packages` describes the system after the transaction.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use super::{is_real_repo, EnabledRepository, RepositorySource};
use crate::config::METADATA_TYPE_PRODUCTID;
use crate::error::{Error, Result};

/// An enabled repository and its downloaded metadata files by type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnabledRepoEntry {
    pub id: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, PathBuf>,
}

/// An installed package and the repository it was installed from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPackageEntry {
    pub nevra: String,
    #[serde(default)]
    pub from_repo: String,
}

/// What a transaction did to a package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionAction {
    Install,
    Upgrade,
    Downgrade,
    Reinstall,
    Remove,
    Replaced,
}

impl TransactionAction {
    /// Whether the package ends up on the system from its repository
    pub fn is_inbound(&self) -> bool {
        matches!(
            self,
            Self::Install | Self::Upgrade | Self::Downgrade | Self::Reinstall
        )
    }
}

/// A package touched by the current transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPackageEntry {
    pub nevra: String,
    pub repo: String,
    pub action: TransactionAction,
}

/// Facts about one transaction, loaded from JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactsFile {
    #[serde(default)]
    pub enabled_repos: Vec<EnabledRepoEntry>,
    #[serde(default)]
    pub installed_packages: Vec<InstalledPackageEntry>,
    #[serde(default)]
    pub transaction_packages: Vec<TransactionPackageEntry>,
    /// Metadata type holding product certificates
    #[serde(skip, default = "default_metadata_type")]
    pub metadata_type: String,
}

fn default_metadata_type() -> String {
    METADATA_TYPE_PRODUCTID.to_string()
}

impl Default for FactsFile {
    fn default() -> Self {
        Self {
            enabled_repos: Vec::new(),
            installed_packages: Vec::new(),
            transaction_packages: Vec::new(),
            metadata_type: default_metadata_type(),
        }
    }
}

impl FactsFile {
    /// Parse facts from a JSON string
    pub fn from_json(path: &Path, content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| Error::Facts {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Load facts from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::Unreadable {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(path, &content)
    }

    /// Look up metadata of a different type than `productid`
    pub fn with_metadata_type(mut self, metadata_type: impl Into<String>) -> Self {
        self.metadata_type = metadata_type.into();
        self
    }

    /// Write the facts as pretty JSON (used by host integrations and tests)
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(|e| Error::Facts {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        fs::write(path, content).map_err(|e| Error::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

impl RepositorySource for FactsFile {
    fn enabled_repositories(&self) -> Result<Vec<EnabledRepository>> {
        Ok(self
            .enabled_repos
            .iter()
            .map(|repo| EnabledRepository {
                id: repo.id.clone(),
                metadata_path: repo.metadata.get(&self.metadata_type).cloned(),
            })
            .collect())
    }

    fn installed_package_repos(&self) -> Result<BTreeSet<String>> {
        Ok(self
            .installed_packages
            .iter()
            .filter(|pkg| is_real_repo(&pkg.from_repo))
            .map(|pkg| pkg.from_repo.clone())
            .collect())
    }

    fn transaction_package_repos(&self) -> Result<BTreeMap<String, Vec<String>>> {
        let mut repos: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for pkg in &self.transaction_packages {
            if !pkg.action.is_inbound() || !is_real_repo(&pkg.repo) {
                continue;
            }
            repos
                .entry(pkg.repo.clone())
                .or_default()
                .push(pkg.nevra.clone());
        }
        Ok(repos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FACTS: &str = r#"{
        "enabled_repos": [
            {"id": "repoA", "metadata": {"productid": "/cache/repoA/productid.gz", "primary": "/cache/repoA/primary.xml.gz"}},
            {"id": "repoB"}
        ],
        "installed_packages": [
            {"nevra": "awesome-1.0-1.x86_64", "from_repo": "repoA"},
            {"nevra": "local-1.0-1.noarch", "from_repo": "@commandline"},
            {"nevra": "legacy-1.0-1.noarch"}
        ],
        "transaction_packages": [
            {"nevra": "awesome-1.0-1.x86_64", "repo": "repoA", "action": "install"},
            {"nevra": "tool-2.0-1.x86_64", "repo": "repoC", "action": "upgrade"},
            {"nevra": "tool-1.0-1.x86_64", "repo": "repoC", "action": "replaced"},
            {"nevra": "gone-1.0-1.x86_64", "repo": "repoB", "action": "remove"}
        ]
    }"#;

    fn facts() -> FactsFile {
        FactsFile::from_json(Path::new("facts.json"), FACTS).unwrap()
    }

    #[test]
    fn test_enabled_repositories() {
        let repos = facts().enabled_repositories().unwrap();
        assert_eq!(
            repos,
            vec![
                EnabledRepository {
                    id: "repoA".to_string(),
                    metadata_path: Some(PathBuf::from("/cache/repoA/productid.gz")),
                },
                EnabledRepository {
                    id: "repoB".to_string(),
                    metadata_path: None,
                },
            ]
        );
    }

    #[test]
    fn test_custom_metadata_type() {
        let repos = facts()
            .with_metadata_type("primary")
            .enabled_repositories()
            .unwrap();
        assert_eq!(
            repos[0].metadata_path,
            Some(PathBuf::from("/cache/repoA/primary.xml.gz"))
        );
    }

    #[test]
    fn test_installed_package_repos_skip_pseudo_repos() {
        let repos = facts().installed_package_repos().unwrap();
        assert_eq!(repos.into_iter().collect::<Vec<_>>(), vec!["repoA".to_string()]);
    }

    #[test]
    fn test_transaction_repos_only_inbound() {
        let repos = facts().transaction_package_repos().unwrap();
        assert_eq!(repos.len(), 2);
        assert_eq!(repos["repoA"], vec!["awesome-1.0-1.x86_64".to_string()]);
        assert_eq!(repos["repoC"], vec!["tool-2.0-1.x86_64".to_string()]);
        assert!(!repos.contains_key("repoB"));
    }

    #[test]
    fn test_invalid_facts() {
        let err = FactsFile::from_json(Path::new("facts.json"), r#"{"enabled_repos": 3}"#)
            .unwrap_err();
        assert!(matches!(err, Error::Facts { .. }));
    }

    #[test]
    fn test_empty_document() {
        let facts = FactsFile::from_json(Path::new("facts.json"), "{}").unwrap();
        assert_eq!(facts.metadata_type, "productid");
        assert!(facts.enabled_repositories().unwrap().is_empty());
    }
}
