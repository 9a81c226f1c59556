// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use productid::config::ProductIdConfig;
use productid::source::{
    EnabledRepoEntry, FactsFile, InstalledPackageEntry, TransactionAction,
    TransactionPackageEntry,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Path of a file under `tests/fixtures`
pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// A throwaway system root with its own certificate directories and database.
///
/// Keep the value alive for the duration of the test to prevent cleanup.
pub struct TestSystem {
    pub temp: TempDir,
    pub config: ProductIdConfig,
}

impl TestSystem {
    /// Create a root where none of the directories exist yet
    pub fn bare() -> Self {
        let temp = tempfile::tempdir().unwrap();
        let config = ProductIdConfig::with_root(temp.path());
        fs::create_dir_all(temp.path().join("var/cache/dnf")).unwrap();
        Self { temp, config }
    }

    /// Create a root with the default certificate directory in place
    pub fn new() -> Self {
        let system = Self::bare();
        fs::create_dir_all(&system.config.default_product_cert_dir).unwrap();
        system
    }

    /// Copy a fixture into the metadata cache as the productid file of `repo_id`
    pub fn cache_metadata(&self, repo_id: &str, fixture_name: &str) -> PathBuf {
        let path = self
            .temp
            .path()
            .join("var/cache/dnf")
            .join(format!("{}-{}", repo_id, fixture_name));
        fs::copy(fixture(fixture_name), &path).unwrap();
        path
    }

    /// Place a fixture certificate in the default certificate directory
    pub fn install_default_cert(&self, product_id: &str, fixture_name: &str) -> PathBuf {
        let path = self.config.default_cert_path_for(product_id);
        fs::copy(fixture(fixture_name), &path).unwrap();
        path
    }

    pub fn write_db(&self, content: &str) {
        fs::create_dir_all(self.config.database_dir()).unwrap();
        fs::write(&self.config.database_path, content).unwrap();
    }

    pub fn read_db(&self) -> String {
        fs::read_to_string(&self.config.database_path).unwrap()
    }

    pub fn saved_document(&self) -> serde_json::Value {
        serde_json::from_str(&self.read_db()).unwrap()
    }

    /// Write a facts file into the root and load it back
    pub fn facts_file(&self, facts: &FactsFile) -> FactsFile {
        let path = self.temp.path().join("facts.json");
        facts.save(&path).unwrap();
        FactsFile::load(&path).unwrap()
    }
}

/// Builder for transaction facts
#[derive(Default)]
pub struct FactsBuilder {
    facts: FactsFile,
}

impl FactsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// An enabled repository, optionally with downloaded productid metadata
    pub fn enabled(mut self, repo_id: &str, productid: Option<&Path>) -> Self {
        let mut metadata = BTreeMap::new();
        if let Some(path) = productid {
            metadata.insert("productid".to_string(), path.to_path_buf());
        }
        self.facts.enabled_repos.push(EnabledRepoEntry {
            id: repo_id.to_string(),
            metadata,
        });
        self
    }

    /// A package present on the system after the transaction
    pub fn installed(mut self, nevra: &str, from_repo: &str) -> Self {
        self.facts.installed_packages.push(InstalledPackageEntry {
            nevra: nevra.to_string(),
            from_repo: from_repo.to_string(),
        });
        self
    }

    /// A package touched by the transaction
    pub fn transaction(mut self, nevra: &str, repo: &str, action: TransactionAction) -> Self {
        self.facts.transaction_packages.push(TransactionPackageEntry {
            nevra: nevra.to_string(),
            repo: repo.to_string(),
            action,
        });
        self
    }

    pub fn build(self) -> FactsFile {
        self.facts
    }
}
