// src/db/models.rs

//! Records stored in the product database

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::ProductIdConfig;

/// A repository associated with a product certificate
///
/// Carries only its ID today; it is a struct so per-repository state can be
/// added without touching the product API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRecord {
    pub repo_id: String,
}

impl RepoRecord {
    pub fn new(repo_id: impl Into<String>) -> Self {
        Self {
            repo_id: repo_id.into(),
        }
    }
}

/// One product certificate and the repositories providing its packages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    /// Numeric product ID
    pub product_id: String,
    /// Installed certificate, empty when the certificate is missing
    pub cert_path: PathBuf,
    /// Whether `cert_path` existed when the record was created
    pub is_installed: bool,
    repos: BTreeMap<String, RepoRecord>,
}

impl ProductRecord {
    /// Create a record for a certificate at a known location
    ///
    /// If the file does not exist the record is kept but marked as not installed.
    pub fn new(product_id: impl Into<String>, cert_path: impl AsRef<Path>) -> Self {
        let cert_path = cert_path.as_ref();
        let (cert_path, is_installed) = if cert_path.exists() {
            (cert_path.to_path_buf(), true)
        } else {
            (PathBuf::new(), false)
        };
        Self {
            product_id: product_id.into(),
            cert_path,
            is_installed,
            repos: BTreeMap::new(),
        }
    }

    /// Create a record by probing the certificate directories
    ///
    /// The writable directory takes precedence over the default directory.
    pub fn locate(product_id: impl Into<String>, config: &ProductIdConfig) -> Self {
        let product_id = product_id.into();
        let candidates = [
            config.cert_path_for(&product_id),
            config.default_cert_path_for(&product_id),
        ];
        match candidates.into_iter().find(|p| p.exists()) {
            Some(path) => Self::new(product_id, path),
            None => Self {
                product_id,
                cert_path: PathBuf::new(),
                is_installed: false,
                repos: BTreeMap::new(),
            },
        }
    }

    /// Point the record at a newly installed certificate, keeping its repositories
    pub fn set_certificate(&mut self, cert_path: impl AsRef<Path>) {
        let fresh = Self::new(self.product_id.as_str(), cert_path);
        self.cert_path = fresh.cert_path;
        self.is_installed = fresh.is_installed;
    }

    /// Associate a repository; returns false if it was already associated
    pub fn add_repo(&mut self, repo_id: &str) -> bool {
        if self.repos.contains_key(repo_id) {
            return false;
        }
        self.repos
            .insert(repo_id.to_string(), RepoRecord::new(repo_id));
        true
    }

    /// Drop a repository association; returns true if it existed
    pub fn remove_repo(&mut self, repo_id: &str) -> bool {
        self.repos.remove(repo_id).is_some()
    }

    pub fn has_repo(&self, repo_id: &str) -> bool {
        self.repos.contains_key(repo_id)
    }

    /// Associated repositories in lexicographic order of their IDs
    pub fn repos(&self) -> impl Iterator<Item = &RepoRecord> {
        self.repos.values()
    }

    /// Associated repository IDs in lexicographic order
    pub fn repo_ids(&self) -> impl Iterator<Item = &str> {
        self.repos.keys().map(String::as_str)
    }

    pub fn repo_count(&self) -> usize {
        self.repos.len()
    }

    /// Remove every repository not accepted by `keep`, returning the removed IDs
    pub fn retain_repos(&mut self, mut keep: impl FnMut(&str) -> bool) -> Vec<String> {
        let removed: Vec<String> = self
            .repos
            .keys()
            .filter(|id| !keep(id))
            .cloned()
            .collect();
        for id in &removed {
            self.repos.remove(id);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_new_with_existing_cert() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("69.pem");
        fs::write(&path, "cert").unwrap();

        let record = ProductRecord::new("69", &path);
        assert!(record.is_installed);
        assert_eq!(record.cert_path, path);
        assert_eq!(record.repo_count(), 0);
    }

    #[test]
    fn test_new_with_missing_cert() {
        let temp = TempDir::new().unwrap();
        let record = ProductRecord::new("69", temp.path().join("69.pem"));
        assert!(!record.is_installed);
        assert_eq!(record.cert_path, PathBuf::new());
    }

    #[test]
    fn test_locate_prefers_writable_dir() {
        let temp = TempDir::new().unwrap();
        let config = ProductIdConfig::with_root(temp.path());
        fs::create_dir_all(&config.product_cert_dir).unwrap();
        fs::create_dir_all(&config.default_product_cert_dir).unwrap();
        fs::write(config.cert_path_for("69"), "cert").unwrap();
        fs::write(config.default_cert_path_for("69"), "cert").unwrap();
        fs::write(config.default_cert_path_for("479"), "cert").unwrap();

        let record = ProductRecord::locate("69", &config);
        assert!(record.is_installed);
        assert_eq!(record.cert_path, config.cert_path_for("69"));

        let record = ProductRecord::locate("479", &config);
        assert!(record.is_installed);
        assert_eq!(record.cert_path, config.default_cert_path_for("479"));

        let record = ProductRecord::locate("42", &config);
        assert!(!record.is_installed);
        assert!(record.cert_path.as_os_str().is_empty());
    }

    #[test]
    fn test_add_repo_is_idempotent() {
        let mut record = ProductRecord::new("69", "/nonexistent/69.pem");
        assert!(record.add_repo("repo1"));
        assert!(!record.add_repo("repo1"));
        assert_eq!(record.repo_count(), 1);
        assert!(record.has_repo("repo1"));
    }

    #[test]
    fn test_remove_repo() {
        let mut record = ProductRecord::new("69", "/nonexistent/69.pem");
        record.add_repo("repo1");
        record.add_repo("repo2");

        assert!(record.remove_repo("repo1"));
        assert!(!record.remove_repo("repo1"));
        assert!(!record.has_repo("repo1"));
        assert!(record.has_repo("repo2"));
    }

    #[test]
    fn test_repo_ids_sorted() {
        let mut record = ProductRecord::new("69", "/nonexistent/69.pem");
        record.add_repo("zeta");
        record.add_repo("alpha");
        record.add_repo("mid");
        assert_eq!(record.repo_ids().collect::<Vec<_>>(), vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_retain_repos() {
        let mut record = ProductRecord::new("69", "/nonexistent/69.pem");
        record.add_repo("r1");
        record.add_repo("r2");
        record.add_repo("r3");

        let removed = record.retain_repos(|id| id == "r2");
        assert_eq!(removed, vec!["r1".to_string(), "r3".to_string()]);
        assert_eq!(record.repo_ids().collect::<Vec<_>>(), vec!["r2"]);
    }
}
