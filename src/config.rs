// src/config.rs

//! Configuration for the productid reconciler
//!
//! All filesystem locations used by a reconciliation pass live here so they
//! can be pointed at temporary directories in tests. Values come from an
//! optional TOML file:
//!
//! ```toml
//! database_path = "/var/lib/rhsm/productid.json"
//! product_cert_dir = "/etc/pki/product"
//! default_product_cert_dir = "/etc/pki/product-default"
//! cert_extension = "pem"
//! metadata_type = "productid"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default path of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "/etc/rhsm/productid.toml";

/// Default location of the product database
pub const DEFAULT_DATABASE_PATH: &str = "/var/lib/rhsm/productid.json";

/// Writable directory for repository-delivered product certificates
pub const DEFAULT_PRODUCT_CERT_DIR: &str = "/etc/pki/product";

/// Directory for product certificates shipped with the base system
pub const DEFAULT_DEFAULT_PRODUCT_CERT_DIR: &str = "/etc/pki/product-default";

/// Repository metadata type carrying product certificates
pub const METADATA_TYPE_PRODUCTID: &str = "productid";

/// Paths and naming used by one reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductIdConfig {
    /// JSON product database
    pub database_path: PathBuf,
    /// Writable product certificate directory
    pub product_cert_dir: PathBuf,
    /// Factory certificate directory, never modified
    pub default_product_cert_dir: PathBuf,
    /// Certificate file extension, without the dot
    pub cert_extension: String,
    /// Repository metadata type to look for
    pub metadata_type: String,
}

impl Default for ProductIdConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            product_cert_dir: PathBuf::from(DEFAULT_PRODUCT_CERT_DIR),
            default_product_cert_dir: PathBuf::from(DEFAULT_DEFAULT_PRODUCT_CERT_DIR),
            cert_extension: "pem".to_string(),
            metadata_type: METADATA_TYPE_PRODUCTID.to_string(),
        }
    }
}

impl ProductIdConfig {
    /// Build a config rooted in a single directory (used by tests and `--root`-style setups)
    pub fn with_root(root: &Path) -> Self {
        Self {
            database_path: root.join("var/lib/rhsm/productid.json"),
            product_cert_dir: root.join("etc/pki/product"),
            default_product_cert_dir: root.join("etc/pki/product-default"),
            ..Self::default()
        }
    }

    /// Directory containing the database
    ///
    /// A bare file name lives in the current directory.
    pub fn database_dir(&self) -> PathBuf {
        match self.database_path.parent() {
            Some(p) if p.as_os_str().is_empty() => PathBuf::from("."),
            Some(p) => p.to_path_buf(),
            None => PathBuf::from("/var/lib/rhsm"),
        }
    }

    /// File name of a certificate for the given product
    pub fn cert_file_name(&self, product_id: &str) -> String {
        format!("{}.{}", product_id, self.cert_extension)
    }

    /// Location of a repository-delivered certificate
    pub fn cert_path_for(&self, product_id: &str) -> PathBuf {
        self.product_cert_dir.join(self.cert_file_name(product_id))
    }

    /// Location of a factory certificate
    pub fn default_cert_path_for(&self, product_id: &str) -> PathBuf {
        self.default_product_cert_dir
            .join(self.cert_file_name(product_id))
    }

    /// Directories that must exist before a pass can mutate anything
    pub fn required_dirs(&self) -> Vec<PathBuf> {
        vec![self.database_dir(), self.product_cert_dir.clone()]
    }

    /// Check values that would make every later step misbehave
    pub fn validate(&self) -> Result<()> {
        if self.cert_extension.is_empty() || self.cert_extension.contains(['/', '.']) {
            return Err(Error::Config(format!(
                "cert_extension must be a bare extension, got {:?}",
                self.cert_extension
            )));
        }
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("database_path is empty".to_string()));
        }
        if self.product_cert_dir == self.default_product_cert_dir {
            return Err(Error::Config(
                "product_cert_dir and default_product_cert_dir must differ".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load the configuration from the default or specified path
///
/// A missing default file yields the built-in defaults; a missing file that
/// was asked for explicitly is an error.
pub fn load_config(path: Option<&Path>) -> Result<ProductIdConfig> {
    let (path, explicit) = match path {
        Some(p) => (p, true),
        None => (Path::new(DEFAULT_CONFIG_PATH), false),
    };

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound && !explicit => {
            return Ok(ProductIdConfig::default());
        }
        Err(e) => {
            return Err(Error::Unreadable {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    let config: ProductIdConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    config.validate()?;
    Ok(config)
}
