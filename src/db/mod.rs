// src/db/mod.rs

//! Product database
//!
//! Tracks which repositories provide packages for each installed product
//! certificate. The database is a small JSON document, by default
//! `/var/lib/rhsm/productid.json`:
//!
//! ```json
//! {
//!    "37080": [
//!       "repo_id_awesome-modifier-37080",
//!       "repo_id_foo-x86_64-37080"
//!    ],
//!    "99000": [
//!       "repo_id_awesome-i686-99000"
//!    ]
//! }
//! ```
//!
//! The file is read once at the start of a pass and written once at the end.
//! There is no locking; concurrent passes must be serialized by the caller.

pub mod models;

pub use models::{ProductRecord, RepoRecord};

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::certificate::is_product_id;
use crate::config::ProductIdConfig;
use crate::error::{Error, Result};

/// Indentation used for the persisted document
const INDENT: &[u8] = b"   ";

/// In-memory index of product records keyed by product ID
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductDatabase {
    path: PathBuf,
    products: BTreeMap<String, ProductRecord>,
}

impl ProductDatabase {
    /// Create an empty database bound to `path`
    ///
    /// Nothing is read here; call [`ProductDatabase::read`] to load the file
    /// so that read errors are visible to the caller.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            products: BTreeMap::new(),
        }
    }

    /// Load the database stored at `path`
    pub fn load(path: impl Into<PathBuf>, config: &ProductIdConfig) -> Result<Self> {
        let mut db = Self::new(path);
        db.read(config)?;
        Ok(db)
    }

    /// Path the database is read from and saved to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the in-memory index with the content of the file
    ///
    /// On any error the index is left exactly as it was.
    pub fn read(&mut self, config: &ProductIdConfig) -> Result<()> {
        let content = fs::read_to_string(&self.path).map_err(|e| Error::Unreadable {
            path: self.path.clone(),
            source: e,
        })?;
        let repo_map = parse_document(&self.path, &content)?;

        let mut products = BTreeMap::new();
        for (product_id, repo_ids) in repo_map {
            let mut record = ProductRecord::locate(product_id.clone(), config);
            if !record.is_installed {
                warn!(
                    "Product certificate for product {} is missing from {} and {}",
                    product_id,
                    config.product_cert_dir.display(),
                    config.default_product_cert_dir.display()
                );
            }
            for repo_id in &repo_ids {
                record.add_repo(repo_id);
            }
            products.insert(product_id, record);
        }

        debug!(
            "Loaded {} product(s) from {}",
            products.len(),
            self.path.display()
        );
        self.products = products;
        Ok(())
    }

    /// Project the database onto its JSON document
    ///
    /// Only installed products with at least one repository are emitted;
    /// keys and repository IDs are sorted.
    pub fn to_document(&self) -> Value {
        let mut root = Map::new();
        for record in self
            .products
            .values()
            .filter(|r| r.is_installed && r.repo_count() > 0)
        {
            let repos = record
                .repo_ids()
                .map(|id| Value::String(id.to_string()))
                .collect();
            root.insert(record.product_id.clone(), Value::Array(repos));
        }
        Value::Object(root)
    }

    /// Render the document with the persisted formatting
    pub fn to_pretty_string(&self) -> String {
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(INDENT);
        let mut ser = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        // Serializing a Value into a Vec cannot fail
        if self.to_document().serialize(&mut ser).is_err() {
            return "{}".to_string();
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// Write the database to its path
    ///
    /// The document is written to a temporary file next to the target and
    /// renamed over it.
    pub fn save(&self) -> Result<()> {
        let io_err = |e: io::Error| Error::Io {
            path: self.path.clone(),
            source: e,
        };

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut content = self.to_pretty_string();
        content.push('\n');

        let mut tmp = tempfile::Builder::new()
            .prefix(".productid-db-")
            .tempfile_in(dir)
            .map_err(io_err)?;
        tmp.write_all(content.as_bytes()).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;

        debug!("Saved product database to {}", self.path.display());
        Ok(())
    }

    /// Insert a record for `product_id`; returns false if one already exists
    ///
    /// Existing records are never overwritten.
    pub fn add_product(&mut self, product_id: &str, cert_path: impl AsRef<Path>) -> bool {
        if self.products.contains_key(product_id) {
            return false;
        }
        self.products.insert(
            product_id.to_string(),
            ProductRecord::new(product_id, cert_path),
        );
        true
    }

    /// Remove a record and all its repositories; returns true if it existed
    pub fn remove_product(&mut self, product_id: &str) -> bool {
        self.products.remove(product_id).is_some()
    }

    pub fn has_product(&self, product_id: &str) -> bool {
        self.products.contains_key(product_id)
    }

    pub fn get(&self, product_id: &str) -> Option<&ProductRecord> {
        self.products.get(product_id)
    }

    pub fn get_mut(&mut self, product_id: &str) -> Option<&mut ProductRecord> {
        self.products.get_mut(product_id)
    }

    /// Repository IDs of a product, empty for unknown products
    pub fn repo_ids(&self, product_id: &str) -> BTreeSet<String> {
        self.products
            .get(product_id)
            .map(|r| r.repo_ids().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// All records in product ID order
    pub fn products(&self) -> impl Iterator<Item = &ProductRecord> {
        self.products.values()
    }

    pub(crate) fn products_mut(&mut self) -> impl Iterator<Item = &mut ProductRecord> {
        self.products.values_mut()
    }

    /// Product IDs in order
    pub fn product_ids(&self) -> Vec<String> {
        self.products.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl fmt::Display for ProductDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_pretty_string())
    }
}

/// Validate the document structure and collect `product_id -> repo_ids`
fn parse_document(path: &Path, content: &str) -> Result<BTreeMap<String, BTreeSet<String>>> {
    let malformed = |reason: String| Error::MalformedDatabase {
        path: path.to_path_buf(),
        reason,
    };

    let root: Value =
        serde_json::from_str(content).map_err(|e| malformed(format!("invalid JSON: {}", e)))?;
    let Value::Object(root) = root else {
        return Err(malformed("root is not an object".to_string()));
    };

    let mut repo_map = BTreeMap::new();
    for (product_id, repos) in root {
        if !is_product_id(&product_id) {
            return Err(malformed(format!(
                "product ID {:?} is not numeric",
                product_id
            )));
        }
        let Value::Array(repos) = repos else {
            return Err(malformed(format!(
                "repositories of product {} are not an array",
                product_id
            )));
        };
        let mut repo_ids = BTreeSet::new();
        for repo in repos {
            let Value::String(repo_id) = repo else {
                return Err(malformed(format!(
                    "repository of product {} is not a string: {}",
                    product_id, repo
                )));
            };
            repo_ids.insert(repo_id);
        }
        repo_map.insert(product_id, repo_ids);
    }
    Ok(repo_map)
}
