// src/certificate/store.rs

//! Certificate directories on disk
//!
//! Certificates are named `<product_id>.<ext>`. Anything else in the
//! directories is ignored, with a warning for files that carry the right
//! extension but a non-numeric stem.

use std::fs;
use std::io::{self, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// A certificate file found by a directory scan
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CertificateFile {
    /// File stem, already checked to be numeric
    pub product_id: String,
    /// Full path of the certificate
    pub path: PathBuf,
}

/// Check that a product ID is a non-empty string of ASCII digits
pub fn is_product_id(candidate: &str) -> bool {
    !candidate.is_empty() && candidate.bytes().all(|b| b.is_ascii_digit())
}

/// List product certificates in `dir`, sorted by product ID
///
/// A missing directory yields an empty list.
pub fn scan_certificate_dir(dir: &Path, extension: &str) -> Result<Vec<CertificateFile>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("Certificate directory {} does not exist", dir.display());
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(Error::Unreadable {
                path: dir.to_path_buf(),
                source: e,
            });
        }
    };

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::Unreadable {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if !is_product_id(stem) {
            warn!(
                "Ignoring {}: file name is not a numeric product ID",
                path.display()
            );
            continue;
        }
        found.push(CertificateFile {
            product_id: stem.to_string(),
            path,
        });
    }

    found.sort();
    Ok(found)
}

/// Write certificate content to `<dir>/<product_id>.<ext>`
///
/// The content goes to a temporary file in `dir` with its final mode and is
/// renamed into place, so a failed install never leaves a certificate behind.
pub fn install_certificate(
    dir: &Path,
    product_id: &str,
    extension: &str,
    content: &[u8],
) -> Result<PathBuf> {
    if !is_product_id(product_id) {
        return Err(Error::InvalidProductId(product_id.to_string()));
    }

    let target = dir.join(format!("{}.{}", product_id, extension));
    let io_err = |e: io::Error| Error::Io {
        path: target.clone(),
        source: e,
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".productid-")
        .tempfile_in(dir)
        .map_err(io_err)?;
    tmp.write_all(content).map_err(io_err)?;
    tmp.as_file()
        .set_permissions(fs::Permissions::from_mode(0o644))
        .map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(&target).map_err(|e| io_err(e.error))?;

    debug!("Installed product certificate {}", target.display());
    Ok(target)
}

/// Remove an installed certificate
pub fn delete_certificate(path: &Path) -> Result<()> {
    fs::remove_file(path).map_err(|e| Error::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    debug!("Removed product certificate {}", path.display());
    Ok(())
}
