// src/filesystem.rs

//! Directory setup and path helpers

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, error};

use crate::config::ProductIdConfig;
use crate::error::{Error, Result};

/// Create every directory a reconciliation pass writes into
///
/// The database directory is made inaccessible to "other" users when this
/// function creates it. Existing directories are left as they are.
pub fn setup_filesystem(config: &ProductIdConfig) -> Result<()> {
    let db_dir = config.database_dir();
    create_dir(&db_dir, true)?;
    create_dir(&config.product_cert_dir, false)?;
    Ok(())
}

fn create_dir(dir: &Path, private: bool) -> Result<()> {
    if dir.is_dir() {
        debug!("Directory {} already exists", dir.display());
        return Ok(());
    }

    debug!("Directory {} does not exist, creating it", dir.display());
    fs::create_dir_all(dir).map_err(|e| {
        error!("Failed to create directory {}: {}", dir.display(), e);
        Error::Setup {
            path: dir.to_path_buf(),
            source: e,
        }
    })?;

    if private {
        let setup_err = |e| Error::Setup {
            path: dir.to_path_buf(),
            source: e,
        };
        let mut perms = fs::metadata(dir).map_err(setup_err)?.permissions();
        perms.set_mode(perms.mode() & !0o007);
        fs::set_permissions(dir, perms).map_err(|e| {
            error!("Failed to set permissions for directory {}: {}", dir.display(), e);
            setup_err(e)
        })?;
    }

    Ok(())
}

/// Lexically normalize a path (drop `.`, resolve `..` against earlier components)
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Check whether `path` lies inside `dir`
///
/// Comparison is lexical so it also works for certificates that no longer exist.
pub fn is_under(path: &Path, dir: &Path) -> bool {
    if path.as_os_str().is_empty() || dir.as_os_str().is_empty() {
        return false;
    }
    normalize(path).starts_with(normalize(dir))
}
