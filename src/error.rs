// src/error.rs

//! Error types shared by the product database and the reconciliation engine

use crate::certificate::CertificateError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reconciling product certificates
#[derive(Error, Debug)]
pub enum Error {
    /// File is missing or cannot be opened; callers usually treat this as empty state
    #[error("Cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Product database does not have the expected structure
    #[error("Malformed product database {path}: {reason}")]
    MalformedDatabase { path: PathBuf, reason: String },

    /// Write, rename or delete failure
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Decompression or product OID extraction failure
    #[error("Certificate error: {0}")]
    Certificate(#[from] CertificateError),

    /// A required directory could not be created before the pass
    #[error("Failed to set up directory {path}: {source}")]
    Setup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Configuration file could not be used
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transaction facts document could not be used
    #[error("Invalid transaction facts {path}: {reason}")]
    Facts { path: PathBuf, reason: String },

    /// Product ID is not a decimal number
    #[error("Invalid product ID: {0:?}")]
    InvalidProductId(String),
}

impl Error {
    /// True when the error means "nothing there yet" rather than corruption
    pub fn is_unreadable(&self) -> bool {
        matches!(self, Error::Unreadable { .. })
    }
}

/// Result type alias for productid operations
pub type Result<T> = std::result::Result<T, Error>;
