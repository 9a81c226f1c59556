// src/certificate/mod.rs

//! Product certificate handling
//!
//! This module provides:
//! - Decompression of downloaded productid metadata (gzip, xz, zstd)
//! - Product ID extraction from the vendor OID extension
//! - Scanning certificate directories and installing/deleting certificates

mod compression;
mod oid;
mod store;

pub use compression::{decompress_auto, decompress_file, CompressionFormat};
pub use oid::{extract_product_id, product_id_from_oid, PRODUCT_NAMESPACE_OID};
pub use store::{
    delete_certificate, install_certificate, is_product_id, scan_certificate_dir,
    CertificateFile,
};

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while reading a product certificate
///
/// These are never fatal to a reconciliation pass: the repository that
/// delivered the certificate is skipped and retried on the next pass.
#[derive(Error, Debug)]
pub enum CertificateError {
    #[error("Cannot open {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to decompress {format} data: {source}")]
    Decompression {
        format: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("PEM parse failed: {0}")]
    Pem(#[from] pem::PemError),

    #[error("No CERTIFICATE block found")]
    NoCertificateBlock,

    #[error("Failed to decode X.509 certificate: {0}")]
    Der(String),

    #[error("Product OID {} not found or malformed", PRODUCT_NAMESPACE_OID)]
    MissingProductOid,

    #[error("Certificate content is empty")]
    Empty,
}

/// Access to certificate content, injected into the reconciler
pub trait CertificateExtractor {
    /// Read a possibly compressed certificate blob into raw bytes
    fn decompress(&self, path: &Path) -> Result<Vec<u8>, CertificateError>;

    /// Read the product ID out of raw certificate bytes
    fn extract_product_id(&self, content: &[u8]) -> Result<String, CertificateError>;
}

/// Default extractor: magic-byte decompression plus PEM/X.509 parsing
#[derive(Debug, Default, Clone, Copy)]
pub struct X509Extractor;

impl X509Extractor {
    pub fn new() -> Self {
        Self
    }
}

impl CertificateExtractor for X509Extractor {
    fn decompress(&self, path: &Path) -> Result<Vec<u8>, CertificateError> {
        decompress_file(path)
    }

    fn extract_product_id(&self, content: &[u8]) -> Result<String, CertificateError> {
        extract_product_id(content)
    }
}
