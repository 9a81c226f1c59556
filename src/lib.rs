// src/lib.rs

//! Product certificate reconciliation
//!
//! Keeps the product certificates of a subscription-managed system in step
//! with the repositories its packages come from.
//!
//! # Architecture
//!
//! - Product database: small JSON document mapping product IDs to repositories
//! - Certificates: PEM files named `<product_id>.pem`, carrying the product ID
//!   in a vendor OID extension
//! - Reconciliation: one pass after every package transaction, merging disk
//!   state, transaction facts and the database, then pruning what is stale
//! - Sources: the package manager is reached only through [`source::RepositorySource`]

pub mod certificate;
pub mod config;
pub mod db;
mod error;
pub mod filesystem;
pub mod reconcile;
pub mod source;

pub use certificate::{CertificateError, CertificateExtractor, X509Extractor};
pub use config::{load_config, ProductIdConfig};
pub use db::{ProductDatabase, ProductRecord, RepoRecord};
pub use error::{Error, Result};
pub use reconcile::{run_pass, ReconcileFacts, ReconcileReport, Reconciler};
pub use source::{FactsFile, RepositorySource};
