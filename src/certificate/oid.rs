// src/certificate/oid.rs

//! Product ID extraction from the vendor OID extension
//!
//! Product certificates carry several extensions under the product namespace
//! `1.3.6.1.4.1.2312.9.1`, one per attribute of the product:
//!
//! ```text
//! 1.3.6.1.4.1.2312.9.1.38091.1  name
//! 1.3.6.1.4.1.2312.9.1.38091.2  version
//! 1.3.6.1.4.1.2312.9.1.38091.3  architecture
//! ```
//!
//! The arc right after the namespace (here `38091`) is the product ID. The
//! certificate signature and validity are not checked.

use const_oid::ObjectIdentifier;
use x509_cert::Certificate;
use x509_cert::der::Decode;

use super::CertificateError;

/// Vendor OID plus `.1`, the product namespace
pub const PRODUCT_NAMESPACE_OID: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.2312.9.1");

/// Return the product ID encoded by `oid`, if it lies in the product namespace
///
/// The OID must have both a product arc and an attribute arc after the
/// namespace; a bare `<namespace>.<id>` is not a product attribute.
pub fn product_id_from_oid(oid: &ObjectIdentifier) -> Option<String> {
    let mut arcs = oid.arcs();
    for expected in PRODUCT_NAMESPACE_OID.arcs() {
        if arcs.next() != Some(expected) {
            return None;
        }
    }
    let product_id = arcs.next()?;
    arcs.next()?;
    Some(product_id.to_string())
}

/// Extract the product ID from PEM-encoded certificate content
///
/// The first PEM block tagged `CERTIFICATE` is used. Extensions are scanned
/// in order and the first one in the product namespace wins.
pub fn extract_product_id(content: &[u8]) -> Result<String, CertificateError> {
    if content.iter().all(u8::is_ascii_whitespace) {
        return Err(CertificateError::Empty);
    }

    let blocks = pem::parse_many(content)?;
    let block = blocks
        .iter()
        .find(|b| b.tag() == "CERTIFICATE")
        .ok_or(CertificateError::NoCertificateBlock)?;

    let cert = Certificate::from_der(block.contents())
        .map_err(|e| CertificateError::Der(e.to_string()))?;

    cert.tbs_certificate
        .extensions
        .iter()
        .flatten()
        .find_map(|ext| product_id_from_oid(&ext.extn_id))
        .ok_or(CertificateError::MissingProductOid)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRODUCT_CERT: &[u8] = include_bytes!("../../tests/fixtures/38091.pem");
    const PLAIN_CERT: &[u8] = include_bytes!("../../tests/fixtures/no_product.pem");

    #[test]
    fn test_product_id_from_oid() {
        let oid = ObjectIdentifier::new_unwrap("1.3.6.1.4.1.2312.9.1.38091.1");
        assert_eq!(product_id_from_oid(&oid), Some("38091".to_string()));

        let oid = ObjectIdentifier::new_unwrap("1.3.6.1.4.1.2312.9.1.69.3");
        assert_eq!(product_id_from_oid(&oid), Some("69".to_string()));
    }

    #[test]
    fn test_product_id_from_oid_requires_attribute_arc() {
        let oid = ObjectIdentifier::new_unwrap("1.3.6.1.4.1.2312.9.1.38091");
        assert_eq!(product_id_from_oid(&oid), None);
    }

    #[test]
    fn test_product_id_from_oid_other_namespace() {
        // Entitlement namespace, not products
        let oid = ObjectIdentifier::new_unwrap("1.3.6.1.4.1.2312.9.2.38091.1");
        assert_eq!(product_id_from_oid(&oid), None);

        let oid = ObjectIdentifier::new_unwrap("2.5.29.19");
        assert_eq!(product_id_from_oid(&oid), None);
    }

    #[test]
    fn test_extract_product_id() {
        assert_eq!(extract_product_id(PRODUCT_CERT).unwrap(), "38091");
    }

    #[test]
    fn test_extract_product_id_missing_oid() {
        let err = extract_product_id(PLAIN_CERT).unwrap_err();
        assert!(matches!(err, CertificateError::MissingProductOid));
        assert!(err.to_string().contains("1.3.6.1.4.1.2312.9.1"));
    }

    #[test]
    fn test_extract_product_id_empty() {
        assert!(matches!(extract_product_id(b""), Err(CertificateError::Empty)));
        assert!(matches!(extract_product_id(b" \n"), Err(CertificateError::Empty)));
    }

    #[test]
    fn test_extract_product_id_garbage() {
        let err = extract_product_id(b"this is not a certificate").unwrap_err();
        assert!(matches!(err, CertificateError::NoCertificateBlock));
    }

    #[test]
    fn test_extract_product_id_bad_der() {
        let content = b"-----BEGIN CERTIFICATE-----\nAAECAw==\n-----END CERTIFICATE-----\n";
        let err = extract_product_id(content).unwrap_err();
        assert!(matches!(err, CertificateError::Der(_)));
    }
}
