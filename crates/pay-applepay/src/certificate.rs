//! # Merchant Certificates
//!
//! Checks on the merchant identity certificate before the gateway client
//! presents it: RSA key, validity period, and Apple's merchant ID hash
//! extension matching the configured merchant identifier.

use pay_core::{PaymentError, PaymentResult};
use sha2::{Digest, Sha256};
use x509_parser::certificate::X509Certificate;
use x509_parser::parse_x509_certificate;
use x509_parser::pem::parse_x509_pem;

/// Apple extension holding the hex SHA-256 of the merchant identifier
pub const MERCHANT_ID_HASH_OID: &str = "1.2.840.113635.100.6.32";

const RSA_ENCRYPTION_OID: &str = "1.2.840.113549.1.1.1";

/// String header followed by 64 hex digits
const MERCHANT_HASH_EXTENSION_LEN: usize = 66;

fn invalid(message: impl Into<String>) -> PaymentError {
    PaymentError::Configuration(message.into())
}

/// SHA-256 of the merchant identifier
pub fn merchant_id_hash(merchant_id: &str) -> [u8; 32] {
    Sha256::digest(merchant_id.as_bytes()).into()
}

/// Value of extension `oid`, if the certificate carries it
pub(crate) fn extension_value<'a>(cert: &X509Certificate<'a>, oid: &str) -> Option<&'a [u8]> {
    cert.extensions()
        .iter()
        .find(|ext| ext.oid.to_id_string() == oid)
        .map(|ext| ext.value)
}

/// Decode the merchant ID hash stored in the extension value
pub fn parse_merchant_hash(value: &[u8]) -> PaymentResult<Vec<u8>> {
    if value.len() != MERCHANT_HASH_EXTENSION_LEN {
        return Err(invalid("invalid merchant ID hash length"));
    }
    hex::decode(&value[2..]).map_err(|e| invalid(format!("invalid merchant ID hash hex: {}", e)))
}

/// Parse a PEM or DER certificate and hand it to `check`
pub(crate) fn with_certificate<T>(
    bytes: &[u8],
    check: impl FnOnce(&X509Certificate<'_>) -> PaymentResult<T>,
) -> PaymentResult<T> {
    if bytes.starts_with(b"-----BEGIN") {
        let (_, pem) = parse_x509_pem(bytes)
            .map_err(|e| invalid(format!("error decoding the certificate: {}", e)))?;
        let cert = pem
            .parse_x509()
            .map_err(|e| invalid(format!("error parsing the certificate: {}", e)))?;
        check(&cert)
    } else {
        let (_, cert) = parse_x509_certificate(bytes)
            .map_err(|e| invalid(format!("error parsing the certificate: {}", e)))?;
        check(&cert)
    }
}

/// Check the merchant identity certificate (first PEM block of `pem`)
/// against `merchant_id`
pub fn check_merchant_certificate(pem: &[u8], merchant_id: &str) -> PaymentResult<()> {
    with_certificate(pem, |cert| {
        if cert.public_key().algorithm.algorithm.to_id_string() != RSA_ENCRYPTION_OID {
            return Err(invalid("merchant key should be RSA"));
        }
        if !cert.validity().is_valid() {
            return Err(invalid("certificate is expired or not yet valid"));
        }

        let value = extension_value(cert, MERCHANT_ID_HASH_OID)
            .ok_or_else(|| invalid("merchant ID hash extension not found"))?;
        if parse_merchant_hash(value)? != merchant_id_hash(merchant_id) {
            return Err(invalid("invalid merchant certificate or merchant ID"));
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MERCHANT_ID: &str = "merchant.com.example.store";
    const MERCHANT_PEM: &[u8] = include_bytes!("../tests/fixtures/merchant.pem");
    const EC_LEAF_PEM: &[u8] = include_bytes!("../tests/fixtures/leaf.pem");

    #[test]
    fn test_merchant_id_hash() {
        assert_eq!(
            hex::encode(merchant_id_hash(MERCHANT_ID)),
            "c23073d7f46b012bfd60fe9e90ef578910b808069d52539a291a62df9fecdd1b"
        );
    }

    #[test]
    fn test_parse_merchant_hash() {
        let mut value = b"\x0c@".to_vec();
        value.extend_from_slice(hex::encode(merchant_id_hash(MERCHANT_ID)).as_bytes());
        assert_eq!(parse_merchant_hash(&value).unwrap(), merchant_id_hash(MERCHANT_ID));

        assert!(parse_merchant_hash(&value[..40]).is_err());
        value[10] = b'z';
        assert!(parse_merchant_hash(&value).is_err());
    }

    #[test]
    fn test_merchant_certificate_accepted() {
        check_merchant_certificate(MERCHANT_PEM, MERCHANT_ID).unwrap();
    }

    #[test]
    fn test_certificate_for_other_merchant_rejected() {
        let err = check_merchant_certificate(MERCHANT_PEM, "merchant.com.example.other").unwrap_err();
        assert!(err.to_string().contains("invalid merchant certificate"));
    }

    #[test]
    fn test_non_rsa_certificate_rejected() {
        let err = check_merchant_certificate(EC_LEAF_PEM, MERCHANT_ID).unwrap_err();
        assert!(err.to_string().contains("RSA"));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(check_merchant_certificate(b"-----BEGIN CERTIFICATE-----", MERCHANT_ID).is_err());
        assert!(check_merchant_certificate(b"\x30\x03\x02\x01\x01", MERCHANT_ID).is_err());
    }
}
