//! # Token Signatures
//!
//! Verifies the CMS signature of a payment token: the embedded leaf and
//! intermediate certificates must chain to the Apple root, the leaf must
//! have signed the token content, and the signing time must fall within
//! the transaction window (replay protection).

use crate::ber::{
    self, Tlv, TAG_CONTEXT_0, TAG_GENERALIZED_TIME, TAG_OCTET_STRING, TAG_OID, TAG_SEQUENCE,
    TAG_SET, TAG_UTC_TIME,
};
use crate::certificate::{extension_value, with_certificate};
use crate::config::MerchantConfig;
use crate::token::PaymentToken;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{Signature, VerifyingKey};
use pay_core::{PaymentError, PaymentResult};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::debug;
use x509_parser::certificate::X509Certificate;
use x509_parser::parse_x509_certificate;

/// Marks the leaf certificate that signs payment tokens
pub const LEAF_CERTIFICATE_OID: &str = "1.2.840.113635.100.6.29";
/// Marks the intermediate certificate issuing the leaf
pub const INTERMEDIATE_CERTIFICATE_OID: &str = "1.2.840.113635.100.6.2.14";

/// 1.2.840.113549.1.7.2
const SIGNED_DATA_OID: &[u8] = &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x07, 0x02];
/// 1.2.840.113549.1.9.4
const MESSAGE_DIGEST_OID: &[u8] = &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x09, 0x04];
/// 1.2.840.113549.1.9.5
const SIGNING_TIME_OID: &[u8] = &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x09, 0x05];

/// Tolerated clock skew for signatures dated after the transaction
const SIGNING_CLOCK_SKEW_SECS: i64 = 1;

fn invalid(message: impl Into<String>) -> PaymentError {
    PaymentError::InvalidSignature(message.into())
}

/// The parts of a CMS `SignedData` the checks need
struct SignedData<'a> {
    certificates: Vec<&'a [u8]>,
    /// Signed attributes, re-tagged as the DER `SET` that was signed
    signed_attributes: Vec<u8>,
    message_digest: &'a [u8],
    signing_time: DateTime<Utc>,
    signature: &'a [u8],
}

impl<'a> SignedData<'a> {
    fn parse(bytes: &'a [u8]) -> PaymentResult<Self> {
        let content_info = ber::read_single(bytes)?
            .tagged(TAG_SEQUENCE, "ContentInfo")?
            .children()?;
        let (content_type, explicit) = match content_info.as_slice() {
            [content_type, explicit, ..] => (*content_type, *explicit),
            _ => return Err(invalid("incomplete ContentInfo")),
        };
        if content_type.tagged(TAG_OID, "content type")?.content != SIGNED_DATA_OID {
            return Err(invalid("signature is not CMS SignedData"));
        }

        let signed_data = explicit
            .tagged(TAG_CONTEXT_0, "SignedData wrapper")?
            .children()?
            .into_iter()
            .next()
            .ok_or_else(|| invalid("empty SignedData wrapper"))?
            .tagged(TAG_SEQUENCE, "SignedData")?
            .children()?;

        let certificates = signed_data
            .iter()
            .find(|item| item.tag == TAG_CONTEXT_0)
            .ok_or_else(|| invalid("no certificates in signature"))?
            .children()?
            .into_iter()
            .map(|cert| cert.raw)
            .collect();

        let signer = signed_data
            .last()
            .ok_or_else(|| invalid("empty SignedData"))?
            .tagged(TAG_SET, "SignerInfos")?
            .children()?
            .into_iter()
            .next()
            .ok_or_else(|| invalid("no signer"))?
            .tagged(TAG_SEQUENCE, "SignerInfo")?
            .children()?;

        let attributes = signer
            .iter()
            .find(|item| item.tag == TAG_CONTEXT_0)
            .ok_or_else(|| invalid("no signed attributes"))?;
        let signature = signer
            .iter()
            .find(|item| item.tag == TAG_OCTET_STRING)
            .ok_or_else(|| invalid("no signature value"))?
            .content;

        let mut signed_attributes = attributes.raw.to_vec();
        signed_attributes[0] = TAG_SET;

        let mut message_digest = None;
        let mut signing_time = None;
        for attribute in attributes.children()? {
            let parts = attribute.tagged(TAG_SEQUENCE, "Attribute")?.children()?;
            let (oid, values) = match parts.as_slice() {
                [oid, values] => (oid.tagged(TAG_OID, "attribute type")?, *values),
                _ => return Err(invalid("malformed attribute")),
            };
            let value = match values.tagged(TAG_SET, "attribute values")?.children()?.first() {
                Some(value) => *value,
                None => continue,
            };

            if oid.content == MESSAGE_DIGEST_OID {
                message_digest = Some(value.tagged(TAG_OCTET_STRING, "messageDigest")?.content);
            } else if oid.content == SIGNING_TIME_OID {
                signing_time = Some(parse_time(value)?);
            }
        }

        Ok(Self {
            certificates,
            signed_attributes,
            message_digest: message_digest.ok_or_else(|| invalid("no message digest"))?,
            signing_time: signing_time.ok_or_else(|| invalid("signing time not found"))?,
            signature,
        })
    }
}

/// `UTCTime` or `GeneralizedTime`, seconds precision, UTC
fn parse_time(value: Tlv<'_>) -> PaymentResult<DateTime<Utc>> {
    let format = match value.tag {
        TAG_UTC_TIME => "%y%m%d%H%M%SZ",
        TAG_GENERALIZED_TIME => "%Y%m%d%H%M%SZ",
        other => return Err(invalid(format!("unexpected signing time tag {:#04x}", other))),
    };
    let text = std::str::from_utf8(value.content).map_err(|_| invalid("signing time is not text"))?;
    NaiveDateTime::parse_from_str(text, format)
        .map(|time| time.and_utc())
        .map_err(|e| invalid(format!("error parsing signing time {:?}: {}", text, e)))
}

/// Token signature verifier anchored on the Apple root certificate
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    root: Vec<u8>,
    transaction_window: Duration,
}

impl TokenVerifier {
    /// Verifier trusting `root` (PEM or DER), which must be a CA certificate
    pub fn new(root: impl Into<Vec<u8>>) -> PaymentResult<Self> {
        let root = root.into();
        with_certificate(&root, |cert| {
            if !cert.is_ca() {
                return Err(PaymentError::Configuration(
                    "the root certificate seems not to be a CA".to_string(),
                ));
            }
            Ok(())
        })?;

        Ok(Self {
            root,
            transaction_window: Duration::minutes(5),
        })
    }

    /// Load the root certificate from disk
    pub fn from_file(path: impl AsRef<Path>) -> PaymentResult<Self> {
        let path = path.as_ref();
        let root = std::fs::read(path).map_err(|e| {
            PaymentError::Configuration(format!(
                "error reading the root certificate {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::new(root)
    }

    /// Root and transaction window from the merchant configuration
    pub fn from_config(config: &MerchantConfig) -> PaymentResult<Self> {
        let window = Duration::from_std(config.transaction_window).map_err(|_| {
            PaymentError::Configuration("transaction window out of range".to_string())
        })?;
        Ok(Self::from_file(&config.root_certificate_path)?.with_transaction_window(window))
    }

    /// Builder: how long after signing a token is still accepted
    pub fn with_transaction_window(mut self, window: Duration) -> Self {
        self.transaction_window = window;
        self
    }

    pub fn transaction_window(&self) -> Duration {
        self.transaction_window
    }

    /// Verify the token signature for a transaction received at `transaction_time`
    pub fn verify(&self, token: &PaymentToken, transaction_time: DateTime<Utc>) -> PaymentResult<()> {
        let signature = STANDARD
            .decode(&token.payment_data.signature)
            .map_err(|e| invalid(format!("signature is not valid base64: {}", e)))?;
        let signed_data = SignedData::parse(&signature)?;

        self.verify_certificates(&signed_data, |leaf| {
            verify_content(leaf, &signed_data, &token.signed_payload()?)
        })?;
        check_signing_time(signed_data.signing_time, transaction_time, self.transaction_window)?;

        debug!(
            "Token signature verified, signed at {}",
            signed_data.signing_time
        );
        Ok(())
    }

    /// Chain leaf and intermediate to the root, then run `check` on the leaf
    fn verify_certificates(
        &self,
        signed_data: &SignedData<'_>,
        check: impl FnOnce(&X509Certificate<'_>) -> PaymentResult<()>,
    ) -> PaymentResult<()> {
        let mut certificates = Vec::with_capacity(signed_data.certificates.len());
        for der in &signed_data.certificates {
            let (_, cert) = parse_x509_certificate(der)
                .map_err(|e| invalid(format!("error decoding embedded certificate: {}", e)))?;
            certificates.push(cert);
        }

        let find = |oid: &str, what: &str| {
            certificates
                .iter()
                .find(|cert| extension_value(cert, oid).is_some())
                .ok_or_else(|| invalid(format!("invalid {} cert Apple extension", what)))
        };
        let leaf = find(LEAF_CERTIFICATE_OID, "leaf")?;
        let intermediate = find(INTERMEDIATE_CERTIFICATE_OID, "intermediate")?;

        with_certificate(&self.root, |root| {
            intermediate
                .verify_signature(Some(root.public_key()))
                .map_err(|e| invalid(format!("intermediate cert is not trusted by root: {}", e)))
        })?;
        leaf.verify_signature(Some(intermediate.public_key()))
            .map_err(|e| {
                invalid(format!(
                    "leaf cert is not trusted by intermediate cert: {}",
                    e
                ))
            })?;

        check(leaf)
    }
}

/// The leaf signed the attributes, and the attributes commit to `payload`
fn verify_content(
    leaf: &X509Certificate<'_>,
    signed_data: &SignedData<'_>,
    payload: &[u8],
) -> PaymentResult<()> {
    if Sha256::digest(payload).as_slice() != signed_data.message_digest {
        return Err(invalid("message digest does not match the token content"));
    }

    let key_bytes: &[u8] = leaf.public_key().subject_public_key.data.as_ref();
    let key = VerifyingKey::from_sec1_bytes(key_bytes)
        .map_err(|e| invalid(format!("unsupported leaf key: {}", e)))?;
    let signature = Signature::from_der(signed_data.signature)
        .map_err(|e| invalid(format!("malformed ECDSA signature: {}", e)))?;

    key.verify(&signed_data.signed_attributes, &signature)
        .map_err(|_| invalid("signature validation error"))
}

/// The transaction must follow the signing within `window`
fn check_signing_time(
    signing_time: DateTime<Utc>,
    transaction_time: DateTime<Utc>,
    window: Duration,
) -> PaymentResult<()> {
    let delta = transaction_time - signing_time;
    if delta < -Duration::seconds(SIGNING_CLOCK_SKEW_SECS) {
        return Err(invalid(format!(
            "the transaction occurred before the signing ({}s difference)",
            delta.num_seconds()
        )));
    }
    if delta > window {
        return Err(invalid(format!(
            "rejected signing time delta of {}s (possible replay attack)",
            delta.num_seconds()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const ROOT_PEM: &[u8] = include_bytes!("../tests/fixtures/root.pem");
    const OTHER_ROOT_PEM: &[u8] = include_bytes!("../tests/fixtures/other-root.pem");
    const LEAF_PEM: &[u8] = include_bytes!("../tests/fixtures/leaf.pem");
    const TOKEN_JSON: &str = include_str!("../tests/fixtures/token.json");
    const DER_SIGNATURE: &str = include_str!("../tests/fixtures/signature-der.b64");

    fn token() -> PaymentToken {
        serde_json::from_str(TOKEN_JSON).unwrap()
    }

    /// Signing time of the fixture token
    fn signed_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 1, 45, 3).unwrap()
    }

    fn verifier() -> TokenVerifier {
        TokenVerifier::new(ROOT_PEM).unwrap()
    }

    #[test]
    fn test_valid_token_signature() {
        verifier()
            .verify(&token(), signed_at() + Duration::seconds(30))
            .unwrap();
    }

    #[test]
    fn test_definite_length_signature() {
        let mut token = token();
        token.payment_data.signature = DER_SIGNATURE.trim().to_string();

        // signed five seconds before the indefinite-length fixture
        verifier().verify(&token, signed_at()).unwrap();
    }

    #[test]
    fn test_stale_token_rejected() {
        let err = verifier()
            .verify(&token(), signed_at() + Duration::minutes(10))
            .unwrap_err();
        assert!(err.to_string().contains("replay"));

        let lenient = verifier().with_transaction_window(Duration::minutes(15));
        lenient
            .verify(&token(), signed_at() + Duration::minutes(10))
            .unwrap();
    }

    #[test]
    fn test_transaction_before_signing_rejected() {
        let err = verifier()
            .verify(&token(), signed_at() - Duration::minutes(1))
            .unwrap_err();
        assert!(err.to_string().contains("before the signing"));
    }

    #[test]
    fn test_tampered_data_rejected() {
        let mut token = token();
        token.payment_data.data = STANDARD.encode(b"tampered payment data");

        let err = verifier().verify(&token, signed_at()).unwrap_err();
        assert!(err.to_string().contains("message digest"));
    }

    #[test]
    fn test_untrusted_root_rejected() {
        let verifier = TokenVerifier::new(OTHER_ROOT_PEM).unwrap();

        let err = verifier.verify(&token(), signed_at()).unwrap_err();
        assert!(err.to_string().contains("not trusted by root"));
    }

    #[test]
    fn test_from_config() {
        let mut config = MerchantConfig::new("merchant.com.example.store", "Example", "example.com")
            .unwrap();
        config.root_certificate_path =
            std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/root.pem");
        config.transaction_window = std::time::Duration::from_secs(60);

        let verifier = TokenVerifier::from_config(&config).unwrap();
        assert_eq!(verifier.transaction_window(), Duration::seconds(60));

        config.root_certificate_path = "missing/AppleRootCA-G3.crt".into();
        assert!(matches!(
            TokenVerifier::from_config(&config),
            Err(PaymentError::Configuration(_))
        ));
    }

    #[test]
    fn test_root_must_be_ca() {
        assert!(matches!(
            TokenVerifier::new(LEAF_PEM),
            Err(PaymentError::Configuration(_))
        ));
    }

    #[test]
    fn test_malformed_signature_rejected() {
        let mut token = token();
        token.payment_data.signature = "MIAGCSqGSIb3DQEHAqCAMIACAQE=".to_string();

        assert!(matches!(
            verifier().verify(&token, signed_at()),
            Err(PaymentError::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_signing_time_window() {
        let signed = signed_at();
        let window = Duration::minutes(5);

        assert!(check_signing_time(signed, signed, window).is_ok());
        assert!(check_signing_time(signed, signed - Duration::milliseconds(500), window).is_ok());
        assert!(check_signing_time(signed, signed + window, window).is_ok());
        assert!(check_signing_time(signed, signed + window + Duration::seconds(1), window).is_err());
    }

    #[test]
    fn test_parse_time_formats() {
        let utc = ber::read_single(b"\x17\x0d261019014503Z").unwrap();
        assert_eq!(parse_time(utc).unwrap(), signed_at());

        let generalized = ber::read_single(b"\x18\x0f20261019014503Z").unwrap();
        assert_eq!(parse_time(generalized).unwrap(), signed_at());
    }
}
