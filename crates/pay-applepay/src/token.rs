//! # Payment Tokens
//!
//! The payment object the sheet produces after authorization, as posted by
//! the browser to `/processApplePayResponse`. Binary fields are base64.
//! The header hash is only handed out after the token signature has been
//! verified. See Apple's "Payment Token Format Reference".

use crate::signature::TokenVerifier;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use pay_core::{PaymentError, PaymentResult};
use serde::{Deserialize, Serialize};

/// Full authorized payment: token plus the contacts the sheet collected
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub token: PaymentToken,
    #[serde(default)]
    pub shipping_contact: Option<Contact>,
    #[serde(default)]
    pub billing_contact: Option<Contact>,
}

/// Billing/shipping information from the payment sheet
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Contact {
    pub given_name: String,
    pub family_name: String,
    pub email_address: String,
    pub address_lines: Vec<String>,
    pub administrative_area: String,
    pub locality: String,
    pub postal_code: String,
    pub country: String,
    pub country_code: String,
}

/// Payment information with the encrypted payment data
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentToken {
    pub transaction_identifier: String,
    pub payment_method: PaymentMethod,
    pub payment_data: PaymentData,
}

/// Card used for the payment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentMethod {
    #[serde(rename = "type")]
    pub kind: String,
    pub network: String,
    pub display_name: String,
}

/// Encrypted payment data
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentData {
    pub version: String,
    pub signature: String,
    pub header: Header,
    pub data: String,
}

/// Additional version-dependent information used to decrypt and verify
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Header {
    pub application_data: Option<String>,
    pub ephemeral_public_key: Option<String>,
    pub wrapped_key: Option<String>,
    pub public_key_hash: String,
    pub transaction_id: String,
}

/// Encryption schemes of the payment data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenVersion {
    #[serde(rename = "EC_v1")]
    EcV1,
    #[serde(rename = "RSA_v1")]
    RsaV1,
}

impl TokenVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenVersion::EcV1 => "EC_v1",
            TokenVersion::RsaV1 => "RSA_v1",
        }
    }
}

impl std::str::FromStr for TokenVersion {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EC_v1" => Ok(TokenVersion::EcV1),
            "RSA_v1" => Ok(TokenVersion::RsaV1),
            other => Err(PaymentError::UnsupportedTokenVersion {
                version: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for TokenVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn decode_field(name: &str, value: &str) -> PaymentResult<Vec<u8>> {
    STANDARD
        .decode(value)
        .map_err(|e| PaymentError::InvalidToken(format!("{} is not valid base64: {}", name, e)))
}

fn decode_hex(name: &str, value: &str) -> PaymentResult<Vec<u8>> {
    hex::decode(value)
        .map_err(|e| PaymentError::InvalidToken(format!("{} is not valid hex: {}", name, e)))
}

impl PaymentToken {
    /// Encryption scheme of this token
    pub fn version(&self) -> PaymentResult<TokenVersion> {
        self.payment_data.version.parse()
    }

    fn decoded_public_key_hash(&self) -> PaymentResult<Vec<u8>> {
        let hash = decode_field("publicKeyHash", &self.payment_data.header.public_key_hash)?;
        if hash.is_empty() {
            return Err(PaymentError::InvalidToken("empty publicKeyHash".to_string()));
        }
        Ok(hash)
    }

    /// Content covered by the token signature: the ephemeral public key
    /// (EC_v1) or wrapped key (RSA_v1), the data, the transaction ID and the
    /// application data when present
    pub fn signed_payload(&self) -> PaymentResult<Vec<u8>> {
        let header = &self.payment_data.header;
        let key = match self.version()? {
            TokenVersion::EcV1 => ("ephemeralPublicKey", &header.ephemeral_public_key),
            TokenVersion::RsaV1 => ("wrappedKey", &header.wrapped_key),
        };
        let key = match key {
            (name, Some(value)) => decode_field(name, value)?,
            (name, None) => {
                return Err(PaymentError::InvalidToken(format!("missing {}", name)));
            }
        };

        let mut payload = key;
        payload.extend(decode_field("data", &self.payment_data.data)?);
        payload.extend(decode_hex("transactionId", &header.transaction_id)?);
        if let Some(application_data) = &header.application_data {
            payload.extend(decode_hex("applicationData", application_data)?);
        }
        Ok(payload)
    }

    /// Check the token signature for a transaction received at `transaction_time`
    pub fn verify_signature(
        &self,
        verifier: &TokenVerifier,
        transaction_time: DateTime<Utc>,
    ) -> PaymentResult<()> {
        verifier.verify(self, transaction_time)
    }

    /// Hash of the merchant public key the data was encrypted for.
    /// Only returned once the token signature checks out.
    pub fn public_key_hash(
        &self,
        verifier: &TokenVerifier,
        transaction_time: DateTime<Utc>,
    ) -> PaymentResult<Vec<u8>> {
        self.verify_signature(verifier, transaction_time)?;
        self.decoded_public_key_hash()
    }

    /// Hex rendering of [`PaymentToken::public_key_hash`], for logs and key selection
    pub fn public_key_hash_hex(
        &self,
        verifier: &TokenVerifier,
        transaction_time: DateTime<Utc>,
    ) -> PaymentResult<String> {
        self.public_key_hash(verifier, transaction_time)
            .map(hex::encode)
    }

    /// Structural checks before the token is handed to a processor
    pub fn validate(&self) -> PaymentResult<TokenVersion> {
        let version = self.version()?;

        if self.transaction_identifier.is_empty() {
            return Err(PaymentError::InvalidToken(
                "missing transactionIdentifier".to_string(),
            ));
        }

        for (name, value) in [
            ("data", &self.payment_data.data),
            ("signature", &self.payment_data.signature),
        ] {
            if decode_field(name, value)?.is_empty() {
                return Err(PaymentError::InvalidToken(format!("empty {}", name)));
            }
        }
        self.decoded_public_key_hash()?;

        let header = &self.payment_data.header;
        if decode_hex("transactionId", &header.transaction_id)?.is_empty() {
            return Err(PaymentError::InvalidToken("empty transactionId".to_string()));
        }

        match version {
            TokenVersion::EcV1 if header.ephemeral_public_key.is_none() => {
                return Err(PaymentError::InvalidToken(
                    "EC_v1 token without ephemeralPublicKey".to_string(),
                ))
            }
            TokenVersion::RsaV1 if header.wrapped_key.is_none() => {
                return Err(PaymentError::InvalidToken(
                    "RSA_v1 token without wrappedKey".to_string(),
                ))
            }
            _ => {}
        }

        Ok(version)
    }
}
