//! # Merchant Configuration
//!
//! Apple Pay merchant settings. All values are loaded from environment
//! variables; certificate and key are PEM files on disk.

use pay_core::PaymentError;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Merchant identifiers always carry this prefix
pub const MERCHANT_ID_PREFIX: &str = "merchant.";

/// Apple Root CA - G3, as downloaded from Apple PKI
pub const DEFAULT_ROOT_CERTIFICATE: &str = "AppleRootCA-G3.crt";

/// Apple Pay merchant configuration
#[derive(Debug, Clone)]
pub struct MerchantConfig {
    /// Merchant identifier (merchant.com.example.store)
    pub merchant_id: String,

    /// Name shown on the payment sheet
    pub display_name: String,

    /// Domain the payment sheet is served from
    pub domain_name: String,

    /// Merchant identity certificate (PEM)
    pub certificate_path: Option<PathBuf>,

    /// Private key of the merchant identity certificate (PEM)
    pub key_path: Option<PathBuf>,

    /// Root certificate that payment token signatures chain to
    pub root_certificate_path: PathBuf,

    /// How long after signing a payment token is accepted
    pub transaction_window: Duration,

    /// Timeout for gateway requests
    pub request_timeout: Duration,
}

impl MerchantConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `APPLEPAY_MERCHANT_ID`
    /// - `APPLEPAY_DISPLAY_NAME`
    /// - `APPLEPAY_DOMAIN_NAME`
    ///
    /// Optional: `APPLEPAY_MERCHANT_CERT`, `APPLEPAY_MERCHANT_KEY`,
    /// `APPLEPAY_ROOT_CERT`, `APPLEPAY_TRANSACTION_WINDOW_SECS`
    pub fn from_env() -> Result<Self, PaymentError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let merchant_id = env::var("APPLEPAY_MERCHANT_ID").map_err(|_| {
            PaymentError::Configuration("APPLEPAY_MERCHANT_ID not set".to_string())
        })?;

        let display_name = env::var("APPLEPAY_DISPLAY_NAME").map_err(|_| {
            PaymentError::Configuration("APPLEPAY_DISPLAY_NAME not set".to_string())
        })?;

        let domain_name = env::var("APPLEPAY_DOMAIN_NAME").map_err(|_| {
            PaymentError::Configuration("APPLEPAY_DOMAIN_NAME not set".to_string())
        })?;

        let mut config = Self::new(merchant_id, display_name, domain_name)?;
        config.certificate_path = env::var("APPLEPAY_MERCHANT_CERT").ok().map(PathBuf::from);
        config.key_path = env::var("APPLEPAY_MERCHANT_KEY").ok().map(PathBuf::from);
        if let Ok(path) = env::var("APPLEPAY_ROOT_CERT") {
            config.root_certificate_path = PathBuf::from(path);
        }
        if let Ok(secs) = env::var("APPLEPAY_TRANSACTION_WINDOW_SECS") {
            let secs = secs.parse::<u64>().map_err(|_| {
                PaymentError::Configuration(format!(
                    "APPLEPAY_TRANSACTION_WINDOW_SECS is not a number: {}",
                    secs
                ))
            })?;
            config.transaction_window = Duration::from_secs(secs);
        }
        Ok(config)
    }

    /// Create config with explicit values
    pub fn new(
        merchant_id: impl Into<String>,
        display_name: impl Into<String>,
        domain_name: impl Into<String>,
    ) -> Result<Self, PaymentError> {
        let merchant_id = merchant_id.into();
        if !merchant_id.starts_with(MERCHANT_ID_PREFIX) {
            return Err(PaymentError::Configuration(format!(
                "merchant ID should start with `{}`",
                MERCHANT_ID_PREFIX
            )));
        }

        Ok(Self {
            merchant_id,
            display_name: display_name.into(),
            domain_name: domain_name.into(),
            certificate_path: None,
            key_path: None,
            root_certificate_path: PathBuf::from(DEFAULT_ROOT_CERTIFICATE),
            transaction_window: Duration::from_secs(5 * 60),
            request_timeout: Duration::from_secs(30),
        })
    }

    /// Builder: set the merchant identity certificate and key locations
    pub fn with_identity(
        mut self,
        certificate_path: impl Into<PathBuf>,
        key_path: impl Into<PathBuf>,
    ) -> Self {
        self.certificate_path = Some(certificate_path.into());
        self.key_path = Some(key_path.into());
        self
    }

    /// Read certificate and key into one PEM bundle
    pub fn identity_pem(&self) -> Result<Vec<u8>, PaymentError> {
        let (cert, key) = match (&self.certificate_path, &self.key_path) {
            (Some(cert), Some(key)) => (cert, key),
            _ => {
                return Err(PaymentError::Configuration(
                    "merchant identity certificate and key are required".to_string(),
                ))
            }
        };

        let mut pem = std::fs::read(cert).map_err(|e| {
            PaymentError::Configuration(format!(
                "error loading the certificate {}: {}",
                cert.display(),
                e
            ))
        })?;
        if !pem.ends_with(b"\n") {
            pem.push(b'\n');
        }
        let key_pem = std::fs::read(key).map_err(|e| {
            PaymentError::Configuration(format!("error loading the key {}: {}", key.display(), e))
        })?;
        pem.extend_from_slice(&key_pem);
        Ok(pem)
    }
}
