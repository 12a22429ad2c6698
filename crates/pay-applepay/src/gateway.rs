//! # Apple Pay Gateway Sessions
//!
//! Requests merchant sessions from the Apple Pay gateway on behalf of the
//! payment sheet. The request is authenticated with the merchant identity
//! certificate; the gateway's answer is passed back untouched.

use crate::certificate::check_merchant_certificate;
use crate::config::MerchantConfig;
use async_trait::async_trait;
use pay_core::{MerchantSessionProvider, PaymentError, PaymentResult};
use reqwest::{Client, Identity};
use serde::Serialize;
use tracing::{debug, error, info, instrument};
use url::Url;

const GATEWAY_HOST_PREFIX: &str = "apple-pay-gateway";
const GATEWAY_HOST_SUFFIX: &str = ".apple.com";

/// Check that a validation URL belongs to an Apple Pay gateway.
///
/// Accepts `https://apple-pay-gateway.apple.com/...` and the regional
/// `https://apple-pay-gateway-<region>.apple.com/...` hosts.
pub fn check_session_url(location: &str) -> PaymentResult<Url> {
    let url = Url::parse(location)
        .map_err(|e| PaymentError::InvalidSessionUrl(format!("error parsing the URL: {}", e)))?;

    let host = url.host_str().unwrap_or_default();
    let valid_host = host
        .strip_suffix(GATEWAY_HOST_SUFFIX)
        .and_then(|h| h.strip_prefix(GATEWAY_HOST_PREFIX))
        .map(|rest| rest.is_empty() || (rest.len() > 1 && rest.starts_with('-')))
        .unwrap_or(false);
    if !valid_host {
        return Err(PaymentError::InvalidSessionUrl(format!("invalid host {:?}", host)));
    }

    if url.scheme() != "https" {
        return Err(PaymentError::InvalidSessionUrl(format!(
            "unsupported protocol {}",
            url.scheme()
        )));
    }

    Ok(url)
}

/// Body of a merchant session request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionRequest<'a> {
    merchant_identifier: &'a str,
    domain_name: &'a str,
    display_name: &'a str,
}

/// Merchant session client for the Apple Pay gateway
pub struct AppleSessionClient {
    config: MerchantConfig,
    client: Client,
    check_gateway_host: bool,
}

impl AppleSessionClient {
    /// Create a client presenting the configured merchant identity.
    ///
    /// The certificate must hold an RSA key, be currently valid, and carry
    /// the hash of the configured merchant identifier.
    pub fn new(config: MerchantConfig) -> PaymentResult<Self> {
        let pem = config.identity_pem()?;
        check_merchant_certificate(&pem, &config.merchant_id)?;
        let identity = Identity::from_pem(&pem).map_err(|e| {
            PaymentError::Configuration(format!("invalid merchant identity: {}", e))
        })?;

        let client = Client::builder()
            .identity(identity)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| PaymentError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self::with_client(config, client))
    }

    /// Create from environment variables
    pub fn from_env() -> PaymentResult<Self> {
        let config = MerchantConfig::from_env()?;
        Self::new(config)
    }

    /// Create with a preconfigured HTTP client
    pub fn with_client(config: MerchantConfig, client: Client) -> Self {
        Self {
            config,
            client,
            check_gateway_host: true,
        }
    }

    /// Builder: accept any validation URL (for testing against a mock gateway)
    pub fn without_gateway_check(mut self) -> Self {
        self.check_gateway_host = false;
        self
    }

    pub fn config(&self) -> &MerchantConfig {
        &self.config
    }

    fn session_request(&self) -> SessionRequest<'_> {
        SessionRequest {
            merchant_identifier: &self.config.merchant_id,
            domain_name: &self.config.domain_name,
            display_name: &self.config.display_name,
        }
    }
}

#[async_trait]
impl MerchantSessionProvider for AppleSessionClient {
    #[instrument(skip(self), fields(merchant_id = %self.config.merchant_id))]
    async fn request_session(&self, validation_url: &str) -> PaymentResult<Vec<u8>> {
        let url = if self.check_gateway_host {
            check_session_url(validation_url)?
        } else {
            Url::parse(validation_url)
                .map_err(|e| PaymentError::InvalidSessionUrl(e.to_string()))?
        };

        debug!("Requesting merchant session from {}", url);

        let response = self
            .client
            .post(url)
            .json(&self.session_request())
            .send()
            .await
            .map_err(|e| PaymentError::Network(format!("error making the request: {}", e)))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        if !status.is_success() {
            let message = String::from_utf8_lossy(&body).into_owned();
            error!("Gateway error: status={}, body={}", status, message);
            return Err(PaymentError::Gateway {
                status: status.as_u16(),
                message,
            });
        }

        info!("Received merchant session ({} bytes)", body.len());
        Ok(body.to_vec())
    }

    fn merchant_id(&self) -> &str {
        &self.config.merchant_id
    }
}
