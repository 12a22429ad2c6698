//! # pay-bridge
//!
//! The two requests the payment sheet makes to the merchant backend:
//!
//! | Method | Path | Body | Outcome |
//! |--------|------|------|---------|
//! | POST | `/getApplePaySession` | `{"url": ...}` | 2xx → merchant session JSON |
//! | POST | `/processApplePayResponse` | payment object | exactly 200 → success |
//!
//! One shot each: no retries, no timeout, no cancellation.
//!
//! ```rust,ignore
//! use pay_bridge::HttpBackendBridge;
//! use pay_core::BackendBridge;
//!
//! let bridge = HttpBackendBridge::new("https://shop.example.com");
//! let merchant_session = bridge.fetch_merchant_session(&validation_url).await?;
//! ```

use async_trait::async_trait;
use pay_core::{BackendBridge, BackendEndpoints, PaymentError, PaymentResult};
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
struct MerchantSessionRequest<'a> {
    url: &'a str,
}

/// reqwest implementation of [`BackendBridge`]
#[derive(Debug, Clone)]
pub struct HttpBackendBridge {
    endpoints: BackendEndpoints,
    client: Client,
}

impl HttpBackendBridge {
    /// Bridge to the backend at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_endpoints(BackendEndpoints::new(base_url))
    }

    pub fn with_endpoints(endpoints: BackendEndpoints) -> Self {
        Self {
            endpoints,
            client: Client::new(),
        }
    }
}

fn status_error(status: StatusCode) -> PaymentError {
    PaymentError::http_status(
        status.as_u16(),
        status.canonical_reason().unwrap_or_default(),
    )
}

fn network_error(err: reqwest::Error) -> PaymentError {
    PaymentError::Network(err.to_string())
}

async fn parse_session(response: Response) -> PaymentResult<serde_json::Value> {
    response
        .json::<serde_json::Value>()
        .await
        .map_err(|e| PaymentError::Serialization(format!("merchant session is not JSON: {}", e)))
}

#[async_trait(?Send)]
impl BackendBridge for HttpBackendBridge {
    async fn fetch_merchant_session(&self, validation_url: &str) -> PaymentResult<serde_json::Value> {
        let response = self
            .client
            .post(self.endpoints.session_url())
            .json(&MerchantSessionRequest { url: validation_url })
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if !status.is_success() {
            warn!("Merchant session request failed: {}", status);
            return Err(status_error(status));
        }

        debug!("Merchant session received: {}", status);
        parse_session(response).await
    }

    async fn submit_payment(&self, payment: &serde_json::Value) -> PaymentResult<()> {
        let response = self
            .client
            .post(self.endpoints.payment_url())
            .json(payment)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!("Payment submission rejected: {}", status);
            return Err(status_error(status));
        }

        debug!("Payment accepted by backend");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const VALIDATION_URL: &str = "https://apple-pay-gateway.apple.com/paymentservices/startSession";

    async fn session_server(status: u16, body: serde_json::Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/getApplePaySession"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({ "url": VALIDATION_URL })))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_fetch_merchant_session_success() {
        let payload = json!({
            "epochTimestamp": 1700000000000u64,
            "merchantSessionIdentifier": "SSH5F2E",
            "nonce": "a1b2c3",
            "signature": "308006092a"
        });

        for status in [200, 201, 299] {
            let server = session_server(status, payload.clone()).await;
            let bridge = HttpBackendBridge::new(server.uri());

            let session = bridge.fetch_merchant_session(VALIDATION_URL).await.unwrap();
            assert_eq!(session, payload, "status {status}");
        }
    }

    #[tokio::test]
    async fn test_fetch_merchant_session_rejects_with_status() {
        for status in [300, 400, 404, 500, 502] {
            let server = session_server(status, json!({})).await;
            let bridge = HttpBackendBridge::new(server.uri());

            let err = bridge.fetch_merchant_session(VALIDATION_URL).await.unwrap_err();
            match err {
                PaymentError::HttpStatus { status: got, .. } => assert_eq!(got, status),
                other => panic!("unexpected error {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_fetch_merchant_session_status_text() {
        let server = session_server(500, json!({})).await;
        let bridge = HttpBackendBridge::new(server.uri());

        let err = bridge.fetch_merchant_session(VALIDATION_URL).await.unwrap_err();
        assert_eq!(
            err.rejection(),
            Some((500, "Internal Server Error".to_string()))
        );
    }

    #[tokio::test]
    async fn test_fetch_merchant_session_network_error() {
        // Nothing listens on the discard port
        let bridge = HttpBackendBridge::new("http://127.0.0.1:9");

        let err = bridge.fetch_merchant_session(VALIDATION_URL).await.unwrap_err();
        assert!(matches!(err, PaymentError::Network(_)));
        assert_eq!(err.rejection().map(|(status, _)| status), Some(0));
    }

    #[tokio::test]
    async fn test_submit_payment_forwards_payload() {
        let payment = json!({ "token": { "transactionIdentifier": "T1" } });
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/processApplePayResponse"))
            .and(body_json(payment.clone()))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let bridge = HttpBackendBridge::new(server.uri());
        bridge.submit_payment(&payment).await.unwrap();
    }

    #[tokio::test]
    async fn test_submit_payment_requires_exactly_200() {
        for status in [201, 204, 400, 500] {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/processApplePayResponse"))
                .respond_with(ResponseTemplate::new(status))
                .mount(&server)
                .await;

            let bridge = HttpBackendBridge::new(server.uri());
            let err = bridge.submit_payment(&json!({})).await.unwrap_err();
            assert_eq!(err.rejection().map(|(s, _)| s), Some(status), "status {status}");
        }
    }
}
