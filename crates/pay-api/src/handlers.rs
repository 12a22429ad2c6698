//! # Request Handlers
//!
//! Axum request handlers for the Apple Pay merchant backend.

use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use pay_applepay::PaymentResponse;
use pay_core::{PaymentError, PaymentRequest};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use uuid::Uuid;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Merchant session request sent by the payment page
#[derive(Debug, Deserialize)]
pub struct MerchantSessionRequest {
    /// Validation URL supplied by the payment sheet
    #[serde(alias = "URL")]
    pub url: String,
}

/// Acknowledgement of a received payment
#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentReceipt {
    /// Our receipt ID
    pub receipt_id: Uuid,
    /// Apple Pay transaction identifier
    pub transaction_id: String,
    /// Card network
    pub network: String,
    /// Token encryption version
    pub token_version: String,
    /// Whether the token signature was checked against the Apple root
    pub signature_verified: bool,
    /// When the token was received
    pub received_at: DateTime<Utc>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn payment_error_to_response(err: PaymentError) -> ApiError {
    let code = err.status_code();
    let response = ErrorResponse::new(err.to_string(), code);
    (StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR), Json(response))
}

fn bad_request(message: &str, err: serde_json::Error) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new(message, 400).with_details(err.to_string())),
    )
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "applepay-demo",
        "merchant_id": state.merchant.merchant_id(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Payment request the demo page starts its session with
pub async fn payment_request(State(state): State<AppState>) -> Json<PaymentRequest> {
    Json(state.storefront.payment_request())
}

/// Obtain a merchant session for the payment sheet.
///
/// The gateway's body is returned verbatim.
#[instrument(skip(state, body))]
pub async fn get_apple_pay_session(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: MerchantSessionRequest = serde_json::from_slice(&body).map_err(|e| {
        error!("Malformed merchant session request: {}", e);
        bad_request("Malformed merchant session request", e)
    })?;

    let payload = state
        .merchant
        .request_session(&request.url)
        .await
        .map_err(|e| {
            error!("Merchant session failed: {}", e);
            payment_error_to_response(e)
        })?;

    info!("Merchant session issued for {}", state.merchant.merchant_id());

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        payload,
    )
        .into_response())
}

/// Receive an authorized payment from the payment sheet
#[instrument(skip(state, body))]
pub async fn process_apple_pay_response(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PaymentReceipt>, ApiError> {
    let received_at = Utc::now();
    let response: PaymentResponse = serde_json::from_slice(&body).map_err(|e| {
        error!("Malformed payment response: {}", e);
        bad_request("Malformed payment response", e)
    })?;

    let token = &response.token;
    let version = token.validate().map_err(|e| {
        error!("Rejected payment token: {}", e);
        payment_error_to_response(e)
    })?;

    let key_hash = match &state.verifier {
        Some(verifier) => Some(token.public_key_hash_hex(verifier, received_at).map_err(|e| {
            error!("Rejected payment token signature: {}", e);
            payment_error_to_response(e)
        })?),
        None => None,
    };

    let receipt = PaymentReceipt {
        receipt_id: Uuid::new_v4(),
        transaction_id: token.transaction_identifier.clone(),
        network: token.payment_method.network.clone(),
        token_version: version.to_string(),
        signature_verified: key_hash.is_some(),
        received_at,
    };

    info!(
        "Token received: receipt={}, transaction={}, network={}, version={}, key_hash={}",
        receipt.receipt_id,
        receipt.transaction_id,
        receipt.network,
        receipt.token_version,
        key_hash.as_deref().unwrap_or("unverified")
    );

    Ok(Json(receipt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response() {
        let err = ErrorResponse::new("Test error", 400).with_details("line 1");
        assert_eq!(err.error, "Test error");
        assert_eq!(err.code, 400);
        assert_eq!(err.details.as_deref(), Some("line 1"));
    }

    #[test]
    fn test_payment_error_conversion() {
        let (status, _json) = payment_error_to_response(PaymentError::InvalidToken("bad".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _json) = payment_error_to_response(PaymentError::Gateway {
            status: 403,
            message: "denied".into(),
        });
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_session_request_accepts_upper_case_key() {
        let request: MerchantSessionRequest =
            serde_json::from_str(r#"{"URL":"https://apple-pay-gateway.apple.com/x"}"#).unwrap();
        assert_eq!(request.url, "https://apple-pay-gateway.apple.com/x");
    }
}
