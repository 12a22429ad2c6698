//! # Backend Traits
//!
//! The two seams between the payment sheet and the merchant backend.
//!
//! ```text
//!  browser                          merchant server                Apple
//! ┌──────────────────┐  POST json  ┌──────────────────────────┐   ┌─────────┐
//! │ BackendBridge    │ ──────────► │ MerchantSessionProvider  │ ─►│ gateway │
//! │ ├── fetch_merchant_session()   │ └── request_session()    │   └─────────┘
//! │ └── submit_payment()           └──────────────────────────┘
//! └──────────────────┘
//! ```

use crate::error::PaymentResult;
use async_trait::async_trait;
use std::sync::Arc;

/// Path of the merchant validation endpoint
pub const MERCHANT_SESSION_PATH: &str = "/getApplePaySession";

/// Path of the payment submission endpoint
pub const PROCESS_PAYMENT_PATH: &str = "/processApplePayResponse";

/// Client side of the merchant backend.
///
/// Not `Send`: the orchestrator runs on a single-threaded event loop, and in
/// the browser the underlying requests are not `Send` either.
#[async_trait(?Send)]
pub trait BackendBridge {
    /// Exchange a validation URL for an opaque merchant session.
    ///
    /// Resolves with the parsed body for any status in `[200, 300)`; rejects
    /// with `HttpStatus` otherwise and with `Network` when no response arrived.
    async fn fetch_merchant_session(&self, validation_url: &str)
        -> PaymentResult<serde_json::Value>;

    /// Forward the authorized payment payload.
    ///
    /// `Ok` only when the backend answered exactly 200.
    async fn submit_payment(&self, payment: &serde_json::Value) -> PaymentResult<()>;
}

/// Server side: obtains merchant sessions from the Apple Pay gateway
#[async_trait]
pub trait MerchantSessionProvider: Send + Sync {
    /// Request a merchant session for the validation URL the sheet supplied.
    ///
    /// Returns the gateway body verbatim.
    async fn request_session(&self, validation_url: &str) -> PaymentResult<Vec<u8>>;

    /// Merchant identifier (for logging)
    fn merchant_id(&self) -> &str;
}

/// Type alias for a shared session provider (dynamic dispatch)
pub type BoxedMerchantSessionProvider = Arc<dyn MerchantSessionProvider>;

/// Where the bridge finds the merchant backend
#[derive(Debug, Clone)]
pub struct BackendEndpoints {
    /// Base URL of the merchant backend (empty for same-origin)
    pub base_url: String,
    pub session_path: String,
    pub payment_path: String,
}

impl BackendEndpoints {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session_path: MERCHANT_SESSION_PATH.to_string(),
            payment_path: PROCESS_PAYMENT_PATH.to_string(),
        }
    }

    pub fn session_url(&self) -> String {
        format!("{}{}", self.base_url, self.session_path)
    }

    pub fn payment_url(&self) -> String {
        format!("{}{}", self.base_url, self.payment_path)
    }
}
