//! # Host Payment Session
//!
//! The platform-provided payment sheet is an external capability. It is
//! modeled as the [`HostSession`] trait so the orchestrator can drive a real
//! browser session or a fake one in tests.
//!
//! ```text
//! Idle → Started → ValidatingMerchant → Ready → ShippingSelected*
//!      → Authorized → Completed(success | failure)
//! ```

use crate::error::PaymentResult;
use crate::request::{LineItem, PaymentRequest};
use serde::{Deserialize, Serialize};

/// Payment sheet API version the sessions are created with
pub const SESSION_API_VERSION: u32 = 1;

/// Status passed to the session's completion methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    Success,
    Failure,
}

impl CompletionStatus {
    /// Numeric code used by the host (`STATUS_SUCCESS` / `STATUS_FAILURE`)
    pub fn code(&self) -> u16 {
        match self {
            CompletionStatus::Success => 0,
            CompletionStatus::Failure => 1,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CompletionStatus::Success)
    }
}

/// Lifecycle stage of a host session, as last observed by the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStage {
    Idle,
    Started,
    ValidatingMerchant,
    Ready,
    ShippingSelected,
    Authorized,
    /// Merchant validation failed and the session was aborted
    Aborted,
    Completed(CompletionStatus),
}

impl SessionStage {
    /// No further completion may be sent once a session is here
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStage::Aborted | SessionStage::Completed(_))
    }

    /// Position in the lifecycle; stages only ever move forward
    pub(crate) fn order(&self) -> u8 {
        match self {
            SessionStage::Idle => 0,
            SessionStage::Started => 1,
            SessionStage::ValidatingMerchant => 2,
            SessionStage::Ready => 3,
            SessionStage::ShippingSelected => 4,
            SessionStage::Authorized => 5,
            SessionStage::Aborted | SessionStage::Completed(_) => 6,
        }
    }
}

impl Default for SessionStage {
    fn default() -> Self {
        SessionStage::Idle
    }
}

/// Events raised by the host session
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// The sheet needs a merchant session from this URL
    ValidateMerchant { validation_url: String },
    /// The user picked another shipping method
    ShippingMethodSelected { identifier: String },
    /// The user authorized the payment; the payload is opaque
    PaymentAuthorized { payment: serde_json::Value },
}

/// Which host event a payload belongs to, known even when it cannot be parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEventKind {
    ValidateMerchant,
    ShippingMethodSelected,
    PaymentAuthorized,
}

impl HostEvent {
    pub fn kind(&self) -> HostEventKind {
        match self {
            HostEvent::ValidateMerchant { .. } => HostEventKind::ValidateMerchant,
            HostEvent::ShippingMethodSelected { .. } => HostEventKind::ShippingMethodSelected,
            HostEvent::PaymentAuthorized { .. } => HostEventKind::PaymentAuthorized,
        }
    }
}

/// Completion surface of a host payment session.
///
/// Methods take `&self`: host sessions are handles to platform objects with
/// their own interior state.
pub trait HostSession {
    /// Show the payment sheet
    fn begin(&self) -> PaymentResult<()>;

    /// Hand the merchant session back to the sheet
    fn complete_merchant_validation(&self, merchant_session: &serde_json::Value)
        -> PaymentResult<()>;

    /// Report new totals after a shipping method change
    fn complete_shipping_method_selection(
        &self,
        status: CompletionStatus,
        total: &LineItem,
        line_items: &[LineItem],
    ) -> PaymentResult<()>;

    /// Terminal status of the payment
    fn complete_payment(&self, status: CompletionStatus) -> PaymentResult<()>;

    /// Dismiss the sheet
    fn abort(&self) -> PaymentResult<()>;
}

/// The host platform: capability flag plus session construction
pub trait PaymentPlatform {
    type Session: HostSession;

    /// Whether the platform can present the payment sheet at all
    fn can_make_payments(&self) -> bool;

    /// Construct a new session for `request`
    fn create_session(&self, version: u32, request: &PaymentRequest)
        -> PaymentResult<Self::Session>;
}
