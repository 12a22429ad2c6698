//! # pay-core
//!
//! Core types and traits for the Apple Pay merchant demo.
//!
//! This crate provides:
//! - `PaymentRequest` and friends, the descriptor shown on the payment sheet
//! - `ShippingQuote` for recalculating totals on shipping changes
//! - `HostSession` / `PaymentPlatform` traits over the platform payment sheet
//! - `BackendBridge` and `MerchantSessionProvider` traits for the two HTTP seams
//! - `SessionOrchestrator`, which wires host events to the bridge
//! - `PaymentError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use pay_core::{HostEvent, SessionOrchestrator, Storefront};
//!
//! let orchestrator = SessionOrchestrator::prepare(&platform, bridge, &Storefront::default())?;
//! // attach the host's event hooks, then
//! orchestrator.start()?;
//!
//! // inside the validation hook
//! orchestrator.handle(HostEvent::ValidateMerchant { validation_url }).await?;
//! ```

pub mod availability;
pub mod error;
pub mod orchestrator;
pub mod price;
pub mod request;
pub mod session;
pub mod shipping;
pub mod storefront;
pub mod strategy;

// Re-exports for convenience
pub use availability::{reveal_payment_buttons, ButtonElement, BUTTON_CLASS, VISIBLE_CLASS};
pub use error::{PaymentError, PaymentResult};
pub use orchestrator::SessionOrchestrator;
pub use price::{Currency, Price};
pub use request::{
    ContactField, LineItem, MerchantCapability, PaymentNetwork, PaymentRequest, ShippingMethod,
};
pub use session::{
    CompletionStatus, HostEvent, HostEventKind, HostSession, PaymentPlatform, SessionStage,
    SESSION_API_VERSION,
};
pub use shipping::{ShippingQuote, EXPRESS_SHIPPING, FREE_SHIPPING};
pub use storefront::{ShippingOption, Storefront};
pub use strategy::{
    BackendBridge, BackendEndpoints, BoxedMerchantSessionProvider, MerchantSessionProvider,
    MERCHANT_SESSION_PATH, PROCESS_PAYMENT_PATH,
};
