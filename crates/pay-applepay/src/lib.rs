//! # pay-applepay
//!
//! Merchant side of Apple Pay for the demo store.
//!
//! - **AppleSessionClient** - requests merchant sessions from the Apple Pay
//!   gateway with the merchant identity certificate
//! - **MerchantConfig** - merchant identifier, display/domain names, identity
//! - **PaymentResponse / PaymentToken** - the authorized payment object and
//!   its structural validation
//! - **TokenVerifier** - token signature checks against the Apple root
//!   certificate, with the signing time inside the transaction window
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pay_applepay::AppleSessionClient;
//! use pay_core::MerchantSessionProvider;
//!
//! // APPLEPAY_MERCHANT_ID, APPLEPAY_DISPLAY_NAME, APPLEPAY_DOMAIN_NAME,
//! // APPLEPAY_MERCHANT_CERT, APPLEPAY_MERCHANT_KEY
//! let client = AppleSessionClient::from_env()?;
//!
//! // validation URL supplied by the payment sheet
//! let merchant_session = client.request_session(&validation_url).await?;
//! ```

mod ber;
pub mod certificate;
pub mod config;
pub mod gateway;
pub mod signature;
pub mod token;

// Re-exports
pub use certificate::{check_merchant_certificate, merchant_id_hash};
pub use config::{MerchantConfig, DEFAULT_ROOT_CERTIFICATE, MERCHANT_ID_PREFIX};
pub use gateway::{check_session_url, AppleSessionClient};
pub use signature::TokenVerifier;
pub use token::{Contact, Header, PaymentData, PaymentMethod, PaymentResponse, PaymentToken, TokenVersion};
