//! # pay-api
//!
//! HTTP merchant backend for the Apple Pay demo.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - The two endpoints the payment page calls during a session
//! - Static hosting of the demo page and domain association file
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/getApplePaySession` | Merchant session for a validation URL |
//! | POST | `/processApplePayResponse` | Authorized payment |
//! | GET | `/api/v1/payment-request` | Storefront payment request |

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
