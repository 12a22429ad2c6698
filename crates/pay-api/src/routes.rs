//! # Routes
//!
//! Axum router configuration for the merchant backend.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use pay_core::{MERCHANT_SESSION_PATH, PROCESS_PAYMENT_PATH};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - POST /getApplePaySession - merchant validation
/// - POST /processApplePayResponse - authorized payment
/// - GET  /api/v1/payment-request - storefront payment request
/// - GET  /health - health check
///
/// - Static files:
///   - GET / - demo page
///   - GET /public/* - page assets
///   - GET /.well-known/* - domain association file
pub fn create_router(state: AppState) -> Router {
    let static_dir = state.config.static_dir.clone();

    // Same-origin by default; the demo page may be hosted elsewhere in development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new().route("/payment-request", get(handlers::payment_request));

    Router::new()
        .route("/health", get(handlers::health))
        // Payment sheet endpoints
        .route(MERCHANT_SESSION_PATH, post(handlers::get_apple_pay_session))
        .route(PROCESS_PAYMENT_PATH, post(handlers::process_apple_pay_response))
        // API v1
        .nest("/api/v1", api_routes)
        // Static files
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/public", ServeDir::new(&static_dir))
        .nest_service("/.well-known", ServeDir::new(static_dir.join(".well-known")))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // State
        .with_state(state)
}
