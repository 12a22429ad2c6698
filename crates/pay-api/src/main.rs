//! # Apple Pay Demo
//!
//! Merchant backend for the Apple Pay demo page.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export APPLEPAY_MERCHANT_ID=merchant.com.example.store
//! export APPLEPAY_DISPLAY_NAME="Example Store"
//! export APPLEPAY_DOMAIN_NAME=shop.example.com
//! export APPLEPAY_MERCHANT_CERT=certs/cert-merchant.crt
//! export APPLEPAY_MERCHANT_KEY=certs/cert-merchant-key.pem
//!
//! # Run the server
//! applepay-demo
//! ```

use pay_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    print_banner();

    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Merchant: {}", state.merchant.merchant_id());
    info!(
        "Storefront: {} {}",
        state.storefront.total_label,
        state.storefront.subtotal()
    );

    let app = routes::create_router(state);

    info!("Apple Pay demo starting on http://{}", addr);

    if !is_prod {
        info!("Demo page: http://{}/", addr);
        info!("Merchant validation: POST http://{}/getApplePaySession", addr);
        info!("Payments: POST http://{}/processApplePayResponse", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
  Apple Pay Demo
  ━━━━━━━━━━━━━━━━━━━━━━━
  Merchant backend
  Version: {}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
