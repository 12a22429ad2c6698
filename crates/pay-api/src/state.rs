//! # Application State
//!
//! Shared state for the Axum application.
//! Contains the merchant session provider, token verifier, storefront and
//! configuration.

use pay_applepay::{AppleSessionClient, TokenVerifier};
use pay_core::{BoxedMerchantSessionProvider, Storefront};
use std::path::PathBuf;
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Directory with the demo page and `.well-known` files
    pub static_dir: PathBuf,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            static_dir: std::env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("static")),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid socket address {}:{}: {}", self.host, self.port, e))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Merchant session provider (Apple Pay gateway)
    pub merchant: BoxedMerchantSessionProvider,
    /// Payment token signature checks; tokens are accepted unverified without it
    pub verifier: Option<Arc<TokenVerifier>>,
    /// What the demo store sells
    pub storefront: Arc<Storefront>,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create a new AppState with the Apple Pay gateway client from env
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();
        let storefront = load_storefront()?;

        let merchant = AppleSessionClient::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize Apple Pay merchant: {}", e))?;

        let verifier = match TokenVerifier::from_config(merchant.config()) {
            Ok(verifier) => Some(verifier),
            Err(e) if config.is_production() => {
                return Err(anyhow::anyhow!("Failed to load the Apple root certificate: {}", e));
            }
            Err(e) => {
                tracing::warn!("Payment token signatures will not be verified: {}", e);
                None
            }
        };

        let state = Self::with_provider(Arc::new(merchant), storefront, config);
        Ok(match verifier {
            Some(verifier) => state.with_verifier(verifier),
            None => state,
        })
    }

    /// Assemble state from parts
    pub fn with_provider(
        merchant: BoxedMerchantSessionProvider,
        storefront: Storefront,
        config: AppConfig,
    ) -> Self {
        Self {
            merchant,
            verifier: None,
            storefront: Arc::new(storefront),
            config,
        }
    }

    /// Builder: verify payment token signatures
    pub fn with_verifier(mut self, verifier: TokenVerifier) -> Self {
        self.verifier = Some(Arc::new(verifier));
        self
    }
}

/// Load storefront from config file
fn load_storefront() -> anyhow::Result<Storefront> {
    let config_paths = [
        "config/storefront.toml",
        "../config/storefront.toml",
        "../../config/storefront.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            let storefront: Storefront = toml::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
            tracing::info!(
                "Loaded storefront from {} ({} shipping options)",
                path,
                storefront.shipping_options.len()
            );
            return Ok(storefront);
        }
    }

    tracing::warn!("No storefront config found, using the built-in example");
    Ok(Storefront::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_defaults() {
        std::env::remove_var("HOST");
        std::env::remove_var("PORT");
        std::env::remove_var("STATIC_DIR");

        let config = AppConfig::from_env();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8000);
        assert_eq!(config.static_dir, PathBuf::from("static"));
    }

    #[test]
    fn test_socket_addr() {
        let config = AppConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            environment: "test".to_string(),
            static_dir: PathBuf::from("static"),
        };

        assert_eq!(config.socket_addr().unwrap().to_string(), "0.0.0.0:3000");
    }

    #[test]
    fn test_socket_addr_invalid_host() {
        let config = AppConfig {
            host: "not a host".to_string(),
            port: 3000,
            environment: "test".to_string(),
            static_dir: PathBuf::from("static"),
        };

        assert!(config.socket_addr().is_err());
    }
}
