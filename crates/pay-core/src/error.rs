//! # Payment Error Types
//!
//! Typed error handling for the Apple Pay demo.
//! All payment operations return `Result<T, PaymentError>`.

use thiserror::Error;

/// Core error type for all payment operations
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Configuration errors (missing merchant id, unreadable certificate)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Transport failure, no HTTP response was received
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status
    #[error("HTTP {status}: {status_text}")]
    HttpStatus { status: u16, status_text: String },

    /// Failure signaled by the host payment session
    #[error("Host session error: {0}")]
    HostSession(String),

    /// Validation URL does not point at an Apple Pay gateway
    #[error("Invalid session URL: {0}")]
    InvalidSessionUrl(String),

    /// Apple Pay gateway refused or failed the merchant session request
    #[error("Gateway error: HTTP {status}: {message}")]
    Gateway { status: u16, message: String },

    /// Payment token is structurally invalid
    #[error("Invalid payment token: {0}")]
    InvalidToken(String),

    /// Token signature, certificate chain or signing time rejected
    #[error("Invalid token signature: {0}")]
    InvalidSignature(String),

    /// Payment token encryption version is not supported
    #[error("Unsupported token version: {version}")]
    UnsupportedTokenVersion { version: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PaymentError {
    /// Build an `HttpStatus` error from a raw status code and reason phrase
    pub fn http_status(status: u16, status_text: impl Into<String>) -> Self {
        PaymentError::HttpStatus {
            status,
            status_text: status_text.into(),
        }
    }

    /// The `{status, statusText}` pair a bridge rejection carries.
    ///
    /// Transport failures have no HTTP response, so they report status `0`.
    pub fn rejection(&self) -> Option<(u16, String)> {
        match self {
            PaymentError::HttpStatus {
                status,
                status_text,
            } => Some((*status, status_text.clone())),
            PaymentError::Network(message) => Some((0, message.clone())),
            _ => None,
        }
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            PaymentError::Configuration(_) => 500,
            PaymentError::InvalidRequest(_) => 400,
            PaymentError::Network(_) => 503,
            PaymentError::HttpStatus { .. } => 502,
            PaymentError::HostSession(_) => 500,
            PaymentError::InvalidSessionUrl(_) => 400,
            PaymentError::Gateway { .. } => 502,
            PaymentError::InvalidToken(_) => 400,
            PaymentError::InvalidSignature(_) => 400,
            PaymentError::UnsupportedTokenVersion { .. } => 400,
            PaymentError::Serialization(_) => 500,
        }
    }
}

/// Result type alias for payment operations
pub type PaymentResult<T> = Result<T, PaymentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_shape() {
        let err = PaymentError::http_status(500, "Internal Server Error");
        assert_eq!(
            err.rejection(),
            Some((500, "Internal Server Error".to_string()))
        );

        let err = PaymentError::Network("connection refused".into());
        assert_eq!(err.rejection().map(|(status, _)| status), Some(0));

        assert!(PaymentError::InvalidRequest("x".into()).rejection().is_none());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            PaymentError::InvalidRequest("test".into()).status_code(),
            400
        );
        assert_eq!(
            PaymentError::InvalidSessionUrl("http://evil.com".into()).status_code(),
            400
        );
        assert_eq!(
            PaymentError::Gateway {
                status: 403,
                message: "denied".into()
            }
            .status_code(),
            502
        );
        assert_eq!(
            PaymentError::UnsupportedTokenVersion {
                version: "EC_v2".into()
            }
            .status_code(),
            400
        );
        assert_eq!(
            PaymentError::InvalidSignature("replayed".into()).status_code(),
            400
        );
    }
}
