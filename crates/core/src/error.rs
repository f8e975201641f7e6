//! Error types for the DiabeCare domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error type.

use thiserror::Error;

/// A failed call to the completion provider.
///
/// Variants other than `ApiError`, `Timeout`, `Network` and `InvalidResponse`
/// carry a structured signal (HTTP status or provider error code) and are
/// classified without looking at the message text.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider: {message}")]
    RateLimited {
        retry_after_secs: Option<u64>,
        message: String,
    },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not available: {0}")]
    ModelNotFound(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// The text the provider (or transport) reported, without our prefixes.
    pub fn raw_message(&self) -> &str {
        match self {
            Self::ApiError { message, .. } | Self::RateLimited { message, .. } => message,
            Self::AuthenticationFailed(m)
            | Self::ModelNotFound(m)
            | Self::Timeout(m)
            | Self::Network(m)
            | Self::InvalidResponse(m) => m,
        }
    }
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Failed to encode history: {0}")]
    Encode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = ProviderError::ApiError {
            status_code: 500,
            message: "upstream exploded".into(),
        };
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("upstream exploded"));

        let err = ProviderError::RateLimited {
            retry_after_secs: Some(2),
            message: "slow down".into(),
        };
        assert_eq!(err.to_string(), "Rate limited by provider: slow down");
    }

    #[test]
    fn raw_message_strips_prefixes() {
        let err = ProviderError::ApiError {
            status_code: 400,
            message: "bad input".into(),
        };
        assert_eq!(err.raw_message(), "bad input");
        assert!(err.to_string().starts_with("API request failed"));

        let err = ProviderError::Timeout("request timed out after 30s".into());
        assert_eq!(err.raw_message(), "request timed out after 30s");
    }

    #[test]
    fn memory_error_displays_reason() {
        let err = MemoryError::Storage("disk full".into());
        assert_eq!(err.to_string(), "Storage error: disk full");
        let err = MemoryError::Encode("bad utf-8".into());
        assert!(err.to_string().contains("bad utf-8"));
    }
}
