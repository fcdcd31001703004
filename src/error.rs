//! Error types for the coin dashboard

use thiserror::Error;

/// Errors that can occur when fetching data from a market data provider
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network request failed
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Invalid response from provider
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Provider API error
    #[error("Provider API error: {0}")]
    ApiError(String),

    /// Timeout waiting for response
    #[error("Request timeout")]
    Timeout,
}

impl ProviderError {
    /// Creates an InvalidResponse error
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Creates an ApiError error
    pub fn api(msg: impl Into<String>) -> Self {
        Self::ApiError(msg.into())
    }

    /// Whether retrying the same request could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::NetworkError(_)
            | ProviderError::RateLimitExceeded
            | ProviderError::Timeout => true,
            ProviderError::ApiError(_) => true,
            ProviderError::InvalidResponse(_) => false,
        }
    }
}

/// Errors raised by the key-value storage backing the favorites set
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The value could not be encoded
    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
