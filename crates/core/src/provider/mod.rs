//! Remote keyword source.

mod tmdb;

pub use tmdb::TmdbClient;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::media::MediaKind;
use crate::retry::Retryable;

/// Errors from the keyword provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Provider rejected the credentials")]
    Unauthorized,

    #[error("Rate limit exceeded")]
    RateLimited { retry_after: Duration },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transient provider error {status}: {message}")]
    Transient { status: u16, message: String },

    #[error("Provider error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

impl Retryable for ProviderError {
    fn is_retryable(&self) -> bool {
        match self {
            ProviderError::HttpError(e) => !e.is_decode() && !e.is_builder(),
            ProviderError::RateLimited { .. } | ProviderError::Transient { .. } => true,
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            ProviderError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}

/// Supplies raw keyword names for a TMDb id.
#[async_trait]
pub trait KeywordProvider: Send + Sync {
    /// Keywords for a movie or series, in provider order.
    async fn keywords(&self, tmdb_id: &str, kind: MediaKind) -> Result<Vec<String>, ProviderError>;
}
