//! TMDB (The Movie Database) keyword client.
//!
//! Authenticates with a v4 read access token. TMDB throttles bursts with 429
//! responses; those are retried after the advertised wait.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{KeywordProvider, ProviderError};
use crate::config::TmdbConfig;
use crate::media::MediaKind;
use crate::retry::RetryPolicy;

const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

/// Fallback wait after a 429 without a usable Retry-After header.
const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(1);

/// Well-known movie id (The Godfather) used to check credentials.
const PROBE_MOVIE_ID: &str = "238";

/// TMDB API client.
pub struct TmdbClient {
    client: Client,
    base_url: String,
    token: String,
    retry: RetryPolicy,
}

impl TmdbClient {
    /// Create a new TMDB client.
    pub fn new(config: &TmdbConfig) -> Result<Self, ProviderError> {
        if config.read_access_token.is_empty() {
            return Err(ProviderError::NotConfigured(
                "TMDB read access token is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            base_url,
            token: config.read_access_token.clone(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Check that the token is accepted.
    pub async fn verify(&self) -> Result<(), ProviderError> {
        self.fetch_keywords(PROBE_MOVIE_ID, MediaKind::Movie)
            .await
            .map(|_| ())
    }

    async fn fetch_keywords(
        &self,
        tmdb_id: &str,
        kind: MediaKind,
    ) -> Result<Vec<String>, ProviderError> {
        let segment = match kind {
            MediaKind::Movie => "movie",
            MediaKind::Show => "tv",
        };
        let url = format!(
            "{}/{}/{}/keywords",
            self.base_url,
            segment,
            urlencoding::encode(tmdb_id)
        );
        let url = url.as_str();

        debug!("TMDB get keywords: kind={}, id={}", kind, tmdb_id);

        let label = format!("TMDB keywords {} {}", segment, tmdb_id);
        self.retry
            .run(&label, move || async move {
                let response = self
                    .client
                    .get(url)
                    .bearer_auth(&self.token)
                    .header(reqwest::header::ACCEPT, "application/json")
                    .send()
                    .await?;

                let status = response.status();
                if status == 401 {
                    return Err(ProviderError::Unauthorized);
                }
                if status == 404 {
                    return Err(ProviderError::NotFound(format!("{} {}", segment, tmdb_id)));
                }
                if status == 429 {
                    let retry_after = response
                        .headers()
                        .get(RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.trim().parse::<u64>().ok())
                        .map(Duration::from_secs)
                        .unwrap_or(RATE_LIMIT_BACKOFF);
                    return Err(ProviderError::RateLimited { retry_after });
                }
                if !status.is_success() {
                    let message = response.text().await.unwrap_or_default();
                    let status = status.as_u16();
                    return Err(if self.retry.is_retryable_status(status) {
                        ProviderError::Transient { status, message }
                    } else {
                        ProviderError::ApiError { status, message }
                    });
                }

                let body: KeywordsResponse = response.json().await.map_err(|e| {
                    ProviderError::ParseError(format!("Failed to parse keywords response: {}", e))
                })?;

                Ok(body.into_names())
            })
            .await
    }
}

#[async_trait]
impl KeywordProvider for TmdbClient {
    async fn keywords(&self, tmdb_id: &str, kind: MediaKind) -> Result<Vec<String>, ProviderError> {
        self.fetch_keywords(tmdb_id, kind).await
    }
}

// ============================================================================
// TMDB API response types (internal)
// ============================================================================

/// Movies list keywords under `keywords`, series under `results`.
#[derive(Debug, Deserialize)]
struct KeywordsResponse {
    #[serde(default)]
    keywords: Vec<TmdbKeyword>,
    #[serde(default)]
    results: Vec<TmdbKeyword>,
}

impl KeywordsResponse {
    fn into_names(self) -> Vec<String> {
        self.keywords
            .into_iter()
            .chain(self.results)
            .map(|k| k.name)
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct TmdbKeyword {
    name: String,
}
