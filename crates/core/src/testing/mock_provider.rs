//! Mock keyword provider for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::media::MediaKind;
use crate::provider::{KeywordProvider, ProviderError};

/// Mock implementation of the KeywordProvider trait.
///
/// Unknown ids answer with `NotFound`, like the real provider does.
#[derive(Debug)]
pub struct MockKeywordProvider {
    keywords: Arc<RwLock<HashMap<(String, MediaKind), Vec<String>>>>,
    requests: Arc<RwLock<Vec<(String, MediaKind)>>>,
    /// Ids whose requests fail with a transient error.
    failing: Arc<RwLock<HashSet<String>>>,
    next_error: Arc<RwLock<Option<ProviderError>>>,
}

impl Default for MockKeywordProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockKeywordProvider {
    pub fn new() -> Self {
        Self {
            keywords: Arc::new(RwLock::new(HashMap::new())),
            requests: Arc::new(RwLock::new(Vec::new())),
            failing: Arc::new(RwLock::new(HashSet::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Set the raw keywords returned for an id.
    pub async fn set_keywords(&self, tmdb_id: &str, kind: MediaKind, keywords: &[&str]) {
        self.keywords.write().await.insert(
            (tmdb_id.to_string(), kind),
            keywords.iter().map(|k| k.to_string()).collect(),
        );
    }

    /// Make every request for an id fail.
    pub async fn fail_for(&self, tmdb_id: &str) {
        self.failing.write().await.insert(tmdb_id.to_string());
    }

    /// Configure the next request to fail with the given error.
    pub async fn set_next_error(&self, error: ProviderError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn requests(&self) -> Vec<(String, MediaKind)> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl KeywordProvider for MockKeywordProvider {
    async fn keywords(&self, tmdb_id: &str, kind: MediaKind) -> Result<Vec<String>, ProviderError> {
        self.requests
            .write()
            .await
            .push((tmdb_id.to_string(), kind));

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        if self.failing.read().await.contains(tmdb_id) {
            return Err(ProviderError::Transient {
                status: 503,
                message: "Service Unavailable".to_string(),
            });
        }

        self.keywords
            .read()
            .await
            .get(&(tmdb_id.to_string(), kind))
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(format!("{} {}", kind, tmdb_id)))
    }
}
