//! Radarr v3 client.

use async_trait::async_trait;
use serde::Deserialize;

use super::api::{known_id, non_empty, AlternateTitle, ArrApi};
use super::{SecondaryCatalog, SecondaryCatalogError, SecondaryEntry, SystemStatus};
use crate::config::ServiceConfig;

/// Radarr API client.
pub struct RadarrClient {
    api: ArrApi,
}

impl RadarrClient {
    pub fn new(config: &ServiceConfig) -> Result<Self, SecondaryCatalogError> {
        Ok(Self {
            api: ArrApi::new("Radarr", config)?,
        })
    }
}

#[async_trait]
impl SecondaryCatalog for RadarrClient {
    fn name(&self) -> &str {
        self.api.service()
    }

    async fn entries(&self) -> Result<Vec<SecondaryEntry>, SecondaryCatalogError> {
        let movies: Vec<RadarrMovie> = self.api.get("movie").await?;
        Ok(movies.into_iter().map(Into::into).collect())
    }

    async fn system_status(&self) -> Result<SystemStatus, SecondaryCatalogError> {
        self.api.system_status().await
    }
}

// ============================================================================
// Radarr API response types (internal)
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RadarrMovie {
    title: String,
    #[serde(default)]
    original_title: Option<String>,
    #[serde(default)]
    alternate_titles: Vec<AlternateTitle>,
    #[serde(default)]
    year: Option<i32>,
    #[serde(default)]
    tmdb_id: Option<u64>,
    #[serde(default)]
    imdb_id: Option<String>,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    movie_file: Option<RadarrMovieFile>,
}

#[derive(Debug, Deserialize)]
struct RadarrMovieFile {
    #[serde(default)]
    path: Option<String>,
}

impl From<RadarrMovie> for SecondaryEntry {
    fn from(m: RadarrMovie) -> Self {
        SecondaryEntry {
            title: m.title,
            original_title: non_empty(m.original_title),
            alternate_titles: m.alternate_titles.into_iter().map(|t| t.title).collect(),
            year: m.year.filter(|y| *y > 0),
            tmdb_id: known_id(m.tmdb_id),
            imdb_id: non_empty(m.imdb_id),
            tvdb_id: None,
            path: non_empty(m.path),
            file_path: m.movie_file.and_then(|f| non_empty(f.path)),
        }
    }
}
