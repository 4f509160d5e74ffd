//! Secondary catalogs (Radarr for movies, Sonarr for series).
//!
//! These services keep their own title and file inventory with TMDb ids
//! attached, which makes them a good resolution aid when the media server has
//! no usable cross-reference.

mod api;
mod index;
mod radarr;
mod sonarr;

pub use index::SecondaryIndex;
pub use radarr::RadarrClient;
pub use sonarr::SonarrClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from secondary catalog services.
#[derive(Debug, Error)]
pub enum SecondaryCatalogError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("{0} rejected the API key")]
    Unauthorized(String),

    #[error("{service} error {status}: {message}")]
    ApiError {
        service: String,
        status: u16,
        message: String,
    },

    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

/// One movie or series known to a secondary catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryEntry {
    pub title: String,
    pub original_title: Option<String>,
    pub alternate_titles: Vec<String>,
    pub year: Option<i32>,
    pub tmdb_id: Option<u64>,
    pub imdb_id: Option<String>,
    pub tvdb_id: Option<u64>,
    /// Folder holding the entry's files.
    pub path: Option<String>,
    /// Main file, when the service tracks a single one (movies).
    pub file_path: Option<String>,
}

impl SecondaryEntry {
    /// All names the entry is known by.
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.title.as_str())
            .chain(self.original_title.as_deref())
            .chain(self.alternate_titles.iter().map(String::as_str))
    }
}

/// Service health as reported at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemStatus {
    pub app_name: String,
    pub version: String,
}

/// A secondary catalog service.
#[async_trait]
pub trait SecondaryCatalog: Send + Sync {
    /// Service name for logs ("Radarr", "Sonarr").
    fn name(&self) -> &str;

    /// Full entry inventory.
    async fn entries(&self) -> Result<Vec<SecondaryEntry>, SecondaryCatalogError>;

    /// Health and version, used to verify connectivity.
    async fn system_status(&self) -> Result<SystemStatus, SecondaryCatalogError>;
}
