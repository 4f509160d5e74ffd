//! Media server (catalog) access.
//!
//! The catalog is the source of truth for items, their cross-references,
//! files and current tags. Everything is re-read on each pass.

mod plex;

pub use plex::PlexClient;

use async_trait::async_trait;
use thiserror::Error;

use crate::media::{CatalogItem, FileInfo, Library, MediaKind, TagField};
use crate::retry::Retryable;

/// Errors from media server operations.
#[derive(Debug, Error)]
pub enum MediaServerError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Media server rejected the token")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transient media server error {status}: {message}")]
    Transient { status: u16, message: String },

    #[error("Media server error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

impl Retryable for MediaServerError {
    fn is_retryable(&self) -> bool {
        match self {
            MediaServerError::HttpError(e) => !e.is_decode() && !e.is_builder(),
            MediaServerError::Transient { .. } => true,
            _ => false,
        }
    }
}

/// Catalog operations used by the sync engine.
#[async_trait]
pub trait MediaServer: Send + Sync {
    /// All library sections.
    async fn libraries(&self) -> Result<Vec<Library>, MediaServerError>;

    /// Items of a library, in the order the server returns them.
    async fn library_items(
        &self,
        library_key: &str,
        kind: MediaKind,
    ) -> Result<Vec<CatalogItem>, MediaServerError>;

    /// Full detail of one item: tags, cross-references and file parts.
    async fn item_details(
        &self,
        item_key: &str,
        kind: MediaKind,
    ) -> Result<CatalogItem, MediaServerError>;

    /// Files of a series' episodes. `limit` bounds how many episodes are read.
    async fn episode_files(
        &self,
        show_key: &str,
        limit: Option<usize>,
    ) -> Result<Vec<FileInfo>, MediaServerError>;

    /// Replace the field's values with `tags` and lock the field.
    async fn update_tags(
        &self,
        library_key: &str,
        item: &CatalogItem,
        field: TagField,
        tags: &[String],
    ) -> Result<(), MediaServerError>;

    /// Remove specific values from the field and set its lock state.
    async fn remove_tags(
        &self,
        library_key: &str,
        item: &CatalogItem,
        field: TagField,
        tags: &[String],
        lock: bool,
    ) -> Result<(), MediaServerError>;
}
