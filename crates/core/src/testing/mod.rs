//! Testing utilities and in-memory collaborators.
//!
//! Every external service the engine talks to has a mock here, so the whole
//! synchronization flow can be exercised without a media server, a keyword
//! provider or secondary catalogs.
//!
//! # Example
//!
//! ```rust,ignore
//! use labelarr_core::testing::{fixtures, MockKeywordProvider, MockMediaServer};
//!
//! let server = MockMediaServer::new();
//! server.add_library(fixtures::library("1", "Movies", "movie")).await;
//! server.add_item("1", fixtures::movie("10", "The Matrix", 1999)).await;
//!
//! let provider = MockKeywordProvider::new();
//! provider.set_keywords("603", MediaKind::Movie, &["sci-fi"]).await;
//! ```

mod mock_media_server;
mod mock_provider;
mod mock_secondary;

pub use mock_media_server::{MockMediaServer, RecordedTagRemoval, RecordedTagUpdate};
pub use mock_provider::MockKeywordProvider;
pub use mock_secondary::MockSecondaryCatalog;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::media::{CatalogItem, ExternalId, FileInfo, ItemMetadata, Library, MediaKind};
    use crate::secondary::SecondaryEntry;

    pub fn library(key: &str, title: &str, section_type: &str) -> Library {
        Library {
            key: key.to_string(),
            title: title.to_string(),
            section_type: section_type.to_string(),
        }
    }

    /// A movie with one file and no cross-references.
    pub fn movie(key: &str, title: &str, year: i32) -> CatalogItem {
        CatalogItem::new(
            MediaKind::Movie,
            ItemMetadata {
                key: key.to_string(),
                title: title.to_string(),
                year: Some(year),
                files: vec![FileInfo::new(
                    format!("/movies/{} ({})/{}.mkv", title, year, title),
                    1024 * 1024 * 1024 * 4, // 4 GB
                )],
                ..Default::default()
            },
        )
    }

    /// A series without files of its own.
    pub fn show(key: &str, title: &str, year: i32) -> CatalogItem {
        CatalogItem::new(
            MediaKind::Show,
            ItemMetadata {
                key: key.to_string(),
                title: title.to_string(),
                year: Some(year),
                ..Default::default()
            },
        )
    }

    /// Attach a `tmdb://` cross-reference.
    pub fn with_tmdb(mut item: CatalogItem, tmdb_id: &str) -> CatalogItem {
        item.metadata_mut()
            .external_ids
            .push(ExternalId::new("tmdb", tmdb_id));
        item
    }

    pub fn with_labels(mut item: CatalogItem, labels: &[&str]) -> CatalogItem {
        item.metadata_mut().labels = labels.iter().map(|l| l.to_string()).collect();
        item
    }

    pub fn with_genres(mut item: CatalogItem, genres: &[&str]) -> CatalogItem {
        item.metadata_mut().genres = genres.iter().map(|g| g.to_string()).collect();
        item
    }

    /// A secondary catalog entry carrying a TMDb id.
    pub fn secondary_entry(title: &str, year: i32, tmdb_id: u64) -> SecondaryEntry {
        SecondaryEntry {
            title: title.to_string(),
            year: Some(year),
            tmdb_id: Some(tmdb_id),
            path: Some(format!("/media/{} ({})", title, year)),
            ..Default::default()
        }
    }

    /// Episode files for a series, one per episode of season 1.
    pub fn episode_files(show_title: &str, episodes: u32) -> Vec<FileInfo> {
        (1..=episodes)
            .map(|e| {
                FileInfo::new(
                    format!("/tv/{}/Season 01/{} - S01E{:02}.mkv", show_title, show_title, e),
                    1024 * 1024 * 700, // 700 MB
                )
            })
            .collect()
    }
}
