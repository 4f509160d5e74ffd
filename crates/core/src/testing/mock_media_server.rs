//! Mock media server for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::media::{CatalogItem, FileInfo, Library, MediaKind, TagField};
use crate::media_server::{MediaServer, MediaServerError};

/// A recorded tag replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedTagUpdate {
    pub library_key: String,
    pub item_key: String,
    pub field: TagField,
    pub tags: Vec<String>,
}

/// A recorded tag removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedTagRemoval {
    pub library_key: String,
    pub item_key: String,
    pub field: TagField,
    pub tags: Vec<String>,
    pub lock: bool,
}

/// Mock implementation of the MediaServer trait.
///
/// Items added to a library are served both by the listing and by the detail
/// call. Tag writes are applied to the stored item, so a detail fetch after
/// an update sees the new state, the way the real server behaves.
#[derive(Debug)]
pub struct MockMediaServer {
    libraries: Arc<RwLock<Vec<Library>>>,
    /// library key -> item keys, in listing order.
    listings: Arc<RwLock<HashMap<String, Vec<String>>>>,
    /// item key -> current item state.
    items: Arc<RwLock<HashMap<String, CatalogItem>>>,
    episode_files: Arc<RwLock<HashMap<String, Vec<FileInfo>>>>,
    updates: Arc<RwLock<Vec<RecordedTagUpdate>>>,
    removals: Arc<RwLock<Vec<RecordedTagRemoval>>>,
    episode_requests: Arc<RwLock<Vec<(String, Option<usize>)>>>,
    detail_requests: Arc<RwLock<Vec<String>>>,
    /// Item keys whose tag writes are rejected.
    failing_writes: Arc<RwLock<HashSet<String>>>,
    /// Item keys whose detail fetch fails.
    failing_details: Arc<RwLock<HashSet<String>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<MediaServerError>>>,
}

impl Default for MockMediaServer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMediaServer {
    pub fn new() -> Self {
        Self {
            libraries: Arc::new(RwLock::new(Vec::new())),
            listings: Arc::new(RwLock::new(HashMap::new())),
            items: Arc::new(RwLock::new(HashMap::new())),
            episode_files: Arc::new(RwLock::new(HashMap::new())),
            updates: Arc::new(RwLock::new(Vec::new())),
            removals: Arc::new(RwLock::new(Vec::new())),
            episode_requests: Arc::new(RwLock::new(Vec::new())),
            detail_requests: Arc::new(RwLock::new(Vec::new())),
            failing_writes: Arc::new(RwLock::new(HashSet::new())),
            failing_details: Arc::new(RwLock::new(HashSet::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Register a library section.
    pub async fn add_library(&self, library: Library) {
        self.listings
            .write()
            .await
            .entry(library.key.clone())
            .or_default();
        self.libraries.write().await.push(library);
    }

    /// Append an item to a library listing.
    pub async fn add_item(&self, library_key: &str, item: CatalogItem) {
        self.listings
            .write()
            .await
            .entry(library_key.to_string())
            .or_default()
            .push(item.key().to_string());
        self.items
            .write()
            .await
            .insert(item.key().to_string(), item);
    }

    /// Current stored state of an item.
    pub async fn item(&self, key: &str) -> Option<CatalogItem> {
        self.items.read().await.get(key).cloned()
    }

    /// Set the episode files returned for a series.
    pub async fn set_episode_files(&self, show_key: &str, files: Vec<FileInfo>) {
        self.episode_files
            .write()
            .await
            .insert(show_key.to_string(), files);
    }

    /// Reject tag writes for an item.
    pub async fn fail_writes_for(&self, item_key: &str) {
        self.failing_writes
            .write()
            .await
            .insert(item_key.to_string());
    }

    /// Fail detail fetches for an item.
    pub async fn fail_details_for(&self, item_key: &str) {
        self.failing_details
            .write()
            .await
            .insert(item_key.to_string());
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: MediaServerError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn recorded_updates(&self) -> Vec<RecordedTagUpdate> {
        self.updates.read().await.clone()
    }

    pub async fn recorded_removals(&self) -> Vec<RecordedTagRemoval> {
        self.removals.read().await.clone()
    }

    /// Episode listing requests as (show key, limit).
    pub async fn episode_requests(&self) -> Vec<(String, Option<usize>)> {
        self.episode_requests.read().await.clone()
    }

    pub async fn detail_requests(&self) -> Vec<String> {
        self.detail_requests.read().await.clone()
    }

    async fn take_error(&self) -> Option<MediaServerError> {
        self.next_error.write().await.take()
    }

    fn rejected(item_key: &str) -> MediaServerError {
        MediaServerError::ApiError {
            status: 400,
            message: format!("rejected write for {}", item_key),
        }
    }
}

#[async_trait]
impl MediaServer for MockMediaServer {
    async fn libraries(&self) -> Result<Vec<Library>, MediaServerError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        Ok(self.libraries.read().await.clone())
    }

    async fn library_items(
        &self,
        library_key: &str,
        kind: MediaKind,
    ) -> Result<Vec<CatalogItem>, MediaServerError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        let listings = self.listings.read().await;
        let keys = listings
            .get(library_key)
            .ok_or_else(|| MediaServerError::NotFound(format!("library {}", library_key)))?;

        let items = self.items.read().await;
        Ok(keys
            .iter()
            .filter_map(|key| items.get(key))
            .filter(|item| item.kind() == kind)
            .cloned()
            .collect())
    }

    async fn item_details(
        &self,
        item_key: &str,
        _kind: MediaKind,
    ) -> Result<CatalogItem, MediaServerError> {
        self.detail_requests
            .write()
            .await
            .push(item_key.to_string());

        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        if self.failing_details.read().await.contains(item_key) {
            return Err(MediaServerError::Transient {
                status: 503,
                message: "unavailable".to_string(),
            });
        }

        self.items
            .read()
            .await
            .get(item_key)
            .cloned()
            .ok_or_else(|| MediaServerError::NotFound(format!("item {}", item_key)))
    }

    async fn episode_files(
        &self,
        show_key: &str,
        limit: Option<usize>,
    ) -> Result<Vec<FileInfo>, MediaServerError> {
        self.episode_requests
            .write()
            .await
            .push((show_key.to_string(), limit));

        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        let files = self
            .episode_files
            .read()
            .await
            .get(show_key)
            .cloned()
            .unwrap_or_default();
        Ok(match limit {
            Some(limit) => files.into_iter().take(limit).collect(),
            None => files,
        })
    }

    async fn update_tags(
        &self,
        library_key: &str,
        item: &CatalogItem,
        field: TagField,
        tags: &[String],
    ) -> Result<(), MediaServerError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        if self.failing_writes.read().await.contains(item.key()) {
            return Err(Self::rejected(item.key()));
        }

        self.updates.write().await.push(RecordedTagUpdate {
            library_key: library_key.to_string(),
            item_key: item.key().to_string(),
            field,
            tags: tags.to_vec(),
        });

        if let Some(stored) = self.items.write().await.get_mut(item.key()) {
            stored.set_tags(field, tags.to_vec());
        }
        Ok(())
    }

    async fn remove_tags(
        &self,
        library_key: &str,
        item: &CatalogItem,
        field: TagField,
        tags: &[String],
        lock: bool,
    ) -> Result<(), MediaServerError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        if self.failing_writes.read().await.contains(item.key()) {
            return Err(Self::rejected(item.key()));
        }

        self.removals.write().await.push(RecordedTagRemoval {
            library_key: library_key.to_string(),
            item_key: item.key().to_string(),
            field,
            tags: tags.to_vec(),
            lock,
        });

        if let Some(stored) = self.items.write().await.get_mut(item.key()) {
            let remaining: Vec<String> = stored
                .tags(field)
                .iter()
                .filter(|t| !tags.iter().any(|r| r.eq_ignore_ascii_case(t)))
                .cloned()
                .collect();
            stored.set_tags(field, remaining);
        }
        Ok(())
    }
}
