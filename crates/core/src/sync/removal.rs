//! One-shot removal of provider keywords from the synchronized field.
//!
//! Only values that match a keyword the provider currently reports for the
//! item are removed; anything curated by hand stays.

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use super::batch::BatchHandler;
use super::engine::{library_kind, year_text, SyncEngine};
use super::types::{RemovalOutcome, RemovalSummary, SyncError};
use crate::config::RemoveMode;
use crate::media::{CatalogItem, Library};
use crate::normalize::normalize_all;

impl SyncEngine {
    /// Walk every library once and remove recognised keywords.
    pub async fn run_removal(&self, libraries: &[Library], mode: RemoveMode) -> RemovalSummary {
        info!(
            "Removing provider keywords from the {} field (field will be {})",
            self.settings.tag_field,
            if mode.locks() { "locked" } else { "unlocked" }
        );

        let mut total = RemovalSummary::default();
        for library in libraries {
            match self.remove_library(library, mode).await {
                Ok(summary) => total.merge(&summary),
                Err(e) => error!("Failed to process library '{}': {}", library.title, e),
            }
        }

        info!(
            "Removal complete: {} items checked, {} changed, {} skipped, {} keywords removed",
            total.checked, total.items_changed, total.skipped, total.keywords_removed
        );
        total
    }

    pub async fn remove_library(
        &self,
        library: &Library,
        mode: RemoveMode,
    ) -> Result<RemovalSummary, SyncError> {
        let kind = library_kind(library)?;

        info!("Fetching {} items from library '{}' for keyword removal", kind, library.title);
        let items = self.media_server.library_items(&library.key, kind).await?;
        if items.is_empty() {
            info!("No items found in '{}'", library.title);
            return Ok(RemovalSummary::default());
        }

        let pass = RemovalPass {
            engine: self,
            library,
            lock: mode.locks(),
        };
        let report = self.batches.run(&library.title, &items, &pass).await;
        let summary = RemovalSummary::from_outcomes(&report.outputs);

        info!(
            library = %library.title,
            checked = summary.checked,
            changed = summary.items_changed,
            skipped = summary.skipped,
            keywords_removed = summary.keywords_removed,
            "Removal summary"
        );
        Ok(summary)
    }

    /// Remove the item's values that match its provider keywords, then set the
    /// field's lock state.
    pub async fn remove_item(
        &self,
        library: &Library,
        item: &CatalogItem,
        lock: bool,
    ) -> RemovalOutcome {
        let field = self.settings.tag_field;
        let title = item.title();

        let Some(tmdb_id) = self.resolver.resolve(item).await.id else {
            debug!("Skipping '{}': no TMDb id", title);
            return RemovalOutcome::Skipped;
        };

        let details = match self.media_server.item_details(item.key(), item.kind()).await {
            Ok(details) => details,
            Err(e) => {
                warn!("Could not fetch details of '{}': {}", title, e);
                return RemovalOutcome::Skipped;
            }
        };
        let current = details.tags(field);
        if current.is_empty() {
            return RemovalOutcome::Skipped;
        }

        let raw = match self.provider.keywords(&tmdb_id, item.kind()).await {
            Ok(raw) => raw,
            Err(e) => {
                debug!("Keyword fetch for '{}' failed: {}", title, e);
                Vec::new()
            }
        };

        // Both the provider spelling and the normalized form are recognised,
        // so values written before normalization existed are removed too.
        let recognised: HashSet<String> = raw
            .iter()
            .cloned()
            .chain(normalize_all(&raw))
            .map(|k| k.to_lowercase())
            .collect();

        let to_remove: Vec<String> = current
            .iter()
            .filter(|value| recognised.contains(&value.to_lowercase()))
            .cloned()
            .collect();
        if to_remove.is_empty() {
            return RemovalOutcome::Skipped;
        }

        info!(
            "Removing {} keywords from '{}' ({}), TMDb {}",
            to_remove.len(),
            title,
            year_text(item),
            tmdb_id
        );
        if let Err(e) = self
            .media_server
            .remove_tags(&library.key, &details, field, &to_remove, lock)
            .await
        {
            warn!("Failed to remove keywords from '{}': {}", title, e);
            return RemovalOutcome::Skipped;
        }

        tokio::time::sleep(self.settings.item_delay).await;
        RemovalOutcome::Removed(to_remove.len())
    }
}

struct RemovalPass<'a> {
    engine: &'a SyncEngine,
    library: &'a Library,
    lock: bool,
}

#[async_trait]
impl<'a> BatchHandler<CatalogItem> for RemovalPass<'a> {
    type Output = RemovalOutcome;

    async fn handle(&self, item: &CatalogItem) -> RemovalOutcome {
        self.engine.remove_item(self.library, item, self.lock).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{MediaKind, TagField};
    use crate::resolver::IdResolver;
    use crate::store::MemoryStore;
    use crate::sync::SyncSettings;
    use crate::testing::{fixtures, MockKeywordProvider, MockMediaServer};
    use std::sync::Arc;
    use std::time::Duration;

    fn engine_with(server: &Arc<MockMediaServer>, provider: &Arc<MockKeywordProvider>) -> SyncEngine {
        SyncEngine::new(
            server.clone(),
            provider.clone(),
            IdResolver::new(server.clone()),
            Arc::new(MemoryStore::new()),
            SyncSettings {
                tag_field: TagField::Label,
                force_update: false,
                item_delay: Duration::ZERO,
                batch_size: 10,
                batch_delay: Duration::ZERO,
                remove: Some(RemoveMode::Unlock),
            },
        )
    }

    #[tokio::test]
    async fn test_removes_only_recognised_values() {
        let server = Arc::new(MockMediaServer::new());
        let provider = Arc::new(MockKeywordProvider::new());
        let library = fixtures::library("1", "Movies", "movie");
        server.add_library(library.clone()).await;
        let item = fixtures::with_labels(
            fixtures::with_tmdb(fixtures::movie("10", "Alien", 1979), "348"),
            &["Sci-Fi", "space", "My Favourite"],
        );
        server.add_item("1", item.clone()).await;
        provider
            .set_keywords("348", MediaKind::Movie, &["sci-fi", "space"])
            .await;

        let engine = engine_with(&server, &provider);
        let outcome = engine.remove_item(&library, &item, false).await;

        assert_eq!(outcome, RemovalOutcome::Removed(2));
        let removals = server.recorded_removals().await;
        assert_eq!(removals[0].tags, vec!["Sci-Fi", "space"]);
        assert!(!removals[0].lock);
        let stored = server.item("10").await.unwrap();
        assert_eq!(stored.tags(TagField::Label), ["My Favourite".to_string()]);
    }

    #[tokio::test]
    async fn test_item_without_recognised_values_is_skipped() {
        let server = Arc::new(MockMediaServer::new());
        let provider = Arc::new(MockKeywordProvider::new());
        let library = fixtures::library("1", "Movies", "movie");
        let item = fixtures::with_labels(
            fixtures::with_tmdb(fixtures::movie("10", "Alien", 1979), "348"),
            &["My Favourite"],
        );
        server.add_item("1", item.clone()).await;
        provider.fail_for("348").await;

        let engine = engine_with(&server, &provider);
        assert_eq!(
            engine.remove_item(&library, &item, true).await,
            RemovalOutcome::Skipped
        );
        assert!(server.recorded_removals().await.is_empty());
    }
}
