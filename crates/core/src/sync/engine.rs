//! Per-item synchronization.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use super::batch::{BatchCoordinator, BatchHandler};
use super::types::{ItemOutcome, PassSummary, SyncError, SyncSettings};
use crate::export::{sanitize_name, Exporter};
use crate::media::{CatalogItem, FileInfo, Library, MediaKind};
use crate::media_server::{MediaServer, MediaServerError};
use crate::normalize::{contains_all, normalize_all, reconcile};
use crate::provider::KeywordProvider;
use crate::resolver::IdResolver;
use crate::store::{ProcessingRecord, RecordStore};

/// Drives resolve → fetch → normalize → reconcile → apply → persist for every
/// item of the configured libraries.
pub struct SyncEngine {
    pub(super) media_server: Arc<dyn MediaServer>,
    pub(super) provider: Arc<dyn KeywordProvider>,
    pub(super) resolver: IdResolver,
    store: Arc<dyn RecordStore>,
    exporter: Option<Arc<Exporter>>,
    pub(super) settings: SyncSettings,
    pub(super) batches: BatchCoordinator,
}

impl SyncEngine {
    pub fn new(
        media_server: Arc<dyn MediaServer>,
        provider: Arc<dyn KeywordProvider>,
        resolver: IdResolver,
        store: Arc<dyn RecordStore>,
        settings: SyncSettings,
    ) -> Self {
        let batches = BatchCoordinator::new(settings.batch_size, settings.batch_delay);
        Self {
            media_server,
            provider,
            resolver,
            store,
            exporter: None,
            settings,
            batches,
        }
    }

    pub fn with_exporter(mut self, exporter: Arc<Exporter>) -> Self {
        self.exporter = Some(exporter);
        self
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// One full pass over `libraries`, in order, followed by the export
    /// flush. A failing library is logged and the pass moves on.
    pub async fn run_pass(&self, libraries: &[Library]) -> PassSummary {
        if let Some(exporter) = &self.exporter {
            if let Err(e) = exporter.begin_pass() {
                warn!("Failed to reset export state: {}", e);
            }
        }

        let mut total = PassSummary::default();
        for library in libraries {
            match self.process_library(library).await {
                Ok(summary) => total.merge(&summary),
                Err(e) => error!("Failed to process library '{}': {}", library.title, e),
            }
        }

        if let Some(exporter) = &self.exporter {
            match exporter.flush() {
                Ok(paths) => info!("Export flushed ({} files)", paths.len()),
                Err(e) => warn!("Export flush failed, keeping accumulated data: {}", e),
            }
        }

        info!(
            "Pass complete: {} items, {} new, {} updated, {} skipped ({} already tagged), {} failed",
            total.total, total.new, total.updated, total.skipped, total.already_tagged, total.failed
        );
        total
    }

    /// Process every item of one library in batches.
    pub async fn process_library(&self, library: &Library) -> Result<PassSummary, SyncError> {
        let kind = library_kind(library)?;

        info!("Fetching {} items from library '{}'", kind, library.title);
        let items = self.media_server.library_items(&library.key, kind).await?;
        info!(
            "Found {} items in '{}' ({} batches of up to {})",
            items.len(),
            library.title,
            self.batches.chunk_count(items.len()),
            self.batches.batch_size()
        );

        if let Some(exporter) = &self.exporter {
            exporter.begin_library(&library.title)?;
        }
        if self.settings.force_update {
            info!("Force update enabled: every item will be reprocessed");
        }

        let pass = LibraryPass {
            engine: self,
            library,
        };
        let report = self.batches.run(&library.title, &items, &pass).await;
        let summary = PassSummary::from_outcomes(&report.outputs);

        info!(
            library = %library.title,
            total = summary.total,
            new = summary.new,
            updated = summary.updated,
            skipped = summary.skipped,
            already_tagged = summary.already_tagged,
            failed = summary.failed,
            "Library summary"
        );
        self.log_export_summary(library);

        Ok(summary)
    }

    /// Decide and apply the outcome for one item. Never fails: every problem
    /// is scoped to the item and reported as an outcome.
    pub async fn process_item(&self, library: &Library, item: &CatalogItem) -> ItemOutcome {
        let field = self.settings.tag_field;
        let force = self.settings.force_update;
        let title = item.title();

        let record = match self.store.get(item.key()) {
            Ok(record) => record,
            Err(e) => {
                warn!("Could not read processing record for '{}': {}", title, e);
                None
            }
        };
        let first_time = record.is_none();

        if !force && record.as_ref().is_some_and(|r| r.is_synced_for(field)) {
            debug!("Skipping '{}': {} already synced", title, field);
            self.export_current(library, item).await;
            return ItemOutcome::AlreadySynced;
        }

        let resolution = self.resolver.resolve(item).await;
        let (Some(tmdb_id), Some(source)) = (resolution.id.clone(), resolution.source) else {
            debug!(
                "Skipping '{}' ({}): no TMDb id [{}]",
                title,
                year_text(item),
                resolution.trace()
            );
            self.export_current(library, item).await;
            return ItemOutcome::NoIdentifier;
        };
        debug!("'{}': TMDb id {} from {}", title, tmdb_id, source);

        let raw = match self.provider.keywords(&tmdb_id, item.kind()).await {
            Ok(raw) => raw,
            Err(e) => {
                debug!("Skipping '{}': keyword fetch for {} failed: {}", title, tmdb_id, e);
                return ItemOutcome::FetchFailed;
            }
        };
        let keywords = normalize_all(&raw);
        debug!("'{}': {} keywords {:?}", title, keywords.len(), keywords);

        let details = match self.media_server.item_details(item.key(), item.kind()).await {
            Ok(details) => details,
            Err(e) => {
                debug!("Skipping '{}': detail fetch failed: {}", title, e);
                return ItemOutcome::DetailsFailed;
            }
        };
        let current = details.tags(field);
        debug!("'{}': current {}s {:?}", title, field, current);

        if contains_all(current, &keywords) {
            if !force {
                debug!("Skipping '{}': already has all keywords", title);
                self.export_item(library, &details).await;
                return ItemOutcome::AlreadyTagged;
            }
            debug!("'{}': force update with no missing keywords", title);
        }

        let merged = reconcile(current, &keywords);
        if let Err(e) = self
            .media_server
            .update_tags(&library.key, &details, field, &merged)
            .await
        {
            warn!("Failed to update {} for '{}': {}", field, title, e);
            return ItemOutcome::UpdateFailed;
        }

        if first_time {
            info!(
                "Synced new {} '{}' ({}): TMDb {} via {}, {} keywords applied to {}",
                item.kind(),
                title,
                year_text(item),
                tmdb_id,
                source,
                keywords.len(),
                field
            );
        } else {
            debug!("Updated {} of '{}' ({} values)", field, title, merged.len());
        }

        if self.exporter.is_some() {
            self.export_current(library, item).await;
        }

        if let Err(e) = self
            .store
            .set(ProcessingRecord::synced(item.key(), title, &tmdb_id, field))
        {
            warn!("Failed to save processing record for '{}': {}", title, e);
        }

        tokio::time::sleep(self.settings.item_delay).await;
        ItemOutcome::Updated { first_time }
    }

    /// Re-read an item and offer it to the export.
    async fn export_current(&self, library: &Library, item: &CatalogItem) {
        if self.exporter.is_none() {
            return;
        }
        match self.media_server.item_details(item.key(), item.kind()).await {
            Ok(details) => self.export_item(library, &details).await,
            Err(e) => debug!("Could not read '{}' for export: {}", item.title(), e),
        }
    }

    async fn export_item(&self, library: &Library, item: &CatalogItem) {
        let Some(exporter) = &self.exporter else {
            return;
        };

        let files = match self.export_files(item).await {
            Ok(files) => files,
            Err(e) => {
                debug!("Could not list files of '{}' for export: {}", item.title(), e);
                return;
            }
        };
        if files.is_empty() {
            return;
        }

        if let Err(e) = exporter.record_match(
            &library.title,
            item.title(),
            item.tags(self.settings.tag_field),
            &files,
        ) {
            warn!("Export accumulation failed for '{}': {}", item.title(), e);
        }
    }

    /// Movies export their own parts; series export every episode.
    async fn export_files(&self, item: &CatalogItem) -> Result<Vec<FileInfo>, MediaServerError> {
        match item.kind() {
            MediaKind::Movie => Ok(item.files().to_vec()),
            MediaKind::Show => self.media_server.episode_files(item.key(), None).await,
        }
    }

    fn log_export_summary(&self, library: &Library) {
        let Some(exporter) = &self.exporter else {
            return;
        };
        match exporter.summary() {
            Ok(summary) => {
                if let Some(stats) = summary.libraries.get(&sanitize_name(&library.title)) {
                    for (tag, tag_stats) in &stats.tags {
                        info!(
                            "Export '{}': {} -> {} files ({})",
                            library.title, tag, tag_stats.files, tag_stats.size_formatted
                        );
                    }
                }
            }
            Err(e) => warn!("Could not summarize export: {}", e),
        }
    }
}

pub(super) fn library_kind(library: &Library) -> Result<MediaKind, SyncError> {
    library.kind().ok_or_else(|| SyncError::UnsupportedLibrary {
        title: library.title.clone(),
        section_type: library.section_type.clone(),
    })
}

pub(super) fn year_text(item: &CatalogItem) -> String {
    item.year()
        .map(|y| y.to_string())
        .unwrap_or_else(|| "unknown year".to_string())
}

/// Feeds one library's items to the engine.
struct LibraryPass<'a> {
    engine: &'a SyncEngine,
    library: &'a Library,
}

#[async_trait]
impl<'a> BatchHandler<CatalogItem> for LibraryPass<'a> {
    type Output = ItemOutcome;

    async fn handle(&self, item: &CatalogItem) -> ItemOutcome {
        self.engine.process_item(self.library, item).await
    }
}
