//! TMDb id resolution for catalog items.
//!
//! Sources are tried in order and the first hit wins:
//!
//! 1. cross-references embedded by the media server (`tmdb://603`)
//! 2. the secondary catalog for the item's kind: title/year, then tvdb/imdb
//!    cross-reference, then file path, then sampled episode paths
//! 3. ids written into file or folder names (`{tmdb-603}`)
//!
//! Every attempt is recorded so skipped items can be diagnosed.

use std::fmt;
use std::sync::Arc;

use crate::extract::extract_from_paths;
use crate::media::{CatalogItem, FileInfo, MediaKind};
use crate::media_server::MediaServer;
use crate::secondary::{SecondaryCatalog, SecondaryEntry, SecondaryIndex};

/// Episodes inspected per series when looking for paths.
pub const EPISODE_SAMPLE_SIZE: usize = 10;

/// Where an id came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdSource {
    Embedded,
    SecondaryTitle,
    SecondaryCrossReference,
    SecondaryPath,
    SecondaryEpisodePath,
    FilePath,
    EpisodeFilePath,
}

impl fmt::Display for IdSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IdSource::Embedded => "embedded guid",
            IdSource::SecondaryTitle => "secondary title/year",
            IdSource::SecondaryCrossReference => "secondary cross-reference",
            IdSource::SecondaryPath => "secondary path",
            IdSource::SecondaryEpisodePath => "secondary episode path",
            IdSource::FilePath => "file path",
            IdSource::EpisodeFilePath => "episode file path",
        };
        f.write_str(name)
    }
}

/// Result of one source lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Found(String),
    Miss,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionAttempt {
    pub source: IdSource,
    pub outcome: AttemptOutcome,
}

/// Resolved id plus the trace of every source consulted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub id: Option<String>,
    pub source: Option<IdSource>,
    pub attempts: Vec<ResolutionAttempt>,
}

impl Resolution {
    fn miss(&mut self, source: IdSource) {
        self.attempts.push(ResolutionAttempt {
            source,
            outcome: AttemptOutcome::Miss,
        });
    }

    fn failed(&mut self, source: IdSource, reason: impl Into<String>) {
        self.attempts.push(ResolutionAttempt {
            source,
            outcome: AttemptOutcome::Failed(reason.into()),
        });
    }

    fn found(mut self, source: IdSource, id: String) -> Self {
        self.attempts.push(ResolutionAttempt {
            source,
            outcome: AttemptOutcome::Found(id.clone()),
        });
        self.id = Some(id);
        self.source = Some(source);
        self
    }

    /// One-line trace for logs: "embedded guid: miss, file path: found 603".
    pub fn trace(&self) -> String {
        self.attempts
            .iter()
            .map(|a| match &a.outcome {
                AttemptOutcome::Found(id) => format!("{}: found {}", a.source, id),
                AttemptOutcome::Miss => format!("{}: miss", a.source),
                AttemptOutcome::Failed(reason) => format!("{}: failed ({})", a.source, reason),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Multi-source id resolver.
pub struct IdResolver {
    media_server: Arc<dyn MediaServer>,
    movie_catalog: Option<Arc<dyn SecondaryCatalog>>,
    show_catalog: Option<Arc<dyn SecondaryCatalog>>,
}

impl IdResolver {
    pub fn new(media_server: Arc<dyn MediaServer>) -> Self {
        Self {
            media_server,
            movie_catalog: None,
            show_catalog: None,
        }
    }

    pub fn with_movie_catalog(mut self, catalog: Arc<dyn SecondaryCatalog>) -> Self {
        self.movie_catalog = Some(catalog);
        self
    }

    pub fn with_show_catalog(mut self, catalog: Arc<dyn SecondaryCatalog>) -> Self {
        self.show_catalog = Some(catalog);
        self
    }

    fn catalog_for(&self, kind: MediaKind) -> Option<&Arc<dyn SecondaryCatalog>> {
        match kind {
            MediaKind::Movie => self.movie_catalog.as_ref(),
            MediaKind::Show => self.show_catalog.as_ref(),
        }
    }

    /// Resolve the TMDb id of an item.
    pub async fn resolve(&self, item: &CatalogItem) -> Resolution {
        let mut resolution = Resolution::default();

        if let Some(id) = item.external_id("tmdb") {
            return resolution.found(IdSource::Embedded, id.to_string());
        }
        resolution.miss(IdSource::Embedded);

        let mut episodes = EpisodeSample::new(item);

        if let Some(catalog) = self.catalog_for(item.kind()) {
            match catalog.entries().await {
                Ok(entries) => {
                    let index = SecondaryIndex::new(entries);
                    if let Some((source, id)) = self
                        .match_secondary(&index, item, &mut episodes, &mut resolution)
                        .await
                    {
                        return resolution.found(source, id);
                    }
                }
                Err(e) => resolution.failed(
                    IdSource::SecondaryTitle,
                    format!("{}: {}", catalog.name(), e),
                ),
            }
        }

        let from_files = extract_from_paths(item.files().iter().map(|f| f.path.as_str()));
        if let Some(id) = from_files {
            return resolution.found(IdSource::FilePath, id);
        }
        resolution.miss(IdSource::FilePath);

        if item.kind() == MediaKind::Show {
            let sample = episodes.get(self.media_server.as_ref(), &mut resolution).await;
            if let Some(id) = extract_from_paths(sample.iter().map(|f| f.path.as_str())) {
                return resolution.found(IdSource::EpisodeFilePath, id);
            }
            resolution.miss(IdSource::EpisodeFilePath);
        }

        resolution
    }

    async fn match_secondary(
        &self,
        index: &SecondaryIndex,
        item: &CatalogItem,
        episodes: &mut EpisodeSample<'_>,
        resolution: &mut Resolution,
    ) -> Option<(IdSource, String)> {
        if let Some(id) = tmdb_of(index.find_by_title_year(item.title(), item.year())) {
            return Some((IdSource::SecondaryTitle, id));
        }
        resolution.miss(IdSource::SecondaryTitle);

        let cross_ref = item
            .external_id("tvdb")
            .and_then(|id| index.find_by_tvdb(id))
            .or_else(|| item.external_id("imdb").and_then(|id| index.find_by_imdb(id)));
        if let Some(id) = tmdb_of(cross_ref) {
            return Some((IdSource::SecondaryCrossReference, id));
        }
        resolution.miss(IdSource::SecondaryCrossReference);

        let by_path = item.files().iter().find_map(|f| index.find_by_path(&f.path));
        if let Some(id) = tmdb_of(by_path) {
            return Some((IdSource::SecondaryPath, id));
        }
        resolution.miss(IdSource::SecondaryPath);

        if item.kind() == MediaKind::Show {
            let sample = episodes.get(self.media_server.as_ref(), resolution).await;
            let by_episode = sample.iter().find_map(|f| index.find_by_path(&f.path));
            if let Some(id) = tmdb_of(by_episode) {
                return Some((IdSource::SecondaryEpisodePath, id));
            }
            resolution.miss(IdSource::SecondaryEpisodePath);
        }

        None
    }
}

fn tmdb_of(entry: Option<&SecondaryEntry>) -> Option<String> {
    entry.and_then(|e| e.tmdb_id).map(|id| id.to_string())
}

/// Episode files fetched at most once per resolution.
struct EpisodeSample<'a> {
    item: &'a CatalogItem,
    files: Option<Vec<FileInfo>>,
}

impl<'a> EpisodeSample<'a> {
    fn new(item: &'a CatalogItem) -> Self {
        Self { item, files: None }
    }

    async fn get(
        &mut self,
        media_server: &dyn MediaServer,
        resolution: &mut Resolution,
    ) -> &[FileInfo] {
        if self.files.is_none() {
            let files = match media_server
                .episode_files(self.item.key(), Some(EPISODE_SAMPLE_SIZE))
                .await
            {
                Ok(files) => files,
                Err(e) => {
                    resolution.failed(IdSource::EpisodeFilePath, e.to_string());
                    Vec::new()
                }
            };
            self.files = Some(files);
        }
        self.files.as_deref().unwrap_or_default()
    }
}
