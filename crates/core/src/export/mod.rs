//! File list export for items carrying selected tags.
//!
//! During a pass every processed item is offered to the [`Exporter`]; items
//! whose tags include one of the configured export tags contribute their file
//! paths and sizes. At the end of the pass everything is written in one go and
//! the accumulation is cleared.

mod summary;
mod writer;

pub use summary::{format_file_size, ExportSummary, LibraryStats, TagStats};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ExportConfig, ExportFormat};
use crate::media::FileInfo;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Export is not configured: {0}")]
    NotConfigured(String),

    #[error("Export state lock poisoned")]
    LockPoisoned,
}

impl ExportError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        ExportError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// library name -> configured tag -> files
pub type Accumulation = BTreeMap<String, BTreeMap<String, Vec<FileInfo>>>;

/// Replace characters that are unsafe in file names.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Run-scoped export accumulator.
pub struct Exporter {
    location: PathBuf,
    tags: Vec<String>,
    format: ExportFormat,
    accumulation: Mutex<Accumulation>,
}

impl Exporter {
    /// Build an exporter from configuration and create the output directory.
    pub fn new(config: &ExportConfig) -> Result<Self, ExportError> {
        let location = config.location.clone().ok_or_else(|| {
            ExportError::NotConfigured("export.location is not set".to_string())
        })?;

        let tags: Vec<String> = config
            .tags
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if tags.is_empty() {
            return Err(ExportError::NotConfigured(
                "export.tags is empty".to_string(),
            ));
        }

        std::fs::create_dir_all(&location).map_err(|e| ExportError::io(&location, e))?;

        info!(
            "Export enabled: {} tags, format={}, location={:?}",
            tags.len(),
            config.format.as_str(),
            location
        );

        Ok(Self {
            location,
            tags,
            format: config.format,
            accumulation: Mutex::new(BTreeMap::new()),
        })
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    fn lock(&self) -> Result<MutexGuard<'_, Accumulation>, ExportError> {
        self.accumulation.lock().map_err(|_| ExportError::LockPoisoned)
    }

    /// Start a new pass. Anything left over from a pass whose flush failed is
    /// dropped, since the new pass observes every item again.
    pub fn begin_pass(&self) -> Result<(), ExportError> {
        let mut acc = self.lock()?;
        if !acc.is_empty() {
            warn!(
                "Discarding export data of {} libraries left from an unflushed pass",
                acc.len()
            );
            acc.clear();
        }
        Ok(())
    }

    /// Register a library so its tag files are written even without matches.
    pub fn begin_library(&self, library: &str) -> Result<(), ExportError> {
        let mut acc = self.lock()?;
        self.buckets(&mut acc, library);
        Ok(())
    }

    fn buckets<'a>(
        &self,
        acc: &'a mut Accumulation,
        library: &str,
    ) -> &'a mut BTreeMap<String, Vec<FileInfo>> {
        let buckets = acc.entry(sanitize_name(library)).or_default();
        for tag in &self.tags {
            buckets.entry(tag.clone()).or_default();
        }
        buckets
    }

    /// Offer an item to the export. Returns the configured tags it matched.
    pub fn record_match(
        &self,
        library: &str,
        title: &str,
        item_tags: &[String],
        files: &[FileInfo],
    ) -> Result<Vec<String>, ExportError> {
        let present: Vec<String> = item_tags.iter().map(|t| t.trim().to_lowercase()).collect();
        let matched: Vec<String> = self
            .tags
            .iter()
            .filter(|tag| present.contains(&tag.to_lowercase()))
            .cloned()
            .collect();

        let mut acc = self.lock()?;
        let buckets = self.buckets(&mut acc, library);
        for tag in &matched {
            if let Some(bucket) = buckets.get_mut(tag) {
                bucket.extend(files.iter().cloned());
            }
        }

        if !matched.is_empty() {
            debug!(
                "Export: '{}' matched {:?} ({} files)",
                title,
                matched,
                files.len()
            );
        }
        Ok(matched)
    }

    /// Per library, per tag file counts of the current accumulation.
    pub fn summary(&self) -> Result<ExportSummary, ExportError> {
        Ok(ExportSummary::from_accumulation(&*self.lock()?))
    }

    /// Write the accumulation to disk and clear it.
    ///
    /// All files are staged first and only renamed into place once every one
    /// of them was written. On failure the accumulation is kept; a failed
    /// rename can leave earlier files of the set already replaced.
    pub fn flush(&self) -> Result<Vec<PathBuf>, ExportError> {
        let mut acc = self.lock()?;
        let generated_at = Utc::now();

        let outputs = match self.format {
            ExportFormat::Txt => writer::text_outputs(&self.location, &self.tags, &acc, generated_at),
            ExportFormat::Json => {
                writer::json_outputs(&self.location, self.format, &acc, generated_at)?
            }
        };

        let written = writer::write_all_atomic(&outputs)?;
        info!(
            "Export written: {} files under {:?}",
            written.len(),
            self.location
        );

        acc.clear();
        Ok(written)
    }
}
