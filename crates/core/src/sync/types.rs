//! Types for the synchronization engine.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::config::{RemoveMode, SyncConfig};
use crate::media::TagField;

/// Errors that abort a whole library pass. Per-item failures never surface
/// here; they become [`ItemOutcome`]s.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("media server error: {0}")]
    MediaServer(#[from] crate::media_server::MediaServerError),

    #[error("export error: {0}")]
    Export(#[from] crate::export::ExportError),

    #[error("record store error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("library '{title}' has unsupported type '{section_type}'")]
    UnsupportedLibrary { title: String, section_type: String },
}

/// Engine behaviour derived from the `[sync]` configuration section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    pub tag_field: TagField,
    pub force_update: bool,
    /// Pause after each successfully updated item.
    pub item_delay: Duration,
    pub batch_size: usize,
    pub batch_delay: Duration,
    /// Lock state applied by removal runs.
    pub remove: Option<RemoveMode>,
}

impl From<&SyncConfig> for SyncSettings {
    fn from(config: &SyncConfig) -> Self {
        Self {
            tag_field: config.tag_field,
            force_update: config.force_update,
            item_delay: config.item_delay(),
            batch_size: config.effective_batch_size(),
            batch_delay: config.effective_batch_delay(),
            remove: config.remove,
        }
    }
}

/// How one item of a pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Tags were written. `first_time` is set when the item had no record.
    Updated { first_time: bool },
    /// A valid record for the configured field exists.
    AlreadySynced,
    /// Every keyword was already present.
    AlreadyTagged,
    NoIdentifier,
    FetchFailed,
    DetailsFailed,
    /// The media server rejected the tag write.
    UpdateFailed,
}

impl fmt::Display for ItemOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ItemOutcome::Updated { first_time: true } => "new",
            ItemOutcome::Updated { first_time: false } => "updated",
            ItemOutcome::AlreadySynced => "already synced",
            ItemOutcome::AlreadyTagged => "already has all keywords",
            ItemOutcome::NoIdentifier => "no TMDb id",
            ItemOutcome::FetchFailed => "keyword fetch failed",
            ItemOutcome::DetailsFailed => "detail fetch failed",
            ItemOutcome::UpdateFailed => "update failed",
        };
        f.write_str(text)
    }
}

/// End-of-library counters for a normal pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    pub total: usize,
    pub new: usize,
    pub updated: usize,
    pub skipped: usize,
    /// Items skipped because they were already synced or already tagged.
    pub already_tagged: usize,
    pub failed: usize,
}

impl PassSummary {
    pub fn from_outcomes(outcomes: &[ItemOutcome]) -> Self {
        let mut summary = PassSummary::default();
        for outcome in outcomes {
            summary.record(*outcome);
        }
        summary
    }

    pub fn record(&mut self, outcome: ItemOutcome) {
        self.total += 1;
        match outcome {
            ItemOutcome::Updated { first_time: true } => self.new += 1,
            ItemOutcome::Updated { first_time: false } => self.updated += 1,
            ItemOutcome::AlreadySynced | ItemOutcome::AlreadyTagged => {
                self.skipped += 1;
                self.already_tagged += 1;
            }
            ItemOutcome::NoIdentifier | ItemOutcome::FetchFailed | ItemOutcome::DetailsFailed => {
                self.skipped += 1
            }
            ItemOutcome::UpdateFailed => self.failed += 1,
        }
    }

    /// Add another library's counters.
    pub fn merge(&mut self, other: &PassSummary) {
        self.total += other.total;
        self.new += other.new;
        self.updated += other.updated;
        self.skipped += other.skipped;
        self.already_tagged += other.already_tagged;
        self.failed += other.failed;
    }
}

/// How one item of a removal run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalOutcome {
    Removed(usize),
    /// No id, no details, no current tags or nothing recognised.
    Skipped,
}

/// End-of-library counters for a removal run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RemovalSummary {
    pub checked: usize,
    pub items_changed: usize,
    pub skipped: usize,
    pub keywords_removed: usize,
}

impl RemovalSummary {
    pub fn from_outcomes(outcomes: &[RemovalOutcome]) -> Self {
        let mut summary = RemovalSummary::default();
        for outcome in outcomes {
            summary.checked += 1;
            match outcome {
                RemovalOutcome::Removed(count) => {
                    summary.items_changed += 1;
                    summary.keywords_removed += count;
                }
                RemovalOutcome::Skipped => summary.skipped += 1,
            }
        }
        summary
    }

    pub fn merge(&mut self, other: &RemovalSummary) {
        self.checked += other.checked;
        self.items_changed += other.items_changed;
        self.skipped += other.skipped;
        self.keywords_removed += other.keywords_removed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_summary_counters() {
        let summary = PassSummary::from_outcomes(&[
            ItemOutcome::Updated { first_time: true },
            ItemOutcome::Updated { first_time: false },
            ItemOutcome::AlreadySynced,
            ItemOutcome::AlreadyTagged,
            ItemOutcome::NoIdentifier,
            ItemOutcome::FetchFailed,
            ItemOutcome::UpdateFailed,
        ]);
        assert_eq!(
            summary,
            PassSummary {
                total: 7,
                new: 1,
                updated: 1,
                skipped: 4,
                already_tagged: 2,
                failed: 1,
            }
        );
    }

    #[test]
    fn test_removal_summary_counters() {
        let mut summary = RemovalSummary::from_outcomes(&[
            RemovalOutcome::Removed(3),
            RemovalOutcome::Skipped,
            RemovalOutcome::Removed(1),
        ]);
        assert_eq!(summary.checked, 3);
        assert_eq!(summary.items_changed, 2);
        assert_eq!(summary.keywords_removed, 4);

        summary.merge(&RemovalSummary::from_outcomes(&[RemovalOutcome::Skipped]));
        assert_eq!(summary.checked, 4);
        assert_eq!(summary.skipped, 2);
    }

    #[test]
    fn test_settings_from_config_apply_fallbacks() {
        let config = SyncConfig {
            batch_size: 0,
            batch_delay_secs: -3,
            ..Default::default()
        };
        let settings = SyncSettings::from(&config);
        assert_eq!(settings.batch_size, crate::config::DEFAULT_BATCH_SIZE);
        assert_eq!(
            settings.batch_delay,
            Duration::from_secs(crate::config::DEFAULT_BATCH_DELAY_SECS)
        );
        assert_eq!(settings.item_delay, Duration::from_millis(500));
    }
}
