//! Processing history.
//!
//! A record says "this item's tag field was synchronized". Records are only
//! trusted for skipping when they were written for the currently configured
//! field.

mod json;
mod memory;

pub use json::JsonFileStore;
pub use memory::MemoryStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::media::TagField;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Record store lock poisoned")]
    LockPoisoned,
}

/// Persisted fact that an item was synchronized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingRecord {
    pub rating_key: String,
    pub title: String,
    pub tmdb_id: String,
    pub last_processed: DateTime<Utc>,
    pub keywords_synced: bool,
    pub update_field: TagField,
}

impl ProcessingRecord {
    pub fn synced(
        rating_key: impl Into<String>,
        title: impl Into<String>,
        tmdb_id: impl Into<String>,
        field: TagField,
    ) -> Self {
        Self {
            rating_key: rating_key.into(),
            title: title.into(),
            tmdb_id: tmdb_id.into(),
            last_processed: Utc::now(),
            keywords_synced: true,
            update_field: field,
        }
    }

    /// Whether this record allows skipping the item under `field`.
    pub fn is_synced_for(&self, field: TagField) -> bool {
        self.keywords_synced && self.update_field == field
    }
}

/// Trait for processing record storage
pub trait RecordStore: Send + Sync {
    fn get(&self, rating_key: &str) -> Result<Option<ProcessingRecord>, StoreError>;

    /// Insert or replace a record, persisting immediately.
    fn set(&self, record: ProcessingRecord) -> Result<(), StoreError>;

    fn count(&self) -> Result<usize, StoreError>;

    fn all(&self) -> Result<Vec<ProcessingRecord>, StoreError>;

    /// Drop records last processed more than `max_age` ago. Returns how many
    /// were removed.
    fn cleanup(&self, max_age: chrono::Duration) -> Result<usize, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_validity_depends_on_field() {
        let record = ProcessingRecord::synced("1", "Heat", "949", TagField::Genre);
        assert!(record.is_synced_for(TagField::Genre));
        assert!(!record.is_synced_for(TagField::Label));
    }

    #[test]
    fn test_unsynced_record_is_not_valid() {
        let mut record = ProcessingRecord::synced("1", "Heat", "949", TagField::Label);
        record.keywords_synced = false;
        assert!(!record.is_synced_for(TagField::Label));
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = ProcessingRecord::synced("42", "Alien", "348", TagField::Label);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["ratingKey"], "42");
        assert_eq!(json["tmdbId"], "348");
        assert_eq!(json["keywordsSynced"], true);
        assert_eq!(json["updateField"], "label");
        assert!(json.get("lastProcessed").is_some());
    }
}
