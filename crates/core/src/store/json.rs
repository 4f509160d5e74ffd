use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use tracing::{debug, info};

use super::{ProcessingRecord, RecordStore, StoreError};

const FILE_NAME: &str = "processed_items.json";

/// Record store backed by a single JSON document in the data directory.
///
/// The whole map is rewritten on every change: serialized to a temporary
/// sibling, then renamed over the previous file.
pub struct JsonFileStore {
    path: PathBuf,
    records: Mutex<HashMap<String, ProcessingRecord>>,
}

impl JsonFileStore {
    /// Open (or create) the store under `data_dir`.
    pub fn open(data_dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(data_dir)?;
        let path = data_dir.join(FILE_NAME);

        let records = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str(&raw).map_err(|e| {
                    StoreError::Serialization(format!("{}: {}", path.display(), e))
                })?
            }
        } else {
            HashMap::new()
        };

        info!("Loaded {} processing records from {:?}", records.len(), path);

        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, ProcessingRecord>>, StoreError> {
        self.records.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn persist(&self, records: &HashMap<String, ProcessingRecord>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(records)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        debug!("Saved {} processing records", records.len());
        Ok(())
    }
}

impl RecordStore for JsonFileStore {
    fn get(&self, rating_key: &str) -> Result<Option<ProcessingRecord>, StoreError> {
        Ok(self.lock()?.get(rating_key).cloned())
    }

    fn set(&self, record: ProcessingRecord) -> Result<(), StoreError> {
        let mut records = self.lock()?;
        let key = record.rating_key.clone();
        let previous = records.insert(key.clone(), record);

        if let Err(e) = self.persist(&records) {
            // Keep memory consistent with disk so the item is retried.
            match previous {
                Some(previous) => records.insert(key, previous),
                None => records.remove(&key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.len())
    }

    fn all(&self) -> Result<Vec<ProcessingRecord>, StoreError> {
        Ok(self.lock()?.values().cloned().collect())
    }

    fn cleanup(&self, max_age: chrono::Duration) -> Result<usize, StoreError> {
        let cutoff = Utc::now() - max_age;
        let mut records = self.lock()?;

        let before = records.len();
        let snapshot = records.clone();
        records.retain(|_, r| r.last_processed >= cutoff);
        let removed = before - records.len();

        if removed > 0 {
            if let Err(e) = self.persist(&records) {
                *records = snapshot;
                return Err(e);
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::TagField;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_directory() {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().join("nested/data");
        let store = JsonFileStore::open(&data_dir).unwrap();
        assert!(data_dir.is_dir());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_set_persists_immediately() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        store
            .set(ProcessingRecord::synced("42", "Alien", "348", TagField::Label))
            .unwrap();

        assert!(store.path().exists());
        assert!(!dir.path().join("processed_items.json.tmp").exists());

        let reopened = JsonFileStore::open(dir.path()).unwrap();
        let record = reopened.get("42").unwrap().unwrap();
        assert_eq!(record.title, "Alien");
        assert_eq!(record.update_field, TagField::Label);
    }

    #[test]
    fn test_set_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        store
            .set(ProcessingRecord::synced("1", "A", "10", TagField::Label))
            .unwrap();
        store
            .set(ProcessingRecord::synced("1", "A", "10", TagField::Genre))
            .unwrap();
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.get("1").unwrap().unwrap().update_field, TagField::Genre);
    }

    #[test]
    fn test_open_rejects_corrupt_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(FILE_NAME), "{not json").unwrap();
        let result = JsonFileStore::open(dir.path());
        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }

    #[test]
    fn test_open_reads_existing_document() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(FILE_NAME),
            r#"{"7":{"ratingKey":"7","title":"Heat","tmdbId":"949","lastProcessed":"2024-03-01T10:00:00Z","keywordsSynced":true,"updateField":"genre"}}"#,
        )
        .unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        let record = store.get("7").unwrap().unwrap();
        assert!(record.is_synced_for(TagField::Genre));
    }

    #[test]
    fn test_cleanup_removes_old_records() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();

        let mut old = ProcessingRecord::synced("old", "Old", "1", TagField::Label);
        old.last_processed = Utc::now() - chrono::Duration::days(40);
        store.set(old).unwrap();
        store
            .set(ProcessingRecord::synced("new", "New", "2", TagField::Label))
            .unwrap();

        let removed = store.cleanup(chrono::Duration::days(30)).unwrap();
        assert_eq!(removed, 1);
        assert!(store.get("old").unwrap().is_none());

        let reopened = JsonFileStore::open(dir.path()).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
    }

    #[test]
    fn test_failed_write_is_not_remembered() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        // A directory where the temp file should go makes the write fail.
        fs::create_dir(dir.path().join("processed_items.json.tmp")).unwrap();

        let result = store.set(ProcessingRecord::synced("9", "X", "1", TagField::Label));
        assert!(result.is_err());
        assert!(store.get("9").unwrap().is_none());
    }
}
