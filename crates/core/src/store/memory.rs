use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;

use super::{ProcessingRecord, RecordStore, StoreError};

/// Non-persistent record store, alive for the lifetime of the process.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, ProcessingRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, rating_key: &str) -> Result<Option<ProcessingRecord>, StoreError> {
        let records = self.records.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(records.get(rating_key).cloned())
    }

    fn set(&self, record: ProcessingRecord) -> Result<(), StoreError> {
        let mut records = self.records.lock().map_err(|_| StoreError::LockPoisoned)?;
        records.insert(record.rating_key.clone(), record);
        Ok(())
    }

    fn count(&self) -> Result<usize, StoreError> {
        let records = self.records.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(records.len())
    }

    fn all(&self) -> Result<Vec<ProcessingRecord>, StoreError> {
        let records = self.records.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(records.values().cloned().collect())
    }

    fn cleanup(&self, max_age: chrono::Duration) -> Result<usize, StoreError> {
        let cutoff = Utc::now() - max_age;
        let mut records = self.records.lock().map_err(|_| StoreError::LockPoisoned)?;
        let before = records.len();
        records.retain(|_, r| r.last_processed >= cutoff);
        Ok(before - records.len())
    }
}
