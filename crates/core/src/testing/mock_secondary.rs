//! Mock secondary catalog for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::secondary::{SecondaryCatalog, SecondaryCatalogError, SecondaryEntry, SystemStatus};

/// Mock implementation of the SecondaryCatalog trait.
#[derive(Debug)]
pub struct MockSecondaryCatalog {
    name: String,
    entries: Arc<RwLock<Vec<SecondaryEntry>>>,
    entries_calls: Arc<RwLock<usize>>,
    /// When set, every call fails.
    fail: Arc<RwLock<bool>>,
}

impl MockSecondaryCatalog {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: Arc::new(RwLock::new(Vec::new())),
            entries_calls: Arc::new(RwLock::new(0)),
            fail: Arc::new(RwLock::new(false)),
        }
    }

    pub async fn set_entries(&self, entries: Vec<SecondaryEntry>) {
        *self.entries.write().await = entries;
    }

    pub async fn set_fail(&self, fail: bool) {
        *self.fail.write().await = fail;
    }

    /// How many times the inventory was fetched.
    pub async fn entries_calls(&self) -> usize {
        *self.entries_calls.read().await
    }

    async fn check(&self) -> Result<(), SecondaryCatalogError> {
        if *self.fail.read().await {
            return Err(SecondaryCatalogError::ApiError {
                service: self.name.clone(),
                status: 500,
                message: "database is locked".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SecondaryCatalog for MockSecondaryCatalog {
    fn name(&self) -> &str {
        &self.name
    }

    async fn entries(&self) -> Result<Vec<SecondaryEntry>, SecondaryCatalogError> {
        *self.entries_calls.write().await += 1;
        self.check().await?;
        Ok(self.entries.read().await.clone())
    }

    async fn system_status(&self) -> Result<SystemStatus, SecondaryCatalogError> {
        self.check().await?;
        Ok(SystemStatus {
            app_name: self.name.clone(),
            version: "mock".to_string(),
        })
    }
}
