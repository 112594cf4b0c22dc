//! Memory Datasource
//!
//! In-process record store, handy for local runs and tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::dataspace::DataSource;

/// Module selector for [`MemoryDataSource`].
pub const MEMORY_MODULE: &str = "dataspace.datasources.memory";
/// Name selector for [`MemoryDataSource`].
pub const MEMORY_NAME: &str = "MemoryDataSource";

// == Record ==
/// A single time-stamped dataspace record.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Record key
    pub key: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Record {
    /// Creates a record stamped with the current time.
    pub fn new(key: impl Into<String>) -> Self {
        Self::created_at(key, Utc::now())
    }

    /// Creates a record with an explicit timestamp.
    pub fn created_at(key: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            created_at,
        }
    }
}

// == Memory DataSource ==
/// Keeps records in memory and removes the aged ones on request.
#[derive(Debug, Default)]
pub struct MemoryDataSource {
    records: RwLock<Vec<Record>>,
}

impl MemoryDataSource {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from its (currently unused) datasource configuration.
    pub fn from_config(_config: &Value) -> Self {
        Self::new()
    }

    /// Adds a record.
    pub async fn insert(&self, record: Record) {
        self.records.write().await.push(record);
    }

    /// Returns the number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns true if no records are stored.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Returns a copy of the stored keys, oldest first.
    pub async fn keys(&self) -> Vec<String> {
        let records = self.records.read().await;
        let mut sorted: Vec<&Record> = records.iter().collect();
        sorted.sort_by_key(|r| r.created_at);
        sorted.into_iter().map(|r| r.key.clone()).collect()
    }
}

#[async_trait]
impl DataSource for MemoryDataSource {
    async fn delete_data_older_than(&self, days: u64) -> anyhow::Result<u64> {
        let cutoff = i64::try_from(days)
            .ok()
            .and_then(ChronoDuration::try_days)
            .and_then(|age| Utc::now().checked_sub_signed(age))
            .ok_or_else(|| anyhow::anyhow!("retention of {} days is out of range", days))?;

        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|record| record.created_at >= cutoff);
        let removed = (before - records.len()) as u64;

        debug!("Memory datasource removed {} records older than {}", removed, cutoff);
        Ok(removed)
    }
}
