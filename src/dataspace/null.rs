//! Null Datasource
//!
//! Backend that stores nothing and deletes nothing.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::dataspace::DataSource;

/// Module selector for [`NullDataSource`].
pub const NULL_MODULE: &str = "dataspace.datasources.null";
/// Name selector for [`NullDataSource`].
pub const NULL_NAME: &str = "NullDataSource";

// == Null DataSource ==
/// Accepts any configuration and reports zero deletions.
#[derive(Debug, Clone, Default)]
pub struct NullDataSource {
    config: Value,
}

impl NullDataSource {
    /// Creates a null datasource holding its (unused) configuration.
    pub fn new(config: Value) -> Self {
        Self { config }
    }

    /// Returns the configuration it was built from.
    pub fn config(&self) -> &Value {
        &self.config
    }
}

#[async_trait]
impl DataSource for NullDataSource {
    async fn delete_data_older_than(&self, days: u64) -> anyhow::Result<u64> {
        debug!("Null datasource asked to delete records older than {} days", days);
        Ok(0)
    }
}
