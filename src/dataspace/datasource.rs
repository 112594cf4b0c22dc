//! Datasource Module
//!
//! The storage capability the reaper purges through.

use async_trait::async_trait;

// == DataSource Trait ==
/// A dataspace backend able to drop aged records.
///
/// Implementations may block for a long time (remote stores) and may fail
/// with any error; the reaper treats every failure as a failed cycle.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Deletes every record older than `days` days.
    ///
    /// Returns the number of records removed.
    async fn delete_data_older_than(&self, days: u64) -> anyhow::Result<u64>;
}

#[async_trait]
impl<T: DataSource + ?Sized> DataSource for Box<T> {
    async fn delete_data_older_than(&self, days: u64) -> anyhow::Result<u64> {
        (**self).delete_data_older_than(days).await
    }
}

#[async_trait]
impl<T: DataSource + ?Sized> DataSource for std::sync::Arc<T> {
    async fn delete_data_older_than(&self, days: u64) -> anyhow::Result<u64> {
        (**self).delete_data_older_than(days).await
    }
}
