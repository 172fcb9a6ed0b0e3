use crate::error::DbError;
use async_trait::async_trait;
use core_types::StoredEvent;

/// Raw access to a partitioned key-value table store.
///
/// Keys arrive here already encoded; implementations store and compare them
/// verbatim. `table` names the logical table a row belongs to.
#[async_trait]
pub trait TableBackend: Send + Sync {
    /// Point lookup. A missing row is `Ok(None)`.
    async fn get(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
    ) -> Result<Option<StoredEvent>, DbError>;

    /// Every row in a partition, ordered by row key ascending.
    async fn list(&self, table: &str, partition_key: &str) -> Result<Vec<StoredEvent>, DbError>;

    /// Writes the row only if no row with the same keys exists.
    /// Returns whether a row was written.
    async fn insert_if_absent(&self, table: &str, event: &StoredEvent) -> Result<bool, DbError>;

    /// Writes the row, replacing the payload of any existing row with the same keys.
    async fn insert_or_merge(&self, table: &str, event: &StoredEvent) -> Result<(), DbError>;
}
