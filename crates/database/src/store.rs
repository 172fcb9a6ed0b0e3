use crate::backend::TableBackend;
use crate::error::DbError;
use crate::keys::encode_key;
use core_types::StoredEvent;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Access to one logical table of stored events.
///
/// Every read and write encodes the partition key the same way, so a row
/// written through an `EventStore` is always found again through one.
#[derive(Clone)]
pub struct EventStore {
    backend: Arc<dyn TableBackend>,
    table_name: String,
}

impl EventStore {
    pub fn new(backend: Arc<dyn TableBackend>, table_name: impl Into<String>) -> Self {
        Self {
            backend,
            table_name: table_name.into(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Point lookup; `Ok(None)` when the row does not exist.
    pub async fn get(&self, partition_key: &str, row_key: &str) -> Result<Option<StoredEvent>, DbError> {
        self.backend
            .get(&self.table_name, &encode_key(partition_key), row_key)
            .await
    }

    /// All rows of a partition, ordered by row key.
    pub async fn list(&self, partition_key: &str) -> Result<Vec<StoredEvent>, DbError> {
        self.backend
            .list(&self.table_name, &encode_key(partition_key))
            .await
    }

    /// Lists a partition and parses each payload into `T`.
    ///
    /// Rows whose payload does not parse are logged and left out.
    pub async fn list_records<T: DeserializeOwned>(&self, partition_key: &str) -> Result<Vec<T>, DbError> {
        let rows = self.list(partition_key).await?;
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            match serde_json::from_str::<T>(&row.payload) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(
                        table = %self.table_name,
                        partition_key = %row.partition_key,
                        row_key = %row.row_key,
                        error = %e,
                        "Skipping stored row with an unreadable payload."
                    );
                }
            }
        }
        Ok(records)
    }

    /// Inserts the event unless a row with the same keys already exists.
    ///
    /// Returns `true` when a row was written. With `force_overwrite` the
    /// event is written unconditionally and the result is always `true`.
    /// The existence check and the write are a single conditional insert on
    /// the backend, so two callers racing on one key cannot both get `true`.
    pub async fn upsert_if_absent(&self, event: &StoredEvent, force_overwrite: bool) -> Result<bool, DbError> {
        let encoded = self.encoded(event);
        if force_overwrite {
            self.backend.insert_or_merge(&self.table_name, &encoded).await?;
            return Ok(true);
        }

        let inserted = self.backend.insert_if_absent(&self.table_name, &encoded).await?;
        tracing::debug!(
            table = %self.table_name,
            partition_key = %encoded.partition_key,
            row_key = %encoded.row_key,
            inserted,
            "Conditional insert finished."
        );
        Ok(inserted)
    }

    /// Unconditional insert-or-merge.
    pub async fn save(&self, event: &StoredEvent) -> Result<bool, DbError> {
        self.backend
            .insert_or_merge(&self.table_name, &self.encoded(event))
            .await?;
        Ok(true)
    }

    fn encoded(&self, event: &StoredEvent) -> StoredEvent {
        StoredEvent {
            partition_key: encode_key(&event.partition_key),
            row_key: event.row_key.clone(),
            payload: event.payload.clone(),
        }
    }
}
