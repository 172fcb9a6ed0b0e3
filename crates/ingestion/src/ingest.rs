use crate::error::IngestionError;
use core_types::{StoredEvent, UpstreamRecord};
use database::EventStore;
use serde::Deserialize;
use serde_json::Value;

/// The stores one platform's records are written to.
#[derive(Clone)]
pub struct SourceStores {
    /// Builds or workflow runs.
    pub builds: EventStore,
    pub pull_requests: EventStore,
    pub pull_request_commits: EventStore,
}

/// Stores every terminal record not already present and returns how many
/// rows were added.
///
/// Records are handled in upstream order. One that does not parse as `T` is
/// logged and skipped; a storage failure aborts the batch.
pub(crate) async fn store_new_records<T: UpstreamRecord>(
    store: &EventStore,
    partition_key: &str,
    records: Vec<Value>,
) -> Result<usize, IngestionError> {
    let mut items_added = 0;

    for raw in records {
        let record = match T::deserialize(&raw) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(
                    kind = T::KIND,
                    partition_key = %partition_key,
                    error = %e,
                    "Skipping upstream record that does not parse."
                );
                continue;
            }
        };

        let row_key = record.row_key();
        if !record.is_terminal() {
            tracing::debug!(kind = T::KIND, row_key = %row_key, "Skipping record that is not final yet.");
            continue;
        }

        let event = StoredEvent::new(partition_key, row_key, raw.to_string());
        if store.upsert_if_absent(&event, false).await? {
            items_added += 1;
            tracing::debug!(kind = T::KIND, row_key = %event.row_key, "Stored new record.");
        }
    }

    Ok(items_added)
}
