use crate::backend::TableBackend;
use crate::error::DbError;
use async_trait::async_trait;
use core_types::StoredEvent;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Rows = BTreeMap<(String, String, String), String>;

/// In-memory `TableBackend`, used for dry runs and tests.
///
/// Rows are keyed by `(table, partition_key, row_key)` in a `BTreeMap`, so a
/// partition scan comes back ordered by row key like the Postgres backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryTableBackend {
    rows: Arc<Mutex<Rows>>,
}

impl MemoryTableBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows stored in one partition of one table.
    pub fn row_count(&self, table: &str, partition_key: &str) -> usize {
        self.rows()
            .keys()
            .filter(|(t, p, _)| t == table && p == partition_key)
            .count()
    }

    /// Total number of rows across every table.
    pub fn len(&self) -> usize {
        self.rows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows().is_empty()
    }

    fn rows(&self) -> MutexGuard<'_, Rows> {
        // No operation leaves the map half-written, so a poisoned lock is still usable.
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn key(table: &str, event: &StoredEvent) -> (String, String, String) {
        (
            table.to_string(),
            event.partition_key.clone(),
            event.row_key.clone(),
        )
    }
}

#[async_trait]
impl TableBackend for MemoryTableBackend {
    async fn get(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
    ) -> Result<Option<StoredEvent>, DbError> {
        let key = (table.to_string(), partition_key.to_string(), row_key.to_string());
        Ok(self
            .rows()
            .get(&key)
            .map(|payload| StoredEvent::new(partition_key, row_key, payload.clone())))
    }

    async fn list(&self, table: &str, partition_key: &str) -> Result<Vec<StoredEvent>, DbError> {
        Ok(self
            .rows()
            .iter()
            .filter(|((t, p, _), _)| t == table && p == partition_key)
            .map(|((_, p, r), payload)| StoredEvent::new(p.clone(), r.clone(), payload.clone()))
            .collect())
    }

    async fn insert_if_absent(&self, table: &str, event: &StoredEvent) -> Result<bool, DbError> {
        let mut rows = self.rows();
        let key = Self::key(table, event);
        if rows.contains_key(&key) {
            return Ok(false);
        }
        rows.insert(key, event.payload.clone());
        Ok(true)
    }

    async fn insert_or_merge(&self, table: &str, event: &StoredEvent) -> Result<(), DbError> {
        self.rows()
            .insert(Self::key(table, event), event.payload.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tables_are_isolated() {
        let backend = MemoryTableBackend::new();
        let event = StoredEvent::new("p", "1", "{}");

        assert!(backend.insert_if_absent("builds", &event).await.unwrap());
        assert!(backend.insert_if_absent("runs", &event).await.unwrap());
        assert!(!backend.insert_if_absent("builds", &event).await.unwrap());
        assert_eq!(backend.len(), 2);
        assert!(backend.get("prs", "p", "1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_is_ordered_by_row_key() {
        let backend = MemoryTableBackend::new();
        for row in ["b", "c", "a"] {
            backend
                .insert_or_merge("t", &StoredEvent::new("p", row, "{}"))
                .await
                .unwrap();
        }
        backend
            .insert_or_merge("t", &StoredEvent::new("other", "0", "{}"))
            .await
            .unwrap();

        let rows: Vec<String> = backend
            .list("t", "p")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.row_key)
            .collect();
        assert_eq!(rows, vec!["a", "b", "c"]);
        assert_eq!(backend.row_count("t", "other"), 1);
    }
}
