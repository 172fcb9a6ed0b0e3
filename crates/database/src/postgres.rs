use crate::backend::TableBackend;
use crate::error::DbError;
use async_trait::async_trait;
use core_types::StoredEvent;
use sqlx::postgres::PgPool;

/// `TableBackend` over a single Postgres table, `table_rows`, keyed by
/// `(table_name, partition_key, row_key)`.
#[derive(Debug, Clone)]
pub struct PgTableBackend {
    pool: PgPool,
}

impl PgTableBackend {
    /// Creates a new `PgTableBackend` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TableBackend for PgTableBackend {
    async fn get(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
    ) -> Result<Option<StoredEvent>, DbError> {
        let row = sqlx::query_as::<_, StoredEvent>(
            r#"
            SELECT partition_key, row_key, data
            FROM table_rows
            WHERE table_name = $1 AND partition_key = $2 AND row_key = $3
            "#,
        )
        .bind(table)
        .bind(partition_key)
        .bind(row_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list(&self, table: &str, partition_key: &str) -> Result<Vec<StoredEvent>, DbError> {
        let rows = sqlx::query_as::<_, StoredEvent>(
            r#"
            SELECT partition_key, row_key, data
            FROM table_rows
            WHERE table_name = $1 AND partition_key = $2
            ORDER BY row_key ASC
            "#,
        )
        .bind(table)
        .bind(partition_key)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Uses `ON CONFLICT DO NOTHING`, so concurrent writers racing on the
    /// same key see exactly one `true`.
    async fn insert_if_absent(&self, table: &str, event: &StoredEvent) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            INSERT INTO table_rows (table_name, partition_key, row_key, data)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (table_name, partition_key, row_key) DO NOTHING
            "#,
        )
        .bind(table)
        .bind(&event.partition_key)
        .bind(&event.row_key)
        .bind(&event.payload)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn insert_or_merge(&self, table: &str, event: &StoredEvent) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO table_rows (table_name, partition_key, row_key, data)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (table_name, partition_key, row_key)
            DO UPDATE SET data = EXCLUDED.data, updated_at = NOW()
            "#,
        )
        .bind(table)
        .bind(&event.partition_key)
        .bind(&event.row_key)
        .bind(&event.payload)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
