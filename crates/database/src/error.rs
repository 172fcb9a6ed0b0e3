use thiserror::Error;

/// Failures of the table store. A missing row is `Ok(None)`, never an error.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Table store is not configured: {0}")]
    ConnectionConfigError(String),

    #[error("Table store query failed: {0}")]
    QueryError(#[from] sqlx::Error),

    #[error("Table store migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Stored payload is not valid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}
