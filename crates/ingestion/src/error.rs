use api_client::error::ApiError;
use database::DbError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("Upstream request failed: {0}")]
    Upstream(#[from] ApiError),

    #[error("Table storage operation failed: {0}")]
    Storage(#[from] DbError),
}
