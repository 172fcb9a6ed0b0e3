use analytics::AnalyticsError;
use database::DbError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("Failed to read stored events: {0}")]
    Storage(#[from] DbError),

    #[error("Metric calculation failed: {0}")]
    Analytics(#[from] AnalyticsError),
}
