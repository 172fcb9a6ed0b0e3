//! # Ingestion
//!
//! Pulls build, pull request and commit history from Azure DevOps and GitHub
//! and stores each final-state record exactly once.
//!
//! Every routine follows the same steps: fetch through the upstream API
//! trait, parse each record into its typed view, drop records that are not
//! final yet, then `upsert_if_absent` the raw JSON under a derived key. The
//! routine returns how many rows were actually added, so running it twice
//! against an unchanged upstream adds nothing the second time.

pub mod azure_devops;
pub mod error;
mod ingest;
pub mod github;
pub mod summary;

pub use azure_devops::AzureDevOpsIngestion;
pub use error::IngestionError;
pub use github::GitHubIngestion;
pub use ingest::SourceStores;
pub use summary::SyncSummary;
