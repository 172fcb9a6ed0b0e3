use crate::error::ApiError;
use async_trait::async_trait;
use core_types::{AzureDevOpsScope, FetchWindow, GitHubScope};
use serde_json::Value;

mod auth;
pub mod azure_devops;
pub mod error;
pub mod github;
mod http;
pub mod responses;

// --- Public API ---
pub use auth::BasicCredentials;
pub use azure_devops::AzureDevOpsClient;
pub use github::GitHubClient;
pub use http::RequestSpec;
pub use responses::{AzureDevOpsList, GitHubWorkflowRuns};

/// Read access to Azure DevOps build and pull request history.
///
/// Records come back as raw JSON, in upstream order, already limited to the
/// window and item cap. Ingestion stores them verbatim. The trait is the seam
/// tests replace with a mock.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AzureDevOpsApi: Send + Sync {
    /// Builds of the scope's definition on its branch.
    async fn fetch_builds(&self, scope: &AzureDevOpsScope, window: FetchWindow) -> Result<Vec<Value>, ApiError>;

    /// Pull requests of the scope's repository, in any state.
    async fn fetch_pull_requests(&self, scope: &AzureDevOpsScope, window: FetchWindow) -> Result<Vec<Value>, ApiError>;

    /// Commits of one pull request.
    async fn fetch_pull_request_commits(
        &self,
        scope: &AzureDevOpsScope,
        pull_request_id: &str,
    ) -> Result<Vec<Value>, ApiError>;
}

/// Read access to GitHub Actions runs and pull request history.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// Runs of the scope's workflow on its branch.
    async fn fetch_runs(&self, scope: &GitHubScope, window: FetchWindow) -> Result<Vec<Value>, ApiError>;

    async fn fetch_pull_requests(&self, scope: &GitHubScope, window: FetchWindow) -> Result<Vec<Value>, ApiError>;

    async fn fetch_pull_request_commits(&self, scope: &GitHubScope, pull_number: &str) -> Result<Vec<Value>, ApiError>;
}
