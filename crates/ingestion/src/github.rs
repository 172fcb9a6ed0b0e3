use crate::error::IngestionError;
use crate::ingest::{SourceStores, store_new_records};
use crate::summary::SyncSummary;
use api_client::GitHubApi;
use core_types::{FetchWindow, GitHubActionsRun, GitHubPullRequest, GitHubPullRequestCommit, GitHubScope};
use database::keys;
use futures::future::join_all;
use std::sync::Arc;

/// Copies GitHub Actions runs, pull requests and pull request commits into
/// the table store.
#[derive(Clone)]
pub struct GitHubIngestion {
    api: Arc<dyn GitHubApi>,
    stores: SourceStores,
}

impl GitHubIngestion {
    pub fn new(api: Arc<dyn GitHubApi>, stores: SourceStores) -> Self {
        Self { api, stores }
    }

    #[tracing::instrument(
        name = "github_sync_runs",
        skip(self, scope),
        fields(owner = %scope.owner, repo = %scope.repo, workflow = %scope.workflow_name)
    )]
    pub async fn sync_runs(&self, scope: &GitHubScope, window: FetchWindow) -> Result<usize, IngestionError> {
        let records = self.api.fetch_runs(scope, window).await?;
        let partition_key = keys::github_run_partition_key(&scope.owner, &scope.repo, &scope.workflow_name);
        let items_added =
            store_new_records::<GitHubActionsRun>(&self.stores.builds, &partition_key, records).await?;
        tracing::info!(items_added, "GitHub Actions runs synced.");
        Ok(items_added)
    }

    #[tracing::instrument(
        name = "github_sync_pull_requests",
        skip(self, scope),
        fields(owner = %scope.owner, repo = %scope.repo)
    )]
    pub async fn sync_pull_requests(&self, scope: &GitHubScope, window: FetchWindow) -> Result<usize, IngestionError> {
        let records = self.api.fetch_pull_requests(scope, window).await?;
        let partition_key = keys::github_pull_request_partition_key(&scope.owner, &scope.repo);
        let items_added =
            store_new_records::<GitHubPullRequest>(&self.stores.pull_requests, &partition_key, records).await?;
        tracing::info!(items_added, "GitHub pull requests synced.");
        Ok(items_added)
    }

    #[tracing::instrument(
        name = "github_sync_pull_request_commits",
        skip(self, scope),
        fields(owner = %scope.owner, repo = %scope.repo)
    )]
    pub async fn sync_pull_request_commits(
        &self,
        scope: &GitHubScope,
        pull_number: &str,
    ) -> Result<usize, IngestionError> {
        let records = self.api.fetch_pull_request_commits(scope, pull_number).await?;
        let partition_key = keys::github_pull_request_commit_partition_key(&scope.owner, &scope.repo);
        let items_added = store_new_records::<GitHubPullRequestCommit>(
            &self.stores.pull_request_commits,
            &partition_key,
            records,
        )
        .await?;
        tracing::debug!(items_added, "GitHub pull request commits synced.");
        Ok(items_added)
    }

    /// Syncs runs and pull requests, then the commits of the most recent
    /// stored pull requests (at most `window.max_number_of_items`).
    pub async fn sync_all(&self, scope: &GitHubScope, window: FetchWindow) -> Result<SyncSummary, IngestionError> {
        let builds_added = self.sync_runs(scope, window).await?;
        let pull_requests_added = self.sync_pull_requests(scope, window).await?;

        let partition_key = keys::github_pull_request_partition_key(&scope.owner, &scope.repo);
        let mut pull_requests: Vec<GitHubPullRequest> =
            self.stores.pull_requests.list_records(&partition_key).await?;
        pull_requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        pull_requests.truncate(window.max_number_of_items as usize);

        let numbers: Vec<String> = pull_requests.iter().map(|pr| pr.number.to_string()).collect();
        let results = join_all(numbers.iter().map(|n| self.sync_pull_request_commits(scope, n))).await;
        let pull_request_commits_added = results.into_iter().sum::<Result<usize, _>>()?;

        let summary = SyncSummary {
            builds_added,
            pull_requests_added,
            pull_request_commits_added,
        };
        tracing::info!(workflow = %scope.workflow_name, %summary, "GitHub sync finished.");
        Ok(summary)
    }
}
