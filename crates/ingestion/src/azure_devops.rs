use crate::error::IngestionError;
use crate::ingest::{SourceStores, store_new_records};
use crate::summary::SyncSummary;
use api_client::AzureDevOpsApi;
use core_types::{
    AzureDevOpsBuild, AzureDevOpsPullRequest, AzureDevOpsPullRequestCommit, AzureDevOpsScope,
    FetchWindow,
};
use database::keys;
use futures::future::join_all;
use std::sync::Arc;

/// Copies Azure DevOps builds, pull requests and pull request commits into
/// the table store.
#[derive(Clone)]
pub struct AzureDevOpsIngestion {
    api: Arc<dyn AzureDevOpsApi>,
    stores: SourceStores,
}

impl AzureDevOpsIngestion {
    pub fn new(api: Arc<dyn AzureDevOpsApi>, stores: SourceStores) -> Self {
        Self { api, stores }
    }

    /// Stores completed builds not seen before. Returns the number added.
    #[tracing::instrument(
        name = "azure_devops_sync_builds",
        skip(self, scope),
        fields(organization = %scope.organization, project = %scope.project, build = %scope.build_name)
    )]
    pub async fn sync_builds(&self, scope: &AzureDevOpsScope, window: FetchWindow) -> Result<usize, IngestionError> {
        let records = self.api.fetch_builds(scope, window).await?;
        let partition_key =
            keys::azure_devops_build_partition_key(&scope.organization, &scope.project, &scope.build_name);
        let items_added =
            store_new_records::<AzureDevOpsBuild>(&self.stores.builds, &partition_key, records).await?;
        tracing::info!(items_added, "Azure DevOps builds synced.");
        Ok(items_added)
    }

    /// Stores completed or abandoned pull requests not seen before.
    #[tracing::instrument(
        name = "azure_devops_sync_pull_requests",
        skip(self, scope),
        fields(organization = %scope.organization, project = %scope.project, repository = %scope.repository)
    )]
    pub async fn sync_pull_requests(
        &self,
        scope: &AzureDevOpsScope,
        window: FetchWindow,
    ) -> Result<usize, IngestionError> {
        let records = self.api.fetch_pull_requests(scope, window).await?;
        let partition_key = keys::azure_devops_pull_request_partition_key(&scope.organization, &scope.project);
        let items_added =
            store_new_records::<AzureDevOpsPullRequest>(&self.stores.pull_requests, &partition_key, records)
                .await?;
        tracing::info!(items_added, "Azure DevOps pull requests synced.");
        Ok(items_added)
    }

    /// Stores the commits of one pull request not seen before.
    #[tracing::instrument(
        name = "azure_devops_sync_pull_request_commits",
        skip(self, scope),
        fields(organization = %scope.organization, project = %scope.project)
    )]
    pub async fn sync_pull_request_commits(
        &self,
        scope: &AzureDevOpsScope,
        pull_request_id: &str,
    ) -> Result<usize, IngestionError> {
        let records = self
            .api
            .fetch_pull_request_commits(scope, pull_request_id)
            .await?;
        let partition_key =
            keys::azure_devops_pull_request_commit_partition_key(&scope.organization, &scope.project);
        let items_added = store_new_records::<AzureDevOpsPullRequestCommit>(
            &self.stores.pull_request_commits,
            &partition_key,
            records,
        )
        .await?;
        tracing::debug!(items_added, "Azure DevOps pull request commits synced.");
        Ok(items_added)
    }

    /// Syncs builds and pull requests, then the commits of the most recent
    /// stored pull requests of `scope.repository` (at most
    /// `window.max_number_of_items`).
    ///
    /// The pull request partition is project-wide, so stored pull requests
    /// of other repositories in the project are left out.
    pub async fn sync_all(&self, scope: &AzureDevOpsScope, window: FetchWindow) -> Result<SyncSummary, IngestionError> {
        let builds_added = self.sync_builds(scope, window).await?;
        let pull_requests_added = self.sync_pull_requests(scope, window).await?;

        let partition_key = keys::azure_devops_pull_request_partition_key(&scope.organization, &scope.project);
        let mut pull_requests: Vec<AzureDevOpsPullRequest> =
            self.stores.pull_requests.list_records(&partition_key).await?;
        pull_requests.retain(|pr| pr.targets_repository(&scope.repository));
        pull_requests.sort_by(|a, b| b.creation_date.cmp(&a.creation_date));
        pull_requests.truncate(window.max_number_of_items as usize);

        let ids: Vec<String> = pull_requests
            .iter()
            .map(|pr| pr.pull_request_id.to_string())
            .collect();
        let results = join_all(ids.iter().map(|id| self.sync_pull_request_commits(scope, id))).await;
        let pull_request_commits_added = results.into_iter().sum::<Result<usize, _>>()?;

        let summary = SyncSummary {
            builds_added,
            pull_requests_added,
            pull_request_commits_added,
        };
        tracing::info!(build = %scope.build_name, %summary, "Azure DevOps sync finished.");
        Ok(summary)
    }
}
