use crate::auth::BasicCredentials;
use crate::error::ApiError;
use crate::http::{RequestSpec, get_json, retain_window};
use crate::responses::AzureDevOpsList;
use crate::AzureDevOpsApi;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use core_types::{AzureDevOpsScope, FetchWindow};
use serde_json::Value;

pub const AZURE_DEVOPS_BASE_URL: &str = "https://dev.azure.com";
const API_VERSION: &str = "5.1";

/// `AzureDevOpsApi` over the Azure DevOps REST API, authenticated with a PAT.
#[derive(Clone)]
pub struct AzureDevOpsClient {
    client: reqwest::Client,
    base_url: String,
    credentials: BasicCredentials,
}

impl AzureDevOpsClient {
    pub fn new(pat_token: &str) -> Result<Self, ApiError> {
        Ok(Self {
            client: reqwest::Client::builder().build()?,
            base_url: AZURE_DEVOPS_BASE_URL.to_string(),
            credentials: BasicCredentials::personal_access_token(pat_token)?,
        })
    }

    /// Points the client at another host, e.g. an on-premises server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Completed-or-not builds of one definition on one branch, newest first.
pub fn builds_request(
    base_url: &str,
    scope: &AzureDevOpsScope,
    window: FetchWindow,
    now: DateTime<Utc>,
) -> RequestSpec {
    RequestSpec::new(format!(
        "{}/{}/{}/_apis/build/builds",
        base_url, scope.organization, scope.project
    ))
    .param("api-version", API_VERSION)
    .param("definitions", scope.build_id.as_str())
    .param("branchName", scope.branch.as_str())
    .param(
        "minTime",
        window.start(now).to_rfc3339_opts(SecondsFormat::Secs, true),
    )
    .param("$top", window.max_number_of_items.to_string())
    .param("queryOrder", "finishTimeDescending")
}

pub fn pull_requests_request(base_url: &str, scope: &AzureDevOpsScope, window: FetchWindow) -> RequestSpec {
    RequestSpec::new(format!(
        "{}/{}/{}/_apis/git/repositories/{}/pullrequests",
        base_url, scope.organization, scope.project, scope.repository
    ))
    .param("api-version", API_VERSION)
    .param("searchCriteria.status", "all")
    .param("$top", window.max_number_of_items.to_string())
}

pub fn pull_request_commits_request(
    base_url: &str,
    scope: &AzureDevOpsScope,
    pull_request_id: &str,
) -> RequestSpec {
    RequestSpec::new(format!(
        "{}/{}/{}/_apis/git/repositories/{}/pullRequests/{}/commits",
        base_url, scope.organization, scope.project, scope.repository, pull_request_id
    ))
    .param("api-version", API_VERSION)
}

#[async_trait]
impl AzureDevOpsApi for AzureDevOpsClient {
    async fn fetch_builds(&self, scope: &AzureDevOpsScope, window: FetchWindow) -> Result<Vec<Value>, ApiError> {
        let req = builds_request(&self.base_url, scope, window, Utc::now());
        let list: AzureDevOpsList = get_json(&self.client, &self.credentials, &req).await?;
        let mut builds = list.value;
        builds.truncate(window.max_number_of_items as usize);
        Ok(builds)
    }

    async fn fetch_pull_requests(
        &self,
        scope: &AzureDevOpsScope,
        window: FetchWindow,
    ) -> Result<Vec<Value>, ApiError> {
        let req = pull_requests_request(&self.base_url, scope, window);
        let list: AzureDevOpsList = get_json(&self.client, &self.credentials, &req).await?;
        // The pull request endpoint has no time filter.
        Ok(retain_window(
            list.value,
            &["closedDate", "creationDate"],
            window.start(Utc::now()),
            window.max_number_of_items,
        ))
    }

    async fn fetch_pull_request_commits(
        &self,
        scope: &AzureDevOpsScope,
        pull_request_id: &str,
    ) -> Result<Vec<Value>, ApiError> {
        let req = pull_request_commits_request(&self.base_url, scope, pull_request_id);
        let list: AzureDevOpsList = get_json(&self.client, &self.credentials, &req).await?;
        Ok(list.value)
    }
}
