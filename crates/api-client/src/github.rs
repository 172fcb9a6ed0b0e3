use crate::auth::BasicCredentials;
use crate::error::ApiError;
use crate::http::{RequestSpec, get_json, retain_window};
use crate::responses::GitHubWorkflowRuns;
use crate::GitHubApi;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{FetchWindow, GitHubScope};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde_json::Value;

pub const GITHUB_BASE_URL: &str = "https://api.github.com";
const USER_AGENT: &str = "devops-metrics";
// GitHub's upper bound for `per_page`.
const MAX_PAGE_SIZE: u32 = 100;

/// `GitHubApi` over the GitHub REST API, authenticated as an OAuth app.
#[derive(Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    base_url: String,
    credentials: BasicCredentials,
}

impl GitHubClient {
    pub fn new(client_id: &str, client_secret: &str) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));

        Ok(Self {
            client: reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .default_headers(headers)
                .build()?,
            base_url: GITHUB_BASE_URL.to_string(),
            credentials: BasicCredentials::new(client_id, client_secret)?,
        })
    }

    /// Points the client at another host, e.g. GitHub Enterprise.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

fn page_size(window: FetchWindow) -> String {
    window.max_number_of_items.min(MAX_PAGE_SIZE).to_string()
}

pub fn runs_request(base_url: &str, scope: &GitHubScope, window: FetchWindow, now: DateTime<Utc>) -> RequestSpec {
    RequestSpec::new(format!(
        "{}/repos/{}/{}/actions/workflows/{}/runs",
        base_url, scope.owner, scope.repo, scope.workflow_id
    ))
    .param("branch", scope.branch.as_str())
    .param("created", format!(">={}", window.start(now).format("%Y-%m-%d")))
    .param("per_page", page_size(window))
}

pub fn pull_requests_request(base_url: &str, scope: &GitHubScope, window: FetchWindow) -> RequestSpec {
    RequestSpec::new(format!(
        "{}/repos/{}/{}/pulls",
        base_url, scope.owner, scope.repo
    ))
    .param("state", "all")
    .param("base", scope.branch.as_str())
    .param("sort", "updated")
    .param("direction", "desc")
    .param("per_page", page_size(window))
}

pub fn pull_request_commits_request(base_url: &str, scope: &GitHubScope, pull_number: &str) -> RequestSpec {
    RequestSpec::new(format!(
        "{}/repos/{}/{}/pulls/{}/commits",
        base_url, scope.owner, scope.repo, pull_number
    ))
    .param("per_page", MAX_PAGE_SIZE.to_string())
}

#[async_trait]
impl GitHubApi for GitHubClient {
    async fn fetch_runs(&self, scope: &GitHubScope, window: FetchWindow) -> Result<Vec<Value>, ApiError> {
        let req = runs_request(&self.base_url, scope, window, Utc::now());
        let runs: GitHubWorkflowRuns = get_json(&self.client, &self.credentials, &req).await?;
        let mut runs = runs.workflow_runs;
        runs.truncate(window.max_number_of_items as usize);
        Ok(runs)
    }

    async fn fetch_pull_requests(&self, scope: &GitHubScope, window: FetchWindow) -> Result<Vec<Value>, ApiError> {
        let req = pull_requests_request(&self.base_url, scope, window);
        let pulls: Vec<Value> = get_json(&self.client, &self.credentials, &req).await?;
        Ok(retain_window(
            pulls,
            &["closed_at", "created_at"],
            window.start(Utc::now()),
            window.max_number_of_items,
        ))
    }

    async fn fetch_pull_request_commits(&self, scope: &GitHubScope, pull_number: &str) -> Result<Vec<Value>, ApiError> {
        let req = pull_request_commits_request(&self.base_url, scope, pull_number);
        get_json(&self.client, &self.credentials, &req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn scope() -> GitHubScope {
        GitHubScope {
            owner: "octo".to_string(),
            repo: "app".to_string(),
            branch: "main".to_string(),
            workflow_name: "CI".to_string(),
            workflow_id: "1234".to_string(),
        }
    }

    #[test]
    fn runs_request_filters_by_branch_and_creation_date() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let window = FetchWindow::new(30, 20).unwrap();

        let req = runs_request(GITHUB_BASE_URL, &scope(), window, now);

        assert_eq!(
            req.url,
            "https://api.github.com/repos/octo/app/actions/workflows/1234/runs"
        );
        assert_eq!(req.get("branch"), Some("main"));
        assert_eq!(req.get("created"), Some(">=2024-02-09"));
        assert_eq!(req.get("per_page"), Some("20"));
    }

    #[test]
    fn page_size_is_capped() {
        let window = FetchWindow::new(30, 500).unwrap();
        let req = pull_requests_request(GITHUB_BASE_URL, &scope(), window);
        assert_eq!(req.get("per_page"), Some("100"));
        assert_eq!(req.get("state"), Some("all"));
    }

    #[test]
    fn commits_request_targets_the_pull_request() {
        let req = pull_request_commits_request("http://localhost:9000", &scope(), "7");
        assert_eq!(req.url, "http://localhost:9000/repos/octo/app/pulls/7/commits");
    }

    #[test]
    fn client_requires_a_secret() {
        assert!(GitHubClient::new("id", "").is_err());
        assert!(GitHubClient::new("id", "secret").is_ok());
    }
}
