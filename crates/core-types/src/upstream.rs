//! Typed views over the upstream API records.
//!
//! Only the fields the system reads are modelled; everything else in the
//! upstream JSON is ignored here and preserved in the stored payload.

use crate::structs::{ElapsedEvent, RateEvent};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A record an ingestion routine can store.
pub trait UpstreamRecord: DeserializeOwned {
    /// Short name used in log output.
    const KIND: &'static str;

    /// The upstream entity's natural identifier, used as the row key.
    fn row_key(&self) -> String;

    /// Whether the entity has reached a state it will not leave again.
    fn is_terminal(&self) -> bool;
}

// --- Azure DevOps ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureDevOpsBuild {
    pub build_number: String,
    pub status: String,
    pub result: Option<String>,
    pub source_branch: Option<String>,
    pub queue_time: Option<DateTime<Utc>>,
    pub start_time: Option<DateTime<Utc>>,
    pub finish_time: Option<DateTime<Utc>>,
}

impl AzureDevOpsBuild {
    pub fn succeeded(&self) -> bool {
        self.result.as_deref() == Some("succeeded")
    }

    /// Converts a finished build into a metric input, timestamped at the
    /// latest time the record carries.
    pub fn to_rate_event(&self) -> Option<RateEvent> {
        let timestamp = self.finish_time.or(self.start_time).or(self.queue_time)?;
        Some(RateEvent::new(timestamp, self.succeeded()))
    }
}

impl UpstreamRecord for AzureDevOpsBuild {
    const KIND: &'static str = "azure-devops-build";

    fn row_key(&self) -> String {
        self.build_number.clone()
    }

    fn is_terminal(&self) -> bool {
        self.status == "completed"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureDevOpsPullRequest {
    pub pull_request_id: u64,
    pub status: String,
    pub creation_date: Option<DateTime<Utc>>,
    pub closed_date: Option<DateTime<Utc>>,
    /// The repository the pull request targets. Pull requests share one
    /// partition per project, so this is what tells repositories apart.
    #[serde(default)]
    pub repository: Option<AzureDevOpsRepositoryRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AzureDevOpsRepositoryRef {
    pub id: String,
    pub name: String,
}

impl AzureDevOpsPullRequest {
    /// Whether the pull request targets `repository`, given by name or id.
    pub fn targets_repository(&self, repository: &str) -> bool {
        self.repository
            .as_ref()
            .is_some_and(|r| r.name.eq_ignore_ascii_case(repository) || r.id == repository)
    }

    /// Open-to-merge interval; abandoned pull requests never delivered a change.
    pub fn to_elapsed_event(&self) -> Option<ElapsedEvent> {
        if self.status != "completed" {
            return None;
        }
        Some(ElapsedEvent::new(self.creation_date?, self.closed_date?))
    }
}

impl UpstreamRecord for AzureDevOpsPullRequest {
    const KIND: &'static str = "azure-devops-pull-request";

    fn row_key(&self) -> String {
        self.pull_request_id.to_string()
    }

    fn is_terminal(&self) -> bool {
        matches!(self.status.as_str(), "completed" | "abandoned")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureDevOpsPullRequestCommit {
    pub commit_id: String,
    pub comment: Option<String>,
    pub committer: Option<AzureDevOpsGitUser>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AzureDevOpsGitUser {
    pub name: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

impl UpstreamRecord for AzureDevOpsPullRequestCommit {
    const KIND: &'static str = "azure-devops-pull-request-commit";

    fn row_key(&self) -> String {
        self.commit_id.clone()
    }

    fn is_terminal(&self) -> bool {
        true
    }
}

// --- GitHub ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitHubActionsRun {
    pub id: u64,
    pub run_number: u64,
    pub status: String,
    pub conclusion: Option<String>,
    pub head_branch: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl GitHubActionsRun {
    pub fn succeeded(&self) -> bool {
        self.conclusion.as_deref() == Some("success")
    }

    pub fn to_rate_event(&self) -> Option<RateEvent> {
        let timestamp = self.updated_at.or(self.created_at)?;
        Some(RateEvent::new(timestamp, self.succeeded()))
    }
}

impl UpstreamRecord for GitHubActionsRun {
    const KIND: &'static str = "github-actions-run";

    fn row_key(&self) -> String {
        self.run_number.to_string()
    }

    fn is_terminal(&self) -> bool {
        self.status == "completed"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitHubPullRequest {
    pub number: u64,
    pub state: String,
    pub created_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
}

impl GitHubPullRequest {
    /// Open-to-merge interval; closed-without-merge pull requests are skipped.
    pub fn to_elapsed_event(&self) -> Option<ElapsedEvent> {
        Some(ElapsedEvent::new(self.created_at?, self.merged_at?))
    }
}

impl UpstreamRecord for GitHubPullRequest {
    const KIND: &'static str = "github-pull-request";

    fn row_key(&self) -> String {
        self.number.to_string()
    }

    fn is_terminal(&self) -> bool {
        self.state == "closed"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitHubPullRequestCommit {
    pub sha: String,
    pub commit: Option<GitHubCommitDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitHubCommitDetail {
    pub message: Option<String>,
    pub committer: Option<GitHubCommitActor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitHubCommitActor {
    pub name: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

impl UpstreamRecord for GitHubPullRequestCommit {
    const KIND: &'static str = "github-pull-request-commit";

    fn row_key(&self) -> String {
        self.sha.clone()
    }

    fn is_terminal(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn azure_build_parses_seven_digit_fractions() {
        let build: AzureDevOpsBuild = serde_json::from_value(json!({
            "id": 1234,
            "buildNumber": "20240310.3",
            "status": "completed",
            "result": "succeeded",
            "finishTime": "2024-03-10T12:30:45.1234567Z",
            "definition": { "id": 3673, "name": "Web.CI" }
        }))
        .unwrap();

        assert_eq!(build.row_key(), "20240310.3");
        assert!(build.is_terminal());
        let event = build.to_rate_event().unwrap();
        assert!(event.succeeded);
        assert_eq!(event.timestamp.timestamp_subsec_nanos(), 123_456_700);
    }

    #[test]
    fn in_progress_build_is_not_terminal() {
        let build: AzureDevOpsBuild = serde_json::from_value(json!({
            "buildNumber": "20240310.4",
            "status": "inProgress",
            "queueTime": "2024-03-10T12:00:00Z"
        }))
        .unwrap();
        assert!(!build.is_terminal());
        assert!(!build.to_rate_event().unwrap().succeeded);
    }

    #[test]
    fn github_run_uses_run_number_as_row_key() {
        let run: GitHubActionsRun = serde_json::from_value(json!({
            "id": 987654321,
            "run_number": 57,
            "status": "completed",
            "conclusion": "failure",
            "updated_at": "2024-03-10T12:00:00Z"
        }))
        .unwrap();
        assert_eq!(run.row_key(), "57");
        assert!(!run.to_rate_event().unwrap().succeeded);
    }

    #[test]
    fn pull_request_terminal_states() {
        let open: GitHubPullRequest =
            serde_json::from_value(json!({ "number": 7, "state": "open" })).unwrap();
        let closed: GitHubPullRequest =
            serde_json::from_value(json!({ "number": 8, "state": "closed" })).unwrap();
        assert!(!open.is_terminal());
        assert!(closed.is_terminal());

        let abandoned: AzureDevOpsPullRequest = serde_json::from_value(
            json!({ "pullRequestId": 12, "status": "abandoned" }),
        )
        .unwrap();
        assert!(abandoned.is_terminal());
        assert!(abandoned.to_elapsed_event().is_none());
    }

    #[test]
    fn azure_pull_request_matches_its_repository_by_name_or_id() {
        let pr: AzureDevOpsPullRequest = serde_json::from_value(json!({
            "pullRequestId": 21,
            "status": "completed",
            "repository": { "id": "3411ebc1-d5aa-464f-9615-0b527bc66719", "name": "web-app", "url": "ignored" }
        }))
        .unwrap();
        assert!(pr.targets_repository("web-app"));
        assert!(pr.targets_repository("Web-App"));
        assert!(pr.targets_repository("3411ebc1-d5aa-464f-9615-0b527bc66719"));
        assert!(!pr.targets_repository("api"));

        let unattributed: AzureDevOpsPullRequest =
            serde_json::from_value(json!({ "pullRequestId": 22, "status": "completed" })).unwrap();
        assert!(!unattributed.targets_repository("web-app"));
    }

    #[test]
    fn merged_pull_request_yields_lead_time_interval() {
        let pr: GitHubPullRequest = serde_json::from_value(json!({
            "number": 9,
            "state": "closed",
            "created_at": "2024-03-01T08:00:00Z",
            "closed_at": "2024-03-01T20:00:00Z",
            "merged_at": "2024-03-01T20:00:00Z"
        }))
        .unwrap();
        let interval = pr.to_elapsed_event().unwrap();
        assert_eq!(interval.elapsed().num_hours(), 12);
    }

    #[test]
    fn missing_identifier_is_rejected() {
        let result = serde_json::from_value::<GitHubPullRequestCommit>(json!({ "commit": {} }));
        assert!(result.is_err());
    }
}
