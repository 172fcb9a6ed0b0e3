use api_client::MockGitHubApi;
use core_types::{FetchWindow, GitHubScope};
use database::{EventStore, MemoryTableBackend};
use ingestion::{GitHubIngestion, SourceStores};
use serde_json::{Value, json};
use std::sync::Arc;

fn scope() -> GitHubScope {
    GitHubScope {
        owner: "octo".to_string(),
        repo: "app".to_string(),
        branch: "main".to_string(),
        workflow_name: "CI".to_string(),
        workflow_id: "1234".to_string(),
    }
}

fn window() -> FetchWindow {
    FetchWindow::new(30, 20).unwrap()
}

fn stores(backend: &MemoryTableBackend) -> SourceStores {
    let backend = Arc::new(backend.clone());
    SourceStores {
        builds: EventStore::new(backend.clone(), "GitHubRuns"),
        pull_requests: EventStore::new(backend.clone(), "GitHubPRs"),
        pull_request_commits: EventStore::new(backend, "GitHubPRCommits"),
    }
}

fn run(run_number: u64, status: &str, conclusion: Option<&str>) -> Value {
    json!({
        "id": 9000 + run_number,
        "run_number": run_number,
        "status": status,
        "conclusion": conclusion,
        "head_branch": "main",
        "created_at": "2024-03-05T10:00:00Z",
        "updated_at": "2024-03-05T10:20:00Z"
    })
}

#[tokio::test]
async fn runs_are_stored_once_per_run_number() {
    // Arrange
    let backend = MemoryTableBackend::new();
    let mut api = MockGitHubApi::new();
    api.expect_fetch_runs().times(2).returning(|_, _| {
        Ok(vec![
            run(1, "completed", Some("success")),
            run(2, "completed", Some("failure")),
            run(3, "in_progress", None),
            run(4, "queued", None),
        ])
    });
    let ingestion = GitHubIngestion::new(Arc::new(api), stores(&backend));

    // Act
    let first = ingestion.sync_runs(&scope(), window()).await.unwrap();
    let second = ingestion.sync_runs(&scope(), window()).await.unwrap();

    // Assert
    assert_eq!(first, 2);
    assert_eq!(second, 0);
    assert_eq!(backend.row_count("GitHubRuns", "octo_app_CI"), 2);
}

#[tokio::test]
async fn workflow_names_with_slashes_are_encoded() {
    let backend = MemoryTableBackend::new();
    let mut api = MockGitHubApi::new();
    api.expect_fetch_runs()
        .returning(|_, _| Ok(vec![run(1, "completed", Some("success"))]));
    let ingestion = GitHubIngestion::new(Arc::new(api), stores(&backend));
    let mut scope = scope();
    scope.workflow_name = "build/deploy".to_string();

    ingestion.sync_runs(&scope, window()).await.unwrap();

    assert_eq!(backend.row_count("GitHubRuns", "octo_app_build_deploy"), 1);
}

#[tokio::test]
async fn only_closed_pull_requests_are_stored() {
    let backend = MemoryTableBackend::new();
    let mut api = MockGitHubApi::new();
    api.expect_fetch_pull_requests().returning(|_, _| {
        Ok(vec![
            json!({"number": 1, "state": "closed", "created_at": "2024-03-01T00:00:00Z", "merged_at": "2024-03-02T00:00:00Z"}),
            json!({"number": 2, "state": "open", "created_at": "2024-03-03T00:00:00Z"}),
            json!({"number": 3, "state": "closed", "created_at": "2024-03-04T00:00:00Z"}),
        ])
    });
    let ingestion = GitHubIngestion::new(Arc::new(api), stores(&backend));

    let added = ingestion.sync_pull_requests(&scope(), window()).await.unwrap();

    assert_eq!(added, 2);
    assert_eq!(backend.row_count("GitHubPRs", "octo_app"), 2);
}

#[tokio::test]
async fn sync_all_with_no_pull_requests_fetches_no_commits() {
    let backend = MemoryTableBackend::new();
    let mut api = MockGitHubApi::new();
    api.expect_fetch_runs()
        .returning(|_, _| Ok(vec![run(1, "completed", Some("success"))]));
    api.expect_fetch_pull_requests().returning(|_, _| Ok(Vec::new()));
    api.expect_fetch_pull_request_commits().never();
    let ingestion = GitHubIngestion::new(Arc::new(api), stores(&backend));

    let summary = ingestion.sync_all(&scope(), window()).await.unwrap();

    assert_eq!(summary.builds_added, 1);
    assert_eq!(summary.pull_requests_added, 0);
    assert_eq!(summary.pull_request_commits_added, 0);
}

#[tokio::test]
async fn commit_sync_is_idempotent() {
    let backend = MemoryTableBackend::new();
    let mut api = MockGitHubApi::new();
    api.expect_fetch_pull_request_commits().times(2).returning(|_, _| {
        Ok(vec![
            json!({"sha": "abc", "commit": {"message": "fix", "committer": {"name": "a", "date": "2024-03-01T00:00:00Z"}}}),
            json!({"sha": "def"}),
        ])
    });
    let ingestion = GitHubIngestion::new(Arc::new(api), stores(&backend));

    assert_eq!(ingestion.sync_pull_request_commits(&scope(), "7").await.unwrap(), 2);
    assert_eq!(ingestion.sync_pull_request_commits(&scope(), "7").await.unwrap(), 0);
    assert_eq!(backend.row_count("GitHubPRCommits", "octo_app"), 2);
}
