//! # Metric Reporter
//!
//! Turns stored history into metric reports. For one Azure DevOps pipeline or
//! GitHub workflow it reads the build/run and pull request partitions, keeps
//! the events inside the lookback window (newest `max_number_of_items`), and
//! hands them to `analytics::MetricsEngine`.
//!
//! An empty window is passed on as `None`, so the report says "no data"
//! instead of rating an absence of builds as Elite.

use analytics::{MetricInput, MetricReport, MetricsEngine};
use chrono::{DateTime, Utc};
use core_types::{
    AzureDevOpsBuild, AzureDevOpsPullRequest, AzureDevOpsScope, DevOpsPlatform, ElapsedEvent,
    FetchWindow, GitHubActionsRun, GitHubPullRequest, GitHubScope, MetricKind, RateEvent,
};
use database::{EventStore, keys};

pub mod error;

pub use error::AnalyzerError;

/// Every metric, in the order reports are produced.
pub const ALL_METRICS: [MetricKind; 4] = [
    MetricKind::DeploymentFrequency,
    MetricKind::LeadTimeForChanges,
    MetricKind::MeanTimeToRestore,
    MetricKind::ChangeFailureRate,
];

/// The stores one platform's metrics are read from.
#[derive(Clone)]
pub struct ReportStores {
    /// Builds or workflow runs.
    pub builds: EventStore,
    pub pull_requests: EventStore,
}

/// Metric inputs loaded from storage, owned.
#[derive(Debug, Clone, PartialEq)]
enum LoadedInput {
    Rates(Option<Vec<RateEvent>>),
    Intervals(Option<Vec<ElapsedEvent>>),
}

impl LoadedInput {
    fn as_input(&self) -> MetricInput<'_> {
        match self {
            LoadedInput::Rates(events) => MetricInput::Rates(events.as_deref()),
            LoadedInput::Intervals(events) => MetricInput::Intervals(events.as_deref()),
        }
    }
}

/// Turns stored upstream history into metric reports.
///
/// Builds/runs feed deployment frequency, change failure rate and mean time
/// to restore; merged pull requests feed lead time. Only events inside
/// `[now - number_of_days, now]` count, and of those only the newest
/// `max_number_of_items`. A window with no events is reported as no data.
pub struct MetricsReporter {
    engine: MetricsEngine,
}

impl Default for MetricsReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsReporter {
    pub fn new() -> Self {
        Self {
            engine: MetricsEngine::new(),
        }
    }

    // --- Azure DevOps ---

    pub async fn azure_devops_report(
        &self,
        stores: &ReportStores,
        metric: MetricKind,
        scope: &AzureDevOpsScope,
        window: FetchWindow,
        now: DateTime<Utc>,
    ) -> Result<MetricReport, AnalyzerError> {
        let input = if metric == MetricKind::LeadTimeForChanges {
            LoadedInput::Intervals(self.azure_devops_changes(stores, scope, window, now).await?)
        } else {
            LoadedInput::Rates(self.azure_devops_builds(stores, scope, window, now).await?)
        };
        self.compute(DevOpsPlatform::AzureDevOps, metric, &scope.build_name, window, &input)
    }

    /// All four metrics, reading each partition once.
    pub async fn azure_devops_reports(
        &self,
        stores: &ReportStores,
        scope: &AzureDevOpsScope,
        window: FetchWindow,
        now: DateTime<Utc>,
    ) -> Result<Vec<MetricReport>, AnalyzerError> {
        let rates = LoadedInput::Rates(self.azure_devops_builds(stores, scope, window, now).await?);
        let changes = LoadedInput::Intervals(self.azure_devops_changes(stores, scope, window, now).await?);
        self.compute_all(DevOpsPlatform::AzureDevOps, &scope.build_name, window, &rates, &changes)
    }

    async fn azure_devops_builds(
        &self,
        stores: &ReportStores,
        scope: &AzureDevOpsScope,
        window: FetchWindow,
        now: DateTime<Utc>,
    ) -> Result<Option<Vec<RateEvent>>, AnalyzerError> {
        let partition_key =
            keys::azure_devops_build_partition_key(&scope.organization, &scope.project, &scope.build_name);
        let builds: Vec<AzureDevOpsBuild> = stores.builds.list_records(&partition_key).await?;
        let events = builds.iter().filter_map(AzureDevOpsBuild::to_rate_event).collect();
        Ok(newest_in_window(events, |e| e.timestamp, window, now))
    }

    async fn azure_devops_changes(
        &self,
        stores: &ReportStores,
        scope: &AzureDevOpsScope,
        window: FetchWindow,
        now: DateTime<Utc>,
    ) -> Result<Option<Vec<ElapsedEvent>>, AnalyzerError> {
        let partition_key = keys::azure_devops_pull_request_partition_key(&scope.organization, &scope.project);
        let pull_requests: Vec<AzureDevOpsPullRequest> =
            stores.pull_requests.list_records(&partition_key).await?;
        let changes = pull_requests
            .iter()
            .filter_map(AzureDevOpsPullRequest::to_elapsed_event)
            .collect();
        Ok(newest_in_window(changes, |e| e.finished_at, window, now))
    }

    // --- GitHub ---

    pub async fn github_report(
        &self,
        stores: &ReportStores,
        metric: MetricKind,
        scope: &GitHubScope,
        window: FetchWindow,
        now: DateTime<Utc>,
    ) -> Result<MetricReport, AnalyzerError> {
        let input = if metric == MetricKind::LeadTimeForChanges {
            LoadedInput::Intervals(self.github_changes(stores, scope, window, now).await?)
        } else {
            LoadedInput::Rates(self.github_runs(stores, scope, window, now).await?)
        };
        self.compute(DevOpsPlatform::GitHub, metric, &scope.workflow_name, window, &input)
    }

    pub async fn github_reports(
        &self,
        stores: &ReportStores,
        scope: &GitHubScope,
        window: FetchWindow,
        now: DateTime<Utc>,
    ) -> Result<Vec<MetricReport>, AnalyzerError> {
        let rates = LoadedInput::Rates(self.github_runs(stores, scope, window, now).await?);
        let changes = LoadedInput::Intervals(self.github_changes(stores, scope, window, now).await?);
        self.compute_all(DevOpsPlatform::GitHub, &scope.workflow_name, window, &rates, &changes)
    }

    async fn github_runs(
        &self,
        stores: &ReportStores,
        scope: &GitHubScope,
        window: FetchWindow,
        now: DateTime<Utc>,
    ) -> Result<Option<Vec<RateEvent>>, AnalyzerError> {
        let partition_key = keys::github_run_partition_key(&scope.owner, &scope.repo, &scope.workflow_name);
        let runs: Vec<GitHubActionsRun> = stores.builds.list_records(&partition_key).await?;
        let events = runs.iter().filter_map(GitHubActionsRun::to_rate_event).collect();
        Ok(newest_in_window(events, |e| e.timestamp, window, now))
    }

    async fn github_changes(
        &self,
        stores: &ReportStores,
        scope: &GitHubScope,
        window: FetchWindow,
        now: DateTime<Utc>,
    ) -> Result<Option<Vec<ElapsedEvent>>, AnalyzerError> {
        let partition_key = keys::github_pull_request_partition_key(&scope.owner, &scope.repo);
        let pull_requests: Vec<GitHubPullRequest> = stores.pull_requests.list_records(&partition_key).await?;
        let changes = pull_requests
            .iter()
            .filter_map(GitHubPullRequest::to_elapsed_event)
            .collect();
        Ok(newest_in_window(changes, |e| e.finished_at, window, now))
    }

    // --- Shared ---

    fn compute(
        &self,
        platform: DevOpsPlatform,
        metric: MetricKind,
        deployment_name: &str,
        window: FetchWindow,
        input: &LoadedInput,
    ) -> Result<MetricReport, AnalyzerError> {
        let report = self
            .engine
            .report(platform, metric, deployment_name, window, input.as_input())?;
        tracing::debug!(
            %platform,
            %metric,
            deployment = %deployment_name,
            total_items = report.total_items,
            value = report.value,
            rating = %report.rating,
            "Computed metric."
        );
        Ok(report)
    }

    fn compute_all(
        &self,
        platform: DevOpsPlatform,
        deployment_name: &str,
        window: FetchWindow,
        rates: &LoadedInput,
        changes: &LoadedInput,
    ) -> Result<Vec<MetricReport>, AnalyzerError> {
        ALL_METRICS
            .iter()
            .map(|&metric| {
                let input = if metric == MetricKind::LeadTimeForChanges {
                    changes
                } else {
                    rates
                };
                self.compute(platform, metric, deployment_name, window, input)
            })
            .collect()
    }
}

/// Keeps the events inside the window ending at `now`, newest first, capped
/// at the window's item limit. `None` when nothing is left.
fn newest_in_window<T>(
    mut events: Vec<T>,
    timestamp: impl Fn(&T) -> DateTime<Utc>,
    window: FetchWindow,
    now: DateTime<Utc>,
) -> Option<Vec<T>> {
    events.retain(|e| window.contains(now, timestamp(e)));
    events.sort_by_key(|e| std::cmp::Reverse(timestamp(e)));
    events.truncate(window.max_number_of_items as usize);
    if events.is_empty() { None } else { Some(events) }
}
