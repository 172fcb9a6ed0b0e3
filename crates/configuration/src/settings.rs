use core_types::{CoreError, FetchWindow};
use serde::Deserialize;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
///
/// Every section is optional; a missing section or field takes its default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub tables: TablesConfig,
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
}

/// Where the table store lives.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Postgres URL. When absent, `DATABASE_URL` (or `.env`) is used.
    pub database_url: Option<String>,
    pub max_connections: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: 5,
        }
    }
}

/// Logical table names, one per source and entity plus the settings table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TablesConfig {
    pub azure_devops_builds: String,
    pub azure_devops_pull_requests: String,
    pub azure_devops_pull_request_commits: String,
    pub github_runs: String,
    pub github_pull_requests: String,
    pub github_pull_request_commits: String,
    pub settings: String,
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            azure_devops_builds: "AzureDevOpsBuilds".to_string(),
            azure_devops_pull_requests: "AzureDevOpsPRs".to_string(),
            azure_devops_pull_request_commits: "AzureDevOpsPRCommits".to_string(),
            github_runs: "GitHubRuns".to_string(),
            github_pull_requests: "GitHubPRs".to_string(),
            github_pull_request_commits: "GitHubPRCommits".to_string(),
            settings: "Settings".to_string(),
        }
    }
}

impl TablesConfig {
    fn all(&self) -> [(&'static str, &str); 7] {
        [
            ("azure_devops_builds", self.azure_devops_builds.as_str()),
            ("azure_devops_pull_requests", self.azure_devops_pull_requests.as_str()),
            ("azure_devops_pull_request_commits", self.azure_devops_pull_request_commits.as_str()),
            ("github_runs", self.github_runs.as_str()),
            ("github_pull_requests", self.github_pull_requests.as_str()),
            ("github_pull_request_commits", self.github_pull_request_commits.as_str()),
            ("settings", self.settings.as_str()),
        ]
    }
}

/// Default lookback window for sync and metric commands.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub number_of_days: u32,
    pub max_number_of_items: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            number_of_days: 30,
            max_number_of_items: 20,
        }
    }
}

impl SyncConfig {
    pub fn window(&self) -> Result<FetchWindow, CoreError> {
        FetchWindow::new(self.number_of_days, self.max_number_of_items)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    pub level: String,
    /// Directory for the daily rolling log file; no file when absent.
    pub directory: Option<PathBuf>,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: Some(PathBuf::from("logs")),
            format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Rejects values the application cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        if self.sync.number_of_days == 0 {
            return Err("sync.number_of_days must be at least 1".to_string());
        }
        if self.sync.number_of_days > FetchWindow::MAX_NUMBER_OF_DAYS {
            return Err(format!(
                "sync.number_of_days must be at most {}",
                FetchWindow::MAX_NUMBER_OF_DAYS
            ));
        }
        if self.sync.max_number_of_items == 0 {
            return Err("sync.max_number_of_items must be at least 1".to_string());
        }
        if self.storage.max_connections == 0 {
            return Err("storage.max_connections must be at least 1".to_string());
        }
        for (name, value) in self.tables.all() {
            if value.trim().is_empty() {
                return Err(format!("tables.{name} must not be empty"));
            }
        }
        Ok(())
    }
}
