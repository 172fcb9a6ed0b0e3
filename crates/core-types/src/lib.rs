pub mod enums;
pub mod error;
pub mod scope;
pub mod structs;
pub mod upstream;

// Re-export the core types to provide a clean public API.
pub use enums::{DevOpsPlatform, MetricKind, Rating};
pub use error::CoreError;
pub use scope::{AzureDevOpsScope, AzureDevOpsSettings, GitHubScope, GitHubSettings};
pub use structs::{ElapsedEvent, FetchWindow, RateEvent, StoredEvent};
pub use upstream::{
    AzureDevOpsBuild, AzureDevOpsPullRequest, AzureDevOpsPullRequestCommit, AzureDevOpsRepositoryRef,
    GitHubActionsRun, GitHubPullRequest, GitHubPullRequestCommit, UpstreamRecord,
};
