use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one Azure DevOps build pipeline and the repository it builds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AzureDevOpsScope {
    pub organization: String,
    pub project: String,
    pub repository: String,
    pub branch: String,
    pub build_name: String,
    pub build_id: String,
}

/// Identifies one GitHub Actions workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubScope {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub workflow_name: String,
    pub workflow_id: String,
}

/// A saved Azure DevOps profile: PAT plus the pipeline it targets.
///
/// Serialized flat, so the stored JSON carries the credential and every
/// identifier side by side.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AzureDevOpsSettings {
    pub pat_token: String,
    #[serde(flatten)]
    pub scope: AzureDevOpsScope,
}

/// A saved GitHub profile: OAuth app credentials plus the workflow it targets.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubSettings {
    pub client_id: String,
    pub client_secret: String,
    #[serde(flatten)]
    pub scope: GitHubScope,
}

// Credentials stay out of log output.
impl fmt::Debug for AzureDevOpsSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureDevOpsSettings")
            .field("pat_token", &"<redacted>")
            .field("scope", &self.scope)
            .finish()
    }
}

impl fmt::Debug for GitHubSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubSettings")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("scope", &self.scope)
            .finish()
    }
}
