use serde::Serialize;
use std::fmt;

/// Rows added by one `sync_all` run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub builds_added: usize,
    pub pull_requests_added: usize,
    pub pull_request_commits_added: usize,
}

impl SyncSummary {
    pub fn total(&self) -> usize {
        self.builds_added + self.pull_requests_added + self.pull_request_commits_added
    }
}

impl fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} builds, {} pull requests, {} pull request commits added",
            self.builds_added, self.pull_requests_added, self.pull_request_commits_added
        )
    }
}
