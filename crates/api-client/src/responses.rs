use serde::Deserialize;
use serde_json::Value;

// Records are kept as raw JSON: the stored payload is the upstream record as received.

/// The list envelope every Azure DevOps collection endpoint returns.
#[derive(Debug, Clone, Deserialize)]
pub struct AzureDevOpsList {
    #[serde(default)]
    pub count: u64,
    pub value: Vec<Value>,
}

/// The envelope of `GET /repos/{owner}/{repo}/actions/workflows/{id}/runs`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubWorkflowRuns {
    #[serde(default)]
    pub total_count: u64,
    pub workflow_runs: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn azure_envelope_keeps_records_raw() {
        let body = r#"{"count":2,"value":[{"buildNumber":"1","extra":true},{"buildNumber":"2"}]}"#;
        let list: AzureDevOpsList = serde_json::from_str(body).unwrap();
        assert_eq!(list.count, 2);
        assert_eq!(list.value[0]["extra"], true);
    }

    #[test]
    fn github_runs_envelope() {
        let body = r#"{"total_count":1,"workflow_runs":[{"id":9,"run_number":3}]}"#;
        let runs: GitHubWorkflowRuns = serde_json::from_str(body).unwrap();
        assert_eq!(runs.total_count, 1);
        assert_eq!(runs.workflow_runs[0]["run_number"], 3);
    }
}
