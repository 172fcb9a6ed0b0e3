use serde::{Deserialize, Serialize};
use std::fmt;

/// The upstream system a piece of history was pulled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DevOpsPlatform {
    AzureDevOps,
    GitHub,
}

impl fmt::Display for DevOpsPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DevOpsPlatform::AzureDevOps => write!(f, "Azure DevOps"),
            DevOpsPlatform::GitHub => write!(f, "GitHub"),
        }
    }
}

/// The four DORA metrics this system reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricKind {
    DeploymentFrequency,
    LeadTimeForChanges,
    MeanTimeToRestore,
    ChangeFailureRate,
}

impl MetricKind {
    /// The unit the metric value is expressed in.
    pub fn unit(&self) -> &'static str {
        match self {
            MetricKind::DeploymentFrequency => "deployments/day",
            MetricKind::LeadTimeForChanges | MetricKind::MeanTimeToRestore => "hours",
            MetricKind::ChangeFailureRate => "ratio",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricKind::DeploymentFrequency => "Deployment frequency",
            MetricKind::LeadTimeForChanges => "Lead time for changes",
            MetricKind::MeanTimeToRestore => "Mean time to restore",
            MetricKind::ChangeFailureRate => "Change failure rate",
        };
        f.write_str(name)
    }
}

/// Qualitative band a metric value falls into.
///
/// `None` is the rating of the `-1` "no data" sentinel, not a missing value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rating {
    Elite,
    High,
    Medium,
    Low,
    None,
}

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Elite => "Elite",
            Rating::High => "High",
            Rating::Medium => "Medium",
            Rating::Low => "Low",
            Rating::None => "None",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_serializes_as_its_label() {
        assert_eq!(serde_json::to_string(&Rating::Elite).unwrap(), "\"Elite\"");
        assert_eq!(serde_json::to_string(&Rating::None).unwrap(), "\"None\"");
        assert_eq!(Rating::Medium.to_string(), "Medium");
    }
}
