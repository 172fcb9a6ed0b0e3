use crate::engine::NO_DATA;
use core_types::{DevOpsPlatform, ElapsedEvent, MetricKind, RateEvent, Rating};
use serde::{Deserialize, Serialize};

/// The windowed events a report was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "items", rename_all = "snake_case")]
pub enum ReportEvents {
    /// Completed builds or workflow runs.
    Builds(Vec<RateEvent>),
    /// Change intervals, e.g. pull request open-to-merge.
    Changes(Vec<ElapsedEvent>),
}

impl ReportEvents {
    pub fn len(&self) -> usize {
        match self {
            ReportEvents::Builds(events) => events.len(),
            ReportEvents::Changes(events) => events.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One computed metric for one deployment target.
///
/// This is the output of `MetricsEngine::report` and what the CLI prints or
/// serializes to JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricReport {
    pub platform: DevOpsPlatform,
    pub metric: MetricKind,
    /// Build definition or workflow name.
    pub deployment_name: String,
    pub number_of_days: u32,
    pub max_number_of_items: u32,
    /// Number of events the value was computed from.
    pub total_items: usize,
    /// The metric in `metric.unit()`, or `-1` when there was no data.
    pub value: f64,
    pub rating: Rating,
    pub events: ReportEvents,
}

impl MetricReport {
    pub fn has_data(&self) -> bool {
        self.value != NO_DATA
    }

    /// Human-readable value with its unit, e.g. `0.40 ratio`.
    pub fn display_value(&self) -> String {
        if !self.has_data() {
            return "no data".to_string();
        }
        format!("{:.2} {}", self.value, self.metric.unit())
    }
}
