use crate::error::AnalyticsError;
use crate::report::{MetricReport, ReportEvents};
use core_types::{DevOpsPlatform, ElapsedEvent, FetchWindow, MetricKind, RateEvent, Rating};

/// Value a metric reports when it had no input at all.
pub const NO_DATA: f64 = -1.0;

const HOURS_PER_DAY: f64 = 24.0;
const HOURS_PER_WEEK: f64 = 168.0;
const HOURS_PER_MONTH: f64 = 720.0;

// Change failure rate band edges.
const HIGH_FAILURE_RATE: f64 = 0.30;
const MEDIUM_FAILURE_RATE: f64 = 0.45;

/// The event list a metric is computed from.
#[derive(Debug, Clone, Copy)]
pub enum MetricInput<'a> {
    /// Completed builds/runs. `None` means no data was available.
    Rates(Option<&'a [RateEvent]>),
    /// Change intervals, e.g. pull request open-to-merge.
    Intervals(Option<&'a [ElapsedEvent]>),
}

impl MetricInput<'_> {
    fn len(&self) -> usize {
        match self {
            MetricInput::Rates(events) => events.map_or(0, <[RateEvent]>::len),
            MetricInput::Intervals(events) => events.map_or(0, <[ElapsedEvent]>::len),
        }
    }

    fn to_events(self) -> ReportEvents {
        match self {
            MetricInput::Rates(events) => ReportEvents::Builds(events.map(<[RateEvent]>::to_vec).unwrap_or_default()),
            MetricInput::Intervals(events) => {
                ReportEvents::Changes(events.map(<[ElapsedEvent]>::to_vec).unwrap_or_default())
            }
        }
    }
}

/// A stateless calculator for the four DevOps performance metrics.
///
/// Every reducer takes `None` for absent input and answers with `NO_DATA`
/// (rated `Rating::None`) instead of failing.
#[derive(Debug, Default)]
pub struct MetricsEngine {}

impl MetricsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes one metric and wraps it in a `MetricReport`.
    ///
    /// Deployment frequency and change failure rate take `Rates`; lead time
    /// takes `Intervals`; mean time to restore takes either the builds
    /// (`Rates`, reduced through `restore_intervals`) or ready-made
    /// `Intervals`.
    pub fn report(
        &self,
        platform: DevOpsPlatform,
        metric: MetricKind,
        deployment_name: &str,
        window: FetchWindow,
        input: MetricInput<'_>,
    ) -> Result<MetricReport, AnalyticsError> {
        let value = match (metric, input) {
            (MetricKind::DeploymentFrequency, MetricInput::Rates(events)) => {
                self.deployment_frequency(events, window.number_of_days)
            }
            (MetricKind::ChangeFailureRate, MetricInput::Rates(events)) => {
                self.change_failure_rate(events, window.number_of_days)
            }
            (MetricKind::LeadTimeForChanges, MetricInput::Intervals(changes)) => {
                self.lead_time_hours(changes)
            }
            (MetricKind::MeanTimeToRestore, MetricInput::Intervals(restores)) => {
                self.mean_time_to_restore_hours(restores)
            }
            (MetricKind::MeanTimeToRestore, MetricInput::Rates(events)) => match events {
                Some(events) => {
                    let restores = self.restore_intervals(events);
                    self.mean_time_to_restore_hours(Some(&restores))
                }
                None => NO_DATA,
            },
            (metric, _) => return Err(AnalyticsError::InputMismatch(metric)),
        };

        Ok(MetricReport {
            platform,
            metric,
            deployment_name: deployment_name.to_string(),
            number_of_days: window.number_of_days,
            max_number_of_items: window.max_number_of_items,
            total_items: input.len(),
            value,
            rating: self.rating(metric, value),
            events: input.to_events(),
        })
    }

    /// Rating for a value of the given metric.
    pub fn rating(&self, metric: MetricKind, value: f64) -> Rating {
        match metric {
            MetricKind::DeploymentFrequency => self.deployment_frequency_rating(value),
            MetricKind::LeadTimeForChanges => self.lead_time_rating(value),
            MetricKind::MeanTimeToRestore => self.mean_time_to_restore_rating(value),
            MetricKind::ChangeFailureRate => self.change_failure_rate_rating(value),
        }
    }

    // --- Change failure rate ---

    /// Fraction of completed builds that failed.
    ///
    /// `NO_DATA` for `None`; `0.0` for an empty list. For any list the result
    /// lies in `[0, 1]`.
    pub fn change_failure_rate(&self, events: Option<&[RateEvent]>, window_days: u32) -> f64 {
        let Some(events) = events else {
            return NO_DATA;
        };
        if events.is_empty() {
            return 0.0;
        }

        let failed = events.iter().filter(|e| !e.succeeded).count();
        let rate = failed as f64 / events.len() as f64;
        tracing::debug!(
            total = events.len(),
            failed,
            window_days,
            rate,
            "Computed change failure rate."
        );
        rate
    }

    pub fn change_failure_rate_rating(&self, rate: f64) -> Rating {
        if rate < 0.0 {
            Rating::None
        } else if rate == 0.0 {
            Rating::Elite
        } else if rate <= HIGH_FAILURE_RATE {
            Rating::High
        } else if rate <= MEDIUM_FAILURE_RATE {
            Rating::Medium
        } else {
            Rating::Low
        }
    }

    // --- Deployment frequency ---

    /// Successful deployments per day of the window.
    pub fn deployment_frequency(&self, events: Option<&[RateEvent]>, window_days: u32) -> f64 {
        let Some(events) = events else {
            return NO_DATA;
        };
        if window_days == 0 {
            return NO_DATA;
        }

        let succeeded = events.iter().filter(|e| e.succeeded).count();
        succeeded as f64 / f64::from(window_days)
    }

    pub fn deployment_frequency_rating(&self, per_day: f64) -> Rating {
        if per_day >= 1.0 {
            Rating::Elite
        } else if per_day >= 1.0 / 7.0 {
            Rating::High
        } else if per_day >= 1.0 / 30.0 {
            Rating::Medium
        } else if per_day > 0.0 {
            Rating::Low
        } else {
            // Negative is no data; zero means nothing shipped.
            Rating::None
        }
    }

    // --- Lead time for changes ---

    /// Mean hours from change start to delivery.
    pub fn lead_time_hours(&self, changes: Option<&[ElapsedEvent]>) -> f64 {
        mean_elapsed_hours(changes)
    }

    pub fn lead_time_rating(&self, hours: f64) -> Rating {
        if hours < 0.0 {
            Rating::None
        } else if hours < HOURS_PER_DAY {
            Rating::Elite
        } else if hours < HOURS_PER_WEEK {
            Rating::High
        } else if hours < HOURS_PER_MONTH {
            Rating::Medium
        } else {
            Rating::Low
        }
    }

    // --- Mean time to restore ---

    pub fn mean_time_to_restore_hours(&self, restores: Option<&[ElapsedEvent]>) -> f64 {
        mean_elapsed_hours(restores)
    }

    pub fn mean_time_to_restore_rating(&self, hours: f64) -> Rating {
        if hours < 0.0 {
            Rating::None
        } else if hours < 1.0 {
            Rating::Elite
        } else if hours < HOURS_PER_DAY {
            Rating::High
        } else if hours < HOURS_PER_WEEK {
            Rating::Medium
        } else {
            Rating::Low
        }
    }

    /// Turns a build history into restore intervals.
    ///
    /// Events are ordered by timestamp. Each run of failures opens an
    /// interval at its first failure, closed by the next success. A run still
    /// failing at the end of the history has not been restored and yields
    /// nothing.
    pub fn restore_intervals(&self, events: &[RateEvent]) -> Vec<ElapsedEvent> {
        let mut ordered = events.to_vec();
        ordered.sort_by_key(|e| e.timestamp);

        let mut intervals = Vec::new();
        let mut failing_since = None;
        for event in ordered {
            match (event.succeeded, failing_since) {
                (false, None) => failing_since = Some(event.timestamp),
                (true, Some(started_at)) => {
                    intervals.push(ElapsedEvent::new(started_at, event.timestamp));
                    failing_since = None;
                }
                _ => {}
            }
        }
        intervals
    }
}

fn mean_elapsed_hours(events: Option<&[ElapsedEvent]>) -> f64 {
    let Some(events) = events else {
        return NO_DATA;
    };
    if events.is_empty() {
        return 0.0;
    }

    let total_seconds: i64 = events.iter().map(|e| e.elapsed().num_seconds()).sum();
    total_seconds as f64 / 3600.0 / events.len() as f64
}
