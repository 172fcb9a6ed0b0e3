use core_types::MetricKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Metric '{0}' cannot be computed from the supplied event list")]
    InputMismatch(MetricKind),
}
