use crate::error::CoreError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A single row of the partitioned table store.
///
/// `payload` is the upstream record exactly as it was received, serialized to
/// JSON text. Consumers parse it lazily into whatever view they need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct StoredEvent {
    pub partition_key: String,
    pub row_key: String,
    #[sqlx(rename = "data")]
    pub payload: String,
}

impl StoredEvent {
    pub fn new(
        partition_key: impl Into<String>,
        row_key: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
            payload: payload.into(),
        }
    }
}

/// One completed deployment/build: when it finished and whether it succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateEvent {
    pub timestamp: DateTime<Utc>,
    pub succeeded: bool,
}

impl RateEvent {
    pub fn new(timestamp: DateTime<Utc>, succeeded: bool) -> Self {
        Self { timestamp, succeeded }
    }
}

/// An interval between a triggering event and the event that resolved it,
/// e.g. a pull request opening and merging, or a failed build and the next
/// green one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElapsedEvent {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ElapsedEvent {
    pub fn new(started_at: DateTime<Utc>, finished_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at,
        }
    }

    /// Elapsed time, clamped at zero for clock-skewed records.
    pub fn elapsed(&self) -> Duration {
        (self.finished_at - self.started_at).max(Duration::zero())
    }
}

/// How much upstream history a fetch or a metric looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchWindow {
    /// Lookback window, in days.
    pub number_of_days: u32,
    /// Upper bound on the number of records considered.
    pub max_number_of_items: u32,
}

impl FetchWindow {
    /// Longest lookback accepted, about a hundred years.
    pub const MAX_NUMBER_OF_DAYS: u32 = 36_500;

    pub fn new(number_of_days: u32, max_number_of_items: u32) -> Result<Self, CoreError> {
        if number_of_days == 0 {
            return Err(CoreError::InvalidInput(
                "number_of_days".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        if number_of_days > Self::MAX_NUMBER_OF_DAYS {
            return Err(CoreError::InvalidInput(
                "number_of_days".to_string(),
                format!("must be at most {}", Self::MAX_NUMBER_OF_DAYS),
            ));
        }
        if max_number_of_items == 0 {
            return Err(CoreError::InvalidInput(
                "max_number_of_items".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            number_of_days,
            max_number_of_items,
        })
    }

    /// The oldest instant inside the window that ends at `now`.
    ///
    /// Saturates at the earliest representable instant, since the fields are
    /// public and can be set past `MAX_NUMBER_OF_DAYS`.
    pub fn start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(Duration::days(i64::from(self.number_of_days)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Whether `timestamp` falls in `[now - number_of_days, now]`.
    pub fn contains(&self, now: DateTime<Utc>, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.start(now) && timestamp <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn window_rejects_zero_values() {
        assert!(FetchWindow::new(0, 10).is_err());
        assert!(FetchWindow::new(7, 0).is_err());
        assert!(FetchWindow::new(7, 10).is_ok());
    }

    #[test]
    fn window_rejects_days_beyond_the_maximum() {
        assert!(FetchWindow::new(FetchWindow::MAX_NUMBER_OF_DAYS, 10).is_ok());
        assert!(FetchWindow::new(FetchWindow::MAX_NUMBER_OF_DAYS + 1, 10).is_err());
        assert!(FetchWindow::new(200_000_000, 10).is_err());
    }

    #[test]
    fn window_start_saturates_instead_of_overflowing() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let window = FetchWindow {
            number_of_days: u32::MAX,
            max_number_of_items: 10,
        };

        assert_eq!(window.start(now), DateTime::<Utc>::MIN_UTC);
        assert!(window.contains(now, now - Duration::days(365 * 1000)));
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let window = FetchWindow::new(7, 10).unwrap();

        assert!(window.contains(now, now));
        assert!(window.contains(now, now - Duration::days(7)));
        assert!(!window.contains(now, now - Duration::days(7) - Duration::seconds(1)));
        assert!(!window.contains(now, now + Duration::seconds(1)));
    }

    #[test]
    fn elapsed_never_goes_negative() {
        let t = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let skewed = ElapsedEvent::new(t, t - Duration::hours(2));
        assert_eq!(skewed.elapsed(), Duration::zero());
        assert_eq!(ElapsedEvent::new(t, t + Duration::hours(2)).elapsed(), Duration::hours(2));
    }
}
