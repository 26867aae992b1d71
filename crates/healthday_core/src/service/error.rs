//! Engine-level error taxonomy.
//!
//! Every failure is local and synchronous; nothing is retried internally.

use crate::calendar::CalendarError;
use crate::repo::day_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type TrackerResult<T> = Result<T, TrackerError>;

#[derive(Debug)]
pub enum TrackerError {
    /// User id is not a non-nil UUID.
    InvalidUser(String),
    /// Unknown metric, unknown field, or a value the metric cannot hold.
    InvalidMetric(String),
    /// Interval whose start and end fall on the same minute of day.
    DegenerateInterval { start_ms: i64, end_ms: i64 },
    /// Range kind outside `day|week|month`.
    RangeOutOfBounds(String),
    /// Instant that cannot be mapped to a calendar day.
    InvalidInstant(i64),
    /// Persistence failure, propagated unchanged.
    StorageUnavailable(RepoError),
}

impl TrackerError {
    /// Stable machine-readable code for outer layers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidUser(_) => "invalid_user",
            Self::InvalidMetric(_) => "invalid_metric",
            Self::DegenerateInterval { .. } => "degenerate_interval",
            Self::RangeOutOfBounds(_) => "range_out_of_bounds",
            Self::InvalidInstant(_) => "invalid_instant",
            Self::StorageUnavailable(_) => "storage_unavailable",
        }
    }
}

impl Display for TrackerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUser(value) => write!(f, "invalid user id: `{value}`"),
            Self::InvalidMetric(message) => write!(f, "invalid metric payload: {message}"),
            Self::DegenerateInterval { start_ms, end_ms } => write!(
                f,
                "interval {start_ms}..{end_ms} has zero duration; re-submit with distinct times"
            ),
            Self::RangeOutOfBounds(value) => {
                write!(f, "unsupported range `{value}`; expected day|week|month")
            }
            Self::InvalidInstant(value) => write!(f, "instant {value} is out of range"),
            Self::StorageUnavailable(err) => write!(f, "storage unavailable: {err}"),
        }
    }
}

impl Error for TrackerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StorageUnavailable(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TrackerError {
    fn from(value: RepoError) -> Self {
        Self::StorageUnavailable(value)
    }
}

impl From<CalendarError> for TrackerError {
    fn from(value: CalendarError) -> Self {
        match value {
            CalendarError::InstantOutOfRange(instant) => Self::InvalidInstant(instant),
            CalendarError::DayOutOfRange { day, .. } => {
                Self::InvalidInstant(crate::calendar::start_of_day(day))
            }
        }
    }
}
