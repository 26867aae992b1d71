//! Calendar clock for the fixed UTC+7 day boundary.
//!
//! # Responsibility
//! - Map epoch-millisecond instants to calendar days in the fixed offset.
//! - Provide start-of-day, day arithmetic and minute-of-day helpers.
//!
//! # Invariants
//! - Every day-boundary decision in core goes through this module.
//! - Results never depend on the host timezone: days are computed by shifting
//!   the instant by `FIXED_OFFSET_MS` and reading the UTC calendar date.
//! - An instant exactly at shifted midnight belongs to the new day.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Fixed offset applied to all calendar computations (UTC+7).
pub const FIXED_OFFSET_MS: i64 = 7 * 60 * 60 * 1000;
pub const MINUTES_PER_DAY: u32 = 24 * 60;
const MS_PER_MINUTE: i64 = 60 * 1000;

pub type CalendarResult<T> = Result<T, CalendarError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarError {
    /// Instant cannot be represented as a calendar date.
    InstantOutOfRange(i64),
    /// Day arithmetic left the representable date range.
    DayOutOfRange { day: DayKey, offset_days: i64 },
}

impl Display for CalendarError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InstantOutOfRange(instant) => {
                write!(f, "instant {instant} is outside the supported calendar range")
            }
            Self::DayOutOfRange { day, offset_days } => {
                write!(f, "day {day} shifted by {offset_days} days is out of range")
            }
        }
    }
}

impl Error for CalendarError {}

/// One calendar day in the fixed offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayKey(NaiveDate);

impl DayKey {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Parses the persisted `YYYY-MM-DD` form.
    pub fn parse(value: &str) -> Option<Self> {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").ok().map(Self)
    }

    pub fn date(self) -> NaiveDate {
        self.0
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    pub fn month(self) -> u32 {
        self.0.month()
    }

    pub fn day(self) -> u32 {
        self.0.day()
    }
}

impl From<NaiveDate> for DayKey {
    fn from(value: NaiveDate) -> Self {
        Self(value)
    }
}

impl Display for DayKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Returns the calendar day containing `instant_ms` in the fixed offset.
pub fn day_key_of(instant_ms: i64) -> CalendarResult<DayKey> {
    shifted(instant_ms).map(|shifted| DayKey(shifted.date_naive()))
}

/// Returns the instant at which `day` starts in the fixed offset.
pub fn start_of_day(day: DayKey) -> i64 {
    day.0.and_time(NaiveTime::MIN).and_utc().timestamp_millis() - FIXED_OFFSET_MS
}

/// Shifts `day` by `offset_days` (negative values go back in time).
pub fn add_days(day: DayKey, offset_days: i64) -> CalendarResult<DayKey> {
    let shifted = if offset_days >= 0 {
        day.0.checked_add_days(Days::new(offset_days.unsigned_abs()))
    } else {
        day.0.checked_sub_days(Days::new(offset_days.unsigned_abs()))
    };
    shifted
        .map(DayKey)
        .ok_or(CalendarError::DayOutOfRange { day, offset_days })
}

/// Minutes elapsed since the fixed-offset midnight of the instant's own day.
pub fn minutes_since_midnight(instant_ms: i64) -> CalendarResult<u32> {
    let time = shifted(instant_ms)?.time();
    Ok(time.hour() * 60 + time.minute())
}

/// Instant that lies `minutes` after the start of `day`.
pub fn instant_at(day: DayKey, minutes: u32) -> i64 {
    start_of_day(day) + i64::from(minutes) * MS_PER_MINUTE
}

/// Short weekday label (`Mon`..`Sun`) derived from the date only.
pub fn weekday_label(day: DayKey) -> &'static str {
    match day.0.weekday() {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

/// `DD/MM` label used by month views.
pub fn day_of_month_label(day: DayKey) -> String {
    format!("{:02}/{:02}", day.day(), day.month())
}

fn shifted(instant_ms: i64) -> CalendarResult<DateTime<Utc>> {
    instant_ms
        .checked_add(FIXED_OFFSET_MS)
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .ok_or(CalendarError::InstantOutOfRange(instant_ms))
}
