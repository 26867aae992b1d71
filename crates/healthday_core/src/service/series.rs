//! Fixed-length day/week/month series over day buckets.
//!
//! # Responsibility
//! - Walk calendar days backwards from "today" and read each bucket.
//! - Zero-fill missing days and attach date-derived labels.
//! - Overlay the user's goal (or its default) for metrics that have one.
//!
//! # Invariants
//! - Read-only: buckets are looked up with `get`, never `ensure`.
//! - Week/month values are in calendar order, oldest first, today last.
//! - Averages only count days with a non-zero value.

use crate::calendar::{self, DayKey};
use crate::model::goal::GoalSet;
use crate::model::metric::{MetricKind, UserId};
use crate::repo::day_repo::DayRepository;
use crate::service::error::{TrackerError, TrackerResult};
use serde::{Deserialize, Serialize};

pub const WEEK_DAYS: usize = 7;
pub const MONTH_DAYS: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeKind {
    Day,
    Week,
    Month,
}

impl RangeKind {
    /// Parses `day|week|month`, rejecting anything else.
    pub fn parse(value: &str) -> TrackerResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            _ => Err(TrackerError::RangeOutOfBounds(value.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Number of calendar days walked for this range.
    pub fn day_count(self) -> usize {
        match self {
            Self::Day => 1,
            Self::Week => WEEK_DAYS,
            Self::Month => MONTH_DAYS,
        }
    }
}

/// Shape of a `RangeKind::Day` series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayShape {
    /// `[actual]`
    #[default]
    Actual,
    /// `[actual, goal]`
    VersusGoal,
}

/// Transient range request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeQuery {
    pub user_id: UserId,
    pub metric: MetricKind,
    pub range: RangeKind,
    pub day_shape: DayShape,
    pub now_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub metric: MetricKind,
    pub range: RangeKind,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    /// Goal in display units; `None` only for metrics without goals.
    pub goal: Option<f64>,
    /// Sum over the walked days (goal entries excluded).
    pub total: f64,
    /// Mean over walked days with a non-zero value.
    pub average: f64,
}

/// Mean of the non-zero entries; zero when there are none.
pub fn average_nonzero(values: &[f64]) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|value| **value != 0.0)
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Days ending at `today`, oldest first.
pub fn range_days(today: DayKey, range: RangeKind) -> TrackerResult<Vec<DayKey>> {
    let mut days = (0..range.day_count() as i64)
        .map(|offset| calendar::add_days(today, -offset))
        .collect::<Result<Vec<_>, _>>()?;
    days.reverse();
    Ok(days)
}

/// Builds the series described by `query`.
pub fn build_series<D: DayRepository>(
    days: &D,
    goals: &GoalSet,
    query: &RangeQuery,
) -> TrackerResult<Series> {
    let today = calendar::day_key_of(query.now_ms)?;
    let walked = range_days(today, query.range)?;

    let mut values = Vec::with_capacity(walked.len() + 1);
    for day in &walked {
        let value = days
            .get(query.user_id, *day)?
            .map_or(0.0, |record| record.primary_value(query.metric));
        values.push(value);
    }

    let total = values.iter().sum();
    let average = average_nonzero(&values);
    let goal = goals.display_target(query.metric);

    let mut labels = walked
        .iter()
        .map(|day| label_for(query.range, *day))
        .collect::<Vec<_>>();
    if query.range == RangeKind::Day && query.day_shape == DayShape::VersusGoal {
        if let Some(goal) = goal {
            labels.push("Goal".to_string());
            values.push(goal);
        }
    }

    Ok(Series {
        metric: query.metric,
        range: query.range,
        labels,
        values,
        goal,
        total,
        average,
    })
}

fn label_for(range: RangeKind, day: DayKey) -> String {
    match range {
        RangeKind::Day => "Today".to_string(),
        RangeKind::Week => calendar::weekday_label(day).to_string(),
        RangeKind::Month => calendar::day_of_month_label(day),
    }
}
