//! Health tracker use-case service.
//!
//! # Responsibility
//! - Expose the engine operations: delta/replace recording, interval
//!   commits and range queries.
//! - Resolve caller input (user ids, metric and range names) into domain
//!   types before any storage access.
//! - Keep the health score current on every write.
//!
//! # Invariants
//! - Every operation takes `now_ms` explicitly; the system clock is never
//!   read here.
//! - All bucket writes go through `DayRepository::mutate`, so a rejected
//!   payload writes nothing.
//! - Read operations never create buckets.

use crate::calendar::{self, DayKey};
use crate::model::day_record::{DayRecord, MealEntry};
use crate::model::goal::GoalKind;
use crate::model::interval::IntervalDraft;
use crate::model::metric::{MetricFields, MetricKind, UserId};
use crate::repo::day_repo::DayRepository;
use crate::repo::goal_repo::GoalRepository;
use crate::service::error::{TrackerError, TrackerResult};
use crate::service::merge::{self, MergeMode};
use crate::service::reconcile;
use crate::service::series::{self, DayShape, RangeKind, RangeQuery, Series};
use log::{info, warn};
use std::time::Instant;

/// Resolves caller input into a user id.
///
/// # Errors
/// - `InvalidUser` when `raw` is not a UUID or is the nil UUID.
pub fn resolve_user(raw: &str) -> TrackerResult<UserId> {
    let trimmed = raw.trim();
    match UserId::parse_str(trimmed) {
        Ok(user_id) if !user_id.is_nil() => Ok(user_id),
        _ => Err(TrackerError::InvalidUser(trimmed.to_string())),
    }
}

/// Resolves a metric name.
///
/// # Errors
/// - `InvalidMetric` for names outside the metric catalog.
pub fn resolve_metric(raw: &str) -> TrackerResult<MetricKind> {
    MetricKind::parse(raw)
        .ok_or_else(|| TrackerError::InvalidMetric(format!("unknown metric `{}`", raw.trim())))
}

/// Service facade over the bucket store and goal provider.
pub struct TrackerService<D: DayRepository, G: GoalRepository> {
    days: D,
    goals: G,
}

impl<D: DayRepository, G: GoalRepository> TrackerService<D, G> {
    pub fn new(days: D, goals: G) -> Self {
        Self { days, goals }
    }

    /// Ensures today's bucket exists and returns it.
    pub fn ensure_today(&self, user_id: &str, now_ms: i64) -> TrackerResult<DayRecord> {
        let user_id = resolve_user(user_id)?;
        let today = calendar::day_key_of(now_ms)?;
        Ok(self.days.ensure(user_id, today)?)
    }

    /// Looks up one bucket without creating it.
    pub fn day_record(&self, user_id: &str, day: DayKey) -> TrackerResult<Option<DayRecord>> {
        let user_id = resolve_user(user_id)?;
        Ok(self.days.get(user_id, day)?)
    }

    /// Adds each field of `fields` to today's `metric` totals.
    pub fn record_delta(
        &self,
        user_id: &str,
        metric: &str,
        fields: &MetricFields,
        now_ms: i64,
    ) -> TrackerResult<DayRecord> {
        self.record_fields(user_id, metric, fields, MergeMode::Delta, now_ms)
    }

    /// Overwrites today's `metric` totals with `totals`.
    pub fn record_replace(
        &self,
        user_id: &str,
        metric: &str,
        totals: &MetricFields,
        now_ms: i64,
    ) -> TrackerResult<DayRecord> {
        self.record_fields(user_id, metric, totals, MergeMode::Replace, now_ms)
    }

    /// Replaces today's meal list; nutrition totals follow the list.
    pub fn replace_meals(
        &self,
        user_id: &str,
        meals: Vec<MealEntry>,
        now_ms: i64,
    ) -> TrackerResult<DayRecord> {
        let started_at = Instant::now();
        let user_id = resolve_user(user_id)?;
        let today = calendar::day_key_of(now_ms)?;
        let goals = self.goals.goals(user_id)?;

        let result = self
            .days
            .mutate(user_id, today, |record| -> TrackerResult<DayRecord> {
                let mut updated = merge::replace_meals(record, meals)?;
                updated.recompute_health_score(&goals);
                Ok(updated)
            });
        log_write("replace_meals", user_id, today, "nutrition", started_at, &result);
        result
    }

    /// Reconciles unlocked intervals and persists the day's sessions.
    ///
    /// Locked drafts are skipped; every stored session is locked afterwards.
    /// The metric total is recomputed from all sessions of the day.
    ///
    /// # Errors
    /// - `InvalidMetric` when `metric` has no intervals.
    /// - `DegenerateInterval` when any draft has zero duration; nothing is
    ///   written in that case.
    pub fn commit_intervals(
        &self,
        user_id: &str,
        metric: &str,
        drafts: &[IntervalDraft],
        now_ms: i64,
    ) -> TrackerResult<DayRecord> {
        let started_at = Instant::now();
        let user_id = resolve_user(user_id)?;
        let metric = resolve_metric(metric)?;
        if !metric.has_intervals() {
            return Err(TrackerError::InvalidMetric(format!(
                "metric `{metric}` does not track intervals"
            )));
        }
        let today = calendar::day_key_of(now_ms)?;
        let goals = self.goals.goals(user_id)?;

        let result = self
            .days
            .mutate(user_id, today, |mut record| -> TrackerResult<DayRecord> {
                let sessions = reconcile::reconcile_day(today, record.sessions(metric), drafts)?;
                let minutes = f64::from(reconcile::total_minutes(&sessions));
                match metric {
                    MetricKind::Sleep => {
                        record.sleep.hours = minutes / 60.0;
                        record.sleep.sessions = sessions;
                    }
                    _ => {
                        record.workout.minutes = minutes;
                        record.workout.sessions = sessions;
                    }
                }
                record.recompute_health_score(&goals);
                Ok(record)
            });
        log_write("commit_intervals", user_id, today, metric.as_str(), started_at, &result);
        result
    }

    /// Builds the day/week/month series for one metric.
    pub fn query_range(
        &self,
        user_id: &str,
        metric: &str,
        range: &str,
        day_shape: DayShape,
        now_ms: i64,
    ) -> TrackerResult<Series> {
        let started_at = Instant::now();
        let query = RangeQuery {
            user_id: resolve_user(user_id)?,
            metric: resolve_metric(metric)?,
            range: RangeKind::parse(range)?,
            day_shape,
            now_ms,
        };
        let goals = self.goals.goals(query.user_id)?;
        let series = series::build_series(&self.days, &goals, &query)?;

        info!(
            "event=query_range module=tracker status=ok user={} metric={} range={} points={} duration_ms={}",
            user_tag(query.user_id),
            query.metric,
            query.range.as_str(),
            series.values.len(),
            started_at.elapsed().as_millis()
        );
        Ok(series)
    }

    /// Stores one goal target for the user.
    pub fn set_goal(&self, user_id: &str, kind: GoalKind, target: f64) -> TrackerResult<()> {
        let user_id = resolve_user(user_id)?;
        if !target.is_finite() || target <= 0.0 {
            return Err(TrackerError::InvalidMetric(format!(
                "goal `{}` must be a positive number, got {target}",
                kind.as_str()
            )));
        }
        self.goals.set_goal(user_id, kind, target)?;
        info!(
            "event=set_goal module=tracker status=ok user={} goal={}",
            user_tag(user_id),
            kind.as_str()
        );
        Ok(())
    }

    fn record_fields(
        &self,
        user_id: &str,
        metric: &str,
        fields: &MetricFields,
        mode: MergeMode,
        now_ms: i64,
    ) -> TrackerResult<DayRecord> {
        let started_at = Instant::now();
        let user_id = resolve_user(user_id)?;
        let metric = resolve_metric(metric)?;
        let today = calendar::day_key_of(now_ms)?;
        let goals = self.goals.goals(user_id)?;

        let result = self
            .days
            .mutate(user_id, today, |record| -> TrackerResult<DayRecord> {
                let mut updated = merge::merge_fields(record, metric, fields, mode)?;
                updated.recompute_health_score(&goals);
                Ok(updated)
            });
        let event = match mode {
            MergeMode::Delta => "record_delta",
            MergeMode::Replace => "record_replace",
        };
        log_write(event, user_id, today, metric.as_str(), started_at, &result);
        result
    }
}

/// Short, non-identifying user prefix for log lines.
fn user_tag(user_id: UserId) -> String {
    user_id.simple().to_string().chars().take(8).collect()
}

fn log_write(
    event: &str,
    user_id: UserId,
    day: DayKey,
    metric: &str,
    started_at: Instant,
    result: &TrackerResult<DayRecord>,
) {
    match result {
        Ok(_) => info!(
            "event={} module=tracker status=ok user={} day={} metric={} duration_ms={}",
            event,
            user_tag(user_id),
            day,
            metric,
            started_at.elapsed().as_millis()
        ),
        Err(err) => warn!(
            "event={} module=tracker status=error user={} day={} metric={} duration_ms={} error_code={}",
            event,
            user_tag(user_id),
            day,
            metric,
            started_at.elapsed().as_millis(),
            err.code()
        ),
    }
}
