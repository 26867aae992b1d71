//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the tracker operations to Dart via FRB as sync calls.
//! - Translate engine errors into stable `error_code` strings.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every call opens the configured database, so no connection outlives a
//!   request.
//! - `now_epoch_ms` is always supplied by the caller.

use healthday_core::db::open_db;
use healthday_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    DayRecord, DayShape, IntervalDraft, MealEntry, MetricFields, Series, SqliteDayRepository,
    SqliteGoalRepository, TrackerConfig, TrackerError, TrackerService,
};
use log::warn;
use std::path::PathBuf;
use std::sync::OnceLock;

static TRACKER_DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One named numeric field of a delta/replace payload.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFieldInput {
    pub name: String,
    pub value: f64,
}

/// One edited interval as held by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalInput {
    pub start_epoch_ms: i64,
    pub end_epoch_ms: i64,
    pub note: Option<String>,
    pub locked: bool,
}

/// One meal as held by the client.
#[derive(Debug, Clone, PartialEq)]
pub struct MealInput {
    pub name: String,
    pub kcal: f64,
    pub fat_g: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub eaten_at_epoch_ms: Option<i64>,
}

/// Result envelope for write operations.
#[derive(Debug, Clone, PartialEq)]
pub struct DayWriteResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Stable error code (`invalid_user`, `invalid_metric`, ...), empty on success.
    pub error_code: String,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
    /// Calendar day written, `YYYY-MM-DD`.
    pub day: Option<String>,
    /// Metric value after the write, in series display units.
    pub value: Option<f64>,
    pub health_score: Option<f64>,
}

impl DayWriteResponse {
    fn success(record: &DayRecord, value: f64) -> Self {
        Self {
            ok: true,
            error_code: String::new(),
            message: "Saved.".to_string(),
            day: Some(record.day.to_string()),
            value: Some(value),
            health_score: Some(record.health_score),
        }
    }

    fn failure(error_code: &str, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error_code: error_code.to_string(),
            message: message.into(),
            day: None,
            value: None,
            health_score: None,
        }
    }
}

/// Result envelope for range queries.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeResponse {
    pub ok: bool,
    pub error_code: String,
    pub message: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub goal: Option<f64>,
    pub average: f64,
    pub total: f64,
}

impl RangeResponse {
    fn success(series: Series) -> Self {
        Self {
            ok: true,
            error_code: String::new(),
            message: String::new(),
            labels: series.labels,
            values: series.values,
            goal: series.goal,
            average: series.average,
            total: series.total,
        }
    }

    fn failure(error_code: &str, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error_code: error_code.to_string(),
            message: message.into(),
            labels: Vec::new(),
            values: Vec::new(),
            goal: None,
            average: 0.0,
            total: 0.0,
        }
    }
}

/// Adds numeric fields to today's totals for `metric`.
///
/// # FFI contract
/// - Sync call, DB-backed execution; expected when a tracked screen exits.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn record_delta(
    user_id: String,
    metric: String,
    fields: Vec<MetricFieldInput>,
    now_epoch_ms: i64,
) -> DayWriteResponse {
    let fields = to_metric_fields(fields);
    write_with_service("record_delta", &metric, |service| {
        service.record_delta(&user_id, &metric, &fields, now_epoch_ms)
    })
}

/// Overwrites today's totals for `metric`.
#[flutter_rust_bridge::frb(sync)]
pub fn record_replace(
    user_id: String,
    metric: String,
    totals: Vec<MetricFieldInput>,
    now_epoch_ms: i64,
) -> DayWriteResponse {
    let totals = to_metric_fields(totals);
    write_with_service("record_replace", &metric, |service| {
        service.record_replace(&user_id, &metric, &totals, now_epoch_ms)
    })
}

/// Replaces today's meal list; nutrition totals are recomputed from it.
#[flutter_rust_bridge::frb(sync)]
pub fn replace_meals(user_id: String, meals: Vec<MealInput>, now_epoch_ms: i64) -> DayWriteResponse {
    let meals = meals
        .into_iter()
        .map(|meal| MealEntry {
            name: meal.name.trim().to_string(),
            kcal: meal.kcal,
            fat_g: meal.fat_g,
            protein_g: meal.protein_g,
            carbs_g: meal.carbs_g,
            eaten_at_ms: meal.eaten_at_epoch_ms,
        })
        .collect::<Vec<_>>();
    write_with_service("replace_meals", "nutrition", |service| {
        service.replace_meals(&user_id, meals, now_epoch_ms)
    })
}

/// Reconciles unlocked intervals for `metric` (`sleep|workout`) and saves.
///
/// # FFI contract
/// - All-or-nothing: a zero-length interval fails the whole call with
///   `degenerate_interval`.
#[flutter_rust_bridge::frb(sync)]
pub fn commit_intervals(
    user_id: String,
    metric: String,
    intervals: Vec<IntervalInput>,
    now_epoch_ms: i64,
) -> DayWriteResponse {
    let drafts = intervals
        .into_iter()
        .map(|interval| IntervalDraft {
            start_ms: interval.start_epoch_ms,
            end_ms: interval.end_epoch_ms,
            note: interval.note,
            locked: interval.locked,
        })
        .collect::<Vec<_>>();
    write_with_service("commit_intervals", &metric, |service| {
        service.commit_intervals(&user_id, &metric, &drafts, now_epoch_ms)
    })
}

/// Returns the `day|week|month` series for `metric`.
///
/// `compare_goal` selects the `[actual, goal]` shape for day ranges.
#[flutter_rust_bridge::frb(sync)]
pub fn query_range(
    user_id: String,
    metric: String,
    range: String,
    compare_goal: bool,
    now_epoch_ms: i64,
) -> RangeResponse {
    let day_shape = if compare_goal {
        DayShape::VersusGoal
    } else {
        DayShape::Actual
    };
    match with_service(|service| {
        service.query_range(&user_id, &metric, &range, day_shape, now_epoch_ms)
    }) {
        Ok(series) => RangeResponse::success(series),
        Err((code, message)) => RangeResponse::failure(code, message),
    }
}

fn to_metric_fields(fields: Vec<MetricFieldInput>) -> MetricFields {
    fields
        .into_iter()
        .map(|field| (field.name.trim().to_string(), field.value))
        .collect()
}

fn resolve_db_path() -> PathBuf {
    TRACKER_DB_PATH
        .get_or_init(|| TrackerConfig::from_env().db_path)
        .clone()
}

fn write_with_service(
    operation: &str,
    metric: &str,
    f: impl FnOnce(
        &TrackerService<SqliteDayRepository<'_>, SqliteGoalRepository<'_>>,
    ) -> Result<DayRecord, TrackerError>,
) -> DayWriteResponse {
    match with_service(f) {
        Ok(record) => {
            let value = healthday_core::MetricKind::parse(metric)
                .map_or(0.0, |metric| record.primary_value(metric));
            DayWriteResponse::success(&record, value)
        }
        Err((code, message)) => {
            warn!("event=ffi_call module=ffi status=error op={operation} error_code={code}");
            DayWriteResponse::failure(code, format!("{operation} failed: {message}"))
        }
    }
}

fn with_service<T>(
    f: impl FnOnce(
        &TrackerService<SqliteDayRepository<'_>, SqliteGoalRepository<'_>>,
    ) -> Result<T, TrackerError>,
) -> Result<T, (&'static str, String)> {
    let storage_error = |err: String| ("storage_unavailable", err);
    let db_path = resolve_db_path();
    let conn = open_db(&db_path)
        .map_err(|err| storage_error(format!("tracker DB open failed: {err}")))?;
    let days = SqliteDayRepository::try_new(&conn)
        .map_err(|err| storage_error(format!("day repo init failed: {err}")))?;
    let goals = SqliteGoalRepository::try_new(&conn)
        .map_err(|err| storage_error(format!("goal repo init failed: {err}")))?;
    let service = TrackerService::new(days, goals);
    f(&service).map_err(|err| (err.code(), err.to_string()))
}
