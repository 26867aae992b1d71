//! Core engine for HealthDay.
//! Owns day bucketing, incremental merging, interval reconciliation and
//! range series; every other layer calls in through `TrackerService`.

pub mod calendar;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use calendar::{add_days, day_key_of, start_of_day, CalendarError, DayKey, FIXED_OFFSET_MS};
pub use config::TrackerConfig;
pub use logging::{default_log_level, init_logging, init_logging_from_config};
pub use model::day_record::{DayRecord, MealEntry};
pub use model::goal::{GoalKind, GoalSet};
pub use model::interval::{Crossing, IntervalDraft, Session};
pub use model::metric::{MetricFields, MetricKind, UserId};
pub use repo::day_repo::{DayRepository, RepoError, RepoResult, SqliteDayRepository};
pub use repo::goal_repo::{GoalRepository, SqliteGoalRepository};
pub use service::error::{TrackerError, TrackerResult};
pub use service::series::{average_nonzero, DayShape, RangeKind, Series};
pub use service::tracker_service::{resolve_user, TrackerService};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
