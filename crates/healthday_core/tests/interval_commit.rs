use healthday_core::calendar::instant_at;
use healthday_core::db::open_db_in_memory;
use healthday_core::{
    Crossing, DayKey, DayShape, IntervalDraft, SqliteDayRepository, SqliteGoalRepository,
    TrackerError, TrackerService,
};
use rusqlite::Connection;
use uuid::Uuid;

type Service<'conn> = TrackerService<SqliteDayRepository<'conn>, SqliteGoalRepository<'conn>>;

fn service(conn: &Connection) -> Service<'_> {
    TrackerService::new(
        SqliteDayRepository::try_new(conn).unwrap(),
        SqliteGoalRepository::try_new(conn).unwrap(),
    )
}

fn today() -> DayKey {
    DayKey::from_ymd(2024, 3, 10).unwrap()
}

fn at(hour: u32, minute: u32) -> i64 {
    instant_at(today(), hour * 60 + minute)
}

fn now() -> i64 {
    at(8, 15)
}

#[test]
fn overnight_sleep_is_anchored_to_both_days() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let user = Uuid::new_v4().to_string();

    let record = service
        .commit_intervals(
            &user,
            "sleep",
            &[IntervalDraft::new(at(23, 30), at(7, 0))],
            now(),
        )
        .unwrap();

    let session = &record.sleep.sessions[0];
    assert_eq!(session.crossing, Crossing::Overnight);
    assert_eq!(session.start_day, DayKey::from_ymd(2024, 3, 9).unwrap());
    assert_eq!(session.end_day, today());
    assert_eq!(session.duration_minutes, 450);
    assert!(session.end_ms >= session.start_ms);
    assert!(session.locked);
    assert_eq!(record.sleep.hours, 7.5);
}

#[test]
fn same_day_workout_sums_into_minutes() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let user = Uuid::new_v4().to_string();

    let record = service
        .commit_intervals(
            &user,
            "workout",
            &[
                IntervalDraft::new(at(22, 0), at(23, 0)).with_note("run"),
                IntervalDraft::new(at(6, 0), at(6, 20)),
            ],
            now(),
        )
        .unwrap();

    assert_eq!(record.workout.sessions[0].crossing, Crossing::SameDay);
    assert_eq!(record.workout.sessions[0].duration_minutes, 60);
    assert_eq!(record.workout.minutes, 80.0);
    assert!(record.sleep.sessions.is_empty());
}

#[test]
fn second_commit_keeps_locked_sessions() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let user = Uuid::new_v4().to_string();

    let first = service
        .commit_intervals(&user, "sleep", &[IntervalDraft::new(at(23, 0), at(6, 30))], now())
        .unwrap();

    // The client echoes the saved interval as locked and adds a nap.
    let mut echoed = IntervalDraft::new(at(1, 0), at(2, 0));
    echoed.locked = true;
    let second = service
        .commit_intervals(
            &user,
            "sleep",
            &[echoed, IntervalDraft::new(at(13, 0), at(13, 30))],
            at(14, 0),
        )
        .unwrap();

    assert_eq!(second.sleep.sessions.len(), 2);
    assert_eq!(second.sleep.sessions[0], first.sleep.sessions[0]);
    assert_eq!(second.sleep.hours, 8.0);
    assert!(second.sleep.sessions.iter().all(|session| session.locked));
}

#[test]
fn degenerate_interval_rejects_whole_commit() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let user = Uuid::new_v4().to_string();

    let err = service
        .commit_intervals(
            &user,
            "sleep",
            &[
                IntervalDraft::new(at(22, 0), at(6, 0)),
                IntervalDraft::new(at(12, 0), at(12, 0)),
            ],
            now(),
        )
        .unwrap_err();

    assert!(matches!(err, TrackerError::DegenerateInterval { .. }));
    assert!(service.day_record(&user, today()).unwrap().is_none());
}

#[test]
fn only_interval_metrics_accept_commits() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let user = Uuid::new_v4().to_string();

    let err = service
        .commit_intervals(&user, "water", &[IntervalDraft::new(at(9, 0), at(10, 0))], now())
        .unwrap_err();
    assert!(matches!(err, TrackerError::InvalidMetric(_)));
}

#[test]
fn committed_sleep_feeds_the_day_series() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let user = Uuid::new_v4().to_string();

    service
        .commit_intervals(&user, "sleep", &[IntervalDraft::new(at(23, 30), at(7, 0))], now())
        .unwrap();

    let series = service
        .query_range(&user, "sleep", "day", DayShape::VersusGoal, now())
        .unwrap();
    assert_eq!(series.labels, vec!["Today", "Goal"]);
    assert_eq!(series.values, vec![7.5, 8.0]);
}
