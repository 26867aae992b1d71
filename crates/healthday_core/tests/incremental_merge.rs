use healthday_core::calendar::instant_at;
use healthday_core::db::open_db_in_memory;
use healthday_core::{
    DayKey, IntervalDraft, MealEntry, MetricFields, SqliteDayRepository, SqliteGoalRepository,
    TrackerError, TrackerService,
};
use rusqlite::Connection;
use std::time::Duration;
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

fn now() -> i64 {
    instant_at(today(), 18 * 60)
}

fn fields(pairs: &[(&str, f64)]) -> MetricFields {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), *value))
        .collect()
}

fn record_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM day_records;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn step_deltas_sum_into_one_bucket() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let user = Uuid::new_v4().to_string();

    for steps in [100.0, 250.0, 50.0] {
        service
            .record_delta(&user, "steps", &fields(&[("count", steps)]), now())
            .unwrap();
    }

    let record = service.day_record(&user, today()).unwrap().unwrap();
    assert_eq!(record.steps.count, 400);
    assert_eq!(record_count(&conn), 1);
}

#[test]
fn first_delta_of_the_day_equals_stored_value() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let user = Uuid::new_v4().to_string();

    let record = service
        .record_delta(
            &user,
            "steps",
            &fields(&[("count", 320.0), ("distance_m", 240.5)]),
            now(),
        )
        .unwrap();
    assert_eq!(record.steps.count, 320);
    assert_eq!(record.steps.distance_m, 240.5);
}

#[test]
fn replace_overwrites_while_delta_accumulates() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let replaced = Uuid::new_v4().to_string();
    let added = Uuid::new_v4().to_string();

    for kcal in [500.0, 300.0] {
        service
            .record_replace(&replaced, "nutrition", &fields(&[("kcal", kcal)]), now())
            .unwrap();
        service
            .record_delta(&added, "nutrition", &fields(&[("kcal", kcal)]), now())
            .unwrap();
    }

    let replaced = service.day_record(&replaced, today()).unwrap().unwrap();
    let added = service.day_record(&added, today()).unwrap().unwrap();
    assert_eq!(replaced.nutrition.kcal, 300.0);
    assert_eq!(added.nutrition.kcal, 800.0);
}

#[test]
fn updates_land_in_the_fixed_offset_day() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let user = Uuid::new_v4().to_string();

    // 23:59 local on the 10th, then exactly midnight of the 11th.
    service
        .record_delta(&user, "water", &fields(&[("ml", 250.0)]), instant_at(today(), 23 * 60 + 59))
        .unwrap();
    service
        .record_delta(&user, "water", &fields(&[("ml", 500.0)]), instant_at(today(), 24 * 60))
        .unwrap();

    let tenth = service.day_record(&user, today()).unwrap().unwrap();
    let eleventh = service
        .day_record(&user, DayKey::from_ymd(2024, 3, 11).unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(tenth.water.ml, 250.0);
    assert_eq!(eleventh.water.ml, 500.0);
}

#[test]
fn ensure_today_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let user = Uuid::new_v4().to_string();

    service
        .record_delta(&user, "water", &fields(&[("ml", 300.0)]), now())
        .unwrap();
    for _ in 0..3 {
        let record = service.ensure_today(&user, now()).unwrap();
        assert_eq!(record.water.ml, 300.0);
    }
    assert_eq!(record_count(&conn), 1);
}

#[test]
fn invalid_user_writes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    for user in ["not-a-uuid", "", "00000000-0000-0000-0000-000000000000"] {
        let err = service
            .record_delta(user, "steps", &fields(&[("count", 10.0)]), now())
            .unwrap_err();
        assert!(matches!(err, TrackerError::InvalidUser(_)), "{err}");
    }
    assert_eq!(record_count(&conn), 0);
}

#[test]
fn invalid_metric_payload_is_all_or_nothing() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let user = Uuid::new_v4().to_string();

    let unknown_metric = service
        .record_delta(&user, "heart_rate", &fields(&[("bpm", 60.0)]), now())
        .unwrap_err();
    assert_eq!(unknown_metric.code(), "invalid_metric");

    let mixed = service
        .record_delta(
            &user,
            "steps",
            &fields(&[("count", 10.0), ("floors", 2.0)]),
            now(),
        )
        .unwrap_err();
    assert!(matches!(mixed, TrackerError::InvalidMetric(_)));
    assert_eq!(record_count(&conn), 0);

    service
        .record_delta(&user, "steps", &fields(&[("count", 10.0)]), now())
        .unwrap();
    let rejected = service
        .record_delta(&user, "steps", &fields(&[("count", -20.0)]), now())
        .unwrap_err();
    assert!(matches!(rejected, TrackerError::InvalidMetric(_)));
    let record = service.day_record(&user, today()).unwrap().unwrap();
    assert_eq!(record.steps.count, 10);
}

#[test]
fn body_measures_are_replaced() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let user = Uuid::new_v4().to_string();

    service
        .record_replace(
            &user,
            "body",
            &fields(&[("weight_kg", 70.5), ("height_cm", 172.0)]),
            now(),
        )
        .unwrap();
    let record = service
        .record_replace(&user, "body", &fields(&[("weight_kg", 70.1)]), now())
        .unwrap();
    assert_eq!(record.body.weight_kg, 70.1);
    assert_eq!(record.body.height_cm, 0.0);

    let err = service
        .record_delta(&user, "body", &fields(&[("weight_kg", 0.5)]), now())
        .unwrap_err();
    assert!(matches!(err, TrackerError::InvalidMetric(_)));
}

#[test]
fn replace_meals_persists_list_and_totals() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let user = Uuid::new_v4().to_string();
    let meals = vec![
        MealEntry {
            name: "pho".to_string(),
            kcal: 450.0,
            protein_g: 25.0,
            carbs_g: 60.0,
            fat_g: 10.0,
            eaten_at_ms: Some(now()),
        },
        MealEntry {
            name: "banana".to_string(),
            kcal: 105.0,
            carbs_g: 27.0,
            ..MealEntry::default()
        },
    ];

    service.replace_meals(&user, meals.clone(), now()).unwrap();
    service.replace_meals(&user, meals.clone(), now()).unwrap();

    let record = service.day_record(&user, today()).unwrap().unwrap();
    assert_eq!(record.nutrition.meals, meals);
    assert_eq!(record.nutrition.kcal, 555.0);
    assert_eq!(record.nutrition.carbs_g, 87.0);
}

#[test]
fn health_score_tracks_goals() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let user = Uuid::new_v4().to_string();

    let record = service
        .record_delta(&user, "steps", &fields(&[("count", 5_000.0)]), now())
        .unwrap();
    // Half of the default step goal, every other ratio zero.
    assert_eq!(record.health_score, 10.0);

    service
        .set_goal(&user, healthday_core::GoalKind::Steps, 5_000.0)
        .unwrap();
    let record = service
        .record_delta(&user, "steps", &fields(&[("count", 0.0)]), now())
        .unwrap();
    assert_eq!(record.health_score, 20.0);
}

#[test]
fn replace_overwrites_the_whole_sub_record() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let user = Uuid::new_v4().to_string();

    service
        .record_replace(
            &user,
            "nutrition",
            &fields(&[("kcal", 500.0), ("fat_g", 20.0)]),
            now(),
        )
        .unwrap();
    let record = service
        .record_replace(&user, "nutrition", &fields(&[("kcal", 300.0)]), now())
        .unwrap();
    assert_eq!(record.nutrition.kcal, 300.0);
    assert_eq!(record.nutrition.fat_g, 0.0);

    service
        .replace_meals(
            &user,
            vec![MealEntry {
                name: "bun cha".to_string(),
                kcal: 700.0,
                ..MealEntry::default()
            }],
            now(),
        )
        .unwrap();
    let record = service
        .record_replace(&user, "nutrition", &fields(&[("kcal", 100.0)]), now())
        .unwrap();
    assert_eq!(record.nutrition.kcal, 100.0);
    assert!(record.nutrition.meals.is_empty());

    let stored = service.day_record(&user, today()).unwrap().unwrap();
    assert_eq!(stored, record);
}

#[test]
fn replace_is_refused_once_sessions_own_the_total() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let user = Uuid::new_v4().to_string();

    service
        .commit_intervals(
            &user,
            "sleep",
            &[IntervalDraft::new(
                instant_at(today(), 23 * 60),
                instant_at(today(), 7 * 60),
            )],
            now(),
        )
        .unwrap();

    let err = service
        .record_replace(&user, "sleep", &fields(&[("hours", 5.0)]), now())
        .unwrap_err();
    assert!(matches!(err, TrackerError::InvalidMetric(_)));

    let stored = service.day_record(&user, today()).unwrap().unwrap();
    assert_eq!(stored.sleep.hours, 8.0);
    assert_eq!(stored.sleep.sessions.len(), 1);

    // Without sessions the client total is accepted as-is.
    let record = service
        .record_replace(&user, "workout", &fields(&[("minutes", 45.0)]), now())
        .unwrap();
    assert_eq!(record.workout.minutes, 45.0);
}

#[test]
fn locked_store_surfaces_storage_unavailable_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("locked.db");
    let conn = healthday_core::db::open_db(&path).unwrap();
    conn.busy_timeout(Duration::from_millis(50)).unwrap();
    let service = service(&conn);
    let user = Uuid::new_v4().to_string();

    let holder = healthday_core::db::open_db(&path).unwrap();
    holder.execute_batch("BEGIN IMMEDIATE;").unwrap();

    let err = service
        .record_delta(&user, "water", &fields(&[("ml", 250.0)]), now())
        .unwrap_err();
    assert!(matches!(err, TrackerError::StorageUnavailable(_)));
    assert_eq!(err.code(), "storage_unavailable");

    holder.execute_batch("COMMIT;").unwrap();
    assert_eq!(record_count(&holder), 0);

    let record = service
        .record_delta(&user, "water", &fields(&[("ml", 250.0)]), now())
        .unwrap();
    assert_eq!(record.water.ml, 250.0);
}
