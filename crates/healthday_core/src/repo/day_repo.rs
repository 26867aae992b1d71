//! Day bucket repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Store exactly one `DayRecord` per `(user, day)`.
//! - Provide `ensure`/`get`/`mutate` as the only access paths to buckets.
//!
//! # Invariants
//! - `ensure` never duplicates and never resets an existing bucket.
//! - `get` never creates a bucket.
//! - `mutate` runs read-modify-write inside one `IMMEDIATE` transaction; an
//!   updater error rolls back everything, including the implicit ensure.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::calendar::DayKey;
use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::day_record::{
    BodyMeasures, DayRecord, MealEntry, NutritionTotals, SleepTotals, StepsTotals, WaterTotals,
    WorkoutTotals,
};
use crate::model::interval::{Crossing, Session};
use crate::model::metric::{MetricKind, UserId};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const DAY_SELECT_SQL: &str = "SELECT
    user_id,
    day_key,
    steps_count,
    steps_distance_m,
    steps_duration_min,
    steps_kcal,
    sleep_hours,
    nutrition_kcal,
    nutrition_fat_g,
    nutrition_protein_g,
    nutrition_carbs_g,
    nutrition_meals,
    water_ml,
    workout_minutes,
    body_weight_kg,
    body_height_cm,
    health_score
FROM day_records";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for bucket and goal persistence.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// An updater returned a record for a different bucket.
    KeyMismatch {
        expected: (UserId, DayKey),
        actual: (UserId, DayKey),
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted day data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::KeyMismatch { expected, actual } => write!(
                f,
                "updater changed bucket key from {}/{} to {}/{}",
                expected.0, expected.1, actual.0, actual.1
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Bucket store keyed by `(user, calendar day)`.
pub trait DayRepository {
    /// Returns the bucket, creating a zero-initialized one when absent.
    fn ensure(&self, user_id: UserId, day: DayKey) -> RepoResult<DayRecord>;

    /// Looks up a bucket without creating it.
    fn get(&self, user_id: UserId, day: DayKey) -> RepoResult<Option<DayRecord>>;

    /// Atomically replaces the bucket with `updater(current)`.
    ///
    /// The bucket is ensured first; the stored result is returned.
    fn mutate<F, E>(&self, user_id: UserId, day: DayKey, updater: F) -> Result<DayRecord, E>
    where
        F: FnOnce(DayRecord) -> Result<DayRecord, E>,
        E: From<RepoError>;
}

/// SQLite-backed bucket store.
pub struct SqliteDayRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDayRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl DayRepository for SqliteDayRepository<'_> {
    fn ensure(&self, user_id: UserId, day: DayKey) -> RepoResult<DayRecord> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        insert_if_absent(&tx, user_id, day)?;
        let record = load_existing(&tx, user_id, day)?;
        tx.commit()?;
        Ok(record)
    }

    fn get(&self, user_id: UserId, day: DayKey) -> RepoResult<Option<DayRecord>> {
        load_day(self.conn, user_id, day)
    }

    fn mutate<F, E>(&self, user_id: UserId, day: DayKey, updater: F) -> Result<DayRecord, E>
    where
        F: FnOnce(DayRecord) -> Result<DayRecord, E>,
        E: From<RepoError>,
    {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(RepoError::from)?;
        insert_if_absent(&tx, user_id, day)?;
        let current = load_existing(&tx, user_id, day)?;

        // Dropping `tx` on the error paths below rolls the ensure back too.
        let updated = updater(current)?;
        if updated.user_id != user_id || updated.day != day {
            return Err(RepoError::KeyMismatch {
                expected: (user_id, day),
                actual: (updated.user_id, updated.day),
            }
            .into());
        }

        write_day(&tx, &updated)?;
        tx.commit().map_err(RepoError::from)?;
        Ok(updated)
    }
}

pub(crate) fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

fn insert_if_absent(conn: &Connection, user_id: UserId, day: DayKey) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO day_records (user_id, day_key)
         VALUES (?1, ?2)
         ON CONFLICT (user_id, day_key) DO NOTHING;",
        params![user_id.to_string(), day.to_string()],
    )?;
    Ok(())
}

fn load_existing(conn: &Connection, user_id: UserId, day: DayKey) -> RepoResult<DayRecord> {
    load_day(conn, user_id, day)?.ok_or_else(|| {
        RepoError::InvalidData(format!("bucket {user_id}/{day} vanished inside transaction"))
    })
}

fn load_day(conn: &Connection, user_id: UserId, day: DayKey) -> RepoResult<Option<DayRecord>> {
    let mut stmt = conn.prepare(&format!(
        "{DAY_SELECT_SQL}
         WHERE user_id = ?1 AND day_key = ?2;"
    ))?;
    let record = stmt
        .query_row(params![user_id.to_string(), day.to_string()], |row| {
            Ok(parse_day_row(row))
        })
        .optional()?;

    let Some(record) = record else {
        return Ok(None);
    };
    let mut record = record?;
    record.sleep.sessions = load_sessions(conn, user_id, day, MetricKind::Sleep)?;
    record.workout.sessions = load_sessions(conn, user_id, day, MetricKind::Workout)?;
    Ok(Some(record))
}

fn parse_day_row(row: &Row<'_>) -> RepoResult<DayRecord> {
    let user_text: String = row.get("user_id")?;
    let user_id = UserId::parse_str(&user_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid user id `{user_text}` in day_records.user_id"))
    })?;
    let day = parse_day_column(row, "day_key")?;

    let meals_json: String = row.get("nutrition_meals")?;
    let meals: Vec<MealEntry> = serde_json::from_str(&meals_json).map_err(|err| {
        RepoError::InvalidData(format!("invalid meal list in day_records.nutrition_meals: {err}"))
    })?;

    Ok(DayRecord {
        user_id,
        day,
        steps: StepsTotals {
            count: row.get("steps_count")?,
            distance_m: row.get("steps_distance_m")?,
            duration_min: row.get("steps_duration_min")?,
            kcal: row.get("steps_kcal")?,
        },
        sleep: SleepTotals {
            hours: row.get("sleep_hours")?,
            sessions: Vec::new(),
        },
        nutrition: NutritionTotals {
            kcal: row.get("nutrition_kcal")?,
            fat_g: row.get("nutrition_fat_g")?,
            protein_g: row.get("nutrition_protein_g")?,
            carbs_g: row.get("nutrition_carbs_g")?,
            meals,
        },
        water: WaterTotals {
            ml: row.get("water_ml")?,
        },
        workout: WorkoutTotals {
            minutes: row.get("workout_minutes")?,
            sessions: Vec::new(),
        },
        body: BodyMeasures {
            weight_kg: row.get("body_weight_kg")?,
            height_cm: row.get("body_height_cm")?,
        },
        health_score: row.get("health_score")?,
    })
}

fn load_sessions(
    conn: &Connection,
    user_id: UserId,
    day: DayKey,
    metric: MetricKind,
) -> RepoResult<Vec<Session>> {
    let mut stmt = conn.prepare(
        "SELECT start_ms, end_ms, start_day, end_day, duration_minutes, crossing, note, locked
         FROM day_sessions
         WHERE user_id = ?1 AND day_key = ?2 AND metric = ?3
         ORDER BY seq ASC;",
    )?;
    let mut rows = stmt.query(params![user_id.to_string(), day.to_string(), metric.as_str()])?;
    let mut sessions = Vec::new();
    while let Some(row) = rows.next()? {
        sessions.push(parse_session_row(row)?);
    }
    Ok(sessions)
}

fn parse_session_row(row: &Row<'_>) -> RepoResult<Session> {
    let crossing_text: String = row.get("crossing")?;
    let crossing = Crossing::parse(&crossing_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid crossing `{crossing_text}` in day_sessions.crossing"
        ))
    })?;
    let locked = match row.get::<_, i64>("locked")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid locked value `{other}` in day_sessions.locked"
            )));
        }
    };

    Ok(Session {
        start_ms: row.get("start_ms")?,
        end_ms: row.get("end_ms")?,
        start_day: parse_day_column(row, "start_day")?,
        end_day: parse_day_column(row, "end_day")?,
        duration_minutes: row.get("duration_minutes")?,
        crossing,
        note: row.get("note")?,
        locked,
    })
}

fn parse_day_column(row: &Row<'_>, column: &str) -> RepoResult<DayKey> {
    let text: String = row.get(column)?;
    DayKey::parse(&text)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid day `{text}` in {column}")))
}

fn write_day(conn: &Connection, record: &DayRecord) -> RepoResult<()> {
    let user_text = record.user_id.to_string();
    let day_text = record.day.to_string();
    let meals_json = serde_json::to_string(&record.nutrition.meals).map_err(|err| {
        RepoError::InvalidData(format!("meal list cannot be serialized: {err}"))
    })?;

    conn.execute(
        "UPDATE day_records
         SET
            steps_count = ?3,
            steps_distance_m = ?4,
            steps_duration_min = ?5,
            steps_kcal = ?6,
            sleep_hours = ?7,
            nutrition_kcal = ?8,
            nutrition_fat_g = ?9,
            nutrition_protein_g = ?10,
            nutrition_carbs_g = ?11,
            nutrition_meals = ?12,
            water_ml = ?13,
            workout_minutes = ?14,
            body_weight_kg = ?15,
            body_height_cm = ?16,
            health_score = ?17,
            updated_at = (strftime('%s', 'now') * 1000)
         WHERE user_id = ?1 AND day_key = ?2;",
        params![
            user_text,
            day_text,
            record.steps.count,
            record.steps.distance_m,
            record.steps.duration_min,
            record.steps.kcal,
            record.sleep.hours,
            record.nutrition.kcal,
            record.nutrition.fat_g,
            record.nutrition.protein_g,
            record.nutrition.carbs_g,
            meals_json,
            record.water.ml,
            record.workout.minutes,
            record.body.weight_kg,
            record.body.height_cm,
            record.health_score,
        ],
    )?;

    conn.execute(
        "DELETE FROM day_sessions WHERE user_id = ?1 AND day_key = ?2;",
        params![user_text, day_text],
    )?;
    for metric in [MetricKind::Sleep, MetricKind::Workout] {
        for (seq, session) in record.sessions(metric).iter().enumerate() {
            conn.execute(
                "INSERT INTO day_sessions (
                    user_id,
                    day_key,
                    metric,
                    seq,
                    start_ms,
                    end_ms,
                    start_day,
                    end_day,
                    duration_minutes,
                    crossing,
                    note,
                    locked
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12);",
                params![
                    user_text,
                    day_text,
                    metric.as_str(),
                    seq as i64,
                    session.start_ms,
                    session.end_ms,
                    session.start_day.to_string(),
                    session.end_day.to_string(),
                    session.duration_minutes,
                    session.crossing.as_str(),
                    session.note.as_deref(),
                    bool_to_int(session.locked),
                ],
            )?;
        }
    }

    Ok(())
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
