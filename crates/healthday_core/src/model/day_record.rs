//! Per-user, per-day aggregate record (the day bucket).
//!
//! # Responsibility
//! - Hold every metric sub-record for one `(UserId, DayKey)`.
//! - Expose the primary series value of each metric.
//! - Derive the health score from current totals and goals.
//!
//! # Invariants
//! - `DayRecord::new` zero-initializes every metric field.
//! - `health_score` stays within `0.0..=100.0`.

use crate::calendar::DayKey;
use crate::model::goal::GoalSet;
use crate::model::interval::Session;
use crate::model::metric::{MetricKind, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepsTotals {
    pub count: i64,
    pub distance_m: f64,
    pub duration_min: f64,
    pub kcal: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SleepTotals {
    pub hours: f64,
    /// Ordered by save order; overnight sessions keep their explicit start day.
    pub sessions: Vec<Session>,
}

/// One logged meal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealEntry {
    pub name: String,
    pub kcal: f64,
    pub fat_g: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub eaten_at_ms: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionTotals {
    pub kcal: f64,
    pub fat_g: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub meals: Vec<MealEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaterTotals {
    pub ml: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkoutTotals {
    pub minutes: f64,
    pub sessions: Vec<Session>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BodyMeasures {
    pub weight_kg: f64,
    pub height_cm: f64,
}

/// Aggregate of everything logged by one user on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRecord {
    pub user_id: UserId,
    pub day: DayKey,
    pub steps: StepsTotals,
    pub sleep: SleepTotals,
    pub nutrition: NutritionTotals,
    pub water: WaterTotals,
    pub workout: WorkoutTotals,
    pub body: BodyMeasures,
    pub health_score: f64,
}

impl DayRecord {
    /// Creates a zero-initialized record for one user/day.
    pub fn new(user_id: UserId, day: DayKey) -> Self {
        Self {
            user_id,
            day,
            steps: StepsTotals::default(),
            sleep: SleepTotals::default(),
            nutrition: NutritionTotals::default(),
            water: WaterTotals::default(),
            workout: WorkoutTotals::default(),
            body: BodyMeasures::default(),
            health_score: 0.0,
        }
    }

    /// Value plotted for `metric` in day/week/month series.
    pub fn primary_value(&self, metric: MetricKind) -> f64 {
        match metric {
            MetricKind::Steps => self.steps.count as f64,
            MetricKind::Sleep => self.sleep.hours,
            MetricKind::Nutrition => self.nutrition.kcal,
            MetricKind::Water => self.water.ml,
            MetricKind::Workout => self.workout.minutes,
            MetricKind::Body => self.body.weight_kg,
        }
    }

    /// Sessions owned by an interval metric; empty for other metrics.
    pub fn sessions(&self, metric: MetricKind) -> &[Session] {
        match metric {
            MetricKind::Sleep => &self.sleep.sessions,
            MetricKind::Workout => &self.workout.sessions,
            _ => &[],
        }
    }

    /// Recomputes `health_score` against `goals`.
    ///
    /// Steps, water, sleep and workout score their completion ratio capped at
    /// one. Calories score closeness to the goal so overshooting is not
    /// rewarded. The score is the mean of the five ratios, scaled to 0..=100.
    pub fn recompute_health_score(&mut self, goals: &GoalSet) {
        let ratios = [
            completion(self.steps.count as f64, goals.steps),
            completion(self.water.ml, goals.water_ml),
            completion(self.sleep.hours * 60.0, goals.sleep_minutes),
            completion(self.workout.minutes, goals.workout_minutes),
            closeness(self.nutrition.kcal, goals.calories),
        ];
        let mean = ratios.iter().sum::<f64>() / ratios.len() as f64;
        self.health_score = (mean * 1000.0).round() / 10.0;
    }
}

fn completion(actual: f64, goal: f64) -> f64 {
    if goal <= 0.0 {
        return 0.0;
    }
    (actual / goal).clamp(0.0, 1.0)
}

fn closeness(actual: f64, goal: f64) -> f64 {
    if goal <= 0.0 || actual <= 0.0 {
        return 0.0;
    }
    (1.0 - (actual - goal).abs() / goal).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::DayRecord;
    use crate::calendar::DayKey;
    use crate::model::goal::GoalSet;
    use crate::model::metric::MetricKind;
    use uuid::Uuid;

    fn record() -> DayRecord {
        DayRecord::new(
            Uuid::new_v4(),
            DayKey::from_ymd(2024, 3, 10).expect("valid date"),
        )
    }

    #[test]
    fn new_record_is_zeroed() {
        let record = record();
        for metric in MetricKind::ALL {
            assert_eq!(record.primary_value(metric), 0.0);
        }
        assert!(record.sleep.sessions.is_empty());
        assert_eq!(record.health_score, 0.0);
    }

    #[test]
    fn health_score_caps_each_ratio() {
        let mut record = record();
        record.steps.count = 20_000;
        record.water.ml = 2_000.0;
        record.sleep.hours = 8.0;
        record.workout.minutes = 30.0;
        record.nutrition.kcal = 2_000.0;
        record.recompute_health_score(&GoalSet::default());
        assert_eq!(record.health_score, 100.0);
    }

    #[test]
    fn health_score_penalizes_calorie_overshoot() {
        let mut record = record();
        record.nutrition.kcal = 3_000.0;
        record.recompute_health_score(&GoalSet::default());
        // Only calories contribute: closeness 0.5 over five ratios.
        assert_eq!(record.health_score, 10.0);
    }
}
