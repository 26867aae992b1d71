//! Per-user daily targets.
//!
//! # Invariants
//! - A missing goal always resolves to the documented default below.
//! - Targets are stored in their canonical unit (sleep in minutes).

use crate::model::metric::MetricKind;
use serde::{Deserialize, Serialize};

pub const DEFAULT_STEPS_GOAL: f64 = 10_000.0;
pub const DEFAULT_CALORIES_GOAL: f64 = 2_000.0;
pub const DEFAULT_WORKOUT_MINUTES_GOAL: f64 = 30.0;
pub const DEFAULT_WATER_ML_GOAL: f64 = 2_000.0;
pub const DEFAULT_SLEEP_MINUTES_GOAL: f64 = 480.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalKind {
    Steps,
    Calories,
    WorkoutMinutes,
    WaterMl,
    SleepMinutes,
}

impl GoalKind {
    pub const ALL: [GoalKind; 5] = [
        GoalKind::Steps,
        GoalKind::Calories,
        GoalKind::WorkoutMinutes,
        GoalKind::WaterMl,
        GoalKind::SleepMinutes,
    ];

    /// Goal overlaid on a metric's series, if the metric has one.
    pub fn for_metric(metric: MetricKind) -> Option<Self> {
        match metric {
            MetricKind::Steps => Some(Self::Steps),
            MetricKind::Nutrition => Some(Self::Calories),
            MetricKind::Workout => Some(Self::WorkoutMinutes),
            MetricKind::Water => Some(Self::WaterMl),
            MetricKind::Sleep => Some(Self::SleepMinutes),
            MetricKind::Body => None,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "steps" => Some(Self::Steps),
            "calories" => Some(Self::Calories),
            "workout_minutes" => Some(Self::WorkoutMinutes),
            "water_ml" => Some(Self::WaterMl),
            "sleep_minutes" => Some(Self::SleepMinutes),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Steps => "steps",
            Self::Calories => "calories",
            Self::WorkoutMinutes => "workout_minutes",
            Self::WaterMl => "water_ml",
            Self::SleepMinutes => "sleep_minutes",
        }
    }

    pub fn default_target(self) -> f64 {
        match self {
            Self::Steps => DEFAULT_STEPS_GOAL,
            Self::Calories => DEFAULT_CALORIES_GOAL,
            Self::WorkoutMinutes => DEFAULT_WORKOUT_MINUTES_GOAL,
            Self::WaterMl => DEFAULT_WATER_ML_GOAL,
            Self::SleepMinutes => DEFAULT_SLEEP_MINUTES_GOAL,
        }
    }
}

/// Resolved goals for one user, defaults already substituted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalSet {
    pub steps: f64,
    pub calories: f64,
    pub workout_minutes: f64,
    pub water_ml: f64,
    pub sleep_minutes: f64,
}

impl Default for GoalSet {
    fn default() -> Self {
        Self {
            steps: DEFAULT_STEPS_GOAL,
            calories: DEFAULT_CALORIES_GOAL,
            workout_minutes: DEFAULT_WORKOUT_MINUTES_GOAL,
            water_ml: DEFAULT_WATER_ML_GOAL,
            sleep_minutes: DEFAULT_SLEEP_MINUTES_GOAL,
        }
    }
}

impl GoalSet {
    pub fn target(&self, kind: GoalKind) -> f64 {
        match kind {
            GoalKind::Steps => self.steps,
            GoalKind::Calories => self.calories,
            GoalKind::WorkoutMinutes => self.workout_minutes,
            GoalKind::WaterMl => self.water_ml,
            GoalKind::SleepMinutes => self.sleep_minutes,
        }
    }

    pub fn set_target(&mut self, kind: GoalKind, target: f64) {
        match kind {
            GoalKind::Steps => self.steps = target,
            GoalKind::Calories => self.calories = target,
            GoalKind::WorkoutMinutes => self.workout_minutes = target,
            GoalKind::WaterMl => self.water_ml = target,
            GoalKind::SleepMinutes => self.sleep_minutes = target,
        }
    }

    /// Goal in the unit the metric's series is displayed in.
    ///
    /// Sleep series are in hours while the sleep goal is kept in minutes.
    pub fn display_target(&self, metric: MetricKind) -> Option<f64> {
        let kind = GoalKind::for_metric(metric)?;
        let target = self.target(kind);
        Some(match kind {
            GoalKind::SleepMinutes => target / 60.0,
            _ => target,
        })
    }
}
