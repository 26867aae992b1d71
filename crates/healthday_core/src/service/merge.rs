//! Incremental merge of partial metric updates into a day bucket.
//!
//! # Responsibility
//! - Apply additive (delta) and overwrite (replace) payloads to one
//!   metric sub-record.
//! - Validate payloads before touching any field.
//!
//! # Invariants
//! - A payload is applied entirely or not at all.
//! - No field ever becomes negative or non-finite.
//! - `steps.count` only ever holds whole numbers within `±2^53`.
//! - A non-empty replace resets every field of the metric; fields missing
//!   from the payload become zero and the nutrition meal list is dropped.
//! - Sessions are never edited here; see `service::reconcile`. Once a day has
//!   sessions for a metric, their sum owns that metric's total and replace is
//!   refused.

use crate::model::day_record::{DayRecord, MealEntry};
use crate::model::metric::{MetricFields, MetricKind};
use crate::service::error::TrackerError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Largest whole number an `f64` payload value carries exactly.
const MAX_EXACT_COUNT: f64 = 9_007_199_254_740_992.0;

/// How a payload combines with the stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Add each field to the stored value (counters).
    Delta,
    /// Overwrite the whole sub-record (client holds the cumulative total).
    Replace,
}

impl MergeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Delta => "delta",
            Self::Replace => "replace",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MergeError {
    DeltaNotSupported(MetricKind),
    UnknownField { metric: MetricKind, field: String },
    NonFinite { field: String },
    FractionalCount { field: String, value: f64 },
    Negative { field: String, value: f64 },
    CountOutOfRange { field: String, value: f64 },
    SessionsOwnTotal(MetricKind),
}

impl Display for MergeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DeltaNotSupported(metric) => {
                write!(f, "metric `{metric}` only accepts replace updates")
            }
            Self::UnknownField { metric, field } => write!(
                f,
                "unknown field `{field}` for metric `{metric}`; expected one of {}",
                metric.field_names().join("|")
            ),
            Self::NonFinite { field } => write!(f, "field `{field}` is not a finite number"),
            Self::FractionalCount { field, value } => {
                write!(f, "field `{field}` must be a whole number, got {value}")
            }
            Self::Negative { field, value } => {
                write!(f, "field `{field}` would become negative ({value})")
            }
            Self::CountOutOfRange { field, value } => {
                write!(f, "field `{field}` is outside the exact count range ({value})")
            }
            Self::SessionsOwnTotal(metric) => write!(
                f,
                "metric `{metric}` total is derived from committed sessions; replace refused"
            ),
        }
    }
}

impl Error for MergeError {}

impl From<MergeError> for TrackerError {
    fn from(value: MergeError) -> Self {
        Self::InvalidMetric(value.to_string())
    }
}

enum Slot<'a> {
    Count(&'a mut i64),
    Amount(&'a mut f64),
}

impl Slot<'_> {
    fn value(&self) -> f64 {
        match self {
            Self::Count(count) => **count as f64,
            Self::Amount(amount) => **amount,
        }
    }

    fn store(self, value: f64) {
        match self {
            Self::Count(count) => *count = value as i64,
            Self::Amount(amount) => *amount = value,
        }
    }
}

fn slot<'a>(record: &'a mut DayRecord, metric: MetricKind, field: &str) -> Option<Slot<'a>> {
    let slot = match (metric, field) {
        (MetricKind::Steps, "count") => Slot::Count(&mut record.steps.count),
        (MetricKind::Steps, "distance_m") => Slot::Amount(&mut record.steps.distance_m),
        (MetricKind::Steps, "duration_min") => Slot::Amount(&mut record.steps.duration_min),
        (MetricKind::Steps, "kcal") => Slot::Amount(&mut record.steps.kcal),
        (MetricKind::Sleep, "hours") => Slot::Amount(&mut record.sleep.hours),
        (MetricKind::Nutrition, "kcal") => Slot::Amount(&mut record.nutrition.kcal),
        (MetricKind::Nutrition, "fat_g") => Slot::Amount(&mut record.nutrition.fat_g),
        (MetricKind::Nutrition, "protein_g") => Slot::Amount(&mut record.nutrition.protein_g),
        (MetricKind::Nutrition, "carbs_g") => Slot::Amount(&mut record.nutrition.carbs_g),
        (MetricKind::Water, "ml") => Slot::Amount(&mut record.water.ml),
        (MetricKind::Workout, "minutes") => Slot::Amount(&mut record.workout.minutes),
        (MetricKind::Body, "weight_kg") => Slot::Amount(&mut record.body.weight_kg),
        (MetricKind::Body, "height_cm") => Slot::Amount(&mut record.body.height_cm),
        _ => return None,
    };
    Some(slot)
}

/// Applies `fields` to the `metric` sub-record of `record`.
///
/// Validation covers the whole payload first, so a rejected payload leaves
/// `record` untouched.
pub fn merge_fields(
    mut record: DayRecord,
    metric: MetricKind,
    fields: &MetricFields,
    mode: MergeMode,
) -> Result<DayRecord, MergeError> {
    if mode == MergeMode::Delta && !metric.accepts_delta() {
        return Err(MergeError::DeltaNotSupported(metric));
    }
    if mode == MergeMode::Replace && !fields.is_empty() && !record.sessions(metric).is_empty() {
        return Err(MergeError::SessionsOwnTotal(metric));
    }

    let mut staged = Vec::with_capacity(fields.len());
    for (field, value) in fields {
        let current = slot(&mut record, metric, field)
            .ok_or_else(|| MergeError::UnknownField {
                metric,
                field: field.clone(),
            })?
            .value();
        if !value.is_finite() {
            return Err(MergeError::NonFinite {
                field: field.clone(),
            });
        }
        let is_count = field == "count";
        if is_count && value.fract() != 0.0 {
            return Err(MergeError::FractionalCount {
                field: field.clone(),
                value: *value,
            });
        }
        if is_count && value.abs() > MAX_EXACT_COUNT {
            return Err(MergeError::CountOutOfRange {
                field: field.clone(),
                value: *value,
            });
        }

        let next = match mode {
            MergeMode::Delta => current + value,
            MergeMode::Replace => *value,
        };
        if next < 0.0 {
            return Err(MergeError::Negative {
                field: field.clone(),
                value: next,
            });
        }
        if is_count && next > MAX_EXACT_COUNT {
            return Err(MergeError::CountOutOfRange {
                field: field.clone(),
                value: next,
            });
        }
        staged.push((field.as_str(), next));
    }

    if mode == MergeMode::Replace && !staged.is_empty() {
        clear_metric(&mut record, metric);
    }
    for (field, next) in staged {
        if let Some(slot) = slot(&mut record, metric, field) {
            slot.store(next);
        }
    }
    Ok(record)
}

fn clear_metric(record: &mut DayRecord, metric: MetricKind) {
    for field in metric.field_names() {
        if let Some(slot) = slot(record, metric, field) {
            slot.store(0.0);
        }
    }
    if metric == MetricKind::Nutrition {
        record.nutrition.meals.clear();
    }
}

/// Replaces today's meal list and sets nutrition totals to its sums.
pub fn replace_meals(mut record: DayRecord, meals: Vec<MealEntry>) -> Result<DayRecord, MergeError> {
    for meal in &meals {
        for (field, value) in [
            ("kcal", meal.kcal),
            ("fat_g", meal.fat_g),
            ("protein_g", meal.protein_g),
            ("carbs_g", meal.carbs_g),
        ] {
            if !value.is_finite() {
                return Err(MergeError::NonFinite {
                    field: field.to_string(),
                });
            }
            if value < 0.0 {
                return Err(MergeError::Negative {
                    field: field.to_string(),
                    value,
                });
            }
        }
    }

    let nutrition = &mut record.nutrition;
    nutrition.kcal = meals.iter().map(|meal| meal.kcal).sum();
    nutrition.fat_g = meals.iter().map(|meal| meal.fat_g).sum();
    nutrition.protein_g = meals.iter().map(|meal| meal.protein_g).sum();
    nutrition.carbs_g = meals.iter().map(|meal| meal.carbs_g).sum();
    nutrition.meals = meals;
    Ok(record)
}
