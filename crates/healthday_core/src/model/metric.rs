//! Metric catalog and payload field names.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable user identifier. Resolution from caller input happens in the
/// service layer; a nil UUID is never a valid user.
pub type UserId = Uuid;

/// Numeric payload of a delta/replace update, keyed by field name.
pub type MetricFields = BTreeMap<String, f64>;

/// Tracked metric families, each backed by one `DayRecord` sub-record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Steps,
    Sleep,
    Nutrition,
    Water,
    Workout,
    Body,
}

impl MetricKind {
    pub const ALL: [MetricKind; 6] = [
        MetricKind::Steps,
        MetricKind::Sleep,
        MetricKind::Nutrition,
        MetricKind::Water,
        MetricKind::Workout,
        MetricKind::Body,
    ];

    /// Parses a metric name case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "steps" => Some(Self::Steps),
            "sleep" => Some(Self::Sleep),
            "nutrition" => Some(Self::Nutrition),
            "water" => Some(Self::Water),
            "workout" => Some(Self::Workout),
            "body" => Some(Self::Body),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Steps => "steps",
            Self::Sleep => "sleep",
            Self::Nutrition => "nutrition",
            Self::Water => "water",
            Self::Workout => "workout",
            Self::Body => "body",
        }
    }

    /// Field names accepted in delta/replace payloads for this metric.
    pub fn field_names(self) -> &'static [&'static str] {
        match self {
            Self::Steps => &["count", "distance_m", "duration_min", "kcal"],
            Self::Sleep => &["hours"],
            Self::Nutrition => &["kcal", "fat_g", "protein_g", "carbs_g"],
            Self::Water => &["ml"],
            Self::Workout => &["minutes"],
            Self::Body => &["weight_kg", "height_cm"],
        }
    }

    /// Whether additive updates make sense for this metric.
    ///
    /// Body data is a point measurement, so only replace applies.
    pub fn accepts_delta(self) -> bool {
        !matches!(self, Self::Body)
    }

    /// Whether this metric owns reconcilable time intervals.
    pub fn has_intervals(self) -> bool {
        matches!(self, Self::Sleep | Self::Workout)
    }
}

impl Display for MetricKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
