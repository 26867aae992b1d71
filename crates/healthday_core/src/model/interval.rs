//! Edited and persisted time intervals (sleep and workout sessions).
//!
//! # Invariants
//! - `Session::end_ms >= Session::start_ms`.
//! - `Session::duration_minutes > 0`; zero-length input never persists.
//! - Overnight sessions start on the day before `end_day`.

use crate::calendar::DayKey;
use serde::{Deserialize, Serialize};

/// Client-side interval as submitted on save.
///
/// `start_ms`/`end_ms` carry wall-clock times picked against today's
/// calendar day; only their minute-of-day is authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalDraft {
    pub start_ms: i64,
    pub end_ms: i64,
    pub note: Option<String>,
    /// Already persisted in an earlier round-trip; skipped by reconciliation.
    pub locked: bool,
}

impl IntervalDraft {
    pub fn new(start_ms: i64, end_ms: i64) -> Self {
        Self {
            start_ms,
            end_ms,
            note: None,
            locked: false,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// How an interval relates to midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Crossing {
    SameDay,
    Overnight,
}

impl Crossing {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SameDay => "same_day",
            Self::Overnight => "overnight",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "same_day" => Some(Self::SameDay),
            "overnight" => Some(Self::Overnight),
            _ => None,
        }
    }
}

/// Normalized interval owned by a `DayRecord`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub start_ms: i64,
    pub end_ms: i64,
    pub start_day: DayKey,
    pub end_day: DayKey,
    pub duration_minutes: u32,
    pub crossing: Crossing,
    pub note: Option<String>,
    pub locked: bool,
}
