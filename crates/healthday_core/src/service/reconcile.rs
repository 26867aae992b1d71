//! Interval reconciliation for edited sleep/workout sessions.
//!
//! # Responsibility
//! - Classify each edited `(start, end)` pair as same-day or overnight.
//! - Re-anchor overnight starts to the previous calendar day.
//! - Merge newly reconciled sessions with already locked ones.
//!
//! # Invariants
//! - Only minute-of-day of the submitted instants is used; the owning day is
//!   always "today" as derived from `now`.
//! - `end_minutes <= start_minutes` means overnight; equal minutes produce a
//!   zero duration and are rejected.
//! - Locked sessions are carried over untouched; after a commit every
//!   session is locked.

use crate::calendar::{self, DayKey, MINUTES_PER_DAY};
use crate::model::interval::{Crossing, IntervalDraft, Session};
use crate::service::error::{TrackerError, TrackerResult};

/// Reconciles one unlocked draft against `today`.
pub fn reconcile_interval(today: DayKey, draft: &IntervalDraft) -> TrackerResult<Session> {
    let start_minutes = calendar::minutes_since_midnight(draft.start_ms)?;
    let end_minutes = calendar::minutes_since_midnight(draft.end_ms)?;

    let (crossing, start_day) = if end_minutes <= start_minutes {
        (Crossing::Overnight, calendar::add_days(today, -1)?)
    } else {
        (Crossing::SameDay, today)
    };
    let duration_minutes = (end_minutes + MINUTES_PER_DAY - start_minutes) % MINUTES_PER_DAY;
    if duration_minutes == 0 {
        return Err(TrackerError::DegenerateInterval {
            start_ms: draft.start_ms,
            end_ms: draft.end_ms,
        });
    }

    Ok(Session {
        start_ms: calendar::instant_at(start_day, start_minutes),
        end_ms: calendar::instant_at(today, end_minutes),
        start_day,
        end_day: today,
        duration_minutes,
        crossing,
        note: normalize_note(draft.note.as_deref()),
        locked: false,
    })
}

/// Produces the full session list for `today` after a save.
///
/// `existing` holds the sessions already persisted for the day. Drafts marked
/// `locked` are echoes of those and are skipped. Any degenerate draft aborts
/// the whole commit.
pub fn reconcile_day(
    today: DayKey,
    existing: &[Session],
    drafts: &[IntervalDraft],
) -> TrackerResult<Vec<Session>> {
    let mut sessions = existing.to_vec();
    for draft in drafts.iter().filter(|draft| !draft.locked) {
        sessions.push(reconcile_interval(today, draft)?);
    }
    for session in &mut sessions {
        session.locked = true;
    }
    Ok(sessions)
}

/// Sum of all session durations, in minutes.
pub fn total_minutes(sessions: &[Session]) -> u32 {
    sessions.iter().map(|session| session.duration_minutes).sum()
}

fn normalize_note(note: Option<&str>) -> Option<String> {
    note.map(str::trim)
        .filter(|note| !note.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::{reconcile_day, reconcile_interval, total_minutes};
    use crate::calendar::{instant_at, DayKey};
    use crate::model::interval::{Crossing, IntervalDraft};
    use crate::service::error::TrackerError;

    fn today() -> DayKey {
        DayKey::from_ymd(2024, 3, 10).unwrap()
    }

    fn at(hour: u32, minute: u32) -> i64 {
        instant_at(today(), hour * 60 + minute)
    }

    #[test]
    fn bedtime_before_midnight_is_overnight() {
        let session = reconcile_interval(today(), &IntervalDraft::new(at(23, 30), at(7, 0))).unwrap();
        assert_eq!(session.crossing, Crossing::Overnight);
        assert_eq!(session.start_day, DayKey::from_ymd(2024, 3, 9).unwrap());
        assert_eq!(session.end_day, today());
        assert_eq!(session.duration_minutes, 450);
        assert_eq!(session.end_ms - session.start_ms, 450 * 60 * 1000);
    }

    #[test]
    fn same_day_interval_keeps_today() {
        let session = reconcile_interval(today(), &IntervalDraft::new(at(22, 0), at(23, 0))).unwrap();
        assert_eq!(session.crossing, Crossing::SameDay);
        assert_eq!(session.start_day, today());
        assert_eq!(session.duration_minutes, 60);
    }

    #[test]
    fn equal_times_are_degenerate() {
        let err = reconcile_interval(today(), &IntervalDraft::new(at(6, 0), at(6, 0))).unwrap_err();
        assert!(matches!(err, TrackerError::DegenerateInterval { .. }));
    }

    #[test]
    fn reconcile_day_skips_locked_and_locks_everything() {
        let first = reconcile_day(today(), &[], &[IntervalDraft::new(at(23, 0), at(6, 0))]).unwrap();
        assert!(first.iter().all(|session| session.locked));

        let mut echoed = IntervalDraft::new(at(23, 0), at(6, 0));
        echoed.locked = true;
        let nap = IntervalDraft::new(at(13, 0), at(13, 45)).with_note("  nap ");
        let second = reconcile_day(today(), &first, &[echoed, nap]).unwrap();

        assert_eq!(second.len(), 2);
        assert_eq!(second[1].note.as_deref(), Some("nap"));
        assert_eq!(total_minutes(&second), 7 * 60 + 45);
    }

    #[test]
    fn one_degenerate_draft_aborts_the_commit() {
        let drafts = [
            IntervalDraft::new(at(9, 0), at(10, 0)),
            IntervalDraft::new(at(12, 0), at(12, 0)),
        ];
        assert!(reconcile_day(today(), &[], &drafts).is_err());
    }
}
