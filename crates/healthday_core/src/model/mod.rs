//! Domain model for per-day health aggregates.
//!
//! # Responsibility
//! - Define the day bucket record and its metric sub-records.
//! - Define edited/persisted interval shapes and per-user goals.
//!
//! # Invariants
//! - At most one `DayRecord` exists per `(UserId, DayKey)`.
//! - Persisted sessions always satisfy `end_ms >= start_ms`.

pub mod day_record;
pub mod goal;
pub mod interval;
pub mod metric;
