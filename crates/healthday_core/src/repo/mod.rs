//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the bucket store and goal provider contracts.
//! - Isolate SQLite query details from engine orchestration.
//!
//! # Invariants
//! - Every bucket write goes through `DayRepository::mutate`.
//! - Repository APIs surface transport errors unchanged; callers decide how
//!   to report them.

pub mod day_repo;
pub mod goal_repo;
