//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate bucket and goal repositories into engine operations.
//! - Keep FFI/CLI layers decoupled from storage details.
//!
//! `merge`, `reconcile` and `series` hold the pure engine steps;
//! `tracker_service` wires them to storage.

pub mod error;
pub mod merge;
pub mod reconcile;
pub mod series;
pub mod tracker_service;
