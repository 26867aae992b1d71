//! Flutter-facing bindings for the HealthDay core.

pub mod api;
