//! Environment-driven configuration for hosts of the core.
//!
//! # Invariants
//! - Empty or whitespace-only variables behave as unset.
//! - Loading configuration never fails; defaults fill every gap.

use crate::logging::default_log_level;
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "HEALTHDAY_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "HEALTHDAY_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "HEALTHDAY_LOG_DIR";
const DEFAULT_DB_FILE_NAME: &str = "healthday.sqlite3";

/// Runtime settings shared by the FFI and CLI hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// Logging stays off when unset.
    pub log_dir: Option<PathBuf>,
}

impl TrackerConfig {
    /// Reads settings from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, used by tests to avoid global state.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            db_path: read(DB_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)),
            log_level: read(LOG_LEVEL_ENV).unwrap_or_else(|| default_log_level().to_string()),
            log_dir: read(LOG_DIR_ENV).map(PathBuf::from),
        }
    }
}
