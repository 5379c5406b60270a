//! Process configuration loaded from environment variables.
//!
//! # Responsibility
//! - Resolve the database path and logging settings with defaults.
//!
//! # Invariants
//! - Blank variables are treated as unset.
//! - Invalid values are reported, never silently replaced by defaults.

use crate::logging::{default_log_level, LoggingConfig};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "CEREALNOTES_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "CEREALNOTES_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "CEREALNOTES_LOG_DIR";
const DEFAULT_DB_FILE_NAME: &str = "cerealnotes.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Logging(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Logging(message) => write!(f, "invalid logging configuration: {message}"),
        }
    }
}

impl Error for ConfigError {}

/// Resolved core configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub logging: LoggingConfig,
}

impl CoreConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let db_path = var(DB_PATH_ENV).map(PathBuf::from).unwrap_or_else(|| {
            debug!("{DB_PATH_ENV} not set, using temp dir default");
            std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)
        });
        let level = var(LOG_LEVEL_ENV).unwrap_or_else(|| default_log_level().to_string());
        let log_dir = var(LOG_DIR_ENV);
        let logging =
            LoggingConfig::new(&level, log_dir.as_deref()).map_err(ConfigError::Logging)?;

        Ok(Self { db_path, logging })
    }
}
