//! Environment-driven runtime configuration.
//!
//! # Responsibility
//! - Resolve database location, logging and exit behavior from environment.
//! - Reject malformed values before any data is touched.
//!
//! # Invariants
//! - Unset variables fall back to defaults; set-but-invalid values are errors.
//! - Resolution has no side effects (no directories are created here).

use crate::db::DbLocation;
use crate::logging::{default_log_level, LogTarget, LoggingError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "STOREFRONT_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "STOREFRONT_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "STOREFRONT_LOG_DIR";
pub const ENV_PAUSE_ON_EXIT: &str = "STOREFRONT_PAUSE_ON_EXIT";

const DEFAULT_DB_FILE_NAME: &str = "storefront_demo.sqlite3";
const DEFAULT_LOG_DIR_NAME: &str = "storefront-logs";
const MEMORY_TARGET: &str = ":memory:";

/// Configuration errors reported at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Variable is set but blank.
    EmptyValue(&'static str),
    /// Variable is set to a value that cannot be used.
    InvalidValue { key: &'static str, message: String },
    /// Database file would live in a directory that does not exist.
    MissingParentDir { key: &'static str, path: PathBuf },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyValue(key) => write!(f, "environment variable {key} cannot be empty"),
            Self::InvalidValue { key, message } => write!(f, "invalid {key}: {message}"),
            Self::MissingParentDir { key, path } => write!(
                f,
                "invalid {key}: parent directory of `{}` does not exist",
                path.display()
            ),
        }
    }
}

impl Error for ConfigError {}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontConfig {
    pub db: DbLocation,
    pub log: LogTarget,
    /// Wait for Enter before the process exits.
    pub pause_on_exit: bool,
}

impl StorefrontConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which returns `None` for unset keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let db = match lookup(ENV_DB_PATH) {
            Some(raw) => parse_db_location(&raw)?,
            None => DbLocation::File(std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)),
        };

        let log_level = lookup(ENV_LOG_LEVEL).unwrap_or_else(|| default_log_level().to_string());
        let log_dir = match lookup(ENV_LOG_DIR) {
            Some(raw) => PathBuf::from(raw.trim()),
            None => std::env::temp_dir().join(DEFAULT_LOG_DIR_NAME),
        };
        let log = LogTarget::new(&log_level, log_dir).map_err(|err| {
            let key = match err {
                LoggingError::UnsupportedLevel(_) => ENV_LOG_LEVEL,
                _ => ENV_LOG_DIR,
            };
            ConfigError::InvalidValue {
                key,
                message: err.to_string(),
            }
        })?;

        let pause_on_exit = match lookup(ENV_PAUSE_ON_EXIT) {
            Some(raw) => parse_flag(ENV_PAUSE_ON_EXIT, &raw)?,
            None => false,
        };

        Ok(Self {
            db,
            log,
            pause_on_exit,
        })
    }
}

fn parse_db_location(raw: &str) -> Result<DbLocation, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyValue(ENV_DB_PATH));
    }
    if trimmed == MEMORY_TARGET {
        return Ok(DbLocation::Memory);
    }

    let path = PathBuf::from(trimmed);
    if path.is_dir() {
        return Err(ConfigError::InvalidValue {
            key: ENV_DB_PATH,
            message: format!("`{trimmed}` is a directory, expected a database file"),
        });
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            return Err(ConfigError::MissingParentDir {
                key: ENV_DB_PATH,
                path,
            });
        }
    }
    Ok(DbLocation::File(path))
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key,
            message: format!("expected a boolean flag, got `{other}`"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ConfigError, StorefrontConfig, ENV_DB_PATH, ENV_LOG_DIR, ENV_LOG_LEVEL, ENV_PAUSE_ON_EXIT,
    };
    use crate::db::DbLocation;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();

        assert!(matches!(config.db, DbLocation::File(ref path) if path.ends_with("storefront_demo.sqlite3")));
        assert!(config.log.dir().is_absolute());
        assert!(config.log.dir().ends_with("storefront-logs"));
        assert!(!config.pause_on_exit);
    }

    #[test]
    fn memory_target_and_flags_are_parsed() {
        let config = config_from(&[
            (ENV_DB_PATH, ":memory:"),
            (ENV_LOG_LEVEL, "WARNING"),
            (ENV_PAUSE_ON_EXIT, "yes"),
        ])
        .unwrap();

        assert_eq!(config.db, DbLocation::Memory);
        assert_eq!(config.log.level(), "warn");
        assert!(config.pause_on_exit);
    }

    #[test]
    fn empty_db_path_is_rejected() {
        let err = config_from(&[(ENV_DB_PATH, "   ")]).unwrap_err();
        assert_eq!(err, ConfigError::EmptyValue(ENV_DB_PATH));
    }

    #[test]
    fn db_path_in_missing_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing").join("demo.sqlite3");
        let target_str = target.to_str().unwrap().to_string();

        let err = config_from(&[(ENV_DB_PATH, target_str.as_str())]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingParentDir { key, .. } if key == ENV_DB_PATH));
    }

    #[test]
    fn relative_log_dir_and_unknown_level_are_rejected() {
        let err = config_from(&[(ENV_LOG_DIR, "logs/dev")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == ENV_LOG_DIR));

        let err = config_from(&[(ENV_LOG_LEVEL, "loud")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == ENV_LOG_LEVEL));

        let err = config_from(&[(ENV_LOG_DIR, "  ")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == ENV_LOG_DIR));
    }

    #[test]
    fn garbage_pause_flag_is_rejected() {
        let err = config_from(&[(ENV_PAUSE_ON_EXIT, "sometimes")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
