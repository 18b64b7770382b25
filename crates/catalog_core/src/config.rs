//! Runtime configuration from environment variables.
//!
//! # Invariants
//! - Unset variables fall back to defaults; set but invalid values are
//!   errors, never silently ignored.
//! - `db_path == None` selects an in-memory database.

use crate::logging::default_log_level;
use crate::model::page::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "CATALOG_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "CATALOG_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "CATALOG_LOG_DIR";
pub const ENV_PAGE_SIZE: &str = "CATALOG_PAGE_SIZE";

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid {key}=`{value}`: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub db_path: Option<PathBuf>,
    pub log_level: String,
    /// File logging is disabled when unset.
    pub log_dir: Option<PathBuf>,
    pub default_page_size: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl CatalogConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let value_of = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(path) = value_of(ENV_DB_PATH) {
            config.db_path = Some(PathBuf::from(path.trim()));
        }
        if let Some(level) = value_of(ENV_LOG_LEVEL) {
            config.log_level = parse_level(&level)?;
        }
        if let Some(dir) = value_of(ENV_LOG_DIR) {
            let dir = PathBuf::from(dir.trim());
            if !dir.is_absolute() {
                return Err(invalid(ENV_LOG_DIR, &dir.display().to_string(), "must be an absolute path"));
            }
            config.log_dir = Some(dir);
        }
        if let Some(size) = value_of(ENV_PAGE_SIZE) {
            config.default_page_size = parse_page_size(&size)?;
        }

        Ok(config)
    }
}

fn parse_level(value: &str) -> Result<String, ConfigError> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(normalized),
        _ => Err(invalid(
            ENV_LOG_LEVEL,
            value,
            "expected trace|debug|info|warn|error",
        )),
    }
}

fn parse_page_size(value: &str) -> Result<u32, ConfigError> {
    match value.trim().parse::<u32>() {
        Ok(size) if (1..=MAX_PAGE_SIZE).contains(&size) => Ok(size),
        _ => Err(invalid(
            ENV_PAGE_SIZE,
            value,
            &format!("expected an integer in 1..={MAX_PAGE_SIZE}"),
        )),
    }
}

fn invalid(key: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{CatalogConfig, ConfigError, ENV_DB_PATH, ENV_LOG_LEVEL, ENV_PAGE_SIZE};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn config_from(pairs: &[(&str, &str)]) -> Result<CatalogConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        CatalogConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config, CatalogConfig::default());
        assert_eq!(config.default_page_size, 12);
        assert!(config.db_path.is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let config = config_from(&[
            (ENV_DB_PATH, "/tmp/catalog.sqlite3"),
            (ENV_LOG_LEVEL, "WARN"),
            (ENV_PAGE_SIZE, "25"),
        ])
        .unwrap();
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/catalog.sqlite3")));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.default_page_size, 25);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(config_from(&[(ENV_PAGE_SIZE, "0")]).is_err());
        assert!(config_from(&[(ENV_PAGE_SIZE, "many")]).is_err());
        let err = config_from(&[(ENV_LOG_LEVEL, "loud")]).unwrap_err();
        assert!(err.to_string().contains("CATALOG_LOG_LEVEL"));
        assert!(config_from(&[("CATALOG_LOG_DIR", "relative/logs")]).is_err());
    }
}
