//! Runtime configuration loaded from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `NEWSDESK_DB_PATH` | `newsdesk.sqlite3` |
//! | `NEWSDESK_LOG_LEVEL` | `debug` in debug builds, `info` in release |
//! | `NEWSDESK_LOG_DIR` | unset: file logging disabled |
//! | `NEWSDESK_PAGE_SIZE` | `9` |

use crate::logging::default_log_level;
use crate::search::articles::INDEX_PAGE_SIZE;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_VAR: &str = "NEWSDESK_DB_PATH";
pub const LOG_LEVEL_VAR: &str = "NEWSDESK_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "NEWSDESK_LOG_DIR";
pub const PAGE_SIZE_VAR: &str = "NEWSDESK_PAGE_SIZE";

const DEFAULT_DB_FILE_NAME: &str = "newsdesk.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        message: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue {
                key,
                value,
                message,
            } => write!(f, "invalid {key} value `{value}`: {message}"),
        }
    }
}

impl Error for ConfigError {}

/// Effective settings for one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsdeskConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// Absolute directory for rolling log files.
    pub log_dir: Option<String>,
    pub page_size: u32,
}

impl Default for NewsdeskConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
            page_size: INDEX_PAGE_SIZE,
        }
    }
}

impl NewsdeskConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let var = |key: &str| lookup(key).map(|value| value.trim().to_string());

        if let Some(path) = var(DB_PATH_VAR).filter(|value| !value.is_empty()) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = var(LOG_LEVEL_VAR).filter(|value| !value.is_empty()) {
            config.log_level = level;
        }
        config.log_dir = var(LOG_DIR_VAR).filter(|value| !value.is_empty());
        if let Some(raw) = var(PAGE_SIZE_VAR) {
            config.page_size = parse_page_size(&raw)?;
        }

        info!(
            "event=config_load module=config status=ok db_path={} log_level={} file_logging={} page_size={}",
            config.db_path.display(),
            config.log_level,
            config.log_dir.is_some(),
            config.page_size
        );
        Ok(config)
    }
}

fn parse_page_size(raw: &str) -> Result<u32, ConfigError> {
    let invalid = |message: &str| ConfigError::InvalidValue {
        key: PAGE_SIZE_VAR,
        value: raw.to_string(),
        message: message.to_string(),
    };
    let value: u32 = raw.parse().map_err(|_| invalid("expected a positive integer"))?;
    if value == 0 {
        return Err(invalid("must be at least 1"));
    }
    Ok(value)
}
