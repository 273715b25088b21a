//! Runtime configuration for the roster core.
//!
//! # Responsibility
//! - Load settings from an optional JSON file, then environment overrides.
//! - Validate paging and session limits before anything else starts.
//!
//! # Invariants
//! - Missing fields fall back to defaults; unknown fields are rejected.
//! - `1 <= default_page_size <= max_page_size`.

use crate::model::page::PageRequest;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_DB_PATH: &str = "ROSTER_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "ROSTER_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "ROSTER_LOG_DIR";

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;
const DEFAULT_SESSION_TTL_SECS: u64 = 10 * 60 * 60;

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse config `{}`: {source}", path.display())
            }
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Invalid(_) => None,
        }
    }
}

/// Credentials of the admin created on first start of an empty store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
}

impl Default for BootstrapAdmin {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "password".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// SQLite file; `None` keeps the store in memory.
    pub db_path: Option<PathBuf>,
    pub log_level: String,
    /// Absolute directory for rolling log files; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub session_ttl_secs: u64,
    /// `None` skips admin bootstrap.
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: crate::logging::default_log_level().to_string(),
            log_dir: None,
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            bootstrap_admin: Some(BootstrapAdmin::default()),
        }
    }
}

impl AppConfig {
    /// Loads `path` (when given), applies process environment overrides and
    /// validates the result.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = base.with_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parses one JSON config file without overrides.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies `ROSTER_*` overrides read through `lookup`; blank values are ignored.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(value) = read(ENV_DB_PATH) {
            self.db_path = Some(PathBuf::from(value));
        }
        if let Some(value) = read(ENV_LOG_LEVEL) {
            self.log_level = value;
        }
        if let Some(value) = read(ENV_LOG_DIR) {
            self.log_dir = Some(PathBuf::from(value));
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_page_size == 0 {
            return Err(ConfigError::Invalid(
                "default_page_size must be at least 1".to_string(),
            ));
        }
        if self.max_page_size < self.default_page_size {
            return Err(ConfigError::Invalid(format!(
                "max_page_size {} is smaller than default_page_size {}",
                self.max_page_size, self.default_page_size
            )));
        }
        if self.session_ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "session_ttl_secs must be positive".to_string(),
            ));
        }
        if let Some(admin) = &self.bootstrap_admin {
            if admin.username.trim().is_empty() || admin.password.is_empty() {
                return Err(ConfigError::Invalid(
                    "bootstrap_admin needs a username and password".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn paging(&self) -> PagingConfig {
        PagingConfig {
            default_size: self.default_page_size,
            max_size: self.max_page_size,
        }
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

/// Page size policy applied to caller-supplied page requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingConfig {
    pub default_size: u32,
    pub max_size: u32,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_size: DEFAULT_PAGE_SIZE,
            max_size: MAX_PAGE_SIZE,
        }
    }
}

impl PagingConfig {
    /// Size `0` becomes the default; oversized pages clamp to the max.
    pub fn normalize(&self, request: PageRequest) -> PageRequest {
        match request {
            PageRequest::Paged { page, size: 0 } => PageRequest::Paged {
                page,
                size: self.default_size,
            },
            PageRequest::Paged { page, size } if size > self.max_size => PageRequest::Paged {
                page,
                size: self.max_size,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, ConfigError, PagingConfig, ENV_DB_PATH, ENV_LOG_LEVEL};
    use crate::model::page::PageRequest;
    use std::collections::HashMap;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().expect("defaults validate");
        assert_eq!(config.default_page_size, 20);
        assert_eq!(config.max_page_size, 100);
        assert!(config.bootstrap_admin.is_some());
    }

    #[test]
    fn file_fields_override_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{"default_page_size": 5, "max_page_size": 10, "bootstrap_admin": null}}"#
        )
        .expect("write config");

        let config = AppConfig::from_file(file.path()).expect("parse config");
        assert_eq!(config.default_page_size, 5);
        assert_eq!(config.max_page_size, 10);
        assert_eq!(config.bootstrap_admin, None);
        assert_eq!(config.session_ttl_secs, AppConfig::default().session_ttl_secs);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"page_size": 5}}"#).expect("write config");
        let err = AppConfig::from_file(file.path()).expect_err("unknown field must fail");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn env_overrides_apply_and_blank_values_are_ignored() {
        let env = HashMap::from([
            (ENV_DB_PATH.to_string(), "/tmp/roster.db".to_string()),
            (ENV_LOG_LEVEL.to_string(), "   ".to_string()),
        ]);
        let config = AppConfig::default().with_env_overrides(|key| env.get(key).cloned());
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/roster.db")));
        assert_eq!(config.log_level, AppConfig::default().log_level);
    }

    #[test]
    fn validate_rejects_inverted_page_limits() {
        let config = AppConfig {
            default_page_size: 50,
            max_page_size: 10,
            ..AppConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn paging_normalizes_zero_and_oversized_sizes() {
        let paging = PagingConfig {
            default_size: 20,
            max_size: 100,
        };
        assert_eq!(paging.normalize(PageRequest::of(1, 0)), PageRequest::of(1, 20));
        assert_eq!(paging.normalize(PageRequest::of(0, 500)), PageRequest::of(0, 100));
        assert_eq!(paging.normalize(PageRequest::of(2, 7)), PageRequest::of(2, 7));
        assert_eq!(
            paging.normalize(PageRequest::unpaged()),
            PageRequest::unpaged()
        );
    }
}
