//! Core runtime configuration.
//!
//! # Responsibility
//! - Describe which storage medium backs the notes store and where.
//! - Resolve settings from defaults, an optional JSON file and `NOTESTORE_*`
//!   environment variables, in that order.
//!
//! # Invariants
//! - A resolved config always passes `validate()`.
//! - Unknown environment variables are ignored; malformed known ones fail.

use crate::logging::default_log_level;
use crate::query::engine::FilterMode;
use crate::query::types::DEFAULT_PAGE_SIZE;
use crate::storage::DEFAULT_STORAGE_KEY;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::ffi::OsString;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Prefix shared by every environment override.
pub const ENV_PREFIX: &str = "NOTESTORE_";

const DEFAULT_DATA_PATH: &str = "notestore-data";

/// Storage medium for the record snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// Process-local; nothing survives a restart.
    Memory,
    /// `data_path` is a directory holding `<storage_key>.json`.
    File,
    /// `data_path` is a SQLite database file.
    Sqlite,
}

impl StorageKind {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Some(Self::Memory),
            "file" | "json" => Some(Self::File),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub storage: StorageKind,
    pub data_path: PathBuf,
    pub storage_key: String,
    pub default_page_size: usize,
    pub filter_mode: FilterMode,
    pub log_level: String,
    /// Absolute directory for rolling logs; logging stays off when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            storage: StorageKind::File,
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            default_page_size: DEFAULT_PAGE_SIZE,
            filter_mode: FilterMode::Lenient,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: serde_json::Error },
    InvalidValue { key: String, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "invalid config `{}`: {source}", path.display())
            }
            Self::InvalidValue { key, value } => write!(f, "invalid value `{value}` for `{key}`"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::InvalidValue { .. } => None,
        }
    }
}

impl CoreConfig {
    /// Resolves defaults, then `file` (when given), then process environment.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match file {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        base.with_env(std::env::vars_os())
    }

    /// Reads a JSON config file; absent keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `NOTESTORE_*` overrides from `vars`.
    ///
    /// Names outside the prefix are skipped undecoded; a non-Unicode value
    /// under the prefix is an `InvalidValue`.
    pub fn with_env<I, K, V>(mut self, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        for (name, value) in vars {
            let name: OsString = name.into();
            let Some(name) = name.to_str() else {
                continue;
            };
            let Some(key) = name.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value = Into::<OsString>::into(value)
                .into_string()
                .map_err(|raw| invalid(name, &raw.to_string_lossy()))?;
            match key {
                "STORAGE" => {
                    self.storage = StorageKind::parse(&value).ok_or_else(|| invalid(name, &value))?;
                }
                "DATA_PATH" => self.data_path = PathBuf::from(value),
                "STORAGE_KEY" => self.storage_key = value,
                "DEFAULT_PAGE_SIZE" => {
                    self.default_page_size = value
                        .trim()
                        .parse()
                        .map_err(|_| invalid(name, &value))?;
                }
                "FILTER_MODE" => {
                    self.filter_mode = match value.trim().to_ascii_lowercase().as_str() {
                        "lenient" => FilterMode::Lenient,
                        "strict" => FilterMode::Strict,
                        _ => return Err(invalid(name, &value)),
                    };
                }
                "LOG_LEVEL" => self.log_level = value,
                "LOG_DIR" => {
                    self.log_dir = if value.trim().is_empty() {
                        None
                    } else {
                        Some(PathBuf::from(value))
                    };
                }
                _ => {}
            }
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_page_size == 0 {
            return Err(invalid("default_page_size", "0"));
        }
        if self.storage_key.trim().is_empty() {
            return Err(invalid("storage_key", &self.storage_key));
        }
        if self.storage != StorageKind::Memory && self.data_path.as_os_str().is_empty() {
            return Err(invalid("data_path", ""));
        }
        Ok(())
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}
