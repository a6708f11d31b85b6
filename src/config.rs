//! Process configuration
//!
//! Resolved once at startup and passed down explicitly:
//!
//! 1. JSON file (`--config`, else `./streamfold.json` if present, else
//!    defaults)
//! 2. `STREAMFOLD_*` environment overrides
//! 3. Validation
//!
//! Every field has a default, so an empty object `{}` is a valid file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::Severity;

/// Config file used when `--config` is not given, if it exists
pub const DEFAULT_CONFIG_FILE: &str = "streamfold.json";

pub const ENV_STORE_DIR: &str = "STREAMFOLD_STORE_DIR";
pub const ENV_VIEW_DIR: &str = "STREAMFOLD_VIEW_DIR";
pub const ENV_POLL_INTERVAL_MS: &str = "STREAMFOLD_POLL_INTERVAL_MS";
pub const ENV_BATCH_SIZE: &str = "STREAMFOLD_BATCH_SIZE";
pub const ENV_LOG_LEVEL: &str = "STREAMFOLD_LOG_LEVEL";

/// Result type for configuration
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value for {var}: '{value}'")]
    InvalidEnv { var: &'static str, value: String },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Log store directory
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,

    /// View blob directory
    #[serde(default = "default_view_dir")]
    pub view_dir: PathBuf,

    /// Projection backoff after an empty drain
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Records per projection drain
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Lowest severity written: trace, info, warn, error, fatal
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_store_dir() -> PathBuf {
    PathBuf::from("./streamfold-data/store")
}

fn default_view_dir() -> PathBuf {
    PathBuf::from("./streamfold-data/views")
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_batch_size() -> usize {
    10_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            view_dir: default_view_dir(),
            poll_interval_ms: default_poll_interval_ms(),
            batch_size: default_batch_size(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Resolves the process configuration.
    ///
    /// An explicitly named file must exist. Without one, `streamfold.json`
    /// in the working directory is used if present.
    pub fn resolve(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::load(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        config.apply_overrides(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a config file without overrides or validation.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies `STREAMFOLD_*` overrides found through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_STORE_DIR) {
            self.store_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_VIEW_DIR) {
            self.view_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_POLL_INTERVAL_MS) {
            self.poll_interval_ms = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: ENV_POLL_INTERVAL_MS,
                value,
            })?;
        }
        if let Some(value) = lookup(ENV_BATCH_SIZE) {
            self.batch_size = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: ENV_BATCH_SIZE,
                value,
            })?;
        }
        if let Some(value) = lookup(ENV_LOG_LEVEL) {
            self.log_level = value;
        }
        Ok(())
    }

    /// Checks value ranges.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be > 0".to_string()));
        }

        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll_interval_ms must be > 0".to_string()));
        }

        self.log_severity()?;
        Ok(())
    }

    /// Parsed `log_level`.
    pub fn log_severity(&self) -> ConfigResult<Severity> {
        self.log_level.parse().map_err(ConfigError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.batch_size, 10_000);
        assert_eq!(config.poll_interval_ms, 1000);
        assert_eq!(config.log_level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("c.json");
        fs::write(&path, "{}").unwrap();

        assert_eq!(Config::load(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_file_values() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("c.json");
        fs::write(&path, r#"{"store_dir": "/data/s", "batch_size": 5}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.store_dir, PathBuf::from("/data/s"));
        assert_eq!(config.batch_size, 5);
        assert_eq!(config.view_dir, default_view_dir());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = Config::resolve(Some(&temp_dir.path().join("absent.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_unknown_field_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("c.json");
        fs::write(&path, r#"{"batchsize": 5}"#).unwrap();

        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(env(&[
                (ENV_STORE_DIR, "/tmp/s"),
                (ENV_BATCH_SIZE, "42"),
                (ENV_POLL_INTERVAL_MS, "5"),
                (ENV_LOG_LEVEL, "trace"),
            ]))
            .unwrap();

        assert_eq!(config.store_dir, PathBuf::from("/tmp/s"));
        assert_eq!(config.batch_size, 42);
        assert_eq!(config.poll_interval_ms, 5);
        assert_eq!(config.log_severity().unwrap(), Severity::Trace);
    }

    #[test]
    fn test_bad_env_number() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(env(&[(ENV_BATCH_SIZE, "lots")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: ENV_BATCH_SIZE, .. }));
    }

    #[test]
    fn test_validation() {
        let zero_batch = Config {
            batch_size: 0,
            ..Config::default()
        };
        assert!(zero_batch.validate().is_err());

        let zero_poll = Config {
            poll_interval_ms: 0,
            ..Config::default()
        };
        assert!(zero_poll.validate().is_err());

        let bad_level = Config {
            log_level: "loud".to_string(),
            ..Config::default()
        };
        assert!(bad_level.validate().is_err());
    }
}
