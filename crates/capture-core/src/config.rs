//! Configuration for fieldcall
//!
//! Values come from, in increasing priority: built-in defaults, an optional
//! TOML file, and `FIELDCALL__SECTION__KEY` environment variables.
//!
//! ```toml
//! [database]
//! url = "sqlite:///var/lib/fieldcall/queue.db?mode=rwc"
//!
//! [api]
//! base_url = "https://calls.example.com/api"
//!
//! [sync]
//! min_interval_minutes = 15
//! ```

use serde::Deserialize;
use std::path::Path;

use crate::error::{CaptureError, Result};
use crate::logging::LoggingConfig;
use crate::phone::DEFAULT_COUNTRY_CODE;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "FIELDCALL";

/// Main configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FieldcallConfig {
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub capture: CaptureConfig,
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
}

/// Local queue database
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Remote backend
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Upper bound for one HTTP call; a timeout counts as a failed sync
    pub request_timeout_secs: u64,
}

/// Longest call-log lookup window accepted
pub const MAX_LOOKUP_WINDOW_SECS: u64 = 86_400;

/// Call capture
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// How far before the call start to search the device call log
    pub lookup_window_secs: u64,
    /// Country code stripped when comparing numbers
    pub country_code: String,
}

/// Sync scheduling and retention
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Interval used until the backend says otherwise
    pub default_interval_minutes: u64,
    /// The OS will not run recurring background work more often than this
    pub min_interval_minutes: u64,
    /// SYNCED rows older than this are purged after a successful run
    pub retention_days: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://fieldcall.db?mode=rwc".to_string(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080/api".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            lookup_window_secs: 60,
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            default_interval_minutes: 15,
            min_interval_minutes: 15,
            retention_days: 30,
        }
    }
}

impl FieldcallConfig {
    /// Load configuration from an optional file plus the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the scheduler or the capturer cannot work with
    pub fn validate(&self) -> Result<()> {
        let max_minutes = u64::from(u32::MAX);
        if !(1..=max_minutes).contains(&self.sync.min_interval_minutes) {
            return Err(CaptureError::Config(format!(
                "sync.min_interval_minutes must be between 1 and {max_minutes}, got {}",
                self.sync.min_interval_minutes
            )));
        }
        if !(1..=max_minutes).contains(&self.sync.default_interval_minutes) {
            return Err(CaptureError::Config(format!(
                "sync.default_interval_minutes must be between 1 and {max_minutes}, got {}",
                self.sync.default_interval_minutes
            )));
        }
        if self.capture.lookup_window_secs > MAX_LOOKUP_WINDOW_SECS {
            return Err(CaptureError::Config(format!(
                "capture.lookup_window_secs must be at most {MAX_LOOKUP_WINDOW_SECS}, got {}",
                self.capture.lookup_window_secs
            )));
        }
        Ok(())
    }

    /// Load configuration from environment only
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = FieldcallConfig::default();
        assert_eq!(config.capture.lookup_window_secs, 60);
        assert_eq!(config.sync.min_interval_minutes, 15);
        assert_eq!(config.capture.country_code, "91");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[api]\nbase_url = \"https://calls.example.com/api\"\n\n[sync]\nretention_days = 7"
        )
        .unwrap();

        let config = FieldcallConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.api.base_url, "https://calls.example.com/api");
        assert_eq!(config.api.request_timeout_secs, 30);
        assert_eq!(config.sync.retention_days, 7);
        assert_eq!(config.sync.default_interval_minutes, 15);
    }

    #[test]
    fn test_zero_interval_floor_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[sync]\nmin_interval_minutes = 0").unwrap();

        let result = FieldcallConfig::load(Some(file.path()));
        assert!(matches!(result, Err(CaptureError::Config(msg)) if msg.contains("min_interval_minutes")));
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        let mut config = FieldcallConfig::default();
        assert!(config.validate().is_ok());

        config.sync.default_interval_minutes = u64::from(u32::MAX) + 1;
        assert!(config.validate().is_err());

        let mut config = FieldcallConfig::default();
        config.capture.lookup_window_secs = u64::MAX;
        assert!(matches!(config.validate(), Err(CaptureError::Config(_))));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = FieldcallConfig::load(Some(Path::new("/nonexistent/fieldcall.toml")));
        assert!(result.is_err());
    }
}
