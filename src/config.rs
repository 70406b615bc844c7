//! Configuration module for applog.
//!
//! Loads logger configuration from YAML files and environment variables,
//! using the declarations in [`crate::fields`] for defaults and allowed
//! values.

use config::builder::DefaultState;
use config::{Config as ConfigLoader, ConfigBuilder, Environment, File};
use serde::Deserialize;

use crate::error::LogResult;
use crate::fields::{app_field_set, logger_field_sets};

/// Environment variable prefix, e.g. `APP_LOG__LEVEL=debug`.
pub const ENV_PREFIX: &str = "APP";

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub app: AppSettings,
    pub log: LogSettings,
}

/// Application identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Attached to every log entry as `id`.
    pub id: String,
}

/// Logger settings, kept as the raw resolved strings.
///
/// Validation happens when the settings are resolved into
/// [`LoggerOptions`](crate::options::LoggerOptions).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Colorize levels (console format only).
    pub color: bool,
    /// Base preset: `production` or `development`.
    pub config: String,
    /// Encoding override: `console`, `json`, or empty to keep the preset's.
    pub format: String,
    /// Minimum severity override, or empty to keep the preset's.
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            color: true,
            config: "production".to_string(),
            format: String::new(),
            level: String::new(),
        }
    }
}

impl Config {
    /// Default configuration tagged with `app_id`.
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app: AppSettings { id: app_id.into() },
            log: LogSettings::default(),
        }
    }

    /// Loader pre-populated with every declared field default.
    pub fn builder() -> LogResult<ConfigBuilder<DefaultState>> {
        let mut builder = ConfigLoader::builder();
        for set in logger_field_sets().iter().chain([app_field_set()].iter()) {
            builder = set.apply_defaults(builder)?;
        }
        Ok(builder)
    }

    /// Load configuration from files and environment.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (APP_*)
    /// 2. config/local.yaml (if exists)
    /// 3. config/default.yaml (if exists)
    /// 4. Field defaults
    pub fn load() -> LogResult<Self> {
        let loader = Self::builder()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::from_loader(&loader)
    }

    /// Validate resolved values against the field sets and deserialize.
    pub fn from_loader(loader: &ConfigLoader) -> LogResult<Self> {
        for set in logger_field_sets() {
            set.check(loader)?;
        }
        Ok(loader.clone().try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LogError;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.app.id, "");
        assert!(config.log.color);
        assert_eq!(config.log.config, "production");
        assert!(config.log.format.is_empty());
        assert!(config.log.level.is_empty());
    }

    #[test]
    fn test_new_sets_app_id() {
        let config = Config::new("billing");
        assert_eq!(config.app.id, "billing");
        assert_eq!(config.log, LogSettings::default());
    }

    #[test]
    fn test_from_loader_uses_field_defaults() {
        let loader = Config::builder().unwrap().build().unwrap();
        let config = Config::from_loader(&loader).unwrap();

        assert_eq!(config.app.id, "");
        assert!(config.log.color);
        assert_eq!(config.log.config, "production");
        assert_eq!(config.log.format, "json");
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_from_loader_applies_overrides() {
        let loader = Config::builder()
            .unwrap()
            .set_override("app.id", "checkout")
            .unwrap()
            .set_override("log.config", "development")
            .unwrap()
            .set_override("log.color", false)
            .unwrap()
            .set_override("log.level", "warn")
            .unwrap()
            .build()
            .unwrap();
        let config = Config::from_loader(&loader).unwrap();

        assert_eq!(config.app.id, "checkout");
        assert_eq!(config.log.config, "development");
        assert!(!config.log.color);
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn test_from_loader_rejects_unknown_level() {
        let loader = Config::builder()
            .unwrap()
            .set_override("log.level", "verbose")
            .unwrap()
            .build()
            .unwrap();

        let err = Config::from_loader(&loader).unwrap_err();
        assert!(matches!(err, LogError::InvalidField { ref key, .. } if key == "log.level"));
    }

    #[test]
    fn test_load_reads_prefixed_environment() {
        std::env::set_var("APP_LOG__LEVEL", "warn");
        std::env::set_var("APP_APP__ID", "from-env");
        let loaded = Config::load();
        std::env::remove_var("APP_LOG__LEVEL");
        std::env::remove_var("APP_APP__ID");

        let config = loaded.unwrap();
        assert_eq!(config.log.level, "warn");
        assert_eq!(config.app.id, "from-env");
    }

    #[test]
    fn test_deserialize_partial_document() {
        let config: Config =
            serde_json::from_str(r#"{"log": {"config": "development"}}"#).unwrap();
        assert_eq!(config.log.config, "development");
        assert!(config.log.color);
        assert!(config.log.format.is_empty());
    }
}
