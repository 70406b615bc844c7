//! Error types for applog.
//!
//! Every failure is reported synchronously to the immediate caller; nothing
//! here is retried or treated as fatal by the crate itself.

use thiserror::Error;

use crate::level::ParseSeverityError;

/// Unified error type for logger configuration and lifecycle operations.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("no logger configuration provided or found")]
    MissingConfig,

    #[error("unsupported log config value: '{0}'")]
    UnsupportedProfile(String),

    #[error("unsupported log format value: '{0}'")]
    UnsupportedFormat(String),

    #[error("unsupported log level value: '{0}'")]
    UnsupportedLevel(String),

    #[error("problem parsing log level: {0}")]
    ParseLevel(#[from] ParseSeverityError),

    #[error("global logger not initialized")]
    NotInitialized,

    #[error("invalid value '{value}' for {key}, expected one of: {}", .allowed.join(", "))]
    InvalidField {
        key: String,
        value: String,
        allowed: Vec<String>,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("problem installing global dispatcher: {0}")]
    GlobalInstall(String),
}

/// Result type alias for applog operations.
pub type LogResult<T> = Result<T, LogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_offending_value() {
        let err = LogError::UnsupportedProfile("staging".to_string());
        assert_eq!(err.to_string(), "unsupported log config value: 'staging'");

        let err = LogError::UnsupportedFormat("xml".to_string());
        assert_eq!(err.to_string(), "unsupported log format value: 'xml'");
    }

    #[test]
    fn test_invalid_field_lists_allowed_values() {
        let err = LogError::InvalidField {
            key: "log.format".to_string(),
            value: "xml".to_string(),
            allowed: vec!["console".to_string(), "json".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "invalid value 'xml' for log.format, expected one of: console, json"
        );
    }

    #[test]
    fn test_parse_level_wraps_source() {
        let parse_err = "verbose".parse::<crate::level::Severity>().unwrap_err();
        let err = LogError::from(parse_err);
        assert!(matches!(err, LogError::ParseLevel(_)));
        assert!(err.to_string().starts_with("problem parsing log level:"));
    }
}
