//! Resolution of a [`Config`](crate::config::Config) into logger options.
//!
//! A profile picks one of two immutable presets, which is then copied and
//! overridden by the level and format settings. The time format is always
//! forced to ISO-8601, and the console encoding gets colored levels when
//! color was requested.

use std::fmt;
use std::str::FromStr;

use crate::config::LogSettings;
use crate::error::{LogError, LogResult};
use crate::level::{AtomicLevel, Severity};

/// Named base configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Production,
    Development,
}

impl Profile {
    /// The immutable preset this profile starts from.
    pub fn preset(&self) -> Preset {
        match self {
            Profile::Production => Preset::PRODUCTION,
            Profile::Development => Preset::DEVELOPMENT,
        }
    }
}

impl FromStr for Profile {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "production" => Ok(Profile::Production),
            "development" => Ok(Profile::Development),
            other => Err(LogError::UnsupportedProfile(other.to_string())),
        }
    }
}

/// Output encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Human-readable single-line entries.
    Console,
    /// One JSON object per entry.
    Json,
}

impl FromStr for Encoding {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "console" => Ok(Encoding::Console),
            "json" => Ok(Encoding::Json),
            other => Err(LogError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Console => f.write_str("console"),
            Encoding::Json => f.write_str("json"),
        }
    }
}

/// How level names are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelStyle {
    Plain,
    /// Capitalized with ANSI colors.
    Colored,
}

/// Timestamp rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFormat {
    /// Seconds since the Unix epoch with a fractional part.
    Epoch,
    /// Local time, e.g. `2024-05-01T13:04:05.000+0200`.
    Iso8601,
}

impl TimeFormat {
    /// `chrono` format string for this time format.
    pub fn pattern(&self) -> &'static str {
        match self {
            TimeFormat::Epoch => "%s%.6f",
            TimeFormat::Iso8601 => "%Y-%m-%dT%H:%M:%S%.3f%z",
        }
    }
}

/// Immutable baseline options selected by a [`Profile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub level: Severity,
    pub encoding: Encoding,
    pub level_style: LevelStyle,
    pub time_format: TimeFormat,
    /// Enables development-only behaviour such as panicking on `dpanic`.
    pub development: bool,
}

impl Preset {
    pub const PRODUCTION: Preset = Preset {
        level: Severity::Info,
        encoding: Encoding::Json,
        level_style: LevelStyle::Plain,
        time_format: TimeFormat::Epoch,
        development: false,
    };

    pub const DEVELOPMENT: Preset = Preset {
        level: Severity::Debug,
        encoding: Encoding::Console,
        level_style: LevelStyle::Plain,
        time_format: TimeFormat::Iso8601,
        development: true,
    };
}

/// Resolved logger options.
///
/// `level` is shared with every logger built from these options; cloning the
/// options keeps sharing it.
#[derive(Debug, Clone)]
pub struct LoggerOptions {
    pub level: AtomicLevel,
    pub encoding: Encoding,
    pub level_style: LevelStyle,
    pub time_format: TimeFormat,
    pub development: bool,
}

impl LoggerOptions {
    /// Resolve settings into options, failing on the first invalid value.
    pub fn resolve(settings: &LogSettings) -> LogResult<Self> {
        let preset = settings.config.parse::<Profile>()?.preset();
        let mut level = preset.level;
        let mut encoding = preset.encoding;
        let mut level_style = preset.level_style;

        if !settings.level.is_empty() {
            level = settings
                .level
                .parse()
                .map_err(|_| LogError::UnsupportedLevel(settings.level.clone()))?;
        }

        if !settings.format.is_empty() {
            encoding = settings.format.parse()?;
        }

        if encoding == Encoding::Console && settings.color {
            level_style = LevelStyle::Colored;
        }

        Ok(Self {
            level: AtomicLevel::new(level),
            encoding,
            level_style,
            time_format: TimeFormat::Iso8601,
            development: preset.development,
        })
    }

    /// Options taken from a preset as-is.
    pub fn from_preset(preset: Preset) -> Self {
        Self {
            level: AtomicLevel::new(preset.level),
            encoding: preset.encoding,
            level_style: preset.level_style,
            time_format: preset.time_format,
            development: preset.development,
        }
    }
}
