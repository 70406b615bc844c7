//! applog - configuration-driven structured logging.
//!
//! Turns a small set of validated configuration fields (`log.color`,
//! `log.config`, `log.format`, `log.level`, plus `app.id`) into `tracing`
//! based loggers with a runtime-adjustable level.
//!
//! - [`fields`]: declarations of the configuration keys, defaults and
//!   allowed values
//! - [`config`]: the configuration record and its loader
//! - [`options`]: presets and resolution of a config into logger options
//! - [`manager`]: the caller-owned [`LogManager`] handle
//! - [`logger`]: logger handles passed to application code
//! - [`observer`]: in-memory logger for test assertions

pub mod config;
pub mod error;
pub mod fields;
pub mod level;
pub mod logger;
pub mod logging;
pub mod manager;
pub mod observer;
pub mod options;

pub use crate::config::Config;
pub use crate::error::{LogError, LogResult};
pub use crate::level::{AtomicLevel, Severity};
pub use crate::logger::{BaseLogger, Logger, TracedLogger};
pub use crate::manager::LogManager;
pub use crate::observer::{new_observer_logger, ObservedEntry, ObservedLogs};
pub use crate::options::LoggerOptions;
